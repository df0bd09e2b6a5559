/*!
Mapper subsystem: the bank-switching interface every cartridge board implements.

Purpose:
- Decouple CPU/PPU address mapping from the `Cartridge` so boards can be added
  to the registry in `mappers` without touching the bus.
- The bus forwards CPU $4020..=$FFFF to `cpu_*` and PPU $0000..=$1FFF to `ppu_*`.
- Boards that switch nametable mirroring at runtime report it through
  `current_mirroring`; the bus applies it after every cartridge-space write.
*/

use crate::nametable::Mirroring;

/// Raw banks handed to a board constructor once the header has been parsed.
#[derive(Clone, Debug, Default)]
pub struct BoardData {
    pub prg_rom: Vec<u8>,
    /// CHR ROM contents, or a zeroed CHR RAM buffer when `chr_is_ram`.
    pub chr: Vec<u8>,
    pub chr_is_ram: bool,
    pub prg_ram_len: usize,
}

impl BoardData {
    pub(crate) fn prg_ram(&self) -> Vec<u8> {
        vec![0; self.prg_ram_len]
    }
}

/// Common interface all cartridge mappers implement.
///
/// All read/write methods take full CPU or PPU addresses (unmasked).
/// Out-of-range accesses read back a board-defined default and writes are
/// ignored.
pub trait Mapper {
    /// Mapper numeric identifier (e.g., 0 for NROM).
    fn mapper_id(&self) -> u16;

    /// CPU-visible read at $4020..=$FFFF.
    fn cpu_read(&mut self, addr: u16) -> u8;

    /// CPU-visible write at $4020..=$FFFF.
    fn cpu_write(&mut self, addr: u16, value: u8);

    /// PPU-visible read at $0000..=$1FFF (pattern table region).
    fn ppu_read(&self, addr: u16) -> u8;

    /// PPU-visible write at $0000..=$1FFF; ignored unless the board has CHR RAM.
    fn ppu_write(&mut self, addr: u16, value: u8);

    /// Power-on/reset bank state.
    fn reset(&mut self) {}

    /// Whether this board is asserting its IRQ output line.
    fn irq_pending(&self) -> bool {
        false
    }

    /// Runtime mirroring override; `None` keeps the header mode.
    fn current_mirroring(&self) -> Option<Mirroring> {
        None
    }

    /// Clocked by the PPU once per rendered scanline (cycle 260).
    fn notify_scanline(&mut self) {}
}

/// Index a 16 KiB-windowed PRG image. Shared by the simpler boards.
#[inline]
pub(crate) fn prg_bank_read(prg: &[u8], bank: usize, bank_size: usize, offset: usize) -> u8 {
    if prg.is_empty() {
        return 0xFF;
    }
    prg[(bank * bank_size + offset) % prg.len()]
}

/// Read/write through a PRG RAM window at $6000..=$7FFF.
#[inline]
pub(crate) fn prg_ram_index(ram: &[u8], addr: u16) -> Option<usize> {
    if ram.is_empty() || !(0x6000..=0x7FFF).contains(&addr) {
        return None;
    }
    Some((addr as usize - 0x6000) % ram.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prg_bank_read_wraps_small_images() {
        let prg: Vec<u8> = (0..0x4000u32).map(|i| (i >> 8) as u8).collect();
        assert_eq!(prg_bank_read(&prg, 0, 0x4000, 0x0100), 0x01);
        // Bank 1 does not exist in a 16 KiB image; it folds back onto bank 0.
        assert_eq!(prg_bank_read(&prg, 1, 0x4000, 0x0100), 0x01);
        assert_eq!(prg_bank_read(&[], 3, 0x4000, 0), 0xFF);
    }

    #[test]
    fn prg_ram_index_rejects_outside_window() {
        let ram = vec![0u8; 0x2000];
        assert_eq!(prg_ram_index(&ram, 0x6001), Some(1));
        assert_eq!(prg_ram_index(&ram, 0x8000), None);
        assert_eq!(prg_ram_index(&[], 0x6000), None);
    }
}
