/*!
NROM (mapper 0): the pass-through board.

- PRG ROM: 16 KiB (NROM-128) visible in both $8000 and $C000 windows, or
  32 KiB (NROM-256) mapped directly.
- PRG RAM: optional (commonly 8 KiB) at $6000..=$7FFF.
- CHR: 8 KiB ROM, or RAM when the header declares no CHR ROM.
*/

use crate::mapper::{BoardData, Mapper, prg_ram_index};

#[derive(Clone, Debug)]
pub struct Nrom {
    prg_rom: Vec<u8>,
    prg_ram: Vec<u8>,
    chr: Vec<u8>,
    chr_is_ram: bool,
}

impl Nrom {
    pub fn new(board: BoardData) -> Self {
        Self {
            prg_ram: board.prg_ram(),
            prg_rom: board.prg_rom,
            chr: board.chr,
            chr_is_ram: board.chr_is_ram,
        }
    }

    #[inline]
    fn prg_rom_read(&self, addr: u16) -> u8 {
        if self.prg_rom.is_empty() {
            return 0xFF;
        }
        let rel = addr.wrapping_sub(0x8000) as usize;
        let len = self.prg_rom.len();
        if len.is_power_of_two() {
            self.prg_rom[rel & (len - 1)]
        } else {
            self.prg_rom[rel % len]
        }
    }

    /// True for the single-bank layout mirrored into both 16 KiB windows.
    pub fn is_nrom_128(&self) -> bool {
        self.prg_rom.len() == 16 * 1024
    }
}

impl Mapper for Nrom {
    #[inline]
    fn mapper_id(&self) -> u16 {
        0
    }

    fn cpu_read(&mut self, addr: u16) -> u8 {
        match addr {
            0x6000..=0x7FFF => prg_ram_index(&self.prg_ram, addr).map_or(0, |i| self.prg_ram[i]),
            0x8000..=0xFFFF => self.prg_rom_read(addr),
            _ => 0,
        }
    }

    fn cpu_write(&mut self, addr: u16, value: u8) {
        if let Some(i) = prg_ram_index(&self.prg_ram, addr) {
            self.prg_ram[i] = value;
        }
    }

    fn ppu_read(&self, addr: u16) -> u8 {
        if self.chr.is_empty() || addr > 0x1FFF {
            return 0;
        }
        self.chr[(addr as usize) % self.chr.len()]
    }

    fn ppu_write(&mut self, addr: u16, value: u8) {
        if !self.chr_is_ram || self.chr.is_empty() || addr > 0x1FFF {
            return;
        }
        let idx = (addr as usize) % self.chr.len();
        self.chr[idx] = value;
    }
}
