/*
AxROM (mapper 7).

- PRG: 32 KiB bank at $8000-$FFFF selected by bits 0-2 of any write.
- Bit 4 of the same write picks the single-screen nametable page.
- CHR: 8 KiB RAM.
*/

use crate::mapper::{BoardData, Mapper, prg_bank_read};
use crate::nametable::Mirroring;

#[derive(Debug, Clone)]
pub struct Axrom {
    prg_rom: Vec<u8>,
    chr: Vec<u8>,
    chr_is_ram: bool,
    bank: u8,
    page_select: bool,
}

impl Axrom {
    pub fn new(board: BoardData) -> Self {
        let chr = if board.chr.is_empty() {
            vec![0; 8 * 1024]
        } else {
            board.chr
        };
        Self {
            prg_rom: board.prg_rom,
            chr,
            chr_is_ram: board.chr_is_ram,
            bank: 0,
            page_select: false,
        }
    }
}

impl Mapper for Axrom {
    fn mapper_id(&self) -> u16 {
        7
    }

    fn cpu_read(&mut self, addr: u16) -> u8 {
        match addr {
            0x8000..=0xFFFF => {
                prg_bank_read(&self.prg_rom, self.bank as usize, 0x8000, addr as usize & 0x7FFF)
            }
            _ => 0,
        }
    }

    fn cpu_write(&mut self, addr: u16, value: u8) {
        if addr >= 0x8000 {
            self.bank = value & 0x07;
            self.page_select = value & 0x10 != 0;
        }
    }

    fn ppu_read(&self, addr: u16) -> u8 {
        if addr > 0x1FFF {
            return 0;
        }
        self.chr[addr as usize % self.chr.len()]
    }

    fn ppu_write(&mut self, addr: u16, value: u8) {
        if self.chr_is_ram && addr <= 0x1FFF {
            let idx = addr as usize % self.chr.len();
            self.chr[idx] = value;
        }
    }

    fn reset(&mut self) {
        self.bank = 0;
        self.page_select = false;
    }

    fn current_mirroring(&self) -> Option<Mirroring> {
        Some(if self.page_select {
            Mirroring::SingleScreenLower
        } else {
            Mirroring::SingleScreenUpper
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bank_and_page_select_share_one_register() {
        let prg: Vec<u8> = (0..4 * 0x8000).map(|i| (i / 0x8000) as u8).collect();
        let mut m = Axrom::new(BoardData {
            prg_rom: prg,
            chr: vec![0; 8 * 1024],
            chr_is_ram: true,
            prg_ram_len: 0,
        });
        assert_eq!(m.current_mirroring(), Some(Mirroring::SingleScreenUpper));
        m.cpu_write(0x8000, 0x12);
        assert_eq!(m.cpu_read(0x8000), 2);
        assert_eq!(m.cpu_read(0xFFFF), 2);
        assert_eq!(m.current_mirroring(), Some(Mirroring::SingleScreenLower));
    }
}
