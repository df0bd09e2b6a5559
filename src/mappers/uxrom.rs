/*
UxROM (mapper 2).

- PRG: 16 KiB switchable bank at $8000-$BFFF (low bits of any write to
  $8000-$FFFF), last 16 KiB bank fixed at $C000-$FFFF.
- CHR: 8 KiB, usually RAM.
- Mirroring comes from the header only.
*/

use crate::mapper::{BoardData, Mapper, prg_bank_read};

#[derive(Debug, Clone)]
pub struct Uxrom {
    prg_rom: Vec<u8>,
    chr: Vec<u8>,
    chr_is_ram: bool,
    bank: usize,
    bank_count: usize,
}

impl Uxrom {
    pub fn new(board: BoardData) -> Self {
        let bank_count = (board.prg_rom.len() / 0x4000).max(1);
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
            bank_count,
        }
    }
}

impl Mapper for Uxrom {
    fn mapper_id(&self) -> u16 {
        2
    }

    fn cpu_read(&mut self, addr: u16) -> u8 {
        let offset = addr as usize & 0x3FFF;
        match addr {
            0x8000..=0xBFFF => prg_bank_read(&self.prg_rom, self.bank, 0x4000, offset),
            0xC000..=0xFFFF => {
                let last = self.bank_count - 1;
                prg_bank_read(&self.prg_rom, last, 0x4000, offset)
            }
            _ => 0,
        }
    }

    fn cpu_write(&mut self, addr: u16, value: u8) {
        if addr >= 0x8000 {
            self.bank = value as usize % self.bank_count;
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
    }
}
