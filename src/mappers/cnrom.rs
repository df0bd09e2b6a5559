/*
CNROM (mapper 3).

- PRG: fixed (16 KiB mirrored or 32 KiB direct) at $8000-$FFFF.
- CHR: 8 KiB banks selected by any write to $8000-$FFFF (value modulo the bank count).
- Mirroring comes from the header only.
*/

use crate::mapper::{BoardData, Mapper, prg_bank_read};

#[derive(Debug, Clone)]
pub struct Cnrom {
    prg_rom: Vec<u8>,
    chr: Vec<u8>,
    chr_is_ram: bool,
    chr_bank: u8,
    chr_bank_count: u8,
}

impl Cnrom {
    pub fn new(board: BoardData) -> Self {
        let chr = if board.chr.is_empty() {
            vec![0; 8 * 1024]
        } else {
            board.chr
        };
        let chr_bank_count = (chr.len() / (8 * 1024)).max(1) as u8;
        Self {
            prg_rom: board.prg_rom,
            chr,
            chr_is_ram: board.chr_is_ram,
            chr_bank: 0,
            chr_bank_count,
        }
    }

    #[inline]
    fn chr_index(&self, addr: u16) -> usize {
        (self.chr_bank as usize * 0x2000 + (addr as usize & 0x1FFF)) % self.chr.len()
    }
}

impl Mapper for Cnrom {
    fn mapper_id(&self) -> u16 {
        3
    }

    fn cpu_read(&mut self, addr: u16) -> u8 {
        match addr {
            0x8000..=0xFFFF => prg_bank_read(&self.prg_rom, 0, 0x8000, addr as usize & 0x7FFF),
            _ => 0,
        }
    }

    fn cpu_write(&mut self, addr: u16, value: u8) {
        if addr >= 0x8000 {
            self.chr_bank = value % self.chr_bank_count;
        }
    }

    fn ppu_read(&self, addr: u16) -> u8 {
        if addr > 0x1FFF {
            return 0;
        }
        self.chr[self.chr_index(addr)]
    }

    fn ppu_write(&mut self, addr: u16, value: u8) {
        if self.chr_is_ram && addr <= 0x1FFF {
            let idx = self.chr_index(addr);
            self.chr[idx] = value;
        }
    }

    fn reset(&mut self) {
        self.chr_bank = 0;
    }
}
