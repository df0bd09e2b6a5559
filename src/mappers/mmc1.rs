//! MMC1 (mapper 1).
//!
//! Implements:
//! - Serial 5-bit shift register feeding control / CHR0 / CHR1 / PRG registers
//! - PRG banking modes (32K switch, or 16K with fixed first or last bank)
//! - CHR banking (8K or 4K+4K), CHR RAM writes
//! - Runtime mirroring control from control bits 0-1
//!
//! Simplified:
//! - PRG RAM disable bit is ignored (always enabled)
//! - Consecutive-cycle write filtering is not modeled
//! - Large board variants (SUROM / SOROM / etc.)

use crate::mapper::{BoardData, Mapper, prg_ram_index};
use crate::nametable::Mirroring;

#[derive(Debug, Clone)]
pub struct Mmc1 {
    prg_rom: Vec<u8>,
    prg_ram: Vec<u8>,
    chr: Vec<u8>,
    chr_is_ram: bool,

    // 5-bit registers
    control: u8,
    chr_bank0: u8,
    chr_bank1: u8,
    prg_bank: u8,

    // Serial latch
    shift_reg: u8,
    shift_count: u8,

    prg_16k_bank_count: u8,
    chr_4k_bank_count: u8,

    // Cached PRG mapping
    prg_bank_lo_index: u8,
    prg_bank_hi_index: u8,
}

impl Mmc1 {
    pub fn new(board: BoardData) -> Self {
        let prg_ram = board.prg_ram();
        let BoardData {
            prg_rom,
            chr,
            chr_is_ram,
            ..
        } = board;
        let chr = if chr.is_empty() { vec![0; 8 * 1024] } else { chr };
        let prg_16k_bank_count = (prg_rom.len() / 0x4000).max(1) as u8;
        let chr_4k_bank_count = (chr.len() / 0x1000).max(1) as u8;

        let mut s = Self {
            prg_rom,
            prg_ram,
            chr,
            chr_is_ram,
            control: 0x0C,
            chr_bank0: 0,
            chr_bank1: 0,
            prg_bank: 0,
            shift_reg: 0,
            shift_count: 0,
            prg_16k_bank_count,
            chr_4k_bank_count,
            prg_bank_lo_index: 0,
            prg_bank_hi_index: prg_16k_bank_count.saturating_sub(1),
        };
        s.recompute_prg_banks();
        s
    }

    #[inline]
    fn prg_mode(&self) -> u8 {
        (self.control >> 2) & 0x03
    }

    #[inline]
    fn chr_mode(&self) -> u8 {
        (self.control >> 4) & 0x01
    }

    fn recompute_prg_banks(&mut self) {
        let count = self.prg_16k_bank_count.max(1);
        let last = count - 1;
        match self.prg_mode() {
            0 | 1 => {
                let bank = (self.prg_bank & 0x0E) % count;
                self.prg_bank_lo_index = bank;
                self.prg_bank_hi_index = bank.saturating_add(1).min(last);
            }
            2 => {
                self.prg_bank_lo_index = 0;
                self.prg_bank_hi_index = (self.prg_bank & 0x0F) % count;
            }
            _ => {
                self.prg_bank_lo_index = (self.prg_bank & 0x0F) % count;
                self.prg_bank_hi_index = last;
            }
        }
    }

    fn commit_register(&mut self, addr: u16, value5: u8) {
        match addr {
            0x8000..=0x9FFF => self.control = value5 & 0x1F,
            0xA000..=0xBFFF => self.chr_bank0 = value5 & 0x1F,
            0xC000..=0xDFFF => self.chr_bank1 = value5 & 0x1F,
            _ => self.prg_bank = value5 & 0x1F,
        }
        self.recompute_prg_banks();
    }

    fn serial_write(&mut self, addr: u16, data: u8) {
        if data & 0x80 != 0 {
            self.shift_reg = 0;
            self.shift_count = 0;
            self.control |= 0x0C;
            self.recompute_prg_banks();
            return;
        }
        self.shift_reg |= (data & 1) << self.shift_count;
        self.shift_count += 1;
        if self.shift_count == 5 {
            let value5 = self.shift_reg;
            self.commit_register(addr, value5);
            self.shift_reg = 0;
            self.shift_count = 0;
        }
    }

    fn chr_index(&self, addr: u16) -> usize {
        let count = self.chr_4k_bank_count.max(1);
        let (bank, offset) = if self.chr_mode() == 0 {
            ((self.chr_bank0 & 0x1E) % count, addr as usize & 0x1FFF)
        } else if addr < 0x1000 {
            (self.chr_bank0 % count, addr as usize & 0x0FFF)
        } else {
            (self.chr_bank1 % count, addr as usize & 0x0FFF)
        };
        (bank as usize * 0x1000 + offset) % self.chr.len()
    }

    #[cfg(test)]
    pub(crate) fn debug_prg_banks(&self) -> (u8, u8) {
        (self.prg_bank_lo_index, self.prg_bank_hi_index)
    }
}

impl Mapper for Mmc1 {
    fn mapper_id(&self) -> u16 {
        1
    }

    fn cpu_read(&mut self, addr: u16) -> u8 {
        match addr {
            0x6000..=0x7FFF => prg_ram_index(&self.prg_ram, addr).map_or(0, |i| self.prg_ram[i]),
            0x8000..=0xBFFF => {
                let bank = self.prg_bank_lo_index as usize;
                crate::mapper::prg_bank_read(&self.prg_rom, bank, 0x4000, addr as usize & 0x3FFF)
            }
            0xC000..=0xFFFF => {
                let bank = self.prg_bank_hi_index as usize;
                crate::mapper::prg_bank_read(&self.prg_rom, bank, 0x4000, addr as usize & 0x3FFF)
            }
            _ => 0,
        }
    }

    fn cpu_write(&mut self, addr: u16, value: u8) {
        match addr {
            0x6000..=0x7FFF => {
                if let Some(i) = prg_ram_index(&self.prg_ram, addr) {
                    self.prg_ram[i] = value;
                }
            }
            0x8000..=0xFFFF => self.serial_write(addr, value),
            _ => {}
        }
    }

    fn ppu_read(&self, addr: u16) -> u8 {
        if addr > 0x1FFF {
            return 0;
        }
        self.chr[self.chr_index(addr)]
    }

    fn ppu_write(&mut self, addr: u16, value: u8) {
        if !self.chr_is_ram || addr > 0x1FFF {
            return;
        }
        let idx = self.chr_index(addr);
        self.chr[idx] = value;
    }

    fn reset(&mut self) {
        self.control = 0x0C;
        self.shift_reg = 0;
        self.shift_count = 0;
        self.chr_bank0 = 0;
        self.chr_bank1 = 0;
        self.prg_bank = 0;
        self.recompute_prg_banks();
    }

    fn current_mirroring(&self) -> Option<Mirroring> {
        // Single-screen 0 shows the $2000 page, 1 the $2400 page.
        Some(match self.control & 0x03 {
            0 => Mirroring::SingleScreenUpper,
            1 => Mirroring::SingleScreenLower,
            2 => Mirroring::Vertical,
            _ => Mirroring::Horizontal,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make(prg_len: usize, chr: Vec<u8>) -> Mmc1 {
        let prg: Vec<u8> = (0..prg_len).map(|i| (i / 0x4000) as u8).collect();
        Mmc1::new(BoardData {
            prg_rom: prg,
            chr,
            chr_is_ram: false,
            prg_ram_len: 8 * 1024,
        })
    }

    fn write_serial(mapper: &mut Mmc1, addr: u16, value5: u8) {
        for i in 0..5 {
            mapper.cpu_write(addr, (value5 >> i) & 1);
        }
    }

    #[test]
    fn power_on_fixes_last_bank_high() {
        let mut m = make(128 * 1024, vec![0; 8 * 1024]);
        assert_eq!(m.debug_prg_banks(), (0, 7));
        assert_eq!(m.cpu_read(0xC000), 7, "last 16K bank visible at $C000");
    }

    #[test]
    fn prg_mode_fix_upper_switch_low() {
        let mut m = make(128 * 1024, vec![0; 8 * 1024]);
        write_serial(&mut m, 0x8000, 0b01111); // mode 3
        write_serial(&mut m, 0xE000, 0b00101); // bank 5
        assert_eq!(m.cpu_read(0x8000), 5);
        assert_eq!(m.cpu_read(0xFFFF), 7);
    }

    #[test]
    fn prg_mode_fix_first_switch_high() {
        let mut m = make(128 * 1024, vec![0; 8 * 1024]);
        write_serial(&mut m, 0x8000, 0b01011); // mode 2
        write_serial(&mut m, 0xE000, 0b00011);
        assert_eq!(m.cpu_read(0x8000), 0);
        assert_eq!(m.cpu_read(0xC000), 3);
    }

    #[test]
    fn reset_bit_restores_mode_3() {
        let mut m = make(64 * 1024, vec![0; 8 * 1024]);
        write_serial(&mut m, 0x8000, 0b00000);
        m.cpu_write(0x8000, 0x80);
        assert_eq!(m.prg_mode(), 3);
    }

    #[test]
    fn chr_4k_mode_mapping() {
        let mut chr = vec![0u8; 16 * 1024];
        chr[0x1000] = 0x22;
        chr[0x2000] = 0x33;
        let mut m = make(32 * 1024, chr);
        write_serial(&mut m, 0x8000, 0b10000); // chr_mode=1
        write_serial(&mut m, 0xA000, 0b00001);
        write_serial(&mut m, 0xC000, 0b00010);
        assert_eq!(m.ppu_read(0x0000), 0x22);
        assert_eq!(m.ppu_read(0x1000), 0x33);
    }

    #[test]
    fn mirroring_follows_control_bits() {
        let mut m = make(32 * 1024, vec![0; 8 * 1024]);
        write_serial(&mut m, 0x8000, 0b01110);
        assert_eq!(m.current_mirroring(), Some(Mirroring::Vertical));
        write_serial(&mut m, 0x8000, 0b01111);
        assert_eq!(m.current_mirroring(), Some(Mirroring::Horizontal));
        write_serial(&mut m, 0x8000, 0b01100);
        assert_eq!(m.current_mirroring(), Some(Mirroring::SingleScreenUpper));
    }
}
