/*!
MMC3 (mapper 4).

- Bank select ($8000 even) / bank data ($8001 odd) registers R0..R7
- PRG banking modes (bit 6): two switchable 8K banks, second-last and last fixed
- CHR banking (two 2KB + four 1KB banks) with A12 inversion (bit 7)
- Runtime mirroring ($A000 even, bit 0: 0=vertical, 1=horizontal)
- PRG RAM enable / write protect ($A001 odd)
- Scanline IRQ counter ($C000 latch, $C001 reload, $E000 disable+ack, $E001 enable),
  clocked once per rendered scanline through `Mapper::notify_scanline`

Notes:
- Disabled PRG RAM reads 0x00 and keeps its contents.
- The counter is clocked from the PPU scanline position rather than A12 edges.
*/

use crate::mapper::{BoardData, Mapper, prg_ram_index};
use crate::nametable::Mirroring;

#[derive(Debug, Clone)]
pub struct Mmc3 {
    prg_rom: Vec<u8>,
    prg_ram: Vec<u8>,
    chr: Vec<u8>,
    chr_is_ram: bool,

    bank_regs: [u8; 8],
    bank_select: u8,

    prg_8k_count: usize,

    irq_latch: u8,
    irq_counter: u8,
    irq_reload: bool,
    irq_enabled: bool,
    irq_pending: bool,

    mirroring: Option<Mirroring>,
    prg_ram_enabled: bool,
    prg_ram_write_protect: bool,
}

impl Mmc3 {
    pub fn new(board: BoardData) -> Self {
        let prg_ram = board.prg_ram();
        let chr = if board.chr.is_empty() {
            vec![0; 8 * 1024]
        } else {
            board.chr
        };
        Self {
            prg_8k_count: (board.prg_rom.len() / 0x2000).max(1),
            prg_rom: board.prg_rom,
            prg_ram,
            chr,
            chr_is_ram: board.chr_is_ram,
            bank_regs: [0; 8],
            bank_select: 0,
            irq_latch: 0,
            irq_counter: 0,
            irq_reload: false,
            irq_enabled: false,
            irq_pending: false,
            mirroring: None,
            prg_ram_enabled: true,
            prg_ram_write_protect: false,
        }
    }

    #[inline]
    fn prg_mode(&self) -> bool {
        self.bank_select & 0x40 != 0
    }

    #[inline]
    fn chr_inverted(&self) -> bool {
        self.bank_select & 0x80 != 0
    }

    fn prg_index(&self, addr: u16) -> usize {
        let last = self.prg_8k_count - 1;
        let second_last = self.prg_8k_count.saturating_sub(2);
        let r6 = self.bank_regs[6] as usize % self.prg_8k_count;
        let r7 = self.bank_regs[7] as usize % self.prg_8k_count;
        let bank = match (addr >> 13) & 3 {
            0 if self.prg_mode() => second_last,
            0 => r6,
            1 => r7,
            2 if self.prg_mode() => r6,
            2 => second_last,
            _ => last,
        };
        bank * 0x2000 + (addr as usize & 0x1FFF)
    }

    fn chr_index(&self, addr: u16) -> usize {
        // Inversion swaps the 2K and 1K halves of the pattern space.
        let a = usize::from(if self.chr_inverted() { addr ^ 0x1000 } else { addr });
        let physical = match a {
            0x0000..=0x07FF => (self.bank_regs[0] & 0xFE) as usize * 0x400 + (a & 0x07FF),
            0x0800..=0x0FFF => (self.bank_regs[1] & 0xFE) as usize * 0x400 + (a & 0x07FF),
            _ => {
                let reg = 2 + ((a - 0x1000) >> 10);
                self.bank_regs[reg] as usize * 0x400 + (a & 0x03FF)
            }
        };
        physical % self.chr.len()
    }

    fn write_register(&mut self, addr: u16, value: u8) {
        let even = addr & 1 == 0;
        match (addr, even) {
            (0x8000..=0x9FFF, true) => self.bank_select = value,
            (0x8000..=0x9FFF, false) => self.bank_regs[(self.bank_select & 0x07) as usize] = value,
            (0xA000..=0xBFFF, true) => {
                self.mirroring = Some(if value & 1 == 0 {
                    Mirroring::Vertical
                } else {
                    Mirroring::Horizontal
                });
            }
            (0xA000..=0xBFFF, false) => {
                self.prg_ram_enabled = value & 0x80 != 0;
                self.prg_ram_write_protect = value & 0x40 != 0;
            }
            (0xC000..=0xDFFF, true) => self.irq_latch = value,
            (0xC000..=0xDFFF, false) => {
                self.irq_counter = 0;
                self.irq_reload = true;
            }
            (0xE000..=0xFFFF, true) => {
                self.irq_enabled = false;
                self.irq_pending = false;
            }
            (0xE000..=0xFFFF, false) => self.irq_enabled = true,
            _ => {}
        }
    }
}

impl Mapper for Mmc3 {
    fn mapper_id(&self) -> u16 {
        4
    }

    fn cpu_read(&mut self, addr: u16) -> u8 {
        match addr {
            0x6000..=0x7FFF => match prg_ram_index(&self.prg_ram, addr) {
                Some(i) if self.prg_ram_enabled => self.prg_ram[i],
                _ => 0,
            },
            0x8000..=0xFFFF if !self.prg_rom.is_empty() => {
                self.prg_rom[self.prg_index(addr) % self.prg_rom.len()]
            }
            _ => 0xFF,
        }
    }

    fn cpu_write(&mut self, addr: u16, value: u8) {
        match addr {
            0x6000..=0x7FFF => {
                if !self.prg_ram_enabled || self.prg_ram_write_protect {
                    return;
                }
                if let Some(i) = prg_ram_index(&self.prg_ram, addr) {
                    self.prg_ram[i] = value;
                }
            }
            0x8000..=0xFFFF => self.write_register(addr, value),
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
        if self.chr_is_ram && addr <= 0x1FFF {
            let idx = self.chr_index(addr);
            self.chr[idx] = value;
        }
    }

    fn reset(&mut self) {
        self.bank_select = 0;
        self.bank_regs = [0; 8];
        self.irq_latch = 0;
        self.irq_counter = 0;
        self.irq_reload = false;
        self.irq_enabled = false;
        self.irq_pending = false;
        self.mirroring = None;
        self.prg_ram_enabled = true;
        self.prg_ram_write_protect = false;
    }

    fn irq_pending(&self) -> bool {
        self.irq_pending
    }

    fn current_mirroring(&self) -> Option<Mirroring> {
        self.mirroring
    }

    fn notify_scanline(&mut self) {
        if self.irq_counter == 0 || self.irq_reload {
            self.irq_counter = self.irq_latch;
            self.irq_reload = false;
        } else {
            self.irq_counter -= 1;
        }
        if self.irq_counter == 0 && self.irq_enabled {
            self.irq_pending = true;
        }
    }
}
