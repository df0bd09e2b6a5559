/*!
CPU interface dispatcher

Decodes CPU addresses onto RAM, PPU ports, APU/IO and the cartridge. Writes
into cartridge space resync nametable mirroring afterwards so boards that
switch mirroring at runtime take effect on the next PPU access.

Reads with no device behind them return 0 ($8000-$FFFF without a cartridge
returns $FF); writes to them are ignored.
*/

use crate::bus::Bus;
use crate::bus::dma::DmaBus;
use crate::cpu::CpuBus;

/// Upper bits of a controller read float; most boards see $40.
const CONTROLLER_OPEN_BUS: u8 = 0x40;

impl Bus {
    pub fn read(&mut self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => self.ram.read(addr),
            0x2000..=0x3FFF => {
                let (ppu, mut view) = self.split_ppu();
                ppu.read_register(addr, &mut view)
            }
            0x4016 => self.controllers[0].read() | CONTROLLER_OPEN_BUS,
            0x4017 => self.controllers[1].read() | CONTROLLER_OPEN_BUS,
            0x4000..=0x4013 | 0x4015 => self.apu.read_reg(addr),
            0x4014 | 0x4018..=0x401F => 0,
            0x4020..=0xFFFF => match self.cartridge.as_mut() {
                Some(cart) => cart.cpu_read(addr),
                None if addr >= 0x8000 => 0xFF,
                None => 0,
            },
        }
    }

    pub fn write(&mut self, addr: u16, value: u8) {
        match addr {
            0x0000..=0x1FFF => self.ram.write(addr, value),
            0x2000..=0x3FFF => {
                let (ppu, mut view) = self.split_ppu();
                ppu.write_register(addr, value, &mut view);
            }
            0x4014 => self.dma_request = Some(value),
            0x4016 => {
                if value & 1 != 0 {
                    self.poll_input_readers();
                }
                for pad in &mut self.controllers {
                    pad.write_strobe(value);
                }
            }
            0x4000..=0x4017 => self.apu.write_reg(addr, value),
            0x4018..=0x401F => {}
            0x4020..=0xFFFF => {
                if let Some(cart) = self.cartridge.as_mut() {
                    cart.cpu_write(addr, value);
                    self.sync_mirroring();
                }
            }
        }
    }

    /// Little-endian word read, used for vectors.
    pub fn read_word(&mut self, addr: u16) -> u16 {
        let lo = self.read(addr) as u16;
        let hi = self.read(addr.wrapping_add(1)) as u16;
        (hi << 8) | lo
    }
}

impl CpuBus for Bus {
    #[inline]
    fn read(&mut self, addr: u16) -> u8 {
        Bus::read(self, addr)
    }

    #[inline]
    fn write(&mut self, addr: u16, value: u8) {
        Bus::write(self, addr, value);
    }
}

impl DmaBus for Bus {
    #[inline]
    fn dma_read(&mut self, addr: u16) -> u8 {
        self.read(addr)
    }

    #[inline]
    fn oam_write(&mut self, value: u8) {
        self.ppu.write_oam_data(value);
    }
}
