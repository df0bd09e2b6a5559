#![doc = r#"
PPU registers module

CPU-visible ports $2000-$2007 (mirrored through $3FFF, port = addr & 7) and
the loopy scroll arithmetic on the 15-bit `v`/`t` latches.

```text
    v/t layout: 0yyy NNYY YYYX XXXX
                 |   ||    |     +-- coarse X (0-31)
                 |   ||    +-------- coarse Y (0-29, 30/31 address attributes)
                 |   |+------------- horizontal nametable select
                 |   +-------------- vertical nametable select
                 +------------------ fine Y (0-7)
```

Scroll ($2005) and address ($2006) share the one write toggle; reading
status ($2002) resets it.
"#]

use super::*;
use crate::ppu_bus::PpuBus;

/// Coarse X increment; wrapping past 31 flips the horizontal nametable.
#[inline]
pub(crate) fn increment_coarse_x(v: u16) -> u16 {
    if (v & 0x001F) == 0x001F {
        v ^ 0x041F
    } else {
        v + 1
    }
}

/// Fine Y increment carrying into coarse Y. Row 29 wraps and flips the
/// vertical nametable; rows 30/31 wrap without flipping.
#[inline]
pub(crate) fn increment_y(v: u16) -> u16 {
    if (v & 0x7000) != 0x7000 {
        return v + 0x1000;
    }
    let v = v & !0x7000;
    let coarse_y = (v & 0x03E0) >> 5;
    let (coarse_y, v) = match coarse_y {
        29 => (0, v ^ 0x0800),
        31 => (0, v),
        y => (y + 1, v),
    };
    (v & !0x03E0) | (coarse_y << 5)
}

/// Copy coarse X and the horizontal nametable bit from `t` into `v`.
#[inline]
pub(crate) fn copy_horizontal(v: u16, t: u16) -> u16 {
    (v & 0x7BE0) | (t & 0x041F)
}

impl Ppu {
    /// CPU read of port `addr & 7`.
    pub fn read_register<B: PpuBus>(&mut self, addr: u16, bus: &mut B) -> u8 {
        match addr & 7 {
            2 => self.read_status(),
            4 => self.oam[self.oam_addr as usize],
            7 => self.read_data(bus),
            // Write-only ports
            _ => 0,
        }
    }

    /// CPU write of port `addr & 7`.
    pub fn write_register<B: PpuBus>(&mut self, addr: u16, value: u8, bus: &mut B) {
        match addr & 7 {
            0 => self.write_ctrl(value),
            1 => self.mask = value,
            2 => {}
            3 => self.oam_addr = value,
            4 => self.write_oam_data(value),
            5 => self.write_scroll(value),
            6 => self.write_addr(value),
            _ => self.write_data(value, bus),
        }
    }

    fn write_ctrl(&mut self, value: u8) {
        let nmi_was_enabled = self.ctrl & CTRL_NMI != 0;
        self.ctrl = value;
        self.t = (self.t & 0xF3FF) | (((value & 0x03) as u16) << 10);
        if !nmi_was_enabled && value & CTRL_NMI != 0 && self.vblank() {
            self.nmi_request = true;
        }
    }

    fn read_status(&mut self) -> u8 {
        let value = self.status;
        self.write_toggle = false;
        if (self.scanline, self.cycle) == (SCANLINE_POSTRENDER, 1) {
            // Racing the flag: it reads clear and neither it nor the NMI appear.
            self.suppress_vblank = true;
            self.suppress_nmi = true;
            return value & !STATUS_VBLANK;
        }
        self.status &= !STATUS_VBLANK;
        value
    }

    fn write_scroll(&mut self, value: u8) {
        let value = value as u16;
        if !self.write_toggle {
            self.t = (self.t & 0x7FE0) | (value >> 3);
            self.fine_x = (value & 0x07) as u8;
        } else {
            self.t = (self.t & 0x0C1F) | ((value & 0xF8) << 2) | ((value & 0x07) << 12);
        }
        self.write_toggle = !self.write_toggle;
    }

    fn write_addr(&mut self, value: u8) {
        let value = value as u16;
        if !self.write_toggle {
            self.t = (self.t & 0x00FF) | ((value & 0x3F) << 8);
        } else {
            self.t = (self.t & 0x7F00) | value;
            self.v = self.t;
        }
        self.write_toggle = !self.write_toggle;
    }

    fn read_data<B: PpuBus>(&mut self, bus: &mut B) -> u8 {
        let addr = self.v & 0x3FFF;
        let value = if addr >= 0x3F00 {
            // Palette bypasses the buffer; the buffer sees the nametable underneath.
            self.read_buffer = bus.ppu_read(addr - 0x1000);
            bus.ppu_read(addr)
        } else {
            std::mem::replace(&mut self.read_buffer, bus.ppu_read(addr))
        };
        self.increment_vram_addr();
        value
    }

    fn write_data<B: PpuBus>(&mut self, value: u8, bus: &mut B) {
        bus.ppu_write(self.v & 0x3FFF, value);
        self.increment_vram_addr();
    }

    #[inline]
    fn increment_vram_addr(&mut self) {
        let step = if self.ctrl & CTRL_INCREMENT_32 != 0 { 32 } else { 1 };
        self.v = self.v.wrapping_add(step) & 0x7FFF;
    }
}
