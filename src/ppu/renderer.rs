#![doc = r#"
PPU renderer module

Responsibilities
- `Ppu::step`: process the dot at the current position, then advance.
- Dot dispatch for visible lines, vertical blank and the pre-render line.
- Raster the composition buffer into the output framebuffer once per frame.

Dot map
    0..=239, 254   render background row (or backdrop), then sprites
    0..=239, 256   increment Y, copy horizontal bits t -> v   (rendering on)
    -1..=239, 260  scanline clock to the cartridge            (rendering on)
    240, 1         vblank + NMI (unless suppressed), raster, frame ready
    260, 1         vblank cleared
    -1, 1          sprite 0 hit and overflow cleared
    -1, 304        v = t                                      (rendering on)
"#]

use super::registers::{copy_horizontal, increment_y};
use super::*;
use crate::ppu_bus::PpuBus;

impl Ppu {
    /// Advance one PPU dot (invoked 3x per CPU cycle by the bus).
    pub fn step<B: PpuBus>(&mut self, bus: &mut B) {
        match (self.scanline, self.cycle) {
            (line @ 0..=239, 254) => {
                let line = line as usize;
                if self.mask & MASK_SHOW_BG != 0 {
                    self.render_background_row(bus, line);
                } else {
                    self.fill_backdrop_row(bus, line);
                }
                if self.mask & MASK_SHOW_SPRITES != 0 {
                    self.render_sprites_row(bus, line);
                }
            }
            (0..=239, 256) if self.rendering_enabled() => {
                self.v = copy_horizontal(increment_y(self.v), self.t);
            }
            (-1..=239, 260) if self.rendering_enabled() => bus.scanline_tick(),
            (SCANLINE_POSTRENDER, 1) => self.enter_vblank(),
            (SCANLINE_LAST, 1) => self.status &= !STATUS_VBLANK,
            (SCANLINE_PRERENDER, 1) => self.status &= !(STATUS_SPRITE0 | STATUS_OVERFLOW),
            (SCANLINE_PRERENDER, 304) if self.rendering_enabled() => self.v = self.t,
            _ => {}
        }
        self.advance();
    }

    #[inline]
    fn advance(&mut self) {
        self.cycle += 1;
        if self.cycle == CYCLES_PER_LINE {
            self.cycle = 0;
            self.scanline += 1;
            if self.scanline > SCANLINE_LAST {
                self.scanline = SCANLINE_PRERENDER;
                self.frame = self.frame.wrapping_add(1);
            }
        }
    }

    fn enter_vblank(&mut self) {
        if !self.suppress_vblank {
            self.status |= STATUS_VBLANK;
        }
        if !self.suppress_nmi && self.ctrl & CTRL_NMI != 0 {
            self.nmi_request = true;
        }
        self.raster();
        self.frame_ready = true;
        self.suppress_vblank = false;
        self.suppress_nmi = false;
    }

    /// Drain the composition buffer into the framebuffer, clearing as it goes.
    fn raster(&mut self) {
        let crop = self.overscan_crop;
        let mut out = 0;
        for y in 0..NES_HEIGHT {
            for x in 0..NES_WIDTH {
                let pixel = std::mem::take(&mut self.composition[y * NES_WIDTH + x]);
                if crop && (y < 8 || y > 231 || x < 8 || x > 247) {
                    continue;
                }
                self.framebuffer[out] = pixel.color;
                out += 1;
            }
        }
    }
}
