#![doc = r#"
PPU background renderer

One call paints a full scanline of background into the composition buffer.
Tiles are fetched at `v` (coarse X advancing per tile, wrapping into the
neighbouring nametable), and pushed through a 16-bit low/high shift pair so
the tile being emitted and the next tile are both in flight; fine X selects
which of the 16 bits is emitted.

Attribute lookups use two precomputed tables indexed by the low 10 bits of
`v` (coarse Y and coarse X):
- `ATTR_LOC`: offset of the attribute byte within the nametable
- `ATTR_SHIFT`: shift of the 2-bit palette group within that byte
"#]

use super::registers::increment_coarse_x;
use super::*;
use crate::ppu_bus::PpuBus;

const fn build_attr_loc() -> [u16; 0x400] {
    let mut table = [0u16; 0x400];
    let mut i = 0;
    while i < 0x400 {
        table[i] = (((i >> 2) & 0x07) | ((i >> 4) & 0x38) | 0x3C0) as u16;
        i += 1;
    }
    table
}

const fn build_attr_shift() -> [u8; 0x400] {
    let mut table = [0u8; 0x400];
    let mut i = 0;
    while i < 0x400 {
        table[i] = (((i >> 4) & 0x04) | (i & 0x02)) as u8;
        i += 1;
    }
    table
}

pub(crate) static ATTR_LOC: [u16; 0x400] = build_attr_loc();
pub(crate) static ATTR_SHIFT: [u8; 0x400] = build_attr_shift();

#[derive(Copy, Clone, Debug, Default)]
struct TileFetch {
    lo: u8,
    hi: u8,
    palette: u8,
}

impl Ppu {
    fn fetch_tile<B: PpuBus>(&self, bus: &B) -> TileFetch {
        let v = self.v;
        let tile = bus.ppu_read(0x2000 | (v & 0x0FFF)) as u16;
        let i = (v & 0x03FF) as usize;
        let attr = bus.ppu_read(0x2000 | (v & 0x0C00) | ATTR_LOC[i]);
        let base = if self.ctrl & CTRL_BG_TABLE != 0 { 0x1000 } else { 0 };
        let addr = base | (tile << 4) | ((v >> 12) & 0x07);
        TileFetch {
            lo: bus.ppu_read(addr),
            hi: bus.ppu_read(addr + 8),
            palette: (attr >> ATTR_SHIFT[i]) & 0x03,
        }
    }

    fn fetch_and_advance<B: PpuBus>(&mut self, bus: &B) -> TileFetch {
        let tile = self.fetch_tile(bus);
        self.v = increment_coarse_x(self.v);
        tile
    }

    pub(in crate::ppu) fn backdrop_color<B: PpuBus>(&self, bus: &B) -> u32 {
        self.palette_color(bus.ppu_read(0x3F00))
    }

    /// Background hidden: the whole row shows the universal backdrop.
    pub(in crate::ppu) fn fill_backdrop_row<B: PpuBus>(&mut self, bus: &B, line: usize) {
        let backdrop = Pixel {
            color: self.backdrop_color(bus),
            ..Pixel::default()
        };
        self.composition[line * NES_WIDTH..(line + 1) * NES_WIDTH].fill(backdrop);
    }

    pub(in crate::ppu) fn render_background_row<B: PpuBus>(&mut self, bus: &B, line: usize) {
        let backdrop = self.backdrop_color(bus);
        let fine_x = self.fine_x as usize;
        let show_left = self.mask & MASK_BG_LEFT != 0;

        let first = self.fetch_and_advance(bus);
        let second = self.fetch_and_advance(bus);
        let mut lo = u16::from_be_bytes([first.lo, second.lo]);
        let mut hi = u16::from_be_bytes([first.hi, second.hi]);
        // [emitting, next]
        let mut groups = [first.palette, second.palette];

        let row = line * NES_WIDTH;
        for tile in 0..NES_WIDTH / 8 {
            for px in 0..8 {
                let x = tile * 8 + px;
                let b = px + fine_x;
                let bit = 15 - b;
                let value = ((((hi >> bit) & 1) << 1) | ((lo >> bit) & 1)) as u8;

                self.composition[row + x] = if value == 0 || (x < 8 && !show_left) {
                    Pixel {
                        color: backdrop,
                        ..Pixel::default()
                    }
                } else {
                    let group = if b < 8 { groups[0] } else { groups[1] };
                    let entry = bus.ppu_read(0x3F00 | ((group as u16) << 2) | value as u16);
                    Pixel {
                        color: self.palette_color(entry),
                        opaque: true,
                        sprite: None,
                    }
                };
            }

            if tile + 1 < NES_WIDTH / 8 {
                let next = self.fetch_and_advance(bus);
                lo = (lo << 8) | next.lo as u16;
                hi = (hi << 8) | next.hi as u16;
                groups = [groups[1], next.palette];
            }
        }
    }
}
