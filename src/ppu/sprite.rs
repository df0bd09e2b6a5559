#![doc = r#"
PPU sprite helpers

Responsibilities
- Keep a decoded copy of OAM (`SpriteTable`) in step with every OAM write.
- Select the sprites covering a scanline, in OAM order, honoring the
  eight-per-line limit and the overflow flag.
- Composite the selected sprites over the background row.

Priority rules
- The lowest OAM index that draws an opaque pixel owns it; later sprites
  never overwrite an owned pixel, even when the owner is hidden behind the
  background.
- A behind-background sprite (attr bit 5) only shows over a transparent
  background pixel.
- Sprite 0 drawing an opaque pixel over an opaque background pixel sets the
  hit flag (never at x = 255).
"#]

use super::*;
use crate::ppu_bus::PpuBus;

pub(crate) const SPRITE_COUNT: usize = 64;
pub(crate) const SPRITES_PER_LINE: usize = 8;

const ATTR_PALETTE: u8 = 0x03;
const ATTR_BEHIND_BG: u8 = 0x20;
const ATTR_FLIP_H: u8 = 0x40;
const ATTR_FLIP_V: u8 = 0x80;

/// OAM decoded per field.
#[derive(Clone, Debug)]
pub(crate) struct SpriteTable {
    pub y: [u8; SPRITE_COUNT],
    pub tile: [u8; SPRITE_COUNT],
    pub attr: [u8; SPRITE_COUNT],
    pub x: [u8; SPRITE_COUNT],
}

impl SpriteTable {
    pub fn filled(value: u8) -> Self {
        Self {
            y: [value; SPRITE_COUNT],
            tile: [value; SPRITE_COUNT],
            attr: [value; SPRITE_COUNT],
            x: [value; SPRITE_COUNT],
        }
    }

    /// Mirror one OAM byte write.
    #[inline]
    pub fn update(&mut self, oam_addr: u8, value: u8) {
        let i = (oam_addr >> 2) as usize;
        match oam_addr & 3 {
            0 => self.y[i] = value,
            1 => self.tile[i] = value,
            2 => self.attr[i] = value,
            _ => self.x[i] = value,
        }
    }
}

/// Sprites covering one scanline, in OAM order.
pub(crate) struct LineSprites {
    indices: [u8; SPRITE_COUNT],
    len: usize,
    overflow: bool,
}

impl LineSprites {
    pub fn as_slice(&self) -> &[u8] {
        &self.indices[..self.len]
    }

    pub fn overflow(&self) -> bool {
        self.overflow
    }
}

impl Ppu {
    #[inline]
    fn sprite_height(&self) -> i16 {
        if self.ctrl & CTRL_SPRITE_16 != 0 { 16 } else { 8 }
    }

    pub(in crate::ppu) fn evaluate_line(&self, line: i16) -> LineSprites {
        let height = self.sprite_height();
        let mut found = LineSprites {
            indices: [0; SPRITE_COUNT],
            len: 0,
            overflow: false,
        };
        for (i, &y) in self.sprites.y.iter().enumerate() {
            let row = line - (y as i16 + 1);
            if !(0..height).contains(&row) {
                continue;
            }
            if self.sprite_limit && found.len == SPRITES_PER_LINE {
                found.overflow = true;
                break;
            }
            found.indices[found.len] = i as u8;
            found.len += 1;
        }
        found
    }

    /// Pattern address of `row` (0..height, flips applied) for `tile`.
    fn sprite_pattern_addr(&self, tile: u8, row: u16) -> u16 {
        if self.ctrl & CTRL_SPRITE_16 != 0 {
            let table = ((tile & 1) as u16) << 12;
            let top = (tile & 0xFE) as u16;
            let (tile, row) = if row >= 8 { (top + 1, row - 8) } else { (top, row) };
            table | (tile << 4) | row
        } else {
            let table = if self.ctrl & CTRL_SPRITE_TABLE != 0 { 0x1000 } else { 0 };
            table | ((tile as u16) << 4) | row
        }
    }

    pub(in crate::ppu) fn render_sprites_row<B: PpuBus>(&mut self, bus: &B, line: usize) {
        let selected = self.evaluate_line(line as i16);
        if selected.overflow() {
            self.status |= STATUS_OVERFLOW;
        }

        let height = self.sprite_height();
        let show_left = self.mask & MASK_SPRITE_LEFT != 0;
        let base = line * NES_WIDTH;

        for &i in selected.as_slice() {
            let idx = i as usize;
            let attr = self.sprites.attr[idx];
            let mut row = line as i16 - (self.sprites.y[idx] as i16 + 1);
            if attr & ATTR_FLIP_V != 0 {
                row = height - 1 - row;
            }
            let addr = self.sprite_pattern_addr(self.sprites.tile[idx], row as u16);
            let (mut lo, mut hi) = (bus.ppu_read(addr), bus.ppu_read(addr + 8));
            if attr & ATTR_FLIP_H != 0 {
                lo = lo.reverse_bits();
                hi = hi.reverse_bits();
            }

            for px in 0..8usize {
                let x = self.sprites.x[idx] as usize + px;
                if x >= NES_WIDTH {
                    break;
                }
                if x < 8 && !show_left {
                    continue;
                }
                let bit = 7 - px;
                let value = (((hi >> bit) & 1) << 1) | ((lo >> bit) & 1);
                if value == 0 || self.composition[base + x].sprite.is_some() {
                    continue;
                }

                let bg_opaque = self.composition[base + x].opaque;
                if idx == 0 && bg_opaque && x != NES_WIDTH - 1 {
                    self.status |= STATUS_SPRITE0;
                }

                let entry = bus.ppu_read(0x3F10 | (((attr & ATTR_PALETTE) as u16) << 2) | value as u16);
                let color = self.palette_color(entry);
                let cell = &mut self.composition[base + x];
                cell.sprite = Some(i);
                if attr & ATTR_BEHIND_BG != 0 && bg_opaque {
                    continue;
                }
                cell.color = color;
                cell.opaque = true;
            }
        }
    }
}
