/*!
Picture processing unit: a scanline/cycle state machine.

Timing model
- Position is (scanline, cycle) with scanline in -1..=260 and cycle in 0..=340.
  The position names the next dot to process; `step` handles it, then advances.
- Power-on position is (241, 0), so the first frame starts in vertical blank.
- Visible lines 0..=239 render a whole row at once at cycle 254 (background
  then sprites) into the composition buffer. Scroll registers follow the
  hardware copy/increment points closely enough for mid-frame splits.
- (240, 1) raises vblank (and NMI), then drains the composition buffer into
  the output framebuffer.

STRUCTURE
- `registers.rs`: CPU-visible ports and the loopy scroll arithmetic.
- `background.rs`: background row renderer.
- `sprite.rs`: OAM decoding, per-line evaluation and compositing.
- `renderer.rs`: `step`, the dot dispatch, and the framebuffer raster.
*/

use crate::config::NesConfig;

pub(crate) mod background;
pub(crate) mod registers;
pub(crate) mod renderer;
pub(crate) mod sprite;

use sprite::SpriteTable;

/// Screen width in pixels.
pub const NES_WIDTH: usize = 256;
/// Screen height in pixels.
pub const NES_HEIGHT: usize = 240;
/// Framebuffer width with overscan cropped.
pub const CROPPED_WIDTH: usize = 240;
/// Framebuffer height with overscan cropped.
pub const CROPPED_HEIGHT: usize = 224;

pub const SCANLINE_PRERENDER: i16 = -1;
pub const SCANLINE_POSTRENDER: i16 = 240;
pub const SCANLINE_LAST: i16 = 260;
pub const CYCLES_PER_LINE: u16 = 341;

pub(crate) const CTRL_INCREMENT_32: u8 = 0x04;
pub(crate) const CTRL_SPRITE_TABLE: u8 = 0x08;
pub(crate) const CTRL_BG_TABLE: u8 = 0x10;
pub(crate) const CTRL_SPRITE_16: u8 = 0x20;
pub(crate) const CTRL_NMI: u8 = 0x80;

pub(crate) const MASK_GRAYSCALE: u8 = 0x01;
pub(crate) const MASK_BG_LEFT: u8 = 0x02;
pub(crate) const MASK_SPRITE_LEFT: u8 = 0x04;
pub(crate) const MASK_SHOW_BG: u8 = 0x08;
pub(crate) const MASK_SHOW_SPRITES: u8 = 0x10;

pub(crate) const STATUS_OVERFLOW: u8 = 0x20;
pub(crate) const STATUS_SPRITE0: u8 = 0x40;
pub(crate) const STATUS_VBLANK: u8 = 0x80;

/// Canonical (approximate) NES master palette as 0x00RRGGBB.
pub const NES_PALETTE: [u32; 64] = [
    0x757575, 0x271B8F, 0x0000AB, 0x47009F, 0x8F0077, 0xAB0013, 0xA70000, 0x7F0B00,
    0x432F00, 0x004700, 0x005100, 0x003F17, 0x1B3F5F, 0x000000, 0x000000, 0x000000,
    0xBCBCBC, 0x0073EF, 0x233BEF, 0x8300F3, 0xBF00BF, 0xE7005B, 0xDB2B00, 0xCB4F0F,
    0x8B7300, 0x009700, 0x00AB00, 0x00933B, 0x00838B, 0x000000, 0x000000, 0x000000,
    0xFFFFFF, 0x3FBFFF, 0x5F97FF, 0xA78BFD, 0xF77BFF, 0xFF77B7, 0xFF7763, 0xFF9B3B,
    0xF3BF3F, 0x83D313, 0x4FDF4B, 0x58F898, 0x00EBDB, 0x000000, 0x000000, 0x000000,
    0xFFFFFF, 0xABE7FF, 0xC7D7FF, 0xD7CBFF, 0xFFC7FF, 0xFFC7DB, 0xFFBFB3, 0xFFDBAB,
    0xFFE7A3, 0xE3FFA3, 0xABF3BF, 0xB3FFCF, 0x9FFFF3, 0x000000, 0x000000, 0x000000,
];

/// One entry of the composition buffer.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Pixel {
    /// Final 0x00RRGGBB color.
    pub color: u32,
    /// Something non-transparent was drawn here.
    pub opaque: bool,
    /// OAM index of the sprite that owns this pixel.
    pub sprite: Option<u8>,
}

pub struct Ppu {
    // CPU-visible registers
    ctrl: u8,
    mask: u8,
    status: u8,
    oam_addr: u8,

    // Scroll/address latches (15-bit v and t, 3-bit fine X, shared toggle)
    v: u16,
    t: u16,
    fine_x: u8,
    write_toggle: bool,
    read_buffer: u8,

    oam: [u8; 256],
    sprites: SpriteTable,

    scanline: i16,
    cycle: u16,
    frame: u64,

    suppress_vblank: bool,
    suppress_nmi: bool,
    nmi_request: bool,
    frame_ready: bool,

    composition: Vec<Pixel>,
    framebuffer: Vec<u32>,

    sprite_limit: bool,
    overscan_crop: bool,
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Ppu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ppu")
            .field("ctrl", &self.ctrl)
            .field("mask", &self.mask)
            .field("status", &self.status)
            .field("v", &self.v)
            .field("t", &self.t)
            .field("scanline", &self.scanline)
            .field("cycle", &self.cycle)
            .field("frame", &self.frame)
            .finish()
    }
}

impl Ppu {
    pub fn new() -> Self {
        Self::with_config(&NesConfig::default())
    }

    pub fn with_config(config: &NesConfig) -> Self {
        let (w, h) = frame_dimensions(config.overscan_crop);
        Self {
            ctrl: 0,
            mask: 0,
            status: 0,
            oam_addr: 0,
            v: 0,
            t: 0,
            fine_x: 0,
            write_toggle: false,
            read_buffer: 0,
            oam: [0xFF; 256],
            sprites: SpriteTable::filled(0xFF),
            scanline: 241,
            cycle: 0,
            frame: 0,
            suppress_vblank: false,
            suppress_nmi: false,
            nmi_request: false,
            frame_ready: false,
            composition: vec![Pixel::default(); NES_WIDTH * NES_HEIGHT],
            framebuffer: vec![0; w * h],
            sprite_limit: config.sprite_limit,
            overscan_crop: config.overscan_crop,
        }
    }

    /// Reset line: registers and latches clear, memory and position are kept.
    pub fn reset(&mut self) {
        self.ctrl = 0;
        self.mask = 0;
        self.write_toggle = false;
        self.read_buffer = 0;
        self.fine_x = 0;
        self.t = 0;
        self.suppress_vblank = false;
        self.suppress_nmi = false;
        self.nmi_request = false;
        log::debug!("ppu reset at ({}, {})", self.scanline, self.cycle);
    }

    /// (scanline, cycle) of the next dot to process.
    pub fn position(&self) -> (i16, u16) {
        (self.scanline, self.cycle)
    }

    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    pub fn framebuffer(&self) -> &[u32] {
        &self.framebuffer
    }

    /// (width, height) of `framebuffer`.
    pub fn frame_dimensions(&self) -> (usize, usize) {
        frame_dimensions(self.overscan_crop)
    }

    pub fn take_frame_ready(&mut self) -> bool {
        std::mem::take(&mut self.frame_ready)
    }

    pub fn take_nmi_request(&mut self) -> bool {
        std::mem::take(&mut self.nmi_request)
    }

    pub fn ctrl(&self) -> u8 {
        self.ctrl
    }

    pub fn mask(&self) -> u8 {
        self.mask
    }

    /// Status register without read side effects.
    pub fn status(&self) -> u8 {
        self.status
    }

    pub fn vram_addr(&self) -> u16 {
        self.v
    }

    pub fn temp_addr(&self) -> u16 {
        self.t
    }

    pub fn fine_x(&self) -> u8 {
        self.fine_x
    }

    pub fn oam(&self) -> &[u8; 256] {
        &self.oam
    }

    pub fn vblank(&self) -> bool {
        self.status & STATUS_VBLANK != 0
    }

    pub fn sprite_zero_hit(&self) -> bool {
        self.status & STATUS_SPRITE0 != 0
    }

    pub fn sprite_overflow(&self) -> bool {
        self.status & STATUS_OVERFLOW != 0
    }

    #[inline]
    pub fn rendering_enabled(&self) -> bool {
        self.mask & (MASK_SHOW_BG | MASK_SHOW_SPRITES) != 0
    }

    /// OAM data port write; also the DMA sink.
    pub fn write_oam_data(&mut self, value: u8) {
        self.oam[self.oam_addr as usize] = value;
        self.sprites.update(self.oam_addr, value);
        self.oam_addr = self.oam_addr.wrapping_add(1);
    }

    /// Map a 6-bit palette entry to its output color under the current mask.
    #[inline]
    pub(crate) fn palette_color(&self, entry: u8) -> u32 {
        let entry = if self.mask & MASK_GRAYSCALE != 0 {
            entry & 0x30
        } else {
            entry & 0x3F
        };
        NES_PALETTE[entry as usize]
    }
}

const fn frame_dimensions(crop: bool) -> (usize, usize) {
    if crop {
        (CROPPED_WIDTH, CROPPED_HEIGHT)
    } else {
        (NES_WIDTH, NES_HEIGHT)
    }
}
