/*!
PPU bus abstraction.

The PPU reaches its 14-bit address space only through this trait:
- $0000-$1FFF pattern tables (cartridge CHR)
- $2000-$3EFF nametables (mirrored per the active mode)
- $3F00-$3FFF palette RAM (32 bytes, mirrored)

The bus hands the PPU a short-lived view over the fields it needs, so the PPU
can be stepped while the rest of the bus stays borrowable.
*/

pub trait PpuBus {
    /// Read a byte from PPU address space. Callers pass the raw address;
    /// implementations mask to $0000-$3FFF.
    fn ppu_read(&self, addr: u16) -> u8;

    /// Write a byte into PPU address space (CHR RAM, nametables, palette).
    fn ppu_write(&mut self, addr: u16, value: u8);

    /// Scanline clock for boards with a scanline counter.
    fn scanline_tick(&mut self) {}
}

/// Flat PPU address space for unit tests: 8 KiB pattern, 4 KiB nametable
/// (no mirroring between the four tables), palette with the $3F1x aliases.
#[cfg(test)]
pub(crate) mod mock {
    use super::PpuBus;

    pub struct MockPpuBus {
        pub pattern: Vec<u8>,
        pub nametable: [u8; 0x1000],
        pub palette: [u8; 32],
        pub scanline_ticks: u32,
    }

    impl Default for MockPpuBus {
        fn default() -> Self {
            Self {
                pattern: vec![0; 0x2000],
                nametable: [0; 0x1000],
                palette: [0; 32],
                scanline_ticks: 0,
            }
        }
    }

    fn palette_index(addr: u16) -> usize {
        let mut idx = (addr & 0x1F) as usize;
        if idx >= 16 && (idx & 0x03) == 0 {
            idx -= 16;
        }
        idx
    }

    impl MockPpuBus {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl PpuBus for MockPpuBus {
        fn ppu_read(&self, addr: u16) -> u8 {
            let a = addr & 0x3FFF;
            match a {
                0x0000..=0x1FFF => self.pattern[a as usize],
                0x2000..=0x3EFF => self.nametable[(a & 0x0FFF) as usize],
                _ => self.palette[palette_index(a)],
            }
        }

        fn ppu_write(&mut self, addr: u16, value: u8) {
            let a = addr & 0x3FFF;
            match a {
                0x0000..=0x1FFF => self.pattern[a as usize] = value,
                0x2000..=0x3EFF => self.nametable[(a & 0x0FFF) as usize] = value,
                _ => self.palette[palette_index(a)] = value,
            }
        }

        fn scanline_tick(&mut self) {
            self.scanline_ticks += 1;
        }
    }

    #[test]
    fn palette_aliases_share_storage() {
        let mut mock = MockPpuBus::new();
        mock.ppu_write(0x3F10, 0x09);
        assert_eq!(mock.ppu_read(0x3F00), 0x09);
        mock.ppu_write(0x3F04, 0x11);
        assert_eq!(mock.ppu_read(0x3F14), 0x11);
        assert_eq!(mock.ppu_read(0x3F24), 0x11);
    }

    #[test]
    fn nametable_region_mirrors_at_3000() {
        let mut mock = MockPpuBus::new();
        mock.ppu_write(0x2005, 0x55);
        assert_eq!(mock.ppu_read(0x3005), 0x55);
    }
}
