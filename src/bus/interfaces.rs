/*!
interfaces: lightweight views to decouple the PPU from the rest of the bus.

`BusPpuView` borrows only the pieces of the bus the PPU address space is made
of (nametable/palette storage and the cartridge), so the bus can hand a
`&mut Ppu` and this view out of the same `&mut Bus` at once.
*/

use crate::bus::ppu_space::PpuMemory;
use crate::cartridge::Cartridge;
use crate::ppu_bus::PpuBus;

pub(crate) struct BusPpuView<'a> {
    ppu_mem: &'a mut PpuMemory,
    cartridge: Option<&'a mut Cartridge>,
}

impl<'a> BusPpuView<'a> {
    #[inline]
    pub(crate) fn from_parts(ppu_mem: &'a mut PpuMemory, cartridge: Option<&'a mut Cartridge>) -> Self {
        Self { ppu_mem, cartridge }
    }
}

impl PpuBus for BusPpuView<'_> {
    #[inline]
    fn ppu_read(&self, addr: u16) -> u8 {
        let a = addr & 0x3FFF;
        if a < 0x2000 {
            self.cartridge.as_ref().map_or(0, |cart| cart.ppu_read(a))
        } else {
            self.ppu_mem.read(a)
        }
    }

    #[inline]
    fn ppu_write(&mut self, addr: u16, value: u8) {
        let a = addr & 0x3FFF;
        if a < 0x2000 {
            if let Some(cart) = self.cartridge.as_mut() {
                cart.ppu_write(a, value);
            }
        } else {
            self.ppu_mem.write(a, value);
        }
    }

    fn scanline_tick(&mut self) {
        if let Some(cart) = self.cartridge.as_mut() {
            cart.notify_scanline();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nametable::Mirroring;
    use crate::test_utils::build_ines;

    #[test]
    fn pattern_space_goes_to_cartridge() {
        let mut mem = PpuMemory::new(Mirroring::Horizontal);
        let mut cart = Cartridge::from_ines_bytes(&build_ines(1, 0, 0, 0, 1, None)).expect("cart");
        let mut view = BusPpuView::from_parts(&mut mem, Some(&mut cart));
        view.ppu_write(0x0123, 0x9A);
        view.ppu_write(0x2400, 0x11);
        assert_eq!(view.ppu_read(0x0123), 0x9A);
        assert_eq!(view.ppu_read(0x2000), 0x11, "horizontal: $2400 aliases $2000");
        assert_eq!(cart.ppu_read(0x0123), 0x9A);
    }

    #[test]
    fn no_cartridge_reads_zero_pattern() {
        let mut mem = PpuMemory::default();
        let mut view = BusPpuView::from_parts(&mut mem, None);
        view.ppu_write(0x0000, 0x55);
        assert_eq!(view.ppu_read(0x0000), 0);
        view.scanline_tick();
    }
}
