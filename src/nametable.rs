/*!
Nametable storage and mirroring.

The console has 2 KiB of video RAM for four logical 1 KiB nametables at
$2000/$2400/$2800/$2C00. Two physical pages back them; the mirroring mode
decides which page each logical slot lands on. Switching modes only changes
the lookup, never the page contents.

Slot -> page tables
===================
```text
    Horizontal        [0, 0, 1, 1]
    Vertical          [0, 1, 0, 1]
    SingleScreenUpper [0, 0, 0, 0]
    SingleScreenLower [1, 1, 1, 1]
```
*/

pub const PAGE_SIZE: usize = 0x400;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Mirroring {
    #[default]
    Horizontal,
    Vertical,
    SingleScreenUpper,
    SingleScreenLower,
}

/// Physical page backing logical `slot` (0..=3) under `mode`.
#[inline]
pub const fn page_for(mode: Mirroring, slot: usize) -> usize {
    match mode {
        Mirroring::Horizontal => (slot >> 1) & 1,
        Mirroring::Vertical => slot & 1,
        Mirroring::SingleScreenUpper => 0,
        Mirroring::SingleScreenLower => 1,
    }
}

#[derive(Clone, Debug)]
pub struct Nametable {
    pages: [[u8; PAGE_SIZE]; 2],
    mode: Mirroring,
}

impl Default for Nametable {
    fn default() -> Self {
        Self::new(Mirroring::default())
    }
}

impl Nametable {
    pub fn new(mode: Mirroring) -> Self {
        Self {
            pages: [[0; PAGE_SIZE]; 2],
            mode,
        }
    }

    pub fn mirroring(&self) -> Mirroring {
        self.mode
    }

    pub fn set_mirroring(&mut self, mode: Mirroring) {
        self.mode = mode;
    }

    /// Split a PPU address in $2000..=$3EFF into (page, offset).
    #[inline]
    fn locate(&self, addr: u16) -> (usize, usize) {
        let slot = ((addr as usize) & 0x0C00) >> 10;
        (page_for(self.mode, slot), (addr as usize) & (PAGE_SIZE - 1))
    }

    #[inline]
    pub fn read(&self, addr: u16) -> u8 {
        let (page, offset) = self.locate(addr);
        self.pages[page][offset]
    }

    #[inline]
    pub fn write(&mut self, addr: u16, value: u8) {
        let (page, offset) = self.locate(addr);
        self.pages[page][offset] = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertical_aliases_left_and_right_columns() {
        let mut nt = Nametable::new(Mirroring::Vertical);
        nt.write(0x2000 + 0x10, 0x55);
        assert_eq!(nt.read(0x2800 + 0x10), 0x55, "$2010 and $2810 share page 0");
        assert_eq!(nt.read(0x2400 + 0x10), 0x00, "$2410 is on page 1");
    }

    #[test]
    fn horizontal_aliases_top_and_bottom_rows() {
        let mut nt = Nametable::new(Mirroring::Horizontal);
        nt.write(0x2000 + 0x21, 0x11);
        nt.write(0x2C00 + 0x21, 0x22);
        assert_eq!(nt.read(0x2400 + 0x21), 0x11);
        assert_eq!(nt.read(0x2800 + 0x21), 0x22);
        assert_eq!(nt.read(0x2000 + 0x21), 0x11);
    }

    #[test]
    fn mode_switch_remaps_without_copying() {
        let mut nt = Nametable::new(Mirroring::Horizontal);
        nt.write(0x2000, 0xAA); // page 0
        nt.write(0x2800, 0xBB); // page 1
        nt.set_mirroring(Mirroring::SingleScreenLower);
        assert_eq!(nt.read(0x2000), 0xBB);
        assert_eq!(nt.read(0x2C00), 0xBB);
        nt.set_mirroring(Mirroring::SingleScreenUpper);
        assert_eq!(nt.read(0x2400), 0xAA);
    }

    #[test]
    fn upper_mirror_region_folds_onto_nametables() {
        let mut nt = Nametable::new(Mirroring::Vertical);
        nt.write(0x3005, 0x42);
        assert_eq!(nt.read(0x2005), 0x42);
    }

    #[test]
    fn page_table_is_pure() {
        let expected = [
            (Mirroring::Horizontal, [0, 0, 1, 1]),
            (Mirroring::Vertical, [0, 1, 0, 1]),
            (Mirroring::SingleScreenUpper, [0, 0, 0, 0]),
            (Mirroring::SingleScreenLower, [1, 1, 1, 1]),
        ];
        for (mode, pages) in expected {
            for (slot, page) in pages.iter().enumerate() {
                assert_eq!(page_for(mode, slot), *page, "{mode:?} slot {slot}");
            }
        }
    }
}
