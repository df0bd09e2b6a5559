#![doc = r#"
PPU address-space storage owned by the bus.

```text
    $0000-$1FFF  pattern tables       -> cartridge (not stored here)
    $2000-$2FFF  nametables           -> `Nametable` (2 pages + mirroring)
    $3000-$3EFF  mirror of $2000-$2EFF
    $3F00-$3FFF  palette RAM, 32 bytes repeating
```

Palette quirk: $3F10/$3F14/$3F18/$3F1C alias $3F00/$3F04/$3F08/$3F0C, so the
sprite palettes share their transparent slot with the background ones.
"#]

use crate::nametable::{Mirroring, Nametable};

/// Palette RAM byte index (0..=31) for a PPU address in $3F00-$3FFF.
#[inline]
pub fn map_palette_addr(addr: u16) -> usize {
    let mut idx = (addr as usize) & 0x1F;
    if (idx & 0x13) == 0x10 {
        idx &= 0x0F;
    }
    idx
}

#[derive(Clone, Debug, Default)]
pub struct PpuMemory {
    pub nametable: Nametable,
    palette: [u8; 32],
}

impl PpuMemory {
    pub fn new(mirroring: Mirroring) -> Self {
        Self {
            nametable: Nametable::new(mirroring),
            palette: [0; 32],
        }
    }

    /// Read from $2000-$3FFF. Pattern space is the caller's concern.
    #[inline]
    pub fn read(&self, addr: u16) -> u8 {
        let a = addr & 0x3FFF;
        if a >= 0x3F00 {
            self.palette[map_palette_addr(a)]
        } else {
            self.nametable.read(a)
        }
    }

    #[inline]
    pub fn write(&mut self, addr: u16, value: u8) {
        let a = addr & 0x3FFF;
        if a >= 0x3F00 {
            self.palette[map_palette_addr(a)] = value & 0x3F;
        } else {
            self.nametable.write(a, value);
        }
    }

    pub fn palette(&self) -> &[u8; 32] {
        &self.palette
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_mirrors_every_32_bytes() {
        assert_eq!(map_palette_addr(0x3F00), 0);
        assert_eq!(map_palette_addr(0x3F1F), 0x1F);
        assert_eq!(map_palette_addr(0x3F20), 0);
        assert_eq!(map_palette_addr(0x3FE5), 5);
    }

    #[test]
    fn sprite_transparent_slots_alias_background() {
        for (alias, base) in [(0x3F10, 0), (0x3F14, 4), (0x3F18, 8), (0x3F1C, 12)] {
            assert_eq!(map_palette_addr(alias), base);
        }
        assert_eq!(map_palette_addr(0x3F11), 0x11, "opaque sprite slots are distinct");
    }

    #[test]
    fn palette_and_nametable_routing() {
        let mut mem = PpuMemory::new(Mirroring::Vertical);
        mem.write(0x3F10, 0x2D);
        assert_eq!(mem.read(0x3F00), 0x2D);
        mem.write(0x3F01, 0xFF);
        assert_eq!(mem.read(0x3F01), 0x3F, "palette entries are 6 bits");

        mem.write(0x2010, 0x42);
        assert_eq!(mem.read(0x2810), 0x42);
        assert_eq!(mem.read(0x3010), 0x42);
    }
}
