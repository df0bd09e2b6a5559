/*!
RAM module: the 2 KiB CPU work RAM.

- $0000-$07FF: 2 KiB internal RAM
- $0800-$1FFF: three mirrors (address & 0x07FF)
*/

pub const CPU_RAM_SIZE: usize = 0x0800;

#[derive(Clone, Debug)]
pub struct Ram {
    data: [u8; CPU_RAM_SIZE],
}

impl Default for Ram {
    fn default() -> Self {
        Self::new()
    }
}

impl Ram {
    pub fn new() -> Self {
        Self {
            data: [0; CPU_RAM_SIZE],
        }
    }

    #[inline]
    pub fn read(&self, addr: u16) -> u8 {
        self.data[Self::mirror_index(addr)]
    }

    #[inline]
    pub fn write(&mut self, addr: u16, value: u8) {
        self.data[Self::mirror_index(addr)] = value;
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn mirror_index(addr: u16) -> usize {
        (addr as usize) & (CPU_RAM_SIZE - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::{CPU_RAM_SIZE, Ram};

    #[test]
    fn power_on_zeroed() {
        let r = Ram::new();
        assert_eq!(r.as_slice().len(), CPU_RAM_SIZE);
        assert!(r.as_slice().iter().all(|&b| b == 0));
    }

    #[test]
    fn all_mirrors_alias() {
        let mut r = Ram::new();
        r.write(0x0001, 0xAA);
        for mirror in [0x0001, 0x0801, 0x1001, 0x1801] {
            assert_eq!(r.read(mirror), 0xAA);
        }
        r.write(0x1FFF, 0x55);
        assert_eq!(r.read(0x07FF), 0x55);
    }
}
