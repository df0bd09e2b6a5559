/*!
Standard controller on $4016/$4017.

Buttons form a bitmask in the order the CPU shifts them out:
A, B, Select, Start, Up, Down, Left, Right (bit 0 through bit 7).

- Writing bit 0 = 1 to $4016 holds the strobe: the live buttons are latched
  continuously and every read returns A.
- Writing bit 0 = 0 releases it; reads then shift out one button per read,
  and return 1 after the eighth.
*/

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Button {
    A,
    B,
    Select,
    Start,
    Up,
    Down,
    Left,
    Right,
}

impl Button {
    #[inline]
    pub const fn mask(self) -> u8 {
        1 << (self as u8)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Controller {
    buttons: u8,
    latched: u8,
    strobe: bool,
    index: u8,
}

impl Controller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_button(&mut self, button: Button, pressed: bool) {
        if pressed {
            self.buttons |= button.mask();
        } else {
            self.buttons &= !button.mask();
        }
    }

    /// Replace the live button state (bit set = pressed).
    pub fn set_state_mask(&mut self, mask: u8) {
        self.buttons = mask;
    }

    pub fn state_mask(&self) -> u8 {
        self.buttons
    }

    pub fn write_strobe(&mut self, value: u8) {
        self.strobe = value & 1 != 0;
        if self.strobe {
            self.latch();
        }
    }

    /// Serial read; only bit 0 is meaningful.
    pub fn read(&mut self) -> u8 {
        if self.strobe {
            self.latch();
            return self.latched & 1;
        }
        if self.index >= 8 {
            return 1;
        }
        let bit = (self.latched >> self.index) & 1;
        self.index += 1;
        bit
    }

    #[inline]
    fn latch(&mut self) {
        self.latched = self.buttons;
        self.index = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_shift_behaviour() {
        let mut c = Controller::new();
        c.set_state_mask(Button::A.mask() | Button::Start.mask() | Button::Left.mask());

        c.write_strobe(1);
        c.write_strobe(0);

        for expected in [1, 0, 0, 1, 0, 0, 1, 0] {
            assert_eq!(c.read(), expected);
        }
        assert_eq!(c.read(), 1, "reads past the eighth return 1");
    }

    #[test]
    fn strobe_high_always_returns_a() {
        let mut c = Controller::new();
        c.set_button(Button::A, true);
        c.write_strobe(1);
        for _ in 0..16 {
            assert_eq!(c.read(), 1);
        }
        c.set_button(Button::A, false);
        assert_eq!(c.read(), 0);
    }

    #[test]
    fn latch_snapshot_ignores_later_presses() {
        let mut c = Controller::new();
        c.write_strobe(1);
        c.write_strobe(0);
        c.set_button(Button::A, true);
        assert_eq!(c.read(), 0);
    }
}
