/*!
flags.rs - Processor status value type and pure flag functions.

6502 status layout:

```text
    Bit: 7 6 5 4 3 2 1 0
         N V 1 B D I Z C
```

Bit 5 reads as 1 on hardware, so every constructor and mutator of `Status`
forces it on. B only exists on the stack copy: BRK/PHP push it set,
IRQ/NMI push it clear, PLP/RTI drop it.

The ALU helpers take the current status and return the new one alongside
any result byte; none of them touch registers or memory.
*/

use std::fmt;

#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Status(u8);

impl Status {
    pub const CARRY: u8 = 0b0000_0001;
    pub const ZERO: u8 = 0b0000_0010;
    pub const IRQ_DISABLE: u8 = 0b0000_0100;
    pub const DECIMAL: u8 = 0b0000_1000;
    pub const BREAK: u8 = 0b0001_0000;
    pub const UNUSED: u8 = 0b0010_0000;
    pub const OVERFLOW: u8 = 0b0100_0000;
    pub const NEGATIVE: u8 = 0b1000_0000;

    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits | Self::UNUSED)
    }

    /// Status as loaded by PLP/RTI: B dropped, U forced.
    #[inline]
    pub const fn from_stack(bits: u8) -> Self {
        Self::from_bits(bits & !Self::BREAK)
    }

    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Byte pushed to the stack; `brk` selects the B bit (BRK/PHP vs IRQ/NMI).
    #[inline]
    pub const fn to_stack(self, brk: bool) -> u8 {
        if brk {
            self.0 | Self::BREAK | Self::UNUSED
        } else {
            (self.0 & !Self::BREAK) | Self::UNUSED
        }
    }

    #[inline]
    pub const fn contains(self, mask: u8) -> bool {
        self.0 & mask != 0
    }

    #[inline]
    pub fn set(&mut self, mask: u8, on: bool) {
        if on {
            self.0 |= mask;
        } else {
            self.0 &= !mask;
        }
        self.0 |= Self::UNUSED;
    }

    #[inline]
    #[must_use]
    pub fn with(mut self, mask: u8, on: bool) -> Self {
        self.set(mask, on);
        self
    }

    #[inline]
    pub const fn carry(self) -> bool {
        self.contains(Self::CARRY)
    }

    #[inline]
    pub const fn zero(self) -> bool {
        self.contains(Self::ZERO)
    }

    #[inline]
    pub const fn irq_disabled(self) -> bool {
        self.contains(Self::IRQ_DISABLE)
    }

    #[inline]
    pub const fn decimal(self) -> bool {
        self.contains(Self::DECIMAL)
    }

    #[inline]
    pub const fn overflow(self) -> bool {
        self.contains(Self::OVERFLOW)
    }

    #[inline]
    pub const fn negative(self) -> bool {
        self.contains(Self::NEGATIVE)
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::from_bits(0)
    }
}

impl fmt::Debug for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: &[u8; 8] = b"NV-BDIZC";
        let mut text = String::with_capacity(8);
        for (i, &name) in NAMES.iter().enumerate() {
            let bit = 0x80 >> i;
            text.push(if self.0 & bit != 0 {
                name as char
            } else {
                '.'
            });
        }
        write!(f, "Status({text} ${:02X})", self.0)
    }
}

// ---------------------------------------------------------------------------
// Pure flag functions
// ---------------------------------------------------------------------------

/// Set Z and N from `v`.
#[inline]
#[must_use]
pub fn zn(status: Status, v: u8) -> Status {
    status
        .with(Status::ZERO, v == 0)
        .with(Status::NEGATIVE, v & 0x80 != 0)
}

/// A + M + C.
#[must_use]
pub fn adc(status: Status, a: u8, v: u8) -> (u8, Status) {
    #[cfg(feature = "decimal")]
    if status.decimal() {
        return adc_decimal(status, a, v);
    }
    adc_binary(status, a, v)
}

/// A - M - !C, i.e. A + !M + C.
#[must_use]
pub fn sbc(status: Status, a: u8, v: u8) -> (u8, Status) {
    #[cfg(feature = "decimal")]
    if status.decimal() {
        return sbc_decimal(status, a, v);
    }
    adc_binary(status, a, v ^ 0xFF)
}

fn adc_binary(status: Status, a: u8, v: u8) -> (u8, Status) {
    let sum = a as u16 + v as u16 + u16::from(status.carry());
    let r = sum as u8;
    let status = zn(status, r)
        .with(Status::CARRY, sum > 0xFF)
        .with(Status::OVERFLOW, (!(a ^ v) & (a ^ r) & 0x80) != 0);
    (r, status)
}

/// NMOS decimal add: Z from the binary sum, N and V from the high nibble
/// before the final adjust.
#[cfg(feature = "decimal")]
fn adc_decimal(status: Status, a: u8, v: u8) -> (u8, Status) {
    let c = u16::from(status.carry());
    let binary = (a as u16 + v as u16 + c) as u8;

    let mut lo = (a & 0x0F) as u16 + (v & 0x0F) as u16 + c;
    if lo > 9 {
        lo += 6;
    }
    let mut hi = (a >> 4) as u16 + (v >> 4) as u16 + u16::from(lo > 0x0F);
    let unadjusted = ((hi << 4) | (lo & 0x0F)) as u8;
    if hi > 9 {
        hi += 6;
    }
    let r = ((hi << 4) | (lo & 0x0F)) as u8;

    let status = status
        .with(Status::ZERO, binary == 0)
        .with(Status::NEGATIVE, unadjusted & 0x80 != 0)
        .with(
            Status::OVERFLOW,
            (!(a ^ v) & (a ^ unadjusted) & 0x80) != 0,
        )
        .with(Status::CARRY, hi > 0x0F);
    (r, status)
}

/// NMOS decimal subtract: flags match the binary subtraction.
#[cfg(feature = "decimal")]
fn sbc_decimal(status: Status, a: u8, v: u8) -> (u8, Status) {
    let borrow = i16::from(!status.carry());
    let (_, flags) = adc_binary(status, a, v ^ 0xFF);

    let mut lo = (a & 0x0F) as i16 - (v & 0x0F) as i16 - borrow;
    let mut hi = (a >> 4) as i16 - (v >> 4) as i16;
    if lo < 0 {
        lo -= 6;
        hi -= 1;
    }
    if hi < 0 {
        hi -= 6;
    }
    let r = ((hi << 4) | (lo & 0x0F)) as u8;
    (r, flags)
}

/// CMP/CPX/CPY: C = reg >= v, Z/N from reg - v.
#[inline]
#[must_use]
pub fn compare(status: Status, reg: u8, v: u8) -> Status {
    zn(status, reg.wrapping_sub(v)).with(Status::CARRY, reg >= v)
}

/// BIT: Z from A & M, N and V copied from M bits 7 and 6.
#[inline]
#[must_use]
pub fn bit(status: Status, a: u8, v: u8) -> Status {
    status
        .with(Status::ZERO, a & v == 0)
        .with(Status::NEGATIVE, v & 0x80 != 0)
        .with(Status::OVERFLOW, v & 0x40 != 0)
}

#[must_use]
pub fn asl(status: Status, v: u8) -> (u8, Status) {
    let r = v << 1;
    (r, zn(status, r).with(Status::CARRY, v & 0x80 != 0))
}

#[must_use]
pub fn lsr(status: Status, v: u8) -> (u8, Status) {
    let r = v >> 1;
    (r, zn(status, r).with(Status::CARRY, v & 0x01 != 0))
}

#[must_use]
pub fn rol(status: Status, v: u8) -> (u8, Status) {
    let r = (v << 1) | u8::from(status.carry());
    (r, zn(status, r).with(Status::CARRY, v & 0x80 != 0))
}

#[must_use]
pub fn ror(status: Status, v: u8) -> (u8, Status) {
    let r = (v >> 1) | (u8::from(status.carry()) << 7);
    (r, zn(status, r).with(Status::CARRY, v & 0x01 != 0))
}
