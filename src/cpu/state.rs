/*!
state.rs - 6502 architectural state (registers + status) and stack helpers.

`CpuState` holds only what software can observe. Decode, timing and
interrupt policy live in `dispatch` and `core`.

The stack lives in page $01; `sp` is the offset of the next free slot and
wraps within the page.
*/

use crate::cpu::CpuBus;
use crate::cpu::flags::Status;

const STACK_PAGE: u16 = 0x0100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuState {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub sp: u8,
    pub pc: u16,
    pub status: Status,
}

impl Default for CpuState {
    /// Power-on values before the reset sequence runs.
    fn default() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            sp: 0xFD,
            pc: 0x0000,
            status: Status::from_bits(Status::IRQ_DISABLE),
        }
    }
}

impl CpuState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset sequence: A=X=Y=0, SP=$FD, P=U|Z, PC from $FFFC/$FFFD.
    pub fn reset<B: CpuBus + ?Sized>(&mut self, bus: &mut B) {
        self.a = 0;
        self.x = 0;
        self.y = 0;
        self.sp = 0xFD;
        self.status = Status::from_bits(Status::ZERO);
        self.pc = bus.read_word(0xFFFC);
    }

    #[inline]
    pub fn set_zn(&mut self, v: u8) {
        self.status = crate::cpu::flags::zn(self.status, v);
    }

    /// Read the byte at PC and advance past it.
    #[inline]
    pub(crate) fn fetch<B: CpuBus + ?Sized>(&mut self, bus: &mut B) -> u8 {
        let v = bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        v
    }

    #[inline]
    pub(crate) fn fetch_word<B: CpuBus + ?Sized>(&mut self, bus: &mut B) -> u16 {
        let lo = self.fetch(bus) as u16;
        let hi = self.fetch(bus) as u16;
        (hi << 8) | lo
    }

    #[inline]
    pub(crate) fn push<B: CpuBus + ?Sized>(&mut self, bus: &mut B, v: u8) {
        bus.write(STACK_PAGE | self.sp as u16, v);
        self.sp = self.sp.wrapping_sub(1);
    }

    #[inline]
    pub(crate) fn pop<B: CpuBus + ?Sized>(&mut self, bus: &mut B) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        bus.read(STACK_PAGE | self.sp as u16)
    }

    /// High byte first, so the low byte ends up at the lower address.
    pub(crate) fn push_word<B: CpuBus + ?Sized>(&mut self, bus: &mut B, v: u16) {
        self.push(bus, (v >> 8) as u8);
        self.push(bus, v as u8);
    }

    pub(crate) fn pop_word<B: CpuBus + ?Sized>(&mut self, bus: &mut B) -> u16 {
        let lo = self.pop(bus) as u16;
        let hi = self.pop(bus) as u16;
        (hi << 8) | lo
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::test_bus::FlatBus;

    #[test]
    fn reset_loads_vector_and_defaults() {
        let mut bus = FlatBus::with_program(0xC123, &[0xEA]);
        let mut s = CpuState {
            a: 1,
            x: 2,
            y: 3,
            sp: 0x10,
            pc: 0,
            status: Status::from_bits(0xFF),
        };
        s.reset(&mut bus);
        assert_eq!((s.a, s.x, s.y, s.sp, s.pc), (0, 0, 0, 0xFD, 0xC123));
        assert_eq!(s.status.bits(), Status::UNUSED | Status::ZERO);
    }

    #[test]
    fn stack_push_pop_wraps_in_page_one() {
        let mut bus = FlatBus::new();
        let mut s = CpuState::new();
        s.sp = 0x00;
        s.push(&mut bus, 0xAB);
        assert_eq!(bus.mem[0x0100], 0xAB);
        assert_eq!(s.sp, 0xFF);
        assert_eq!(s.pop(&mut bus), 0xAB);
        assert_eq!(s.sp, 0x00);
    }

    #[test]
    fn word_stack_order() {
        let mut bus = FlatBus::new();
        let mut s = CpuState::new();
        s.push_word(&mut bus, 0x1234);
        assert_eq!(bus.mem[0x01FD], 0x12);
        assert_eq!(bus.mem[0x01FC], 0x34);
        assert_eq!(s.pop_word(&mut bus), 0x1234);
        assert_eq!(s.sp, 0xFD);
    }

    #[test]
    fn fetch_advances_pc() {
        let mut bus = FlatBus::new();
        bus.load(0xFFFF, &[0x34]);
        bus.mem[0x0000] = 0x12;
        let mut s = CpuState::new();
        s.pc = 0xFFFF;
        assert_eq!(s.fetch_word(&mut bus), 0x1234);
        assert_eq!(s.pc, 0x0001);
    }
}
