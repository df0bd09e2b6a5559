/*!
addressing.rs - 6502 addressing modes and operand resolution.

Overview
========
`resolve` consumes the operand bytes after the opcode (PC already points
past the opcode) and turns them into an `Operand`:

- `Implied` / `Accumulator`: nothing fetched.
- `Address(ea)`: every other mode, immediate included (its address is the
  operand byte itself). The value is not read here; stores must not read
  and RMW reads exactly once in `execute`.

Page crossing is reported for abs,X / abs,Y / (zp),Y (and for the branch
target of relative mode); whether it costs a cycle is the operation's call.

Quirks
======
- Zero-page indexing wraps inside page zero.
- (zp,X) and (zp),Y read their pointer from page zero with wrap ($FF -> $00).
- JMP ($xxFF) takes the high byte from $xx00, not the next page.
*/

use crate::cpu::CpuBus;
use crate::cpu::state::CpuState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddrMode {
    Implied,
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    Indirect,
    IndirectX,
    IndirectY,
    Relative,
}

impl AddrMode {
    /// Operand bytes following the opcode.
    pub const fn operand_len(self) -> u16 {
        match self {
            AddrMode::Implied | AddrMode::Accumulator => 0,
            AddrMode::Immediate
            | AddrMode::ZeroPage
            | AddrMode::ZeroPageX
            | AddrMode::ZeroPageY
            | AddrMode::IndirectX
            | AddrMode::IndirectY
            | AddrMode::Relative => 1,
            AddrMode::Absolute | AddrMode::AbsoluteX | AddrMode::AbsoluteY | AddrMode::Indirect => {
                2
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Implied,
    Accumulator,
    Address(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    pub operand: Operand,
    pub page_crossed: bool,
}

impl Resolved {
    const fn at(addr: u16) -> Self {
        Self {
            operand: Operand::Address(addr),
            page_crossed: false,
        }
    }

    const fn indexed(base: u16, addr: u16) -> Self {
        Self {
            operand: Operand::Address(addr),
            page_crossed: (base & 0xFF00) != (addr & 0xFF00),
        }
    }
}

/// Resolve the operand for `mode`, advancing PC past the operand bytes.
pub fn resolve<B: CpuBus + ?Sized>(cpu: &mut CpuState, bus: &mut B, mode: AddrMode) -> Resolved {
    match mode {
        AddrMode::Implied => Resolved {
            operand: Operand::Implied,
            page_crossed: false,
        },
        AddrMode::Accumulator => Resolved {
            operand: Operand::Accumulator,
            page_crossed: false,
        },
        AddrMode::Immediate => {
            let addr = cpu.pc;
            cpu.pc = cpu.pc.wrapping_add(1);
            Resolved::at(addr)
        }
        AddrMode::ZeroPage => Resolved::at(cpu.fetch(bus) as u16),
        AddrMode::ZeroPageX => Resolved::at(cpu.fetch(bus).wrapping_add(cpu.x) as u16),
        AddrMode::ZeroPageY => Resolved::at(cpu.fetch(bus).wrapping_add(cpu.y) as u16),
        AddrMode::Absolute => Resolved::at(cpu.fetch_word(bus)),
        AddrMode::AbsoluteX => {
            let base = cpu.fetch_word(bus);
            Resolved::indexed(base, base.wrapping_add(cpu.x as u16))
        }
        AddrMode::AbsoluteY => {
            let base = cpu.fetch_word(bus);
            Resolved::indexed(base, base.wrapping_add(cpu.y as u16))
        }
        AddrMode::Indirect => {
            let ptr = cpu.fetch_word(bus);
            Resolved::at(read_word_page_wrapped(bus, ptr))
        }
        AddrMode::IndirectX => {
            let zp = cpu.fetch(bus).wrapping_add(cpu.x);
            Resolved::at(read_word_zero_page(bus, zp))
        }
        AddrMode::IndirectY => {
            let zp = cpu.fetch(bus);
            let base = read_word_zero_page(bus, zp);
            Resolved::indexed(base, base.wrapping_add(cpu.y as u16))
        }
        AddrMode::Relative => {
            let offset = cpu.fetch(bus) as i8;
            let next = cpu.pc;
            Resolved::indexed(next, next.wrapping_add(offset as u16))
        }
    }
}

/// Pointer read from page zero; the high byte wraps to $00.
fn read_word_zero_page<B: CpuBus + ?Sized>(bus: &mut B, zp: u8) -> u16 {
    let lo = bus.read(zp as u16) as u16;
    let hi = bus.read(zp.wrapping_add(1) as u16) as u16;
    (hi << 8) | lo
}

/// JMP indirect: the high byte is fetched from the same page.
fn read_word_page_wrapped<B: CpuBus + ?Sized>(bus: &mut B, ptr: u16) -> u16 {
    let lo = bus.read(ptr) as u16;
    let hi_addr = (ptr & 0xFF00) | (ptr.wrapping_add(1) & 0x00FF);
    let hi = bus.read(hi_addr) as u16;
    (hi << 8) | lo
}
