/*!
execute.rs - Operation semantics over a resolved operand.

`execute` applies one `Op` to the CPU state and bus. Addressing has already
happened, so PC points at the next instruction. Flag math is delegated to
the pure functions in `flags`.

Read-modify-write on memory writes the unmodified value back before the
result (the 6502 dummy write); accumulator forms touch no memory.

The return value is the number of cycles beyond the descriptor's base cost
that the operation itself decided (only branches do).
*/

use crate::cpu::CpuBus;
use crate::cpu::addressing::{Operand, Resolved};
use crate::cpu::flags::{self, Status};
use crate::cpu::state::CpuState;
use crate::cpu::table::Op;

pub(crate) const IRQ_VECTOR: u16 = 0xFFFE;

/// Value the operation reads: A for accumulator mode, memory otherwise.
#[inline]
fn load<B: CpuBus + ?Sized>(cpu: &CpuState, bus: &mut B, operand: Operand) -> u8 {
    match operand {
        Operand::Accumulator => cpu.a,
        Operand::Address(addr) => bus.read(addr),
        Operand::Implied => 0,
    }
}

#[inline]
fn store<B: CpuBus + ?Sized>(bus: &mut B, operand: Operand, v: u8) {
    if let Operand::Address(addr) = operand {
        bus.write(addr, v);
    }
}

/// Read, dummy-write, compute, write back.
fn modify<B, F>(cpu: &mut CpuState, bus: &mut B, operand: Operand, f: F)
where
    B: CpuBus + ?Sized,
    F: FnOnce(Status, u8) -> (u8, Status),
{
    match operand {
        Operand::Accumulator => {
            let (r, status) = f(cpu.status, cpu.a);
            cpu.a = r;
            cpu.status = status;
        }
        Operand::Address(addr) => {
            let v = bus.read(addr);
            bus.write(addr, v);
            let (r, status) = f(cpu.status, v);
            bus.write(addr, r);
            cpu.status = status;
        }
        Operand::Implied => {}
    }
}

fn branch(cpu: &mut CpuState, resolved: Resolved, taken: bool) -> u32 {
    match (taken, resolved.operand) {
        (true, Operand::Address(target)) => {
            cpu.pc = target;
            1 + u32::from(resolved.page_crossed)
        }
        _ => 0,
    }
}

fn branch_taken(op: Op, status: Status) -> bool {
    match op {
        Op::Bpl => !status.negative(),
        Op::Bmi => status.negative(),
        Op::Bvc => !status.overflow(),
        Op::Bvs => status.overflow(),
        Op::Bcc => !status.carry(),
        Op::Bcs => status.carry(),
        Op::Bne => !status.zero(),
        Op::Beq => status.zero(),
        _ => false,
    }
}

fn inc_dec(delta: u8) -> impl FnOnce(Status, u8) -> (u8, Status) {
    move |status, v| {
        let r = v.wrapping_add(delta);
        (r, flags::zn(status, r))
    }
}

pub(crate) fn execute<B: CpuBus + ?Sized>(
    cpu: &mut CpuState,
    bus: &mut B,
    op: Op,
    resolved: Resolved,
) -> u32 {
    let operand = resolved.operand;
    match op {
        // Loads / stores
        Op::Lda => {
            cpu.a = load(cpu, bus, operand);
            cpu.set_zn(cpu.a);
        }
        Op::Ldx => {
            cpu.x = load(cpu, bus, operand);
            cpu.set_zn(cpu.x);
        }
        Op::Ldy => {
            cpu.y = load(cpu, bus, operand);
            cpu.set_zn(cpu.y);
        }
        Op::Sta => store(bus, operand, cpu.a),
        Op::Stx => store(bus, operand, cpu.x),
        Op::Sty => store(bus, operand, cpu.y),

        // Transfers
        Op::Tax => {
            cpu.x = cpu.a;
            cpu.set_zn(cpu.x);
        }
        Op::Tay => {
            cpu.y = cpu.a;
            cpu.set_zn(cpu.y);
        }
        Op::Txa => {
            cpu.a = cpu.x;
            cpu.set_zn(cpu.a);
        }
        Op::Tya => {
            cpu.a = cpu.y;
            cpu.set_zn(cpu.a);
        }
        Op::Tsx => {
            cpu.x = cpu.sp;
            cpu.set_zn(cpu.x);
        }
        Op::Txs => cpu.sp = cpu.x,

        // Stack
        Op::Pha => {
            let a = cpu.a;
            cpu.push(bus, a);
        }
        Op::Php => {
            let p = cpu.status.to_stack(true);
            cpu.push(bus, p);
        }
        Op::Pla => {
            cpu.a = cpu.pop(bus);
            cpu.set_zn(cpu.a);
        }
        Op::Plp => {
            let p = cpu.pop(bus);
            cpu.status = Status::from_stack(p);
        }

        // Logical
        Op::And => {
            let v = load(cpu, bus, operand);
            cpu.a &= v;
            cpu.set_zn(cpu.a);
        }
        Op::Eor => {
            let v = load(cpu, bus, operand);
            cpu.a ^= v;
            cpu.set_zn(cpu.a);
        }
        Op::Ora => {
            let v = load(cpu, bus, operand);
            cpu.a |= v;
            cpu.set_zn(cpu.a);
        }
        Op::Bit => {
            let v = load(cpu, bus, operand);
            cpu.status = flags::bit(cpu.status, cpu.a, v);
        }

        // Arithmetic
        Op::Adc => {
            let v = load(cpu, bus, operand);
            (cpu.a, cpu.status) = flags::adc(cpu.status, cpu.a, v);
        }
        Op::Sbc => {
            let v = load(cpu, bus, operand);
            (cpu.a, cpu.status) = flags::sbc(cpu.status, cpu.a, v);
        }
        Op::Cmp => {
            let v = load(cpu, bus, operand);
            cpu.status = flags::compare(cpu.status, cpu.a, v);
        }
        Op::Cpx => {
            let v = load(cpu, bus, operand);
            cpu.status = flags::compare(cpu.status, cpu.x, v);
        }
        Op::Cpy => {
            let v = load(cpu, bus, operand);
            cpu.status = flags::compare(cpu.status, cpu.y, v);
        }

        // Increments / decrements
        Op::Inc => modify(cpu, bus, operand, inc_dec(1)),
        Op::Dec => modify(cpu, bus, operand, inc_dec(0xFF)),
        Op::Inx => {
            cpu.x = cpu.x.wrapping_add(1);
            cpu.set_zn(cpu.x);
        }
        Op::Iny => {
            cpu.y = cpu.y.wrapping_add(1);
            cpu.set_zn(cpu.y);
        }
        Op::Dex => {
            cpu.x = cpu.x.wrapping_sub(1);
            cpu.set_zn(cpu.x);
        }
        Op::Dey => {
            cpu.y = cpu.y.wrapping_sub(1);
            cpu.set_zn(cpu.y);
        }

        // Shifts / rotates
        Op::Asl => modify(cpu, bus, operand, flags::asl),
        Op::Lsr => modify(cpu, bus, operand, flags::lsr),
        Op::Rol => modify(cpu, bus, operand, flags::rol),
        Op::Ror => modify(cpu, bus, operand, flags::ror),

        // Jumps / calls
        Op::Jmp => {
            if let Operand::Address(target) = operand {
                cpu.pc = target;
            }
        }
        Op::Jsr => {
            if let Operand::Address(target) = operand {
                let ret = cpu.pc.wrapping_sub(1);
                cpu.push_word(bus, ret);
                cpu.pc = target;
            }
        }
        Op::Rts => {
            let ret = cpu.pop_word(bus);
            cpu.pc = ret.wrapping_add(1);
        }
        Op::Rti => {
            let p = cpu.pop(bus);
            cpu.status = Status::from_stack(p);
            cpu.pc = cpu.pop_word(bus);
        }
        Op::Brk => {
            // Padding byte after BRK is skipped on return.
            let ret = cpu.pc.wrapping_add(1);
            cpu.push_word(bus, ret);
            let p = cpu.status.to_stack(true);
            cpu.push(bus, p);
            cpu.status.set(Status::IRQ_DISABLE, true);
            cpu.status.set(Status::DECIMAL, false);
            cpu.pc = bus.read_word(IRQ_VECTOR);
        }

        // Branches
        Op::Bpl | Op::Bmi | Op::Bvc | Op::Bvs | Op::Bcc | Op::Bcs | Op::Bne | Op::Beq => {
            let taken = branch_taken(op, cpu.status);
            return branch(cpu, resolved, taken);
        }

        // Flags
        Op::Clc => cpu.status.set(Status::CARRY, false),
        Op::Sec => cpu.status.set(Status::CARRY, true),
        Op::Cli => cpu.status.set(Status::IRQ_DISABLE, false),
        Op::Sei => cpu.status.set(Status::IRQ_DISABLE, true),
        Op::Clv => cpu.status.set(Status::OVERFLOW, false),
        Op::Cld => cpu.status.set(Status::DECIMAL, false),
        Op::Sed => cpu.status.set(Status::DECIMAL, true),

        Op::Nop => {}
    }
    0
}
