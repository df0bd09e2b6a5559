/*!
dispatch.rs - One 6502 instruction step and interrupt entry.

Step
====
1. Fetch the opcode at PC.
2. Look up its descriptor; an undefined opcode rewinds PC to the opcode
   and is reported to the caller untouched.
3. Resolve the operand for the descriptor's addressing mode.
4. Execute.
5. Cycles = base + 1 when an indexed read crosses a page + branch extras.

Interrupts
==========
NMI, IRQ and BRK share the same stack frame: PC high, PC low, status.
Hardware interrupts push B clear; only BRK/PHP push it set.
*/

use crate::cpu::CpuBus;
use crate::cpu::InterruptKind;
use crate::cpu::addressing::resolve;
use crate::cpu::execute::{IRQ_VECTOR, execute};
use crate::cpu::flags::Status;
use crate::cpu::state::CpuState;
use crate::cpu::table;

pub(crate) const NMI_VECTOR: u16 = 0xFFFA;

/// Cycles the hardware spends entering an interrupt (and running reset).
pub(crate) const INTERRUPT_CYCLES: u32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StepOutcome {
    Executed(u32),
    /// No descriptor for this opcode; PC still points at it.
    Undefined(u8),
}

pub(crate) fn step<B: CpuBus + ?Sized>(cpu: &mut CpuState, bus: &mut B) -> StepOutcome {
    let opcode_pc = cpu.pc;
    let opcode = cpu.fetch(bus);
    let Some(desc) = table::lookup(opcode) else {
        cpu.pc = opcode_pc;
        return StepOutcome::Undefined(opcode);
    };

    let resolved = resolve(cpu, bus, desc.mode);
    let mut cycles = desc.cycles as u32;
    if resolved.page_crossed && desc.op.page_penalty() {
        cycles += 1;
    }
    cycles += execute(cpu, bus, desc.op, resolved);
    StepOutcome::Executed(cycles)
}

/// Enter an interrupt. IRQ is ignored (0 cycles) while I is set.
pub(crate) fn interrupt<B: CpuBus + ?Sized>(
    cpu: &mut CpuState,
    bus: &mut B,
    kind: InterruptKind,
) -> u32 {
    let vector = match kind {
        InterruptKind::Reset => {
            cpu.reset(bus);
            log::trace!("reset -> ${:04X}", cpu.pc);
            return INTERRUPT_CYCLES;
        }
        InterruptKind::Irq if cpu.status.irq_disabled() => return 0,
        InterruptKind::Irq => IRQ_VECTOR,
        InterruptKind::Nmi => NMI_VECTOR,
    };

    let pc = cpu.pc;
    cpu.push_word(bus, pc);
    let p = cpu.status.to_stack(false);
    cpu.push(bus, p);
    cpu.status.set(Status::DECIMAL, false);
    if kind == InterruptKind::Irq {
        cpu.status.set(Status::IRQ_DISABLE, true);
    }
    cpu.pc = bus.read_word(vector);
    log::trace!("{kind:?} from ${pc:04X} -> ${:04X}", cpu.pc);
    INTERRUPT_CYCLES
}
