/*!
core::Cpu - 6502 CPU façade wrapping `CpuState`.

Design
======
- `Cpu` owns the architectural state, the unknown-opcode policy and an
  optional patch hook.
- `step` runs exactly one instruction through the descriptor table and
  returns its cycle cost; it never ticks the bus (the synchronizer does).
- Undefined opcodes go to the patch hook first. The hook sees PC just past
  the opcode byte and returns `Some(cycles)` once it has handled the
  instruction (including consuming any operand bytes). `None` hands the
  opcode to the policy with PC rewound.
- `OpcodePolicy::Fatal` reports `NesError::UnsupportedOpcode` and leaves
  every register as it was before the fetch.
*/

use crate::config::{NesConfig, OpcodePolicy};
use crate::cpu::CpuBus;
use crate::cpu::dispatch::{self, StepOutcome};
use crate::cpu::flags::Status;
use crate::cpu::state::CpuState;
use crate::error::NesError;

/// Cycles charged for an undefined opcode under `OpcodePolicy::TreatAsNop`.
const UNKNOWN_NOP_CYCLES: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptKind {
    Nmi,
    Irq,
    Reset,
}

/// Extension point for opcodes without a table entry.
pub type PatchHook = Box<dyn FnMut(&mut CpuState, &mut dyn CpuBus, u8) -> Option<u32>>;

pub struct Cpu {
    state: CpuState,
    policy: OpcodePolicy,
    patch: Option<PatchHook>,
}

impl std::fmt::Debug for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("state", &self.state)
            .field("policy", &self.policy)
            .field("patch", &self.patch.is_some())
            .finish()
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu {
    /// Construct a new CPU with power-up defaults and the `Fatal` policy.
    pub fn new() -> Self {
        Self {
            state: CpuState::new(),
            policy: OpcodePolicy::default(),
            patch: None,
        }
    }

    pub fn with_config(config: &NesConfig) -> Self {
        Self {
            policy: config.unknown_opcode,
            ..Self::new()
        }
    }

    pub fn state(&self) -> &CpuState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut CpuState {
        &mut self.state
    }

    pub fn policy(&self) -> OpcodePolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: OpcodePolicy) {
        self.policy = policy;
    }

    /// Install (or remove) the hook consulted for undefined opcodes.
    pub fn set_patch_hook(&mut self, hook: Option<PatchHook>) {
        self.patch = hook;
    }

    /// Reset sequence: registers to reset values, PC from $FFFC.
    pub fn reset<B: CpuBus + ?Sized>(&mut self, bus: &mut B) {
        self.state.reset(bus);
        log::debug!("cpu reset, pc=${:04X}", self.state.pc);
    }

    // ---------------------------------------------------------------------
    // Register accessors
    // ---------------------------------------------------------------------
    pub fn a(&self) -> u8 {
        self.state.a
    }
    pub fn x(&self) -> u8 {
        self.state.x
    }
    pub fn y(&self) -> u8 {
        self.state.y
    }
    pub fn sp(&self) -> u8 {
        self.state.sp
    }
    pub fn pc(&self) -> u16 {
        self.state.pc
    }
    pub fn status(&self) -> Status {
        self.state.status
    }

    pub fn set_pc(&mut self, pc: u16) {
        self.state.pc = pc;
    }

    /// Execute one instruction and return the CPU cycles it took.
    pub fn step<B: CpuBus>(&mut self, bus: &mut B) -> Result<u32, NesError> {
        match dispatch::step(&mut self.state, bus) {
            StepOutcome::Executed(cycles) => Ok(cycles),
            StepOutcome::Undefined(opcode) => self.undefined(bus, opcode),
        }
    }

    fn undefined<B: CpuBus>(&mut self, bus: &mut B, opcode: u8) -> Result<u32, NesError> {
        let pc = self.state.pc;

        if let Some(hook) = self.patch.as_mut() {
            let snapshot = self.state;
            self.state.pc = pc.wrapping_add(1);
            if let Some(cycles) = hook(&mut self.state, bus, opcode) {
                return Ok(cycles);
            }
            self.state = snapshot;
        }

        match self.policy {
            OpcodePolicy::Fatal => Err(NesError::UnsupportedOpcode { pc, opcode }),
            OpcodePolicy::TreatAsNop => {
                log::warn!("unknown opcode ${opcode:02X} at ${pc:04X} treated as NOP");
                self.state.pc = pc.wrapping_add(1);
                Ok(UNKNOWN_NOP_CYCLES)
            }
        }
    }

    /// Enter NMI/IRQ (or run reset). Returns the cycles spent, 0 for a masked IRQ.
    pub fn interrupt<B: CpuBus + ?Sized>(&mut self, kind: InterruptKind, bus: &mut B) -> u32 {
        dispatch::interrupt(&mut self.state, bus, kind)
    }
}
