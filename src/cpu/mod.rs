/*!
cpu::mod - Public façade for the 6502 CPU core.

Layout:

```text
    flags.rs        - `Status` value type and pure flag/ALU functions.
    state.rs        - Architectural registers + stack helpers.
    addressing.rs   - Addressing modes and operand resolution.
    table.rs        - 256-entry opcode descriptor table (checked at compile time).
    execute.rs      - Operation semantics over a resolved operand.
    dispatch.rs     - One instruction step and interrupt entry.
    core/           - `Cpu` façade: reset, step, unknown-opcode handling.
```

The CPU never owns memory. Every access goes through a `CpuBus`, which the
system `Bus` implements; tests use a flat 64 KiB fixture.

Usage:
```rust,ignore
use lockstep_nes::cpu::Cpu;

let mut cpu = Cpu::new();
cpu.reset(&mut bus);
let cycles = cpu.step(&mut bus)?;
```

Decimal mode arithmetic is only performed with the `decimal` cargo feature;
the NES 2A03 ignores the D flag, so by default ADC/SBC are always binary.
*/

pub mod addressing;
pub mod core;
pub(crate) mod dispatch;
pub(crate) mod execute;
pub mod flags;
pub mod state;
pub mod table;

pub use crate::cpu::core::{Cpu, InterruptKind, PatchHook};
pub use crate::cpu::flags::Status;
pub use crate::cpu::state::CpuState;

/// Memory seen by the CPU.
pub trait CpuBus {
    fn read(&mut self, addr: u16) -> u8;

    fn write(&mut self, addr: u16, value: u8);

    /// Little-endian word at `addr`, `addr + 1`.
    fn read_word(&mut self, addr: u16) -> u16 {
        let lo = self.read(addr) as u16;
        let hi = self.read(addr.wrapping_add(1)) as u16;
        (hi << 8) | lo
    }
}
