#![doc = r#"
lockstep-nes library crate.

A cycle-synchronized NES core: the CPU runs one instruction, the bus clocks
the PPU three dots per CPU cycle, and interrupts are taken only at
instruction boundaries.

Modules:
- apu: APU register stub with the 4-step frame IRQ
- bus: CPU/PPU address decoding, OAM DMA and the per-cycle clock
- cartridge: iNES loader; builds the board's mapper from the registry
- config: runtime knobs (`NesConfig`, `OpcodePolicy`)
- controller: standard controller shift register
- cpu: data-driven 6502 core (descriptor table, addressing, execute, flags)
- error: `CartridgeError` / `NesError`
- mapper / mappers: mapper trait and the boards (NROM, MMC1, UxROM, CNROM, MMC3, AxROM)
- nametable: two physical nametable pages behind a mirroring lookup
- nes: `Nes`, the synchronizer and host entry points
- ppu: scanline/cycle state machine, composition buffer, framebuffer
- ppu_bus: trait the PPU fetches through

In tests, shared iNES builders are available under `crate::test_utils`.
"#]

pub mod apu;
pub mod bus;
pub mod cartridge;
pub mod config;
pub mod controller;
pub mod cpu;
pub mod error;
pub mod mapper;
pub mod mappers;
pub mod nametable;
pub mod nes;
pub mod ppu;
pub mod ppu_bus;

pub use bus::Bus;
pub use cartridge::Cartridge;
pub use config::{NesConfig, OpcodePolicy};
pub use controller::{Button, Controller};
pub use cpu::{Cpu, InterruptKind};
pub use error::{CartridgeError, NesError};
pub use nametable::Mirroring;
pub use nes::{HostView, InterruptLine, Nes};

// Shared test utilities (only compiled for tests)
#[cfg(test)]
pub mod test_utils;
