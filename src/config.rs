//! Runtime knobs shared by the CPU, PPU and synchronizer.

/// What the CPU does with an opcode that has no decode entry and no patch hook.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum OpcodePolicy {
    /// Stop with `NesError::UnsupportedOpcode`.
    #[default]
    Fatal,
    /// Log a warning, skip the opcode byte and charge 2 cycles.
    TreatAsNop,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct NesConfig {
    /// Cap sprite evaluation at 8 per scanline (and raise overflow on the 9th).
    pub sprite_limit: bool,
    /// Drop the 8-pixel border on every edge when rastering (240x224 output).
    pub overscan_crop: bool,
    pub unknown_opcode: OpcodePolicy,
}

impl Default for NesConfig {
    fn default() -> Self {
        Self {
            sprite_limit: true,
            overscan_crop: true,
            unknown_opcode: OpcodePolicy::Fatal,
        }
    }
}
