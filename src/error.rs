/*!
Error types for cartridge loading and execution.

Every fatal condition carries the context needed to diagnose it: the
truncated section and byte counts for a bad image, the mapper number for an
unregistered board, the program counter and opcode byte for an undecodable
instruction.
*/

use thiserror::Error;

/// Problems found while parsing an iNES image.
#[derive(Debug, Error)]
pub enum CartridgeError {
    #[error("invalid iNES magic (expected \"NES\\x1A\")")]
    BadMagic,

    #[error("image truncated in {section}: need {needed} bytes, have {available}")]
    Truncated {
        section: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("failed to read cartridge image")]
    Io(#[from] std::io::Error),
}

/// Top-level emulator error.
#[derive(Debug, Error)]
pub enum NesError {
    #[error("invalid cartridge: {0}")]
    InvalidCartridge(#[from] CartridgeError),

    #[error("unsupported mapper {id}")]
    UnsupportedMapper { id: u16 },

    #[error("unsupported opcode ${opcode:02X} at ${pc:04X}")]
    UnsupportedOpcode { pc: u16, opcode: u8 },
}
