/*
Module: mappers

Concrete cartridge boards and the compile-time registry that selects one by
the header's mapper number.

Registered:
- 0 NROM
- 1 MMC1 (SxROM)
- 2 UxROM
- 3 CNROM
- 4 MMC3 (TxROM)
- 7 AxROM
*/

pub mod axrom;
pub mod cnrom;
pub mod mmc1;
pub mod mmc3;
pub mod nrom;
pub mod uxrom;

pub use axrom::Axrom;
pub use cnrom::Cnrom;
pub use mmc1::Mmc1;
pub use mmc3::Mmc3;
pub use nrom::Nrom;
pub use uxrom::Uxrom;

use crate::error::NesError;
use crate::mapper::{BoardData, Mapper};

/// One registry row: mapper number, board name, constructor.
pub struct MapperEntry {
    pub id: u16,
    pub name: &'static str,
    build: fn(BoardData) -> Box<dyn Mapper>,
}

impl std::fmt::Debug for MapperEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapperEntry")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

pub static REGISTRY: &[MapperEntry] = &[
    MapperEntry {
        id: 0,
        name: "NROM",
        build: |b| Box::new(Nrom::new(b)),
    },
    MapperEntry {
        id: 1,
        name: "MMC1",
        build: |b| Box::new(Mmc1::new(b)),
    },
    MapperEntry {
        id: 2,
        name: "UxROM",
        build: |b| Box::new(Uxrom::new(b)),
    },
    MapperEntry {
        id: 3,
        name: "CNROM",
        build: |b| Box::new(Cnrom::new(b)),
    },
    MapperEntry {
        id: 4,
        name: "MMC3",
        build: |b| Box::new(Mmc3::new(b)),
    },
    MapperEntry {
        id: 7,
        name: "AxROM",
        build: |b| Box::new(Axrom::new(b)),
    },
];

pub fn lookup(id: u16) -> Option<&'static MapperEntry> {
    REGISTRY.iter().find(|e| e.id == id)
}

/// Instantiate the board registered for `id`.
pub fn build(id: u16, board: BoardData) -> Result<Box<dyn Mapper>, NesError> {
    let entry = lookup(id).ok_or(NesError::UnsupportedMapper { id })?;
    log::debug!("mapper {} ({})", entry.id, entry.name);
    Ok((entry.build)(board))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_ids_are_unique_and_self_consistent() {
        for (i, entry) in REGISTRY.iter().enumerate() {
            assert!(
                REGISTRY[i + 1..].iter().all(|e| e.id != entry.id),
                "duplicate mapper id {}",
                entry.id
            );
            let board = BoardData {
                prg_rom: vec![0; 32 * 1024],
                chr: vec![0; 8 * 1024],
                chr_is_ram: false,
                prg_ram_len: 8 * 1024,
            };
            let mapper = (entry.build)(board);
            assert_eq!(mapper.mapper_id(), entry.id, "{}", entry.name);
        }
    }

    #[test]
    fn unknown_id_is_rejected() {
        match build(99, BoardData::default()) {
            Err(NesError::UnsupportedMapper { id }) => assert_eq!(id, 99),
            Err(other) => panic!("unexpected error {other}"),
            Ok(_) => panic!("mapper 99 should not be registered"),
        }
    }
}
