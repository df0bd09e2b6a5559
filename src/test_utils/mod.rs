//! iNES builders shared by the unit tests.
//!
//! CPU, bus, cartridge and synchronizer tests all need a tiny NROM image with
//! a program at $8000 and known vectors; these helpers build one.
//!
//! Header bytes written here:
//! - 0..4: b"NES\x1A"
//! - 4: PRG ROM size in 16 KiB units
//! - 5: CHR ROM size in 8 KiB units (0 => 8 KiB CHR RAM)
//! - 6: flags 6 (mirroring, battery, trainer, mapper low nibble)
//! - 7: flags 7 (mapper high nibble, NES 2.0 marker)
//! - 8: PRG RAM size in 8 KiB units (0 => 8 KiB)
//!
//! PRG bytes not written by a builder read as 0xAA, CHR ROM bytes as 0xCC.

#![allow(dead_code)]

const HEADER_LEN: usize = 16;
const PRG_UNIT: usize = 16 * 1024;
const CHR_UNIT: usize = 8 * 1024;

/// Raw iNES image: header, optional trainer, pattern-filled PRG and CHR.
pub fn build_ines(
    prg_16k: usize,
    chr_8k: usize,
    flags6: u8,
    flags7: u8,
    prg_ram_8k: u8,
    trainer: Option<&[u8; 512]>,
) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(HEADER_LEN + 512 + prg_16k * PRG_UNIT + chr_8k * CHR_UNIT);
    bytes.extend_from_slice(b"NES\x1A");
    bytes.extend_from_slice(&[prg_16k as u8, chr_8k as u8, flags6, flags7, prg_ram_8k]);
    bytes.resize(HEADER_LEN, 0);

    if let Some(t) = trainer {
        bytes.extend_from_slice(t);
    }
    bytes.resize(bytes.len() + prg_16k * PRG_UNIT, 0xAA);
    bytes.resize(bytes.len() + chr_8k * CHR_UNIT, 0xCC);
    bytes
}

/// NROM-128 image with `prg` at $8000 and `(reset, nmi, irq)` vectors
/// (all $8000 when `None`). Horizontal mirroring.
pub fn build_nrom_with_prg(
    prg: &[u8],
    chr_8k: usize,
    prg_ram_8k: u8,
    vectors: Option<(u16, u16, u16)>,
) -> Vec<u8> {
    assert!(prg.len() <= PRG_UNIT, "program larger than one PRG bank");

    let mut rom = build_ines(1, chr_8k, 0, 0, prg_ram_8k, None);
    let bank = &mut rom[HEADER_LEN..HEADER_LEN + PRG_UNIT];
    bank[..prg.len()].copy_from_slice(prg);

    let (reset, nmi, irq) = vectors.unwrap_or((0x8000, 0x8000, 0x8000));
    set_vectors_in_prg(bank, reset, nmi, irq);
    rom
}

/// Store NMI/RESET/IRQ in the last six bytes of a 16 or 32 KiB PRG image.
pub fn set_vectors_in_prg(prg: &mut [u8], reset: u16, nmi: u16, irq: u16) {
    assert!(
        prg.len() == PRG_UNIT || prg.len() == 2 * PRG_UNIT,
        "vectors need a 16 or 32 KiB PRG image, got {} bytes",
        prg.len()
    );
    let base = prg.len() - 6;
    for (i, vector) in [nmi, reset, irq].into_iter().enumerate() {
        prg[base + i * 2..base + i * 2 + 2].copy_from_slice(&vector.to_le_bytes());
    }
}

/// Lay out code fragments for an NROM bank mapped at $8000.
///
/// `parts` are `(cpu_address, bytes)` pairs; gaps are filled with NOP ($EA).
pub fn assemble(parts: &[(u16, &[u8])]) -> Vec<u8> {
    let end = parts
        .iter()
        .map(|(addr, bytes)| (*addr as usize - 0x8000) + bytes.len())
        .max()
        .unwrap_or(0);
    let mut prg = vec![0xEA; end];
    for (addr, bytes) in parts {
        let start = *addr as usize - 0x8000;
        prg[start..start + bytes.len()].copy_from_slice(bytes);
    }
    prg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_and_sizes() {
        let rom = build_ines(2, 1, 0x01, 0x00, 1, None);
        assert_eq!(&rom[0..9], b"NES\x1A\x02\x01\x01\x00\x01");
        assert_eq!(rom.len(), 16 + 2 * PRG_UNIT + CHR_UNIT);
        assert_eq!(rom[16], 0xAA);
        assert_eq!(rom[16 + 2 * PRG_UNIT], 0xCC);
    }

    #[test]
    fn trainer_precedes_prg() {
        let trainer = [0x5A; 512];
        let rom = build_ines(1, 0, 0x04, 0, 0, Some(&trainer));
        assert_eq!(rom[16], 0x5A);
        assert_eq!(rom[16 + 512], 0xAA);
        assert_eq!(rom.len(), 16 + 512 + PRG_UNIT);
    }

    #[test]
    fn vectors_land_at_bank_end() {
        for len in [PRG_UNIT, 2 * PRG_UNIT] {
            let mut prg = vec![0u8; len];
            set_vectors_in_prg(&mut prg, 0x8123, 0x8456, 0x8ABC);
            assert_eq!(&prg[len - 6..], &[0x56, 0x84, 0x23, 0x81, 0xBC, 0x8A]);
        }
    }

    #[test]
    fn nrom_program_and_default_vectors() {
        let rom = build_nrom_with_prg(&[0xA9, 0x01], 1, 1, None);
        assert_eq!(&rom[16..18], &[0xA9, 0x01]);
        assert_eq!(&rom[16 + 0x3FFC..16 + 0x3FFE], &[0x00, 0x80]);
    }

    #[test]
    fn assemble_places_fragments() {
        let prg = assemble(&[(0x8000, &[0x78]), (0x8004, &[0x40])]);
        assert_eq!(prg, vec![0x78, 0xEA, 0xEA, 0xEA, 0x40]);
    }
}
