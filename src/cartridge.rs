/*!
Cartridge: iNES header parsing plus the mapper instance that owns the banks.

Header layout (16 bytes)
========================
```text
    0-3   "NES" 0x1A
    4     PRG ROM size in 16 KiB units
    5     CHR ROM size in 8 KiB units (0 => 8 KiB CHR RAM)
    6     flags: bit0 vertical, bit1 battery, bit2 trainer, bit3 four-screen,
          bits 4-7 mapper low nibble
    7     flags: bit0 VS-System, bits 2-3 == 0b10 marks NES 2.0,
          bits 4-7 mapper high nibble
    8     PRG RAM size in 8 KiB units (0 => 8 KiB by convention)
    9     bit0 PAL
    10-15 reserved
```

NES 2.0 images are read with the iNES 1 field meanings; the extended fields
are ignored. Four-screen boards fall back to vertical mirroring since only
two nametable pages exist.
*/

use std::fs;
use std::path::Path;

use crate::error::{CartridgeError, NesError};
use crate::mapper::{BoardData, Mapper};
use crate::mappers;
use crate::nametable::Mirroring;

pub const HEADER_LEN: usize = 16;
pub const TRAINER_LEN: usize = 512;
pub const PRG_BANK_LEN: usize = 16 * 1024;
pub const CHR_BANK_LEN: usize = 8 * 1024;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct InesHeader {
    pub prg_banks: u8,
    pub chr_banks: u8,
    pub mapper_id: u16,
    pub mirroring: Mirroring,
    pub four_screen: bool,
    pub battery: bool,
    pub trainer: bool,
    pub vs_system: bool,
    pub prg_ram_banks: u8,
    pub pal: bool,
    pub nes2: bool,
}

impl InesHeader {
    pub fn parse(data: &[u8]) -> Result<Self, CartridgeError> {
        if data.len() < HEADER_LEN {
            return Err(CartridgeError::Truncated {
                section: "header",
                needed: HEADER_LEN,
                available: data.len(),
            });
        }
        if &data[0..4] != b"NES\x1A" {
            return Err(CartridgeError::BadMagic);
        }

        let flags6 = data[6];
        let flags7 = data[7];
        let four_screen = flags6 & 0x08 != 0;
        let vertical = flags6 & 0x01 != 0;
        let nes2 = flags7 & 0x0C == 0x08;
        if nes2 {
            log::warn!("NES 2.0 header; extended fields ignored");
        }
        if four_screen {
            log::warn!("four-screen mirroring not supported; using vertical");
        }

        Ok(Self {
            prg_banks: data[4],
            chr_banks: data[5],
            mapper_id: ((flags7 & 0xF0) as u16) | ((flags6 >> 4) as u16),
            mirroring: if four_screen || vertical {
                Mirroring::Vertical
            } else {
                Mirroring::Horizontal
            },
            four_screen,
            battery: flags6 & 0x02 != 0,
            trainer: flags6 & 0x04 != 0,
            vs_system: flags7 & 0x01 != 0,
            prg_ram_banks: data[8],
            pal: data[9] & 0x01 != 0,
            nes2,
        })
    }

    pub fn prg_rom_len(&self) -> usize {
        self.prg_banks as usize * PRG_BANK_LEN
    }

    /// CHR ROM bytes present in the file (0 when the board uses CHR RAM).
    pub fn chr_rom_len(&self) -> usize {
        self.chr_banks as usize * CHR_BANK_LEN
    }

    pub fn prg_ram_len(&self) -> usize {
        self.prg_ram_banks.max(1) as usize * 8 * 1024
    }
}

pub struct Cartridge {
    header: InesHeader,
    mapper: Box<dyn Mapper>,
}

impl std::fmt::Debug for Cartridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cartridge")
            .field("header", &self.header)
            .field("mapper_id", &self.mapper.mapper_id())
            .finish()
    }
}

/// Slice `len` bytes at `offset`, or report which section ran short.
fn take<'a>(
    data: &'a [u8],
    offset: usize,
    len: usize,
    section: &'static str,
) -> Result<&'a [u8], CartridgeError> {
    data.get(offset..offset + len)
        .ok_or(CartridgeError::Truncated {
            section,
            needed: offset + len,
            available: data.len(),
        })
}

impl Cartridge {
    /// Parse an iNES image and build its mapper from the registry.
    pub fn from_ines_bytes(data: &[u8]) -> Result<Self, NesError> {
        let header = InesHeader::parse(data)?;

        let mut offset = HEADER_LEN;
        if header.trainer {
            take(data, offset, TRAINER_LEN, "trainer")?;
            offset += TRAINER_LEN;
        }

        let prg_rom = take(data, offset, header.prg_rom_len(), "PRG ROM")?.to_vec();
        offset += header.prg_rom_len();

        let chr_is_ram = header.chr_banks == 0;
        let chr = if chr_is_ram {
            vec![0; CHR_BANK_LEN]
        } else {
            take(data, offset, header.chr_rom_len(), "CHR ROM")?.to_vec()
        };

        log::debug!(
            "cartridge: mapper {} PRG {}K CHR {}K{} {:?}",
            header.mapper_id,
            prg_rom.len() / 1024,
            chr.len() / 1024,
            if chr_is_ram { " (RAM)" } else { "" },
            header.mirroring,
        );

        let board = BoardData {
            prg_rom,
            chr,
            chr_is_ram,
            prg_ram_len: header.prg_ram_len(),
        };
        let mapper = mappers::build(header.mapper_id, board)?;
        Ok(Self { header, mapper })
    }

    pub fn from_ines_file<P: AsRef<Path>>(path: P) -> Result<Self, NesError> {
        let bytes = fs::read(path).map_err(CartridgeError::from)?;
        Self::from_ines_bytes(&bytes)
    }

    pub fn header(&self) -> &InesHeader {
        &self.header
    }

    pub fn mapper_id(&self) -> u16 {
        self.header.mapper_id
    }

    /// Effective mirroring: the mapper's runtime choice, else the header's.
    pub fn mirroring(&self) -> Mirroring {
        self.mapper
            .current_mirroring()
            .unwrap_or(self.header.mirroring)
    }

    #[inline]
    pub fn cpu_read(&mut self, addr: u16) -> u8 {
        self.mapper.cpu_read(addr)
    }

    #[inline]
    pub fn cpu_write(&mut self, addr: u16, value: u8) {
        self.mapper.cpu_write(addr, value);
    }

    #[inline]
    pub fn ppu_read(&self, addr: u16) -> u8 {
        self.mapper.ppu_read(addr)
    }

    #[inline]
    pub fn ppu_write(&mut self, addr: u16, value: u8) {
        self.mapper.ppu_write(addr, value);
    }

    pub fn reset(&mut self) {
        self.mapper.reset();
    }

    pub fn irq_pending(&self) -> bool {
        self.mapper.irq_pending()
    }

    pub fn notify_scanline(&mut self) {
        self.mapper.notify_scanline();
    }

    /// Copy the currently mapped pattern tables ($0000-$1FFF) into `dest`.
    /// Returns the number of bytes written.
    pub fn load_chr(&self, dest: &mut [u8]) -> usize {
        let n = dest.len().min(CHR_BANK_LEN);
        for (addr, byte) in dest[..n].iter_mut().enumerate() {
            *byte = self.mapper.ppu_read(addr as u16);
        }
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::build_ines;

    #[test]
    fn parse_simple_nrom_32k_chr8k() {
        let data = build_ines(2, 1, 0b0000_0001, 0, 1, None);
        let mut cart = Cartridge::from_ines_bytes(&data).expect("parse");

        assert_eq!(cart.mapper_id(), 0);
        assert_eq!(cart.mirroring(), Mirroring::Vertical);
        assert_eq!(cart.header().prg_rom_len(), 32 * 1024);
        assert_eq!(cart.cpu_read(0x8000), 0xAA);
        assert_eq!(cart.cpu_read(0xFFFF), 0xAA);
        assert_eq!(cart.ppu_read(0x0000), 0xCC);
    }

    #[test]
    fn chr_ram_allocated_when_no_chr_rom() {
        let data = build_ines(1, 0, 0, 0, 0, None);
        let mut cart = Cartridge::from_ines_bytes(&data).expect("parse");
        assert_eq!(cart.mirroring(), Mirroring::Horizontal);
        assert_eq!(cart.header().prg_ram_len(), 8 * 1024);
        cart.ppu_write(0x0010, 0x5A);
        assert_eq!(cart.ppu_read(0x0010), 0x5A);
    }

    #[test]
    fn trainer_moves_data_offset() {
        let trainer = [0x77u8; 512];
        let data = build_ines(1, 1, 0b0000_0100, 0, 1, Some(&trainer));
        let mut cart = Cartridge::from_ines_bytes(&data).expect("parse");
        assert!(cart.header().trainer);
        assert_eq!(cart.cpu_read(0x8000), 0xAA, "PRG starts after the trainer");
    }

    #[test]
    fn mapper_number_spans_both_flag_bytes() {
        let data = build_ines(2, 1, 0x40, 0x00, 1, None);
        assert_eq!(InesHeader::parse(&data).expect("header").mapper_id, 4);
        let data = build_ines(2, 1, 0x10, 0x20, 1, None);
        assert_eq!(InesHeader::parse(&data).expect("header").mapper_id, 0x21);
    }

    #[test]
    fn header_flags_surface() {
        let mut data = build_ines(1, 1, 0b0000_1010, 0x01, 2, None);
        data[9] = 0x01;
        let h = InesHeader::parse(&data).expect("header");
        assert!(h.battery);
        assert!(h.four_screen);
        assert_eq!(h.mirroring, Mirroring::Vertical);
        assert!(h.vs_system);
        assert!(h.pal);
        assert_eq!(h.prg_ram_len(), 16 * 1024);
    }

    #[test]
    fn nes2_is_read_as_ines1() {
        let data = build_ines(1, 1, 0, 0b0000_1000, 1, None);
        let cart = Cartridge::from_ines_bytes(&data).expect("parse");
        assert!(cart.header().nes2);
        assert_eq!(cart.mapper_id(), 0);
    }

    #[test]
    fn bad_magic_is_rejected() {
        let mut data = build_ines(1, 1, 0, 0, 1, None);
        data[3] = 0x00;
        assert!(matches!(
            Cartridge::from_ines_bytes(&data),
            Err(NesError::InvalidCartridge(CartridgeError::BadMagic))
        ));
    }

    #[test]
    fn truncated_prg_reports_section() {
        let mut data = build_ines(2, 1, 0, 0, 1, None);
        data.truncate(HEADER_LEN + 1000);
        match Cartridge::from_ines_bytes(&data) {
            Err(NesError::InvalidCartridge(CartridgeError::Truncated {
                section,
                needed,
                available,
            })) => {
                assert_eq!(section, "PRG ROM");
                assert_eq!(needed, HEADER_LEN + 32 * 1024);
                assert_eq!(available, HEADER_LEN + 1000);
            }
            other => panic!("expected truncation error, got {other:?}"),
        }
    }

    #[test]
    fn unknown_mapper_is_fatal_at_load() {
        let data = build_ines(1, 1, 0xF0, 0xF0, 1, None);
        assert!(matches!(
            Cartridge::from_ines_bytes(&data),
            Err(NesError::UnsupportedMapper { id: 0xFF })
        ));
    }

    #[test]
    fn load_chr_copies_pattern_space() {
        let data = build_ines(1, 1, 0, 0, 1, None);
        let cart = Cartridge::from_ines_bytes(&data).expect("parse");
        let mut dest = vec![0u8; 0x2000];
        assert_eq!(cart.load_chr(&mut dest), 0x2000);
        assert!(dest.iter().all(|&b| b == 0xCC));
    }
}
