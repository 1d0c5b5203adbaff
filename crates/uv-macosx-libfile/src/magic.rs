//! Classification of the four-byte magic number at the start of a Mach-O header.
//!
//! Every Mach-O file, and every architecture slice within a fat file, begins with one of eight
//! magic numbers. The `*_MAGIC` values are stored in little-endian order; the `*_CIGAM` values are
//! the same magic numbers with their bytes reversed, and indicate that all subsequent fields of
//! the header are big-endian.

use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;

use fs_err as fs;
use goblin::mach::fat::{FAT_CIGAM, FAT_MAGIC};
use goblin::mach::header::{MH_CIGAM, MH_CIGAM_64, MH_MAGIC, MH_MAGIC_64};

use crate::error::Error;

/// Magic number of a fat header with 64-bit slice offsets.
pub const FAT_MAGIC_64: u32 = 0xCAFE_BABF;
/// [`FAT_MAGIC_64`] with its bytes reversed.
pub const FAT_CIGAM_64: u32 = 0xBFBA_FECA;

/// Byte order of the fields in a header region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endianness {
    Little,
    Big,
}

/// Whether a header starts a fat (multi-architecture) container or a single-architecture binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Fat,
    MachO,
}

/// The word width of a header.
///
/// For a fat container, this is the width of the offsets in each architecture descriptor. For a
/// single-architecture binary, this selects between `mach_header` and `mach_header_64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Width {
    Bits32,
    Bits64,
}

/// A recognized Mach-O magic number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MachMagic {
    pub format: Format,
    pub width: Width,
    pub endianness: Endianness,
}

impl MachMagic {
    /// Classify a magic number, as read in little-endian order.
    ///
    /// Returns `None` if the value is not one of the eight recognized magic numbers.
    pub fn from_u32(raw: u32) -> Option<Self> {
        let (magic, endianness) = if matches!(raw, FAT_CIGAM | FAT_CIGAM_64 | MH_CIGAM | MH_CIGAM_64)
        {
            (swap32(raw), Endianness::Big)
        } else {
            (raw, Endianness::Little)
        };

        let (format, width) = match magic {
            FAT_MAGIC => (Format::Fat, Width::Bits32),
            FAT_MAGIC_64 => (Format::Fat, Width::Bits64),
            MH_MAGIC => (Format::MachO, Width::Bits32),
            MH_MAGIC_64 => (Format::MachO, Width::Bits64),
            _ => return None,
        };

        Some(Self {
            format,
            width,
            endianness,
        })
    }
}

/// Reverse the byte order of a 32-bit value.
pub const fn swap32(value: u32) -> u32 {
    value.swap_bytes()
}

/// Read the magic number at `offset` and classify it.
///
/// On success, the reader is left positioned immediately after the magic number. Returns
/// `Ok(None)` if the magic number is not recognized, having read exactly four bytes.
pub fn classify<R: Read + Seek>(reader: &mut R, offset: u64) -> Result<Option<MachMagic>, Error> {
    reader.seek(SeekFrom::Start(offset))?;

    let mut bytes = [0u8; 4];
    if let Err(err) = reader.read_exact(&mut bytes) {
        return if err.kind() == ErrorKind::UnexpectedEof {
            Err(Error::Truncated {
                structure: "magic number",
                offset,
            })
        } else {
            Err(err.into())
        };
    }

    Ok(MachMagic::from_u32(u32::from_le_bytes(bytes)))
}

/// Check if a file is a Mach-O binary (fat or single-architecture) by examining its magic number.
pub fn is_macho_file(path: &Path) -> std::io::Result<bool> {
    let mut file = match fs::File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err),
    };

    match classify(&mut file, 0) {
        Ok(magic) => Ok(magic.is_some()),
        Err(Error::Io(err)) => Err(err),
        Err(_) => Ok(false),
    }
}
