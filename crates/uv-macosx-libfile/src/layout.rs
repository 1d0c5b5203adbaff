//! On-disk layouts of the Mach-O structures read by this crate.
//!
//! Each record excludes any leading magic number (which [`crate::magic::classify`] consumes) and
//! is decoded by a single generic function, instantiated once per byte order.

use std::io::{ErrorKind, Read, Seek};

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::error::Error;
use crate::magic::Endianness;

/// Size of the largest record below.
const MAX_RECORD_SIZE: usize = 32;

/// A fixed-size record that can be decoded in either byte order.
pub(crate) trait Record: Sized {
    /// Human-readable name of the record, for error messages.
    const NAME: &'static str;
    /// Size of the record on disk, in bytes.
    const SIZE: usize;

    /// Decode the record from exactly [`Record::SIZE`] bytes.
    fn decode<E: ByteOrder>(bytes: &[u8]) -> Self;
}

/// Read a record at the current position of `reader`.
///
/// A short read is reported as [`Error::Truncated`]; any other I/O error is returned as-is.
pub(crate) fn read_record<T: Record, R: Read + Seek>(
    reader: &mut R,
    endianness: Endianness,
) -> Result<T, Error> {
    let offset = reader.stream_position()?;

    let mut buffer = [0u8; MAX_RECORD_SIZE];
    let bytes = &mut buffer[..T::SIZE];
    if let Err(err) = reader.read_exact(bytes) {
        return if err.kind() == ErrorKind::UnexpectedEof {
            Err(Error::Truncated {
                structure: T::NAME,
                offset,
            })
        } else {
            Err(err.into())
        };
    }

    Ok(match endianness {
        Endianness::Little => T::decode::<LittleEndian>(bytes),
        Endianness::Big => T::decode::<BigEndian>(bytes),
    })
}

/// `struct fat_header`, after `magic`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FatHeader {
    pub(crate) nfat_arch: u32,
}

impl Record for FatHeader {
    const NAME: &'static str = "fat header";
    const SIZE: usize = 4;

    fn decode<E: ByteOrder>(bytes: &[u8]) -> Self {
        Self {
            nfat_arch: E::read_u32(bytes),
        }
    }
}

/// `struct fat_arch`, with offsets and sizes widened to 64 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FatArch {
    pub(crate) cputype: u32,
    pub(crate) cpusubtype: u32,
    pub(crate) offset: u64,
    pub(crate) size: u64,
    pub(crate) align: u32,
}

impl Record for FatArch {
    const NAME: &'static str = "fat architecture";
    const SIZE: usize = 20;

    fn decode<E: ByteOrder>(bytes: &[u8]) -> Self {
        Self {
            cputype: E::read_u32(&bytes[0..4]),
            cpusubtype: E::read_u32(&bytes[4..8]),
            offset: u64::from(E::read_u32(&bytes[8..12])),
            size: u64::from(E::read_u32(&bytes[12..16])),
            align: E::read_u32(&bytes[16..20]),
        }
    }
}

/// `struct fat_arch_64`. The trailing `reserved` field is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FatArch64(pub(crate) FatArch);

impl Record for FatArch64 {
    const NAME: &'static str = "fat architecture (64-bit)";
    const SIZE: usize = 32;

    fn decode<E: ByteOrder>(bytes: &[u8]) -> Self {
        Self(FatArch {
            cputype: E::read_u32(&bytes[0..4]),
            cpusubtype: E::read_u32(&bytes[4..8]),
            offset: E::read_u64(&bytes[8..16]),
            size: E::read_u64(&bytes[16..24]),
            align: E::read_u32(&bytes[24..28]),
        })
    }
}

/// `struct mach_header`, after `magic`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MachHeader {
    pub(crate) cputype: u32,
    pub(crate) cpusubtype: u32,
    pub(crate) filetype: u32,
    pub(crate) ncmds: u32,
    pub(crate) sizeofcmds: u32,
    pub(crate) flags: u32,
}

impl Record for MachHeader {
    const NAME: &'static str = "Mach-O header";
    const SIZE: usize = 24;

    fn decode<E: ByteOrder>(bytes: &[u8]) -> Self {
        Self {
            cputype: E::read_u32(&bytes[0..4]),
            cpusubtype: E::read_u32(&bytes[4..8]),
            filetype: E::read_u32(&bytes[8..12]),
            ncmds: E::read_u32(&bytes[12..16]),
            sizeofcmds: E::read_u32(&bytes[16..20]),
            flags: E::read_u32(&bytes[20..24]),
        }
    }
}

/// `struct mach_header_64`, after `magic`. The trailing `reserved` field is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MachHeader64(pub(crate) MachHeader);

impl Record for MachHeader64 {
    const NAME: &'static str = "Mach-O header (64-bit)";
    const SIZE: usize = 28;

    fn decode<E: ByteOrder>(bytes: &[u8]) -> Self {
        Self(MachHeader::decode::<E>(&bytes[0..24]))
    }
}

/// `struct load_command`: the prefix shared by every load command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LoadCommand {
    pub(crate) cmd: u32,
    pub(crate) cmdsize: u32,
}

impl LoadCommand {
    /// Size of the `cmd`/`cmdsize` prefix, the smallest valid `cmdsize`.
    pub(crate) const PREFIX_SIZE: u32 = 8;
}

impl Record for LoadCommand {
    const NAME: &'static str = "load command";
    const SIZE: usize = 8;

    fn decode<E: ByteOrder>(bytes: &[u8]) -> Self {
        Self {
            cmd: E::read_u32(&bytes[0..4]),
            cmdsize: E::read_u32(&bytes[4..8]),
        }
    }
}

/// `struct version_min_command` (`LC_VERSION_MIN_MACOSX`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct VersionMinCommand {
    pub(crate) prefix: LoadCommand,
    pub(crate) version: u32,
    pub(crate) sdk: u32,
}

impl Record for VersionMinCommand {
    const NAME: &'static str = "LC_VERSION_MIN_MACOSX";
    const SIZE: usize = 16;

    fn decode<E: ByteOrder>(bytes: &[u8]) -> Self {
        Self {
            prefix: LoadCommand::decode::<E>(&bytes[0..8]),
            version: E::read_u32(&bytes[8..12]),
            sdk: E::read_u32(&bytes[12..16]),
        }
    }
}

/// `struct build_version_command` (`LC_BUILD_VERSION`), without the trailing tool entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BuildVersionCommand {
    pub(crate) prefix: LoadCommand,
    pub(crate) platform: u32,
    pub(crate) minos: u32,
    pub(crate) sdk: u32,
    pub(crate) ntools: u32,
}

impl Record for BuildVersionCommand {
    const NAME: &'static str = "LC_BUILD_VERSION";
    const SIZE: usize = 24;

    fn decode<E: ByteOrder>(bytes: &[u8]) -> Self {
        Self {
            prefix: LoadCommand::decode::<E>(&bytes[0..8]),
            platform: E::read_u32(&bytes[8..12]),
            minos: E::read_u32(&bytes[12..16]),
            sdk: E::read_u32(&bytes[16..20]),
            ntools: E::read_u32(&bytes[20..24]),
        }
    }
}
