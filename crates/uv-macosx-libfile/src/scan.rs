//! Scanning the load commands of a single-architecture Mach-O header.

use std::io::{Read, Seek, SeekFrom};

use goblin::mach::load_command::{LC_BUILD_VERSION, LC_VERSION_MIN_MACOSX};
use tracing::trace;

use crate::arch::Arch;
use crate::error::Error;
use crate::layout::{
    BuildVersionCommand, LoadCommand, MachHeader, MachHeader64, VersionMinCommand, read_record,
};
use crate::magic::{self, Format, MachMagic, Width};
use crate::version::MacOSVersion;

/// The result of scanning a single-architecture Mach-O header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceVersion {
    /// Architecture from the header's `cputype`.
    pub arch: Arch,
    /// Minimum macOS version from the first `LC_VERSION_MIN_MACOSX` or `LC_BUILD_VERSION`
    /// command, if any.
    pub min_macos_version: Option<MacOSVersion>,
}

/// Read the single-architecture Mach-O header at `offset` and extract its minimum macOS version.
///
/// Returns `Ok(None)` if the magic number at `offset` is not recognized.
pub fn read_slice_version<R: Read + Seek>(
    reader: &mut R,
    offset: u64,
) -> Result<Option<SliceVersion>, Error> {
    let Some(magic) = magic::classify(reader, offset)? else {
        return Ok(None);
    };
    if magic.format == Format::Fat {
        return Err(Error::NestedFat { offset });
    }
    scan_load_commands(reader, magic).map(Some)
}

/// Scan the load commands following a single-architecture magic number.
///
/// The reader must be positioned immediately after the magic number. Stops at the first command
/// that carries a minimum OS version; every other command is skipped by its declared size.
pub(crate) fn scan_load_commands<R: Read + Seek>(
    reader: &mut R,
    magic: MachMagic,
) -> Result<SliceVersion, Error> {
    let endianness = magic.endianness;
    let header = match magic.width {
        Width::Bits32 => read_record::<MachHeader, _>(reader, endianness)?,
        Width::Bits64 => read_record::<MachHeader64, _>(reader, endianness)?.0,
    };
    let arch = Arch::from_cputype(header.cputype);

    trace!(
        "Scanning {} load commands ({} bytes) of {arch} Mach-O header (cpusubtype {:#x}, filetype {:#x}, flags {:#x})",
        header.ncmds,
        header.sizeofcmds,
        header.cpusubtype,
        header.filetype,
        header.flags
    );

    let start = reader.stream_position()?;
    let len = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::Start(start))?;

    for index in 0..header.ncmds {
        let offset = reader.stream_position()?;
        let command: LoadCommand = read_record(reader, endianness)?;

        match command.cmd {
            LC_VERSION_MIN_MACOSX => {
                reader.seek(SeekFrom::Start(offset))?;
                let command: VersionMinCommand = read_record(reader, endianness)?;
                let version = MacOSVersion::from_packed(command.version);
                trace!(
                    "Found `LC_VERSION_MIN_MACOSX` ({} bytes) at offset {offset}: minimum {version}, SDK {}",
                    command.prefix.cmdsize,
                    MacOSVersion::from_packed(command.sdk)
                );
                return Ok(SliceVersion {
                    arch,
                    min_macos_version: Some(version),
                });
            }
            LC_BUILD_VERSION => {
                reader.seek(SeekFrom::Start(offset))?;
                let command: BuildVersionCommand = read_record(reader, endianness)?;
                let version = MacOSVersion::from_packed(command.minos);
                trace!(
                    "Found `LC_BUILD_VERSION` ({} bytes) at offset {offset}: platform {}, minimum {version}, SDK {}, {} tools",
                    command.prefix.cmdsize,
                    command.platform,
                    MacOSVersion::from_packed(command.sdk),
                    command.ntools
                );
                return Ok(SliceVersion {
                    arch,
                    min_macos_version: Some(version),
                });
            }
            cmd => {
                if command.cmdsize < LoadCommand::PREFIX_SIZE {
                    return Err(Error::CommandTooSmall {
                        index,
                        offset,
                        size: command.cmdsize,
                    });
                }
                let next = offset + u64::from(command.cmdsize);
                if next > len {
                    return Err(Error::CommandOutOfBounds {
                        index,
                        offset,
                        size: command.cmdsize,
                        len,
                    });
                }
                trace!(
                    "Skipping load command {index} ({cmd:#x}, {} bytes)",
                    command.cmdsize
                );
                reader.seek(SeekFrom::Start(next))?;
            }
        }
    }

    Ok(SliceVersion {
        arch,
        min_macos_version: None,
    })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    /// A little-endian 64-bit x86_64 header followed by the given load commands.
    fn macho(ncmds: u32, commands: &[u32]) -> Vec<u8> {
        let mut bytes = Vec::new();
        for word in [0xFEED_FACF, 0x0100_0007, 3, 6, ncmds, 0, 0, 0] {
            bytes.extend_from_slice(&u32::to_le_bytes(word));
        }
        for word in commands {
            bytes.extend_from_slice(&word.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn test_skips_unrelated_commands() {
        // `LC_UUID`, then `LC_VERSION_MIN_MACOSX` 10.9 with SDK 10.15.
        let bytes = macho(2, &[0x1B, 24, 1, 2, 3, 4, 0x24, 16, 0x000A_0900, 0x000A_0F00]);
        let slice = read_slice_version(&mut Cursor::new(bytes), 0)
            .unwrap()
            .unwrap();
        assert_eq!(slice.arch, Arch::X86_64);
        assert_eq!(slice.min_macos_version, Some(MacOSVersion::new(10, 9, 0)));
    }

    #[test]
    fn test_stops_at_first_version() {
        let bytes = macho(2, &[0x24, 16, 0x000A_0900, 0, 0x32, 24, 1, 0x000B_0000, 0, 0]);
        let slice = read_slice_version(&mut Cursor::new(bytes), 0)
            .unwrap()
            .unwrap();
        assert_eq!(slice.min_macos_version, Some(MacOSVersion::new(10, 9, 0)));
    }

    #[test]
    fn test_no_version() {
        let bytes = macho(1, &[0x1B, 24, 1, 2, 3, 4]);
        let slice = read_slice_version(&mut Cursor::new(bytes), 0)
            .unwrap()
            .unwrap();
        assert_eq!(slice.min_macos_version, None);
    }

    #[test]
    fn test_command_too_small() {
        let bytes = macho(2, &[0x1B, 4, 0, 0]);
        let err = read_slice_version(&mut Cursor::new(bytes), 0).unwrap_err();
        assert!(err.is_malformed());
        insta::assert_snapshot!(err, @"Load command 0 at offset 32 declares a size of 4 bytes, which is smaller than its 8-byte prefix");
    }

    #[test]
    fn test_command_out_of_bounds() {
        let bytes = macho(1, &[0x19, 72, 0, 0]);
        let err = read_slice_version(&mut Cursor::new(bytes), 0).unwrap_err();
        insta::assert_snapshot!(err, @"Load command 0 at offset 32 declares a size of 72 bytes, which extends past the end of the file (48 bytes)");
    }

    #[test]
    fn test_nested_fat() {
        let bytes = [0xCAu8, 0xFE, 0xBA, 0xBE, 0, 0, 0, 0];
        let err = read_slice_version(&mut Cursor::new(bytes), 0).unwrap_err();
        assert!(matches!(err, Error::NestedFat { offset: 0 }));
    }
}
