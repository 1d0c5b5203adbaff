//! Walking the architecture slices of a fat (universal) binary.

use std::io::{Read, Seek, SeekFrom};

use tracing::{debug, trace};

use crate::arch::Arch;
use crate::error::Error;
use crate::layout::{FatArch, FatArch64, FatHeader, read_record};
use crate::magic::{MachMagic, Width};
use crate::scan::read_slice_version;
use crate::version::MacOSVersion;

/// An architecture slice of a Mach-O binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchSlice {
    /// Architecture of the slice.
    pub arch: Arch,
    /// Absolute file offset of the slice's Mach-O header.
    pub offset: u64,
    /// Minimum macOS version of the slice, if one could be read.
    pub min_macos_version: Option<MacOSVersion>,
}

/// Read each architecture slice of a fat binary.
///
/// The reader must be positioned immediately after the fat magic number. A slice whose header is
/// malformed or unrecognized is reported without a version, rather than failing the whole file;
/// I/O errors are propagated.
pub(crate) fn read_fat_slices<R: Read + Seek>(
    reader: &mut R,
    magic: MachMagic,
) -> Result<Vec<ArchSlice>, Error> {
    let endianness = magic.endianness;
    let header: FatHeader = read_record(reader, endianness)?;
    trace!("Reading fat header with {} architectures", header.nfat_arch);

    let fat_archs = (0..header.nfat_arch)
        .map(|_| match magic.width {
            Width::Bits32 => read_record::<FatArch, _>(reader, endianness),
            Width::Bits64 => read_record::<FatArch64, _>(reader, endianness).map(|arch| arch.0),
        })
        .collect::<Result<Vec<_>, _>>()?;

    // Out-of-range offsets must not reach `seek`: a `File` rejects offsets past `i64::MAX`.
    let len = reader.seek(SeekFrom::End(0))?;

    let mut slices = Vec::with_capacity(fat_archs.len());
    for fat_arch in fat_archs {
        let arch = Arch::from_cputype(fat_arch.cputype);
        trace!(
            "Reading {arch} slice (cpusubtype {:#x}) at offset {} ({} bytes, aligned to 2^{})",
            fat_arch.cpusubtype,
            fat_arch.offset,
            fat_arch.size,
            fat_arch.align
        );

        let result = if fat_arch.offset >= len {
            Err(Error::SliceOutOfBounds {
                offset: fat_arch.offset,
                len,
            })
        } else {
            read_slice_version(reader, fat_arch.offset)
        };

        let min_macos_version = match result {
            Ok(Some(slice)) => slice.min_macos_version,
            Ok(None) => {
                debug!(
                    "Skipping {arch} slice at offset {} with unrecognized magic number",
                    fat_arch.offset
                );
                None
            }
            Err(Error::Io(err)) => return Err(Error::Io(err)),
            Err(err) => {
                debug!(
                    "Skipping malformed {arch} slice at offset {}: {err}",
                    fat_arch.offset
                );
                None
            }
        };

        slices.push(ArchSlice {
            arch,
            offset: fat_arch.offset,
            min_macos_version,
        });
    }

    Ok(slices)
}
