//! Extract the minimum macOS version from the headers of Mach-O libraries and executables.
//!
//! A Mach-O file is either a single-architecture binary, or a fat (universal) container whose
//! header lists the offsets of several single-architecture binaries. Each single-architecture
//! header is followed by a sequence of load commands; the minimum macOS version is recorded in
//! `LC_VERSION_MIN_MACOSX` (macOS 10.13 and earlier) or `LC_BUILD_VERSION` (macOS 10.14 and
//! later), as a packed `xxxx.yy.zz` version.
//!
//! For fat binaries, the reported version is the maximum across all slices, regardless of
//! whether a given slice could run on the current host. This may over-report the version
//! required on a particular architecture, but never under-reports it.

use std::io::{BufReader, Read, Seek};
use std::path::Path;

use fs_err as fs;
use tracing::debug;

pub use arch::Arch;
pub use error::Error;
pub use fat::ArchSlice;
pub use magic::{
    Endianness, FAT_CIGAM_64, FAT_MAGIC_64, Format, MachMagic, Width, classify, is_macho_file,
    swap32,
};
pub use scan::{SliceVersion, read_slice_version};
pub use version::{MacOSVersion, MacOSVersionParseError};

mod arch;
mod error;
mod fat;
mod layout;
mod magic;
mod scan;
mod version;

/// Read the architecture slices of a Mach-O file.
///
/// A single-architecture binary yields one slice at offset zero. Returns an empty list if the
/// magic number is not recognized, in which case only the first four bytes are read.
pub fn read_arch_slices<R: Read + Seek>(reader: &mut R) -> Result<Vec<ArchSlice>, Error> {
    let Some(magic) = classify(reader, 0)? else {
        return Ok(Vec::new());
    };

    match magic.format {
        Format::Fat => fat::read_fat_slices(reader, magic),
        Format::MachO => {
            let slice = scan::scan_load_commands(reader, magic)?;
            Ok(vec![ArchSlice {
                arch: slice.arch,
                offset: 0,
                min_macos_version: slice.min_macos_version,
            }])
        }
    }
}

/// Read the minimum macOS version from a Mach-O byte source.
///
/// Returns `Ok(None)` if the source is not a Mach-O binary, carries no minimum version, or is
/// malformed. I/O errors are returned unmodified.
pub fn read_macos_min_system_version<R: Read + Seek>(
    reader: &mut R,
) -> std::io::Result<Option<MacOSVersion>> {
    match read_arch_slices(reader) {
        Ok(slices) => Ok(slices
            .into_iter()
            .filter_map(|slice| slice.min_macos_version)
            .max()),
        Err(Error::Io(err)) => Err(err),
        Err(err) => {
            debug!("Failed to read Mach-O header: {err}");
            Ok(None)
        }
    }
}

/// Extract the minimum macOS version from a Mach-O library or executable.
///
/// See [`read_macos_min_system_version`]. The file is read through a [`BufReader`], so unlike
/// the reader-level API, more than the four-byte magic number may be read from a file that is
/// not a Mach-O binary.
pub fn extract_macos_min_system_version(path: &Path) -> std::io::Result<Option<MacOSVersion>> {
    let mut reader = BufReader::new(fs::File::open(path)?);
    let version = read_macos_min_system_version(&mut reader)?;
    match version {
        Some(version) => debug!(
            "Found minimum macOS version {version} for: {}",
            path.display()
        ),
        None => debug!("No minimum macOS version found for: {}", path.display()),
    }
    Ok(version)
}

/// Find the maximum minimum-macOS-version across a set of Mach-O files.
///
/// Files without a version (including non-Mach-O files) are skipped. Returns `Ok(None)` if no
/// file carries a version.
pub fn max_macos_min_system_version<I, P>(paths: I) -> std::io::Result<Option<MacOSVersion>>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut max_version: Option<MacOSVersion> = None;
    for path in paths {
        if let Some(version) = extract_macos_min_system_version(path.as_ref())? {
            max_version = Some(max_version.map_or(version, |current| current.max(version)));
        }
    }
    Ok(max_version)
}
