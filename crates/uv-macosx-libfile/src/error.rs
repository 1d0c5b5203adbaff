use thiserror::Error;

/// Errors that can occur while reading Mach-O headers.
#[derive(Debug, Error)]
pub enum Error {
    /// Filesystem-level failure, e.g., the file is missing or unreadable.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A fixed-size record ended before all of its fields could be read.
    #[error("Unexpected end of file while reading {structure} at offset {offset}")]
    Truncated {
        structure: &'static str,
        offset: u64,
    },

    /// A load command declared a size smaller than the `cmd`/`cmdsize` prefix.
    #[error(
        "Load command {index} at offset {offset} declares a size of {size} bytes, which is smaller than its 8-byte prefix"
    )]
    CommandTooSmall { index: u32, offset: u64, size: u32 },

    /// A load command declared a size that extends past the end of the file.
    #[error(
        "Load command {index} at offset {offset} declares a size of {size} bytes, which extends past the end of the file ({len} bytes)"
    )]
    CommandOutOfBounds {
        index: u32,
        offset: u64,
        size: u32,
        len: u64,
    },

    /// An architecture slice of a fat binary starts at or past the end of the file.
    #[error("Architecture slice at offset {offset} starts past the end of the file ({len} bytes)")]
    SliceOutOfBounds { offset: u64, len: u64 },

    /// An architecture slice of a fat binary pointed at another fat header.
    #[error("Expected a single-architecture header at offset {offset}, found a fat header")]
    NestedFat { offset: u64 },
}

impl Error {
    /// Returns `true` if the error is due to malformed Mach-O structure, as opposed to a
    /// filesystem-level failure.
    pub fn is_malformed(&self) -> bool {
        !matches!(self, Self::Io(_))
    }
}
