//! The minimum macOS version recorded in a Mach-O load command.

use std::fmt;
use std::str::FromStr;

/// A macOS version, as recorded by `LC_VERSION_MIN_MACOSX` or `LC_BUILD_VERSION`.
///
/// Versions are ordered by `major`, then `minor`, then `patch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MacOSVersion {
    pub major: u16,
    pub minor: u8,
    pub patch: u8,
}

impl MacOSVersion {
    pub const fn new(major: u16, minor: u8, patch: u8) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Decode a packed version.
    ///
    /// Format: `xxxx.yy.zz` in nibbles, i.e., the upper 16 bits hold the major version, the next
    /// 8 bits the minor version, and the lowest 8 bits the patch version. Values are taken as-is,
    /// even if they fall outside the conventional `0..=99` range.
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_packed(packed: u32) -> Self {
        Self {
            major: (packed >> 16) as u16,
            minor: ((packed >> 8) & 0xFF) as u8,
            patch: (packed & 0xFF) as u8,
        }
    }

    /// Encode this version in the packed `xxxx.yy.zz` format.
    #[allow(clippy::cast_lossless)]
    pub const fn packed(self) -> u32 {
        ((self.major as u32) << 16) | ((self.minor as u32) << 8) | self.patch as u32
    }
}

impl fmt::Display for MacOSVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// An error that occurs when parsing a [`MacOSVersion`] from a string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid macOS version: `{0}`")]
pub struct MacOSVersionParseError(String);

impl FromStr for MacOSVersion {
    type Err = MacOSVersionParseError;

    /// Parse a macOS version string like `10.9`, `10.13.1`, or `14`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || MacOSVersionParseError(s.to_string());
        let mut parts = s.split('.');
        let major = parts
            .next()
            .and_then(|part| part.parse().ok())
            .ok_or_else(err)?;
        let minor = match parts.next() {
            Some(part) => part.parse().map_err(|_| err())?,
            None => 0,
        };
        let patch = match parts.next() {
            Some(part) => part.parse().map_err(|_| err())?,
            None => 0,
        };
        if parts.next().is_some() {
            return Err(err());
        }
        Ok(Self::new(major, minor, patch))
    }
}
