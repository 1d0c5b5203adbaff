//! CPU architectures, as named by a Mach-O header's `cputype`.

use std::fmt;

use goblin::mach::cputype::{
    CPU_TYPE_ARM, CPU_TYPE_ARM64, CPU_TYPE_ARM64_32, CPU_TYPE_I386, CPU_TYPE_POWERPC,
    CPU_TYPE_POWERPC64, CPU_TYPE_X86_64,
};

/// CPU architecture of a Mach-O binary or fat slice, from its `cputype` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    X86_64,
    Arm64,
    I386,
    Arm,
    Arm64_32,
    PowerPC,
    PowerPC64,
    Unknown(u32),
}

impl Arch {
    pub fn from_cputype(cputype: u32) -> Self {
        match cputype {
            CPU_TYPE_X86_64 => Self::X86_64,
            CPU_TYPE_ARM64 => Self::Arm64,
            CPU_TYPE_I386 => Self::I386,
            CPU_TYPE_ARM => Self::Arm,
            CPU_TYPE_ARM64_32 => Self::Arm64_32,
            CPU_TYPE_POWERPC => Self::PowerPC,
            CPU_TYPE_POWERPC64 => Self::PowerPC64,
            other => Self::Unknown(other),
        }
    }

    /// Returns the architecture name as used in wheel platform tags.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::X86_64 => "x86_64",
            Self::Arm64 => "arm64",
            Self::I386 => "i386",
            Self::Arm => "arm",
            Self::Arm64_32 => "arm64_32",
            Self::PowerPC => "ppc",
            Self::PowerPC64 => "ppc64",
            Self::Unknown(_) => "unknown",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(cputype) => write!(f, "unknown ({cputype:#x})"),
            _ => f.write_str(self.as_str()),
        }
    }
}
