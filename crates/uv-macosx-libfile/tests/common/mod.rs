//! Builders for synthetic Mach-O binaries.

use uv_macosx_libfile::{Endianness, MacOSVersion, Width};

pub const CPU_TYPE_X86_64: u32 = 0x0100_0007;
pub const CPU_TYPE_ARM64: u32 = 0x0100_000C;
pub const CPU_TYPE_POWERPC: u32 = 0x12;

const LC_UUID: u32 = 0x1B;
const LC_VERSION_MIN_MACOSX: u32 = 0x24;
const LC_BUILD_VERSION: u32 = 0x32;

const PLATFORM_MACOS: u32 = 1;
const TOOL_LD: u32 = 3;

fn put_u32(bytes: &mut Vec<u8>, endianness: Endianness, value: u32) {
    match endianness {
        Endianness::Little => bytes.extend_from_slice(&value.to_le_bytes()),
        Endianness::Big => bytes.extend_from_slice(&value.to_be_bytes()),
    }
}

fn put_u64(bytes: &mut Vec<u8>, endianness: Endianness, value: u64) {
    match endianness {
        Endianness::Little => bytes.extend_from_slice(&value.to_le_bytes()),
        Endianness::Big => bytes.extend_from_slice(&value.to_be_bytes()),
    }
}

/// A single-architecture Mach-O binary.
#[derive(Debug, Clone)]
pub struct MachOBuilder {
    endianness: Endianness,
    width: Width,
    cputype: u32,
    ncmds: Option<u32>,
    commands: Vec<(u32, Vec<u32>)>,
}

impl MachOBuilder {
    pub fn new(endianness: Endianness, width: Width, cputype: u32) -> Self {
        Self {
            endianness,
            width,
            cputype,
            ncmds: None,
            commands: Vec::new(),
        }
    }

    /// A little-endian 64-bit x86_64 binary.
    pub fn x86_64() -> Self {
        Self::new(Endianness::Little, Width::Bits64, CPU_TYPE_X86_64)
    }

    /// A little-endian 64-bit arm64 binary.
    pub fn arm64() -> Self {
        Self::new(Endianness::Little, Width::Bits64, CPU_TYPE_ARM64)
    }

    /// Append a load command whose body is the given 32-bit words.
    pub fn command(mut self, cmd: u32, body: &[u32]) -> Self {
        self.commands.push((cmd, body.to_vec()));
        self
    }

    /// Append an `LC_UUID` command.
    pub fn uuid(self) -> Self {
        self.command(LC_UUID, &[0xDEAD_BEEF, 0x0123_4567, 0x89AB_CDEF, 0xFEED_F00D])
    }

    /// Append an `LC_VERSION_MIN_MACOSX` command.
    pub fn version_min(self, version: MacOSVersion) -> Self {
        self.command(LC_VERSION_MIN_MACOSX, &[version.packed(), 0x000A_0F00])
    }

    /// Append an `LC_BUILD_VERSION` command with one tool entry.
    pub fn build_version(self, version: MacOSVersion) -> Self {
        self.command(
            LC_BUILD_VERSION,
            &[PLATFORM_MACOS, version.packed(), 0x000E_0000, 1, TOOL_LD, 0x0409_0000],
        )
    }

    /// Override the declared number of load commands.
    pub fn ncmds(mut self, ncmds: u32) -> Self {
        self.ncmds = Some(ncmds);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let e = self.endianness;
        let ncmds = self
            .ncmds
            .unwrap_or_else(|| u32::try_from(self.commands.len()).unwrap());
        let sizeofcmds: usize = self
            .commands
            .iter()
            .map(|(_, body)| 8 + 4 * body.len())
            .sum();

        let mut bytes = Vec::new();
        put_u32(
            &mut bytes,
            e,
            match self.width {
                Width::Bits32 => 0xFEED_FACE,
                Width::Bits64 => 0xFEED_FACF,
            },
        );
        put_u32(&mut bytes, e, self.cputype);
        put_u32(&mut bytes, e, 3);
        // `MH_DYLIB`
        put_u32(&mut bytes, e, 6);
        put_u32(&mut bytes, e, ncmds);
        put_u32(&mut bytes, e, u32::try_from(sizeofcmds).unwrap());
        put_u32(&mut bytes, e, 0x0010_0085);
        if self.width == Width::Bits64 {
            put_u32(&mut bytes, e, 0);
        }

        for (cmd, body) in &self.commands {
            put_u32(&mut bytes, e, *cmd);
            put_u32(&mut bytes, e, u32::try_from(8 + 4 * body.len()).unwrap());
            for word in body {
                put_u32(&mut bytes, e, *word);
            }
        }

        bytes
    }
}

/// Build a fat binary from `(cputype, slice)` pairs, placing each slice at a 16-byte boundary.
pub fn fat(endianness: Endianness, width: Width, slices: &[(u32, Vec<u8>)]) -> Vec<u8> {
    let e = endianness;
    let descriptor_size = match width {
        Width::Bits32 => 20,
        Width::Bits64 => 32,
    };
    let header_size = 8 + descriptor_size * slices.len();

    let mut offsets = Vec::with_capacity(slices.len());
    let mut offset = header_size.next_multiple_of(16);
    for (_, slice) in slices {
        offsets.push(offset);
        offset = (offset + slice.len()).next_multiple_of(16);
    }

    let mut bytes = Vec::new();
    put_u32(
        &mut bytes,
        e,
        match width {
            Width::Bits32 => 0xCAFE_BABE,
            Width::Bits64 => 0xCAFE_BABF,
        },
    );
    put_u32(&mut bytes, e, u32::try_from(slices.len()).unwrap());
    for ((cputype, slice), offset) in slices.iter().zip(&offsets) {
        put_u32(&mut bytes, e, *cputype);
        put_u32(&mut bytes, e, 0);
        match width {
            Width::Bits32 => {
                put_u32(&mut bytes, e, u32::try_from(*offset).unwrap());
                put_u32(&mut bytes, e, u32::try_from(slice.len()).unwrap());
                put_u32(&mut bytes, e, 4);
            }
            Width::Bits64 => {
                put_u64(&mut bytes, e, *offset as u64);
                put_u64(&mut bytes, e, slice.len() as u64);
                put_u32(&mut bytes, e, 4);
                put_u32(&mut bytes, e, 0);
            }
        }
    }

    for ((_, slice), offset) in slices.iter().zip(&offsets) {
        bytes.resize(*offset, 0);
        bytes.extend_from_slice(slice);
    }

    bytes
}
