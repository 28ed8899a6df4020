//! Filename conventions of the upstream release assets.
//!
//! Each property is inferred independently from the asset's filename.
//! `None` means the name carries no recognizable marker, which is an
//! ordinary outcome (checksums, source tarballs, unsupported architectures).

use super::{Arch, FileType, Platform};

/// Infer the operating system from an asset filename.
///
/// Matching is case-sensitive: `Linux`/`Darwin` up to 3.19, `linux`/`macos`/
/// `windows` from 3.20 on, `win32`/`win64` for older Windows builds.
pub fn platform_from(filename: &str) -> Option<Platform> {
    if filename.contains("Linux") || filename.contains("linux") {
        Some(Platform::Linux)
    } else if filename.contains("Darwin") || filename.contains("macos") {
        Some(Platform::Darwin)
    } else if filename.contains("win32")
        || filename.contains("win64")
        || filename.contains("windows")
    {
        Some(Platform::Win32)
    } else {
        None
    }
}

/// Infer the CPU architecture from an asset filename.
///
/// Universal macOS builds count as 64-bit. Unknown markers such as
/// `aarch64` yield `None` and never match a requested architecture.
pub fn arch_from(filename: &str) -> Option<Arch> {
    if filename.contains("x86_64") || filename.contains("x64") {
        Some(Arch::X86_64)
    } else if filename.contains("universal") {
        Some(Arch::X86_64)
    } else if filename.contains("x86") || filename.contains("i386") {
        Some(Arch::X86)
    } else {
        None
    }
}

/// Infer the file kind from the final extension.
pub fn filetype_from(filename: &str) -> Option<FileType> {
    let ext = filename.rsplit('.').next().unwrap_or_default();
    match ext {
        "dmg" | "msi" => Some(FileType::Package),
        "gz" | "zip" => Some(FileType::Archive),
        "sh" => Some(FileType::Script),
        "txt" | "asc" => Some(FileType::Text),
        _ => None,
    }
}
