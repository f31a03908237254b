use std::path::Path;

/// Below this much free space a download is likely to fail midway
pub const LOW_SPACE_BYTES: u64 = 2 * 1024 * 1024 * 1024;

/// Get available disk space in bytes for the given path
#[cfg(unix)]
pub fn available_space(path: &Path) -> Option<u64> {
    use nix::sys::statvfs::statvfs;
    let stat = statvfs(path).ok()?;
    Some(stat.blocks_available() as u64 * stat.fragment_size() as u64)
}

#[cfg(not(unix))]
pub fn available_space(_path: &Path) -> Option<u64> {
    None
}

/// Free bytes at `path` when they are below `threshold`
pub fn low_space(path: &Path, threshold: u64) -> Option<u64> {
    available_space(path).filter(|available| *available < threshold)
}
