use serde::Deserialize;

/// Files at or above this size are memory mapped instead of read into memory.
pub const DEFAULT_MMAP_THRESHOLD: u64 = 256 * 1024 * 1024; // 256MB

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BufferOptions {
    /// When filesize is at or over this threshold the file is memory mapped.
    /// Mapped buffers can only be overwritten, not resized.
    pub mmap_threshold: u64,

    /// If a big file cannot be opened for writing, map it copy-on-write so it
    /// can still be viewed and edited. Saving onto the same file then fails
    /// with a permission error.
    pub mmap_readonly_fallback: bool,
}

impl BufferOptions {
    pub fn should_mmap(&self, size: u64) -> bool {
        size != 0 && self.mmap_threshold <= size
    }
}

impl Default for BufferOptions {
    fn default() -> Self {
        BufferOptions {
            mmap_threshold: DEFAULT_MMAP_THRESHOLD,
            mmap_readonly_fallback: true,
        }
    }
}
