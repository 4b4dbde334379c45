use std::{
    fs::{File, OpenOptions},
    io::{self, Write},
    ops::Range,
    path::{Path, PathBuf},
};

use memmap::{MmapMut, MmapOptions};

use crate::error::BufferError;

/// Chunk size used when streaming content out to a writer.
pub(crate) const WRITE_CHUNK_SIZE: usize = 1024 * 128;

/// Byte content of a buffer. Small files live in memory and can be resized,
/// big files are memory mapped and can only be overwritten in place.
#[derive(Debug)]
pub(crate) enum Storage {
    Memory {
        bytes: Vec<u8>,
    },
    FileBacked {
        map: MmapMut,
        path: PathBuf,
        /// Whether writes to the map reach the file. Copy-on-write maps are
        /// used for files we could not open for writing.
        shared: bool,
    },
}

impl Storage {
    #[inline]
    pub fn new() -> Storage {
        Storage::Memory { bytes: Vec::new() }
    }

    #[inline]
    pub fn from_reader<T: io::Read>(mut reader: T) -> io::Result<Storage> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Ok(Storage::Memory { bytes })
    }

    pub fn mmap(path: &Path, readonly_fallback: bool) -> io::Result<Storage> {
        let (map, shared) = match OpenOptions::new().read(true).write(true).open(path) {
            Ok(file) => {
                // Safety: the map is only accessed through this storage and
                // the file is not resized while it is mapped.
                let map = unsafe { MmapMut::map_mut(&file)? };
                (map, true)
            }
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied && readonly_fallback => {
                log::warn!(
                    "{path:?} is not writable, mapping copy-on-write: {e}",
                );
                let file = File::open(path)?;
                let map = unsafe { MmapOptions::new().map_copy(&file)? };
                (map, false)
            }
            Err(e) => return Err(e),
        };

        Ok(Storage::FileBacked {
            map,
            path: path.to_path_buf(),
            shared,
        })
    }

    #[inline]
    pub fn len(&self) -> u64 {
        self.as_bytes().len() as u64
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn can_resize(&self) -> bool {
        matches!(self, Storage::Memory { .. })
    }

    #[inline]
    pub fn is_file_backed(&self) -> bool {
        !self.can_resize()
    }

    /// Path of the mapped file if file backed
    pub fn backing_file(&self) -> Option<&Path> {
        match self {
            Storage::FileBacked { path, .. } => Some(path),
            Storage::Memory { .. } => None,
        }
    }

    /// Whether writes reach the backing file directly
    pub fn writes_through(&self) -> bool {
        matches!(self, Storage::FileBacked { shared: true, .. })
    }

    #[inline(always)]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Storage::Memory { bytes } => bytes,
            Storage::FileBacked { map, .. } => map,
        }
    }

    #[inline(always)]
    fn as_bytes_mut(&mut self) -> &mut [u8] {
        match self {
            Storage::Memory { bytes } => bytes,
            Storage::FileBacked { map, .. } => map,
        }
    }

    #[inline(always)]
    pub fn slice(&self, range: Range<u64>) -> &[u8] {
        &self.as_bytes()[range.start as usize..range.end as usize]
    }

    /// Contiguous view starting at `pos`. Both storage kinds are a single
    /// region so the view always runs to the end of the content.
    #[inline]
    pub fn lookup(&self, pos: u64) -> &[u8] {
        &self.as_bytes()[pos as usize..]
    }

    pub fn write(&mut self, pos: u64, data: &[u8]) {
        debug_assert!(
            pos + data.len() as u64 <= self.len(),
            "write: Attempting to index {} over buffer len {}",
            pos + data.len() as u64,
            self.len()
        );

        let start = pos as usize;
        self.as_bytes_mut()[start..start + data.len()].copy_from_slice(data);
    }

    pub fn insert(&mut self, pos: u64, data: &[u8]) -> Result<(), BufferError> {
        match self {
            Storage::Memory { bytes } => {
                debug_assert!(
                    pos as usize <= bytes.len(),
                    "insert: Attempting to index {} over buffer len {}",
                    pos,
                    bytes.len()
                );
                let pos = pos as usize;
                bytes.splice(pos..pos, data.iter().copied());
                Ok(())
            }
            Storage::FileBacked { .. } => Err(BufferError::CapabilityDenied { op: "insert" }),
        }
    }

    pub fn remove(&mut self, range: Range<u64>) -> Result<(), BufferError> {
        match self {
            Storage::Memory { bytes } => {
                debug_assert!(
                    range.end as usize <= bytes.len(),
                    "remove: Attempting to index {} over buffer len {}",
                    range.end,
                    bytes.len()
                );
                bytes.drain(range.start as usize..range.end as usize);
                Ok(())
            }
            Storage::FileBacked { .. } => Err(BufferError::CapabilityDenied { op: "delete" }),
        }
    }

    /// Flush in place writes to the backing file
    pub fn flush(&self) -> io::Result<()> {
        match self {
            Storage::FileBacked {
                map, shared: true, ..
            } => map.flush(),
            _ => Ok(()),
        }
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> io::Result<usize> {
        let mut written = 0;
        for chunk in self.as_bytes().chunks(WRITE_CHUNK_SIZE) {
            writer.write_all(chunk)?;
            written += chunk.len();
        }
        writer.flush()?;
        Ok(written)
    }
}

impl Default for Storage {
    fn default() -> Self {
        Storage::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn memory(content: &[u8]) -> Storage {
        Storage::from_reader(io::Cursor::new(content)).unwrap()
    }

    #[test]
    fn memory_insert_remove() {
        let mut storage = memory(b"hello world");
        storage.insert(5, b",").unwrap();
        assert_eq!(b"hello, world", storage.as_bytes());

        storage.remove(0..7).unwrap();
        assert_eq!(b"world", storage.as_bytes());
        assert_eq!(5, storage.len());
    }

    #[test]
    fn write_in_place() {
        let mut storage = memory(b"abcdef");
        storage.write(2, b"XY");
        assert_eq!(b"abXYef", storage.as_bytes());
        assert_eq!(b"Yef", storage.lookup(3));
        assert_eq!(b"bX", storage.slice(1..3));
    }

    #[test]
    fn write_to_chunks() {
        let content = vec![7u8; WRITE_CHUNK_SIZE * 2 + 3];
        let storage = memory(&content);
        let mut out = Vec::new();
        let n = storage.write_to(&mut out).unwrap();
        assert_eq!(content.len(), n);
        assert_eq!(content, out);
    }

    #[test]
    fn mapped_is_fixed_size() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"mapped content").unwrap();
        file.flush().unwrap();

        let mut storage = Storage::mmap(file.path(), false).unwrap();
        assert!(storage.is_file_backed());
        assert!(storage.writes_through());
        assert_eq!(14, storage.len());

        assert!(matches!(
            storage.insert(0, b"x"),
            Err(BufferError::CapabilityDenied { .. })
        ));
        assert!(matches!(
            storage.remove(0..1),
            Err(BufferError::CapabilityDenied { .. })
        ));

        storage.write(0, b"M");
        storage.flush().unwrap();
        let on_disk = std::fs::read(file.path()).unwrap();
        assert_eq!(b"Mapped content", on_disk.as_slice());
    }

    #[test]
    fn copy_on_write_map_stays_private() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"private").unwrap();
        file.flush().unwrap();

        let map = unsafe { MmapOptions::new().map_copy(file.as_file()).unwrap() };
        let mut storage = Storage::FileBacked {
            map,
            path: file.path().to_path_buf(),
            shared: false,
        };
        assert!(storage.is_file_backed());
        assert!(!storage.writes_through());

        storage.write(0, b"P");
        storage.flush().unwrap();
        assert_eq!(b"Private", storage.as_bytes());
        let on_disk = std::fs::read(file.path()).unwrap();
        assert_eq!(b"private", on_disk.as_slice());
    }
}
