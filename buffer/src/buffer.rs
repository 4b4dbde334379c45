use std::{
    fs::{self, OpenOptions},
    io,
    ops::Range,
    path::{Path, PathBuf},
};

use crate::{
    clipboard::{Clipboard, PasteMode},
    dirty::DirtyMarks,
    error::{BufferError, SaveError},
    history::History,
    options::BufferOptions,
    region::{self, ChangeKind},
    search::{self, Direction},
    storage::Storage,
};

/// Byte buffer of a single file.
///
/// Small files are read into memory and support every edit. Files at or above
/// the configured threshold are memory mapped, these can only be overwritten
/// in place as the mapping cannot be resized. Use `can_resize` to check
/// which one a buffer is.
///
/// Every recorded edit pushes its inverse to the undo stack. The distance to
/// the last saved state is tracked so that undoing back to it makes the buffer
/// saved again.
#[derive(Debug)]
pub struct Buffer {
    storage: Storage,
    history: History,
    clipboard: Clipboard,
    dirty: DirtyMarks,

    /// Path used for saving the file.
    filename: Option<PathBuf>,

    /// Undo steps separating the current state from the last save
    distance: i64,
}

impl Buffer {
    /// Create a new empty unnamed buffer
    pub fn new() -> Buffer {
        Self::with_storage(Storage::new())
    }

    /// Create an in memory buffer from a reader
    pub fn from_reader<R: io::Read>(reader: R) -> io::Result<Buffer> {
        let storage = Storage::from_reader(reader)?;
        Ok(Self::with_storage(storage))
    }

    pub fn from_bytes<B: Into<Vec<u8>>>(bytes: B) -> Buffer {
        Self::with_storage(Storage::Memory {
            bytes: bytes.into(),
        })
    }

    /// Load a file, mapping it if it is big. A nonexistent path creates an
    /// empty buffer that is saved to that path.
    pub fn load<P: AsRef<Path>>(path: P, options: &BufferOptions) -> Result<Buffer, BufferError> {
        let path = path.as_ref();
        let size = match fs::metadata(path) {
            Ok(metadata) => metadata.len(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("New file {path:?}");
                let mut buf = Buffer::new();
                buf.filename = Some(path.to_path_buf());
                return Ok(buf);
            }
            Err(e) => return Err(e.into()),
        };

        let storage = if options.should_mmap(size) {
            log::debug!("New file backed buf {path:?}, {size} bytes");
            Storage::mmap(path, options.mmap_readonly_fallback)?
        } else {
            log::debug!("New buf {path:?}, {size} bytes");
            let file = fs::File::open(path)?;
            Storage::from_reader(file)?
        };

        let mut buf = Self::with_storage(storage);
        buf.filename = Some(path.to_path_buf());
        Ok(buf)
    }

    fn with_storage(storage: Storage) -> Buffer {
        Buffer {
            storage,
            history: History::new(),
            clipboard: Clipboard::new(),
            dirty: DirtyMarks::default(),
            filename: None,
            distance: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> u64 {
        self.storage.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    #[inline]
    pub fn byte_at(&self, pos: u64) -> Option<u8> {
        self.storage.as_bytes().get(pos as usize).copied()
    }

    /// Contiguous view of the content from `pos` to the end, empty if `pos`
    /// is past the end.
    #[inline]
    pub fn lookup(&self, pos: u64) -> &[u8] {
        if pos >= self.len() {
            return &[];
        }

        self.storage.lookup(pos)
    }

    pub fn slice(&self, range: Range<u64>) -> Result<&[u8], BufferError> {
        let len = range.end.saturating_sub(range.start);
        region::check(&self.storage, ChangeKind::Overwrite, range.start, len)?;
        Ok(self.storage.slice(range.start..range.start + len))
    }

    /// Fill `buf` with the bytes at `pos`, failing if there are not enough
    pub fn read_exact(&self, pos: u64, buf: &mut [u8]) -> Result<(), BufferError> {
        let bytes = self.slice(pos..pos.saturating_add(buf.len() as u64))?;
        buf.copy_from_slice(bytes);
        Ok(())
    }

    /// Whether insert and delete are available
    #[inline]
    pub fn can_resize(&self) -> bool {
        self.storage.can_resize()
    }

    #[inline]
    pub fn is_file_backed(&self) -> bool {
        self.storage.is_file_backed()
    }

    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    pub fn set_filename<P: AsRef<Path>>(&mut self, path: P) {
        self.filename = Some(path.as_ref().to_owned())
    }

    /// Saved if no net edits separate this state from the last save
    pub fn is_saved(&self) -> bool {
        self.distance == 0
    }

    pub fn distance(&self) -> i64 {
        self.distance
    }

    pub fn replace_at(
        &mut self,
        pos: u64,
        bytes: &[u8],
        record_history: bool,
    ) -> Result<(), BufferError> {
        self.edit(
            ChangeKind::Overwrite,
            pos,
            bytes,
            bytes.len() as u64,
            record_history,
        )
    }

    pub fn insert_at(
        &mut self,
        pos: u64,
        bytes: &[u8],
        record_history: bool,
    ) -> Result<(), BufferError> {
        self.edit(
            ChangeKind::Insert,
            pos,
            bytes,
            bytes.len() as u64,
            record_history,
        )
    }

    pub fn delete_at(&mut self, pos: u64, len: u64, record_history: bool) -> Result<(), BufferError> {
        self.edit(ChangeKind::Delete, pos, &[], len, record_history)
    }

    fn edit(
        &mut self,
        kind: ChangeKind,
        pos: u64,
        data: &[u8],
        len: u64,
        record_history: bool,
    ) -> Result<(), BufferError> {
        region::check(&self.storage, kind, pos, len)?;
        if len == 0 {
            return Ok(());
        }

        if record_history {
            self.history.record(&self.storage, kind, pos, len);
            self.distance += 1;
        }

        match kind {
            ChangeKind::Overwrite => region::overwrite(&mut self.storage, pos, data)?,
            ChangeKind::Insert => region::insert(&mut self.storage, pos, data)?,
            ChangeKind::Delete => region::delete(&mut self.storage, pos, len)?,
        }

        self.dirty.mark(kind, pos, len);
        Ok(())
    }

    /// Undo the latest change. Returns the position the change was applied
    /// at, or `None` if there is nothing to undo.
    pub fn undo(&mut self) -> Result<Option<u64>, BufferError> {
        let change = match self.history.undo(&mut self.storage)? {
            Some(change) => change,
            None => return Ok(None),
        };

        self.distance -= 1;
        self.dirty.mark(change.kind, change.pos, change.len);
        Ok(Some(change.pos))
    }

    /// Redo the latest undone change. Returns the position the change was
    /// applied at, or `None` if there is nothing to redo.
    pub fn redo(&mut self) -> Result<Option<u64>, BufferError> {
        let change = match self.history.redo(&mut self.storage)? {
            Some(change) => change,
            None => return Ok(None),
        };

        self.distance += 1;
        self.dirty.mark(change.kind, change.pos, change.len);
        Ok(Some(change.pos))
    }

    pub fn undo_depth(&self) -> usize {
        self.history.undo_depth()
    }

    pub fn redo_depth(&self) -> usize {
        self.history.redo_depth()
    }

    /// Copy `len` bytes at `pos` to the clipboard
    pub fn yank(&mut self, pos: u64, len: u64) -> Result<(), BufferError> {
        self.clipboard.yank(&self.storage, pos, len)
    }

    /// Paste the clipboard at `pos`. Overwriting pastes stop at the buffer
    /// end. Returns the number of bytes written.
    pub fn paste(&mut self, pos: u64, mode: PasteMode) -> Result<u64, BufferError> {
        let kind = match mode {
            PasteMode::Overwrite => ChangeKind::Overwrite,
            PasteMode::Insert => ChangeKind::Insert,
        };

        let clipboard = std::mem::take(&mut self.clipboard);
        let bytes = clipboard.pasted(mode, pos, self.len());
        let n = bytes.len() as u64;
        let result = self.edit(kind, pos, bytes, n, true);
        self.clipboard = clipboard;

        result.map(|_| n)
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    /// Circular search for `needle` starting at `start`
    pub fn search(&self, needle: &[u8], start: u64, dir: Direction) -> Option<u64> {
        search::search(self.storage.as_bytes(), needle, start, dir)
    }

    /// Search for the next match after `cursor` in `dir`, wrapping around
    pub fn search_next(&self, needle: &[u8], cursor: u64, dir: Direction) -> Option<u64> {
        let len = self.len();
        if len == 0 {
            return None;
        }

        let start = match dir {
            Direction::Forward => (cursor.min(len - 1) + 1) % len,
            Direction::Backward => (cursor.min(len) + len - 1) % len,
        };

        self.search(needle, start, dir)
    }

    /// Whether the byte at `pos` was edited since the last load or save
    pub fn is_modified_at(&self, pos: u64) -> bool {
        self.dirty.contains(pos)
    }

    pub fn modified_ranges(&self) -> Vec<Range<u64>> {
        self.dirty.ranges()
    }

    /// Save the buffer to `path` or the current filename if not given. On
    /// success the path becomes the buffer filename and the buffer is saved.
    pub fn save(&mut self, path: Option<&Path>) -> Result<(), BufferError> {
        let target = match path.or(self.filename.as_deref()) {
            Some(target) => target.to_path_buf(),
            None => return Err(SaveError::NoFilename.into()),
        };

        log::info!("Saving to {target:?}");
        self.write_file(&target).map_err(SaveError::from)?;

        self.filename = Some(target);
        self.distance = 0;
        self.dirty.clear();
        Ok(())
    }

    fn write_file(&self, target: &Path) -> io::Result<()> {
        let in_place = self
            .storage
            .backing_file()
            .map(|backing| is_same_file(backing, target))
            .unwrap_or(false);

        if in_place {
            // Edits already went to the file through the map
            if self.storage.writes_through() {
                return self.storage.flush();
            }

            // A mapped file must not be replaced or truncated while mapped,
            // its length never changes so overwriting is enough.
            let file = OpenOptions::new().write(true).open(target)?;
            let written = self.storage.write_to(&file)?;
            log::debug!("Wrote {written} bytes to {target:?} in place");
            return Ok(());
        }

        self.replace_file(target)
    }

    /// Write the content to a temporary file next to `target` and rename it
    /// over the target, so a failed save never leaves a partial file.
    fn replace_file(&self, target: &Path) -> io::Result<()> {
        // Follow symlinks so the link itself is kept
        let target = fs::canonicalize(target).unwrap_or_else(|_| target.to_path_buf());
        let permissions = match fs::metadata(&target) {
            Ok(metadata) => {
                // Fail with the error the target itself would give
                OpenOptions::new().write(true).open(&target)?;
                Some(metadata.permissions())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(e),
        };

        let dir = match target.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let tmp = tempfile::NamedTempFile::new_in(dir)?;
        let written = self.storage.write_to(tmp.as_file())?;
        tmp.as_file().sync_all()?;
        if let Some(permissions) = permissions {
            fs::set_permissions(tmp.path(), permissions)?;
        }

        tmp.persist(&target).map_err(|e| e.error)?;
        log::debug!("Wrote {written} bytes to {target:?}");
        Ok(())
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Buffer::new()
    }
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
