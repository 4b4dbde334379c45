use crate::{
    error::BufferError,
    region::{self, ChangeKind},
    storage::Storage,
};

/// How pasted bytes are put into the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasteMode {
    /// Overwrite existing bytes, never growing the buffer
    Overwrite,
    /// Insert bytes, growing the buffer
    Insert,
}

/// Internal byte clipboard, independent of how the buffer stores content.
#[derive(Debug, Default, Clone)]
pub struct Clipboard {
    content: Vec<u8>,
}

impl Clipboard {
    pub fn new() -> Clipboard {
        Clipboard::default()
    }

    /// Copy `len` bytes at `pos` replacing the previous content
    pub(crate) fn yank(&mut self, storage: &Storage, pos: u64, len: u64) -> Result<(), BufferError> {
        region::check(storage, ChangeKind::Overwrite, pos, len)?;
        self.content.clear();
        self.content.extend_from_slice(storage.slice(pos..pos + len));
        Ok(())
    }

    /// Bytes a paste at `pos` would write. Overwrite pastes are cut at the
    /// buffer end.
    pub(crate) fn pasted(&self, mode: PasteMode, pos: u64, buf_len: u64) -> &[u8] {
        match mode {
            PasteMode::Insert => &self.content,
            PasteMode::Overwrite => {
                let room = buf_len.saturating_sub(pos);
                let n = (self.content.len() as u64).min(room) as usize;
                &self.content[..n]
            }
        }
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}
