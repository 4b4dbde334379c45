//! Positional edits on top of the storage. Every edit is validated as a whole
//! before any byte changes, so a failed edit leaves the storage untouched.

use crate::{error::BufferError, storage::Storage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Overwrite,
    Insert,
    Delete,
}

impl ChangeKind {
    pub fn name(&self) -> &'static str {
        match self {
            ChangeKind::Overwrite => "overwrite",
            ChangeKind::Insert => "insert",
            ChangeKind::Delete => "delete",
        }
    }
}

/// Check that an edit of `kind` affecting `len` bytes at `pos` can be applied.
pub(crate) fn check(
    storage: &Storage,
    kind: ChangeKind,
    pos: u64,
    len: u64,
) -> Result<(), BufferError> {
    if kind != ChangeKind::Overwrite && !storage.can_resize() {
        return Err(BufferError::CapabilityDenied { op: kind.name() });
    }

    let buf_len = storage.len();
    // Inserting only needs a valid position, the others touch existing bytes
    let touched = if kind == ChangeKind::Insert { 0 } else { len };
    let in_bounds = pos
        .checked_add(touched)
        .map(|end| end <= buf_len)
        .unwrap_or(false);

    if !in_bounds {
        return Err(BufferError::OutOfBounds { pos, len, buf_len });
    }

    Ok(())
}

pub(crate) fn overwrite(storage: &mut Storage, pos: u64, data: &[u8]) -> Result<(), BufferError> {
    check(storage, ChangeKind::Overwrite, pos, data.len() as u64)?;
    storage.write(pos, data);
    Ok(())
}

pub(crate) fn insert(storage: &mut Storage, pos: u64, data: &[u8]) -> Result<(), BufferError> {
    check(storage, ChangeKind::Insert, pos, data.len() as u64)?;
    storage.insert(pos, data)
}

pub(crate) fn delete(storage: &mut Storage, pos: u64, len: u64) -> Result<(), BufferError> {
    check(storage, ChangeKind::Delete, pos, len)?;
    storage.remove(pos..pos + len)
}

#[cfg(test)]
mod test {
    use std::io;

    use super::*;

    fn memory(content: &[u8]) -> Storage {
        Storage::from_reader(io::Cursor::new(content)).unwrap()
    }

    #[test]
    fn overwrite_bounds() {
        let mut storage = memory(b"abc");
        assert!(overwrite(&mut storage, 1, b"XY").is_ok());
        assert_eq!(b"aXY", storage.as_bytes());

        let err = overwrite(&mut storage, 2, b"XY").unwrap_err();
        assert!(matches!(
            err,
            BufferError::OutOfBounds {
                pos: 2,
                len: 2,
                buf_len: 3
            }
        ));
        assert_eq!(b"aXY", storage.as_bytes());
    }

    #[test]
    fn insert_at_end() {
        let mut storage = memory(b"abc");
        insert(&mut storage, 3, b"d").unwrap();
        assert_eq!(b"abcd", storage.as_bytes());
        assert!(insert(&mut storage, 5, b"e").is_err());
    }

    #[test]
    fn delete_bounds() {
        let mut storage = memory(b"abcdef");
        delete(&mut storage, 1, 2).unwrap();
        assert_eq!(b"adef", storage.as_bytes());
        assert!(delete(&mut storage, 3, 2).is_err());
        assert_eq!(b"adef", storage.as_bytes());
    }

    #[test]
    fn overflowing_position() {
        let storage = memory(b"abc");
        assert!(check(&storage, ChangeKind::Overwrite, u64::MAX, 2).is_err());
    }
}
