use crate::{
    error::BufferError,
    region::{self, ChangeKind},
    storage::Storage,
};

/// A stored edit that reverses some previously applied edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub kind: ChangeKind,
    pub pos: u64,
    /// Bytes to write back, empty for deletes
    pub data: Vec<u8>,
    pub len: u64,
}

impl Change {
    /// Create the change that undoes an edit of `kind` at `pos` affecting
    /// `len` bytes. Must be called before the edit is applied, as deleted
    /// and overwritten bytes are read from the storage.
    pub(crate) fn inverse_of(storage: &Storage, kind: ChangeKind, pos: u64, len: u64) -> Change {
        match kind {
            ChangeKind::Delete => Change {
                kind: ChangeKind::Insert,
                pos,
                data: storage.slice(pos..pos + len).to_vec(),
                len,
            },
            ChangeKind::Overwrite => Change {
                kind: ChangeKind::Overwrite,
                pos,
                data: storage.slice(pos..pos + len).to_vec(),
                len,
            },
            ChangeKind::Insert => Change {
                kind: ChangeKind::Delete,
                pos,
                data: vec![],
                len,
            },
        }
    }

    fn apply(&self, storage: &mut Storage) -> Result<(), BufferError> {
        match self.kind {
            ChangeKind::Overwrite => region::overwrite(storage, self.pos, &self.data),
            ChangeKind::Insert => region::insert(storage, self.pos, &self.data),
            ChangeKind::Delete => region::delete(storage, self.pos, self.len),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stack {
    Undo,
    Redo,
}

/// Undo and redo stacks of inverse changes, most recent last.
#[derive(Debug, Default)]
pub(crate) struct History {
    undo: Vec<Change>,
    redo: Vec<Change>,
}

impl History {
    pub fn new() -> History {
        History::default()
    }

    /// Push the inverse of an edit that is about to be applied and discard
    /// the redo stack.
    pub fn record(&mut self, storage: &Storage, kind: ChangeKind, pos: u64, len: u64) {
        let change = Change::inverse_of(storage, kind, pos, len);
        log::trace!(
            "history: record {:?} at {pos} len {len}, undo depth {}",
            change.kind,
            self.undo.len() + 1
        );
        self.undo.push(change);
        self.redo.clear();
    }

    /// Apply the most recent undo change. The change that redoes it is pushed
    /// to the redo stack. Returns the applied change or `None` if there is
    /// nothing to undo.
    pub fn undo(&mut self, storage: &mut Storage) -> Result<Option<Change>, BufferError> {
        self.step(Stack::Undo, Stack::Redo, storage)
    }

    pub fn redo(&mut self, storage: &mut Storage) -> Result<Option<Change>, BufferError> {
        self.step(Stack::Redo, Stack::Undo, storage)
    }

    fn step(
        &mut self,
        from: Stack,
        to: Stack,
        storage: &mut Storage,
    ) -> Result<Option<Change>, BufferError> {
        let change = match self.stack_mut(from).pop() {
            Some(change) => change,
            None => return Ok(None),
        };

        if let Err(e) = region::check(storage, change.kind, change.pos, change.len) {
            self.stack_mut(from).push(change);
            return Err(e);
        }

        // Read the bytes this change will replace before applying it
        let inverse = Change::inverse_of(storage, change.kind, change.pos, change.len);
        change.apply(storage)?;
        self.stack_mut(to).push(inverse);

        log::trace!(
            "history: {from:?} {:?} at {}, undo depth {}, redo depth {}",
            change.kind,
            change.pos,
            self.undo.len(),
            self.redo.len()
        );

        Ok(Some(change))
    }

    fn stack_mut(&mut self, stack: Stack) -> &mut Vec<Change> {
        match stack {
            Stack::Undo => &mut self.undo,
            Stack::Redo => &mut self.redo,
        }
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }
}
