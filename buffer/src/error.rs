use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BufferError {
    #[error("{op} unavailable: file is memory-mapped.")]
    CapabilityDenied { op: &'static str },

    #[error("out of bounds: {len} bytes at {pos} exceed buffer length {buf_len}")]
    OutOfBounds { pos: u64, len: u64, buf_len: u64 },

    #[error("{0}")]
    Save(#[from] SaveError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Error, Debug)]
pub enum SaveError {
    #[error("can't save: no filename.")]
    NoFilename,

    #[error("can't save: nonexistent path.")]
    Nonexistent,

    #[error("can't save: insufficient permissions.")]
    Permissions,

    #[error("can't save: file is busy.")]
    Busy,

    #[error("can't save: {0}")]
    Io(io::Error),
}

impl From<io::Error> for SaveError {
    fn from(err: io::Error) -> Self {
        if let Some(err) = from_os_code(&err) {
            return err;
        }

        match err.kind() {
            io::ErrorKind::NotFound => SaveError::Nonexistent,
            io::ErrorKind::PermissionDenied => SaveError::Permissions,
            _ => SaveError::Io(err),
        }
    }
}

#[cfg(unix)]
fn from_os_code(err: &io::Error) -> Option<SaveError> {
    match err.raw_os_error()? {
        libc::ENOENT | libc::ENOTDIR => Some(SaveError::Nonexistent),
        libc::EACCES | libc::EPERM | libc::EROFS => Some(SaveError::Permissions),
        libc::ETXTBSY | libc::EBUSY => Some(SaveError::Busy),
        _ => None,
    }
}

#[cfg(not(unix))]
fn from_os_code(_err: &io::Error) -> Option<SaveError> {
    None
}
