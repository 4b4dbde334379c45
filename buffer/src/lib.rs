mod buffer;
mod clipboard;
mod dirty;
mod error;
mod history;
mod options;
mod region;
mod search;
mod storage;

pub use buffer::Buffer;
pub use clipboard::{Clipboard, PasteMode};
pub use error::{BufferError, SaveError};
pub use options::{BufferOptions, DEFAULT_MMAP_THRESHOLD};
pub use region::ChangeKind;
pub use search::{parse_needle, search, unhex, Direction, NeedleError, Searcher, SearcherRev};
