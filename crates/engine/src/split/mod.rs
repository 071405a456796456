pub mod splitter;

pub use splitter::{SplitOutcome, Splitter, WHOLE_FILE_UNIT};
