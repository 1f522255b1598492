//! Reading and writing stage-keyed transform sequences.

pub mod error;
pub mod loader;
pub mod writer;

pub use error::{LoaderError, Result};
pub use loader::{
    load_sequence_file, parse_sequence, parse_sequence_str, read_sequence, read_sequence_file, InitialGrouping,
    LoaderConfig, ParsedSequence, INITIAL_KEY,
};
pub use writer::{sequence_to_value, write_sequence};
