//! Core types, record codec, and table catalogue for the star-schema ETL.

pub mod codec;
pub mod error;
pub mod records;
pub mod source;
pub mod table;

pub use codec::*;
pub use error::{Error, Result};
pub use records::*;
pub use source::*;
pub use table::*;
