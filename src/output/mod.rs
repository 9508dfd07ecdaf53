//! Output module
//!
//! Fixed column schemas, the output records built against them and the CSV
//! sink that writes a record set to disk exactly once.

mod schema;
mod writer;

pub use schema::{OutputRecord, RecordBuilder, Schema};
pub use writer::CsvSink;
