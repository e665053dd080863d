mod database;
mod document;
mod operations;

pub use database::{Database, DatabaseBuilder};
pub use document::Document;
pub use operations::{Commit, DocumentQuery, Search};
