//! Parser implementation for BoxNote JSON to the document model

mod core;
mod list;
mod marks;
mod raw;
mod table;

pub use self::core::BoxNoteParser;
pub use self::table::MAX_SPAN;
