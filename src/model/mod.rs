//! Data model: task ids, structural change records, and conflict types.

pub mod change;
pub mod conflict;
pub mod types;
