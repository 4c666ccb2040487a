//! Command implementations.

pub mod completions;
pub mod id;
pub mod scan;
pub mod status;
pub mod sync;
pub mod version;
