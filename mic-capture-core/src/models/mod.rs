pub mod blob;
pub mod constraints;
pub mod diagnostics;
pub mod error;
pub mod state;
