pub mod format;
pub mod level;
