//! Source tree handling: include resolution and main-file discovery.

pub mod discover;
pub mod resolve;

pub use discover::find_main_file;
pub use resolve::resolve;
