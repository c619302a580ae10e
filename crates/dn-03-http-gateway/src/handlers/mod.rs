//! Route handlers.

mod download;
mod update_fs;
mod upload;

pub use download::download;
pub use update_fs::update_fs;
pub use upload::{backup, copy, upload};
