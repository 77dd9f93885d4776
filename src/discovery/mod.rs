mod file_finder;

pub use file_finder::{is_manifest, FileFinder};
