/*!
# Core Module

Core functionality shared by the parsers and the analysis pipeline:
error taxonomy and file system helpers.
*/

pub mod errors;
pub mod fs_utils;

pub use errors::{KatalonError, KatalonResult, ParseError, UnresolvedReference};
pub use fs_utils::{normalize_relative, read_project_file};
