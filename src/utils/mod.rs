pub mod constants;
pub mod string_utils;

pub use constants::*;
pub use string_utils::{collapse_whitespace, fill_template, safe_truncate_chars};
