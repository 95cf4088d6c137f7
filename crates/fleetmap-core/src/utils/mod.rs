//! Utility functions for string formatting and manipulation.

pub mod format;

pub use format::{escape_html, format_age, truncate_string};
