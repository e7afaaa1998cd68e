//! Small pure helpers shared by normalisation code.

pub mod phone;
pub mod text;
pub mod time;

pub use phone::{numbers_match, phone_suffix};
pub use text::truncate_chars;
pub use time::parse_timestamp;
