#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

mod encoding;
mod text;

pub use encoding::*;
pub use text::*;
