pub mod token;

pub use token::{StatusFilter, Token};
