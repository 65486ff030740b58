pub mod decoded;
pub mod token;
pub mod value;

pub use decoded::{Decoded, FromDecoded, Instance};
pub use token::Token;
pub use value::{Object, Value};
