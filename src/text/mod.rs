pub mod string;

pub use string::char_from_string;
