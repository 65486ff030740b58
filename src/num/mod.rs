pub mod coerce;
pub mod number;

pub use coerce::{coerce, coerce_scalar, is_string_convertible, ScalarValue, TargetType};
pub use number::{Scalar, ScalarKind};
