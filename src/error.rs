use std::fmt;

use crate::types::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Syntax,
    Io,
    InvalidDiscriminationValue,
    UnexpectedTokenKind,
    TypeMismatch,
    UnconvertibleScalar,
    MalformedNumber,
    UnconvertibleElement,
    DuplicateTagMapping,
    UnknownPartition,
    UnknownField,
    NoContext,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorStage {
    Decode,
    Update,
    Build,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {} column {}", self.line, self.column)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub stage: ErrorStage,
    pub message: String,
    pub location: Option<Location>,
}

impl Error {
    fn new(kind: ErrorKind, stage: ErrorStage, message: impl Into<String>) -> Self {
        Self {
            kind,
            stage,
            message: message.into(),
            location: None,
        }
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Syntax, ErrorStage::Decode, message)
    }

    pub fn io(err: std::io::Error) -> Self {
        Self::new(ErrorKind::Io, ErrorStage::Decode, format!("read failed: {err}"))
    }

    pub fn invalid_discrimination(discrimination_name: &str, found: &str) -> Self {
        Self::new(
            ErrorKind::InvalidDiscriminationValue,
            ErrorStage::Decode,
            format!(
                "The value corresponding to the discrimination key name ({discrimination_name}) \
                 must be a String, but instead found {found}."
            ),
        )
    }

    pub fn unexpected_token(path: &str, expected: &[&str], found: &str) -> Self {
        Self::new(
            ErrorKind::UnexpectedTokenKind,
            ErrorStage::Decode,
            format!(
                "Expected value of \"{path}\" to be one of \"[{}]\" but found \"{found}\".",
                expected.join(", ")
            ),
        )
    }

    pub fn expected_token(expected: Token, found: Token) -> Self {
        Self::new(
            ErrorKind::UnexpectedTokenKind,
            ErrorStage::Decode,
            format!("Expected {expected} but was {found}"),
        )
    }

    pub fn type_mismatch(path: &str, expected: &str, found: &str) -> Self {
        Self::new(
            ErrorKind::TypeMismatch,
            ErrorStage::Decode,
            format!("Could not convert value at \"{path}\" to {expected} from {found}."),
        )
    }

    pub fn unconvertible_scalar(target: &str) -> Self {
        Self::new(
            ErrorKind::UnconvertibleScalar,
            ErrorStage::Decode,
            format!("Cannot convert from String to {target}"),
        )
    }

    pub fn malformed_number(raw: &str, target: &str) -> Self {
        Self::new(
            ErrorKind::MalformedNumber,
            ErrorStage::Decode,
            format!("malformed {target} literal \"{raw}\""),
        )
    }

    pub fn unconvertible_in_array(path: &str, expected: &str, found: &str) -> Self {
        Self::new(
            ErrorKind::UnconvertibleElement,
            ErrorStage::Decode,
            format!("Could not convert value in array at \"{path}\" to {expected} from {found}."),
        )
    }

    pub fn unconvertible_in_map(key: &str, path: &str, expected: &str, found: &str) -> Self {
        Self::new(
            ErrorKind::UnconvertibleElement,
            ErrorStage::Decode,
            format!("Could not convert value at \"{key}\" in \"{path}\" to {expected} from {found}."),
        )
    }

    pub fn duplicate_tags(violations: &[(String, Vec<&'static str>)]) -> Self {
        let mut message =
            String::from("Multiple models map to the same key. The following lists all violations:");
        for (tag, types) in violations {
            message.push_str(&format!("\n'{tag}' => [{}]", types.join(", ")));
        }
        Self::new(ErrorKind::DuplicateTagMapping, ErrorStage::Build, message)
    }

    pub fn unknown_partition(name: &str) -> Self {
        Self::new(
            ErrorKind::UnknownPartition,
            ErrorStage::Build,
            format!("no decoder table registered for partition \"{name}\""),
        )
    }

    pub fn unknown_field(type_name: &str, key: &str) -> Self {
        Self::new(
            ErrorKind::UnknownField,
            ErrorStage::Decode,
            format!("{type_name} has no field mapped to \"{key}\""),
        )
    }

    pub fn no_context() -> Self {
        Self::new(
            ErrorKind::NoContext,
            ErrorStage::Decode,
            "no parser context is installed on this thread",
        )
    }

    pub fn with_stage(mut self, stage: ErrorStage) -> Self {
        self.stage = stage;
        self
    }

    pub fn with_location(mut self, location: Location) -> Self {
        if self.location.is_none() {
            self.location = Some(location);
        }
        self
    }

    /// Re-labels a slot conversion failure as a container element failure.
    /// Errors that already name their container are passed through.
    pub(crate) fn into_element_error(self, describe: impl FnOnce() -> Self) -> Self {
        match self.kind {
            ErrorKind::TypeMismatch | ErrorKind::UnconvertibleScalar => {
                let mut err = describe();
                err.stage = self.stage;
                err.location = self.location;
                err
            }
            _ => self,
        }
    }
}
