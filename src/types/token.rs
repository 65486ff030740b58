use std::fmt;

/// Kind of the next token in a JSON stream, named after the reader's vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    BeginArray,
    EndArray,
    BeginObject,
    EndObject,
    Name,
    String,
    Number,
    Boolean,
    Null,
    EndDocument,
}

impl Token {
    pub fn as_str(self) -> &'static str {
        match self {
            Token::BeginArray => "BEGIN_ARRAY",
            Token::EndArray => "END_ARRAY",
            Token::BeginObject => "BEGIN_OBJECT",
            Token::EndObject => "END_OBJECT",
            Token::Name => "NAME",
            Token::String => "STRING",
            Token::Number => "NUMBER",
            Token::Boolean => "BOOLEAN",
            Token::Null => "NULL",
            Token::EndDocument => "END_DOCUMENT",
        }
    }

    /// Name of the value kind that starts with this token.
    pub fn type_name(self) -> &'static str {
        match self {
            Token::BeginArray => "JsonArray",
            Token::BeginObject => "JsonObject",
            Token::String => "String",
            Token::Number => "Number",
            Token::Boolean => "Boolean",
            Token::Null => "null",
            other => other.as_str(),
        }
    }

    #[inline]
    pub fn is_scalar(self) -> bool {
        matches!(
            self,
            Token::String | Token::Number | Token::Boolean | Token::Null
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub(crate) fn token_names(tokens: &[Token]) -> Vec<&'static str> {
    tokens.iter().map(|token| token.as_str()).collect()
}
