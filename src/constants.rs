/// Key whose string value names the concrete type of an object.
pub const DEFAULT_DISCRIMINATION_NAME: &str = "object";

/// Partition name of the table every context falls back to.
pub const DEFAULT_PARTITION: &str = "";

pub const MAX_DEPTH: usize = 256;

pub(crate) const READ_BUFFER_SIZE: usize = 8 * 1024;

#[inline]
pub(crate) fn is_json_whitespace(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r')
}

#[inline]
pub(crate) fn is_value_terminator(byte: u8) -> bool {
    is_json_whitespace(byte) || matches!(byte, b',' | b']' | b'}')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rstest::rstest]
    fn test_is_json_whitespace() {
        assert!(is_json_whitespace(b' '));
        assert!(is_json_whitespace(b'\n'));
        assert!(is_json_whitespace(b'\r'));
        assert!(is_json_whitespace(b'\t'));
        assert!(!is_json_whitespace(b'a'));
        assert!(!is_json_whitespace(0x0c));
    }

    #[rstest::rstest]
    fn test_is_value_terminator() {
        assert!(is_value_terminator(b','));
        assert!(is_value_terminator(b']'));
        assert!(is_value_terminator(b'}'));
        assert!(!is_value_terminator(b'1'));
        assert!(!is_value_terminator(b'e'));
    }
}
