/// Single-character strings yield their character; anything else yields `'\0'`.
pub fn char_from_string(value: &str) -> char {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => ch,
        _ => '\0',
    }
}

/// Appends `key` to a dotted field path, used in error messages.
pub fn join_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        let mut out = String::with_capacity(path.len() + key.len() + 1);
        out.push_str(path);
        out.push('.');
        out.push_str(key);
        out
    }
}

pub fn index_path(path: &str, index: usize) -> String {
    let mut buffer = itoa::Buffer::new();
    let digits = buffer.format(index);
    let mut out = String::with_capacity(path.len() + digits.len() + 2);
    out.push_str(path);
    out.push('[');
    out.push_str(digits);
    out.push(']');
    out
}
