#[derive(Clone)]
pub(super) enum State {
    Normal,
    SingleQuoted,
    /// Quoted identifier; the byte is the closing delimiter (`"`, `` ` ``, or `]`).
    Identifier(u8),
    LineComment,
    BlockComment(u32),
    DollarQuoted(String),
}

/// Closing delimiter for a quoted identifier opened by `b`, if the style quotes that way.
pub(super) fn identifier_close(b: u8, brackets: bool, backticks: bool) -> Option<u8> {
    match b {
        b'"' => Some(b'"'),
        b'[' if brackets => Some(b']'),
        b'`' if backticks => Some(b'`'),
        _ => None,
    }
}
