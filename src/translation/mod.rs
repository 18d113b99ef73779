//! Positional placeholder handling.
//!
//! Statement templates are written once with bare `?` markers and rewritten into the
//! backend's native bind syntax just before execution. The same scan counts markers so
//! that a parameter-count mismatch is reported before any driver round-trip.

use std::borrow::Cow;

mod parsers;
mod scanner;

use parsers::{
    is_block_comment_end, is_block_comment_start, is_line_comment_start, matches_tag,
    try_start_dollar_quote,
};
use scanner::{State, identifier_close};

/// Native placeholder syntax of a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// MySQL keeps bare `?` markers.
    MySql,
    /// `PostgreSQL` numbered placeholders like `$1`.
    Postgres,
    /// SQL Server (tiberius) placeholders like `@P1`.
    SqlServer,
    /// Oracle bind variables like `:1`.
    Oracle,
}

impl PlaceholderStyle {
    fn dollar_quotes(self) -> bool {
        matches!(self, PlaceholderStyle::Postgres)
    }

    fn bracket_identifiers(self) -> bool {
        matches!(self, PlaceholderStyle::SqlServer)
    }

    fn backtick_identifiers(self) -> bool {
        matches!(self, PlaceholderStyle::MySql)
    }

    /// MySQL (outside `NO_BACKSLASH_ESCAPES`) also escapes with `\` inside quotes.
    fn backslash_escapes(self) -> bool {
        matches!(self, PlaceholderStyle::MySql)
    }

    fn write_marker(self, out: &mut String, position: usize) {
        use std::fmt::Write;
        // Writing into a String cannot fail.
        let _ = match self {
            PlaceholderStyle::MySql => write!(out, "?"),
            PlaceholderStyle::Postgres => write!(out, "${position}"),
            PlaceholderStyle::SqlServer => write!(out, "@P{position}"),
            PlaceholderStyle::Oracle => write!(out, ":{position}"),
        };
    }
}

/// Byte offsets of every bind marker in `sql`, skipping string literals, quoted
/// identifiers, comments, and (for `PostgreSQL`) dollar-quoted bodies.
fn placeholder_offsets(sql: &str, style: PlaceholderStyle) -> Vec<usize> {
    let mut offsets = Vec::new();
    let mut state = State::Normal;
    let mut idx = 0;
    let bytes = sql.as_bytes();

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'\'' => state = State::SingleQuoted,
                b'?' => offsets.push(idx),
                _ if is_line_comment_start(bytes, idx) => state = State::LineComment,
                _ if is_block_comment_start(bytes, idx) => {
                    state = State::BlockComment(1);
                    idx += 1;
                }
                b'$' if style.dollar_quotes() => {
                    if let Some((tag, advance)) = try_start_dollar_quote(bytes, idx) {
                        state = State::DollarQuoted(tag);
                        idx = advance;
                    }
                }
                _ => {
                    if let Some(close) = identifier_close(
                        b,
                        style.bracket_identifiers(),
                        style.backtick_identifiers(),
                    ) {
                        state = State::Identifier(close);
                    }
                }
            },
            State::SingleQuoted => {
                if b == b'\\' && style.backslash_escapes() {
                    idx += 1;
                } else if b == b'\'' {
                    if bytes.get(idx + 1) == Some(&b'\'') {
                        idx += 1; // escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::Identifier(close) => {
                // MySQL reads "..." as a string literal
                if b == b'\\' && close == b'"' && style.backslash_escapes() {
                    idx += 1;
                } else if b == close {
                    if bytes.get(idx + 1) == Some(&close) {
                        idx += 1;
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if is_block_comment_start(bytes, idx) {
                    state = State::BlockComment(depth + 1);
                    idx += 1;
                } else if is_block_comment_end(bytes, idx) {
                    state = if depth == 1 {
                        State::Normal
                    } else {
                        State::BlockComment(depth - 1)
                    };
                    idx += 1;
                }
            }
            State::DollarQuoted(ref tag) => {
                if b == b'$' && matches_tag(bytes, idx, tag) {
                    idx += tag.len() + 1;
                    state = State::Normal;
                }
            }
        }
        idx += 1;
    }

    offsets
}

/// Number of `?` bind markers in a statement template.
#[must_use]
pub fn count_placeholders(sql: &str, style: PlaceholderStyle) -> usize {
    placeholder_offsets(sql, style).len()
}

/// Rewrite `?` markers into the backend's native positional form.
///
/// The `i`-th marker (1-indexed, left to right) becomes `$i`, `@Pi`, or `:i`.
/// MySQL templates are returned unchanged.
///
/// Warning: `PostgreSQL` JSON operators spelled with `?` (`?`, `?|`, `?&`) are
/// indistinguishable from bind markers; use the `jsonb_exists*` functions instead.
///
/// Returns a borrowed `Cow` when no changes are needed.
#[must_use]
pub fn translate_placeholders(sql: &str, style: PlaceholderStyle) -> Cow<'_, str> {
    if style == PlaceholderStyle::MySql {
        return Cow::Borrowed(sql);
    }
    let offsets = placeholder_offsets(sql, style);
    if offsets.is_empty() {
        return Cow::Borrowed(sql);
    }

    let mut out = String::with_capacity(sql.len() + offsets.len() * 3);
    let mut last = 0;
    for (i, offset) in offsets.into_iter().enumerate() {
        out.push_str(&sql[last..offset]);
        style.write_marker(&mut out, i + 1);
        last = offset + 1;
    }
    out.push_str(&sql[last..]);
    Cow::Owned(out)
}
