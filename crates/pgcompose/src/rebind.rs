//! Placeholder marker scanning and rebinding.
//!
//! Builders emit a single driver-agnostic marker, `?`. PostgreSQL expects
//! numbered markers (`$1, $2, ...`), so the execution layer runs [`rebind`]
//! over the fully rendered text right before handing it to the driver.
//!
//! The scanner ignores `?` inside single-quoted literals (including `E'...'`
//! strings with backslash escapes), double-quoted identifiers, dollar-quoted
//! bodies (`$$...$$`, `$fn$...$fn$`), `--` line comments and `/* */` block
//! comments. A doubled `??` is an escaped literal `?` (useful for the jsonb
//! `?` / `?|` / `?&` operators) and is emitted as a single `?`.

enum Piece<'a> {
    Text(&'a str),
    Marker,
}

fn scan<'a>(sql: &'a str, mut emit: impl FnMut(Piece<'a>)) {
    let bytes = sql.as_bytes();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\'' if is_escape_string(bytes, i) => i = skip_escape_string(bytes, i + 1),
            b'\'' => i = skip_past(bytes, i + 1, b"'"),
            b'"' => i = skip_past(bytes, i + 1, b"\""),
            b'-' if bytes.get(i + 1) == Some(&b'-') => i = skip_past(bytes, i + 2, b"\n"),
            b'/' if bytes.get(i + 1) == Some(&b'*') => i = skip_block_comment(bytes, i),
            b'$' => match dollar_tag_end(bytes, i) {
                Some(end) => i = skip_past(bytes, end, &bytes[i..end]),
                None => i += 1,
            },
            b'?' if bytes.get(i + 1) == Some(&b'?') => {
                // Keep one `?` of the pair as plain text.
                emit(Piece::Text(&sql[start..=i]));
                i += 2;
                start = i;
            }
            b'?' => {
                emit(Piece::Text(&sql[start..i]));
                emit(Piece::Marker);
                i += 1;
                start = i;
            }
            _ => i += 1,
        }
    }
    emit(Piece::Text(&sql[start..]));
}

fn is_ident(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Index just past the next `delim` at or after `from`, or the end of input.
fn skip_past(bytes: &[u8], from: usize, delim: &[u8]) -> usize {
    let from = from.min(bytes.len());
    bytes[from..]
        .windows(delim.len())
        .position(|w| w == delim)
        .map_or(bytes.len(), |p| from + p + delim.len())
}

/// `'` at `quote` opens an `E'...'` string.
fn is_escape_string(bytes: &[u8], quote: usize) -> bool {
    quote > 0
        && matches!(bytes[quote - 1], b'E' | b'e')
        && (quote < 2 || !is_ident(bytes[quote - 2]))
}

fn skip_escape_string(bytes: &[u8], from: usize) -> usize {
    let mut i = from;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\'' => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

/// Block comments nest in PostgreSQL.
fn skip_block_comment(bytes: &[u8], from: usize) -> usize {
    let mut depth = 0usize;
    let mut i = from;
    while i < bytes.len() {
        if bytes[i..].starts_with(b"/*") {
            depth += 1;
            i += 2;
        } else if bytes[i..].starts_with(b"*/") {
            depth -= 1;
            i += 2;
            if depth == 0 {
                return i;
            }
        } else {
            i += 1;
        }
    }
    bytes.len()
}

/// End (exclusive) of a `$tag$` opener at `start`. `$1` and identifiers
/// containing `$` are not dollar quotes.
fn dollar_tag_end(bytes: &[u8], start: usize) -> Option<usize> {
    if start > 0 && is_ident(bytes[start - 1]) {
        return None;
    }
    if bytes.get(start + 1).is_some_and(u8::is_ascii_digit) {
        return None;
    }
    let mut i = start + 1;
    while i < bytes.len() && is_ident(bytes[i]) {
        i += 1;
    }
    (bytes.get(i) == Some(&b'$')).then_some(i + 1)
}

/// Count the `?` markers in `sql`.
pub fn count_markers(sql: &str) -> usize {
    let mut count = 0;
    scan(sql, |piece| {
        if matches!(piece, Piece::Marker) {
            count += 1;
        }
    });
    count
}

/// Rewrite `?` markers into `$1, $2, ...`, numbered left to right.
pub fn rebind(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut idx = 0usize;
    scan(sql, |piece| match piece {
        Piece::Text(text) => out.push_str(text),
        Piece::Marker => {
            idx += 1;
            out.push('$');
            out.push_str(&idx.to_string());
        }
    });
    out
}
