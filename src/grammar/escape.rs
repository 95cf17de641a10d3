//! Character and escape-sequence decoding for string literals and classes.

use crate::error::GrammarErrorKind;

fn hex_digit(c: char) -> Option<u32> {
    c.to_digit(16)
}

/// Decode exactly `digits` hex digits starting at `src[start]`.
fn decode_hex(src: &[char], start: usize, digits: usize) -> Result<u32, GrammarErrorKind> {
    let end = start + digits;
    if end > src.len() {
        return Err(GrammarErrorKind::UnexpectedEnd);
    }
    src[start..end].iter().try_fold(0u32, |acc, &c| {
        hex_digit(c)
            .map(|d| (acc << 4) | d)
            .ok_or(GrammarErrorKind::InvalidHexEscape)
    })
}

/// Decode one character at `src[pos]`, which may start an escape sequence.
///
/// Returns the codepoint and the number of source characters consumed.
pub fn decode_char(src: &[char], pos: usize) -> Result<(u32, usize), GrammarErrorKind> {
    let Some(&c) = src.get(pos) else {
        return Err(GrammarErrorKind::UnexpectedEnd);
    };
    if c != '\\' {
        return Ok((c as u32, 1));
    }
    let Some(&escaped) = src.get(pos + 1) else {
        return Err(GrammarErrorKind::UnexpectedEnd);
    };
    match escaped {
        'x' => Ok((decode_hex(src, pos + 2, 2)?, 4)),
        'u' => Ok((decode_hex(src, pos + 2, 4)?, 6)),
        'U' => Ok((decode_hex(src, pos + 2, 8)?, 10)),
        't' => Ok(('\t' as u32, 2)),
        'r' => Ok(('\r' as u32, 2)),
        'n' => Ok(('\n' as u32, 2)),
        '"' | '[' | ']' | '\\' => Ok((escaped as u32, 2)),
        other => Err(GrammarErrorKind::UnknownEscape(other)),
    }
}
