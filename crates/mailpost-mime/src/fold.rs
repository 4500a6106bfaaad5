//! Header line folding.
//!
//! RFC 5322 allows header lines of up to 78 characters and RFC 2047 limits
//! lines carrying encoded-words to 76. The stricter limit is applied to every
//! field. Folding happens only at spaces or at line breaks already embedded in
//! a value, so encoded-words and multi-byte characters are never split. A
//! value without any break opportunity is written unbroken: the limit is
//! advisory and content always wins.

use crate::header::Headers;
use std::io::{self, Write};

/// Maximum length of a header line.
pub const MAX_LINE_LEN: usize = 76;

/// Characters available on a continuation line after the leading space.
pub const CONTINUATION_BUDGET: usize = MAX_LINE_LEN - 1;

const FOLD: &str = "\r\n ";

/// Converts a length into the signed column arithmetic used while folding.
fn width(len: usize) -> isize {
    isize::try_from(len).unwrap_or(isize::MAX)
}

/// Writes a complete header block followed by the blank separator line.
///
/// Returns the number of bytes written.
///
/// # Errors
///
/// Returns an error if the underlying writer fails.
pub fn write_headers<W: Write + ?Sized>(w: &mut W, headers: &Headers) -> io::Result<usize> {
    let mut written = 0;
    for (name, values) in headers.iter() {
        written += write_header(w, name, values)?;
    }
    w.write_all(b"\r\n")?;
    Ok(written + 2)
}

/// Writes one header field, folding its values into continuation lines.
///
/// Values are joined with `, `. Returns the number of bytes written.
///
/// # Errors
///
/// Returns an error if the underlying writer fails.
pub fn write_header<W: Write + ?Sized, S: AsRef<str>>(
    w: &mut W,
    name: &str,
    values: &[S],
) -> io::Result<usize> {
    let mut out = Output { w, written: 0 };
    out.put(name)?;

    if values.is_empty() {
        out.put(":\r\n")?;
        return Ok(out.written);
    }
    out.put(": ")?;

    let mut remaining = width(MAX_LINE_LEN) - width(name.len()) - 2;
    let budget = width(CONTINUATION_BUDGET);

    for (i, value) in values.iter().enumerate() {
        let mut s = value.as_ref();

        if remaining < 1 {
            out.put(if i == 0 { FOLD } else { ",\r\n " })?;
            remaining = budget;
        } else if i != 0 {
            out.put(", ")?;
            remaining -= 2;
        }

        while width(s.len()) > remaining {
            s = out.fold_line(s, remaining)?;
            remaining = budget;
        }

        out.put(s)?;
        remaining = match s.rfind('\n') {
            Some(nl) => budget - width(s.len() - nl - 1),
            None => remaining - width(s.len()),
        };
    }

    out.put("\r\n")?;
    Ok(out.written)
}

struct Output<'a, W: Write + ?Sized> {
    w: &'a mut W,
    written: usize,
}

impl<W: Write + ?Sized> Output<'_, W> {
    fn put(&mut self, s: &str) -> io::Result<()> {
        self.w.write_all(s.as_bytes())?;
        self.written += s.len();
        Ok(())
    }

    /// Writes the first line of `s` and returns the rest.
    ///
    /// Fold points, in order of preference: a newline already present before
    /// the budget, the last space within the budget, the first space or
    /// newline past the budget. With none of those the whole value is written.
    /// A space at the very start is the whitespace of a continuation line
    /// written through an embedded break and never becomes a fold point.
    fn fold_line<'s>(&mut self, s: &'s str, remaining: isize) -> io::Result<&'s str> {
        let bytes = s.as_bytes();
        let limit = usize::try_from(remaining).unwrap_or(0).min(bytes.len());

        if let Some(nl) = bytes.iter().position(|&b| b == b'\n')
            && nl < limit
        {
            self.put(&s[..=nl])?;
            return Ok(&s[nl + 1..]);
        }

        if let Some(sp) = bytes[..limit]
            .iter()
            .rposition(|&b| b == b' ')
            .filter(|&sp| sp > 0)
        {
            self.put(&s[..sp])?;
            self.put(FOLD)?;
            return Ok(&s[sp + 1..]);
        }

        for (i, &b) in bytes.iter().enumerate().skip(limit.max(1)) {
            match b {
                b' ' => {
                    self.put(&s[..i])?;
                    self.put(FOLD)?;
                    return Ok(&s[i + 1..]);
                }
                b'\n' => {
                    self.put(&s[..=i])?;
                    return Ok(&s[i + 1..]);
                }
                _ => {}
            }
        }

        self.put(s)?;
        Ok("")
    }
}
