//! Quote- and bracket-aware line tokenizer.
//!
//! Access logs and ALB logs both carry fields that contain spaces (the quoted
//! request, the bracketed time, the user agent), so plain whitespace
//! splitting is wrong. Quoted and bracketed segments are recognised first;
//! everything else splits on whitespace.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    Bare(&'a str),
    /// Contents of a `"…"` segment, still carrying any `\"` escapes.
    Quoted(&'a str),
    /// Contents of a `[…]` segment.
    Bracketed(&'a str),
}

impl<'a> Token<'a> {
    /// The token's text regardless of how it was delimited.
    pub fn text(&self) -> &'a str {
        match self {
            Token::Bare(s) | Token::Quoted(s) | Token::Bracketed(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenizeError {
    #[error("unterminated quote starting at byte {0}")]
    UnterminatedQuote(usize),
    #[error("unterminated bracket starting at byte {0}")]
    UnterminatedBracket(usize),
}

/// Options for [`tokenize`].
#[derive(Debug, Clone, Copy)]
pub struct TokenizeOptions {
    /// Treat `[` at the start of a token as an opening bracket. ALB logs
    /// never bracket timestamps but do use `[v6]:port`, which must stay bare.
    pub brackets: bool,
}

impl Default for TokenizeOptions {
    fn default() -> Self {
        Self { brackets: true }
    }
}

pub fn tokenize(line: &str) -> Result<Vec<Token<'_>>, TokenizeError> {
    tokenize_with(line, TokenizeOptions::default())
}

pub fn tokenize_with(line: &str, opts: TokenizeOptions) -> Result<Vec<Token<'_>>, TokenizeError> {
    let bytes = line.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b if b.is_ascii_whitespace() => i += 1,
            b'"' => {
                let start = i + 1;
                let end = closing_quote(bytes, start).ok_or(TokenizeError::UnterminatedQuote(i))?;
                tokens.push(Token::Quoted(&line[start..end]));
                i = end + 1;
            }
            b'[' if opts.brackets => {
                let start = i + 1;
                let end = bytes[start..]
                    .iter()
                    .position(|b| *b == b']')
                    .map(|p| start + p)
                    .ok_or(TokenizeError::UnterminatedBracket(i))?;
                tokens.push(Token::Bracketed(&line[start..end]));
                i = end + 1;
            }
            _ => {
                let start = i;
                while i < bytes.len() && !bytes[i].is_ascii_whitespace() {
                    i += 1;
                }
                tokens.push(Token::Bare(&line[start..i]));
            }
        }
    }

    Ok(tokens)
}

/// Index of the `"` closing a segment that starts at `from`, skipping `\"`.
fn closing_quote(bytes: &[u8], from: usize) -> Option<usize> {
    let mut i = from;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return Some(i),
            _ => i += 1,
        }
    }
    None
}

/// Resolve `\"` and `\\` escapes inside a quoted segment.
pub fn unescape(s: &str) -> std::borrow::Cow<'_, str> {
    if !s.contains('\\') {
        return std::borrow::Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(n @ ('"' | '\\')) => out.push(n),
                Some(n) => {
                    out.push('\\');
                    out.push(n);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    std::borrow::Cow::Owned(out)
}
