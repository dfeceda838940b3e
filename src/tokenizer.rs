use crate::errors::{ParseError, SyntaxError};

/// A word scanned from the input line.
///
/// `quoted` records whether the word came from a `"..."` group, so that a
/// quoted `"|"` is never mistaken for the pipe operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub quoted: bool,
}

impl Token {
    /// Whether this token is the unquoted operator `op`
    pub fn is_operator(&self, op: &str) -> bool {
        !self.quoted && self.text == op
    }
}

/// Cursor over a raw input line that yields one word at a time
pub struct Tokenizer<'a> {
    line: &'a str,
    cursor: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(line: &'a str) -> Self {
        Self { line, cursor: 0 }
    }

    /// Byte offset of the first character not yet consumed
    #[cfg(test)]
    fn position(&self) -> usize {
        self.cursor
    }

    /// Scan the next word.
    ///
    /// Returns `Ok(None)` at end of input. A `"` opens a group running to the
    /// next `"`; both quote characters are consumed but not copied. A group
    /// without its closing quote fails the whole line.
    pub fn next_word(&mut self) -> Result<Option<Token>, ParseError> {
        let rest = &self.line[self.cursor..];
        let skipped = rest.len() - rest.trim_start().len();
        self.cursor += skipped;
        let rest = &self.line[self.cursor..];

        if rest.is_empty() {
            return Ok(None);
        }

        let (text, consumed, quoted) = if let Some(body) = rest.strip_prefix('"') {
            let end = body.find('"').ok_or(SyntaxError::MalformedLine)?;
            (&body[..end], end + 2, true)
        } else {
            let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            (&rest[..end], end, false)
        };

        self.cursor += consumed;
        Ok(Some(Token {
            text: copy_word(text)?,
            quoted,
        }))
    }
}

/// Copy the word into its own allocation, reporting allocation failure instead of aborting
fn copy_word(text: &str) -> Result<String, ParseError> {
    let mut word = String::new();
    word.try_reserve_exact(text.len())
        .map_err(|_| ParseError::OutOfMemory)?;
    word.push_str(text);
    Ok(word)
}
