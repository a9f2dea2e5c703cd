//! RFC 4515 text parser for the supported filter subset.
//!
//! Only the connectives `&`, `|`, `!` and plain equality items are accepted.
//! Items that would need presence, substring, ordering, approximate or
//! extensible matching are reported as unsupported rather than approximated.

use thiserror::Error;

use crate::{FilterNode, MAX_FILTER_DEPTH};

/// Errors raised while parsing filter text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The input contained no filter.
    #[error("filter is empty")]
    Empty,
    /// The input ended in the middle of a filter.
    #[error("unexpected end of filter at offset {offset}")]
    UnexpectedEnd {
        /// Byte offset at which more input was expected.
        offset: usize,
    },
    /// A character appeared where the grammar does not allow it.
    #[error("unexpected character '{found}' at offset {offset}")]
    UnexpectedCharacter {
        /// Byte offset of the character.
        offset: usize,
        /// The offending character.
        found: char,
    },
    /// An item had no attribute description before the operator.
    #[error("missing attribute description at offset {offset}")]
    EmptyAttribute {
        /// Byte offset of the item.
        offset: usize,
    },
    /// A `\` was not followed by two hexadecimal digits.
    #[error("invalid escape sequence at offset {offset}")]
    InvalidEscape {
        /// Byte offset of the backslash.
        offset: usize,
    },
    /// Escaped bytes did not form valid UTF-8.
    #[error("assertion value at offset {offset} is not valid UTF-8")]
    InvalidUtf8 {
        /// Byte offset of the value.
        offset: usize,
    },
    /// The item uses a matching rule the bridge does not support.
    #[error("{kind} filters are not supported (offset {offset})")]
    Unsupported {
        /// Byte offset of the item.
        offset: usize,
        /// Short description of the unsupported construct.
        kind: &'static str,
    },
    /// The filter nests deeper than [`MAX_FILTER_DEPTH`].
    #[error("filter nesting exceeds {limit} levels")]
    TooDeep {
        /// Configured depth limit.
        limit: usize,
    },
    /// Input continued after a complete filter.
    #[error("unexpected trailing input at offset {offset}")]
    TrailingInput {
        /// Byte offset of the first trailing character.
        offset: usize,
    },
}

/// Parses RFC 4515 filter text into a [`FilterNode`].
///
/// Leading and trailing whitespace around the filter is ignored.
///
/// # Errors
///
/// Returns [`ParseError`] when the text is malformed, nests too deeply, or
/// uses an unsupported item type.
pub fn parse(input: &str) -> Result<FilterNode, ParseError> {
    let trimmed_start = input.len() - input.trim_start().len();
    let body = input.trim();
    if body.is_empty() {
        return Err(ParseError::Empty);
    }

    let mut cursor = Cursor {
        input: body.as_bytes(),
        position: 0,
        base: trimmed_start,
    };
    let node = cursor.filter(1)?;
    if cursor.position < cursor.input.len() {
        return Err(ParseError::TrailingInput {
            offset: cursor.offset(),
        });
    }
    Ok(node)
}

impl std::str::FromStr for FilterNode {
    type Err = ParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        parse(input)
    }
}

struct Cursor<'a> {
    input: &'a [u8],
    position: usize,
    base: usize,
}

impl Cursor<'_> {
    fn offset(&self) -> usize {
        self.base + self.position
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.position).copied()
    }

    fn expect(&mut self, expected: u8) -> Result<(), ParseError> {
        match self.peek() {
            Some(byte) if byte == expected => {
                self.position += 1;
                Ok(())
            }
            Some(_) => Err(self.unexpected()),
            None => Err(ParseError::UnexpectedEnd {
                offset: self.offset(),
            }),
        }
    }

    fn unexpected(&self) -> ParseError {
        let found = self
            .input
            .get(self.position..)
            .and_then(|rest| std::str::from_utf8(rest).ok())
            .and_then(|rest| rest.chars().next())
            .unwrap_or(char::REPLACEMENT_CHARACTER);
        ParseError::UnexpectedCharacter {
            offset: self.offset(),
            found,
        }
    }

    fn filter(&mut self, depth: usize) -> Result<FilterNode, ParseError> {
        if depth > MAX_FILTER_DEPTH {
            return Err(ParseError::TooDeep {
                limit: MAX_FILTER_DEPTH,
            });
        }
        self.expect(b'(')?;
        let node = match self.peek() {
            Some(b'&') => {
                self.position += 1;
                FilterNode::And(self.filter_list(depth)?)
            }
            Some(b'|') => {
                self.position += 1;
                FilterNode::Or(self.filter_list(depth)?)
            }
            Some(b'!') => {
                self.position += 1;
                FilterNode::not(self.filter(depth + 1)?)
            }
            Some(_) => self.item()?,
            None => {
                return Err(ParseError::UnexpectedEnd {
                    offset: self.offset(),
                });
            }
        };
        self.expect(b')')?;
        Ok(node)
    }

    fn filter_list(&mut self, depth: usize) -> Result<Vec<FilterNode>, ParseError> {
        let mut children = Vec::new();
        while self.peek() == Some(b'(') {
            children.push(self.filter(depth + 1)?);
        }
        Ok(children)
    }

    fn item(&mut self) -> Result<FilterNode, ParseError> {
        let item_offset = self.offset();
        let attribute = self.attribute()?;
        match self.peek() {
            Some(b'=') => self.position += 1,
            Some(b'~') => return Err(unsupported(item_offset, "approximate match")),
            Some(b'>' | b'<') => return Err(unsupported(item_offset, "ordering")),
            Some(b':') => return Err(unsupported(item_offset, "extensible match")),
            Some(_) => return Err(self.unexpected()),
            None => {
                return Err(ParseError::UnexpectedEnd {
                    offset: self.offset(),
                });
            }
        }
        if attribute.is_empty() {
            return Err(ParseError::EmptyAttribute {
                offset: item_offset,
            });
        }

        let value = self.value(item_offset)?;
        Ok(FilterNode::Equality { attribute, value })
    }

    fn attribute(&mut self) -> Result<String, ParseError> {
        let start = self.position;
        while let Some(byte) = self.peek() {
            if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b';') {
                self.position += 1;
            } else {
                break;
            }
        }
        let raw = self.input.get(start..self.position).unwrap_or_default();
        std::str::from_utf8(raw)
            .map(str::to_owned)
            .map_err(|_| ParseError::InvalidUtf8 {
                offset: self.base + start,
            })
    }

    fn value(&mut self, item_offset: usize) -> Result<String, ParseError> {
        let value_offset = self.offset();
        let mut bytes = Vec::new();
        loop {
            match self.peek() {
                Some(b')') => break,
                Some(b'(') => return Err(self.unexpected()),
                Some(b'*') => {
                    let lone = bytes.is_empty() && self.input.get(self.position + 1) == Some(&b')');
                    let kind = if lone { "presence" } else { "substring" };
                    return Err(unsupported(item_offset, kind));
                }
                Some(b'\\') => {
                    bytes.push(self.escaped_byte()?);
                }
                Some(byte) => {
                    bytes.push(byte);
                    self.position += 1;
                }
                None => {
                    return Err(ParseError::UnexpectedEnd {
                        offset: self.offset(),
                    });
                }
            }
        }
        String::from_utf8(bytes).map_err(|_| ParseError::InvalidUtf8 {
            offset: value_offset,
        })
    }

    fn escaped_byte(&mut self) -> Result<u8, ParseError> {
        let offset = self.offset();
        let digits = self
            .input
            .get(self.position + 1..self.position + 3)
            .ok_or(ParseError::InvalidEscape { offset })?;
        let high = hex_digit(digits.first().copied()).ok_or(ParseError::InvalidEscape { offset })?;
        let low = hex_digit(digits.get(1).copied()).ok_or(ParseError::InvalidEscape { offset })?;
        self.position += 3;
        Ok((high << 4) | low)
    }
}

fn hex_digit(byte: Option<u8>) -> Option<u8> {
    let digit = char::from(byte?).to_digit(16)?;
    u8::try_from(digit).ok()
}

const fn unsupported(offset: usize, kind: &'static str) -> ParseError {
    ParseError::Unsupported { offset, kind }
}
