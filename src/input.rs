//! Cursor over the raw source bytes.
//!
//! Every operation clamps to the buffer bounds, so the lexer can probe ahead
//! freely; only [`Input::read_at`] reports an out-of-range offset.

use crate::error::InputError;
use crate::span::Span;

#[derive(Debug, Clone)]
pub struct Input<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> Input<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Input { bytes, position: 0 }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn is_at_end(&self) -> bool {
        self.position >= self.bytes.len()
    }

    pub fn remaining(&self) -> &'a [u8] {
        &self.bytes[self.position.min(self.bytes.len())..]
    }

    /// The byte under the cursor.
    pub fn peek(&self) -> Option<u8> {
        self.peek_at(0)
    }

    /// The byte `offset` positions past the cursor.
    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.position.saturating_add(offset)).copied()
    }

    /// Up to `n` bytes starting at the cursor.
    pub fn peek_n(&self, n: usize) -> &'a [u8] {
        let start = self.position.min(self.bytes.len());
        let end = self.position.saturating_add(n).min(self.bytes.len());
        &self.bytes[start..end]
    }

    pub fn starts_with(&self, prefix: &[u8]) -> bool {
        self.remaining().starts_with(prefix)
    }

    pub fn consume(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.position += 1;
        Some(byte)
    }

    /// Advances by up to `n` bytes, returning how many were consumed.
    pub fn consume_n(&mut self, n: usize) -> usize {
        let available = self.bytes.len().saturating_sub(self.position);
        let taken = n.min(available);
        self.position += taken;
        taken
    }

    pub fn consume_while(&mut self, mut predicate: impl FnMut(u8) -> bool) -> usize {
        let start = self.position;
        while let Some(byte) = self.peek() {
            if !predicate(byte) {
                break;
            }
            self.position += 1;
        }
        self.position - start
    }

    /// Advances up to, but not including, the next occurrence of `delimiter`.
    /// Runs to the end of input when the delimiter never appears.
    pub fn consume_until(&mut self, delimiter: &[u8]) -> usize {
        let start = self.position;
        match find(self.remaining(), delimiter) {
            Some(offset) => self.position += offset,
            None => self.position = self.bytes.len().max(self.position),
        }
        self.position - start
    }

    /// Advances past the next occurrence of `delimiter`, including it.
    /// Runs to the end of input when the delimiter never appears.
    pub fn consume_through(&mut self, delimiter: &[u8]) -> usize {
        let start = self.position;
        match find(self.remaining(), delimiter) {
            Some(offset) => self.position += offset + delimiter.len(),
            None => self.position = self.bytes.len().max(self.position),
        }
        self.position - start
    }

    pub fn consume_whitespace(&mut self) -> usize {
        self.consume_while(|b| b.is_ascii_whitespace())
    }

    /// Bytes in the absolute range `[start, end)`, clamped to the buffer.
    pub fn slice(&self, start: usize, end: usize) -> &'a [u8] {
        let end = end.min(self.bytes.len());
        let start = start.min(end);
        &self.bytes[start..end]
    }

    pub fn slice_span(&self, span: Span) -> &'a [u8] {
        self.slice(span.start, span.end)
    }

    /// Absolute single-byte read. Unlike every other accessor this one does
    /// not clamp.
    pub fn read_at(&self, offset: usize) -> Result<u8, InputError> {
        self.bytes
            .get(offset)
            .copied()
            .ok_or(InputError::OutOfBounds {
                offset,
                len: self.bytes.len(),
            })
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}
