use std::fmt;

/// A half-open byte range `[start, end)` into the source text.
///
/// Spans are produced by the lexer for every token and carried by every AST
/// node, so errors raised at any stage can point back at the exact text that
/// caused them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    /// Creates a span, swapping the bounds if they arrive reversed.
    pub fn new(start: usize, end: usize) -> Self {
        if start <= end {
            Span { start, end }
        } else {
            Span {
                start: end,
                end: start,
            }
        }
    }

    /// An empty span sitting at `position`.
    pub fn empty(position: usize) -> Self {
        Span {
            start: position,
            end: position,
        }
    }

    /// The smallest span covering both `self` and `other`.
    pub fn join(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

impl From<std::ops::Range<usize>> for Span {
    fn from(range: std::ops::Range<usize>) -> Self {
        Span::new(range.start, range.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_orders_bounds() {
        assert_eq!(Span::new(7, 3), Span { start: 3, end: 7 });
    }

    #[test]
    fn test_join_covers_both() {
        let joined = Span::new(4, 6).join(Span::new(0, 2));
        assert_eq!(joined, Span::new(0, 6));
        assert_eq!(joined.len(), 6);
    }

    #[test]
    fn test_join_with_nested_span() {
        assert_eq!(Span::new(0, 10).join(Span::new(3, 4)), Span::new(0, 10));
    }

    #[test]
    fn test_contains_is_half_open() {
        let span = Span::new(2, 5);
        assert!(span.contains(2));
        assert!(span.contains(4));
        assert!(!span.contains(5));
        assert!(Span::empty(3).is_empty());
    }
}
