use std::fmt;

/// Half-open `[start, start + length)` range over the source buffer.
/// Every diagnostic carries one of these, so spans are byte offsets that
/// slice the original text exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSpan {
    pub start: usize,
    pub length: usize,
}

impl TextSpan {
    pub fn new(start: usize, length: usize) -> Self {
        Self { start, length }
    }

    pub fn from_bounds(start: usize, end: usize) -> Self {
        debug_assert!(end >= start);
        Self {
            start,
            length: end - start,
        }
    }

    pub fn single(position: usize) -> Self {
        Self {
            start: position,
            length: 1,
        }
    }

    pub fn end(&self) -> usize {
        self.start + self.length
    }

    /// Smallest span covering both `self` and `other`.
    pub fn union(self, other: TextSpan) -> TextSpan {
        let start = self.start.min(other.start);
        let end = self.end().max(other.end());
        TextSpan::from_bounds(start, end)
    }

    pub fn to_range(self) -> std::ops::Range<usize> {
        self.start..self.end()
    }
}

impl fmt::Display for TextSpan {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end())
    }
}

/// One physical line of a `SourceText`: where it starts, how long it is, and
/// how long it is including its trailing line break.
#[derive(Debug, Clone, Copy)]
pub struct TextLine {
    pub start: usize,
    pub length: usize,
    pub length_with_break: usize,
}

impl TextLine {
    pub fn end(&self) -> usize {
        self.start + self.length
    }

    pub fn span(&self) -> TextSpan {
        TextSpan::new(self.start, self.length)
    }

    pub fn span_with_break(&self) -> TextSpan {
        TextSpan::new(self.start, self.length_with_break)
    }
}

/// Immutable source buffer with precomputed line boundaries.
/// Built once per compilation; position→line lookup is a binary search.
#[derive(Debug, Clone)]
pub struct SourceText {
    text: String,
    lines: Vec<TextLine>,
}

impl SourceText {
    pub fn from(text: impl Into<String>) -> Self {
        let text = text.into();
        let lines = parse_lines(&text);
        Self { text, lines }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn lines(&self) -> &[TextLine] {
        &self.lines
    }

    /// Slice of the original text covered by `span`.
    pub fn span_text(&self, span: TextSpan) -> &str {
        &self.text[span.to_range()]
    }

    /// Index of the line containing `position`. Positions at or past the end
    /// of the text map to the last line.
    pub fn line_index(&self, position: usize) -> usize {
        let mut lower = 0;
        let mut upper = self.lines.len() - 1;

        while lower <= upper {
            let index = lower + (upper - lower) / 2;
            let start = self.lines[index].start;

            if position == start {
                return index;
            }
            if position < start {
                upper = index - 1;
            } else {
                lower = index + 1;
            }
        }

        lower - 1
    }
}

fn parse_lines(text: &str) -> Vec<TextLine> {
    let mut lines = Vec::new();
    let bytes = text.as_bytes();
    let mut position = 0;
    let mut line_start = 0;

    while position < bytes.len() {
        let break_width = line_break_width(bytes, position);

        if break_width == 0 {
            position += 1;
        } else {
            lines.push(TextLine {
                start: line_start,
                length: position - line_start,
                length_with_break: position - line_start + break_width,
            });
            position += break_width;
            line_start = position;
        }
    }

    // The final line is always present, even when the text is empty or ends
    // with a break.
    lines.push(TextLine {
        start: line_start,
        length: text.len() - line_start,
        length_with_break: text.len() - line_start,
    });

    lines
}

fn line_break_width(bytes: &[u8], position: usize) -> usize {
    match bytes[position] {
        b'\r' if bytes.get(position + 1) == Some(&b'\n') => 2,
        b'\r' | b'\n' => 1,
        _ => 0,
    }
}
