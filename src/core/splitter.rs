//! Oversized text splitting
//!
//! The synthesis engine rejects utterances above a maximum length. Long text
//! is cut at the delimiter nearest its middle, trying line breaks first, then
//! carriage returns, then spaces; a segment with none of them is halved.
//! Each cut consumes the delimiter character. Lengths are counted in chars.

/// Delimiters in the order they are tried
pub const SPLIT_DELIMITERS: [char; 3] = ['\n', '\r', ' '];

/// Split `text` into pieces of at most `max_chars` chars
///
/// The returned iterator is lazy and `Clone`, so it can be restarted.
/// Empty pieces are skipped.
///
/// ```
/// use speech_queue::core::splitter::split_text;
///
/// let pieces: Vec<&str> = split_text("one two three four", 9).collect();
/// assert_eq!(pieces, vec!["one two", "three", "four"]);
/// ```
pub fn split_text(text: &str, max_chars: usize) -> TextChunks<'_> {
    TextChunks {
        text,
        max_chars: max_chars.max(1),
        stack: vec![Segment {
            start: 0,
            end: text.len(),
            delimiter: 0,
        }],
    }
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    /// Byte range into the source text
    start: usize,
    end: usize,
    /// Index of the first delimiter still worth trying
    delimiter: usize,
}

/// Iterator over the pieces of a split text
#[derive(Debug, Clone)]
pub struct TextChunks<'a> {
    text: &'a str,
    max_chars: usize,
    stack: Vec<Segment>,
}

impl<'a> TextChunks<'a> {
    /// Push the two halves so the left one is visited first
    fn push_halves(&mut self, left: Segment, right: Segment) {
        self.stack.push(right);
        self.stack.push(left);
    }
}

impl<'a> Iterator for TextChunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(segment) = self.stack.pop() {
            let piece = &self.text[segment.start..segment.end];
            if piece.is_empty() {
                continue;
            }

            let len = piece.chars().count();
            if len <= self.max_chars {
                return Some(piece);
            }

            // Byte offset of the middle char, and of the char after it.
            let mid_char = len / 2;
            let mut boundaries = piece.char_indices().map(|(i, _)| i).skip(mid_char);
            let mid = boundaries.next().unwrap_or(piece.len());
            let after_mid = boundaries.next().unwrap_or(piece.len());

            let Some(&delimiter) = SPLIT_DELIMITERS.get(segment.delimiter) else {
                self.push_halves(
                    Segment {
                        end: segment.start + mid,
                        ..segment
                    },
                    Segment {
                        start: segment.start + mid,
                        ..segment
                    },
                );
                continue;
            };

            // Last delimiter at or before the middle, else the first one after it.
            let cut = piece[..after_mid]
                .rfind(delimiter)
                .or_else(|| piece[mid..].find(delimiter).map(|i| i + mid));

            match cut {
                Some(cut) => {
                    let cut = segment.start + cut;
                    self.push_halves(
                        Segment { end: cut, ..segment },
                        Segment {
                            start: cut + delimiter.len_utf8(),
                            ..segment
                        },
                    );
                }
                None => self.stack.push(Segment {
                    delimiter: segment.delimiter + 1,
                    ..segment
                }),
            }
        }
        None
    }
}
