//! Char-offset helpers over textblock content.
//!
//! Document positions count chars, not bytes; these bridge the two and find
//! word boundaries for commands that act on the word under a collapsed cursor.

use std::ops::Range;

/// Number of chars in `text`.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Byte index of the char at `char_offset`, or `text.len()` past the end.
pub fn char_to_byte(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map(|(byte, _)| byte)
        .unwrap_or(text.len())
}

/// Find the whitespace-delimited word around `offset`.
///
/// The result is empty when the cursor touches no word, e.g. between two
/// spaces or in an empty block.
pub fn find_word_boundaries(text: &str, offset: usize) -> Range<usize> {
    let chars: Vec<char> = text.chars().collect();
    let offset = offset.min(chars.len());

    // Find start by scanning backwards.
    let mut start = offset;
    while start > 0 && !chars[start - 1].is_whitespace() {
        start -= 1;
    }

    // Find end by scanning forwards.
    let mut end = offset;
    while end < chars.len() && !chars[end].is_whitespace() {
        end += 1;
    }

    start..end
}

/// Collapse whitespace runs to single spaces and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_inside() {
        assert_eq!(find_word_boundaries("hello world", 2), 0..5);
        assert_eq!(find_word_boundaries("hello world", 8), 6..11);
    }

    #[test]
    fn test_word_edges() {
        // cursor right after a word still selects it
        assert_eq!(find_word_boundaries("hello world", 5), 0..5);
        assert_eq!(find_word_boundaries("hello world", 6), 6..11);
        assert_eq!(find_word_boundaries("hello world", 11), 6..11);
    }

    #[test]
    fn test_no_word() {
        assert!(find_word_boundaries("a  b", 2).is_empty());
        assert!(find_word_boundaries("", 0).is_empty());
        assert!(find_word_boundaries("line\n\nnext", 5).is_empty());
    }

    #[test]
    fn test_multibyte_offsets() {
        assert_eq!(find_word_boundaries("año nuevo", 1), 0..3);
        assert_eq!(char_to_byte("año", 2), 3);
        assert_eq!(char_to_byte("año", 9), 4);
        assert_eq!(char_len("año"), 3);
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  Getting \n started\t"), "Getting started");
    }
}
