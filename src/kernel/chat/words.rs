//! Word counting over rendered markdown.

use unicode_segmentation::UnicodeSegmentation;

pub fn count_words(markdown: &str) -> usize {
    markdown.unicode_words().count()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WordPrefix<'a> {
    pub text: &'a str,
    pub word_count: usize,
    /// True when `text` is the whole input.
    pub is_full: bool,
}

/// The shortest prefix of `markdown` holding its first `n` words.
pub fn take_words(markdown: &str, n: usize) -> WordPrefix<'_> {
    let mut seen = 0;
    for (offset, segment) in markdown.split_word_bound_indices() {
        if !is_word(segment) {
            continue;
        }
        if seen == n {
            return WordPrefix {
                text: &markdown[..offset],
                word_count: seen,
                is_full: false,
            };
        }
        seen += 1;
    }
    WordPrefix {
        text: markdown,
        word_count: seen,
        is_full: true,
    }
}

fn is_word(segment: &str) -> bool {
    segment.chars().any(char::is_alphanumeric)
}
