//! Word-level tokenization and three-way word merging.
//!
//! A word is a run of alphanumeric/underscore characters; every whitespace
//! run and every other character is a token of its own. Concatenating the
//! tokens always reproduces the input.

use std::ops::Range;

use similar::{capture_diff_slices, Algorithm, DiffTag};

use super::ranges_overlap;

/// Split `text` into word, whitespace and punctuation tokens.
pub fn tokenize_words(text: &str) -> Vec<&str> {
    #[derive(PartialEq, Clone, Copy)]
    enum Class {
        Word,
        Space,
        Other,
    }
    fn class_of(c: char) -> Class {
        if c.is_alphanumeric() || c == '_' {
            Class::Word
        } else if c.is_whitespace() {
            Class::Space
        } else {
            Class::Other
        }
    }

    let mut tokens = Vec::new();
    let mut start = 0;
    let mut current: Option<Class> = None;
    for (idx, c) in text.char_indices() {
        let class = class_of(c);
        match current {
            Some(prev) if prev == class && class != Class::Other => {}
            Some(_) => {
                tokens.push(&text[start..idx]);
                start = idx;
            }
            None => {}
        }
        current = Some(class);
    }
    if start < text.len() {
        tokens.push(&text[start..]);
    }
    tokens
}

/// A word-level edit: base tokens `base` replaced by `replacement`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordEdit {
    pub base: Range<usize>,
    pub replacement: String,
}

/// Word edits turning `base` tokens into `side` tokens.
pub fn word_edits(base: &[&str], side: &[&str]) -> Vec<WordEdit> {
    let ops = capture_diff_slices(Algorithm::Myers, base, side);
    let mut edits: Vec<(Range<usize>, Range<usize>)> = Vec::new();
    for op in ops {
        if op.tag() == DiffTag::Equal {
            continue;
        }
        let (old, new) = (op.old_range(), op.new_range());
        match edits.last_mut() {
            Some((last_old, last_new)) if last_old.end == old.start && last_new.end == new.start => {
                last_old.end = old.end;
                last_new.end = new.end;
            }
            _ => edits.push((old, new)),
        }
    }
    edits
        .into_iter()
        .map(|(old, new)| WordEdit {
            base: old,
            replacement: side[new].concat(),
        })
        .collect()
}

/// Merge two word-level edit sets of the same base text.
///
/// Returns `None` when an edit of one side collides with a different edit
/// of the other side. Identical edits on both sides are applied once.
pub fn merge_words(base: &str, yours: &str, theirs: &str) -> Option<String> {
    let base_tokens = tokenize_words(base);
    let yours_edits = word_edits(&base_tokens, &tokenize_words(yours));
    let theirs_edits = word_edits(&base_tokens, &tokenize_words(theirs));

    let mut combined: Vec<WordEdit> = yours_edits.clone();
    for edit in theirs_edits {
        if yours_edits.contains(&edit) {
            continue;
        }
        if yours_edits
            .iter()
            .any(|mine| ranges_overlap(&mine.base, &edit.base))
        {
            return None;
        }
        combined.push(edit);
    }
    combined.sort_by_key(|edit| (edit.base.start, edit.base.end));

    let mut merged = String::with_capacity(base.len() + 16);
    let mut pos = 0;
    for edit in &combined {
        merged.push_str(&base_tokens[pos..edit.base.start].concat());
        merged.push_str(&edit.replacement);
        pos = edit.base.end;
    }
    merged.push_str(&base_tokens[pos..].concat());
    Some(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_round_trips() {
        let text = "let x = foo(a, b);\n";
        let tokens = tokenize_words(text);
        assert_eq!(tokens.concat(), text);
        assert_eq!(tokens[0], "let");
        assert_eq!(tokens[1], " ");
        assert!(tokens.contains(&"foo"));
        assert!(tokens.contains(&"("));
    }

    #[test]
    fn test_punctuation_is_split() {
        assert_eq!(tokenize_words("();"), vec!["(", ")", ";"]);
    }

    #[test]
    fn test_merge_disjoint_word_edits() {
        let merged = merge_words(
            "call(alpha, beta)\n",
            "call(ALPHA, beta)\n",
            "call(alpha, BETA)\n",
        );
        assert_eq!(merged.as_deref(), Some("call(ALPHA, BETA)\n"));
    }

    #[test]
    fn test_merge_colliding_word_edits() {
        assert_eq!(merge_words("b\n", "X\n", "Y\n"), None);
    }

    #[test]
    fn test_merge_identical_edit_applied_once() {
        let merged = merge_words("a b c\n", "a B c\n", "a B c!\n");
        assert_eq!(merged.as_deref(), Some("a B c!\n"));
    }
}
