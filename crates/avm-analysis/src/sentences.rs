//! Sentence splitting for LLM answers.
//!
//! A sentence ends at a run of terminators (`.`, `!`, `?`, `…`) followed by
//! whitespace or end of text, or at a line break. Dots inside a token
//! (`acme.com`, `3.5`) never split, and neither does the dot of a common
//! abbreviation (`e.g.`, `Dr.`). Fragments with no letters or digits, such as
//! bare markdown bullets, are dropped.

use avm_core::Sentence;

fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '…')
}

fn is_closing(c: char) -> bool {
    matches!(c, '"' | '\'' | '”' | '’' | ')' | ']' | '*' | '_')
}

/// Abbreviations that rarely end a sentence, lowercase without the final dot.
const ABBREVIATIONS: &[&str] = &[
    "e.g", "i.e", "eg", "ie", "cf", "vs", "approx", "dr", "mr", "mrs", "ms", "prof", "st", "jr",
    "sr", "fig",
];

/// `true` when `fragment` ends with a single dot closing a known abbreviation.
fn ends_with_abbreviation(fragment: &str) -> bool {
    let Some(body) = fragment.strip_suffix('.') else {
        return false;
    };
    let Some(word) = body.split_whitespace().last() else {
        return false;
    };
    let word = word.trim_start_matches(['(', '[', '"', '“', '\'']);
    ABBREVIATIONS.contains(&word.to_lowercase().as_str())
}

/// `1.` or `12)` at the start of a numbered list item.
fn is_list_marker(fragment: &str) -> bool {
    let trimmed = fragment.trim();
    let Some(last) = trimmed.chars().last() else {
        return false;
    };
    let digits = &trimmed[..trimmed.len() - last.len_utf8()];
    matches!(last, '.' | ')') && !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

/// Split a response into indexed sentences.
#[must_use]
pub fn split_sentences(text: &str) -> Vec<Sentence> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\n' || c == '\r' {
            flush(&mut current, &mut sentences);
            continue;
        }

        current.push(c);
        if !is_terminator(c) {
            continue;
        }

        while let Some(&next) = chars.peek() {
            if is_terminator(next) || is_closing(next) {
                current.push(next);
                chars.next();
            } else {
                break;
            }
        }

        let at_boundary = chars.peek().is_none_or(|next| next.is_whitespace());
        if at_boundary && !is_list_marker(&current) && !ends_with_abbreviation(&current) {
            flush(&mut current, &mut sentences);
        }
    }
    flush(&mut current, &mut sentences);

    sentences
}

fn flush(current: &mut String, sentences: &mut Vec<Sentence>) {
    let text = current.trim();
    if text.chars().any(char::is_alphanumeric) {
        sentences.push(Sentence {
            text: text.to_string(),
            index: sentences.len(),
            word_count: text.split_whitespace().count(),
        });
    }
    current.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_terminators() {
        let s = split_sentences("Acme is the best. Other Co is fine. Acme again.");
        let texts: Vec<&str> = s.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["Acme is the best.", "Other Co is fine.", "Acme again."]
        );
        let idx: Vec<usize> = s.iter().map(|s| s.index).collect();
        assert_eq!(idx, vec![0, 1, 2]);
        let wc: Vec<usize> = s.iter().map(|s| s.word_count).collect();
        assert_eq!(wc, vec![4, 4, 2]);
    }

    #[test]
    fn dots_inside_tokens_do_not_split() {
        let s = split_sentences("Visit acme.com for version 3.5 details. Done!");
        assert_eq!(s.len(), 2);
        assert_eq!(s[0].text, "Visit acme.com for version 3.5 details.");
    }

    #[test]
    fn line_breaks_split_and_bullets_are_dropped() {
        let s = split_sentences("Top picks:\n- Acme\n-\n* Globex is solid");
        let texts: Vec<&str> = s.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["Top picks:", "- Acme", "* Globex is solid"]);
    }

    #[test]
    fn numbered_list_markers_stay_with_their_item() {
        let s = split_sentences("1. Acme is great.\n2. Globex is fine.");
        assert_eq!(s.len(), 2);
        assert_eq!(s[0].text, "1. Acme is great.");
        assert_eq!(s[1].index, 1);
    }

    #[test]
    fn common_abbreviations_do_not_split() {
        let s = split_sentences("Pick a card, e.g. Acme or Globex. Dr. Pepper fans vs. others differ.");
        let texts: Vec<&str> = s.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "Pick a card, e.g. Acme or Globex.",
                "Dr. Pepper fans vs. others differ."
            ]
        );
    }

    #[test]
    fn abbreviation_at_end_of_text_still_flushes() {
        let s = split_sentences("Ask the Dr.");
        assert_eq!(s.len(), 1);
        assert_eq!(s[0].text, "Ask the Dr.");
    }

    #[test]
    fn repeated_terminators_and_quotes_stay_attached() {
        let s = split_sentences("Is it \"Acme?!\" Yes.");
        assert_eq!(s.len(), 2);
        assert_eq!(s[0].text, "Is it \"Acme?!\"");
    }

    #[test]
    fn empty_and_whitespace_input() {
        assert!(split_sentences("").is_empty());
        assert!(split_sentences("   \n\t ").is_empty());
        assert!(split_sentences("... !!!").is_empty());
    }

    #[test]
    fn trailing_text_without_terminator_is_kept() {
        let s = split_sentences("First one. second without end");
        assert_eq!(s.len(), 2);
        assert_eq!(s[1].text, "second without end");
        assert_eq!(s[1].word_count, 3);
    }
}
