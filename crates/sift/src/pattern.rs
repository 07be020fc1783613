//! SQL `LIKE` pattern matching.
//!
//! `%` matches any run of characters (including none), `_` matches exactly
//! one character; everything else matches itself. There is no escape
//! character.

use regex::Regex;

/// Matches `text` against a `LIKE` pattern without compiling a regex.
///
/// Both inputs are decoded into `char` buffers once, then matched with
/// single-`%` backtracking.
pub fn like_matches(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();

    let (mut ti, mut pi) = (0, 0);
    // Position of the last `%` seen, and the text index it was tried at.
    let mut backtrack: Option<(usize, usize)> = None;

    while ti < text.len() {
        match pattern.get(pi) {
            Some('%') => {
                backtrack = Some((pi, ti));
                pi += 1;
            }
            Some(&c) if c == '_' || c == text[ti] => {
                ti += 1;
                pi += 1;
            }
            _ => match backtrack {
                Some((star, mark)) => {
                    pi = star + 1;
                    ti = mark + 1;
                    backtrack = Some((star, mark + 1));
                }
                None => return false,
            },
        }
    }

    pattern[pi..].iter().all(|&c| c == '%')
}

/// Compiles a `LIKE` pattern to an anchored regular expression.
pub fn like_to_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let mut source = String::with_capacity(pattern.len() + 8);
    source.push_str("(?s)^");
    for c in pattern.chars() {
        match c {
            '%' => source.push_str(".*"),
            '_' => source.push('.'),
            other => source.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    source.push('$');
    Regex::new(&source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_patterns() {
        assert!(like_matches("Dune", "Dune"));
        assert!(!like_matches("Dune", "dune"));
        assert!(!like_matches("Dune", "Dun"));
    }

    #[test]
    fn percent_matches_any_run() {
        assert!(like_matches("Dune Messiah", "Dune%"));
        assert!(like_matches("Dune", "Dune%"));
        assert!(like_matches("Children of Dune", "%Dune"));
        assert!(like_matches("abcabc", "%b%c"));
        assert!(!like_matches("Foundation", "%Dune%"));
        assert!(like_matches("", "%"));
    }

    #[test]
    fn underscore_matches_one_char() {
        assert!(like_matches("cat", "c_t"));
        assert!(!like_matches("ct", "c_t"));
        assert!(like_matches("héllo", "h_llo"));
    }

    #[test]
    fn regex_agrees_on_examples() {
        for (text, pattern) in [
            ("Dune Messiah", "Dune%"),
            ("a.b", "a.b"),
            ("axb", "a.b"),
            ("line\nbreak", "line%"),
            ("cost (usd)", "cost (%)"),
        ] {
            let regex = like_to_regex(pattern).unwrap();
            assert_eq!(
                regex.is_match(text),
                like_matches(text, pattern),
                "{text:?} LIKE {pattern:?}"
            );
        }
    }
}
