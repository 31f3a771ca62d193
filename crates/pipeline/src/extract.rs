use once_cell::sync::Lazy;
use pronord_core::{PronounHit, UserRecord};
use regex::Regex;
use std::collections::HashSet;

/// Pre-compiled cleanup regex: everything that is not a Latin letter,
/// space, slash, comma, semicolon or newline gets stripped before
/// tokenizing. Input is lowercased first, so a-z is enough.
static NON_PRONOUN_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z /,;\n]").expect("pronoun cleanup regex is valid"));

/// Matches free-form bio text against a fixed allow-list of pronoun
/// sets. Pure and deterministic; all the I/O lives elsewhere.
#[derive(Debug, Clone)]
pub struct PronounMatcher {
    allow: HashSet<String>,
}

impl PronounMatcher {
    pub fn new(allow_list: &[String]) -> Self {
        Self {
            allow: allow_list.iter().cloned().collect(),
        }
    }

    /// Extract recognized pronoun sets from text, in first-seen order.
    /// Duplicates in the text pass through; the caller gets exactly
    /// what was written.
    pub fn check_words(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let cleaned = NON_PRONOUN_CHARS.replace_all(&lowered, "");
        cleaned
            .split([' ', ',', ';', '\n'])
            .filter(|token| token.contains('/'))
            .filter(|token| self.allow.contains(*token))
            .map(String::from)
            .collect()
    }

    /// Keep only users whose bio (or, failing that, location) carries
    /// at least one recognized pronoun set. Records without an id or
    /// without any text to scan are dropped.
    pub fn have_pronouns(&self, users: Vec<UserRecord>) -> Vec<PronounHit> {
        let mut hits = Vec::new();
        for user in users {
            if user.id.is_empty() {
                continue;
            }
            let bio = user.bio.as_deref().filter(|s| !s.is_empty());
            let location = user.location.as_deref().filter(|s| !s.is_empty());
            if bio.is_none() && location.is_none() {
                continue;
            }

            let mut pronouns = bio.map(|b| self.check_words(b)).unwrap_or_default();
            if pronouns.is_empty() {
                if let Some(loc) = location {
                    pronouns = self.check_words(loc);
                }
            }

            if !pronouns.is_empty() {
                hits.push(PronounHit { user, pronouns });
            }
        }
        hits
    }
}

/// Display form: `they/them` -> `They/Them`. Idempotent.
pub fn capitalize(set: &str) -> String {
    set.split('/')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pronord_core::Config;

    fn matcher() -> PronounMatcher {
        PronounMatcher::new(&Config::default().pronouns)
    }

    fn user(handle: &str, id: &str, bio: Option<&str>, location: Option<&str>) -> UserRecord {
        UserRecord {
            handle: handle.to_string(),
            id: id.to_string(),
            name: None,
            bio: bio.map(String::from),
            location: location.map(String::from),
        }
    }

    #[test]
    fn test_check_words_emoji_and_parens() {
        let m = matcher();
        assert_eq!(m.check_words("🏳️‍🌈 Writer (They/Them)"), vec!["they/them"]);
    }

    #[test]
    fn test_check_words_mixed_separators() {
        let m = matcher();
        assert_eq!(
            m.check_words("Talk to me about k8s [they/them, she/her,it/its]"),
            vec!["they/them", "she/her", "it/its"]
        );
    }

    #[test]
    fn test_check_words_is_deterministic_and_pure() {
        let m = matcher();
        let input = "she/her ♥ artist ♥ she/her";
        let first = m.check_words(input);
        let second = m.check_words(input);
        assert_eq!(first, second);
        // Duplicates in the source text pass through.
        assert_eq!(first, vec!["she/her", "she/her"]);
    }

    #[test]
    fn test_check_words_rejects_unknown_sets() {
        let m = matcher();
        assert!(m.check_words("ab/cd weird/order them/they").is_empty());
        assert!(m.check_words("").is_empty());
        assert!(m.check_words("no slashes here at all").is_empty());
    }

    #[test]
    fn test_check_words_newline_separator() {
        let m = matcher();
        assert_eq!(
            m.check_words("cat person\nhe/him\ncoffee"),
            vec!["he/him"]
        );
    }

    #[test]
    fn test_have_pronouns_qualifying_users() {
        let m = matcher();
        let hits = m.have_pronouns(vec![
            user("a", "1", Some("He/They/Any - text"), None),
            user("b", "0", Some("#bitcoin"), None),
        ]);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].user.handle, "a");
        assert_eq!(hits[0].pronouns[0], "he/they/any");
    }

    #[test]
    fn test_have_pronouns_skips_invalid_records() {
        let m = matcher();
        let hits = m.have_pronouns(vec![
            user("no_id", "", Some("they/them"), None),
            user("no_text", "2", None, None),
            user("empty_text", "3", Some(""), Some("")),
        ]);
        assert!(hits.is_empty());
    }

    #[test]
    fn test_have_pronouns_location_fallback() {
        let m = matcher();
        let hits = m.have_pronouns(vec![user(
            "a",
            "1",
            Some("just vibes"),
            Some("berlin · she/they"),
        )]);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].pronouns, vec!["she/they"]);
    }

    #[test]
    fn test_bio_match_wins_over_location() {
        let m = matcher();
        let hits = m.have_pronouns(vec![user(
            "a",
            "1",
            Some("he/him"),
            Some("somewhere she/her"),
        )]);
        assert_eq!(hits[0].pronouns, vec!["he/him"]);
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("he/they/any"), "He/They/Any");
        assert_eq!(capitalize("they/them"), "They/Them");
        // Idempotent on already-capitalized input.
        assert_eq!(capitalize("He/They/Any"), "He/They/Any");
    }
}
