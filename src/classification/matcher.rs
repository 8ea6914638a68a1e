//! Word-boundary-aware phrase matching over a compiled lexicon.
use regex::{RegexSet, RegexSetBuilder};

use super::lexicon::{Lexicon, LexiconError, LexiconKind, Phrase};
use super::normalize::normalize_for_matching;

/// A lexicon compiled into one `RegexSet`, one pattern per phrase.
///
/// Phrases only match as complete words or word sequences, so `sc` never fires
/// inside `score` and `ed` never fires inside `ended`. The boundaries are half
/// boundaries: a phrase may not be glued to a word character on either side, but
/// it may itself begin or end with punctuation (`u.s.`, `govt.`).
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    kind: LexiconKind,
    set: RegexSet,
    phrases: Vec<Phrase>,
}

impl KeywordMatcher {
    /// # Errors
    /// Returns [`LexiconError::Compile`] if the pattern set exceeds the regex size limits.
    pub fn new(lexicon: &Lexicon) -> Result<Self, LexiconError> {
        let patterns = lexicon
            .phrases()
            .iter()
            .map(|phrase| {
                format!(
                    r"\b{{start-half}}{}\b{{end-half}}",
                    regex::escape(&phrase.text)
                )
            });
        let set = RegexSetBuilder::new(patterns)
            .build()
            .map_err(|source| LexiconError::Compile {
                list: lexicon.kind().as_str(),
                source,
            })?;
        Ok(Self {
            kind: lexicon.kind(),
            set,
            phrases: lexicon.phrases().to_vec(),
        })
    }

    #[must_use]
    pub fn kind(&self) -> LexiconKind {
        self.kind
    }

    /// True if any phrase occurs in `text` as a whole word or phrase.
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        self.set.is_match(&normalize_for_matching(text))
    }

    /// The earliest phrase in lexicon order that occurs in `text`.
    #[must_use]
    pub fn first_match(&self, text: &str) -> Option<&Phrase> {
        let normalized = normalize_for_matching(text);
        self.set
            .matches(&normalized)
            .iter()
            .next()
            .and_then(|index| self.phrases.get(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn matcher(phrases: &[&str]) -> KeywordMatcher {
        let lexicon = Lexicon::from_phrases(LexiconKind::Political, "test", phrases.iter().copied())
            .expect("lexicon");
        KeywordMatcher::new(&lexicon).expect("matcher")
    }

    #[rstest]
    #[case("Team posts record score in final over", false)]
    #[case("SC stays demolition order", true)]
    #[case("Verdict by the SC, says counsel", true)]
    #[case("scandal rocks the capital", false)]
    fn abbreviations_respect_word_boundaries(#[case] text: &str, #[case] expected: bool) {
        assert_eq!(matcher(&["sc"]).matches(text), expected);
    }

    #[rstest]
    #[case("Lok Sabha passes the bill", true)]
    #[case("LOK   SABHA\tadjourned", true)]
    #[case("Lok\nSabha session", true)]
    #[case("Loksabha session", false)]
    fn multi_word_phrases_match_across_whitespace(#[case] text: &str, #[case] expected: bool) {
        assert_eq!(matcher(&["lok sabha"]).matches(text), expected);
    }

    #[test]
    fn punctuated_phrases_match_literally() {
        let matcher = matcher(&["by-election", "article 370"]);
        assert!(matcher.matches("Congress wins By-Election in Karnataka"));
        assert!(matcher.matches("Debate on Article 370, again"));
        assert!(!matcher.matches("by election results"));
        assert!(!matcher.matches("article 3701 of the code"));
    }

    #[rstest]
    #[case("U.S. tariffs hit exporters", true)]
    #[case("Govt. announces relief", true)]
    #[case("Talks with the U.S.", true)]
    #[case("Trade deal with the U.S., says minister", true)]
    #[case("Bus service resumes", false)]
    #[case("Govts announce relief", false)]
    fn phrases_with_edge_punctuation_still_match(#[case] text: &str, #[case] expected: bool) {
        assert_eq!(matcher(&["u.s.", "govt."]).matches(text), expected);
    }

    #[test]
    fn no_stemming() {
        let matcher = matcher(&["law"]);
        assert!(matcher.matches("New law on data"));
        assert!(!matcher.matches("Lawmakers meet"));
        assert!(!matcher.matches("Three laws repealed"));
    }

    #[test]
    fn first_match_follows_lexicon_order() {
        let matcher = matcher(&["policy", "supreme court"]);
        let hit = matcher
            .first_match("Supreme Court hears plea on new education policy")
            .expect("a phrase matches");
        assert_eq!(hit.text, "policy");
        assert!(matcher.first_match("Local bakery wins award").is_none());
    }

    #[test]
    fn matches_and_first_match_agree() {
        let matcher = matcher(&["bjp", "congress", "ed"]);
        for text in [
            "BJP and Congress clash",
            "Shares ended higher",
            "ED raids minister's house",
            "",
        ] {
            assert_eq!(matcher.matches(text), matcher.first_match(text).is_some(), "{text}");
        }
    }
}
