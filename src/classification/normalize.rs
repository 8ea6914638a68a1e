//! Text normalization shared by the keyword gates and the linear baseline.
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static URL_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"http\S+").expect("url pattern"));
static NON_ALNUM_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9\s]").expect("non-alphanumeric pattern"));

/// NFC, lowercase, and single spaces between words.
///
/// Applied to both headlines and lexicon phrases so that a multi-word phrase
/// matches regardless of how the surrounding whitespace was typed.
#[must_use]
pub fn normalize_for_matching(input: &str) -> String {
    let lowered = input.nfc().collect::<String>().to_lowercase();
    lowered.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Reproduces the cleaning applied to the `clean_headline` column of the
/// training data: lowercase ASCII alphanumerics only, URLs removed.
#[must_use]
pub fn clean_headline(input: &str) -> String {
    let lowered = input.trim().replace(['\n', '\r'], " ").to_lowercase();
    let without_urls = URL_PATTERN.replace_all(&lowered, " ");
    let alnum = NON_ALNUM_PATTERN.replace_all(&without_urls, " ");
    alnum.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("  Lok   Sabha\tpasses\nbill ", "lok sabha passes bill")]
    #[case("SUPREME COURT", "supreme court")]
    #[case("", "")]
    fn normalize_collapses_whitespace_and_case(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_for_matching(input), expected);
    }

    #[rstest]
    #[case(
        "Modi's speech: read more at https://example.com/a?b=1 today!",
        "modi s speech read more at today"
    )]
    #[case("Rs 2,000 crore\r\npackage", "rs 2 000 crore package")]
    #[case("   ", "")]
    fn clean_headline_matches_training_cleaning(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(clean_headline(input), expected);
    }
}
