//! The two rule-based gates evaluated before the model.
use super::lexicon::{LexiconError, LexiconKind, LexiconSet, Phrase};
use super::matcher::KeywordMatcher;

/// First gate. A hit means the headline is about a non-political topic
/// (weather, sports, entertainment, ...) and is Neutral no matter what else it mentions.
#[derive(Debug, Clone)]
pub struct NonPoliticalGate {
    matcher: KeywordMatcher,
}

impl NonPoliticalGate {
    /// # Errors
    /// Returns an error if `matcher` was built from the political lexicon.
    pub fn new(matcher: KeywordMatcher) -> Result<Self, LexiconError> {
        if matcher.kind() != LexiconKind::NonPolitical {
            return Err(LexiconError::WrongKind(LexiconKind::NonPolitical.as_str()));
        }
        Ok(Self { matcher })
    }

    #[must_use]
    pub fn classify_nonpolitical(&self, headline: &str) -> bool {
        self.matcher.matches(headline)
    }

    /// The phrase that tripped the gate, if any.
    #[must_use]
    pub fn hit(&self, headline: &str) -> Option<&Phrase> {
        self.matcher.first_match(headline)
    }
}

/// Second gate. Without any political vocabulary there is nothing for the model
/// to judge, so the headline is Neutral ("political but unbiased").
#[derive(Debug, Clone)]
pub struct PoliticalGate {
    matcher: KeywordMatcher,
}

impl PoliticalGate {
    /// # Errors
    /// Returns an error if `matcher` was built from the non-political lexicon.
    pub fn new(matcher: KeywordMatcher) -> Result<Self, LexiconError> {
        if matcher.kind() != LexiconKind::Political {
            return Err(LexiconError::WrongKind(LexiconKind::Political.as_str()));
        }
        Ok(Self { matcher })
    }

    #[must_use]
    pub fn classify_political(&self, headline: &str) -> bool {
        self.matcher.matches(headline)
    }

    #[must_use]
    pub fn hit(&self, headline: &str) -> Option<&Phrase> {
        self.matcher.first_match(headline)
    }
}

/// Both gates compiled from one [`LexiconSet`].
#[derive(Debug, Clone)]
pub struct Gates {
    pub non_political: NonPoliticalGate,
    pub political: PoliticalGate,
}

impl Gates {
    /// # Errors
    /// Returns [`LexiconError::Compile`] if either lexicon fails to compile.
    pub fn compile(lexicons: &LexiconSet) -> Result<Self, LexiconError> {
        Ok(Self {
            non_political: NonPoliticalGate::new(KeywordMatcher::new(lexicons.non_political())?)?,
            political: PoliticalGate::new(KeywordMatcher::new(lexicons.political())?)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn gates() -> Gates {
        Gates::compile(&LexiconSet::embedded().expect("embedded lexicon")).expect("gates compile")
    }

    #[rstest]
    #[case("Weather forecast predicts heavy rainfall in Mumbai this week", true)]
    #[case("Cricket team meets the prime minister", true)]
    #[case("Web Series on Partition tops OTT charts", true)]
    #[case("Supreme Court hears plea on new education policy", false)]
    #[case("Local bakery wins award for best bread in the city", false)]
    fn non_political_gate(#[case] headline: &str, #[case] expected: bool) {
        assert_eq!(gates().non_political.classify_nonpolitical(headline), expected);
    }

    #[rstest]
    #[case("Supreme Court hears plea on new education policy", true)]
    #[case("BJP and Congress clash over farm laws in Parliament", true)]
    #[case("ED summons former minister in land case", true)]
    #[case("Local bakery wins award for best bread in the city", false)]
    #[case("Shares ended higher on Friday", false)]
    fn political_gate(#[case] headline: &str, #[case] expected: bool) {
        assert_eq!(gates().political.classify_political(headline), expected);
    }

    #[test]
    fn hit_reports_phrase_and_topic() {
        let gates = gates();
        let hit = gates
            .non_political
            .hit("IPL auction sees record bids")
            .expect("sports phrase");
        assert_eq!(hit.text, "ipl");
        assert_eq!(hit.topic, "sports");
    }

    #[test]
    fn gates_reject_the_wrong_lexicon() {
        let lexicons = LexiconSet::embedded().expect("embedded lexicon");
        let political = KeywordMatcher::new(lexicons.political()).expect("matcher");
        assert!(NonPoliticalGate::new(political.clone()).is_err());
        assert!(PoliticalGate::new(political).is_ok());
    }
}
