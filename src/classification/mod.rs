//! Rule-based side of the headline pipeline: labels, lexicons, matching, gates.
pub mod gates;
pub mod label;
pub mod lexicon;
pub mod matcher;
pub mod normalize;

pub use gates::{Gates, NonPoliticalGate, PoliticalGate};
pub use label::{BiasLabel, LABEL_COUNT, LABEL_MAP};
pub use lexicon::{Lexicon, LexiconError, LexiconKind, LexiconSet, Phrase};
pub use matcher::KeywordMatcher;
