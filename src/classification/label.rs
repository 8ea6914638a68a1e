//! Bias labels and the index mapping shared by training artifacts and inference.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Number of output classes every bias model must produce.
pub const LABEL_COUNT: usize = 3;

/// Class index → label. Index 0 is always Left, 1 Neutral, 2 Right.
///
/// Every backend validates its artifact against this table on load, and the
/// evaluation tooling maps dataset categories through it, so there is exactly one
/// place where the ordering lives.
pub const LABEL_MAP: [BiasLabel; LABEL_COUNT] =
    [BiasLabel::Left, BiasLabel::Neutral, BiasLabel::Right];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BiasLabel {
    Left,
    Neutral,
    Right,
}

impl BiasLabel {
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        LABEL_MAP.get(index).copied()
    }

    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::Left => 0,
            Self::Neutral => 1,
            Self::Right => 2,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "Left",
            Self::Neutral => "Neutral",
            Self::Right => "Right",
        }
    }

    /// Collapses the five-way source taxonomy of the training data into three classes.
    ///
    /// Returns `None` for categories outside `Left`, `Left-Center`, `Center`,
    /// `Center-Right`, `Right`.
    #[must_use]
    pub fn from_category(category: &str) -> Option<Self> {
        match category.trim() {
            "Left" | "Left-Center" => Some(Self::Left),
            "Center" => Some(Self::Neutral),
            "Center-Right" | "Right" => Some(Self::Right),
            _ => None,
        }
    }
}

impl fmt::Display for BiasLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown bias label: {0}")]
pub struct UnknownLabel(pub String);

impl FromStr for BiasLabel {
    type Err = UnknownLabel;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_lowercase().as_str() {
            "left" => Ok(Self::Left),
            "neutral" => Ok(Self::Neutral),
            "right" => Ok(Self::Right),
            _ => Err(UnknownLabel(raw.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn index_round_trips_through_label_map() {
        for (index, label) in LABEL_MAP.iter().enumerate() {
            assert_eq!(label.index(), index);
            assert_eq!(BiasLabel::from_index(index), Some(*label));
        }
        assert_eq!(BiasLabel::from_index(LABEL_COUNT), None);
    }

    #[rstest]
    #[case("Left", Some(BiasLabel::Left))]
    #[case("Left-Center", Some(BiasLabel::Left))]
    #[case("Center", Some(BiasLabel::Neutral))]
    #[case(" Center-Right ", Some(BiasLabel::Right))]
    #[case("Right", Some(BiasLabel::Right))]
    #[case("Satire", None)]
    fn categories_collapse_to_three_classes(
        #[case] category: &str,
        #[case] expected: Option<BiasLabel>,
    ) {
        assert_eq!(BiasLabel::from_category(category), expected);
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("NEUTRAL".parse::<BiasLabel>().unwrap(), BiasLabel::Neutral);
        assert!("centre".parse::<BiasLabel>().is_err());
    }
}
