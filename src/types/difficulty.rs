use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Videos above this many views are easy to recognize
const EASY_ABOVE: u64 = 15_000_000;
/// Videos above this many views (and not easy) are of medium difficulty
const MEDIUM_ABOVE: u64 = 4_000_000;

/// How hard a sketch is to recognize, derived from its popularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Classify a video by its view count.
    ///
    /// - `views > 15M` is easy
    /// - `4M < views <= 15M` is medium
    /// - `views <= 4M` is hard
    pub fn from_views(views: u64) -> Self {
        if views > EASY_ABOVE {
            Difficulty::Easy
        } else if views > MEDIUM_ABOVE {
            Difficulty::Medium
        } else {
            Difficulty::Hard
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}
