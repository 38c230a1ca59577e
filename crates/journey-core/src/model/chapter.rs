use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of chapters in the journey.
pub const CHAPTER_COUNT: usize = 8;

/// Lifecycle of a single chapter.
///
/// Chapters only move forward: `locked -> unlocked -> completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChapterState {
    Locked,
    Unlocked,
    Completed,
}

impl ChapterState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Locked => "locked",
            Self::Unlocked => "unlocked",
            Self::Completed => "completed",
        }
    }

    /// Derive the state from the stored flag pair.
    ///
    /// A completed flag wins even if the unlock flag was lost, so a damaged
    /// blob never shows finished work as locked.
    #[must_use]
    pub const fn from_flags(unlocked: bool, completed: bool) -> Self {
        if completed {
            Self::Completed
        } else if unlocked {
            Self::Unlocked
        } else {
            Self::Locked
        }
    }
}

impl fmt::Display for ChapterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Journey-wide phase, derived from the stored state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JourneyPhase {
    /// Entry puzzle not yet solved.
    Entry,
    /// Access granted, at least one chapter still open.
    InProgress,
    /// Every chapter completed, no final choice yet.
    AllComplete,
    /// The final choice has been recorded.
    ChoiceMade,
}

impl JourneyPhase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Entry => "entry",
            Self::InProgress => "in_progress",
            Self::AllComplete => "all_complete",
            Self::ChoiceMade => "choice_made",
        }
    }
}

impl fmt::Display for JourneyPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns true when `index` names an existing chapter.
#[must_use]
pub const fn is_valid_index(index: usize) -> bool {
    index < CHAPTER_COUNT
}
