//! Navigation guard.
//!
//! Pages ask [`ProgressStore::guard`] before showing themselves. A refused
//! route carries the place to go instead, so a deep link into a locked
//! chapter lands on the hub rather than an error.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::chapter::is_valid_index;
use crate::storage::Storage;
use crate::store::ProgressStore;

/// A navigable place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "route", content = "chapter", rename_all = "snake_case")]
pub enum Route {
    /// The entry puzzle. Always reachable.
    Entry,
    /// Chapter overview.
    Hub,
    /// Chapter by zero-based index.
    Chapter(usize),
    /// The final choice page.
    FinalChoice,
    /// Content shown after the final choice.
    Response,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entry => f.write_str("entry"),
            Self::Hub => f.write_str("hub"),
            Self::Chapter(index) => write!(f, "chapter:{}", index + 1),
            Self::FinalChoice => f.write_str("final"),
            Self::Response => f.write_str("response"),
        }
    }
}

/// A route name that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown route '{0}' (expected entry, hub, chapter:N, final or response)")]
pub struct ParseRouteError(String);

impl FromStr for Route {
    type Err = ParseRouteError;

    /// Parses `entry`, `hub`, `final`, `response` or `chapter:N` with `N`
    /// counted from 1.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim().to_ascii_lowercase();
        match raw.as_str() {
            "entry" => return Ok(Self::Entry),
            "hub" => return Ok(Self::Hub),
            "final" | "final-choice" | "final_choice" => return Ok(Self::FinalChoice),
            "response" => return Ok(Self::Response),
            _ => {}
        }

        raw.strip_prefix("chapter:")
            .or_else(|| raw.strip_prefix("chapter"))
            .and_then(|n| n.parse::<usize>().ok())
            .and_then(|n| n.checked_sub(1))
            .filter(|&index| is_valid_index(index))
            .map(Self::Chapter)
            .ok_or_else(|| ParseRouteError(s.to_string()))
    }
}

/// Result of a guard check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "access", content = "to", rename_all = "snake_case")]
pub enum Access {
    Allow,
    Redirect(Route),
}

impl Access {
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }
}

impl<S: Storage> ProgressStore<S> {
    /// Decide whether `route` may be shown now.
    ///
    /// Without access only the entry is reachable. Chapters need their
    /// unlock flag and an open calendar date. The final choice needs every
    /// chapter done; the response needs the choice made.
    #[must_use]
    pub fn guard(&self, route: Route) -> Access {
        if route == Route::Entry {
            return Access::Allow;
        }
        if !self.access_granted() {
            return Access::Redirect(Route::Entry);
        }

        match route {
            Route::Entry | Route::Hub => Access::Allow,
            Route::Chapter(index) => {
                let open = is_valid_index(index)
                    && self.chapters_unlocked()[index]
                    && !self.is_time_locked(index);
                if open {
                    Access::Allow
                } else {
                    Access::Redirect(Route::Hub)
                }
            }
            Route::FinalChoice => {
                if self.all_completed() {
                    Access::Allow
                } else {
                    Access::Redirect(Route::Hub)
                }
            }
            Route::Response => {
                if self.final_choice_made() {
                    Access::Allow
                } else if self.all_completed() {
                    Access::Redirect(Route::FinalChoice)
                } else {
                    Access::Redirect(Route::Hub)
                }
            }
        }
    }
}
