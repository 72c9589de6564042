//! Capture-group aggregation shared by the list-producing regex functions.
//!
//! The aggregators consume any iterator of matches so they never force more of the producer
//! than the match ceiling requires.

use std::borrow::Cow;

use ahash::AHashSet;

use crate::error::{FunctionError, FunctionResult};

mod group_matches;
mod match_groups;
mod match_values;

pub use group_matches::{group_matches, GroupMatchesOptions, NameTransform};
pub use match_groups::{match_groups, MatchGroupsOptions};
pub use match_values::{match_values, MatchValuesOptions};

/// Delimiter used by the group listings, which do not take one as an argument.
pub const DEFAULT_DELIMITER: &str = ",";

/// Inclusive upper bound on processed/emitted items. Counts of zero or below mean unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ceiling {
    #[default]
    Unlimited,
    AtMost(u64),
}

impl Ceiling {
    pub fn from_count(count: i64) -> Self {
        if count > 0 {
            Ceiling::AtMost(count as u64)
        } else {
            Ceiling::Unlimited
        }
    }

    pub(crate) fn budget(self) -> Budget {
        Budget {
            remaining: match self {
                Ceiling::Unlimited => None,
                Ceiling::AtMost(n) => Some(n),
            },
        }
    }
}

/// Countdown for a [`Ceiling`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct Budget {
    remaining: Option<u64>,
}

impl Budget {
    /// Uses up one unit; returns `true` once the budget is exhausted.
    pub(crate) fn spend(&mut self) -> bool {
        match &mut self.remaining {
            None => false,
            Some(n) => {
                *n = n.saturating_sub(1);
                *n == 0
            }
        }
    }
}

/// Identities already emitted during one call. Only allocates when duplicates are excluded.
#[derive(Debug, Default)]
pub(crate) struct SeenSet<'a> {
    seen: Option<AHashSet<&'a str>>,
}

impl<'a> SeenSet<'a> {
    pub(crate) fn new(include_duplicates: bool) -> Self {
        Self {
            seen: (!include_duplicates).then(AHashSet::new),
        }
    }

    /// Whether `key` may be emitted.
    pub(crate) fn admits(&self, key: &str) -> bool {
        match &self.seen {
            None => true,
            Some(seen) => !seen.contains(key),
        }
    }

    pub(crate) fn insert(&mut self, key: &'a str) {
        if let Some(seen) = &mut self.seen {
            seen.insert(key);
        }
    }
}

/// Joins the output tokens; an empty token list means there is nothing to return.
pub fn serialize(tokens: &[Cow<'_, str>], delimiter: &str) -> FunctionResult<String> {
    if tokens.is_empty() {
        return Err(FunctionError::NoResult);
    }
    let mut out = String::new();
    for (i, token) in tokens.iter().enumerate() {
        if i > 0 {
            out.push_str(delimiter);
        }
        out.push_str(token);
    }
    Ok(out)
}
