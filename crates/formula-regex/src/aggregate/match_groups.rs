use std::borrow::Cow;

use super::{serialize, Ceiling, SeenSet, DEFAULT_DELIMITER};
use crate::engine::RegexMatch;
use crate::error::{EngineError, FunctionError, FunctionResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchGroupsOptions {
    pub max_matches: Ceiling,
    /// Applies to each match separately.
    pub max_groups: Ceiling,
    pub include_duplicates: bool,
}

impl Default for MatchGroupsOptions {
    fn default() -> Self {
        Self {
            max_matches: Ceiling::Unlimited,
            max_groups: Ceiling::Unlimited,
            include_duplicates: true,
        }
    }
}

/// Lists the identities of the successful groups of every match, in match order.
///
/// Within a match, identities follow layout order (unnamed groups, then named groups). A
/// pattern without explicit groups reports `0` once per match; that token is not subject to
/// duplicate suppression.
pub fn match_groups<'p, 't, I>(matches: I, options: &MatchGroupsOptions) -> FunctionResult<String>
where
    I: IntoIterator<Item = Result<RegexMatch<'p, 't>, EngineError>>,
{
    let mut tokens: Vec<Cow<'p, str>> = Vec::new();
    let mut seen = SeenSet::new(options.include_duplicates);
    let mut match_budget = options.max_matches.budget();
    let mut first = true;

    for m in matches {
        let m = m?;
        if first {
            if !m.is_success() {
                return Err(FunctionError::NoResult);
            }
            first = false;
        }

        if m.is_success() {
            if m.group_count() == 1 {
                tokens.push(Cow::Borrowed("0"));
            } else {
                let mut group_budget = options.max_groups.budget();
                for group in m.groups().skip(1) {
                    if !group.is_success() || !seen.admits(group.name()) {
                        continue;
                    }
                    tokens.push(Cow::Borrowed(group.name()));
                    seen.insert(group.name());
                    if group_budget.spend() {
                        break;
                    }
                }
            }
        }

        if match_budget.spend() {
            log::trace!("match ceiling reached after {} tokens", tokens.len());
            break;
        }
    }

    if first {
        return Err(FunctionError::NoResult);
    }
    serialize(&tokens, DEFAULT_DELIMITER)
}
