use std::borrow::Cow;

use super::{serialize, Ceiling, SeenSet, DEFAULT_DELIMITER};
use crate::engine::{RegexMatch, Template};
use crate::error::{EngineError, FunctionResult};

#[derive(Debug, Clone, Copy)]
pub struct MatchValuesOptions<'a> {
    /// Emit the expansion of this template instead of the raw match.
    pub replacement: Option<&'a Template>,
    pub delimiter: &'a str,
    pub max_matches: Ceiling,
    pub include_duplicates: bool,
}

impl Default for MatchValuesOptions<'_> {
    fn default() -> Self {
        Self {
            replacement: None,
            delimiter: DEFAULT_DELIMITER,
            max_matches: Ceiling::Unlimited,
            include_duplicates: true,
        }
    }
}

/// Lists match values (or their template expansions) in match order.
///
/// Duplicate suppression is keyed by the raw match value, even when a replacement template is
/// emitted: two matches with different text but identical expansions are both kept, and two
/// matches with identical text are collapsed even if the template would have told them apart.
/// Only emitted matches count toward the match ceiling.
pub fn match_values<'p, 't, I>(matches: I, options: &MatchValuesOptions<'_>) -> FunctionResult<String>
where
    I: IntoIterator<Item = Result<RegexMatch<'p, 't>, EngineError>>,
{
    let mut tokens: Vec<Cow<'t, str>> = Vec::new();
    let mut seen = SeenSet::new(options.include_duplicates);
    let mut budget = options.max_matches.budget();

    for m in matches {
        let m = m?;
        if !m.is_success() || !seen.admits(m.value()) {
            continue;
        }
        tokens.push(match options.replacement {
            Some(template) => Cow::Owned(template.expand(&m)),
            None => Cow::Borrowed(m.value()),
        });
        seen.insert(m.value());
        if budget.spend() {
            log::trace!("match ceiling reached after {} values", tokens.len());
            break;
        }
    }

    serialize(&tokens, options.delimiter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{RegexEngine, RegexOptions};
    use crate::error::FunctionError;
    use pretty_assertions::assert_eq;

    fn run(
        input: &str,
        pattern: &str,
        replacement: Option<&str>,
        tweak: impl FnOnce(&mut MatchValuesOptions<'_>),
    ) -> FunctionResult<String> {
        let compiled = RegexEngine::default()
            .compile(pattern, RegexOptions::NONE)
            .unwrap();
        let template = replacement.map(|src| compiled.template(src));
        let mut options = MatchValuesOptions {
            replacement: template.as_ref(),
            ..MatchValuesOptions::default()
        };
        tweak(&mut options);
        match_values(compiled.matches(input), &options)
    }

    #[test]
    fn lists_every_match() {
        assert_eq!(run("a1b22c333", r"\d+", None, |_| {}).unwrap(), "1,22,333");
    }

    #[test]
    fn duplicates_can_be_excluded() {
        let out = run("aaa", "a", None, |o| o.include_duplicates = false);
        assert_eq!(out.unwrap(), "a");
    }

    #[test]
    fn custom_delimiter_and_ceiling() {
        let out = run("a1b22c333", r"\d+", None, |o| {
            o.delimiter = " | ";
            o.max_matches = Ceiling::AtMost(2);
        });
        assert_eq!(out.unwrap(), "1 | 22");
    }

    #[test]
    fn skipped_duplicates_do_not_count_toward_the_ceiling() {
        let out = run("x x y z", r"\w", None, |o| {
            o.include_duplicates = false;
            o.max_matches = Ceiling::AtMost(2);
        });
        assert_eq!(out.unwrap(), "x,y");
    }

    #[test]
    fn replacement_is_expanded_per_match() {
        let out = run("k1=v1;k2=v2", r"(\w+)=(\w+)", Some("$2:$1"), |_| {});
        assert_eq!(out.unwrap(), "v1:k1,v2:k2");
    }

    #[test]
    fn dedup_key_is_the_raw_match_not_the_replacement() {
        // Different raw values with the same expansion are both emitted.
        let out = run("a1 b1", r"\w(\d)", Some("$1"), |o| o.include_duplicates = false);
        assert_eq!(out.unwrap(), "1,1");

        // Identical raw values collapse even though the expansion includes their position.
        let out = run("ab ab", "ab", Some("[$`]"), |o| o.include_duplicates = false);
        assert_eq!(out.unwrap(), "[]");
    }

    #[test]
    fn no_match_is_no_result() {
        let out = run("abc", r"\d", None, |_| {});
        assert!(matches!(out, Err(FunctionError::NoResult)));
    }
}
