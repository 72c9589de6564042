use std::borrow::Cow;

use super::{serialize, Ceiling, SeenSet, DEFAULT_DELIMITER};
use crate::engine::{CompiledPattern, RegexEngine, RegexMatch, RegexOptions, Template};
use crate::error::{EngineError, FunctionError, FunctionResult};

/// A find/replace applied to group identities before they are emitted.
#[derive(Debug)]
pub struct NameTransform {
    pattern: CompiledPattern,
    replacement: Template,
}

impl NameTransform {
    pub fn new(engine: &RegexEngine, pattern: &str, replacement: &str) -> Result<Self, EngineError> {
        let pattern = engine.compile(pattern, RegexOptions::NONE)?;
        let replacement = pattern.template(replacement);
        Ok(Self {
            pattern,
            replacement,
        })
    }

    pub fn apply(&self, name: &str) -> Result<String, EngineError> {
        self.pattern.replace_all(name, &self.replacement)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GroupMatchesOptions<'a> {
    pub max_matches: Ceiling,
    /// Applies to the whole output.
    pub max_groups: Ceiling,
    pub include_duplicates: bool,
    pub name_transform: Option<&'a NameTransform>,
}

impl Default for GroupMatchesOptions<'_> {
    fn default() -> Self {
        Self {
            max_matches: Ceiling::Unlimited,
            max_groups: Ceiling::Unlimited,
            include_duplicates: true,
            name_transform: None,
        }
    }
}

/// Lists, in layout order, the identity of every group that succeeded in at least one match.
///
/// The column order comes from the first match. Group 0 is only reported for patterns without
/// explicit groups. With a name transform, duplicate suppression compares the *transformed*
/// names, so distinct groups that transform to the same text are emitted once.
pub fn group_matches<'p, 't, I>(matches: I, options: &GroupMatchesOptions<'_>) -> FunctionResult<String>
where
    I: IntoIterator<Item = Result<RegexMatch<'p, 't>, EngineError>>,
{
    let mut matches = matches.into_iter();
    let first = match matches.next() {
        Some(m) => m?,
        None => return Err(FunctionError::NoResult),
    };
    if !first.is_success() {
        return Err(FunctionError::NoResult);
    }

    let raw_names: Vec<&'p str> = first.groups().map(|g| g.name()).collect();
    let mut matched = vec![0u64; raw_names.len()];

    let mut budget = options.max_matches.budget();
    tally(&mut matched, &first);
    if budget.spend() {
        log::trace!("match ceiling reached after the first match");
    } else {
        for m in matches {
            tally(&mut matched, &m?);
            if budget.spend() {
                log::trace!("match ceiling reached");
                break;
            }
        }
    }

    let names: Vec<Cow<'p, str>> = match options.name_transform {
        Some(transform) => raw_names
            .iter()
            .map(|name| transform.apply(name).map(Cow::Owned))
            .collect::<Result<_, _>>()?,
        None => raw_names.into_iter().map(Cow::Borrowed).collect(),
    };

    let mut tokens: Vec<Cow<'_, str>> = Vec::new();
    let mut seen = SeenSet::new(options.include_duplicates);
    let mut group_budget = options.max_groups.budget();
    let start = if names.len() == 1 { 0 } else { 1 };
    for (name, &count) in names.iter().zip(&matched).skip(start) {
        if count == 0 || !seen.admits(name) {
            continue;
        }
        tokens.push(Cow::Borrowed(name.as_ref()));
        seen.insert(name.as_ref());
        if group_budget.spend() {
            break;
        }
    }

    serialize(&tokens, DEFAULT_DELIMITER)
}

fn tally(matched: &mut [u64], m: &RegexMatch<'_, '_>) {
    for group in m.groups() {
        if group.is_success() {
            if let Some(count) = matched.get_mut(group.number()) {
                *count += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run(input: &str, pattern: &str, options: &GroupMatchesOptions<'_>) -> FunctionResult<String> {
        let compiled = RegexEngine::default()
            .compile(pattern, RegexOptions::NONE)
            .unwrap();
        group_matches(compiled.matches(input), options)
    }

    #[test]
    fn lists_each_matched_group_once_in_layout_order() {
        let out = run("ab12cd34", r"(?<l>[a-z]+)(?<d>\d+)", &GroupMatchesOptions::default());
        assert_eq!(out.unwrap(), "l,d");

        let no_dups = GroupMatchesOptions {
            include_duplicates: false,
            ..GroupMatchesOptions::default()
        };
        let out = run("ab12cd34", r"(?<l>[a-z]+)(?<d>\d+)", &no_dups);
        assert_eq!(out.unwrap(), "l,d");
    }

    #[test]
    fn groups_matched_only_in_later_matches_are_reported() {
        let out = run("a 1", r"(?<word>[a-z])|(?<num>\d)", &GroupMatchesOptions::default());
        assert_eq!(out.unwrap(), "word,num");
    }

    #[test]
    fn match_ceiling_limits_the_tally() {
        let options = GroupMatchesOptions {
            max_matches: Ceiling::AtMost(1),
            ..GroupMatchesOptions::default()
        };
        let out = run("a 1", r"(?<word>[a-z])|(?<num>\d)", &options);
        assert_eq!(out.unwrap(), "word");
    }

    #[test]
    fn group_ceiling_is_global() {
        let options = GroupMatchesOptions {
            max_groups: Ceiling::AtMost(2),
            ..GroupMatchesOptions::default()
        };
        let out = run("abc", r"(a)(b)(c)", &options);
        assert_eq!(out.unwrap(), "1,2");
    }

    #[test]
    fn pattern_without_groups_reports_group_zero() {
        let out = run("42", r"\d+", &GroupMatchesOptions::default());
        assert_eq!(out.unwrap(), "0");
    }

    #[test]
    fn transformed_names_are_deduplicated_after_transforming() {
        let engine = RegexEngine::default();
        let transform = NameTransform::new(&engine, r"_\d+$", "").unwrap();
        let pattern = r"(?<tag_1>x)|(?<tag_2>y)|(?<other>z)";

        let with_dups = GroupMatchesOptions {
            name_transform: Some(&transform),
            ..GroupMatchesOptions::default()
        };
        assert_eq!(run("xyz", pattern, &with_dups).unwrap(), "tag,tag,other");

        let no_dups = GroupMatchesOptions {
            include_duplicates: false,
            ..with_dups
        };
        assert_eq!(run("xyz", pattern, &no_dups).unwrap(), "tag,other");
    }

    #[test]
    fn transform_replacement_can_reference_groups() {
        let engine = RegexEngine::default();
        let transform = NameTransform::new(&engine, r"^(\w)\w*$", "$1").unwrap();
        let options = GroupMatchesOptions {
            name_transform: Some(&transform),
            ..GroupMatchesOptions::default()
        };
        let out = run("ab12", r"(?<letters>[a-z]+)(?<digits>\d+)", &options);
        assert_eq!(out.unwrap(), "l,d");
    }

    #[test]
    fn no_match_is_no_result() {
        let out = run("abc", r"(\d)", &GroupMatchesOptions::default());
        assert!(matches!(out, Err(FunctionError::NoResult)));
    }

    #[test]
    fn failed_first_match_is_no_result() {
        let compiled = RegexEngine::default()
            .compile("(a)", RegexOptions::NONE)
            .unwrap();
        let failed = RegexMatch::from_spans(compiled.layout(), "zzz", vec![None, None]);
        let out = group_matches([Ok(failed)], &GroupMatchesOptions::default());
        assert!(matches!(out, Err(FunctionError::NoResult)));
    }
}
