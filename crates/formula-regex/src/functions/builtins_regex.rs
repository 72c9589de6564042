//! The regex worksheet functions.
//!
//! Each function has a typed Rust entry point (`regex_*`) plus an `inventory` registration whose
//! implementation coerces worksheet arguments and folds the result back into a [`Value`].

use crate::aggregate::{
    group_matches, match_groups, match_values, Ceiling, GroupMatchesOptions, MatchGroupsOptions,
    MatchValuesOptions, NameTransform, DEFAULT_DELIMITER,
};
use crate::coercion::{
    optional_text, required_text, to_delimiter, to_include_duplicates, to_int_flag, to_max_groups,
};
use crate::engine::{escape, CompiledPattern, RegexEngine, RegexOptions};
use crate::error::{FunctionError, FunctionResult};
use crate::functions::{arg, ArgSpec, FunctionContext, FunctionSpec, ThreadSafety, ValueType};
use crate::value::Value;

const INPUT: ArgSpec = ArgSpec {
    name: "input",
    description: "Text to search",
    value_type: ValueType::Text,
    optional: false,
};
const PATTERN: ArgSpec = ArgSpec {
    name: "pattern",
    description: "Regular expression",
    value_type: ValueType::Text,
    optional: false,
};
const OPTIONS: ArgSpec = ArgSpec {
    name: "options",
    description: "Bitmask of regex options",
    value_type: ValueType::Number,
    optional: true,
};
const MAX_MATCHES: ArgSpec = ArgSpec {
    name: "MaxMatches",
    description: "Maximum number of matches to process; 0 means unlimited",
    value_type: ValueType::Number,
    optional: true,
};
const MAX_GROUPS: ArgSpec = ArgSpec {
    name: "MaxGroups",
    description: "Maximum number of groups to report; 0 means unlimited",
    value_type: ValueType::Any,
    optional: true,
};
const INCLUDE_DUPLICATES: ArgSpec = ArgSpec {
    name: "IncludeDuplicates",
    description: "Whether repeated entries are reported (default TRUE)",
    value_type: ValueType::Any,
    optional: true,
};

/// Settings for [`regex_matches`].
#[derive(Debug, Clone, Copy)]
pub struct MatchListing<'a> {
    /// Template expanded per match; `None` or empty lists the raw matches.
    pub replacement: Option<&'a str>,
    pub delimiter: &'a str,
    pub max_matches: Ceiling,
    pub include_duplicates: bool,
}

impl Default for MatchListing<'_> {
    fn default() -> Self {
        Self {
            replacement: None,
            delimiter: DEFAULT_DELIMITER,
            max_matches: Ceiling::Unlimited,
            include_duplicates: true,
        }
    }
}

/// Settings for [`regex_group_matches`].
#[derive(Debug, Clone, Copy)]
pub struct GroupListing<'a> {
    pub max_matches: Ceiling,
    pub max_groups: Ceiling,
    pub include_duplicates: bool,
    /// Find/replace applied to group names; `None` or an empty pattern disables it.
    pub transform_pattern: Option<&'a str>,
    pub transform_replacement: Option<&'a str>,
}

impl Default for GroupListing<'_> {
    fn default() -> Self {
        Self {
            max_matches: Ceiling::Unlimited,
            max_groups: Ceiling::Unlimited,
            include_duplicates: true,
            transform_pattern: None,
            transform_replacement: None,
        }
    }
}

fn compile(
    engine: &RegexEngine,
    input: &str,
    pattern: &str,
    options: RegexOptions,
) -> FunctionResult<CompiledPattern> {
    if input.is_empty() {
        return Err(FunctionError::InvalidArgument("input"));
    }
    if pattern.is_empty() {
        return Err(FunctionError::InvalidArgument("pattern"));
    }
    Ok(engine.compile(pattern, options)?)
}

fn non_empty(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.is_empty())
}

pub fn regex_version_number() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// First match of `pattern`, or its expansion of `replacement` when one is given.
pub fn regex_match(
    engine: &RegexEngine,
    input: &str,
    pattern: &str,
    options: RegexOptions,
    replacement: Option<&str>,
) -> FunctionResult<String> {
    let compiled = compile(engine, input, pattern, options)?;
    let m = match compiled.first_match(input)? {
        Some(m) if m.is_success() => m,
        _ => return Err(FunctionError::NoResult),
    };
    Ok(match non_empty(replacement) {
        Some(src) => compiled.template(src).expand(&m),
        None => m.value().to_string(),
    })
}

/// Substitutes every match. An empty `replacement` deletes the matches; text without a match is
/// returned unchanged.
pub fn regex_replace(
    engine: &RegexEngine,
    input: &str,
    pattern: &str,
    options: RegexOptions,
    replacement: &str,
) -> FunctionResult<String> {
    let compiled = compile(engine, input, pattern, options)?;
    let template = compiled.template(replacement);
    Ok(compiled.replace_all(input, &template)?)
}

pub fn regex_escape(input: &str) -> FunctionResult<String> {
    if input.is_empty() {
        return Err(FunctionError::InvalidArgument("input"));
    }
    Ok(escape(input))
}

pub fn is_regex_match(
    engine: &RegexEngine,
    input: &str,
    pattern: &str,
    options: RegexOptions,
) -> FunctionResult<bool> {
    let compiled = compile(engine, input, pattern, options)?;
    Ok(compiled.is_match(input)?)
}

pub fn regex_match_groups(
    engine: &RegexEngine,
    input: &str,
    pattern: &str,
    options: RegexOptions,
    listing: &MatchGroupsOptions,
) -> FunctionResult<String> {
    let compiled = compile(engine, input, pattern, options)?;
    match_groups(compiled.matches(input), listing)
}

pub fn regex_matches(
    engine: &RegexEngine,
    input: &str,
    pattern: &str,
    options: RegexOptions,
    listing: &MatchListing<'_>,
) -> FunctionResult<String> {
    let compiled = compile(engine, input, pattern, options)?;
    let template = non_empty(listing.replacement).map(|src| compiled.template(src));
    let options = MatchValuesOptions {
        replacement: template.as_ref(),
        delimiter: listing.delimiter,
        max_matches: listing.max_matches,
        include_duplicates: listing.include_duplicates,
    };
    match_values(compiled.matches(input), &options)
}

pub fn regex_group_matches(
    engine: &RegexEngine,
    input: &str,
    pattern: &str,
    options: RegexOptions,
    listing: &GroupListing<'_>,
) -> FunctionResult<String> {
    let compiled = compile(engine, input, pattern, options)?;
    let transform = match non_empty(listing.transform_pattern) {
        Some(find) => Some(NameTransform::new(
            engine,
            find,
            listing.transform_replacement.unwrap_or(""),
        )?),
        None => None,
    };
    let options = GroupMatchesOptions {
        max_matches: listing.max_matches,
        max_groups: listing.max_groups,
        include_duplicates: listing.include_duplicates,
        name_transform: transform.as_ref(),
    };
    group_matches(compiled.matches(input), &options)
}

fn into_value(result: FunctionResult<Value>) -> Value {
    match result {
        Ok(value) => value,
        Err(err) => {
            log::debug!("regex function failed: {err}");
            Value::Error(err.kind())
        }
    }
}

/// Coerces the leading `input, pattern[, options]` triple shared by most functions.
fn subject(args: &[Value]) -> FunctionResult<(String, String, RegexOptions)> {
    let input = required_text(arg(args, 0))?;
    let pattern = required_text(arg(args, 1))?;
    let options = RegexOptions::from_bits(to_int_flag(arg(args, 2))?)?;
    Ok((input, pattern, options))
}

inventory::submit! {
    FunctionSpec {
        name: "REGEXVERSIONNUMBER",
        description: "Version of the regex function library",
        args: &[],
        min_args: 0,
        max_args: 0,
        thread_safety: ThreadSafety::ThreadSafe,
        return_type: ValueType::Text,
        implementation: regex_version_number_fn,
    }
}

fn regex_version_number_fn(_ctx: &dyn FunctionContext, _args: &[Value]) -> Value {
    Value::from(regex_version_number())
}

inventory::submit! {
    FunctionSpec {
        name: "REGEXMATCH",
        description: "First match of a pattern, optionally rewritten with a replacement template",
        args: &[
            INPUT,
            PATTERN,
            OPTIONS,
            ArgSpec {
                name: "replacement",
                description: "Template applied to the match",
                value_type: ValueType::Text,
                optional: true,
            },
        ],
        min_args: 2,
        max_args: 4,
        thread_safety: ThreadSafety::ThreadSafe,
        return_type: ValueType::Text,
        implementation: regex_match_fn,
    }
}

fn regex_match_fn(ctx: &dyn FunctionContext, args: &[Value]) -> Value {
    into_value((|| -> FunctionResult<Value> {
        let (input, pattern, options) = subject(args)?;
        let replacement = optional_text(arg(args, 3))?;
        regex_match(ctx.engine(), &input, &pattern, options, replacement.as_deref()).map(Value::Text)
    })())
}

inventory::submit! {
    FunctionSpec {
        name: "REGEXREPLACE",
        description: "Replaces every match of a pattern",
        args: &[
            INPUT,
            PATTERN,
            OPTIONS,
            ArgSpec {
                name: "replacement",
                description: "Replacement template (required); empty text deletes the matches",
                value_type: ValueType::Text,
                optional: true,
            },
        ],
        min_args: 2,
        max_args: 4,
        thread_safety: ThreadSafety::ThreadSafe,
        return_type: ValueType::Text,
        implementation: regex_replace_fn,
    }
}

fn regex_replace_fn(ctx: &dyn FunctionContext, args: &[Value]) -> Value {
    into_value((|| -> FunctionResult<Value> {
        let (input, pattern, options) = subject(args)?;
        let replacement =
            optional_text(arg(args, 3))?.ok_or(FunctionError::InvalidArgument("replacement"))?;
        regex_replace(ctx.engine(), &input, &pattern, options, &replacement).map(Value::Text)
    })())
}

inventory::submit! {
    FunctionSpec {
        name: "REGEXESCAPE",
        description: "Escapes pattern metacharacters",
        args: &[INPUT],
        min_args: 1,
        max_args: 1,
        thread_safety: ThreadSafety::ThreadSafe,
        return_type: ValueType::Text,
        implementation: regex_escape_fn,
    }
}

fn regex_escape_fn(_ctx: &dyn FunctionContext, args: &[Value]) -> Value {
    into_value((|| -> FunctionResult<Value> {
        let input = required_text(arg(args, 0))?;
        regex_escape(&input).map(Value::Text)
    })())
}

inventory::submit! {
    FunctionSpec {
        name: "ISREGEXMATCH",
        description: "Whether a pattern matches anywhere in the input",
        args: &[INPUT, PATTERN, OPTIONS],
        min_args: 2,
        max_args: 3,
        thread_safety: ThreadSafety::ThreadSafe,
        return_type: ValueType::Bool,
        implementation: is_regex_match_fn,
    }
}

fn is_regex_match_fn(ctx: &dyn FunctionContext, args: &[Value]) -> Value {
    into_value((|| -> FunctionResult<Value> {
        let (input, pattern, options) = subject(args)?;
        is_regex_match(ctx.engine(), &input, &pattern, options).map(Value::Bool)
    })())
}

inventory::submit! {
    FunctionSpec {
        name: "REGEXMATCHGROUPS",
        description: "Names of the successful groups of every match, in match order",
        args: &[
            INPUT,
            PATTERN,
            OPTIONS,
            MAX_MATCHES,
            ArgSpec {
                description: "Maximum number of groups reported per match; 0 means unlimited",
                ..MAX_GROUPS
            },
            INCLUDE_DUPLICATES,
        ],
        min_args: 2,
        max_args: 6,
        thread_safety: ThreadSafety::ThreadSafe,
        return_type: ValueType::Text,
        implementation: regex_match_groups_fn,
    }
}

fn regex_match_groups_fn(ctx: &dyn FunctionContext, args: &[Value]) -> Value {
    into_value((|| -> FunctionResult<Value> {
        let (input, pattern, options) = subject(args)?;
        let listing = MatchGroupsOptions {
            max_matches: Ceiling::from_count(to_int_flag(arg(args, 3))?),
            max_groups: Ceiling::from_count(to_max_groups(arg(args, 4))?),
            include_duplicates: to_include_duplicates(arg(args, 5))?,
        };
        regex_match_groups(ctx.engine(), &input, &pattern, options, &listing).map(Value::Text)
    })())
}

inventory::submit! {
    FunctionSpec {
        name: "REGEXMATCHES",
        description: "Every match of a pattern joined by a delimiter",
        args: &[
            INPUT,
            PATTERN,
            OPTIONS,
            ArgSpec {
                name: "replacement",
                description: "Template applied to each match",
                value_type: ValueType::Text,
                optional: true,
            },
            ArgSpec {
                name: "delimiter",
                description: "Separator between matches (default \",\")",
                value_type: ValueType::Text,
                optional: true,
            },
            MAX_MATCHES,
            INCLUDE_DUPLICATES,
        ],
        min_args: 2,
        max_args: 7,
        thread_safety: ThreadSafety::ThreadSafe,
        return_type: ValueType::Text,
        implementation: regex_matches_fn,
    }
}

fn regex_matches_fn(ctx: &dyn FunctionContext, args: &[Value]) -> Value {
    into_value((|| -> FunctionResult<Value> {
        let (input, pattern, options) = subject(args)?;
        let replacement = optional_text(arg(args, 3))?;
        let delimiter = to_delimiter(arg(args, 4))?;
        let listing = MatchListing {
            replacement: replacement.as_deref(),
            delimiter: &delimiter,
            max_matches: Ceiling::from_count(to_int_flag(arg(args, 5))?),
            include_duplicates: to_include_duplicates(arg(args, 6))?,
        };
        regex_matches(ctx.engine(), &input, &pattern, options, &listing).map(Value::Text)
    })())
}

inventory::submit! {
    FunctionSpec {
        name: "REGEXGROUPMATCHES",
        description: "Names of the groups that matched at least once, in group order",
        args: &[
            INPUT,
            PATTERN,
            OPTIONS,
            MAX_MATCHES,
            MAX_GROUPS,
            INCLUDE_DUPLICATES,
            ArgSpec {
                name: "GroupNamesTransformPattern",
                description: "Pattern applied to each group name before it is reported",
                value_type: ValueType::Text,
                optional: true,
            },
            ArgSpec {
                name: "GroupNamesTransformReplacement",
                description: "Replacement for GroupNamesTransformPattern",
                value_type: ValueType::Text,
                optional: true,
            },
        ],
        min_args: 2,
        max_args: 8,
        thread_safety: ThreadSafety::ThreadSafe,
        return_type: ValueType::Text,
        implementation: regex_group_matches_fn,
    }
}

fn regex_group_matches_fn(ctx: &dyn FunctionContext, args: &[Value]) -> Value {
    into_value((|| -> FunctionResult<Value> {
        let (input, pattern, options) = subject(args)?;
        let max_matches = Ceiling::from_count(to_int_flag(arg(args, 3))?);
        let max_groups = Ceiling::from_count(to_max_groups(arg(args, 4))?);
        let include_duplicates = to_include_duplicates(arg(args, 5))?;
        let transform_pattern = optional_text(arg(args, 6))?;
        let transform_replacement = optional_text(arg(args, 7))?;
        let listing = GroupListing {
            max_matches,
            max_groups,
            include_duplicates,
            transform_pattern: transform_pattern.as_deref(),
            transform_replacement: transform_replacement.as_deref(),
        };
        regex_group_matches(ctx.engine(), &input, &pattern, options, &listing).map(Value::Text)
    })())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn engine() -> RegexEngine {
        RegexEngine::default()
    }

    #[test]
    fn version_is_the_crate_version() {
        assert_eq!(regex_version_number(), "1.3.1");
    }

    #[test]
    fn match_returns_first_match_or_expansion() {
        let e = engine();
        assert_eq!(regex_match(&e, "a1b2", r"\d", RegexOptions::NONE, None).unwrap(), "1");
        assert_eq!(
            regex_match(&e, "k=v", r"(\w)=(\w)", RegexOptions::NONE, Some("$2$1")).unwrap(),
            "vk"
        );
        // An empty template falls back to the raw match.
        assert_eq!(regex_match(&e, "a1b2", r"\d", RegexOptions::NONE, Some("")).unwrap(), "1");
        assert!(matches!(
            regex_match(&e, "abc", r"\d", RegexOptions::NONE, None),
            Err(FunctionError::NoResult)
        ));
    }

    #[test]
    fn replace_with_empty_template_deletes_matches() {
        let e = engine();
        assert_eq!(regex_replace(&e, "a1b2", r"\d", RegexOptions::NONE, "").unwrap(), "ab");
        assert_eq!(regex_replace(&e, "abc", r"\d", RegexOptions::NONE, "#").unwrap(), "abc");
    }

    #[test]
    fn empty_required_text_is_invalid() {
        let e = engine();
        assert!(matches!(
            is_regex_match(&e, "", "a", RegexOptions::NONE),
            Err(FunctionError::InvalidArgument("input"))
        ));
        assert!(matches!(
            is_regex_match(&e, "a", "", RegexOptions::NONE),
            Err(FunctionError::InvalidArgument("pattern"))
        ));
        assert!(matches!(regex_escape(""), Err(FunctionError::InvalidArgument("input"))));
    }

    #[test]
    fn empty_transform_pattern_means_no_transform() {
        let e = engine();
        let listing = GroupListing {
            transform_pattern: Some(""),
            transform_replacement: Some("zzz"),
            ..GroupListing::default()
        };
        let out = regex_group_matches(&e, "ab12", r"(?<l>[a-z]+)(?<d>\d+)", RegexOptions::NONE, &listing);
        assert_eq!(out.unwrap(), "l,d");
    }

    #[test]
    fn invalid_transform_pattern_is_an_engine_error() {
        let e = engine();
        let listing = GroupListing {
            transform_pattern: Some("("),
            ..GroupListing::default()
        };
        let out = regex_group_matches(&e, "ab12", r"(?<l>[a-z]+)", RegexOptions::NONE, &listing);
        assert!(matches!(out, Err(FunctionError::Engine(_))));
    }
}
