//! The match producer: compiles worksheet patterns and yields matches lazily.
//!
//! Capture groups are exposed in *layout order*, which is not declaration order: group 0 (the
//! whole match) comes first, then every unnamed group in declaration order, then every named
//! group in declaration order. A group's position in that order is its group number, so in
//! `(?<n>a)(b)` the unnamed `(b)` is group 1 and `n` is group 2.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

mod options;
mod template;
mod translate;

pub use options::RegexOptions;
pub use template::Template;

/// Tunables forwarded to `fancy-regex` when compiling patterns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Maximum number of backtracking steps before a match attempt fails.
    pub backtrack_limit: usize,
    pub delegate_size_limit: Option<usize>,
    pub delegate_dfa_size_limit: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            backtrack_limit: 1_000_000,
            delegate_size_limit: None,
            delegate_dfa_size_limit: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegexEngine {
    config: EngineConfig,
}

impl RegexEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn compile(&self, pattern: &str, options: RegexOptions) -> Result<CompiledPattern, EngineError> {
        let translated = translate::translate(pattern, options);

        let mut builder = fancy_regex::RegexBuilder::new(&translated);
        builder.backtrack_limit(self.config.backtrack_limit);
        if let Some(limit) = self.config.delegate_size_limit {
            builder.delegate_size_limit(limit);
        }
        if let Some(limit) = self.config.delegate_dfa_size_limit {
            builder.delegate_dfa_size_limit(limit);
        }

        let regex = match builder.build() {
            Ok(regex) => regex,
            Err(err) => {
                log::warn!("rejected pattern {pattern:?} ({options:?}): {err}");
                return Err(EngineError::Syntax(err));
            }
        };
        log::debug!("compiled pattern {pattern:?} ({options:?}) as {translated:?}");

        let layout = GroupLayout::from_capture_names(regex.capture_names());
        Ok(CompiledPattern {
            regex,
            layout,
            options,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct GroupSlot {
    /// Capture index inside the compiled regex.
    index: usize,
    name: String,
}

/// Group identities of a pattern in layout order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupLayout {
    slots: Vec<GroupSlot>,
}

impl GroupLayout {
    fn from_capture_names<'a>(names: impl Iterator<Item = Option<&'a str>>) -> Self {
        let mut unnamed = Vec::new();
        let mut named = Vec::new();
        for (index, name) in names.enumerate().skip(1) {
            match name {
                Some(name) => named.push(GroupSlot {
                    index,
                    name: name.to_string(),
                }),
                None => unnamed.push(index),
            }
        }

        let mut slots = Vec::with_capacity(1 + unnamed.len() + named.len());
        slots.push(GroupSlot {
            index: 0,
            name: "0".to_string(),
        });
        for (ordinal, index) in unnamed.into_iter().enumerate() {
            slots.push(GroupSlot {
                index,
                name: (ordinal + 1).to_string(),
            });
        }
        slots.extend(named);
        Self { slots }
    }

    /// Number of groups, including group 0.
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn name(&self, pos: usize) -> Option<&str> {
        self.slots.get(pos).map(|slot| slot.name.as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.slots.iter().map(|slot| slot.name.as_str())
    }

    /// Resolves a group reference (a number or a name) to its layout position.
    pub fn position_of(&self, reference: &str) -> Option<usize> {
        if !reference.is_empty() && reference.bytes().all(|b| b.is_ascii_digit()) {
            return reference.parse::<usize>().ok().filter(|&n| n < self.len());
        }
        self.slots.iter().position(|slot| slot.name == reference)
    }
}

#[derive(Debug)]
pub struct CompiledPattern {
    regex: fancy_regex::Regex,
    layout: GroupLayout,
    options: RegexOptions,
}

impl CompiledPattern {
    pub fn layout(&self) -> &GroupLayout {
        &self.layout
    }

    pub fn options(&self) -> RegexOptions {
        self.options
    }

    /// Lazily iterates the matches of this pattern in `input`.
    pub fn matches<'p, 't>(&'p self, input: &'t str) -> Matches<'p, 't> {
        Matches {
            layout: &self.layout,
            input,
            inner: self.regex.captures_iter(input),
            done: false,
        }
    }

    pub fn first_match<'p, 't>(&'p self, input: &'t str) -> Result<Option<RegexMatch<'p, 't>>, EngineError> {
        self.matches(input).next().transpose()
    }

    pub fn is_match(&self, input: &str) -> Result<bool, EngineError> {
        self.regex.is_match(input).map_err(EngineError::Runtime)
    }

    pub fn template(&self, src: &str) -> Template {
        Template::parse(src, &self.layout, self.options())
    }

    /// Substitutes every match of the pattern in `input`.
    pub fn replace_all(&self, input: &str, template: &Template) -> Result<String, EngineError> {
        let mut out = String::with_capacity(input.len());
        let mut last = 0;
        for m in self.matches(input) {
            let m = m?;
            out.push_str(&input[last..m.start()]);
            template.expand_into(&m, &mut out);
            last = m.end();
        }
        out.push_str(&input[last..]);
        Ok(out)
    }
}

pub struct Matches<'p, 't> {
    layout: &'p GroupLayout,
    input: &'t str,
    inner: fancy_regex::CaptureMatches<'p, 't>,
    done: bool,
}

impl<'p, 't> Iterator for Matches<'p, 't> {
    type Item = Result<RegexMatch<'p, 't>, EngineError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let caps = match self.inner.next()? {
            Ok(caps) => caps,
            Err(err) => {
                self.done = true;
                return Some(Err(EngineError::Runtime(err)));
            }
        };
        let spans = self
            .layout
            .slots
            .iter()
            .map(|slot| caps.get(slot.index).map(|m| (m.start(), m.end())))
            .collect();
        Some(Ok(RegexMatch {
            layout: self.layout,
            input: self.input,
            spans,
        }))
    }
}

/// One match, with its groups in layout order.
#[derive(Debug, Clone)]
pub struct RegexMatch<'p, 't> {
    layout: &'p GroupLayout,
    input: &'t str,
    spans: Vec<Option<(usize, usize)>>,
}

impl<'p, 't> RegexMatch<'p, 't> {
    #[cfg(test)]
    pub(crate) fn from_spans(
        layout: &'p GroupLayout,
        input: &'t str,
        spans: Vec<Option<(usize, usize)>>,
    ) -> Self {
        debug_assert_eq!(spans.len(), layout.len());
        Self {
            layout,
            input,
            spans,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.spans.first(), Some(Some(_)))
    }

    /// The matched text, or `""` for a failed match.
    pub fn value(&self) -> &'t str {
        self.group(0).and_then(|g| g.value()).unwrap_or("")
    }

    pub fn start(&self) -> usize {
        self.span().map_or(0, |(start, _)| start)
    }

    pub fn end(&self) -> usize {
        self.span().map_or(0, |(_, end)| end)
    }

    fn span(&self) -> Option<(usize, usize)> {
        self.spans.first().copied().flatten()
    }

    pub fn input(&self) -> &'t str {
        self.input
    }

    pub fn group_count(&self) -> usize {
        self.spans.len()
    }

    pub fn group(&self, pos: usize) -> Option<Group<'p, 't>> {
        let span = *self.spans.get(pos)?;
        let name = self.layout.name(pos)?;
        Some(Group {
            number: pos,
            name,
            value: span.map(|(start, end)| &self.input[start..end]),
        })
    }

    pub fn groups(&self) -> impl Iterator<Item = Group<'p, 't>> + '_ {
        (0..self.spans.len()).filter_map(move |pos| self.group(pos))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Group<'p, 't> {
    number: usize,
    name: &'p str,
    value: Option<&'t str>,
}

impl<'p, 't> Group<'p, 't> {
    pub fn number(&self) -> usize {
        self.number
    }

    /// The group's identity: its name, or its number for unnamed groups.
    pub fn name(&self) -> &'p str {
        self.name
    }

    pub fn is_success(&self) -> bool {
        self.value.is_some()
    }

    pub fn value(&self) -> Option<&'t str> {
        self.value
    }
}

/// Escapes the characters that carry special meaning in a pattern.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '*' | '+' | '?' | '|' | '{' | '[' | '(' | ')' | '^' | '$' | '.' | '#' | ' ' => {
                out.push('\\');
                out.push(c);
            }
            '\t' => out.push_str(r"\t"),
            '\n' => out.push_str(r"\n"),
            '\r' => out.push_str(r"\r"),
            '\u{000C}' => out.push_str(r"\f"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn compile(pattern: &str) -> CompiledPattern {
        RegexEngine::default()
            .compile(pattern, RegexOptions::NONE)
            .unwrap()
    }

    #[test]
    fn layout_puts_unnamed_groups_before_named_ones() {
        let compiled = compile(r"(?<l>[a-z]+)(\d+)(?<d>\d)?(x)?");
        let names: Vec<&str> = compiled.layout().names().collect();
        assert_eq!(names, vec!["0", "1", "2", "l", "d"]);
        assert_eq!(compiled.layout().position_of("l"), Some(3));
        assert_eq!(compiled.layout().position_of("2"), Some(2));
        assert_eq!(compiled.layout().position_of("9"), None);
    }

    #[test]
    fn groups_report_success_and_values_in_layout_order() {
        let compiled = compile(r"(?<l>[a-z]+)(\d+)(x)?");
        let m = compiled.first_match("ab12").unwrap().unwrap();
        let groups: Vec<(&str, Option<&str>)> = m.groups().map(|g| (g.name(), g.value())).collect();
        assert_eq!(
            groups,
            vec![
                ("0", Some("ab12")),
                ("1", Some("12")),
                ("2", None),
                ("l", Some("ab")),
            ]
        );
        assert!(m.is_success());
        assert_eq!((m.start(), m.end()), (0, 4));
    }

    #[test]
    fn matches_are_produced_lazily_in_order() {
        let compiled = compile(r"\d");
        let mut it = compiled.matches("a1b2c3");
        assert_eq!(it.next().unwrap().unwrap().value(), "1");
        assert_eq!(it.next().unwrap().unwrap().value(), "2");
        assert_eq!(it.next().unwrap().unwrap().value(), "3");
        assert!(it.next().is_none());
    }

    #[test]
    fn empty_matches_are_reported() {
        let compiled = compile("a*");
        assert_eq!(compiled.matches("bb").count(), 3);
    }

    #[test]
    fn replace_all_uses_templates() {
        let compiled = compile(r"(\d+)");
        let template = compiled.template("<$1>");
        assert_eq!(compiled.replace_all("a1b22", &template).unwrap(), "a<1>b<22>");
    }

    #[test]
    fn options_change_matching() {
        let engine = RegexEngine::default();
        let ci = engine.compile("abc", RegexOptions::IGNORE_CASE).unwrap();
        assert!(ci.is_match("xABCx").unwrap());
        let explicit = engine
            .compile("(a)(?<n>b)", RegexOptions::EXPLICIT_CAPTURE)
            .unwrap();
        assert_eq!(explicit.layout().names().collect::<Vec<_>>(), vec!["0", "n"]);
    }

    #[test]
    fn invalid_patterns_are_syntax_errors() {
        let err = RegexEngine::default()
            .compile("(unclosed", RegexOptions::NONE)
            .unwrap_err();
        assert!(matches!(err, EngineError::Syntax(_)));
    }

    #[test]
    fn backtrack_limit_is_reported_as_runtime_error() {
        let engine = RegexEngine::new(EngineConfig {
            backtrack_limit: 10,
            ..EngineConfig::default()
        });
        let compiled = engine.compile(r"(a+)+\1b", RegexOptions::NONE).unwrap();
        let mut it = compiled.matches("aaaaaaaaaaaaaaaaaaaaaac");
        assert!(matches!(it.next(), Some(Err(EngineError::Runtime(_)))));
        assert!(it.next().is_none());
    }

    #[test]
    fn escape_quotes_metacharacters_and_whitespace() {
        assert_eq!(escape("a.b*c"), r"a\.b\*c");
        assert_eq!(escape("(x) [y] {z}"), r"\(x\)\ \[y]\ \{z}");
        assert_eq!(escape("#1\t$"), r"\#1\t\$");
        assert_eq!(escape("line\nnext"), r"line\nnext");
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"backtrackLimit": 50}"#).unwrap();
        assert_eq!(config.backtrack_limit, 50);
        assert_eq!(config.delegate_size_limit, None);
        let config: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
    }
}
