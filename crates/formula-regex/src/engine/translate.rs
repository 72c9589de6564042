//! Rewrites worksheet pattern syntax into the dialect understood by `fancy-regex`.
//!
//! Only the constructs that differ between the two dialects are touched. Everything else is
//! copied through verbatim and left for the engine to accept or reject.
//!
//! Numeric group references inside the pattern (`\1`, `\k<1>`, `(?(1)..)`) use layout numbers,
//! the same numbers templates and the group listings use, so they are renumbered to the engine's
//! declaration-order capture indices.

use super::options::RegexOptions;

const ASCII_DIGIT: &str = "0-9";
const ASCII_WORD: &str = "0-9A-Za-z_";
const ASCII_SPACE: &str = r"\t\n\x0B\x0C\r\x20";

pub(crate) fn translate(pattern: &str, options: RegexOptions) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);

    let mut flags = String::new();
    if options.contains(RegexOptions::IGNORE_CASE) {
        flags.push('i');
    }
    if options.contains(RegexOptions::MULTILINE) {
        flags.push('m');
    }
    if options.contains(RegexOptions::SINGLELINE) {
        flags.push('s');
    }
    if options.contains(RegexOptions::IGNORE_PATTERN_WHITESPACE) {
        flags.push('x');
    }
    if !flags.is_empty() {
        out.push_str("(?");
        out.push_str(&flags);
        out.push(')');
    }

    let explicit_capture = options.contains(RegexOptions::EXPLICIT_CAPTURE);
    let extended = options.contains(RegexOptions::IGNORE_PATTERN_WHITESPACE);
    let ecma = options.contains(RegexOptions::ECMA_SCRIPT);

    let chars: Vec<char> = pattern.chars().collect();
    let mut groups = Groups::default();
    let mut in_class = false;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];

        if c == '\\' {
            if !in_class {
                if let Some((number, len)) = numeric_backref(&chars[i + 1..]) {
                    groups.refs.push(GroupRef {
                        at: out.len(),
                        number,
                        kind: RefKind::Backref,
                        original: chars[i..i + 1 + len].iter().collect(),
                    });
                    i += 1 + len;
                    continue;
                }
            }
            match chars.get(i + 1) {
                Some(&next) => {
                    match ecma.then(|| ascii_class(next, in_class)).flatten() {
                        Some(class) => out.push_str(&class),
                        None => {
                            out.push('\\');
                            out.push(next);
                        }
                    }
                    i += 2;
                }
                None => {
                    out.push('\\');
                    i += 1;
                }
            }
            continue;
        }

        if in_class {
            match c {
                ']' => {
                    in_class = false;
                    out.push(']');
                }
                // Nested classes and set operators are literal characters here.
                '[' | '&' | '~' => {
                    out.push('\\');
                    out.push(c);
                }
                _ => out.push(c),
            }
            i += 1;
            continue;
        }

        match c {
            '[' => {
                out.push('[');
                i += 1;
                if chars.get(i) == Some(&'^') {
                    out.push('^');
                    i += 1;
                }
                if chars.get(i) == Some(&']') {
                    out.push_str(r"\]");
                    i += 1;
                }
                in_class = true;
            }
            '#' if extended => {
                while i < chars.len() && chars[i] != '\n' {
                    out.push(chars[i]);
                    i += 1;
                }
            }
            '(' => i = translate_group_open(&chars, i, explicit_capture, &mut out, &mut groups),
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }

    groups.renumber(&out)
}

/// Capturing groups in declaration order (`true` for named ones) and the numeric group
/// references seen while translating.
#[derive(Debug, Default)]
struct Groups {
    named: Vec<bool>,
    refs: Vec<GroupRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefKind {
    /// `\n` or `\k<n>`.
    Backref,
    /// The `n` of a `(?(n)...)` conditional.
    Condition,
}

/// A reference by layout number, spliced into the output at byte offset `at`.
#[derive(Debug)]
struct GroupRef {
    at: usize,
    number: usize,
    kind: RefKind,
    original: String,
}

impl Groups {
    /// Engine capture indices of the named (or unnamed) groups, in declaration order.
    fn declared(&self, named: bool) -> impl Iterator<Item = usize> + '_ {
        self.named
            .iter()
            .enumerate()
            .filter(move |(_, n)| **n == named)
            .map(|(index, _)| index + 1)
    }

    /// Engine capture index of the group with layout number `number`.
    fn capture_index(&self, number: usize) -> Option<usize> {
        if number == 0 {
            return Some(0);
        }
        let unnamed = self.declared(false).count();
        if number <= unnamed {
            self.declared(false).nth(number - 1)
        } else {
            self.declared(true).nth(number - 1 - unnamed)
        }
    }

    /// Rewrites layout-numbered references to engine capture indices. References to groups the
    /// pattern does not define are left for the engine to reject.
    fn renumber(&self, out: &str) -> String {
        let mut result = String::with_capacity(out.len() + 4 * self.refs.len());
        let mut last = 0;
        for r in &self.refs {
            result.push_str(&out[last..r.at]);
            match (self.capture_index(r.number), r.kind) {
                // Grouped so a following digit cannot extend the reference.
                (Some(index), RefKind::Backref) => result.push_str(&format!(r"(?:\{index})")),
                (Some(index), RefKind::Condition) => result.push_str(&index.to_string()),
                (None, _) => result.push_str(&r.original),
            }
            last = r.at;
        }
        result.push_str(&out[last..]);
        result
    }
}

/// Matches `n...`, `k<n>` or `k'n'` after a backslash; returns the number and the length consumed.
fn numeric_backref(rest: &[char]) -> Option<(usize, usize)> {
    match rest.first()? {
        '1'..='9' => {
            let len = rest.iter().take_while(|c| c.is_ascii_digit()).count();
            let number = rest[..len].iter().collect::<String>().parse().ok()?;
            Some((number, len))
        }
        'k' => {
            let close = match rest.get(1)? {
                '<' => '>',
                '\'' => '\'',
                _ => return None,
            };
            let digits = rest[2..].iter().take_while(|c| c.is_ascii_digit()).count();
            if digits == 0 || rest.get(2 + digits) != Some(&close) {
                return None;
            }
            let number = rest[2..2 + digits].iter().collect::<String>().parse().ok()?;
            Some((number, digits + 3))
        }
        _ => None,
    }
}

/// Handles a `(` at `chars[i]` and returns the index just past what was consumed.
fn translate_group_open(
    chars: &[char],
    i: usize,
    explicit_capture: bool,
    out: &mut String,
    groups: &mut Groups,
) -> usize {
    if chars.get(i + 1) != Some(&'?') {
        if explicit_capture {
            out.push_str("(?:");
        } else {
            groups.named.push(false);
            out.push('(');
        }
        return i + 1;
    }

    match chars.get(i + 2) {
        Some('<') => match chars.get(i + 3) {
            // Lookbehind.
            Some('=') | Some('!') => {
                out.push_str("(?<");
                i + 3
            }
            _ => {
                groups.named.push(true);
                out.push_str("(?P<");
                i + 3
            }
        },
        Some('P') if chars.get(i + 3) == Some(&'<') => {
            groups.named.push(true);
            out.push_str("(?P<");
            i + 4
        }
        Some('\'') => {
            let close = chars[i + 3..].iter().position(|&ch| ch == '\'');
            match close {
                Some(len) => {
                    groups.named.push(true);
                    out.push_str("(?P<");
                    out.extend(&chars[i + 3..i + 3 + len]);
                    out.push('>');
                    i + 3 + len + 1
                }
                None => {
                    out.push_str("(?'");
                    i + 3
                }
            }
        }
        // Inline comment: dropped entirely.
        Some('#') => {
            let close = chars[i + 3..].iter().position(|&ch| ch == ')');
            match close {
                Some(len) => i + 3 + len + 1,
                None => chars.len(),
            }
        }
        Some('(') => {
            let digits = chars[i + 3..].iter().take_while(|c| c.is_ascii_digit()).count();
            out.push_str("(?(");
            if digits > 0 && chars.get(i + 3 + digits) == Some(&')') {
                let original: String = chars[i + 3..i + 3 + digits].iter().collect();
                if let Ok(number) = original.parse() {
                    groups.refs.push(GroupRef {
                        at: out.len(),
                        number,
                        kind: RefKind::Condition,
                        original,
                    });
                    return i + 3 + digits;
                }
            }
            i + 3
        }
        _ => {
            out.push_str("(?");
            i + 2
        }
    }
}

fn ascii_class(escape: char, in_class: bool) -> Option<String> {
    let (set, negated) = match escape {
        'd' => (ASCII_DIGIT, false),
        'D' => (ASCII_DIGIT, true),
        'w' => (ASCII_WORD, false),
        'W' => (ASCII_WORD, true),
        's' => (ASCII_SPACE, false),
        'S' => (ASCII_SPACE, true),
        _ => return None,
    };
    if in_class {
        // A negated shorthand cannot be spliced into an enclosing class, so `[\D]`, `[\W]` and
        // `[\S]` keep their Unicode meaning.
        return (!negated).then(|| set.to_string());
    }
    Some(if negated {
        format!("[^{set}]")
    } else {
        format!("[{set}]")
    })
}
