use super::{GroupLayout, RegexMatch, RegexOptions};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Literal(String),
    /// Position in the [`GroupLayout`].
    Group(usize),
    WholeMatch,
    BeforeMatch,
    AfterMatch,
    LastGroup,
    Input,
}

/// A parsed replacement template.
///
/// Substitutions: `$$`, `$&`, `` $` ``, `$'`, `$+`, `$_`, `$n` and `${name}`. A `$` that does
/// not start a valid substitution (including references to groups the pattern does not define)
/// is kept literally.
///
/// `$n` takes the whole digit run, which must name a group. Under ECMAScript it takes the longest
/// digit prefix that names a group instead, so `$10` with one group is group 1 followed by `0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pieces: Vec<Piece>,
}

impl Template {
    pub fn parse(src: &str, layout: &GroupLayout, options: RegexOptions) -> Self {
        let longest_prefix = options.contains(RegexOptions::ECMA_SCRIPT);
        let mut pieces = Vec::new();
        let mut literal = String::new();
        let mut rest = src;

        while let Some(dollar) = rest.find('$') {
            literal.push_str(&rest[..dollar]);
            let after = &rest[dollar + 1..];

            let (piece, consumed) = match after.chars().next() {
                Some('$') => {
                    literal.push('$');
                    rest = &after[1..];
                    continue;
                }
                Some('&') => (Some(Piece::WholeMatch), 1),
                Some('`') => (Some(Piece::BeforeMatch), 1),
                Some('\'') => (Some(Piece::AfterMatch), 1),
                Some('+') => (Some(Piece::LastGroup), 1),
                Some('_') => (Some(Piece::Input), 1),
                Some('{') => match after.find('}') {
                    Some(close) => match layout.position_of(&after[1..close]) {
                        Some(pos) => (Some(Piece::Group(pos)), close + 1),
                        None => (None, 0),
                    },
                    None => (None, 0),
                },
                Some(c) if c.is_ascii_digit() => {
                    let len = after
                        .find(|ch: char| !ch.is_ascii_digit())
                        .unwrap_or(after.len());
                    let shortest = if longest_prefix { 1 } else { len };
                    (shortest..=len)
                        .rev()
                        .find_map(|end| {
                            after[..end]
                                .parse::<usize>()
                                .ok()
                                .filter(|&n| n < layout.len())
                                .map(|n| (Some(Piece::Group(n)), end))
                        })
                        .unwrap_or((None, 0))
                }
                _ => (None, 0),
            };

            match piece {
                Some(piece) => {
                    if !literal.is_empty() {
                        pieces.push(Piece::Literal(std::mem::take(&mut literal)));
                    }
                    pieces.push(piece);
                    rest = &after[consumed..];
                }
                None => {
                    literal.push('$');
                    rest = after;
                }
            }
        }

        literal.push_str(rest);
        if !literal.is_empty() {
            pieces.push(Piece::Literal(literal));
        }
        Template { pieces }
    }

    pub fn expand(&self, m: &RegexMatch<'_, '_>) -> String {
        let mut out = String::new();
        self.expand_into(m, &mut out);
        out
    }

    pub fn expand_into(&self, m: &RegexMatch<'_, '_>, out: &mut String) {
        for piece in &self.pieces {
            match piece {
                Piece::Literal(text) => out.push_str(text),
                Piece::Group(pos) => out.push_str(m.group(*pos).and_then(|g| g.value()).unwrap_or("")),
                Piece::WholeMatch => out.push_str(m.value()),
                Piece::BeforeMatch => out.push_str(&m.input()[..m.start()]),
                Piece::AfterMatch => out.push_str(&m.input()[m.end()..]),
                Piece::LastGroup => {
                    let last = m.group_count().saturating_sub(1);
                    out.push_str(m.group(last).and_then(|g| g.value()).unwrap_or(""));
                }
                Piece::Input => out.push_str(m.input()),
            }
        }
    }
}
