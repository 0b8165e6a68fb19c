//! Text scanning: normalization, literal parsing, and locating the pieces of
//! each construct as slices of the text being evaluated.

use std::ops::Range;

use crate::error::EvalError;
use crate::expression::{
    is_bounding_char, Bracket, Comparison, ConditionalSpec, LoopSpec, OperandSpan,
    COMPARISON_SYMBOLS,
};
use crate::FloatExt;

use pest::Parser;
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "grammar.pest"] // relative to project `src`
struct LiteralParser;

/// Canonical form of raw input: no whitespace, and `--` read as `+`.
pub fn normalize(input: &str) -> String {
    let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    compact.replace("--", "+")
}

/// Parses `text` as a complete numeric literal.
pub fn parse_literal<Real: FloatExt>(text: &str) -> Result<Real, EvalError> {
    let unsupported = || EvalError::UnsupportedTerm {
        expression: text.to_string(),
    };
    if let Err(err) = LiteralParser::parse(Rule::literal, text) {
        log::trace!("{text:?} is not a literal:\n{err}");
        return Err(unsupported());
    }
    text.replace('_', "").parse::<Real>().map_err(|_| unsupported())
}

/// Textual form of a value spliced back into an expression.
///
/// Uses the shortest representation that parses back to the same value, and
/// never exponent notation, whose `+`/`-` would be read as operators.
pub fn render<Real: FloatExt>(value: Real) -> String {
    value.to_string()
}

/// Replaces `span` of `text` with the rendered `value`.
pub fn splice<Real: FloatExt>(text: &str, span: Range<usize>, value: Real) -> String {
    let rendered = render(value);
    let mut spliced = String::with_capacity(text.len() + rendered.len());
    spliced.push_str(&text[..span.start]);
    spliced.push_str(&rendered);
    spliced.push_str(&text[span.end..]);
    log::trace!("spliced {:?} -> {spliced:?}", &text[span]);
    spliced
}

/// `text[start..end]`, or empty when the bounds cross.
fn between(text: &str, start: usize, end: usize) -> &str {
    if start < end {
        &text[start..end]
    } else {
        ""
    }
}

/// Counts loop separators. A `;<op>;` marker counts once.
pub fn loop_separators(text: &str) -> usize {
    let mut count = 0;
    let mut rest = text;
    while let Some(idx) = rest.find(';') {
        count += 1;
        rest = &rest[idx + 1..];
        if let Some(symbol) = leading_comparison(rest) {
            if rest[symbol.len()..].starts_with(';') {
                rest = &rest[symbol.len() + 1..];
            }
        }
    }
    count
}

fn leading_comparison(text: &str) -> Option<&'static str> {
    COMPARISON_SYMBOLS
        .into_iter()
        .find(|symbol| text.starts_with(symbol))
}

/// The first comparison symbol present in `text`, by priority, and the byte
/// offset of its first occurrence.
pub fn find_comparison(text: &str) -> Result<(Comparison, usize), EvalError> {
    let unknown = || EvalError::UnknownComparisonOperator {
        expression: text.to_string(),
    };
    let (symbol, idx) = COMPARISON_SYMBOLS
        .into_iter()
        .find_map(|symbol| text.find(symbol).map(|idx| (symbol, idx)))
        .ok_or_else(unknown)?;
    let comparison = symbol.parse::<Comparison>().map_err(|_| unknown())?;
    Ok((comparison, idx))
}

/// Byte offsets of the first balanced `bracket` pair in `text`.
pub fn balanced_group(text: &str, bracket: Bracket) -> Result<(usize, usize), EvalError> {
    let mismatched = || EvalError::MismatchedGrouping {
        expression: text.to_string(),
    };
    if text.matches(bracket.open()).count() != text.matches(bracket.close()).count() {
        return Err(mismatched());
    }

    let mut opened = 0usize;
    let mut closed = 0usize;
    let mut first_open = None;
    for (idx, c) in text.char_indices() {
        if c == bracket.open() {
            first_open.get_or_insert(idx);
            opened += 1;
        } else if c == bracket.close() {
            closed += 1;
        }
        if closed > opened {
            return Err(mismatched());
        }
        if opened > 0 && opened == closed {
            return first_open.map(|open| (open, idx)).ok_or_else(mismatched);
        }
    }
    Err(mismatched())
}

impl<'a> ConditionalSpec<'a> {
    /// Splits `left <op> right ? then : else`.
    ///
    /// Positions are first occurrences in the whole text, so an operand that
    /// lands out of order reads as empty.
    pub fn locate(text: &'a str) -> Result<Self, EvalError> {
        let (comparison, op_idx) = find_comparison(text)?;
        let malformed = || EvalError::MalformedConditional {
            expression: text.to_string(),
        };
        let question = text.find('?').ok_or_else(malformed)?;
        let colon = text.find(':').ok_or_else(malformed)?;
        Ok(Self {
            left: &text[..op_idx],
            comparison,
            right: between(text, op_idx + comparison.symbol().len(), question),
            then_branch: between(text, question + 1, colon),
            else_branch: &text[colon + 1..],
        })
    }
}

impl<'a> LoopSpec<'a> {
    /// Splits `initial;<op>final;step;body` or `initial;<op>;final;step;body`.
    ///
    /// The comparison is the first one found anywhere in the loop text by
    /// priority, nested loops in the body included. Whatever symbol heads the
    /// final segment is stripped from it.
    pub fn locate(text: &'a str) -> Result<Self, EvalError> {
        let malformed = || EvalError::MalformedLoop {
            expression: text.to_string(),
        };
        let (comparison, _) = find_comparison(text)?;
        let first = text.find(';').ok_or_else(malformed)?;
        let mut rest = &text[first + 1..];
        if let Some(symbol) = leading_comparison(rest) {
            rest = &rest[symbol.len()..];
            rest = rest.strip_prefix(';').unwrap_or(rest);
        }
        let mut segments = rest.splitn(3, ';');
        match (segments.next(), segments.next(), segments.next()) {
            (Some(last), Some(step), Some(body)) => Ok(Self {
                initial: &text[..first],
                comparison,
                last,
                step,
                body,
            }),
            _ => Err(malformed()),
        }
    }
}

impl OperandSpan {
    /// Bounds the operands on either side of the first `symbol` (`*-`, `/-`
    /// or `%-`). The left operand starts at the nearest bounding character
    /// before the operator, that character included, or at the start of the
    /// text; the right one runs up to the next bounding character or the end.
    pub fn locate(text: &str, symbol: &str) -> Option<Self> {
        let operator = text.find(symbol)?;
        let start = text[..operator].rfind(is_bounding_char).unwrap_or(0);
        let right = operator + symbol.len();
        let end = text[right..]
            .find(is_bounding_char)
            .map_or(text.len(), |idx| right + idx);
        Some(Self {
            start,
            operator,
            end,
        })
    }

    /// The left operand, led by its bounding character if it has one.
    pub fn left<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..self.operator]
    }

    /// The right operand, sign included.
    pub fn right<'a>(&self, text: &'a str) -> &'a str {
        &text[self.operator + 1..self.end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_whitespace_and_double_negation() {
        assert_eq!(normalize(" 1 -\t- 2 \n"), "1+2");
        assert_eq!(normalize("3---2"), "3+-2");
        assert_eq!(normalize("4----1"), "4++1");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn literals() {
        assert_eq!(parse_literal::<f64>("42"), Ok(42.0));
        assert_eq!(parse_literal::<f64>("-1.5"), Ok(-1.5));
        assert_eq!(parse_literal::<f64>("+.5"), Ok(0.5));
        assert_eq!(parse_literal::<f64>("3."), Ok(3.0));
        assert_eq!(parse_literal::<f64>("1e3"), Ok(1000.0));
        assert_eq!(parse_literal::<f64>("2.5E-1"), Ok(0.25));
        assert_eq!(parse_literal::<f64>("1_000"), Ok(1000.0));
        assert_eq!(parse_literal::<f32>("0.25"), Ok(0.25));
        assert_eq!(parse_literal::<f64>("-inf"), Ok(f64::NEG_INFINITY));
        assert_eq!(parse_literal::<f64>("Infinity"), Ok(f64::INFINITY));
        assert!(parse_literal::<f64>("NaN").unwrap().is_nan());
    }

    #[test]
    fn non_literals() {
        for text in ["", "abc", ".", "1.2.3", "1e", "_1", "1__0", "--1", "0x10"] {
            assert_eq!(
                parse_literal::<f64>(text),
                Err(EvalError::UnsupportedTerm {
                    expression: text.to_string()
                }),
                "{text:?}"
            );
        }
    }

    #[test]
    fn rendered_values_parse_back() {
        for value in [0.1 + 0.2, -6.0, 1e21, 1e-7, 123456.789, f64::MAX, -0.0] {
            let text = render(value);
            assert_eq!(parse_literal::<f64>(&text), Ok(value), "{text}");
            assert!(!text.contains('e'), "{text}");
        }
        assert_eq!(render(f64::INFINITY), "inf");
        assert!(parse_literal::<f64>(&render(f64::NAN)).unwrap().is_nan());
    }

    #[test]
    fn splice_replaces_span() {
        assert_eq!(splice("1+(2*3)-4", 2..7, 6.0), "1+6-4");
        assert_eq!(splice("2*-3", 0..4, -6.0), "-6");
    }

    #[test]
    fn separators() {
        assert_eq!(loop_separators("1+2"), 0);
        assert_eq!(loop_separators(";"), 1);
        assert_eq!(loop_separators("0;<5;1;2"), 3);
        assert_eq!(loop_separators("0;<;5;1;2"), 3);
        assert_eq!(loop_separators("0;<=;5;1;2"), 3);
        assert_eq!(loop_separators("0;<2;1;0;<;3;1;1"), 6);
    }

    #[test]
    fn comparison_priority() {
        assert_eq!(find_comparison("1<2"), Ok((Comparison::Less, 1)));
        assert_eq!(find_comparison("1<=2"), Ok((Comparison::LessEqual, 1)));
        assert_eq!(find_comparison("3>1==1"), Ok((Comparison::Equal, 3)));
        assert_eq!(find_comparison("3>=1"), Ok((Comparison::GreaterEqual, 1)));
        assert!(matches!(
            find_comparison("1?2:3"),
            Err(EvalError::UnknownComparisonOperator { .. })
        ));
    }

    #[test]
    fn groups() {
        assert_eq!(balanced_group("(1+2)*3", Bracket::Round), Ok((0, 4)));
        assert_eq!(balanced_group("2*((1+2)*3)", Bracket::Round), Ok((2, 10)));
        assert_eq!(balanced_group("[1]+[2]", Bracket::Square), Ok((0, 2)));
        assert!(matches!(
            balanced_group("(1+2", Bracket::Round),
            Err(EvalError::MismatchedGrouping { .. })
        ));
        assert!(matches!(
            balanced_group(")1(", Bracket::Round),
            Err(EvalError::MismatchedGrouping { .. })
        ));
    }

    #[test]
    fn conditional_pieces() {
        let spec = ConditionalSpec::locate("5>=3?1:2").unwrap();
        assert_eq!(spec.left, "5");
        assert_eq!(spec.comparison, Comparison::GreaterEqual);
        assert_eq!(spec.right, "3");
        assert_eq!(spec.then_branch, "1");
        assert_eq!(spec.else_branch, "2");

        let spec = ConditionalSpec::locate("1?2:3<4").unwrap();
        assert_eq!(spec.left, "1?2:3");
        assert_eq!(spec.right, "");
    }

    #[test]
    fn loop_pieces() {
        for text in ["0;<5;1;2", "0;<;5;1;2"] {
            let spec = LoopSpec::locate(text).unwrap();
            assert_eq!(spec.initial, "0");
            assert_eq!(spec.comparison, Comparison::Less);
            assert_eq!(spec.last, "5");
            assert_eq!(spec.step, "1");
            assert_eq!(spec.body, "2");
        }

        let spec = LoopSpec::locate("10;>=;0;-2;1;<3;1;1").unwrap();
        assert_eq!(spec.comparison, Comparison::GreaterEqual);
        assert_eq!(spec.last, "0");
        assert_eq!(spec.step, "-2");
        assert_eq!(spec.body, "1;<3;1;1");

        // `<=` in the body outranks the outer `<`.
        let spec = LoopSpec::locate("0;<2;1;0;<=;3;1;1").unwrap();
        assert_eq!(spec.comparison, Comparison::LessEqual);
        assert_eq!(spec.last, "2");
        assert_eq!(spec.body, "0;<=;3;1;1");

        let spec = LoopSpec::locate("0;<2;1;5;>3;-1;1").unwrap();
        assert_eq!(spec.comparison, Comparison::Greater);
        assert_eq!(spec.last, "2");
        assert_eq!(spec.step, "1");
        assert_eq!(spec.body, "5;>3;-1;1");

        assert!(matches!(
            LoopSpec::locate("0;5;1;2"),
            Err(EvalError::UnknownComparisonOperator { .. })
        ));
    }

    #[test]
    fn signed_operands() {
        let span = OperandSpan::locate("1+2*-3+4", "*-").unwrap();
        assert_eq!(span, OperandSpan { start: 1, operator: 3, end: 6 });
        assert_eq!(span.left("1+2*-3+4"), "+2");
        assert_eq!(span.right("1+2*-3+4"), "-3");

        let span = OperandSpan::locate("10/-5", "/-").unwrap();
        assert_eq!(span, OperandSpan { start: 0, operator: 2, end: 5 });

        let span = OperandSpan::locate("2^2*-3", "*-").unwrap();
        assert_eq!(span.left("2^2*-3"), "^2");
        assert_eq!(span.right("2^2*-3"), "-3");

        assert_eq!(OperandSpan::locate("1*2", "*-"), None);
    }
}
