//! Precedence-ladder arithmetic expression evaluator.
//!
//! Expressions are plain text: infix arithmetic (`+ - * / % ^`), two kinds of
//! grouping (`( )` and `[ ]`), the functions `Sin Cos Tan Sinh Cosh Ln`
//! (trigonometry in degrees), a ternary conditional `a<b?then:else` and a
//! loop-sum `initial;<final;step;body`.
//!
//! # How?
//!
//! Every call looks at the remaining text once and hands it to the first
//! construct on a fixed ladder that claims it: grouping, conditional, loop,
//! signed product, the arithmetic tiers, functions and finally a numeric
//! literal. Operands are evaluated recursively from slices of the text. When
//! a construct only resolves part of the text (a group, a signed product)
//! its value is spliced back in as a literal and the result is evaluated
//! again.
//!
//! # Example
//!
//! ```rust
//! use splice_calc::*;
//!
//! assert_eq!(evaluate("2 * (3 + 4)"), Ok(14.0));
//! assert_eq!(evaluate("5 > 3 ? 1 : 2"), Ok(1.0));
//! assert_eq!(evaluate("0;<;5;1;2"), Ok(10.0));
//!
//! let limits = Limits::unbounded().with_max_iterations(1000);
//! let evaluator = Evaluator::<f64>::new().with_limits(limits);
//! let stuck = evaluator.evaluate("0;<1;0;1");
//! assert!(matches!(stuck, Err(EvalError::IterationLimitExceeded { .. })));
//! ```

mod error;
mod evaluate;
mod expression;
mod parse;

/// Numeric literals use the [`pest`] parsing expression grammar language.
///
/// ```text
#[doc = include_str!("grammar.pest")]
/// ```
pub mod grammar_doc {}

pub use error::EvalError;
pub use evaluate::*;
pub use expression::*;
pub use parse::{normalize, render};

/// Evaluates `input` as an `f64` with no limits.
pub fn evaluate(input: &str) -> Result<f64, EvalError> {
    Evaluator::new().evaluate(input)
}

pub trait FloatExt: num_traits::Float + std::str::FromStr + std::fmt::Display + Send + Sync {}
impl FloatExt for f32 {}
impl FloatExt for f64 {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_is_insignificant() {
        assert_eq!(evaluate(" 2 +\t3 * 4 "), Ok(14.0));
        assert_eq!(evaluate("( 2 + 3 ) * 4"), Ok(20.0));
    }

    #[test]
    fn double_negation_reads_as_addition() {
        assert_eq!(evaluate("5--3"), Ok(8.0));
        assert_eq!(evaluate("5 - -3"), Ok(8.0));
    }

    #[test]
    fn intermediate_splices_round_trip() {
        let evaluator = Evaluator::<f64>::new();
        for input in ["0.1+0.2", "1/3", "2^70", "1/2^30", "0-7/3", "Sin45"] {
            let value = evaluator.evaluate(input).unwrap();
            let spliced = render(value);
            assert_eq!(evaluator.evaluate_normalized(&spliced), Ok(value), "{input}");
        }
    }

    #[test]
    fn spliced_group_matches_direct_evaluation() {
        assert_eq!(evaluate("(0.1+0.2)*3"), Ok((0.1 + 0.2) * 3.0));
        assert_eq!(evaluate("(1/3)*3"), Ok((1.0 / 3.0) * 3.0));
    }

    #[test]
    fn conditional_inside_loop_body() {
        assert_eq!(evaluate("0;<;4;1;(2>1?5:0)"), Ok(20.0));
    }
}
