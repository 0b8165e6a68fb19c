use std::fmt;
use std::str::FromStr;

use crate::FloatExt;

/// Characters that bound an operand when scanning outward from an operator.
///
/// `-` is deliberately absent: it doubles as a sign.
pub const BOUNDING_CHARS: &str = "+*/^%?:;()[]";

pub fn is_bounding_char(c: char) -> bool {
    BOUNDING_CHARS.contains(c)
}

/// One syntactic form recognised by the evaluator.
///
/// The order of [`CONSTRUCTS`] is the precedence ladder: the first construct
/// whose detector matches the remaining text handles it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Construct {
    Grouping(Bracket),
    Conditional,
    Loop,
    SignedProduct(SignedOperator),
    Arithmetic(Operator),
    Function(Function),
    Literal,
}

pub const CONSTRUCTS: [Construct; 20] = [
    Construct::Grouping(Bracket::Round),
    Construct::Grouping(Bracket::Square),
    Construct::Conditional,
    Construct::Loop,
    Construct::SignedProduct(SignedOperator::Mul),
    Construct::SignedProduct(SignedOperator::Div),
    Construct::SignedProduct(SignedOperator::Rem),
    Construct::Arithmetic(Operator::Add),
    Construct::Arithmetic(Operator::Sub),
    Construct::Arithmetic(Operator::Mul),
    Construct::Arithmetic(Operator::Div),
    Construct::Arithmetic(Operator::Rem),
    Construct::Arithmetic(Operator::Pow),
    // Longest names first so `Sinh` is not taken for `Sin`.
    Construct::Function(Function::Sinh),
    Construct::Function(Function::Cosh),
    Construct::Function(Function::Sin),
    Construct::Function(Function::Cos),
    Construct::Function(Function::Tan),
    Construct::Function(Function::Ln),
    Construct::Literal,
];

impl Construct {
    /// Whether this construct claims `text`.
    pub fn detect(&self, text: &str) -> bool {
        match self {
            Self::Grouping(bracket) => {
                text.contains(bracket.open()) || text.contains(bracket.close())
            }
            Self::Conditional => text.contains('?'),
            Self::Loop => text.contains(';'),
            Self::SignedProduct(op) => text.contains(op.symbol()),
            Self::Arithmetic(op) => text.contains(op.symbol()),
            Self::Function(function) => text.contains(function.name()),
            Self::Literal => true,
        }
    }

    /// The first construct on the ladder that claims `text`.
    pub fn select(text: &str) -> Construct {
        CONSTRUCTS
            .iter()
            .copied()
            .find(|construct| construct.detect(text))
            .unwrap_or(Construct::Literal)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bracket {
    Round,
    Square,
}

impl Bracket {
    pub fn open(self) -> char {
        match self {
            Self::Round => '(',
            Self::Square => '[',
        }
    }

    pub fn close(self) -> char {
        match self {
            Self::Round => ')',
            Self::Square => ']',
        }
    }
}

/// A multiplicative operator immediately followed by a negative operand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignedOperator {
    Mul,
    Div,
    Rem,
}

impl SignedOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Mul => "*-",
            Self::Div => "/-",
            Self::Rem => "%-",
        }
    }
}

/// A binary arithmetic operator, one per tier of the dispatcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
}

impl Operator {
    pub fn symbol(self) -> char {
        match self {
            Self::Add => '+',
            Self::Sub => '-',
            Self::Mul => '*',
            Self::Div => '/',
            Self::Rem => '%',
            Self::Pow => '^',
        }
    }

    /// The accumulator used when an expression opens with a sign.
    pub fn base_case<Real: FloatExt>(self) -> Real {
        match self {
            Self::Add | Self::Sub => Real::zero(),
            Self::Mul | Self::Div | Self::Rem | Self::Pow => Real::one(),
        }
    }

    pub fn apply<Real: FloatExt>(self, lhs: Real, rhs: Real) -> Real {
        match self {
            Self::Add => lhs + rhs,
            Self::Sub => lhs - rhs,
            Self::Mul => lhs * rhs,
            Self::Div => lhs / rhs,
            Self::Rem => floored_rem(lhs, rhs),
            Self::Pow => lhs.powf(rhs),
        }
    }
}

/// Remainder taking the sign of the divisor.
fn floored_rem<Real: FloatExt>(lhs: Real, rhs: Real) -> Real {
    let rem = lhs % rhs;
    if rem != Real::zero() && (rem < Real::zero()) != (rhs < Real::zero()) {
        rem + rhs
    } else {
        rem
    }
}

/// Named unary functions. Trigonometric arguments are in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Function {
    Sinh,
    Cosh,
    Sin,
    Cos,
    Tan,
    Ln,
}

impl Function {
    pub fn name(self) -> &'static str {
        match self {
            Self::Sinh => "Sinh",
            Self::Cosh => "Cosh",
            Self::Sin => "Sin",
            Self::Cos => "Cos",
            Self::Tan => "Tan",
            Self::Ln => "Ln",
        }
    }

    pub fn apply<Real: FloatExt>(self, arg: Real) -> Real {
        match self {
            Self::Sinh => arg.to_radians().sinh(),
            Self::Cosh => arg.to_radians().cosh(),
            Self::Sin => arg.to_radians().sin(),
            Self::Cos => arg.to_radians().cos(),
            Self::Tan => arg.to_radians().tan(),
            Self::Ln => arg.ln(),
        }
    }
}

/// Comparison symbols in search priority: two-character symbols come before
/// the single characters they contain.
pub const COMPARISON_SYMBOLS: [&str; 5] = ["<=", "==", ">=", ">", "<"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Comparison {
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Equal,
}

impl Comparison {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Less => "<",
            Self::Greater => ">",
            Self::LessEqual => "<=",
            Self::GreaterEqual => ">=",
            Self::Equal => "==",
        }
    }

    pub fn holds<Real: FloatExt>(self, lhs: Real, rhs: Real) -> bool {
        match self {
            Self::Less => lhs < rhs,
            Self::Greater => lhs > rhs,
            Self::LessEqual => lhs <= rhs,
            Self::GreaterEqual => lhs >= rhs,
            Self::Equal => lhs == rhs,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownComparison(pub String);

impl FromStr for Comparison {
    type Err = UnknownComparison;

    fn from_str(symbol: &str) -> Result<Self, Self::Err> {
        match symbol {
            "<" => Ok(Self::Less),
            ">" => Ok(Self::Greater),
            "<=" => Ok(Self::LessEqual),
            ">=" => Ok(Self::GreaterEqual),
            "==" => Ok(Self::Equal),
            other => Err(UnknownComparison(other.to_string())),
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// `left <op> right ? then : else`, as slices of the conditional text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConditionalSpec<'a> {
    pub left: &'a str,
    pub comparison: Comparison,
    pub right: &'a str,
    pub then_branch: &'a str,
    pub else_branch: &'a str,
}

/// `initial ; <op> final ; step ; body`, as slices of the loop text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoopSpec<'a> {
    pub initial: &'a str,
    pub comparison: Comparison,
    pub last: &'a str,
    pub step: &'a str,
    pub body: &'a str,
}

/// Byte range of the two operands around a signed multiplicative operator.
///
/// `start..operator` is the left operand, bounding character included, and
/// `operator + 1..end` the right one, sign included. The product replaces
/// `start..end`, so the bounding character is consumed with it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OperandSpan {
    pub start: usize,
    pub operator: usize,
    pub end: usize,
}
