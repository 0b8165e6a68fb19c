use std::marker::PhantomData;

use crate::error::EvalError;
use crate::expression::{
    is_bounding_char, Bracket, ConditionalSpec, Construct, Function, LoopSpec, OperandSpan,
    Operator, SignedOperator,
};
use crate::parse::{balanced_group, loop_separators, normalize, parse_literal, splice};
use crate::FloatExt;

#[cfg(feature = "rayon")]
use rayon::prelude::{IntoParallelRefIterator, ParallelIterator};

/// Caps on the work a single evaluation may do.
///
/// Both are unbounded by default: a loop whose step never fails its
/// comparison runs forever, and deep nesting recurses as far as the stack
/// allows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Limits {
    /// Maximum recursion depth, the top-level call being depth 0.
    pub max_depth: Option<usize>,
    /// Maximum iterations of any single loop.
    pub max_iterations: Option<usize>,
}

impl Limits {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }
}

/// Evaluates expressions to values of type `Real`.
///
/// Holds no state besides its [`Limits`], so one evaluator can be shared
/// freely between threads.
#[derive(Clone, Copy, Debug)]
pub struct Evaluator<Real = f64> {
    limits: Limits,
    real: PhantomData<fn() -> Real>,
}

impl<Real: FloatExt> Default for Evaluator<Real> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Real: FloatExt> Evaluator<Real> {
    pub fn new() -> Self {
        Self {
            limits: Limits::default(),
            real: PhantomData,
        }
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Normalizes `input` and evaluates it.
    pub fn evaluate(&self, input: &str) -> Result<Real, EvalError> {
        let text = normalize(input);
        log::debug!("evaluating {text:?}");
        self.evaluate_recursive(&text, 0)
    }

    /// Evaluates text that is already in normalized form, such as an
    /// intermediate produced by a splice.
    pub fn evaluate_normalized(&self, text: &str) -> Result<Real, EvalError> {
        self.evaluate_recursive(text, 0)
    }

    /// Evaluates unrelated expressions, one result per input, in order.
    pub fn evaluate_all<S: AsRef<str> + Sync>(
        &self,
        inputs: &[S],
    ) -> Vec<Result<Real, EvalError>> {
        #[cfg(feature = "rayon")]
        {
            inputs
                .par_iter()
                .map(|input| self.evaluate(input.as_ref()))
                .collect()
        }
        #[cfg(not(feature = "rayon"))]
        {
            inputs
                .iter()
                .map(|input| self.evaluate(input.as_ref()))
                .collect()
        }
    }

    fn evaluate_recursive(&self, text: &str, depth: usize) -> Result<Real, EvalError> {
        if let Some(limit) = self.limits.max_depth {
            if depth > limit {
                log::debug!("depth {depth} exceeds limit {limit} at {text:?}");
                return Err(EvalError::RecursionLimitExceeded {
                    expression: text.to_string(),
                    limit,
                });
            }
        }
        if loop_separators(text) % 3 != 0 {
            return Err(EvalError::MalformedLoop {
                expression: text.to_string(),
            });
        }
        if text.contains('?') && !text.contains(':') {
            return Err(EvalError::MalformedConditional {
                expression: text.to_string(),
            });
        }

        let construct = Construct::select(text);
        log::trace!("{depth:>3} {construct:?} {text:?}");
        let depth = depth + 1;
        match construct {
            Construct::Grouping(bracket) => self.evaluate_grouping(text, bracket, depth),
            Construct::Conditional => self.evaluate_conditional(text, depth),
            Construct::Loop => self.evaluate_loop(text, depth),
            Construct::SignedProduct(op) => self.evaluate_signed_product(text, op, depth),
            Construct::Arithmetic(op) => self.evaluate_arithmetic(text, op, depth),
            Construct::Function(function) => self.evaluate_function(text, function, depth),
            Construct::Literal => parse_literal(text),
        }
    }

    /// Evaluates the first balanced group, splices its value over the group
    /// and evaluates what remains.
    fn evaluate_grouping(
        &self,
        text: &str,
        bracket: Bracket,
        depth: usize,
    ) -> Result<Real, EvalError> {
        let (open, close) = balanced_group(text, bracket)?;
        let inner = self.evaluate_recursive(&text[open + 1..close], depth)?;
        let spliced = splice(text, open..close + 1, inner);
        self.evaluate_recursive(&spliced, depth)
    }

    fn evaluate_conditional(&self, text: &str, depth: usize) -> Result<Real, EvalError> {
        let spec = ConditionalSpec::locate(text)?;
        let left = self.evaluate_recursive(spec.left, depth)?;
        let right = self.evaluate_recursive(spec.right, depth)?;
        if spec.comparison.holds(left, right) {
            self.evaluate_recursive(spec.then_branch, depth)
        } else {
            self.evaluate_recursive(spec.else_branch, depth)
        }
    }

    /// Sums the body once per step while the counter satisfies the
    /// comparison. Every segment, the body included, is evaluated exactly
    /// once up front.
    fn evaluate_loop(&self, text: &str, depth: usize) -> Result<Real, EvalError> {
        let spec = LoopSpec::locate(text)?;
        let mut current = self.evaluate_recursive(spec.initial, depth)?;
        let last = self.evaluate_recursive(spec.last, depth)?;
        let step = self.evaluate_recursive(spec.step, depth)?;
        let body = self.evaluate_recursive(spec.body, depth)?;

        let mut total = Real::zero();
        let mut iterations = 0usize;
        while spec.comparison.holds(current, last) {
            if let Some(limit) = self.limits.max_iterations {
                if iterations >= limit {
                    log::debug!("loop {text:?} hit the limit of {limit} iterations");
                    return Err(EvalError::IterationLimitExceeded {
                        expression: text.to_string(),
                        limit,
                    });
                }
            }
            total = total + body;
            current = current + step;
            iterations += 1;
        }
        log::debug!("loop {text:?} ran {iterations} iterations");
        Ok(total)
    }

    /// `a*-b`, `a/-b` and `a%-b` all become the product `a * -b`.
    fn evaluate_signed_product(
        &self,
        text: &str,
        op: SignedOperator,
        depth: usize,
    ) -> Result<Real, EvalError> {
        let span = OperandSpan::locate(text, op.symbol()).ok_or_else(|| {
            EvalError::UnsupportedTerm {
                expression: text.to_string(),
            }
        })?;
        let left = self.evaluate_recursive(span.left(text), depth)?;
        let right = self.evaluate_recursive(span.right(text), depth)?;
        let spliced = splice(text, span.start..span.end, left * right);
        self.evaluate_recursive(&spliced, depth)
    }

    /// Folds the segments between every occurrence of `op` left to right.
    ///
    /// A first segment that is empty or ends in a bounding character is a
    /// leading sign rather than an operand, and the tier's base case stands
    /// in for it. Empty segments from repeated operators are skipped.
    fn evaluate_arithmetic(
        &self,
        text: &str,
        op: Operator,
        depth: usize,
    ) -> Result<Real, EvalError> {
        let mut segments = text.split(op.symbol());
        let first = segments.next().unwrap_or_default();
        let mut accumulator = match first.chars().last() {
            Some(c) if !is_bounding_char(c) => self.evaluate_recursive(first, depth)?,
            _ => op.base_case(),
        };
        for segment in segments.filter(|segment| !segment.is_empty()) {
            let operand = self.evaluate_recursive(segment, depth)?;
            accumulator = op.apply(accumulator, operand);
        }
        Ok(accumulator)
    }

    /// Applies `function` to everything after its name.
    fn evaluate_function(
        &self,
        text: &str,
        function: Function,
        depth: usize,
    ) -> Result<Real, EvalError> {
        let name = function.name();
        let Some(idx) = text.find(name) else {
            return Err(EvalError::UnsupportedTerm {
                expression: text.to_string(),
            });
        };
        let argument = self.evaluate_recursive(&text[idx + name.len()..], depth)?;
        Ok(function.apply(argument))
    }
}
