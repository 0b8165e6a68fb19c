use thiserror::Error;

/// Everything that can go wrong while evaluating an expression.
///
/// Every variant carries the (sub)expression text at which the problem was
/// detected. Errors are never recovered from inside the evaluator: they
/// propagate unchanged to the caller of [`Evaluator::evaluate`].
///
/// [`Evaluator::evaluate`]: crate::Evaluator::evaluate
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EvalError {
    /// Open and close counts differ for a bracket kind, or a bracket closes
    /// before it opens.
    #[error("the brackets in expression '{expression}' are uneven")]
    MismatchedGrouping { expression: String },

    /// The number of loop separators is not a multiple of three.
    #[error("the loop at '{expression}' may be incomplete")]
    MalformedLoop { expression: String },

    /// A `?` without a matching `:`.
    #[error("the conditional at '{expression}' may be incomplete")]
    MalformedConditional { expression: String },

    /// A conditional or loop without one of `<`, `>`, `<=`, `>=`, `==`.
    #[error("no recognized comparison operator in expression '{expression}'")]
    UnknownComparisonOperator { expression: String },

    /// Terminal text that is neither a construct nor a numeric literal.
    #[error("unsupported term '{expression}'")]
    UnsupportedTerm { expression: String },

    /// Evaluation recursed deeper than [`Limits::max_depth`].
    ///
    /// [`Limits::max_depth`]: crate::Limits::max_depth
    #[error("recursion depth limit of {limit} exceeded at expression '{expression}'")]
    RecursionLimitExceeded { expression: String, limit: usize },

    /// A single loop ran more than [`Limits::max_iterations`] iterations.
    ///
    /// [`Limits::max_iterations`]: crate::Limits::max_iterations
    #[error("the loop at '{expression}' exceeded {limit} iterations")]
    IterationLimitExceeded { expression: String, limit: usize },
}

impl EvalError {
    /// The text at which the error was detected.
    pub fn expression(&self) -> &str {
        match self {
            Self::MismatchedGrouping { expression }
            | Self::MalformedLoop { expression }
            | Self::MalformedConditional { expression }
            | Self::UnknownComparisonOperator { expression }
            | Self::UnsupportedTerm { expression }
            | Self::RecursionLimitExceeded { expression, .. }
            | Self::IterationLimitExceeded { expression, .. } => expression,
        }
    }
}
