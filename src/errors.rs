use thiserror::Error;

/// Errors raised while normalizing a raw source line into the primitive
/// calls the rest of the pipeline understands.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PreprocessError {
    #[error("unbalanced parentheses in line: {0}")]
    UnbalancedParens(String),

    #[error("empty operand around operator '{operator}' in line: {line}")]
    EmptyOperand { operator: char, line: String },

    #[error("unsupported operator sequence in line: {0}")]
    UnsupportedOperator(String),
}

/// Hard-error modeling violations surfaced while building a knowledge map or
/// principal state out of a parsed model. These always abort construction;
/// there is no recoverable "model is partially valid" state.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ModelingError {
    #[error("constant '{0}' is declared more than once via generates/knows/leaks")]
    DuplicateGenerates(String),

    #[error("constant '{0}' is assigned more than once")]
    DoubleAssignment(String),

    #[error("constant '{0}' is used before it is known to principal '{1}'")]
    UseBeforeKnowledge(String, String),

    #[error("constant '{0}' is sent before it is known to principal '{1}'")]
    SendBeforeKnowledge(String, String),

    #[error("constant '{0}' is received but was never sent on the declared channel")]
    ReceiveWithoutSend(String),

    #[error("constant '{0}' is leaked before it is known to principal '{1}'")]
    LeakBeforeKnowledge(String, String),

    #[error("principal '{0}' declares conflicting knowledge of constant '{1}'")]
    ConflictingKnows(String, String),

    #[error("primitive '{0}' expects {1} argument(s), got {2}")]
    PrimitiveArity(String, usize, usize),

    #[error("unknown principal referenced: '{0}'")]
    UnknownPrincipal(String),

    #[error("unknown constant referenced: '{0}'")]
    UnknownConstant(String),
}

/// Invariant violations that indicate a bug in this crate rather than a
/// malformed model: a rewriter returned a shape its caller cannot handle, an
/// index that construction promised would exist turned out not to.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum InternalError {
    #[error("knowledge map index {0} out of bounds")]
    IndexOutOfBounds(usize),

    #[error("attacker state was queried before being initialized")]
    AttackerStateUninitialized,

    #[error("expected a {0} value, found a different shape")]
    UnexpectedShape(&'static str),
}
