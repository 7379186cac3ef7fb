//! The parsed-model data structures knowledge-map and principal-state
//! construction operate over.
//!
//! Turning model source text into this tree (tokenizing, resolving
//! principal/phase blocks, expanding macro-like shorthands) lives upstream
//! of this crate; what we accept here is the already-parsed tree, via
//! [`serde::Deserialize`] so a host can hand it to us as JSON/whatever its
//! own parser emits. [`crate::preprocess`] handles the one piece of textual
//! normalization (infix arithmetic) that's cheap enough, and local enough to
//! a single line, to own here instead.

use serde::{Deserialize, Serialize};

use crate::value::{Constant, Qualifier, Value};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Block {
    Principal(PrincipalBlock),
    Message(MessageBlock),
    Phase(PhaseBlock),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrincipalBlock {
    pub id: u64,
    pub name: String,
    pub expressions: Vec<Expression>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageBlock {
    pub sender: u64,
    pub recipient: u64,
    pub constants: Vec<Constant>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseBlock {
    pub number: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpressionKind {
    Knows,
    Generates,
    Assignment,
    Leaks,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expression {
    pub kind: ExpressionKind,
    /// For `knows`/`generates`/`leaks`: the constants being declared. For
    /// `assignment`: the output constant(s) the right-hand side is bound
    /// to (one per primitive output, or a single constant for a bare
    /// value).
    pub constants: Vec<Constant>,
    pub qualifier: Qualifier,
    /// Only set for `Assignment`.
    pub assigned: Option<Value>,
}

impl Expression {
    pub fn knows(constants: Vec<Constant>, qualifier: Qualifier) -> Self {
        Expression {
            kind: ExpressionKind::Knows,
            constants,
            qualifier,
            assigned: None,
        }
    }

    pub fn generates(constants: Vec<Constant>) -> Self {
        Expression {
            kind: ExpressionKind::Generates,
            constants,
            qualifier: Qualifier::Private,
            assigned: None,
        }
    }

    pub fn leaks(constants: Vec<Constant>) -> Self {
        Expression {
            kind: ExpressionKind::Leaks,
            constants,
            qualifier: Qualifier::Private,
            assigned: None,
        }
    }

    pub fn assignment(constants: Vec<Constant>, assigned: Value) -> Self {
        Expression {
            kind: ExpressionKind::Assignment,
            constants,
            qualifier: Qualifier::Private,
            assigned: Some(assigned),
        }
    }
}
