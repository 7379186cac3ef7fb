//! The term-tree data model: constants, primitive applications, and
//! generator/exponent equations.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::interning::intern_constant_name;

pub type ConstantId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Declaration {
    Knows,
    Generates,
    Assignment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Qualifier {
    Public,
    Private,
    Password,
}

/// Every primitive the registry knows about, core and non-core alike. `Xor`
/// and `ScalarAdd` are non-core (arity >= 2, no Decompose/Recompose/Rewrite/
/// Rebuild rule): their normalization is owned entirely by the rewriters in
/// [`crate::rewrite`], not by the generic rule-matching framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveId {
    Assert,
    Concat,
    Split,
    PwHash,
    Hash,
    Hkdf,
    AeadEnc,
    AeadDec,
    Enc,
    Dec,
    Mac,
    Sign,
    SignVerif,
    PkeEnc,
    PkeDec,
    ShamirSplit,
    ShamirJoin,
    RingSign,
    RingSignVerif,
    Blind,
    Unblind,
    PedersenCommit,
    Neg,
    GroupAdd,
    ScalarNeg,
    ScalarAdd,
    Xor,
}

impl PrimitiveId {
    pub fn name(self) -> &'static str {
        use PrimitiveId::*;
        match self {
            Assert => "ASSERT",
            Concat => "CONCAT",
            Split => "SPLIT",
            PwHash => "PW_HASH",
            Hash => "HASH",
            Hkdf => "HKDF",
            AeadEnc => "AEAD_ENC",
            AeadDec => "AEAD_DEC",
            Enc => "ENC",
            Dec => "DEC",
            Mac => "MAC",
            Sign => "SIGN",
            SignVerif => "SIGNVERIF",
            PkeEnc => "PKE_ENC",
            PkeDec => "PKE_DEC",
            ShamirSplit => "SHAMIR_SPLIT",
            ShamirJoin => "SHAMIR_JOIN",
            RingSign => "RINGSIGN",
            RingSignVerif => "RINGSIGNVERIF",
            Blind => "BLIND",
            Unblind => "UNBLIND",
            PedersenCommit => "PEDERSENCOMMIT",
            Neg => "NEG",
            GroupAdd => "GROUPADD",
            ScalarNeg => "SCALARNEG",
            ScalarAdd => "SCALARADD",
            Xor => "XOR",
        }
    }

    pub fn is_core(self) -> bool {
        matches!(self, PrimitiveId::Assert | PrimitiveId::Concat | PrimitiveId::Split)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constant {
    pub name: String,
    pub id: ConstantId,
    pub guard: bool,
    pub fresh: bool,
    pub leaked: bool,
    pub declaration: Declaration,
    pub qualifier: Qualifier,
}

impl Constant {
    pub fn new(name: impl Into<String>, declaration: Declaration, qualifier: Qualifier) -> Self {
        let name = name.into();
        let id = intern_constant_name(&name);
        Constant {
            name,
            id,
            guard: false,
            fresh: false,
            leaked: false,
            declaration,
            qualifier,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Primitive {
    pub id: PrimitiveId,
    pub arguments: Vec<Value>,
    pub output: usize,
    pub check: bool,
}

impl Primitive {
    pub fn new(id: PrimitiveId, arguments: Vec<Value>) -> Self {
        Primitive {
            id,
            arguments,
            output: 0,
            check: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Equation {
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Constant(Constant),
    Primitive(Box<Primitive>),
    Equation(Box<Equation>),
}

impl Value {
    pub fn constant(c: Constant) -> Value {
        Value::Constant(c)
    }

    pub fn primitive(p: Primitive) -> Value {
        Value::Primitive(Box::new(p))
    }

    pub fn equation(e: Equation) -> Value {
        Value::Equation(Box::new(e))
    }

    pub fn as_constant(&self) -> Option<&Constant> {
        match self {
            Value::Constant(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_primitive(&self) -> Option<&Primitive> {
        match self {
            Value::Primitive(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_equation(&self) -> Option<&Equation> {
        match self {
            Value::Equation(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_primitive_id(&self, id: PrimitiveId) -> bool {
        matches!(self, Value::Primitive(p) if p.id == id)
    }
}

/// Flattens nested equations by concatenating exponent lists: an equation
/// whose first value is itself an equation is replaced by that equation's
/// values followed by the outer equation's remaining exponents.
pub fn value_flatten_equation(eq: &Equation) -> Equation {
    let mut values = Vec::with_capacity(eq.values.len());
    for (i, v) in eq.values.iter().enumerate() {
        if i == 0 {
            if let Value::Equation(inner) = v {
                values.extend(value_flatten_equation(inner).values);
                continue;
            }
        }
        values.push(v.clone());
    }
    Equation { values }
}

/// Deep-copies a value tree. Primitive arguments in this system are trees by
/// construction (assignments introduce fresh constants rather than sharing
/// subterms), so this recursion always terminates; the depth bound here only
/// guards against a future bug introducing a cycle.
const MAX_DEEP_COPY_DEPTH: usize = 4096;

pub fn value_deep_copy(v: &Value) -> Value {
    deep_copy_bounded(v, 0)
}

fn deep_copy_bounded(v: &Value, depth: usize) -> Value {
    assert!(depth < MAX_DEEP_COPY_DEPTH, "value tree exceeds sane depth; likely a cycle");
    match v {
        Value::Constant(c) => Value::Constant(c.clone()),
        Value::Primitive(p) => Value::primitive(Primitive {
            id: p.id,
            arguments: p
                .arguments
                .iter()
                .map(|a| deep_copy_bounded(a, depth + 1))
                .collect(),
            output: p.output,
            check: p.check,
        }),
        Value::Equation(e) => Value::equation(Equation {
            values: e.values.iter().map(|a| deep_copy_bounded(a, depth + 1)).collect(),
        }),
    }
}

/// The group generator `G`, the distinguished `nil`, and the scalar zero
/// `0`. Interned once per process; every knowledge map places them at
/// indices 0, 1, 2 respectively (see [`crate::knowledge_map`]).
pub static VALUE_G: Lazy<Value> =
    Lazy::new(|| Value::constant(Constant::new("G", Declaration::Knows, Qualifier::Public)));
pub static VALUE_NIL: Lazy<Value> =
    Lazy::new(|| Value::constant(Constant::new("nil", Declaration::Knows, Qualifier::Public)));
pub static VALUE_ZERO: Lazy<Value> =
    Lazy::new(|| Value::constant(Constant::new("0", Declaration::Knows, Qualifier::Public)));

pub fn value_g() -> Value {
    VALUE_G.clone()
}

pub fn value_nil() -> Value {
    VALUE_NIL.clone()
}

pub fn value_zero() -> Value {
    VALUE_ZERO.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interning::reset_for_test;

    #[test]
    fn flatten_equation_concatenates_nested_exponents() {
        reset_for_test();
        let inner = Equation {
            values: vec![value_g(), Value::constant(Constant::new("a", Declaration::Generates, Qualifier::Private))],
        };
        let outer = Equation {
            values: vec![
                Value::equation(inner),
                Value::constant(Constant::new("b", Declaration::Generates, Qualifier::Private)),
            ],
        };
        let flat = value_flatten_equation(&outer);
        assert_eq!(flat.values.len(), 3);
    }

    #[test]
    fn deep_copy_preserves_structure() {
        reset_for_test();
        let a = Value::constant(Constant::new("a", Declaration::Generates, Qualifier::Private));
        let p = Value::primitive(Primitive::new(PrimitiveId::Hash, vec![a.clone(), a.clone()]));
        let copy = value_deep_copy(&p);
        assert_eq!(copy, p);
    }
}
