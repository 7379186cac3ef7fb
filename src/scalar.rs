//! Scalar-exponent algebra.
//!
//! `SCALARADD`/`SCALARNEG` exponents form a free abelian group generated by
//! constant names (a `HASH`/`PW_HASH` application counts as an opaque
//! generator, named by its own canonical rendering). Rather than teach every
//! rewriter to walk `SCALARADD(SCALARNEG(a), SCALARADD(b, a))` trees, we
//! normalize them once into a linear combination, then re-encode that
//! combination into a single canonical constant name (`scalar_<hex>`) so two
//! exponents that are algebraically equal compare equal as plain constants.

use std::collections::BTreeMap;

use crate::pretty::pretty_primitive_canonical;
use crate::value::{value_zero, Constant, Declaration, Primitive, PrimitiveId, Qualifier, Value};

pub const SCALAR_NAME_PREFIX: &str = "scalar_";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScalarExpr {
    terms: BTreeMap<String, i64>,
    constant: i64,
}

impl ScalarExpr {
    pub fn zero() -> Self {
        ScalarExpr::default()
    }

    pub fn variable(name: impl Into<String>) -> Self {
        let mut terms = BTreeMap::new();
        terms.insert(name.into(), 1);
        ScalarExpr { terms, constant: 0 }
    }

    pub fn is_zero(&self) -> bool {
        self.constant == 0 && self.terms.is_empty()
    }

    pub fn negate(&self) -> Self {
        ScalarExpr {
            terms: self.terms.iter().map(|(k, &v)| (k.clone(), -v)).collect(),
            constant: -self.constant,
        }
    }

    pub fn add(&self, other: &Self) -> Self {
        let mut terms = self.terms.clone();
        for (k, &v) in &other.terms {
            *terms.entry(k.clone()).or_insert(0) += v;
        }
        terms.retain(|_, &mut v| v != 0);
        ScalarExpr {
            terms,
            constant: self.constant + other.constant,
        }
    }

    pub fn normalize(&self) -> Self {
        let mut terms = self.terms.clone();
        terms.retain(|_, &mut v| v != 0);
        ScalarExpr {
            terms,
            constant: self.constant,
        }
    }

    pub fn variable_names(&self) -> Vec<String> {
        self.terms.keys().cloned().collect()
    }

    /// Encodes this expression into the reversible `scalar_<hex>` name.
    pub fn encode(&self) -> String {
        let normalized = self.normalize();
        let mut body = String::new();
        if normalized.constant != 0 {
            body.push_str(&format!("const={};", normalized.constant));
        }
        for name in normalized.variable_names() {
            body.push_str(&format!("{}={};", name, normalized.terms[&name]));
        }
        format!("{}{}", SCALAR_NAME_PREFIX, hex::encode(body.as_bytes()))
    }

    /// Decodes a previously-encoded `scalar_<hex>` name. Returns `None` if
    /// `name` doesn't carry the prefix or its payload isn't valid `k=v;`
    /// pairs.
    pub fn decode(name: &str) -> Option<Self> {
        let payload = name.strip_prefix(SCALAR_NAME_PREFIX)?;
        if payload.is_empty() {
            return None;
        }
        let bytes = hex::decode(payload).ok()?;
        let body = String::from_utf8(bytes).ok()?;
        let mut expr = ScalarExpr::zero();
        for part in body.split(';') {
            if part.is_empty() {
                continue;
            }
            let mut kv = part.splitn(2, '=');
            let key = kv.next()?;
            let value = kv.next()?;
            let coeff: i64 = value.parse().ok()?;
            if key == "const" {
                expr.constant = coeff;
                continue;
            }
            if coeff == 0 {
                continue;
            }
            *expr.terms.entry(key.to_string()).or_insert(0) += coeff;
        }
        expr.terms.retain(|_, &mut v| v != 0);
        Some(expr)
    }

    /// Rebuilds a [`Value`] representing this expression: `0` if empty,
    /// otherwise a synthetic constant named by [`Self::encode`].
    pub fn to_value(&self) -> Value {
        let normalized = self.normalize();
        if normalized.is_zero() {
            return value_zero();
        }
        let name = normalized.encode();
        Value::constant(Constant::new(name, Declaration::Generates, Qualifier::Private))
    }

    /// Parses a value as a scalar expression: a bare variable constant, a
    /// previously-encoded `scalar_<hex>` constant, a `HASH`/`PW_HASH`
    /// application (treated as an opaque generator named by its own
    /// canonical rendering), or a `SCALARNEG`/`SCALARADD` application over
    /// such values. Returns `None` for anything else (e.g. `CONCAT`).
    pub fn from_value(v: &Value) -> Option<Self> {
        match v {
            Value::Constant(c) => Self::from_constant(c),
            Value::Primitive(p) => match p.id {
                PrimitiveId::ScalarNeg if p.arguments.len() == 1 => {
                    Self::from_value(&p.arguments[0]).map(|e| e.negate())
                }
                PrimitiveId::ScalarAdd if p.arguments.len() >= 2 => {
                    let mut sum = ScalarExpr::zero();
                    for arg in flatten_scalar_add_operands(&p.arguments) {
                        sum = sum.add(&Self::from_value(arg)?);
                    }
                    Some(sum)
                }
                PrimitiveId::Hash | PrimitiveId::PwHash => Some(Self::from_hash_primitive(p)),
                _ => None,
            },
            Value::Equation(_) => None,
        }
    }

    fn from_hash_primitive(p: &Primitive) -> Self {
        ScalarExpr::variable(pretty_primitive_canonical(p))
    }

    fn from_constant(c: &Constant) -> Option<Self> {
        if c.name == "0" {
            Some(ScalarExpr::zero())
        } else if c.name.starts_with(SCALAR_NAME_PREFIX) {
            Self::decode(&c.name)
        } else {
            Some(ScalarExpr::variable(c.name.clone()))
        }
    }
}

/// Flattens nested `SCALARADD` applications into a single operand list, the
/// same way [`crate::rewrite`] flattens `GROUPADD`/`XOR`.
pub fn flatten_scalar_add_operands(args: &[Value]) -> Vec<&Value> {
    let mut operands = Vec::with_capacity(args.len());
    for arg in args {
        if let Value::Primitive(p) = arg {
            if p.id == PrimitiveId::ScalarAdd && p.arguments.len() >= 2 {
                operands.extend(flatten_scalar_add_operands(&p.arguments));
                continue;
            }
        }
        operands.push(arg);
    }
    operands
}

pub fn value_is_zero(v: &Value) -> bool {
    match v {
        Value::Constant(c) if c.name == "0" => true,
        Value::Constant(_) => ScalarExpr::from_value(v).map(|e| e.is_zero()).unwrap_or(false),
        _ => false,
    }
}

/// Formats a scalar constant name for diagnostics: variables print as
/// themselves, linear combinations print as a `a + 2*b - c` style sum so
/// error messages don't leak raw hex.
pub fn format_scalar_constant(name: &str) -> String {
    let Some(expr) = ScalarExpr::decode(name) else {
        return name.to_string();
    };
    let expr = expr.normalize();
    if expr.is_zero() {
        return "0".to_string();
    }
    let mut parts = Vec::new();
    for var in expr.variable_names() {
        let coeff = expr.terms[&var];
        let term = match coeff.abs() {
            1 => var,
            n => format!("{n}*{var}"),
        };
        let signed = if coeff < 0 {
            format!("-{term}")
        } else if parts.is_empty() {
            term
        } else {
            format!("+{term}")
        };
        parts.push(signed);
    }
    if expr.constant != 0 {
        let signed = if expr.constant > 0 && !parts.is_empty() {
            format!("+{}", expr.constant)
        } else {
            expr.constant.to_string()
        };
        parts.push(signed);
    }
    parts.join("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interning::reset_for_test;

    #[test]
    fn encode_decode_roundtrips() {
        let expr = ScalarExpr::variable("a").add(&ScalarExpr::variable("b").negate());
        let name = expr.encode();
        let decoded = ScalarExpr::decode(&name).unwrap();
        assert_eq!(expr, decoded);
    }

    #[test]
    fn opposite_terms_cancel_to_zero() {
        let expr = ScalarExpr::variable("a").add(&ScalarExpr::variable("a").negate());
        assert!(expr.is_zero());
    }

    #[test]
    fn from_value_parses_scalaradd_of_scalarneg() {
        reset_for_test();
        let a = Value::constant(Constant::new("a", Declaration::Generates, Qualifier::Private));
        let b = Value::constant(Constant::new("b", Declaration::Generates, Qualifier::Private));
        let v = Value::primitive(Primitive::new(
            PrimitiveId::ScalarAdd,
            vec![a, Value::primitive(Primitive::new(PrimitiveId::ScalarNeg, vec![b]))],
        ));
        let expr = ScalarExpr::from_value(&v).unwrap();
        let vars = expr.variable_names();
        assert!(vars.contains(&"a".to_string()));
        assert!(vars.contains(&"b".to_string()));
        assert_eq!(vars.len(), 2);
    }

    #[test]
    fn format_scalar_constant_renders_signed_sum() {
        let expr = ScalarExpr::variable("a").add(&ScalarExpr::variable("b").negate());
        let name = expr.encode();
        assert_eq!(format_scalar_constant(&name), "a-b");
    }

    #[test]
    fn format_scalar_constant_passes_through_plain_names() {
        assert_eq!(format_scalar_constant("alice"), "alice");
    }
}
