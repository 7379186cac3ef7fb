//! Primitive-specific rewriters.
//!
//! `XOR`, `SCALARNEG`, `SCALARADD`, `PEDERSENCOMMIT`, `NEG` and `GROUPADD`
//! each get a dedicated normalizer instead of the generic decompose/
//! recompose/rewrite/rebuild framework in [`crate::registry`]: their algebra
//! (an involutive abelian group, a homomorphism, generator-equation
//! folding) doesn't fit that framework's one-primitive-rewrites-to-another
//! shape. Every rewriter here is total and deterministic, and every
//! bail-out path returns the input wrapped back up unchanged rather than an
//! error — callers doing fixed-point iteration rely on being able to detect
//! "nothing changed" by comparing the rewriter's output to its input.

use crate::equivalence::value_equivalent;
use crate::scalar::{value_is_zero, ScalarExpr};
use crate::value::{value_g, value_zero, value_flatten_equation, Primitive, PrimitiveId, Value};

fn unchanged(p: &Primitive) -> (bool, Vec<Value>) {
    (true, vec![Value::primitive(p.clone())])
}

pub fn rewrite_xor(p: &Primitive) -> (bool, Vec<Value>) {
    if p.arguments.len() < 2 {
        return unchanged(p);
    }
    let operands = flatten_xor_operands(&p.arguments);
    let mut simplified: Vec<Value> = Vec::new();
    for operand in operands {
        if value_is_zero(operand) {
            continue;
        }
        if let Some(pos) = simplified.iter().position(|existing| value_equivalent(existing, operand)) {
            simplified.remove(pos);
        } else {
            simplified.push(operand.clone());
        }
    }
    match simplified.len() {
        0 => (true, vec![value_zero()]),
        1 => (true, vec![simplified.remove(0)]),
        _ => {
            let rewritten = Primitive {
                id: PrimitiveId::Xor,
                arguments: simplified,
                output: p.output,
                check: p.check,
            };
            (true, vec![Value::primitive(rewritten)])
        }
    }
}

pub fn rewrite_scalar_neg(p: &Primitive) -> (bool, Vec<Value>) {
    if p.arguments.len() != 1 {
        return unchanged(p);
    }
    match ScalarExpr::from_value(&p.arguments[0]) {
        Some(expr) => (true, vec![expr.negate().to_value()]),
        None => unchanged(p),
    }
}

pub fn rewrite_scalar_add(p: &Primitive) -> (bool, Vec<Value>) {
    if p.arguments.len() < 2 {
        return unchanged(p);
    }
    let mut sum = ScalarExpr::zero();
    for operand in crate::scalar::flatten_scalar_add_operands(&p.arguments) {
        match ScalarExpr::from_value(operand) {
            Some(expr) => sum = sum.add(&expr),
            None => return unchanged(p),
        }
    }
    (true, vec![sum.normalize().to_value()])
}

pub fn rewrite_pedersen_commit(p: &Primitive) -> (bool, Vec<Value>) {
    if p.arguments.len() != 2 {
        return unchanged(p);
    }
    let Some(v_expr) = ScalarExpr::from_value(&p.arguments[0]) else {
        return unchanged(p);
    };
    let Some(r_expr) = ScalarExpr::from_value(&p.arguments[1]) else {
        return unchanged(p);
    };
    let v_expr = v_expr.normalize();
    let r_expr = r_expr.normalize();
    if v_expr.is_zero() && r_expr.is_zero() {
        return (true, vec![value_zero()]);
    }
    let rewritten = Primitive {
        id: PrimitiveId::PedersenCommit,
        arguments: vec![v_expr.to_value(), r_expr.to_value()],
        output: p.output,
        check: p.check,
    };
    (true, vec![Value::primitive(rewritten)])
}

pub fn rewrite_neg(p: &Primitive) -> (bool, Vec<Value>) {
    if p.arguments.len() != 1 {
        return unchanged(p);
    }
    let arg = &p.arguments[0];
    if value_is_zero(arg) {
        return (true, vec![value_zero()]);
    }
    let Value::Primitive(inner_box) = arg else {
        return unchanged(p);
    };
    let mut inner = (**inner_box).clone();
    if inner.id == PrimitiveId::GroupAdd {
        let (_, rewritten) = rewrite_group_add(&inner);
        if rewritten.len() != 1 {
            return unchanged(p);
        }
        if value_is_zero(&rewritten[0]) {
            return (true, vec![value_zero()]);
        }
        let Value::Primitive(next) = &rewritten[0] else {
            return unchanged(p);
        };
        inner = (**next).clone();
    }
    match inner.id {
        PrimitiveId::Neg => {
            if inner.arguments.len() != 1 {
                return unchanged(p);
            }
            (true, vec![inner.arguments[0].clone()])
        }
        PrimitiveId::PedersenCommit => {
            if inner.arguments.len() != 2 {
                return unchanged(p);
            }
            let Some(v_expr) = ScalarExpr::from_value(&inner.arguments[0]) else {
                return unchanged(p);
            };
            let Some(r_expr) = ScalarExpr::from_value(&inner.arguments[1]) else {
                return unchanged(p);
            };
            let neg = Primitive {
                id: PrimitiveId::PedersenCommit,
                arguments: vec![v_expr.negate().to_value(), r_expr.negate().to_value()],
                output: inner.output,
                check: inner.check,
            };
            rewrite_pedersen_commit(&neg)
        }
        _ => unchanged(p),
    }
}

pub fn rewrite_group_add(p: &Primitive) -> (bool, Vec<Value>) {
    if p.arguments.len() != 2 {
        return unchanged(p);
    }
    let operands = flatten_group_add_operands(&p.arguments);
    let mut sum_v = ScalarExpr::zero();
    let mut sum_r = ScalarExpr::zero();
    let mut all_generator = true;

    for operand in operands {
        if value_is_zero(operand) {
            continue;
        }
        let mut generator_only = false;
        let mut resolved = operand.clone();
        let initial_prim: Option<Primitive> = match &resolved {
            Value::Primitive(prim_box) => Some((**prim_box).clone()),
            _ => None,
        };

        if let Some(mut prim) = initial_prim {
            if prim.id == PrimitiveId::Neg {
                let (_, rewritten) = rewrite_neg(&prim);
                if rewritten.len() != 1 {
                    return unchanged(p);
                }
                if value_is_zero(&rewritten[0]) {
                    continue;
                }
                let Value::Primitive(next) = &rewritten[0] else {
                    return unchanged(p);
                };
                prim = (**next).clone();
                resolved = Value::primitive(prim.clone());
            }
            if prim.id == PrimitiveId::PedersenCommit {
                if prim.arguments.len() != 2 {
                    return unchanged(p);
                }
                let Some(v_expr) = ScalarExpr::from_value(&prim.arguments[0]) else {
                    return unchanged(p);
                };
                let Some(r_expr) = ScalarExpr::from_value(&prim.arguments[1]) else {
                    return unchanged(p);
                };
                sum_v = sum_v.add(&v_expr);
                sum_r = sum_r.add(&r_expr);
                all_generator = false;
                continue;
            }
        }

        match &resolved {
            Value::Equation(eq) => {
                let flat = value_flatten_equation(eq);
                if flat.values.len() == 2 && value_equivalent(&flat.values[0], &value_g()) {
                    let Some(v_expr) = ScalarExpr::from_value(&flat.values[1]) else {
                        return unchanged(p);
                    };
                    sum_v = sum_v.add(&v_expr);
                    generator_only = true;
                } else {
                    return unchanged(p);
                }
            }
            Value::Primitive(_) => {}
            Value::Constant(_) => return unchanged(p),
        }
        all_generator = all_generator && generator_only;
    }

    sum_v = sum_v.normalize();
    sum_r = sum_r.normalize();
    if sum_v.is_zero() && sum_r.is_zero() {
        return (true, vec![value_zero()]);
    }
    if all_generator && sum_r.is_zero() {
        let combined = Value::equation(crate::value::Equation {
            values: vec![value_g(), sum_v.to_value()],
        });
        return (true, vec![combined]);
    }
    let combined = Primitive {
        id: PrimitiveId::PedersenCommit,
        arguments: vec![sum_v.to_value(), sum_r.to_value()],
        output: p.output,
        check: p.check,
    };
    rewrite_pedersen_commit(&combined)
}

pub fn flatten_group_add_operands(args: &[Value]) -> Vec<&Value> {
    let mut operands = Vec::with_capacity(args.len());
    for arg in args {
        if let Value::Primitive(p) = arg {
            if p.id == PrimitiveId::GroupAdd && p.arguments.len() == 2 {
                operands.extend(flatten_group_add_operands(&p.arguments));
                continue;
            }
        }
        operands.push(arg);
    }
    operands
}

pub fn flatten_xor_operands(args: &[Value]) -> Vec<&Value> {
    let mut operands = Vec::with_capacity(args.len());
    for arg in args {
        if let Value::Primitive(p) = arg {
            if p.id == PrimitiveId::Xor && p.arguments.len() >= 2 {
                operands.extend(flatten_xor_operands(&p.arguments));
                continue;
            }
        }
        operands.push(arg);
    }
    operands
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interning::reset_for_test;
    use crate::value::{Constant, Declaration, Equation, Qualifier};

    fn var(name: &str) -> Value {
        Value::constant(Constant::new(name, Declaration::Generates, Qualifier::Private))
    }

    #[test]
    fn xor_cancels_repeated_operand() {
        reset_for_test();
        let a = var("a");
        let p = Primitive::new(PrimitiveId::Xor, vec![a.clone(), a]);
        let (_, out) = rewrite_xor(&p);
        assert_eq!(out, vec![value_zero()]);
    }

    #[test]
    fn xor_of_distinct_values_keeps_both() {
        reset_for_test();
        let a = var("a");
        let b = var("b");
        let p = Primitive::new(PrimitiveId::Xor, vec![a, b]);
        let (_, out) = rewrite_xor(&p);
        assert_eq!(out.len(), 1);
        assert!(out[0].is_primitive_id(PrimitiveId::Xor));
    }

    #[test]
    fn scalar_neg_double_negation_cancels() {
        reset_for_test();
        let a = var("a");
        let once = Primitive::new(PrimitiveId::ScalarNeg, vec![a]);
        let (_, out) = rewrite_scalar_neg(&once);
        let twice = Primitive::new(PrimitiveId::ScalarNeg, vec![out[0].clone()]);
        let (_, out2) = rewrite_scalar_neg(&twice);
        assert_eq!(out2[0].as_constant().unwrap().name, "a");
    }

    #[test]
    fn neg_double_negation_unwraps() {
        reset_for_test();
        let a = var("a");
        let inner = Primitive::new(PrimitiveId::Neg, vec![a.clone()]);
        let outer = Primitive::new(PrimitiveId::Neg, vec![Value::primitive(inner)]);
        let (_, out) = rewrite_neg(&outer);
        assert_eq!(out[0], a);
    }

    #[test]
    fn group_addition_rewrites_to_generator_equation() {
        reset_for_test();
        let a = var("a");
        let b = var("b");
        let ga = Value::equation(Equation {
            values: vec![value_g(), a],
        });
        let gb = Value::equation(Equation {
            values: vec![value_g(), b],
        });
        let p = Primitive::new(PrimitiveId::GroupAdd, vec![ga, gb]);
        let (_, out) = rewrite_group_add(&p);
        assert_eq!(out.len(), 1);
        assert!(matches!(out[0], Value::Equation(_)));
    }

    #[test]
    fn group_addition_of_a_pedersen_commitment_and_its_negation_is_zero() {
        reset_for_test();
        let a = var("a");
        let r = var("r");
        let commit = Primitive::new(PrimitiveId::PedersenCommit, vec![a, r]);
        let neg_commit = Primitive::new(PrimitiveId::Neg, vec![Value::primitive(commit.clone())]);
        let p = Primitive::new(
            PrimitiveId::GroupAdd,
            vec![Value::primitive(commit), Value::primitive(neg_commit)],
        );
        let (_, out) = rewrite_group_add(&p);
        assert_eq!(out, vec![value_zero()]);
    }

    #[test]
    fn pedersen_commit_of_zero_and_zero_is_zero() {
        reset_for_test();
        let p = Primitive::new(PrimitiveId::PedersenCommit, vec![value_zero(), value_zero()]);
        let (_, out) = rewrite_pedersen_commit(&p);
        assert_eq!(out, vec![value_zero()]);
    }
}
