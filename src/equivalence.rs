//! Structural equivalence between values, independent of term identity.
//!
//! Two equations are equivalent if they carry the same multiset of exponent
//! values regardless of order (`g^a^b == g^b^a`); everything else compares
//! structurally.

use crate::value::{Equation, Primitive, Value};

pub fn value_equivalent(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Constant(ca), Value::Constant(cb)) => ca.id == cb.id,
        (Value::Primitive(pa), Value::Primitive(pb)) => primitive_equivalent(pa, pb),
        (Value::Equation(ea), Value::Equation(eb)) => equation_equivalent(ea, eb),
        _ => false,
    }
}

fn primitive_equivalent(a: &Primitive, b: &Primitive) -> bool {
    if a.id != b.id || a.arguments.len() != b.arguments.len() {
        return false;
    }
    a.arguments
        .iter()
        .zip(b.arguments.iter())
        .all(|(x, y)| value_equivalent(x, y))
}

fn equation_equivalent(a: &Equation, b: &Equation) -> bool {
    if a.values.len() != b.values.len() {
        return false;
    }
    let mut remaining: Vec<&Value> = b.values.iter().collect();
    for va in &a.values {
        let pos = remaining.iter().position(|vb| value_equivalent(va, vb));
        match pos {
            Some(i) => {
                remaining.remove(i);
            }
            None => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interning::reset_for_test;
    use crate::value::{value_g, Constant, Declaration, Qualifier};

    #[test]
    fn equations_are_equivalent_regardless_of_exponent_order() {
        reset_for_test();
        let a = Value::constant(Constant::new("a", Declaration::Generates, Qualifier::Private));
        let b = Value::constant(Constant::new("b", Declaration::Generates, Qualifier::Private));
        let e1 = Value::equation(Equation {
            values: vec![value_g(), a.clone(), b.clone()],
        });
        let e2 = Value::equation(Equation {
            values: vec![value_g(), b, a],
        });
        assert!(value_equivalent(&e1, &e2));
    }

    #[test]
    fn distinct_constants_are_not_equivalent() {
        reset_for_test();
        let a = Value::constant(Constant::new("a", Declaration::Generates, Qualifier::Private));
        let b = Value::constant(Constant::new("b", Declaration::Generates, Qualifier::Private));
        assert!(!value_equivalent(&a, &b));
    }
}
