//! Static primitive rule tables.
//!
//! Every primitive beyond the three core ones (`ASSERT`/`CONCAT`/`SPLIT`) is
//! described declaratively here: its arity, its output count, and up to four
//! optional rules (decompose, recompose, rewrite, rebuild) that the fixed-
//! point deduction loop in the host analysis consults to see what an
//! attacker who holds some of a primitive's arguments can learn, or what one
//! primitive application can be rewritten into given another. Rules are
//! plain `fn` pointers rather than boxed closures: nothing here captures
//! state, so a vtable only costs indirection we don't need.

use crate::equivalence::value_equivalent;
use crate::value::{value_g, value_nil, Equation, Primitive, PrimitiveId, Value};

pub struct PrimitiveCoreSpec {
    pub id: PrimitiveId,
    pub arity: &'static [usize],
    pub output: &'static [usize],
    pub core_rule: Option<fn(&Primitive) -> (bool, Vec<Value>)>,
    pub check: bool,
    pub explosive: bool,
}

#[derive(Clone, Copy)]
pub struct DecomposeRule {
    pub given: &'static [usize],
    pub reveal: usize,
    pub filter: fn(&Primitive, &Value, usize) -> (Value, bool),
}

#[derive(Clone, Copy)]
pub struct RecomposeRule {
    pub given: &'static [&'static [usize]],
    pub reveal: usize,
    pub filter: fn(&Primitive, &Value, usize) -> (Value, bool),
}

#[derive(Clone, Copy)]
pub struct RewriteRule {
    pub id: PrimitiveId,
    pub from: usize,
    pub to: fn(&Primitive) -> Value,
    pub matching: &'static [(usize, &'static [usize])],
    pub filter: fn(&Primitive, &Value, usize) -> (Value, bool),
}

#[derive(Clone, Copy)]
pub struct RebuildRule {
    pub id: PrimitiveId,
    pub given: &'static [&'static [usize]],
    pub reveal: usize,
    pub filter: fn(&Primitive, &Value, usize) -> (Value, bool),
}

pub struct PrimitiveSpec {
    pub id: PrimitiveId,
    pub arity: &'static [usize],
    pub output: &'static [usize],
    pub decompose: Option<DecomposeRule>,
    pub recompose: Option<RecomposeRule>,
    pub rewrite: Option<RewriteRule>,
    pub rebuild: Option<RebuildRule>,
    pub check: bool,
    pub explosive: bool,
    pub password_hashing: &'static [usize],
}

fn filter_pass(_p: &Primitive, x: &Value, _i: usize) -> (Value, bool) {
    (x.clone(), true)
}

fn filter_reject(_p: &Primitive, x: &Value, _i: usize) -> (Value, bool) {
    (x.clone(), false)
}

fn core_rule_assert(p: &Primitive) -> (bool, Vec<Value>) {
    let v = vec![Value::primitive(p.clone())];
    if value_equivalent(&p.arguments[0], &p.arguments[1]) {
        (true, v)
    } else {
        (false, v)
    }
}

fn core_rule_split(p: &Primitive) -> (bool, Vec<Value>) {
    let v = vec![Value::primitive(p.clone())];
    match &p.arguments[0] {
        Value::Primitive(inner) if inner.id == PrimitiveId::Concat => (true, inner.arguments.clone()),
        _ => (false, v),
    }
}

pub static PRIMITIVE_CORE_SPECS: &[PrimitiveCoreSpec] = &[
    PrimitiveCoreSpec {
        id: PrimitiveId::Assert,
        arity: &[2],
        output: &[1],
        core_rule: Some(core_rule_assert),
        check: true,
        explosive: false,
    },
    PrimitiveCoreSpec {
        id: PrimitiveId::Concat,
        arity: &[2, 3, 4, 5],
        output: &[1],
        core_rule: None,
        check: false,
        explosive: true,
    },
    PrimitiveCoreSpec {
        id: PrimitiveId::Split,
        arity: &[1],
        output: &[1, 2, 3, 4, 5],
        core_rule: Some(core_rule_split),
        check: true,
        explosive: false,
    },
];

// --- AEAD_DEC rewrites into AEAD_ENC's plaintext argument -----------------

fn rewrite_to_aead_enc_plaintext(p: &Primitive) -> Value {
    p.arguments[1].clone()
}

fn filter_aead_dec_rewrite(_p: &Primitive, x: &Value, i: usize) -> (Value, bool) {
    match i {
        0 | 2 => (x.clone(), true),
        _ => (x.clone(), false),
    }
}

// --- DEC rewrites into ENC's plaintext argument ---------------------------

fn rewrite_to_enc_plaintext(p: &Primitive) -> Value {
    p.arguments[1].clone()
}

fn filter_dec_rewrite(_p: &Primitive, x: &Value, i: usize) -> (Value, bool) {
    match i {
        0 => (x.clone(), true),
        _ => (x.clone(), false),
    }
}

// --- SIGNVERIF rewrites into nil given a matching SIGN --------------------

fn rewrite_to_nil(_p: &Primitive) -> Value {
    value_nil()
}

fn filter_signverif_rewrite(_p: &Primitive, x: &Value, i: usize) -> (Value, bool) {
    match i {
        0 => match x {
            Value::Equation(eq) if eq.values.len() == 2 && value_equivalent(&eq.values[0], &value_g()) => {
                (eq.values[1].clone(), true)
            }
            _ => (x.clone(), false),
        },
        1 => (x.clone(), true),
        _ => (x.clone(), false),
    }
}

fn filter_pke_enc_decompose(_p: &Primitive, x: &Value, i: usize) -> (Value, bool) {
    match i {
        0 => match x {
            Value::Constant(_) | Value::Primitive(_) => (x.clone(), false),
            Value::Equation(eq) if eq.values.len() == 2 && value_equivalent(&eq.values[0], &value_g()) => {
                (eq.values[1].clone(), true)
            }
            Value::Equation(_) => (x.clone(), false),
        },
        1 => (x.clone(), true),
        _ => (x.clone(), false),
    }
}

fn filter_pke_dec_rewrite(_p: &Primitive, x: &Value, i: usize) -> (Value, bool) {
    match i {
        0 => match x {
            Value::Constant(_) | Value::Primitive(_) => (
                Value::equation(Equation {
                    values: vec![value_g(), x.clone()],
                }),
                true,
            ),
            Value::Equation(_) => (x.clone(), false),
        },
        _ => (x.clone(), false),
    }
}

fn filter_ringsignverif_rewrite(_p: &Primitive, x: &Value, i: usize) -> (Value, bool) {
    match i {
        0 => match x {
            Value::Equation(eq) if eq.values.len() == 2 => (eq.values[1].clone(), true),
            _ => (x.clone(), false),
        },
        1..=4 => (x.clone(), true),
        _ => (x.clone(), false),
    }
}

fn rewrite_ringsign_to_nil(_p: &Primitive) -> Value {
    value_nil()
}

fn rewrite_unblind_to_sign(p: &Primitive) -> Value {
    let inner = p.arguments[1].as_primitive().expect("matched via BLIND shape");
    Value::primitive(Primitive::new(PrimitiveId::Sign, vec![p.arguments[0].clone(), inner.arguments[1].clone()]))
}

fn filter_unblind_rewrite(p: &Primitive, _x: &Value, i: usize) -> (Value, bool) {
    match i {
        1 => {
            let blind = Value::primitive(Primitive::new(
                PrimitiveId::Blind,
                vec![p.arguments[0].clone(), p.arguments[1].clone()],
            ));
            (blind, true)
        }
        _ => (_x.clone(), false),
    }
}

pub static PRIMITIVE_SPECS: &[PrimitiveSpec] = &[
    PrimitiveSpec {
        id: PrimitiveId::PwHash,
        arity: &[1, 2, 3, 4, 5],
        output: &[1],
        decompose: None,
        recompose: None,
        rewrite: None,
        rebuild: None,
        check: false,
        explosive: false,
        password_hashing: &[0, 1, 2, 3, 4],
    },
    PrimitiveSpec {
        id: PrimitiveId::Hash,
        arity: &[1, 2, 3, 4, 5],
        output: &[1],
        decompose: None,
        recompose: None,
        rewrite: None,
        rebuild: None,
        check: false,
        explosive: true,
        password_hashing: &[],
    },
    PrimitiveSpec {
        id: PrimitiveId::Hkdf,
        arity: &[3],
        output: &[1, 2, 3, 4, 5],
        decompose: None,
        recompose: None,
        rewrite: None,
        rebuild: None,
        check: false,
        explosive: true,
        password_hashing: &[],
    },
    PrimitiveSpec {
        id: PrimitiveId::AeadEnc,
        arity: &[3],
        output: &[1],
        decompose: Some(DecomposeRule {
            given: &[0],
            reveal: 1,
            filter: filter_pass,
        }),
        recompose: None,
        rewrite: None,
        rebuild: None,
        check: false,
        explosive: false,
        password_hashing: &[1],
    },
    PrimitiveSpec {
        id: PrimitiveId::AeadDec,
        arity: &[3],
        output: &[1],
        decompose: Some(DecomposeRule {
            given: &[0],
            reveal: 1,
            filter: filter_pass,
        }),
        recompose: None,
        rewrite: Some(RewriteRule {
            id: PrimitiveId::AeadEnc,
            from: 1,
            to: rewrite_to_aead_enc_plaintext,
            matching: &[(0, &[0]), (2, &[2])],
            filter: filter_aead_dec_rewrite,
        }),
        rebuild: None,
        check: true,
        explosive: false,
        password_hashing: &[],
    },
    PrimitiveSpec {
        id: PrimitiveId::Enc,
        arity: &[2],
        output: &[1],
        decompose: Some(DecomposeRule {
            given: &[0],
            reveal: 1,
            filter: filter_pass,
        }),
        recompose: None,
        rewrite: None,
        rebuild: None,
        check: false,
        explosive: false,
        password_hashing: &[1],
    },
    PrimitiveSpec {
        id: PrimitiveId::Dec,
        arity: &[2],
        output: &[1],
        decompose: Some(DecomposeRule {
            given: &[0],
            reveal: 1,
            filter: filter_pass,
        }),
        recompose: None,
        rewrite: Some(RewriteRule {
            id: PrimitiveId::Enc,
            from: 1,
            to: rewrite_to_enc_plaintext,
            matching: &[(0, &[0])],
            filter: filter_dec_rewrite,
        }),
        rebuild: None,
        check: false,
        explosive: false,
        password_hashing: &[],
    },
    PrimitiveSpec {
        id: PrimitiveId::Mac,
        arity: &[2],
        output: &[1],
        decompose: None,
        recompose: None,
        rewrite: None,
        rebuild: None,
        check: false,
        explosive: false,
        password_hashing: &[1],
    },
    PrimitiveSpec {
        id: PrimitiveId::Sign,
        arity: &[2],
        output: &[1],
        decompose: None,
        recompose: None,
        rewrite: None,
        rebuild: None,
        check: false,
        explosive: false,
        password_hashing: &[1],
    },
    PrimitiveSpec {
        id: PrimitiveId::SignVerif,
        arity: &[3],
        output: &[1],
        decompose: None,
        recompose: None,
        rewrite: Some(RewriteRule {
            id: PrimitiveId::Sign,
            from: 2,
            to: rewrite_to_nil,
            matching: &[(0, &[0]), (1, &[1])],
            filter: filter_signverif_rewrite,
        }),
        rebuild: None,
        check: true,
        explosive: false,
        password_hashing: &[],
    },
    PrimitiveSpec {
        id: PrimitiveId::PkeEnc,
        arity: &[2],
        output: &[1],
        decompose: Some(DecomposeRule {
            given: &[0],
            reveal: 1,
            filter: filter_pke_enc_decompose,
        }),
        recompose: None,
        rewrite: None,
        rebuild: None,
        check: false,
        explosive: false,
        password_hashing: &[1],
    },
    PrimitiveSpec {
        id: PrimitiveId::PkeDec,
        arity: &[2],
        output: &[1],
        decompose: Some(DecomposeRule {
            given: &[0],
            reveal: 1,
            filter: filter_pass,
        }),
        recompose: None,
        rewrite: Some(RewriteRule {
            id: PrimitiveId::PkeEnc,
            from: 1,
            to: rewrite_to_enc_plaintext,
            matching: &[(0, &[0])],
            filter: filter_pke_dec_rewrite,
        }),
        rebuild: None,
        check: false,
        explosive: false,
        password_hashing: &[],
    },
    PrimitiveSpec {
        id: PrimitiveId::ShamirSplit,
        arity: &[1],
        output: &[3],
        decompose: None,
        recompose: Some(RecomposeRule {
            given: &[&[0, 1], &[0, 2], &[1, 2]],
            reveal: 0,
            filter: filter_pass,
        }),
        rewrite: None,
        rebuild: None,
        check: false,
        explosive: false,
        password_hashing: &[],
    },
    PrimitiveSpec {
        id: PrimitiveId::ShamirJoin,
        arity: &[2],
        output: &[1],
        decompose: None,
        recompose: None,
        rewrite: None,
        rebuild: Some(RebuildRule {
            id: PrimitiveId::ShamirSplit,
            given: &[&[0, 1], &[1, 0], &[0, 2], &[2, 0], &[1, 2], &[2, 1]],
            reveal: 0,
            filter: filter_pass,
        }),
        check: false,
        explosive: false,
        password_hashing: &[],
    },
    PrimitiveSpec {
        id: PrimitiveId::RingSign,
        arity: &[4],
        output: &[1],
        decompose: None,
        recompose: None,
        rewrite: None,
        rebuild: None,
        check: false,
        explosive: false,
        password_hashing: &[3],
    },
    PrimitiveSpec {
        id: PrimitiveId::RingSignVerif,
        arity: &[5],
        output: &[1],
        decompose: None,
        recompose: None,
        rewrite: Some(RewriteRule {
            id: PrimitiveId::RingSign,
            from: 4,
            to: rewrite_ringsign_to_nil,
            matching: &[(0, &[0, 1, 2]), (1, &[0, 1, 2]), (2, &[0, 1, 2]), (3, &[3])],
            filter: filter_ringsignverif_rewrite,
        }),
        rebuild: None,
        check: true,
        explosive: false,
        password_hashing: &[],
    },
    PrimitiveSpec {
        id: PrimitiveId::Blind,
        arity: &[2],
        output: &[1],
        decompose: Some(DecomposeRule {
            given: &[0],
            reveal: 1,
            filter: filter_pass,
        }),
        recompose: None,
        rewrite: None,
        rebuild: None,
        check: false,
        explosive: false,
        password_hashing: &[1],
    },
    PrimitiveSpec {
        id: PrimitiveId::Unblind,
        arity: &[3],
        output: &[1],
        decompose: None,
        recompose: None,
        rewrite: Some(RewriteRule {
            id: PrimitiveId::Sign,
            from: 2,
            to: rewrite_unblind_to_sign,
            matching: &[(0, &[1])],
            filter: filter_unblind_rewrite,
        }),
        rebuild: None,
        check: false,
        explosive: false,
        password_hashing: &[],
    },
    PrimitiveSpec {
        id: PrimitiveId::PedersenCommit,
        arity: &[2],
        output: &[1],
        decompose: None,
        recompose: None,
        rewrite: None,
        rebuild: None,
        check: false,
        explosive: false,
        password_hashing: &[],
    },
    PrimitiveSpec {
        id: PrimitiveId::Neg,
        arity: &[1],
        output: &[1],
        decompose: None,
        recompose: None,
        rewrite: None,
        rebuild: None,
        check: false,
        explosive: false,
        password_hashing: &[],
    },
    PrimitiveSpec {
        id: PrimitiveId::GroupAdd,
        arity: &[2],
        output: &[1],
        decompose: None,
        recompose: None,
        rewrite: None,
        rebuild: None,
        check: false,
        explosive: false,
        password_hashing: &[],
    },
    PrimitiveSpec {
        id: PrimitiveId::ScalarNeg,
        arity: &[1],
        output: &[1],
        decompose: None,
        recompose: None,
        rewrite: None,
        rebuild: None,
        check: false,
        explosive: false,
        password_hashing: &[],
    },
    PrimitiveSpec {
        id: PrimitiveId::ScalarAdd,
        arity: &[2, 3, 4, 5],
        output: &[1],
        decompose: None,
        recompose: None,
        rewrite: None,
        rebuild: None,
        check: false,
        explosive: false,
        password_hashing: &[],
    },
    PrimitiveSpec {
        id: PrimitiveId::Xor,
        arity: &[2, 3, 4, 5],
        output: &[1],
        decompose: None,
        recompose: None,
        rewrite: None,
        rebuild: None,
        check: false,
        explosive: false,
        password_hashing: &[],
    },
];

pub fn core_spec(id: PrimitiveId) -> Option<&'static PrimitiveCoreSpec> {
    PRIMITIVE_CORE_SPECS.iter().find(|s| s.id == id)
}

pub fn spec(id: PrimitiveId) -> Option<&'static PrimitiveSpec> {
    PRIMITIVE_SPECS.iter().find(|s| s.id == id)
}

pub fn arity(id: PrimitiveId) -> &'static [usize] {
    if id.is_core() {
        core_spec(id).map(|s| s.arity).unwrap_or(&[])
    } else {
        spec(id).map(|s| s.arity).unwrap_or(&[])
    }
}

pub fn spec_by_name(name: &str) -> Option<PrimitiveId> {
    PRIMITIVE_CORE_SPECS
        .iter()
        .map(|s| s.id)
        .chain(PRIMITIVE_SPECS.iter().map(|s| s.id))
        .find(|id| id.name() == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_specs_cover_assert_concat_split() {
        assert!(core_spec(PrimitiveId::Assert).is_some());
        assert!(core_spec(PrimitiveId::Concat).is_some());
        assert!(core_spec(PrimitiveId::Split).is_some());
    }

    #[test]
    fn non_core_specs_cover_every_remaining_primitive() {
        for id in [
            PrimitiveId::PwHash,
            PrimitiveId::Hash,
            PrimitiveId::GroupAdd,
            PrimitiveId::ScalarAdd,
            PrimitiveId::Xor,
        ] {
            assert!(spec(id).is_some(), "missing spec for {:?}", id);
        }
    }

    #[test]
    fn spec_by_name_finds_core_and_noncore() {
        assert_eq!(spec_by_name("ASSERT"), Some(PrimitiveId::Assert));
        assert_eq!(spec_by_name("GROUPADD"), Some(PrimitiveId::GroupAdd));
        assert_eq!(spec_by_name("NOPE"), None);
    }

    #[test]
    fn dec_rewrites_to_enc_plaintext_given_matching_key() {
        let enc_spec = spec(PrimitiveId::Dec).unwrap().rewrite.unwrap();
        let p = Primitive::new(PrimitiveId::Dec, vec![value_nil(), value_nil()]);
        assert_eq!((enc_spec.to)(&p), p.arguments[1]);
    }

    #[test]
    fn filter_reject_is_available_for_no_rule_paths() {
        let p = Primitive::new(PrimitiveId::Hash, vec![value_nil()]);
        let (v, ok) = filter_reject(&p, &value_nil(), 0);
        assert!(!ok);
        assert_eq!(v, value_nil());
    }
}
