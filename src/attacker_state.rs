//! Process-wide attacker knowledge.
//!
//! Everything the (possibly active) attacker has learned lives behind one
//! `parking_lot::Mutex`, guarding a monotonic log of learned values paired
//! with the principal-state snapshot that produced each one. `_locked`
//! helpers assume the caller already holds the lock; public entry points
//! take it themselves.

use once_cell::sync::Lazy;
use parking_lot::Mutex;

use tracing::{info, instrument};

use crate::equivalence::value_equivalent;
use crate::errors::InternalError;
use crate::knowledge_map::KnowledgeMap;
use crate::principal_state::{construct_principal_state_clone, PrincipalState};
use crate::value::{value_flatten_equation, value_g, Qualifier, Value};

const LOG_TARGET: &str = "protologic::attacker_state";

#[derive(Debug, Clone)]
pub struct AttackerState {
    pub active: bool,
    pub quantum: bool,
    pub current_phase: i64,
    pub exhausted: bool,
    pub known: Vec<Value>,
    pub principal_state: Vec<PrincipalState>,
}

impl AttackerState {
    fn fresh(active: bool, quantum: bool) -> Self {
        AttackerState {
            active,
            quantum,
            current_phase: 0,
            exhausted: false,
            known: Vec::new(),
            principal_state: Vec::new(),
        }
    }
}

static ATTACKER_STATE: Lazy<Mutex<AttackerState>> = Lazy::new(|| Mutex::new(AttackerState::fresh(false, false)));

pub fn init(active: bool) {
    init_quantum(active, false);
}

pub fn init_quantum(active: bool, quantum: bool) {
    *ATTACKER_STATE.lock() = AttackerState::fresh(active, quantum);
}

fn value_equivalent_in(v: &Value, values: &[Value]) -> Option<usize> {
    values.iter().position(|existing| value_equivalent(existing, v))
}

fn put_known_locked(state: &mut AttackerState, known: &Value, principal_state: &PrincipalState) -> bool {
    if value_equivalent_in(known, &state.known).is_some() {
        return false;
    }
    let clone = construct_principal_state_clone(principal_state, false);
    state.known.push(known.clone());
    state.principal_state.push(clone);
    if state.quantum {
        quantum_absorb_locked(state, known, principal_state);
    }
    true
}

fn quantum_absorb_locked(state: &mut AttackerState, known: &Value, principal_state: &PrincipalState) {
    let Value::Equation(eq) = known else {
        return;
    };
    let flat = value_flatten_equation(eq);
    if flat.values.len() < 2 || !value_equivalent(&flat.values[0], &value_g()) {
        return;
    }
    for exponent in &flat.values[1..] {
        put_known_locked(state, exponent, principal_state);
    }
}

fn min_int_in_slice(values: &[i64]) -> Option<i64> {
    values.iter().copied().min()
}

/// Whether `constant` appears anywhere inside another constant's assigned
/// value tree in the knowledge map — i.e. whether some principal's
/// derivation actually depends on it, as opposed to it merely being
/// declared and never used.
fn value_constant_is_used_by_at_least_one_principal(km: &KnowledgeMap, constant_id: crate::value::ConstantId) -> bool {
    fn references(v: &Value, id: crate::value::ConstantId) -> bool {
        match v {
            Value::Constant(c) => c.id == id,
            Value::Primitive(p) => p.arguments.iter().any(|a| references(a, id)),
            Value::Equation(eq) => eq.values.iter().any(|a| references(a, id)),
        }
    }
    km.assigned.iter().enumerate().any(|(i, v)| km.constants[i].id != constant_id && references(v, constant_id))
}

#[instrument(target = "protologic::attacker_state", skip(km, principal_state))]
pub fn absorb_phase_values(km: &KnowledgeMap, principal_state: &PrincipalState) -> Result<(), InternalError> {
    let mut state = ATTACKER_STATE.lock();
    let current_phase = state.current_phase;

    for i in 0..principal_state.constants.len() {
        if let Value::Constant(c) = &principal_state.assigned[i] {
            if c.qualifier != Qualifier::Public {
                continue;
            }
            if let Some(earliest) = min_int_in_slice(&principal_state.phase[i]) {
                if earliest > current_phase {
                    continue;
                }
            }
            if !value_constant_is_used_by_at_least_one_principal(km, c.id) {
                continue;
            }
            let assigned = principal_state.assigned[i].clone();
            put_known_locked(&mut state, &assigned, principal_state);
        }
    }

    for i in 0..principal_state.constants.len() {
        let c = &principal_state.constants[i];
        let cc = Value::constant(c.clone());
        let a = principal_state.assigned[i].clone();
        if principal_state.wire[i].is_empty() && !c.leaked {
            continue;
        }
        if c.qualifier == Qualifier::Public {
            continue;
        }
        let Some(earliest) = min_int_in_slice(&principal_state.phase[i]) else {
            return Err(InternalError::IndexOutOfBounds(i));
        };
        if earliest > current_phase {
            continue;
        }
        put_known_locked(&mut state, &cc, principal_state);
        put_known_locked(&mut state, &a, principal_state);
    }
    info!(target: LOG_TARGET, known_count = state.known.len(), "absorbed phase values");
    Ok(())
}

pub fn get_read() -> AttackerState {
    ATTACKER_STATE.lock().clone()
}

pub fn get_exhausted() -> bool {
    ATTACKER_STATE.lock().exhausted
}

pub fn put_write(known: &Value, principal_state: &PrincipalState) -> bool {
    let mut state = ATTACKER_STATE.lock();
    put_known_locked(&mut state, known, principal_state)
}

pub fn put_phase_update(km: &KnowledgeMap, principal_state: &PrincipalState, phase: i64) -> Result<(), InternalError> {
    ATTACKER_STATE.lock().current_phase = phase;
    absorb_phase_values(km, principal_state)
}

pub fn put_exhausted() -> bool {
    ATTACKER_STATE.lock().exhausted = true;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interning::{intern_principal_name, reset_for_test};
    use crate::value::{Constant, Declaration};

    fn dummy_principal_state(id: u64) -> PrincipalState {
        PrincipalState {
            name: "Alice".into(),
            id,
            constants: vec![],
            assigned: vec![],
            guard: vec![],
            known: vec![],
            wire: vec![],
            known_by: vec![],
            declared_at: vec![],
            max_declared_at: 0,
            creator: vec![],
            sender: vec![],
            rewritten: vec![],
            before_rewrite: vec![],
            mutated: vec![],
            mutatable_to: vec![],
            before_mutate: vec![],
            phase: vec![],
        }
    }

    #[test]
    fn put_known_is_idempotent() {
        reset_for_test();
        init(true);
        let alice = intern_principal_name("Alice");
        let state = dummy_principal_state(alice);
        let v = Value::constant(Constant::new("a", Declaration::Generates, Qualifier::Private));
        assert!(put_write(&v, &state));
        assert!(!put_write(&v, &state));
        assert_eq!(get_read().known.len(), 1);
    }

    #[test]
    fn exhausted_flag_is_one_way() {
        reset_for_test();
        init(true);
        assert!(!get_exhausted());
        put_exhausted();
        assert!(get_exhausted());
    }

    #[test]
    fn quantum_mode_absorbs_generator_exponent() {
        reset_for_test();
        init_quantum(true, true);
        let alice = intern_principal_name("Alice");
        let state = dummy_principal_state(alice);
        let exponent = Value::constant(Constant::new("a", Declaration::Generates, Qualifier::Private));
        let eq = Value::equation(crate::value::Equation {
            values: vec![value_g(), exponent.clone()],
        });
        put_write(&eq, &state);
        let known = get_read().known;
        assert!(known.iter().any(|v| value_equivalent(v, &exponent)));
    }
}
