//! Per-principal knowledge projections.
//!
//! A [`crate::knowledge_map::KnowledgeMap`] is a single global index; a
//! `PrincipalState` reprojects it from one principal's point of view, adding
//! the bookkeeping only a single observer needs: which wire a value
//! travelled over, whether its guard makes it immutable to an attacker,
//! whether it's been rewritten or mutated since construction (so a
//! `purify`-ing clone can revert an attacker's tampering).

use crate::knowledge_map::{append_unique_principal_id, KnownByEntry, KnowledgeMap};
use crate::model::{Block, Model};
use crate::value::{Constant, Value};

#[derive(Debug, Clone)]
pub struct PrincipalState {
    pub name: String,
    pub id: u64,
    pub constants: Vec<Constant>,
    pub assigned: Vec<Value>,
    pub guard: Vec<bool>,
    pub known: Vec<bool>,
    pub wire: Vec<Vec<u64>>,
    pub known_by: Vec<Vec<KnownByEntry>>,
    pub declared_at: Vec<i64>,
    pub max_declared_at: i64,
    pub creator: Vec<u64>,
    pub sender: Vec<u64>,
    pub rewritten: Vec<bool>,
    pub before_rewrite: Vec<Value>,
    pub mutated: Vec<bool>,
    pub mutatable_to: Vec<Vec<u64>>,
    pub before_mutate: Vec<Value>,
    pub phase: Vec<Vec<i64>>,
}

pub fn construct_principal_states(model: &Model, km: &KnowledgeMap) -> Vec<PrincipalState> {
    let mut states = Vec::with_capacity(km.principals.len());
    for p in 0..km.principals.len() {
        let principal_id = km.principal_ids[p];
        let mut state = PrincipalState {
            name: km.principals[p].clone(),
            id: principal_id,
            constants: Vec::new(),
            assigned: Vec::new(),
            guard: Vec::new(),
            known: Vec::new(),
            wire: Vec::new(),
            known_by: Vec::new(),
            declared_at: Vec::new(),
            max_declared_at: km.max_declared_at,
            creator: Vec::new(),
            sender: Vec::new(),
            rewritten: Vec::new(),
            before_rewrite: Vec::new(),
            mutated: Vec::new(),
            mutatable_to: Vec::new(),
            before_mutate: Vec::new(),
            phase: Vec::new(),
        };

        for (i, c) in km.constants.iter().enumerate() {
            let mut wire = Vec::new();
            let mut guard = false;
            let mut mutatable_to = Vec::new();
            let mut knows = km.creator[i] == principal_id;
            let mut sender = km.creator[i];

            for m in &km.known_by[i] {
                if let Some(&preceding_sender) = m.get(&principal_id) {
                    sender = preceding_sender;
                    knows = true;
                    break;
                }
            }

            for block in &model.blocks {
                if let Block::Message(msg) = block {
                    for cc in &msg.constants {
                        if c.id != cc.id {
                            continue;
                        }
                        append_unique_principal_id(&mut wire, msg.recipient);
                        let is_recipient = msg.recipient == principal_id;
                        let is_creator = km.creator[i] == principal_id;
                        if !guard {
                            guard = cc.guard && (is_recipient || is_creator);
                        }
                        if !cc.guard {
                            append_unique_principal_id(&mut mutatable_to, msg.recipient);
                        }
                    }
                }
            }

            let assigned = km.assigned[i].clone();
            state.constants.push(c.clone());
            state.assigned.push(assigned.clone());
            state.guard.push(guard);
            state.known.push(knows);
            state.wire.push(wire);
            state.known_by.push(km.known_by[i].clone());
            state.declared_at.push(km.declared_at[i]);
            state.creator.push(km.creator[i]);
            state.sender.push(sender);
            state.rewritten.push(false);
            state.before_rewrite.push(assigned.clone());
            state.mutated.push(false);
            state.mutatable_to.push(mutatable_to);
            state.before_mutate.push(assigned);
            state.phase.push(km.phase[i].clone());
        }

        states.push(state);
    }
    states
}

/// Clones a principal state. `purify: true` resets `Assigned`/
/// `BeforeRewrite` back to `BeforeMutate`, discarding anything an attacker
/// mutated into the value since construction — used when replaying a
/// principal's view without the active attacker's tampering.
pub fn construct_principal_state_clone(state: &PrincipalState, purify: bool) -> PrincipalState {
    let assigned = if purify { state.before_mutate.clone() } else { state.assigned.clone() };
    let before_rewrite = if purify { state.before_mutate.clone() } else { state.before_rewrite.clone() };
    PrincipalState {
        name: state.name.clone(),
        id: state.id,
        constants: state.constants.clone(),
        assigned,
        guard: state.guard.clone(),
        known: state.known.clone(),
        wire: state.wire.clone(),
        known_by: state.known_by.clone(),
        declared_at: state.declared_at.clone(),
        max_declared_at: state.max_declared_at,
        creator: state.creator.clone(),
        sender: state.sender.clone(),
        rewritten: state.rewritten.clone(),
        before_rewrite,
        mutated: state.mutated.clone(),
        mutatable_to: state.mutatable_to.clone(),
        before_mutate: state.before_mutate.clone(),
        phase: state.phase.clone(),
    }
}

impl PrincipalState {
    pub fn index_of(&self, id: crate::value::ConstantId) -> Option<usize> {
        self.constants.iter().position(|c| c.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interning::{intern_principal_name, reset_for_test};
    use crate::knowledge_map::construct_knowledge_map;
    use crate::model::{Expression, MessageBlock, PrincipalBlock};
    use crate::value::{Declaration, Qualifier};

    #[test]
    fn recipient_sees_wire_and_sender_after_message() {
        reset_for_test();
        let alice = intern_principal_name("Alice");
        let bob = intern_principal_name("Bob");
        let c = Constant::new("a", Declaration::Generates, Qualifier::Private);
        let blocks = vec![
            Block::Principal(PrincipalBlock {
                id: alice,
                name: "Alice".into(),
                expressions: vec![Expression::generates(vec![c.clone()])],
            }),
            Block::Message(MessageBlock {
                sender: alice,
                recipient: bob,
                constants: vec![c.clone()],
            }),
        ];
        let model = Model { blocks };
        let km = construct_knowledge_map(&model, vec!["Alice".into(), "Bob".into()], vec![alice, bob]).unwrap();
        let states = construct_principal_states(&model, &km);
        let bob_state = &states[1];
        let idx = bob_state.index_of(c.id).unwrap();
        assert!(bob_state.known[idx]);
        assert_eq!(bob_state.sender[idx], alice);
    }

    #[test]
    fn purify_discards_attacker_mutation() {
        reset_for_test();
        let alice = intern_principal_name("Alice");
        let c = Constant::new("a", Declaration::Generates, Qualifier::Private);
        let blocks = vec![Block::Principal(PrincipalBlock {
            id: alice,
            name: "Alice".into(),
            expressions: vec![Expression::generates(vec![c.clone()])],
        })];
        let model = Model { blocks };
        let km = construct_knowledge_map(&model, vec!["Alice".into()], vec![alice]).unwrap();
        let mut states = construct_principal_states(&model, &km);
        let idx = states[0].index_of(c.id).unwrap();
        let original = states[0].before_mutate[idx].clone();
        states[0].assigned[idx] = Value::constant(Constant::new("mutated", Declaration::Generates, Qualifier::Private));
        states[0].mutated[idx] = true;

        let purified = construct_principal_state_clone(&states[0], true);
        assert_eq!(purified.assigned[idx], original);
    }
}
