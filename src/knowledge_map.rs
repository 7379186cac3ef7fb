//! Global knowledge map construction.
//!
//! The knowledge map is a parallel-array index over every constant a model
//! declares: who created it, which principals have learned it and from
//! whom, which declaration step and protocol phase introduced it. It's
//! built once per model, in source order, and every later stage
//! (per-principal projections, attacker-state seeding) reads from it rather
//! than re-walking the model tree.

use std::collections::HashMap;

use tracing::{instrument, warn};

use crate::errors::ModelingError;
use crate::interning::attacker_principal_id;
use crate::model::{Block, Expression, ExpressionKind, Model};
use crate::pretty::pretty_constant;
use crate::registry;
use crate::value::{
    value_deep_copy, value_g, value_nil, value_zero, Constant, ConstantId, Declaration, Primitive, Qualifier, Value,
};

const LOG_TARGET: &str = "protologic::knowledge_map";

/// `KnownBy[i]` entries map a learner's principal id to the principal id
/// they learned the constant *from* (the sender on a message, or the
/// learner itself for a direct `knows`/`generates`).
pub type KnownByEntry = HashMap<u64, u64>;

#[derive(Debug, Clone)]
pub struct KnowledgeMap {
    pub principals: Vec<String>,
    pub principal_ids: Vec<u64>,
    pub constants: Vec<Constant>,
    pub assigned: Vec<Value>,
    pub creator: Vec<u64>,
    pub known_by: Vec<Vec<KnownByEntry>>,
    pub declared_at: Vec<i64>,
    pub max_declared_at: i64,
    pub phase: Vec<Vec<i64>>,
    pub max_phase: i64,
}

impl KnowledgeMap {
    pub fn index_of(&self, id: ConstantId) -> Option<usize> {
        self.constants.iter().position(|c| c.id == id)
    }

    pub fn is_known_to(&self, index: usize, principal: u64) -> bool {
        if self.creator[index] == principal {
            return true;
        }
        self.known_by[index].iter().any(|m| m.contains_key(&principal))
    }
}

fn append_unique_int(v: &mut Vec<i64>, value: i64) {
    if !v.contains(&value) {
        v.push(value);
    }
}

pub fn append_unique_principal_id(v: &mut Vec<u64>, value: u64) {
    if !v.contains(&value) {
        v.push(value);
    }
}

#[instrument(target = "protologic::knowledge_map", skip(model, principals, principal_ids))]
pub fn construct_knowledge_map(
    model: &Model,
    principals: Vec<String>,
    principal_ids: Vec<u64>,
) -> Result<KnowledgeMap, ModelingError> {
    let mut km = KnowledgeMap {
        principals,
        principal_ids,
        constants: Vec::new(),
        assigned: Vec::new(),
        creator: Vec::new(),
        known_by: Vec::new(),
        declared_at: Vec::new(),
        max_declared_at: 0,
        phase: Vec::new(),
        max_phase: 0,
    };

    let attacker = attacker_principal_id();
    seed_distinguished_constant(&mut km, value_g(), attacker);
    seed_distinguished_constant(&mut km, value_nil(), attacker);
    seed_distinguished_constant(&mut km, value_zero(), attacker);

    let mut declared_at: i64 = 0;
    let mut current_phase: i64 = 0;

    for block in &model.blocks {
        match block {
            Block::Principal(p) => {
                for expr in &p.expressions {
                    match expr.kind {
                        ExpressionKind::Knows => render_knows(&mut km, p.id, &p.name, declared_at, expr)?,
                        ExpressionKind::Generates => render_generates(&mut km, p.id, declared_at, expr)?,
                        ExpressionKind::Assignment => render_assignment(&mut km, p.id, &p.name, declared_at, expr)?,
                        ExpressionKind::Leaks => {
                            declared_at += 1;
                            render_leaks(&mut km, p.id, &p.name, expr, current_phase)?;
                        }
                    }
                }
            }
            Block::Message(msg) => {
                declared_at += 1;
                km.max_declared_at = declared_at;
                render_message(&mut km, msg, current_phase)?;
            }
            Block::Phase(ph) => current_phase = ph.number,
        }
    }
    km.max_phase = current_phase;
    Ok(km)
}

fn seed_distinguished_constant(km: &mut KnowledgeMap, v: Value, attacker: u64) {
    let c = v.as_constant().expect("distinguished values are constants").clone();
    km.constants.push(c);
    km.assigned.push(v);
    km.creator.push(attacker);
    let mut known_by = Vec::new();
    for &pid in &km.principal_ids {
        let mut m = HashMap::new();
        m.insert(pid, pid);
        known_by.push(m);
    }
    km.known_by.push(known_by);
    km.declared_at.push(0);
    km.phase.push(vec![0]);
}

fn render_knows(
    km: &mut KnowledgeMap,
    principal: u64,
    principal_name: &str,
    declared_at: i64,
    expr: &Expression,
) -> Result<(), ModelingError> {
    for c in &expr.constants {
        if let Some(i) = km.index_of(c.id) {
            let same_shape =
                km.constants[i].declaration == Declaration::Knows && km.constants[i].qualifier == expr.qualifier && !km.constants[i].fresh;
            if !same_shape {
                return Err(ModelingError::ConflictingKnows(principal_name.to_string(), pretty_constant(c)));
            }
            km.known_by[i].push(HashMap::from([(principal, principal)]));
            continue;
        }
        let mut new_c = c.clone();
        new_c.fresh = false;
        new_c.leaked = false;
        new_c.declaration = Declaration::Knows;
        new_c.qualifier = expr.qualifier;
        km.constants.push(new_c.clone());
        km.assigned.push(Value::constant(new_c));
        km.creator.push(principal);
        km.known_by.push(Vec::new());
        km.declared_at.push(declared_at);
        km.phase.push(Vec::new());
        let idx = km.constants.len() - 1;
        if expr.qualifier == Qualifier::Public {
            for &pid in &km.principal_ids.clone() {
                if pid != principal {
                    km.known_by[idx].push(HashMap::from([(pid, pid)]));
                }
            }
        }
    }
    Ok(())
}

fn render_generates(km: &mut KnowledgeMap, principal: u64, declared_at: i64, expr: &Expression) -> Result<(), ModelingError> {
    for c in &expr.constants {
        if km.index_of(c.id).is_some() {
            return Err(ModelingError::DuplicateGenerates(pretty_constant(c)));
        }
        let mut new_c = c.clone();
        new_c.fresh = true;
        new_c.leaked = false;
        new_c.declaration = Declaration::Generates;
        new_c.qualifier = Qualifier::Private;
        km.constants.push(new_c.clone());
        km.assigned.push(Value::constant(new_c));
        km.creator.push(principal);
        km.known_by.push(vec![HashMap::new()]);
        km.declared_at.push(declared_at);
        km.phase.push(Vec::new());
    }
    Ok(())
}

/// Walks an assigned value tree collecting every constant it references, so
/// callers can check that each was already known before use.
fn sanity_assignment_constants(v: &Value, out: &mut Vec<Constant>) {
    match v {
        Value::Constant(c) => out.push(c.clone()),
        Value::Primitive(p) => {
            for arg in &p.arguments {
                sanity_assignment_constants(arg, out);
            }
        }
        Value::Equation(eq) => {
            for val in &eq.values {
                sanity_assignment_constants(val, out);
            }
        }
    }
}

fn sanity_primitive(p: &Primitive, outputs: &[Constant]) -> Result<(), ModelingError> {
    let arity = registry::arity(p.id);
    if !arity.contains(&p.arguments.len()) {
        return Err(ModelingError::PrimitiveArity(p.id.name().to_string(), arity.first().copied().unwrap_or(0), p.arguments.len()));
    }
    let output = if p.id.is_core() {
        registry::core_spec(p.id).map(|s| s.output)
    } else {
        registry::spec(p.id).map(|s| s.output)
    }
    .unwrap_or(&[]);
    if !output.contains(&outputs.len()) {
        return Err(ModelingError::PrimitiveArity(
            format!("{} output", p.id.name()),
            output.first().copied().unwrap_or(0),
            outputs.len(),
        ));
    }
    Ok(())
}

fn render_assignment(
    km: &mut KnowledgeMap,
    principal: u64,
    principal_name: &str,
    declared_at: i64,
    expr: &Expression,
) -> Result<(), ModelingError> {
    let assigned = expr.assigned.as_ref().expect("assignment expression carries a value");

    let mut referenced = Vec::new();
    sanity_assignment_constants(assigned, &mut referenced);

    if let Value::Primitive(p) = assigned {
        sanity_primitive(p, &expr.constants)?;
    }

    for c in &referenced {
        let Some(i) = km.index_of(c.id) else {
            return Err(ModelingError::UnknownConstant(pretty_constant(c)));
        };
        if !km.is_known_to(i, principal) {
            return Err(ModelingError::UseBeforeKnowledge(pretty_constant(c), principal_name.to_string()));
        }
    }

    for (i, c) in expr.constants.iter().enumerate() {
        if km.index_of(c.id).is_some() {
            return Err(ModelingError::DoubleAssignment(pretty_constant(c)));
        }
        let mut new_c = c.clone();
        new_c.fresh = false;
        new_c.leaked = false;
        new_c.declaration = Declaration::Assignment;
        new_c.qualifier = Qualifier::Private;

        let mut value = value_deep_copy(assigned);
        if let Value::Primitive(p) = &mut value {
            p.output = i;
        }

        km.constants.push(new_c);
        km.assigned.push(value);
        km.creator.push(principal);
        km.known_by.push(vec![HashMap::new()]);
        km.declared_at.push(declared_at);
        km.phase.push(Vec::new());
    }
    Ok(())
}

fn render_leaks(
    km: &mut KnowledgeMap,
    principal: u64,
    principal_name: &str,
    expr: &Expression,
    current_phase: i64,
) -> Result<(), ModelingError> {
    for c in &expr.constants {
        let Some(i) = km.index_of(c.id) else {
            return Err(ModelingError::UnknownConstant(pretty_constant(c)));
        };
        if !km.is_known_to(i, principal) {
            return Err(ModelingError::LeakBeforeKnowledge(pretty_constant(c), principal_name.to_string()));
        }
        km.constants[i].leaked = true;
        append_unique_int(&mut km.phase[i], current_phase);
    }
    Ok(())
}

fn render_message(km: &mut KnowledgeMap, msg: &crate::model::MessageBlock, current_phase: i64) -> Result<(), ModelingError> {
    for c in &msg.constants {
        let Some(i) = km.index_of(c.id) else {
            return Err(ModelingError::UnknownConstant(pretty_constant(c)));
        };
        let sender_knows = km.is_known_to(i, msg.sender);
        let recipient_knows = km.is_known_to(i, msg.recipient);
        if !sender_knows {
            let sender_name = crate::interning::principal_name(msg.sender).unwrap_or_else(|| "?".to_string());
            warn!(target: LOG_TARGET, constant = %pretty_constant(c), sender = %sender_name, "sender does not know constant");
            return Err(ModelingError::SendBeforeKnowledge(pretty_constant(c), sender_name));
        }
        if recipient_knows {
            return Err(ModelingError::ReceiveWithoutSend(pretty_constant(c)));
        }
        km.known_by[i].push(HashMap::from([(msg.recipient, msg.sender)]));
        append_unique_int(&mut km.phase[i], current_phase);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interning::{intern_principal_name, reset_for_test};
    use crate::model::PrincipalBlock;

    fn setup() -> (u64, u64) {
        reset_for_test();
        let alice = intern_principal_name("Alice");
        let bob = intern_principal_name("Bob");
        (alice, bob)
    }

    #[test]
    fn seeds_g_nil_zero_known_to_everyone() {
        let (alice, bob) = setup();
        let model = Model { blocks: vec![] };
        let km = construct_knowledge_map(&model, vec!["Alice".into(), "Bob".into()], vec![alice, bob]).unwrap();
        assert_eq!(km.constants.len(), 3);
        assert!(km.is_known_to(0, alice));
        assert!(km.is_known_to(0, bob));
    }

    #[test]
    fn generates_then_duplicate_generates_errors() {
        let (alice, _bob) = setup();
        let c = Constant::new("a", Declaration::Generates, Qualifier::Private);
        let block = Block::Principal(PrincipalBlock {
            id: alice,
            name: "Alice".into(),
            expressions: vec![Expression::generates(vec![c.clone()]), Expression::generates(vec![c])],
        });
        let model = Model { blocks: vec![block] };
        let err = construct_knowledge_map(&model, vec!["Alice".into()], vec![alice]).unwrap_err();
        assert!(matches!(err, ModelingError::DuplicateGenerates(_)));
    }

    #[test]
    fn assignment_using_unknown_constant_errors() {
        let (alice, _bob) = setup();
        let unknown = Constant::new("x", Declaration::Generates, Qualifier::Private);
        let out = Constant::new("y", Declaration::Assignment, Qualifier::Private);
        let block = Block::Principal(PrincipalBlock {
            id: alice,
            name: "Alice".into(),
            expressions: vec![Expression::assignment(vec![out], Value::constant(unknown))],
        });
        let model = Model { blocks: vec![block] };
        let err = construct_knowledge_map(&model, vec!["Alice".into()], vec![alice]).unwrap_err();
        assert!(matches!(err, ModelingError::UseBeforeKnowledge(_, _)));
    }

    #[test]
    fn message_to_recipient_who_already_knows_errors() {
        let (alice, bob) = setup();
        let c = Constant::new("a", Declaration::Generates, Qualifier::Private);
        let blocks = vec![
            Block::Principal(PrincipalBlock {
                id: alice,
                name: "Alice".into(),
                expressions: vec![Expression::generates(vec![c.clone()])],
            }),
            Block::Principal(PrincipalBlock {
                id: bob,
                name: "Bob".into(),
                expressions: vec![Expression::knows(vec![c.clone()], Qualifier::Public)],
            }),
            Block::Message(crate::model::MessageBlock {
                sender: alice,
                recipient: bob,
                constants: vec![c],
            }),
        ];
        let model = Model { blocks };
        let err = construct_knowledge_map(&model, vec!["Alice".into(), "Bob".into()], vec![alice, bob]).unwrap_err();
        assert!(matches!(err, ModelingError::ReceiveWithoutSend(_)));
    }
}
