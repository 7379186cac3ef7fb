//! End-to-end walk: a small model goes through knowledge-map construction,
//! per-principal projection, and a handful of manual attacker learn steps,
//! standing in for the outer deduction loop this crate doesn't own.

use protologic::attacker_state;
use protologic::equivalence::value_equivalent;
use protologic::interning::{intern_principal_name, reset_for_test};
use protologic::model::{Expression, MessageBlock, PrincipalBlock};
use protologic::rewrite::rewrite_group_add;
use protologic::{construct_knowledge_map, construct_principal_states, Block, Constant, Declaration, Model, Primitive, PrimitiveId, Qualifier, Value};

#[test]
fn alice_generates_sends_to_bob_attacker_learns_leaked_value() {
    reset_for_test();
    attacker_state::init(true);

    let alice = intern_principal_name("Alice");
    let bob = intern_principal_name("Bob");

    let a = Constant::new("a", Declaration::Generates, Qualifier::Private);
    let blocks = vec![
        Block::Principal(PrincipalBlock {
            id: alice,
            name: "Alice".into(),
            expressions: vec![Expression::generates(vec![a.clone()]), Expression::leaks(vec![a.clone()])],
        }),
        Block::Message(MessageBlock {
            sender: alice,
            recipient: bob,
            constants: vec![a.clone()],
        }),
    ];
    let model = Model { blocks };

    let km = construct_knowledge_map(&model, vec!["Alice".into(), "Bob".into()], vec![alice, bob]).expect("model is well-formed");
    assert!(km.index_of(a.id).is_some());

    let states = construct_principal_states(&model, &km);
    let bob_state = &states[1];
    let idx = bob_state.index_of(a.id).unwrap();
    assert!(bob_state.known[idx]);

    attacker_state::put_phase_update(&km, &states[0], 0).expect("phase update succeeds");
    let known = attacker_state::get_read().known;
    assert!(known.iter().any(|v| value_equivalent(v, &Value::constant(a.clone()))));
}

#[test]
fn pedersen_commitment_cancellation_survives_group_add_rewrite() {
    reset_for_test();
    let v = Value::constant(Constant::new("v", Declaration::Generates, Qualifier::Private));
    let r = Value::constant(Constant::new("r", Declaration::Generates, Qualifier::Private));
    let commit = Primitive::new(PrimitiveId::PedersenCommit, vec![v, r]);
    let neg_commit = Primitive::new(PrimitiveId::Neg, vec![Value::primitive(commit.clone())]);
    let sum = Primitive::new(PrimitiveId::GroupAdd, vec![Value::primitive(commit), Value::primitive(neg_commit)]);
    let (_, out) = rewrite_group_add(&sum);
    assert_eq!(out.len(), 1);
    assert!(protologic::scalar::value_is_zero(&out[0]));
}

#[test]
fn modeling_error_surfaces_on_double_assignment() {
    reset_for_test();
    let alice = intern_principal_name("Alice");
    let out_name = Constant::new("y", Declaration::Assignment, Qualifier::Private);
    let blocks = vec![Block::Principal(PrincipalBlock {
        id: alice,
        name: "Alice".into(),
        expressions: vec![
            Expression::assignment(vec![out_name.clone()], Value::constant(protologic::value::value_g().as_constant().unwrap().clone())),
            Expression::assignment(vec![out_name], Value::constant(protologic::value::value_g().as_constant().unwrap().clone())),
        ],
    })];
    let model = Model { blocks };
    let err = construct_knowledge_map(&model, vec!["Alice".into()], vec![alice]).unwrap_err();
    assert!(matches!(err, protologic::ModelingError::DoubleAssignment(_)));
}
