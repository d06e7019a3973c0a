use super::*;
use crate::cid::{Canonicalizer, ToolchainOpts};
use crate::decl::{DeclKind, Visibility};
use crate::ids::{NodeId, UnitId};
use crate::node::NodeKind;
use crate::scope::ScopeKind;
use crate::span::Span;
use crate::storage::SnapshotBuilder;
use crate::token::TokenKind;

fn sp() -> Span {
    Span::new(0, 1, 1, 1)
}

fn build_var_snapshot() -> (crate::storage::Snapshot, crate::ids::ScopeId, crate::ids::DeclId) {
    let mut b = SnapshotBuilder::new("u.janus");
    let name_id = b.intern("x");
    let t = b.add_token(TokenKind::Identifier, Some(name_id), sp());
    let ty_tok = b.add_token(TokenKind::Identifier, Some(b.intern("i32")), sp());
    let type_node = b.add_node(NodeKind::TypePrimitive, ty_tok, ty_tok, &[]);
    let name_node = b.add_node(NodeKind::Identifier, t, t, &[]);
    let var = b.add_node(NodeKind::VarDecl, t, t, &[name_node, type_node, NodeId::NONE]);
    let scope = b.add_scope(None, ScopeKind::Global);
    let decl = b
        .add_decl(var, name_id, scope, DeclKind::Variable, Visibility::Private, None, true)
        .unwrap();
    (b.seal(), scope, decl)
}

#[test]
fn cache_hit_on_second_identical_run() {
    let (snapshot, _scope, _decl) = build_var_snapshot();
    let canon = Canonicalizer::new(&snapshot, ToolchainOpts::default());
    let engine = QueryEngine::new();

    let key = QueryKey::TypeOf {
        unit: UnitId::new(0),
        node: NodeId::new(2),
    };

    let first = engine.run(&snapshot, &canon, key.clone());
    assert!(!first.cache_hit);
    assert!(first.data.is_ok());

    let second = engine.run(&snapshot, &canon, key);
    assert!(second.cache_hit);
    assert_eq!(engine.cache_len(), 1);
}

#[test]
fn resolve_name_finds_decl_through_scope_chain() {
    let (snapshot, scope, decl) = build_var_snapshot();
    let canon = Canonicalizer::new(&snapshot, ToolchainOpts::default());
    let engine = QueryEngine::new();

    let x_name = snapshot
        .units()
        .next()
        .and_then(|(_, u)| u.decl(decl))
        .map(|d| d.name)
        .unwrap();

    let result = engine.run(
        &snapshot,
        &canon,
        QueryKey::ResolveName {
            unit: UnitId::new(0),
            name: x_name,
            scope,
        },
    );

    assert_eq!(result.data.unwrap(), QueryData::ResolveName(Some(decl)));
}

#[test]
fn invalidation_evicts_dependent_cache_entries() {
    let (snapshot, _scope, _decl) = build_var_snapshot();
    let canon = Canonicalizer::new(&snapshot, ToolchainOpts::default());
    let engine = QueryEngine::new();

    let key = QueryKey::TypeOf {
        unit: UnitId::new(0),
        node: NodeId::new(2),
    };
    let result = engine.run(&snapshot, &canon, key.clone());
    let cid = result.dependencies.cids.iter().next().copied();
    assert!(cid.is_some());
    assert_eq!(engine.cache_len(), 1);

    let mut changed = IndexSet::new();
    if let Some(cid) = cid {
        changed.insert(cid);
    }
    let stats = engine.transition(&changed);
    assert_eq!(stats.invalidated_queries, 1);
    assert_eq!(stats.removed_from_cache, 1);
    assert_eq!(engine.cache_len(), 0);
}

/// Builds one unit with a `print` function overloaded once per entry in
/// `param_types` (each taking a single parameter of that primitive type),
/// all declared in the unit's global scope. Mirrors the overload set in
/// spec.md §8 scenario 4 (`print(i32)`, `print(f32)`, ...).
fn build_print_overloads(param_types: &[&str]) -> (crate::storage::Snapshot, crate::ids::ScopeId, crate::ids::StringId) {
    let mut b = SnapshotBuilder::new("u.janus");
    let print_name = b.intern("print");
    let scope = b.add_scope(None, ScopeKind::Global);

    for param_type in param_types {
        let fn_name_tok = b.add_token(TokenKind::Identifier, Some(print_name), sp());
        let fn_name_node = b.add_node(NodeKind::Identifier, fn_name_tok, fn_name_tok, &[]);

        let param_name_id = b.intern("x");
        let param_name_tok = b.add_token(TokenKind::Identifier, Some(param_name_id), sp());
        let param_name_node = b.add_node(NodeKind::Identifier, param_name_tok, param_name_tok, &[]);
        let ty_id = b.intern(param_type);
        let ty_tok = b.add_token(TokenKind::Identifier, Some(ty_id), sp());
        let ty_node = b.add_node(NodeKind::TypePrimitive, ty_tok, ty_tok, &[]);
        let param = b.add_node(NodeKind::Param, param_name_tok, ty_tok, &[param_name_node, ty_node]);

        let body = b.add_node(NodeKind::Block, fn_name_tok, fn_name_tok, &[]);
        let func = b.add_node(
            NodeKind::FuncDecl,
            fn_name_tok,
            fn_name_tok,
            &[fn_name_node, NodeId::NONE, body, param],
        );
        b.add_decl(func, print_name, scope, DeclKind::Function, Visibility::Public, None, false)
            .unwrap();
    }

    (b.seal(), scope, print_name)
}

#[test]
fn dispatch_exact_match_wins_over_widening_candidates() {
    // print(i32), print(f32): calling with an i32 argument must prefer the
    // exact match over the candidate that needs an implicit conversion.
    let (snapshot, scope, name) = build_print_overloads(&["i32", "f32"]);
    let canon = Canonicalizer::new(&snapshot, ToolchainOpts::default());
    let engine = QueryEngine::new();

    let result = engine.run(
        &snapshot,
        &canon,
        QueryKey::Dispatch {
            unit: UnitId::new(0),
            name,
            scope,
            arg_types: vec![crate::types::PrimitiveType::I32],
        },
    );

    let QueryData::Dispatch(picked) = result.data.unwrap() else { panic!("expected Dispatch result") };
    // The winning decl is the first one declared (print(i32)), the only exact match.
    assert_eq!(picked.decl, crate::ids::DeclId::new(0));
}

#[test]
fn dispatch_still_prefers_exact_match_with_an_extra_wider_overload() {
    // Adding print(i64) must not change the winner away from the exact i32 match.
    let (snapshot, scope, name) = build_print_overloads(&["i32", "f32", "i64"]);
    let canon = Canonicalizer::new(&snapshot, ToolchainOpts::default());
    let engine = QueryEngine::new();

    let result = engine.run(
        &snapshot,
        &canon,
        QueryKey::Dispatch {
            unit: UnitId::new(0),
            name,
            scope,
            arg_types: vec![crate::types::PrimitiveType::I32],
        },
    );

    let QueryData::Dispatch(picked) = result.data.unwrap() else { panic!("expected Dispatch result") };
    assert_eq!(picked.decl, crate::ids::DeclId::new(0));
}

#[test]
fn dispatch_is_ambiguous_when_two_widening_candidates_tie() {
    // print(f32), print(f64): an i32 argument reaches both only via a
    // single implicit conversion each (i32->f32 and i32->f64 are both
    // distance-1 edges), so neither is more specific than the other.
    let (snapshot, scope, name) = build_print_overloads(&["f32", "f64"]);
    let canon = Canonicalizer::new(&snapshot, ToolchainOpts::default());
    let engine = QueryEngine::new();

    let result = engine.run(
        &snapshot,
        &canon,
        QueryKey::Dispatch {
            unit: UnitId::new(0),
            name,
            scope,
            arg_types: vec![crate::types::PrimitiveType::I32],
        },
    );

    assert_eq!(result.data, Err(QueryError::AmbiguousDispatch));
}

#[test]
fn dispatch_with_no_compatible_overload_is_reported() {
    let (snapshot, scope, name) = build_print_overloads(&["bool"]);
    let canon = Canonicalizer::new(&snapshot, ToolchainOpts::default());
    let engine = QueryEngine::new();

    let result = engine.run(
        &snapshot,
        &canon,
        QueryKey::Dispatch {
            unit: UnitId::new(0),
            name,
            scope,
            arg_types: vec![crate::types::PrimitiveType::I32],
        },
    );

    assert_eq!(result.data, Err(QueryError::NoCompatibleFunction));
}

#[test]
fn cancelled_token_short_circuits_without_caching() {
    let (snapshot, _scope, _decl) = build_var_snapshot();
    let canon = Canonicalizer::new(&snapshot, ToolchainOpts::default());
    let engine = QueryEngine::new();
    let token = CancellationToken::new();
    token.cancel();

    let key = QueryKey::TypeOf {
        unit: UnitId::new(0),
        node: NodeId::new(2),
    };
    let result = engine.run_cancellable(&snapshot, &canon, key, &token);
    assert_eq!(result.data, Err(QueryError::Cancelled));
    assert_eq!(engine.cache_len(), 0);
}

#[test]
fn unrelated_invalidation_leaves_cache_untouched() {
    let (snapshot, _scope, _decl) = build_var_snapshot();
    let canon = Canonicalizer::new(&snapshot, ToolchainOpts::default());
    let engine = QueryEngine::new();

    let key = QueryKey::TypeOf {
        unit: UnitId::new(0),
        node: NodeId::new(2),
    };
    engine.run(&snapshot, &canon, key);

    let mut unrelated = IndexSet::new();
    unrelated.insert(Cid::from_bytes([9u8; 32]));
    let stats = engine.transition(&unrelated);
    assert_eq!(stats.invalidated_queries, 0);
    assert_eq!(engine.cache_len(), 1);
}
