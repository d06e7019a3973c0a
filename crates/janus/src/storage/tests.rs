use super::*;
use crate::decl::{DeclKind, Visibility};
use crate::node::NodeKind;
use crate::scope::ScopeKind;
use crate::span::Span;
use crate::token::TokenKind;

fn dummy_span() -> Span {
    Span::new(0, 1, 1, 1)
}

#[test]
fn seal_produces_dense_zero_based_ids() {
    let mut b = SnapshotBuilder::new("unit.janus");
    let t0 = b.add_token(TokenKind::Identifier, None, dummy_span());
    let t1 = b.add_token(TokenKind::Identifier, None, dummy_span());
    assert_eq!(t0.index(), 0);
    assert_eq!(t1.index(), 1);

    let node = b.add_node(NodeKind::Identifier, t0, t1, &[]);
    assert_eq!(node.index(), 0);

    let snapshot = b.seal();
    let unit = snapshot.unit(crate::ids::UnitId::new(0)).unwrap();
    assert_eq!(unit.node_count(), 1);
    assert_eq!(unit.token_count(), 2);
}

#[test]
fn empty_node_has_empty_child_slice_not_missing() {
    let mut b = SnapshotBuilder::new("unit.janus");
    let t = b.add_token(TokenKind::Identifier, None, dummy_span());
    let node = b.add_node(NodeKind::Identifier, t, t, &[]);
    let snapshot = b.seal();
    let unit = snapshot.unit(crate::ids::UnitId::new(0)).unwrap();

    assert!(unit.children(node).is_empty());
}

#[test]
fn out_of_range_node_returns_none_not_panic() {
    let b = SnapshotBuilder::new("unit.janus");
    let snapshot = b.seal();
    let unit = snapshot.unit(crate::ids::UnitId::new(0)).unwrap();

    assert_eq!(unit.get_node(crate::ids::NodeId::new(99)), None);
    assert!(unit.children(crate::ids::NodeId::new(99)).is_empty());
}

#[test]
fn duplicate_decl_in_same_scope_is_rejected() {
    let mut b = SnapshotBuilder::new("unit.janus");
    let name = b.intern("foo");
    let t = b.add_token(TokenKind::Identifier, Some(name), dummy_span());
    let node_a = b.add_node(NodeKind::VarDecl, t, t, &[]);
    let node_b = b.add_node(NodeKind::VarDecl, t, t, &[]);
    let scope = b.add_scope(None, ScopeKind::Global);

    let first = b.add_decl(
        node_a,
        name,
        scope,
        DeclKind::Variable,
        Visibility::Private,
        None,
        false,
    );
    assert!(first.is_ok());

    let second = b.add_decl(
        node_b,
        name,
        scope,
        DeclKind::Variable,
        Visibility::Private,
        None,
        false,
    );
    assert!(second.is_err());

    let snapshot = b.seal();
    let unit = snapshot.unit(crate::ids::UnitId::new(0)).unwrap();
    assert_eq!(unit.decls().count(), 1);
}

#[test]
fn multi_unit_snapshot_shares_one_interner() {
    let mut b = SnapshotBuilder::new("a.janus");
    let shared = b.intern("shared_name");
    b.begin_unit("b.janus");
    let shared_again = b.intern("shared_name");
    assert_eq!(shared, shared_again);

    let snapshot = b.seal();
    assert_eq!(snapshot.unit_count(), 2);
}

#[test]
fn span_of_node_merges_first_and_last_token_spans() {
    let mut b = SnapshotBuilder::new("unit.janus");
    let t0 = b.add_token(TokenKind::Identifier, None, Span::new(0, 3, 1, 1));
    let t1 = b.add_token(TokenKind::Identifier, None, Span::new(4, 7, 1, 5));
    let node = b.add_node(NodeKind::CallExpr, t0, t1, &[]);
    let snapshot = b.seal();
    let unit = snapshot.unit(crate::ids::UnitId::new(0)).unwrap();

    let span = unit.span(node).unwrap();
    assert_eq!(span.start, 0);
    assert_eq!(span.end, 7);
}
