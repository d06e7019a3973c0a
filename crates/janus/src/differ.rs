//! The semantic differ (§4.7): compares two sealed snapshots of the same
//! unit by top-level declaration identity, not by text, and classifies
//! what changed.
//!
//! Two declarations are "the same" across snapshots if they share a
//! `(scope-path, name, kind)` key — a structural identity independent of
//! node ids, which are only ever meaningful within one snapshot.

use indexmap::IndexSet;
use serde::Serialize;

use crate::cid::{Canonicalizer, Cid};
use crate::decl::DeclKind;
use crate::ids::{NodeId, UnitId};
use crate::node::NodeKind;
use crate::storage::Snapshot;
use crate::unit::CompilationUnit;

/// A declaration's identity across snapshots: its dotted path of enclosing
/// scope names is not tracked (scopes don't carry names of their own in
/// this data model), so path here narrows to the decl's own name and kind
/// within its *lexical depth* — sufficient to match top-level decls, which
/// is what §4.7 scopes the differ to.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize)]
pub struct DeclKey {
    pub name: String,
    pub kind: DeclKind,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum ChangeKind {
    AddDecl,
    RemoveDecl,
    SignatureChange,
    ImplementationChange,
    LiteralChange,
    TypeChange,
    EffectChange,
    /// Fallback for a changed decl whose one-level descent doesn't match
    /// any of the named categories above — §4.7's catch-all for changes
    /// the classifier can't characterize more precisely.
    StructuralChange,
}

/// Kind-specific payload (§3's `detail`, §4.7 step 3's parentheticals,
/// §6's JSON `detail` field). Unused fields stay `None` for change kinds
/// that don't carry that particular piece of data.
#[derive(Clone, PartialEq, Debug, Serialize, Default)]
pub struct ChangeDetail {
    pub old_signature: Option<String>,
    pub new_signature: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

impl ChangeDetail {
    fn none() -> Self {
        Self::default()
    }

    fn signature(old: String, new: String) -> Self {
        Self {
            old_signature: Some(old),
            new_signature: Some(new),
            ..Self::default()
        }
    }

    fn literal(from: String, to: String) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
            ..Self::default()
        }
    }
}

/// One change record (§3, §6): `{ item, kind, detail, old_cid?, new_cid? }`.
#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct SemanticChange {
    pub item: DeclKey,
    pub kind: ChangeKind,
    pub detail: ChangeDetail,
    pub old_cid: Option<String>,
    pub new_cid: Option<String>,
}

impl SemanticChange {
    fn add(item: DeclKey, new_cid: Cid) -> Self {
        Self {
            item,
            kind: ChangeKind::AddDecl,
            detail: ChangeDetail::none(),
            old_cid: None,
            new_cid: Some(new_cid.to_hex()),
        }
    }

    fn remove(item: DeclKey, old_cid: Cid) -> Self {
        Self {
            item,
            kind: ChangeKind::RemoveDecl,
            detail: ChangeDetail::none(),
            old_cid: Some(old_cid.to_hex()),
            new_cid: None,
        }
    }

    fn with_detail(item: DeclKey, kind: ChangeKind, detail: ChangeDetail, old_cid: Cid, new_cid: Cid) -> Self {
        Self {
            item,
            kind,
            detail,
            old_cid: Some(old_cid.to_hex()),
            new_cid: Some(new_cid.to_hex()),
        }
    }
}

/// Every top-level decl's `DeclKey`, paired with its node id in this
/// snapshot. Scoped to `ScopeId::new(0)` (each unit's global scope) since
/// §4.7 names top-level declarations specifically.
fn resolve_keys(
    snapshot: &Snapshot,
    unit: &crate::unit::CompilationUnit,
) -> Vec<(DeclKey, NodeId)> {
    unit.decls()
        .filter(|(_, d)| d.scope == crate::ids::ScopeId::new(0))
        .filter_map(|(_, d)| {
            let name = snapshot.interner().try_resolve(d.name)?.to_owned();
            Some((DeclKey { name, kind: d.kind }, d.node))
        })
        .collect()
}

fn is_literal_kind(kind: NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::IntLiteral | NodeKind::FloatLiteral | NodeKind::StringLiteral | NodeKind::BoolLiteral
    )
}

/// Outcome of comparing two node subtrees structurally (ignoring spans,
/// which are trivia): either they're equivalent, they diverge at exactly
/// one literal leaf, or they diverge in some other way the one-level
/// classifier doesn't try to characterize further.
enum SubtreeDiff {
    Same,
    SoleLiteral(String, String),
    Other,
}

/// Walks two trees in lockstep by child position and reports whether they
/// diverge at exactly one literal leaf (§4.7 step 3's "literal subtree
/// differs only in its normalized value"). Anything else — a shape
/// mismatch, a non-literal token difference, or more than one differing
/// literal — is `Other`, which the caller falls back to
/// `ImplementationChange` for.
fn sole_literal_diff(
    old_snapshot: &Snapshot,
    old_unit: &CompilationUnit,
    old_node: NodeId,
    new_snapshot: &Snapshot,
    new_unit: &CompilationUnit,
    new_node: NodeId,
) -> SubtreeDiff {
    let (Some(old_n), Some(new_n)) = (old_unit.get_node(old_node), new_unit.get_node(new_node)) else {
        return SubtreeDiff::Other;
    };
    if old_n.kind != new_n.kind {
        return SubtreeDiff::Other;
    }

    if is_literal_kind(old_n.kind) {
        let old_text = old_unit.text_of(old_node).and_then(|id| old_snapshot.interner().try_resolve(id));
        let new_text = new_unit.text_of(new_node).and_then(|id| new_snapshot.interner().try_resolve(id));
        return match (old_text, new_text) {
            (Some(a), Some(b)) if a == b => SubtreeDiff::Same,
            (Some(a), Some(b)) => SubtreeDiff::SoleLiteral(a.to_string(), b.to_string()),
            _ => SubtreeDiff::Other,
        };
    }

    let old_text = old_unit.text_of(old_node).and_then(|id| old_snapshot.interner().try_resolve(id));
    let new_text = new_unit.text_of(new_node).and_then(|id| new_snapshot.interner().try_resolve(id));
    if old_text != new_text {
        return SubtreeDiff::Other;
    }

    let old_children = old_unit.children(old_node);
    let new_children = new_unit.children(new_node);
    if old_children.len() != new_children.len() {
        return SubtreeDiff::Other;
    }

    let mut found: Option<(String, String)> = None;
    for (oc, nc) in old_children.iter().zip(new_children.iter()) {
        match sole_literal_diff(old_snapshot, old_unit, *oc, new_snapshot, new_unit, *nc) {
            SubtreeDiff::Same => {}
            SubtreeDiff::SoleLiteral(from, to) => {
                if found.is_some() {
                    return SubtreeDiff::Other;
                }
                found = Some((from, to));
            }
            SubtreeDiff::Other => return SubtreeDiff::Other,
        }
    }

    match found {
        Some((from, to)) => SubtreeDiff::SoleLiteral(from, to),
        None => SubtreeDiff::Same,
    }
}

/// Renders a function's signature as `(type, type, ...) -> type` (or
/// `-> ?` / `type?` when a slot's type can't be resolved), for the
/// `SignatureChange` detail payload (§4.7 step 3).
fn render_signature(snapshot: &Snapshot, unit: &CompilationUnit, node: NodeId) -> String {
    let resolve = |n: NodeId| -> String {
        unit.text_of(n)
            .and_then(|id| snapshot.interner().try_resolve(id))
            .map(str::to_owned)
            .unwrap_or_else(|| "?".to_string())
    };

    let params: Vec<String> = crate::accessor::func_params(unit, node)
        .unwrap_or_default()
        .iter()
        .map(|&p| crate::accessor::param_type(unit, p).map(resolve).unwrap_or_else(|| "?".to_string()))
        .collect();
    let ret = crate::accessor::func_return_type(unit, node)
        .map(resolve)
        .unwrap_or_else(|| "void".to_string());

    format!("({}) -> {ret}", params.join(", "))
}

/// One-level descent classification: given a changed top-level decl present
/// in both snapshots, inspect its immediate children for the kind of
/// change that occurred. This is deliberately shallow (§4.7 names a
/// "one-level descent", not a full recursive diff) — it inspects structure
/// the accessor layer already knows how to read.
fn classify_change(
    old_snapshot: &Snapshot,
    old_unit: &CompilationUnit,
    old_node: NodeId,
    new_snapshot: &Snapshot,
    new_unit: &CompilationUnit,
    new_node: NodeId,
    key: &DeclKey,
    old_cid: Cid,
    new_cid: Cid,
) -> SemanticChange {
    if key.kind == DeclKind::Function {
        let old_sig = (
            crate::accessor::func_return_type(old_unit, old_node),
            crate::accessor::func_params(old_unit, old_node).map(|p| p.len()),
        );
        let new_sig = (
            crate::accessor::func_return_type(new_unit, new_node),
            crate::accessor::func_params(new_unit, new_node).map(|p| p.len()),
        );
        if old_sig.0.is_some() != new_sig.0.is_some() || old_sig.1 != new_sig.1 {
            let detail = ChangeDetail::signature(
                render_signature(old_snapshot, old_unit, old_node),
                render_signature(new_snapshot, new_unit, new_node),
            );
            return SemanticChange::with_detail(key.clone(), ChangeKind::SignatureChange, detail, old_cid, new_cid);
        }

        if let (Some(old_body), Some(new_body)) =
            (crate::accessor::func_body(old_unit, old_node), crate::accessor::func_body(new_unit, new_node))
        {
            if let SubtreeDiff::SoleLiteral(from, to) =
                sole_literal_diff(old_snapshot, old_unit, old_body, new_snapshot, new_unit, new_body)
            {
                return SemanticChange::with_detail(
                    key.clone(),
                    ChangeKind::LiteralChange,
                    ChangeDetail::literal(from, to),
                    old_cid,
                    new_cid,
                );
            }
        }

        return SemanticChange::with_detail(key.clone(), ChangeKind::ImplementationChange, ChangeDetail::none(), old_cid, new_cid);
    }

    if key.kind == DeclKind::Variable {
        let old_ty = crate::accessor::var_type_annotation(old_unit, old_node);
        let new_ty = crate::accessor::var_type_annotation(new_unit, new_node);
        if old_ty.is_none() != new_ty.is_none() {
            return SemanticChange::with_detail(key.clone(), ChangeKind::TypeChange, ChangeDetail::none(), old_cid, new_cid);
        }
        let old_init = crate::accessor::var_initializer(old_unit, old_node);
        let new_init = crate::accessor::var_initializer(new_unit, new_node);
        if let (Some(oi), Some(ni)) = (old_init, new_init) {
            if let SubtreeDiff::SoleLiteral(from, to) = sole_literal_diff(old_snapshot, old_unit, oi, new_snapshot, new_unit, ni) {
                return SemanticChange::with_detail(
                    key.clone(),
                    ChangeKind::LiteralChange,
                    ChangeDetail::literal(from, to),
                    old_cid,
                    new_cid,
                );
            }
        }
        return SemanticChange::with_detail(key.clone(), ChangeKind::ImplementationChange, ChangeDetail::none(), old_cid, new_cid);
    }

    SemanticChange::with_detail(key.clone(), ChangeKind::StructuralChange, ChangeDetail::none(), old_cid, new_cid)
}

/// Collects every node pair along the path from a changed leaf to `old_node`
/// / `new_node` into `out` (§4.7 step 4: "∆ is the union of old-CID and
/// new-CID for every differing node, propagated bottom-up"). Children are
/// paired by position, matching the shallow, non-renaming-aware comparison
/// the rest of the differ uses. Returns whether this node's own CID
/// differs, so a caller one level up knows whether to include itself.
fn collect_delta(
    old_canon: &Canonicalizer<'_>,
    old_unit: &CompilationUnit,
    unit_id: UnitId,
    old_node: NodeId,
    new_canon: &Canonicalizer<'_>,
    new_unit: &CompilationUnit,
    new_node: NodeId,
    out: &mut IndexSet<Cid>,
) -> bool {
    let old_cid = old_canon.cid(unit_id, old_node);
    let new_cid = new_canon.cid(unit_id, new_node);
    if old_cid == new_cid {
        return false;
    }

    let old_children = old_unit.children(old_node);
    let new_children = new_unit.children(new_node);
    for (oc, nc) in old_children.iter().zip(new_children.iter()) {
        collect_delta(old_canon, old_unit, unit_id, *oc, new_canon, new_unit, *nc, out);
    }

    if let Some(c) = old_cid {
        out.insert(c);
    }
    if let Some(c) = new_cid {
        out.insert(c);
    }
    true
}

/// Diffs `old` against `new` for the one unit identified in each by
/// `unit_id` (units are matched by position, since this differ is scoped
/// to comparing "the same file before and after an edit" rather than
/// reconciling unit sets across whole-project renames).
///
/// Returns the change list alongside ∆, the bottom-up-propagated set of
/// every differing node's old and new CID (§4.7 step 4, §6) — this is the
/// set a caller feeds straight into [`crate::query::QueryEngine::transition`].
pub fn diff_units(
    old: &Snapshot,
    old_canon: &Canonicalizer<'_>,
    new: &Snapshot,
    new_canon: &Canonicalizer<'_>,
    unit_id: UnitId,
) -> (Vec<SemanticChange>, IndexSet<Cid>) {
    let mut changes = Vec::new();
    let mut delta = IndexSet::new();
    let (Some(old_unit), Some(new_unit)) = (old.unit(unit_id), new.unit(unit_id)) else {
        return (changes, delta);
    };

    let old_decls = resolve_keys(old, old_unit);
    let new_decls = resolve_keys(new, new_unit);

    for (key, old_node) in &old_decls {
        match new_decls.iter().find(|(k, _)| k == key) {
            None => {
                if let Some(cid) = old_canon.cid(unit_id, *old_node) {
                    delta.insert(cid);
                    changes.push(SemanticChange::remove(key.clone(), cid));
                }
            }
            Some((_, new_node)) => {
                let old_cid = old_canon.cid(unit_id, *old_node);
                let new_cid = new_canon.cid(unit_id, *new_node);
                if old_cid != new_cid {
                    collect_delta(old_canon, old_unit, unit_id, *old_node, new_canon, new_unit, *new_node, &mut delta);
                    if let (Some(oc), Some(nc)) = (old_cid, new_cid) {
                        changes.push(classify_change(old, old_unit, *old_node, new, new_unit, *new_node, key, oc, nc));
                    }
                }
            }
        }
    }

    for (key, new_node) in &new_decls {
        if !old_decls.iter().any(|(k, _)| k == key) {
            if let Some(cid) = new_canon.cid(unit_id, *new_node) {
                delta.insert(cid);
                changes.push(SemanticChange::add(key.clone(), cid));
            }
        }
    }

    (changes, delta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cid::ToolchainOpts;
    use crate::decl::Visibility;
    use crate::node::NodeKind;
    use crate::query::{QueryEngine, QueryKey};
    use crate::scope::ScopeKind;
    use crate::span::Span;
    use crate::storage::SnapshotBuilder;
    use crate::token::TokenKind;

    fn sp() -> Span {
        Span::new(0, 1, 1, 1)
    }

    fn build_func(ret_literal_value: &str) -> Snapshot {
        let mut b = SnapshotBuilder::new("u.janus");
        let name_id = b.intern("answer");
        let t = b.add_token(TokenKind::Identifier, Some(name_id), sp());
        let name_node = b.add_node(NodeKind::Identifier, t, t, &[]);

        let v = b.intern(ret_literal_value);
        let lit_tok = b.add_token(TokenKind::IntLiteral, Some(v), sp());
        let lit = b.add_node(NodeKind::IntLiteral, lit_tok, lit_tok, &[]);
        let body = b.add_node(NodeKind::Block, t, t, &[lit]);

        let func = b.add_node(NodeKind::FuncDecl, t, t, &[name_node, NodeId::NONE, body]);
        let scope = b.add_scope(None, ScopeKind::Global);
        b.add_decl(func, name_id, scope, DeclKind::Function, Visibility::Public, None, false)
            .unwrap();
        b.seal()
    }

    fn build_func_with_params(param_count: usize) -> Snapshot {
        let mut b = SnapshotBuilder::new("u.janus");
        let name_id = b.intern("answer");
        let t = b.add_token(TokenKind::Identifier, Some(name_id), sp());
        let name_node = b.add_node(NodeKind::Identifier, t, t, &[]);
        let body = b.add_node(NodeKind::Block, t, t, &[]);

        let mut children = vec![name_node, NodeId::NONE, body];
        for _ in 0..param_count {
            let p_name = b.add_node(NodeKind::Identifier, t, t, &[]);
            let p_ty = b.add_node(NodeKind::TypePrimitive, t, t, &[]);
            children.push(b.add_node(NodeKind::Param, t, t, &[p_name, p_ty]));
        }

        let func = b.add_node(NodeKind::FuncDecl, t, t, &children);
        let scope = b.add_scope(None, ScopeKind::Global);
        b.add_decl(func, name_id, scope, DeclKind::Function, Visibility::Public, None, false)
            .unwrap();
        b.seal()
    }

    #[test]
    fn identical_snapshots_produce_no_changes() {
        let s1 = build_func("42");
        let s2 = build_func("42");
        let c1 = Canonicalizer::new(&s1, ToolchainOpts::default());
        let c2 = Canonicalizer::new(&s2, ToolchainOpts::default());

        let (changes, delta) = diff_units(&s1, &c1, &s2, &c2, UnitId::new(0));
        assert!(changes.is_empty());
        assert!(delta.is_empty());
    }

    #[test]
    fn literal_change_inside_a_function_is_reported_as_literal_change() {
        let s1 = build_func("41");
        let s2 = build_func("42");
        let c1 = Canonicalizer::new(&s1, ToolchainOpts::default());
        let c2 = Canonicalizer::new(&s2, ToolchainOpts::default());

        let (changes, delta) = diff_units(&s1, &c1, &s2, &c2, UnitId::new(0));
        assert_eq!(changes.len(), 1);
        match &changes[0] {
            SemanticChange { kind: ChangeKind::LiteralChange, detail, .. } => {
                assert_eq!(detail.from.as_deref(), Some("41"));
                assert_eq!(detail.to.as_deref(), Some("42"));
            }
            other => panic!("expected LiteralChange, got {other:?}"),
        }
        assert!(!delta.is_empty());
    }

    #[test]
    fn signature_change_from_parameter_count_is_reported() {
        let s1 = build_func_with_params(0);
        let s2 = build_func_with_params(1);
        let c1 = Canonicalizer::new(&s1, ToolchainOpts::default());
        let c2 = Canonicalizer::new(&s2, ToolchainOpts::default());

        let (changes, _delta) = diff_units(&s1, &c1, &s2, &c2, UnitId::new(0));
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].kind, ChangeKind::SignatureChange);
        assert_eq!(changes[0].item.name, "answer");
    }

    #[test]
    fn removed_decl_is_reported() {
        let s1 = build_func("42");

        let mut b2 = SnapshotBuilder::new("u.janus");
        let _ = b2.add_scope(None, ScopeKind::Global);
        let s2 = b2.seal();

        let c1 = Canonicalizer::new(&s1, ToolchainOpts::default());
        let c2 = Canonicalizer::new(&s2, ToolchainOpts::default());

        let (changes, delta) = diff_units(&s1, &c1, &s2, &c2, UnitId::new(0));
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].kind, ChangeKind::RemoveDecl);
        assert_eq!(
            changes[0].item,
            DeclKey {
                name: "answer".to_string(),
                kind: DeclKind::Function,
            }
        );
        assert!(!delta.is_empty());
    }

    #[test]
    fn differ_delta_drives_engine_invalidation() {
        let s1 = build_func("41");
        let s2 = build_func("42");
        let c1 = Canonicalizer::new(&s1, ToolchainOpts::default());
        let c2 = Canonicalizer::new(&s2, ToolchainOpts::default());

        let engine = QueryEngine::new();
        let lit = NodeId::new(1);
        let hover_key = QueryKey::Hover { unit: UnitId::new(0), node: lit };
        let result = engine.run(&s1, &c1, hover_key);
        assert!(result.data.is_ok());
        assert_eq!(engine.cache_len(), 1);

        let (changes, delta) = diff_units(&s1, &c1, &s2, &c2, UnitId::new(0));
        assert_eq!(changes.len(), 1);
        assert!(!delta.is_empty());

        let stats = engine.transition(&delta);
        assert_eq!(stats.invalidated_queries, 1);
        assert_eq!(engine.cache_len(), 0);
    }
}
