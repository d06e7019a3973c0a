//! The recursive, memoized canonicalization algorithm (§4.3 steps 1-3).

use std::cell::RefCell;
use std::collections::HashMap;

use janus_core::Interner;

use crate::accessor;
use crate::decl::DeclKind;
use crate::ids::{NodeId, UnitId};
use crate::node::NodeKind;
use crate::storage::Snapshot;
use crate::token::TokenKind;
use crate::unit::CompilationUnit;

use super::{Cid, CidCacheStats, ToolchainOpts};

const DOMAIN_TAG: &[u8] = b"janus.astdb.node.v1";

/// Computes and memoizes CIDs against one snapshot. Entries are created
/// lazily on the first `cid()` call for a node and are never invalidated
/// for the lifetime of this `Canonicalizer` — a new snapshot needs a new
/// `Canonicalizer`.
pub struct Canonicalizer<'s> {
    snapshot: &'s Snapshot,
    opts: ToolchainOpts,
    opts_bytes: [u8; 16],
    cache: RefCell<HashMap<(UnitId, NodeId), Cid>>,
    stats: RefCell<CidCacheStats>,
}

impl<'s> Canonicalizer<'s> {
    pub fn new(snapshot: &'s Snapshot, opts: ToolchainOpts) -> Self {
        Self {
            snapshot,
            opts_bytes: opts.to_bytes(),
            opts,
            cache: RefCell::new(HashMap::new()),
            stats: RefCell::new(CidCacheStats::default()),
        }
    }

    pub fn opts(&self) -> ToolchainOpts {
        self.opts
    }

    pub fn stats(&self) -> CidCacheStats {
        *self.stats.borrow()
    }

    /// The content identity of `node` within `unit`, or `None` if `node` is
    /// out of range.
    pub fn cid(&self, unit_id: UnitId, node_id: NodeId) -> Option<Cid> {
        let key = (unit_id, node_id);
        if let Some(cid) = self.cache.borrow().get(&key) {
            self.stats.borrow_mut().hits += 1;
            return Some(*cid);
        }

        let unit = self.snapshot.unit(unit_id)?;
        let cid = self.compute(unit, unit_id, node_id)?;
        self.stats.borrow_mut().misses += 1;
        self.cache.borrow_mut().insert(key, cid);
        Some(cid)
    }

    fn compute(&self, unit: &CompilationUnit, unit_id: UnitId, node_id: NodeId) -> Option<Cid> {
        let node = unit.get_node(node_id)?;

        let child_cids: Vec<Cid> = unit
            .children(node_id)
            .iter()
            .map(|&child| self.cid(unit_id, child))
            .collect::<Option<Vec<_>>>()?;

        let payload = canonical_payload(self.snapshot.interner(), unit, node_id, node.kind);

        let mut buf = Vec::with_capacity(
            DOMAIN_TAG.len() + 16 + 2 + payload.len() + 4 + child_cids.len() * 32,
        );
        buf.extend_from_slice(DOMAIN_TAG);
        buf.extend_from_slice(&self.opts_bytes);
        buf.extend_from_slice(&(node.kind as u16).to_le_bytes());
        buf.extend_from_slice(&payload);
        buf.extend_from_slice(&(child_cids.len() as u32).to_le_bytes());
        for child in &child_cids {
            buf.extend_from_slice(child.as_bytes());
        }

        let hash = blake3::hash(&buf);
        Some(Cid::from_bytes(*hash.as_bytes()))
    }
}

fn canonical_payload(
    interner: &Interner,
    unit: &CompilationUnit,
    node_id: NodeId,
    kind: NodeKind,
) -> Vec<u8> {
    match kind {
        NodeKind::Identifier | NodeKind::StringLiteral | NodeKind::BoolLiteral => unit
            .text_of(node_id)
            .and_then(|id| interner.try_resolve(id))
            .map(|s| s.as_bytes().to_vec())
            .unwrap_or_default(),

        NodeKind::IntLiteral | NodeKind::FloatLiteral => unit
            .text_of(node_id)
            .and_then(|id| interner.try_resolve(id))
            .map(|s| normalize_numeric_literal(s).into_bytes())
            .unwrap_or_default(),

        NodeKind::BinaryExpr => accessor::binary_op_kind(unit, node_id)
            .map(|op| (op as u16).to_le_bytes().to_vec())
            .unwrap_or_default(),

        NodeKind::UnaryExpr => unit
            .get_node(node_id)
            .map(|n| (token_kind_of(unit, n.first_token) as u16).to_le_bytes().to_vec())
            .unwrap_or_default(),

        NodeKind::TypePrimitive | NodeKind::TypePath => unit
            .text_of(node_id)
            .and_then(|id| interner.try_resolve(id))
            .map(|s| s.as_bytes().to_vec())
            .unwrap_or_default(),

        NodeKind::FuncDecl
        | NodeKind::VarDecl
        | NodeKind::LetStmt
        | NodeKind::Param
        | NodeKind::StructDecl
        | NodeKind::StructField
        | NodeKind::EnumDecl
        | NodeKind::EnumVariant
        | NodeKind::TypeAliasDecl
        | NodeKind::ImportDecl => decl_payload(interner, unit, node_id),

        _ => Vec::new(),
    }
}

fn token_kind_of(unit: &CompilationUnit, token_id: crate::ids::TokenId) -> TokenKind {
    unit.token(token_id)
        .map(|t| t.kind)
        .unwrap_or(TokenKind::Eof)
}

/// Name bytes plus a packed modifier-flags word: bit 0 = public, bit 1 =
/// module-local, bit 2 = mutable. Exactly one of bits 0/1 is set (private
/// is the all-zero visibility case).
fn decl_payload(interner: &Interner, unit: &CompilationUnit, node_id: NodeId) -> Vec<u8> {
    let Some((_, decl)) = unit.decls().find(|(_, d)| d.node == node_id) else {
        return Vec::new();
    };

    let name = interner.try_resolve(decl.name).unwrap_or("");
    let mut flags: u32 = 0;
    match decl.visibility {
        crate::decl::Visibility::Public => flags |= 1 << 0,
        crate::decl::Visibility::ModuleLocal => flags |= 1 << 1,
        crate::decl::Visibility::Private => {}
    }
    if decl.is_mutable {
        flags |= 1 << 2;
    }
    if matches!(decl.kind, DeclKind::Function) {
        flags |= 1 << 3;
    }

    let mut buf = name.as_bytes().to_vec();
    buf.extend_from_slice(&flags.to_le_bytes());
    buf
}

/// Strips leading zeros (keeping at least one digit) and lowercases the
/// exponent marker, so `007`, `7`, and `7e0`/`7E0` of an otherwise-identical
/// value normalize consistently. This is deliberately conservative: it does
/// not attempt full numeric equivalence (`1.0` vs `1`), only the textual
/// normalization the spec names.
fn normalize_numeric_literal(text: &str) -> String {
    let lowered = text.replace('E', "e");
    let (mantissa, exponent) = match lowered.split_once('e') {
        Some((m, e)) => (m, Some(e)),
        None => (lowered.as_str(), None),
    };

    let (sign, digits) = match mantissa.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", mantissa),
    };

    let normalized_digits = if let Some((int_part, frac_part)) = digits.split_once('.') {
        let trimmed = int_part.trim_start_matches('0');
        let int_part = if trimmed.is_empty() { "0" } else { trimmed };
        format!("{int_part}.{frac_part}")
    } else {
        let trimmed = digits.trim_start_matches('0');
        if trimmed.is_empty() { "0".to_string() } else { trimmed.to_string() }
    };

    match exponent {
        Some(e) => format!("{sign}{normalized_digits}e{e}"),
        None => format!("{sign}{normalized_digits}"),
    }
}
