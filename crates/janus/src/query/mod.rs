//! The memoized, dependency-tracking query engine (§4.5).
//!
//! Execution contract: a cache hit records a dependency edge from the
//! calling query (if any) and returns; a miss pushes a dependency frame,
//! runs the computation (which may itself call `run()` or read a CID —
//! both route through the active frame automatically), and commits the
//! result plus its captured [`DependencySet`] to the memo cache.

mod dispatch;
mod error;

#[cfg(test)]
mod tests;

pub use error::QueryError;

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::{Condvar, Mutex, RwLock};
use std::time::Instant;

use indexmap::IndexSet;

use crate::cid::{Canonicalizer, Cid};
use crate::ids::{DeclId, NodeId, ScopeId, StringId, UnitId};
use crate::span::Span;
use crate::storage::Snapshot;
use crate::types::{DispatchResult, EffectTag, IrHandle, PrimitiveType, TypeHandle};

use crate::depgraph::{DependencyGraph, InvalidationStats};
use crate::perf::PerfMonitor;

/// The closed set of supported queries (§4.5). Every variant names a
/// `UnitId` because a snapshot may hold more than one unit (§3) and a
/// `QueryKey` must be addressable on its own, independent of any call-site
/// context — this is the one detail the distilled spec leaves implicit.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum QueryKey {
    NodeAt {
        unit: UnitId,
        line: u32,
        column: u32,
    },
    TypeOf {
        unit: UnitId,
        node: NodeId,
    },
    DefinitionOf {
        unit: UnitId,
        node: NodeId,
        scope: ScopeId,
    },
    ReferencesTo {
        unit: UnitId,
        decl: DeclId,
    },
    /// `arg_types` stands in for the spec's "arg-types-CID": since the
    /// actual computation needs the concrete argument types (not just a
    /// hash of them), and `PrimitiveType` is itself small/`Hash`/`Eq`, the
    /// type list doubles as both the content-identity and the input. See
    /// [`QueryKey::arg_types_cid`] for the stable hex form when one is
    /// needed at an external boundary.
    Dispatch {
        unit: UnitId,
        name: StringId,
        scope: ScopeId,
        arg_types: Vec<PrimitiveType>,
    },
    ResolveName {
        unit: UnitId,
        name: StringId,
        scope: ScopeId,
    },
    IROf {
        unit: UnitId,
        node: NodeId,
    },
    EffectsOf {
        unit: UnitId,
        node: NodeId,
    },
    Hover {
        unit: UnitId,
        node: NodeId,
    },
}

impl QueryKey {
    /// Stable tag used to bucket performance-monitor samples and as the
    /// kind discriminant in external JSON output.
    pub fn tag(&self) -> &'static str {
        match self {
            QueryKey::NodeAt { .. } => "NodeAt",
            QueryKey::TypeOf { .. } => "TypeOf",
            QueryKey::DefinitionOf { .. } => "DefinitionOf",
            QueryKey::ReferencesTo { .. } => "ReferencesTo",
            QueryKey::Dispatch { .. } => "Dispatch",
            QueryKey::ResolveName { .. } => "ResolveName",
            QueryKey::IROf { .. } => "IROf",
            QueryKey::EffectsOf { .. } => "EffectsOf",
            QueryKey::Hover { .. } => "Hover",
        }
    }

    pub fn arg_types_cid(arg_types: &[PrimitiveType]) -> Cid {
        let mut buf = Vec::with_capacity(arg_types.len() * 2);
        for ty in arg_types {
            buf.extend_from_slice(&(*ty as u16).to_le_bytes());
        }
        Cid::from_bytes(*blake3::hash(&buf).as_bytes())
    }
}

/// The sum type of query results (§3).
#[derive(Clone, PartialEq, Debug)]
pub enum QueryData {
    NodeAt(Option<NodeId>),
    TypeOf(TypeHandle),
    DefinitionOf { decl: DeclId, span: Span },
    ReferencesTo(Vec<NodeId>),
    Dispatch(DispatchResult),
    ResolveName(Option<DeclId>),
    IROf(IrHandle),
    EffectsOf(Vec<EffectTag>),
    Hover { markdown: String },
}

/// The set of CIDs and QueryKeys a query consulted while computing its
/// result. Invalidation happens when this set intersects a changed-CID
/// set.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct DependencySet {
    pub cids: IndexSet<Cid>,
    pub queries: IndexSet<QueryKey>,
}

impl DependencySet {
    pub fn is_empty(&self) -> bool {
        self.cids.is_empty() && self.queries.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct QueryResult {
    pub data: Result<QueryData, QueryError>,
    pub dependencies: DependencySet,
    pub execution_time_ns: u64,
    pub cache_hit: bool,
}

struct MemoEntry {
    result: QueryResult,
}

thread_local! {
    static FRAME_STACK: RefCell<Vec<DependencySet>> = const { RefCell::new(Vec::new()) };
}

fn push_frame() {
    FRAME_STACK.with(|s| s.borrow_mut().push(DependencySet::default()));
}

fn pop_frame() -> DependencySet {
    FRAME_STACK.with(|s| s.borrow_mut().pop().unwrap_or_default())
}

fn record_cid_dep(cid: Cid) {
    FRAME_STACK.with(|s| {
        if let Some(top) = s.borrow_mut().last_mut() {
            top.cids.insert(cid);
        }
    });
}

fn record_query_dep(key: QueryKey) {
    FRAME_STACK.with(|s| {
        if let Some(top) = s.borrow_mut().last_mut() {
            top.queries.insert(key);
        }
    });
}

/// A cooperative cancellation flag (§5): checked at query recursion
/// boundaries (before claiming a computation and again once claimed). The
/// core has no way to interrupt a computation already running, so
/// cancellation only short-circuits a query that hasn't started computing
/// yet — it never leaves a partial memo entry or dependency frame behind.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(std::sync::Arc<std::sync::atomic::AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(std::sync::atomic::Ordering::SeqCst)
    }
}

fn cancelled_result() -> QueryResult {
    QueryResult {
        data: Err(QueryError::Cancelled),
        dependencies: DependencySet::default(),
        execution_time_ns: 0,
        cache_hit: false,
    }
}

/// Stats returned by [`QueryEngine::stats`].
#[derive(Clone, Debug, Default)]
pub struct EngineStats {
    pub cache_size: usize,
    pub cache_hit_rate: f64,
    pub percentiles: HashMap<&'static str, crate::perf::Percentiles>,
}

/// The query engine. The memo cache and in-flight set use interior
/// synchronization so query execution can be parallelized across distinct
/// keys while guaranteeing at most one concurrent computation per key
/// (duplicate concurrent requests join the in-flight computation).
pub struct QueryEngine {
    cache: RwLock<HashMap<QueryKey, MemoEntry>>,
    graph: Mutex<DependencyGraph>,
    in_flight: Mutex<IndexSet<QueryKey>>,
    in_flight_cv: Condvar,
    perf: PerfMonitor,
}

impl Default for QueryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryEngine {
    pub fn new() -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
            graph: Mutex::new(DependencyGraph::new()),
            in_flight: Mutex::new(IndexSet::new()),
            in_flight_cv: Condvar::new(),
            perf: PerfMonitor::new(),
        }
    }

    /// §4.5 execution contract.
    pub fn run(&self, snapshot: &Snapshot, canon: &Canonicalizer<'_>, key: QueryKey) -> QueryResult {
        self.run_cancellable(snapshot, canon, key, &CancellationToken::new())
    }

    /// As [`Self::run`], but checked against `token` at the recursion
    /// boundary (§5): once before claiming the computation and once more
    /// right after claiming it. Returns `QueryError::Cancelled` without
    /// caching anything if `token` is already cancelled at either point.
    pub fn run_cancellable(
        &self,
        snapshot: &Snapshot,
        canon: &Canonicalizer<'_>,
        key: QueryKey,
        token: &CancellationToken,
    ) -> QueryResult {
        let _span = tracing::debug_span!("query", kind = key.tag()).entered();

        if let Some(hit) = self.try_cache_hit(&key) {
            tracing::trace!(cache_hit = true);
            return hit;
        }

        if token.is_cancelled() {
            tracing::trace!("cancelled before claim");
            return cancelled_result();
        }

        self.claim_or_join(&key);

        if token.is_cancelled() {
            self.release_claim(&key);
            tracing::trace!("cancelled after claim");
            return cancelled_result();
        }

        // Another thread may have completed the computation while we
        // waited to claim it; re-check before doing the work ourselves.
        if let Some(hit) = self.try_cache_hit(&key) {
            self.release_claim(&key);
            return hit;
        }

        let start = Instant::now();
        push_frame();
        let data = self.compute(snapshot, canon, &key);
        let dependencies = pop_frame();
        let elapsed = start.elapsed().as_nanos() as u64;
        tracing::trace!(cache_hit = false, elapsed_ns = elapsed, ok = data.is_ok());

        let result = QueryResult {
            data,
            dependencies,
            execution_time_ns: elapsed,
            cache_hit: false,
        };

        self.perf.record(key.tag(), elapsed, false);
        record_query_dep(key.clone());

        {
            let mut graph = self.graph.lock().expect("dependency graph mutex poisoned");
            graph.record(
                &key,
                result.dependencies.cids.iter().copied(),
                result.dependencies.queries.iter().cloned(),
            );
        }

        if result.data.is_ok() {
            self.cache
                .write()
                .expect("memo cache lock poisoned")
                .insert(key.clone(), MemoEntry { result: result.clone() });
        }

        self.release_claim(&key);
        result
    }

    fn try_cache_hit(&self, key: &QueryKey) -> Option<QueryResult> {
        let cache = self.cache.read().expect("memo cache lock poisoned");
        let entry = cache.get(key)?;
        self.perf.record(key.tag(), 0, true);
        record_query_dep(key.clone());
        let mut result = entry.result.clone();
        result.cache_hit = true;
        result.execution_time_ns = 0;
        Some(result)
    }

    fn claim_or_join(&self, key: &QueryKey) {
        let mut in_flight = self.in_flight.lock().expect("in-flight lock poisoned");
        while in_flight.contains(key) {
            in_flight = self
                .in_flight_cv
                .wait(in_flight)
                .expect("in-flight lock poisoned");
        }
        in_flight.insert(key.clone());
    }

    fn release_claim(&self, key: &QueryKey) {
        let mut in_flight = self.in_flight.lock().expect("in-flight lock poisoned");
        in_flight.shift_remove(key);
        drop(in_flight);
        self.in_flight_cv.notify_all();
    }

    fn compute(
        &self,
        snapshot: &Snapshot,
        canon: &Canonicalizer<'_>,
        key: &QueryKey,
    ) -> Result<QueryData, QueryError> {
        match key.clone() {
            QueryKey::NodeAt { unit, line, column } => {
                Ok(QueryData::NodeAt(self.node_at(snapshot, unit, line, column)))
            }
            QueryKey::TypeOf { unit, node } => self.type_of(snapshot, canon, unit, node),
            QueryKey::DefinitionOf { unit, node, scope } => {
                self.definition_of(snapshot, canon, unit, node, scope)
            }
            QueryKey::ReferencesTo { unit, decl } => Ok(QueryData::ReferencesTo(
                self.references_to(snapshot, canon, unit, decl),
            )),
            QueryKey::Dispatch {
                unit,
                name,
                scope,
                arg_types,
            } => dispatch::run_dispatch(snapshot, canon, unit, name, scope, &arg_types),
            QueryKey::ResolveName { unit, name, scope } => Ok(QueryData::ResolveName(
                self.resolve_name(snapshot, unit, name, scope),
            )),
            QueryKey::IROf { unit, node } => self.ir_of(snapshot, canon, unit, node),
            QueryKey::EffectsOf { unit, node } => self.effects_of(snapshot, unit, node),
            QueryKey::Hover { unit, node } => self.hover(snapshot, canon, unit, node),
        }
    }

    /// Records a CID read into the currently active dependency frame, the
    /// way every in-engine computation must when it consults `cid()`.
    fn dep_cid(&self, canon: &Canonicalizer<'_>, unit: UnitId, node: NodeId) -> Option<Cid> {
        let cid = canon.cid(unit, node)?;
        record_cid_dep(cid);
        Some(cid)
    }

    /// Finds the smallest node whose span starts on `line` and covers
    /// `column`. A `Span` only records the line/column of its *start*, so a
    /// node spanning multiple lines is matched by column only on its first
    /// line — a documented limitation of the position scheme this core
    /// owns in the lexer/parser's stead.
    fn node_at(&self, snapshot: &Snapshot, unit_id: UnitId, line: u32, column: u32) -> Option<NodeId> {
        let unit = snapshot.unit(unit_id)?;
        let mut best: Option<(NodeId, u32)> = None;
        for idx in 0..unit.node_count() {
            let id = NodeId::new(idx as u32);
            let Some(span) = unit.span(id) else { continue };
            if span.line != line || column < span.column || column > span.column + span.len() {
                continue;
            }
            let width = span.len();
            if best.map(|(_, w)| width < w).unwrap_or(true) {
                best = Some((id, width));
            }
        }
        best.map(|(id, _)| id)
    }

    fn resolve_name(
        &self,
        snapshot: &Snapshot,
        unit_id: UnitId,
        name: StringId,
        scope: ScopeId,
    ) -> Option<DeclId> {
        let unit = snapshot.unit(unit_id)?;
        let mut current = Some(scope);
        while let Some(scope_id) = current {
            if let Some((id, _)) = unit
                .decls()
                .find(|(_, d)| d.scope == scope_id && d.name == name)
            {
                return Some(id);
            }
            current = unit.scope(scope_id).and_then(|s| s.parent);
        }
        None
    }

    fn definition_of(
        &self,
        snapshot: &Snapshot,
        canon: &Canonicalizer<'_>,
        unit_id: UnitId,
        node: NodeId,
        scope: ScopeId,
    ) -> Result<QueryData, QueryError> {
        let unit = snapshot.unit(unit_id).ok_or(QueryError::NonCanonicalArg)?;
        let name = unit.text_of(node).ok_or(QueryError::NonCanonicalArg)?;
        let decl_id = self
            .resolve_name(snapshot, unit_id, name, scope)
            .ok_or(QueryError::SymbolNotFound)?;
        let decl = unit.decl(decl_id).expect("resolve_name returned a valid DeclId");
        self.dep_cid(canon, unit_id, decl.node);
        let span = unit.span(decl.node).ok_or(QueryError::SymbolNotFound)?;
        Ok(QueryData::DefinitionOf { decl: decl_id, span })
    }

    fn references_to(
        &self,
        snapshot: &Snapshot,
        canon: &Canonicalizer<'_>,
        unit_id: UnitId,
        decl: DeclId,
    ) -> Vec<NodeId> {
        let Some(unit) = snapshot.unit(unit_id) else {
            return Vec::new();
        };
        if let Some(d) = unit.decl(decl) {
            self.dep_cid(canon, unit_id, d.node);
        }
        unit_refs(unit, decl)
    }

    fn type_of(
        &self,
        snapshot: &Snapshot,
        canon: &Canonicalizer<'_>,
        unit_id: UnitId,
        node: NodeId,
    ) -> Result<QueryData, QueryError> {
        let unit = snapshot.unit(unit_id).ok_or(QueryError::NonCanonicalArg)?;
        self.dep_cid(canon, unit_id, node);

        if let Some(type_node) = crate::accessor::var_type_annotation(unit, node) {
            let prim = unit
                .text_of(type_node)
                .and_then(|id| snapshot.interner().try_resolve(id))
                .and_then(PrimitiveType::from_name);
            return Ok(QueryData::TypeOf(TypeHandle::new(type_node, prim)));
        }
        if let Some(type_node) = crate::accessor::func_return_type(unit, node) {
            let prim = unit
                .text_of(type_node)
                .and_then(|id| snapshot.interner().try_resolve(id))
                .and_then(PrimitiveType::from_name);
            return Ok(QueryData::TypeOf(TypeHandle::new(type_node, prim)));
        }
        Err(QueryError::MissingTypeAnnotation)
    }

    fn ir_of(
        &self,
        snapshot: &Snapshot,
        canon: &Canonicalizer<'_>,
        unit_id: UnitId,
        node: NodeId,
    ) -> Result<QueryData, QueryError> {
        let unit = snapshot.unit(unit_id).ok_or(QueryError::NonCanonicalArg)?;
        let body = crate::accessor::func_body(unit, node).ok_or(QueryError::NonCanonicalArg)?;
        self.dep_cid(canon, unit_id, body);
        Ok(QueryData::IROf(IrHandle(body)))
    }

    fn effects_of(&self, snapshot: &Snapshot, unit_id: UnitId, node: NodeId) -> Result<QueryData, QueryError> {
        let unit = snapshot.unit(unit_id).ok_or(QueryError::NonCanonicalArg)?;
        let _ = unit.get_node(node).ok_or(QueryError::NonCanonicalArg)?;
        // Effect inference is external; the core can only ever report the
        // empty/unknown set until an inferencer attaches richer data.
        Ok(QueryData::EffectsOf(Vec::new()))
    }

    fn hover(
        &self,
        snapshot: &Snapshot,
        canon: &Canonicalizer<'_>,
        unit_id: UnitId,
        node: NodeId,
    ) -> Result<QueryData, QueryError> {
        let unit = snapshot.unit(unit_id).ok_or(QueryError::NonCanonicalArg)?;
        let cid = self
            .dep_cid(canon, unit_id, node)
            .ok_or(QueryError::NonCanonicalArg)?;
        let kind = unit.get_node(node).ok_or(QueryError::NonCanonicalArg)?.kind;
        Ok(QueryData::Hover {
            markdown: format!("`{kind:?}` — cid `{}`", cid.to_hex()),
        })
    }

    /// §4.6/§6: apply invalidation for `changed_cids`, removing affected
    /// memo entries and their dependency-graph edges, then report stats.
    pub fn transition(&self, changed_cids: &IndexSet<Cid>) -> InvalidationStats {
        let cache_size_before = self.cache.read().expect("memo cache lock poisoned").len();

        let invalid = {
            let graph = self.graph.lock().expect("dependency graph mutex poisoned");
            graph.invalidation_set(changed_cids)
        };

        let mut removed = 0usize;
        {
            let mut cache = self.cache.write().expect("memo cache lock poisoned");
            let mut graph = self.graph.lock().expect("dependency graph mutex poisoned");
            for key in &invalid {
                if cache.remove(key).is_some() {
                    removed += 1;
                }
                graph.forget(key);
            }
        }

        let stats = InvalidationStats::new(changed_cids.len(), invalid.len(), removed, cache_size_before);
        tracing::debug!(
            changed_cids = stats.changed_cids,
            invalidated = stats.invalidated_queries,
            removed = stats.removed_from_cache,
            "epoch transition"
        );
        stats
    }

    pub fn stats(&self) -> EngineStats {
        let cache_size = self.cache.read().expect("memo cache lock poisoned").len();
        let mut percentiles = HashMap::new();
        for tag in [
            "NodeAt",
            "TypeOf",
            "DefinitionOf",
            "ReferencesTo",
            "Dispatch",
            "ResolveName",
            "IROf",
            "EffectsOf",
            "Hover",
        ] {
            if let Some(p) = self.perf.percentiles(tag) {
                percentiles.insert(tag, p);
            }
        }
        EngineStats {
            cache_size,
            cache_hit_rate: self.perf.cache_hit_rate(),
            percentiles,
        }
    }

    pub fn cache_len(&self) -> usize {
        self.cache.read().expect("memo cache lock poisoned").len()
    }
}

fn unit_refs(unit: &crate::unit::CompilationUnit, decl: DeclId) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut i = 0u32;
    while let Some(r) = unit.decl_ref(crate::ids::RefId::new(i)) {
        if r.to == decl {
            out.push(r.from);
        }
        i += 1;
    }
    out
}
