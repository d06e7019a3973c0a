//! Dependency graph and invalidator (§4.6). Reverse indices from a CID or a
//! QueryKey to the set of QueryKeys whose result depends on it, plus the
//! transitive-closure invalidation algorithm. Built on `indexmap` for
//! deterministic iteration order — reproducible invalidation stats and
//! tests matter more here than raw hashing speed, the same tradeoff the
//! dependency/SCC graph code this is grounded on makes.

use indexmap::IndexSet;
use indexmap::map::IndexMap;
use serde::Serialize;

use crate::cid::Cid;
use crate::query::QueryKey;

#[derive(Default, Debug)]
pub struct DependencyGraph {
    cid_to_queries: IndexMap<Cid, IndexSet<QueryKey>>,
    /// key -> the set of queries that called it (i.e. whose DependencySet
    /// contains `key`). Invalidating `key` must transitively invalidate
    /// everything in this set.
    query_to_queries: IndexMap<QueryKey, IndexSet<QueryKey>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the dependency edges captured while computing `key`.
    pub fn record<C, Q>(&mut self, key: &QueryKey, cids: C, queries: Q)
    where
        C: IntoIterator<Item = Cid>,
        Q: IntoIterator<Item = QueryKey>,
    {
        for cid in cids {
            self.cid_to_queries.entry(cid).or_default().insert(key.clone());
        }
        for dep in queries {
            self.query_to_queries.entry(dep).or_default().insert(key.clone());
        }
    }

    /// Drop all edges mentioning `key`, in either direction. Called after a
    /// key's memo entry is evicted so the graph doesn't grow without bound.
    pub fn forget(&mut self, key: &QueryKey) {
        self.query_to_queries.shift_remove(key);
        for set in self.cid_to_queries.values_mut() {
            set.shift_remove(key);
        }
        for set in self.query_to_queries.values_mut() {
            set.shift_remove(key);
        }
    }

    /// §4.6 invalidation algorithm: seed from the CIDs in `changed`, then
    /// transitively close over `query_to_queries`.
    pub fn invalidation_set(&self, changed: &IndexSet<Cid>) -> IndexSet<QueryKey> {
        let mut invalid: IndexSet<QueryKey> = IndexSet::new();
        let mut frontier: Vec<QueryKey> = Vec::new();

        for cid in changed {
            if let Some(queries) = self.cid_to_queries.get(cid) {
                for q in queries {
                    if invalid.insert(q.clone()) {
                        frontier.push(q.clone());
                    }
                }
            }
        }

        while let Some(q) = frontier.pop() {
            if let Some(dependents) = self.query_to_queries.get(&q) {
                for dep in dependents {
                    if invalid.insert(dep.clone()) {
                        frontier.push(dep.clone());
                    }
                }
            }
        }

        invalid
    }

    pub fn edge_count(&self) -> usize {
        self.cid_to_queries.values().map(|s| s.len()).sum::<usize>()
            + self.query_to_queries.values().map(|s| s.len()).sum::<usize>()
    }
}

/// `{ changed_cids, invalidated_queries, removed_from_cache, efficiency }`,
/// the stable JSON shape from §6.
#[derive(Clone, Copy, PartialEq, Debug, Serialize)]
pub struct InvalidationStats {
    pub changed_cids: usize,
    pub invalidated_queries: usize,
    pub removed_from_cache: usize,
    pub efficiency: f64,
}

impl InvalidationStats {
    pub fn new(changed_cids: usize, invalidated_queries: usize, removed_from_cache: usize, cache_size_before: usize) -> Self {
        let efficiency = if cache_size_before == 0 {
            0.0
        } else {
            invalidated_queries as f64 / cache_size_before as f64
        };
        Self {
            changed_cids,
            invalidated_queries,
            removed_from_cache,
            efficiency,
        }
    }
}
