//! The Dispatch algorithm (§4.5 step 3): candidate walk, specificity
//! scoring, and ambiguity detection for resolving a call's target
//! declaration from a name, a lexical scope, and concrete argument types.

use janus_core::Interner;

use crate::decl::DeclKind;
use crate::ids::{ScopeId, StringId, UnitId};
use crate::storage::Snapshot;
use crate::types::{conversion_distance, DispatchResult, PrimitiveType};

use super::{QueryData, QueryError};

/// A function decl is a dispatch candidate if its declared parameter types
/// (read off its `Param` children's type annotations) are each compatible
/// with the corresponding argument type, per the fixed conversion lattice.
/// Specificity is `concrete_param_count * 1000 - total_conversion_distance`
/// (§4.5 step 3/§9): exact matches score highest, and among exact matches
/// the candidate needing fewer implicit conversions elsewhere wins.
struct Candidate {
    decl: crate::ids::DeclId,
    specificity: i64,
}

pub fn run_dispatch(
    snapshot: &Snapshot,
    canon: &crate::cid::Canonicalizer<'_>,
    unit_id: UnitId,
    name: StringId,
    scope: ScopeId,
    arg_types: &[PrimitiveType],
) -> Result<QueryData, QueryError> {
    let unit = snapshot.unit(unit_id).ok_or(QueryError::NonCanonicalArg)?;

    let mut candidates = Vec::new();
    let mut current = Some(scope);
    while let Some(scope_id) = current {
        for (decl_id, decl) in unit.decls() {
            if decl.kind != DeclKind::Function || decl.scope != scope_id || decl.name != name {
                continue;
            }
            if let Some(specificity) =
                score_candidate(unit, snapshot.interner(), decl.node, arg_types)
            {
                if let Some(cid) = canon.cid(unit_id, decl.node) {
                    super::record_cid_dep(cid);
                }
                candidates.push(Candidate {
                    decl: decl_id,
                    specificity,
                });
            }
        }
        // Once a scope yields any matching name, stop widening outward —
        // an inner function shadows an outer one of the same name rather
        // than competing with it on specificity.
        if !candidates.is_empty() {
            break;
        }
        current = unit.scope(scope_id).and_then(|s| s.parent);
    }

    let Some(best) = candidates.iter().map(|c| c.specificity).max() else {
        return Err(QueryError::NoCompatibleFunction);
    };
    let winners: Vec<&Candidate> = candidates.iter().filter(|c| c.specificity == best).collect();

    if winners.len() > 1 {
        return Err(QueryError::AmbiguousDispatch);
    }

    let winner = winners[0];
    Ok(QueryData::Dispatch(DispatchResult {
        decl: winner.decl,
        specificity: winner.specificity,
    }))
}

/// `None` if the candidate's arity doesn't match or a parameter type isn't
/// a known primitive (non-primitive parameter types are out of scope for
/// dispatch scoring, per [`crate::types`]'s own limits). `Some(specificity)`
/// otherwise, or a rejection when any parameter is incompatible.
fn score_candidate(
    unit: &crate::unit::CompilationUnit,
    interner: &Interner,
    func_node: crate::ids::NodeId,
    arg_types: &[PrimitiveType],
) -> Option<i64> {
    let params = crate::accessor::func_params(unit, func_node)?;
    if params.len() != arg_types.len() {
        return None;
    }

    let mut total_distance: i64 = 0;
    let mut concrete_count: i64 = 0;

    for (&param, &arg_ty) in params.iter().zip(arg_types) {
        let type_node = crate::accessor::param_type(unit, param)?;
        let type_name = unit.text_of(type_node)?;
        let type_str = interner.try_resolve(type_name)?;
        let param_ty = PrimitiveType::from_name(type_str)?;

        let distance = conversion_distance(arg_ty, param_ty)?;
        total_distance += distance as i64;
        concrete_count += 1;
    }

    Some(concrete_count * 1000 - total_distance)
}
