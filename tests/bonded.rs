//! `bonded`/`exbonded` over topology, plus the `NoTopology` failure mode for a context
//! with no bond information.

use molselect::context::{Column, MolecularContext};
use molselect::error::{EvalError, SelectError};
use molselect::registry::Registry;
use pretty_assertions::assert_eq;

fn linear_chain() -> MolecularContext {
    // A-B-C-D
    MolecularContext::builder(4)
        .with_column("index", Column::Int(vec![0, 1, 2, 3]))
        .with_topology(vec![vec![1], vec![0, 2], vec![1, 3], vec![2]])
        .build()
}

fn eval(q: &str, ctx: &MolecularContext) -> Result<Vec<bool>, SelectError> {
    let reg = Registry::with_builtins();
    molselect::evaluate(q, ctx, &reg).map(|m| m.as_slice().to_vec())
}

/// On a 4-atom linear chain A-B-C-D, exactly 2 hops from A reaches only C.
#[test]
fn two_hops_reaches_only_the_second_neighbor() {
    let ctx = linear_chain();
    assert_eq!(eval("bonded 2 to index 0", &ctx).unwrap(), vec![false, false, true, false]);
}

/// Exactly 1 hop from A reaches only its direct neighbor B.
#[test]
fn one_hop_reaches_only_the_direct_neighbor() {
    let ctx = linear_chain();
    assert_eq!(eval("bonded 1 to index 0", &ctx).unwrap(), vec![false, true, false, false]);
}

#[test]
fn exbonded_one_hop_excludes_the_direct_neighbors_it_just_selected() {
    let ctx = linear_chain();
    // `bonded 1` selects exactly the direct neighbors; `exbonded` then removes that same
    // hop-1 set, so at hops == 1 the exclusion always empties the result.
    assert_eq!(eval("exbonded 1 to index 0", &ctx).unwrap(), vec![false, false, false, false]);
}

#[test]
fn exbonded_beyond_one_hop_is_unaffected_by_the_exclusion() {
    let ctx = linear_chain();
    // At hops > 1 the "exactly hops" set and the hop-1 set are disjoint (BFS distance is
    // unique per atom), so `exbonded` and `bonded` agree.
    assert_eq!(eval("exbonded 2 to index 0", &ctx).unwrap(), eval("bonded 2 to index 0", &ctx).unwrap());
}

#[test]
fn zero_hops_selects_only_the_seed() {
    let ctx = linear_chain();
    assert_eq!(eval("bonded 0 to index 0", &ctx).unwrap(), vec![true, false, false, false]);
}

#[test]
fn no_topology_is_reported() {
    let ctx = MolecularContext::builder(2).with_column("index", Column::Int(vec![0, 1])).build();
    let err = eval("bonded 1 to index 0", &ctx).unwrap_err();
    assert!(matches!(err, SelectError::Eval(EvalError::NoTopology { .. })));
}
