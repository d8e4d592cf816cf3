//! Spatial (`within`/`exwithin`) invariants over a three-atom line.

use molselect::context::{Column, MolecularContext};
use molselect::registry::Registry;
use pretty_assertions::assert_eq;

fn three_atom_line() -> MolecularContext {
    MolecularContext::builder(3)
        .with_column("index", Column::Int(vec![0, 1, 2]))
        .with_column("x", Column::Float(vec![0.0, 1.0, 5.0]))
        .with_column("y", Column::Float(vec![0.0, 0.0, 0.0]))
        .with_column("z", Column::Float(vec![0.0, 0.0, 0.0]))
        .build()
}

fn eval(q: &str, ctx: &MolecularContext) -> Vec<bool> {
    let reg = Registry::with_builtins();
    molselect::evaluate(q, ctx, &reg).unwrap_or_else(|e| panic!("`{q}` failed: {e}")).as_slice().to_vec()
}

/// Atom 0 is at the origin, atom 1 is 1 unit away, atom 2 is 5 units away.
#[test]
fn within_2_of_atom_0_selects_the_near_neighbor_only() {
    let ctx = three_atom_line();
    assert_eq!(eval("within 2 of index 0", &ctx), vec![true, true, false]);
}

/// `exwithin` drops the seed atom itself from the `within` result.
#[test]
fn exwithin_2_of_atom_0_excludes_the_seed() {
    let ctx = three_atom_line();
    assert_eq!(eval("exwithin 2 of index 0", &ctx), vec![false, true, false]);
}

/// `within 0 of X` selects exactly the atoms of `X`.
#[test]
fn within_zero_is_reflexive() {
    let ctx = three_atom_line();
    assert_eq!(eval("within 0 of index 1", &ctx), eval("index 1", &ctx));
}

/// `exwithin d of X == (within d of X) and not X`.
#[test]
fn exclusion_law_holds() {
    let ctx = three_atom_line();
    assert_eq!(eval("exwithin 10 of index 0", &ctx), eval("(within 10 of index 0) and not (index 0)", &ctx));
}

#[test]
fn within_is_symmetric_between_neighbors() {
    let ctx = three_atom_line();
    // atom 1 is within 1 of atom 0, and atom 0 is within 1 of atom 1.
    assert_eq!(eval("within 1 of index 0", &ctx), vec![true, true, false]);
    assert_eq!(eval("within 1 of index 1", &ctx), vec![true, true, false]);
}
