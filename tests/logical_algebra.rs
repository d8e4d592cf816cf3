//! Boolean-algebra invariants over masks: De Morgan's laws, idempotence,
//! commutativity/associativity, and implicit-`and` equivalence, checked against a small
//! fixed context rather than exhaustively per query.

use molselect::context::{Column, MolecularContext};
use molselect::registry::Registry;
use pretty_assertions::assert_eq;

fn ctx() -> MolecularContext {
    MolecularContext::builder(6)
        .with_column("resname", Column::Str(vec!["ALA".into(), "ALA".into(), "GLY".into(), "GLY".into(), "HOH".into(), "HOH".into()]))
        .with_column("name", Column::Str(vec!["N".into(), "CA".into(), "N".into(), "CA".into(), "O".into(), "H1".into()]))
        .build()
}

fn eval(q: &str) -> Vec<bool> {
    let reg = Registry::with_builtins();
    molselect::evaluate(q, &ctx(), &reg).unwrap_or_else(|e| panic!("`{q}` failed: {e}")).as_slice().to_vec()
}

#[test]
fn not_not_is_identity() {
    assert_eq!(eval("resname ALA"), eval("not not resname ALA"));
}

#[test]
fn q_and_q_is_q() {
    assert_eq!(eval("resname ALA"), eval("resname ALA and resname ALA"));
}

#[test]
fn q_or_not_q_is_all() {
    let mask = eval("(resname ALA) or not (resname ALA)");
    assert!(mask.iter().all(|&b| b));
}

#[test]
fn de_morgan_not_and() {
    assert_eq!(
        eval("not (resname ALA and name CA)"),
        eval("(not resname ALA) or (not name CA)"),
    );
}

#[test]
fn de_morgan_not_or() {
    assert_eq!(
        eval("not (resname ALA or name CA)"),
        eval("(not resname ALA) and (not name CA)"),
    );
}

#[test]
fn and_or_xor_are_commutative() {
    assert_eq!(eval("resname ALA and name CA"), eval("name CA and resname ALA"));
    assert_eq!(eval("resname ALA or name CA"), eval("name CA or resname ALA"));
    assert_eq!(eval("resname ALA xor name CA"), eval("name CA xor resname ALA"));
}

#[test]
fn and_is_associative() {
    assert_eq!(
        eval("(resname ALA and name CA) and resname GLY"),
        eval("resname ALA and (name CA and resname GLY)"),
    );
}

#[test]
fn implicit_and_matches_explicit_and_for_arbitrary_predicates() {
    assert_eq!(eval("resname ALA name CA"), eval("resname ALA and name CA"));
    assert_eq!(eval("water name O"), eval("water and name O"));
}
