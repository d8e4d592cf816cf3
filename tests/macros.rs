//! Macro expansion: equivalence checks plus sanity checks on a handful of built-in
//! catalog entries.

use molselect::context::{Column, MolecularContext};
use molselect::registry::Registry;
use pretty_assertions::assert_eq;

fn protein_plus_water() -> MolecularContext {
    // Two protein atoms (N, CA of an ALA) and one water oxygen.
    MolecularContext::builder(3)
        .with_column("resname", Column::Str(vec!["ALA".into(), "ALA".into(), "HOH".into()]))
        .with_column("name", Column::Str(vec!["N".into(), "CA".into(), "O".into()]))
        .build()
}

fn eval(q: &str, ctx: &MolecularContext) -> Vec<bool> {
    let reg = Registry::with_builtins();
    molselect::evaluate(q, ctx, &reg).unwrap_or_else(|e| panic!("`{q}` failed: {e}")).as_slice().to_vec()
}

/// `protein and name CA` selects only the alpha carbon.
#[test]
fn protein_and_name_ca_selects_the_alpha_carbon() {
    let ctx = protein_plus_water();
    assert_eq!(eval("protein and name CA", &ctx), vec![false, true, false]);
}

#[test]
fn water_macro_matches_solvent_residue_names() {
    let ctx = protein_plus_water();
    assert_eq!(eval("water", &ctx), vec![false, false, true]);
}

#[test]
fn protein_excludes_water() {
    let ctx = protein_plus_water();
    assert_eq!(eval("protein", &ctx), vec![true, true, false]);
    assert_eq!(eval("protein and water", &ctx), vec![false, false, false]);
}

#[test]
fn calpha_macro_matches_protein_and_name_ca() {
    let ctx = protein_plus_water();
    assert_eq!(eval("calpha", &ctx), eval("protein and name CA", &ctx));
}

/// Hidden (`_`-prefixed) helper macros are expandable but not offered on the query
/// surface as visible catalog entries.
#[test]
fn hidden_helper_macros_are_excluded_from_the_visible_catalog() {
    let reg = Registry::with_builtins();
    assert!(reg.macro_entry("_std_aa").is_some());
    assert!(reg.iter_visible_macros().all(|m| m.name != "_std_aa"));
}

#[test]
fn backbone_macro_is_a_subset_of_protein() {
    let ctx = protein_plus_water();
    let backbone = eval("backbone", &ctx);
    let protein = eval("protein", &ctx);
    assert!(backbone.iter().zip(&protein).all(|(&b, &p)| !b || p));
}
