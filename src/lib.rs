//! MolSelect: a domain-specific query language for selecting subsets of atoms in
//! molecular structures (proteins, nucleic acids, ligands, solvent).
//!
//! A query is a textual expression that, evaluated against an atom table with optional
//! topology and coordinates, produces a Boolean mask of length `N` (one entry per
//! atom): `true` means "selected". This crate is the selection *engine* only — the
//! grammar, the keyword/macro registry, the typed IR the parser produces, and the
//! evaluator that walks that IR against a [`MolecularContext`]. Loading structures from
//! PDB/mmCIF files, inferring bonds, assigning secondary structure, and presenting a
//! CLI/REPL/visualization front-end are all out of scope; callers populate a
//! [`MolecularContext`] however they like and hand it to [`evaluate`].
//!
//! # Pipeline
//!
//! ```text
//! query text -> assemble(registry) -> parse -> IR -> macro expand -> evaluate(context) -> mask
//! ```
//!
//! ```
//! use molselect::context::{Column, MolecularContext};
//! use molselect::registry::Registry;
//!
//! let registry = Registry::with_builtins();
//! let grammar = molselect::grammar::assemble(&registry);
//! let ir = molselect::parser::parse(&grammar, "name CA").expect("valid query");
//!
//! let ctx = MolecularContext::builder(4)
//!     .with_column("name", Column::Str(vec!["N".into(), "CA".into(), "C".into(), "O".into()]))
//!     .build();
//!
//! let mask = molselect::eval::evaluate(&ir, &ctx, &registry).expect("evaluates");
//! assert_eq!(mask.as_slice(), &[false, true, false, false]);
//! ```

pub mod context;
pub mod error;
pub mod eval;
pub mod grammar;
pub mod ir;
pub mod lexer;
pub mod macro_expander;
pub mod parser;
pub mod registry;

pub use context::MolecularContext;
pub use error::SelectError;
pub use eval::Mask;
pub use ir::Ir;
pub use registry::Registry;

/// Runs the full `assemble -> parse -> expand -> evaluate` pipeline in one call: parses
/// `query` against `registry`'s current grammar and evaluates the result against `ctx`.
///
/// Callers issuing many queries against one registry should instead call
/// [`grammar::assemble`] once and reuse the [`grammar::Grammar`] across
/// [`parser::parse`] calls — the registry and its assembled grammar are immutable
/// after the last registration, so this is always safe to do, including concurrently
/// from multiple threads.
pub fn evaluate(query: &str, ctx: &MolecularContext, registry: &Registry) -> Result<Mask, SelectError> {
    let grammar = grammar::assemble(registry);
    let ir = parser::parse(&grammar, query)?;
    eval::evaluate(&ir, ctx, registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Column;

    fn registry() -> Registry {
        Registry::with_builtins()
    }

    fn four_atom_alanine() -> MolecularContext {
        MolecularContext::builder(4)
            .with_column("resname", Column::Str(vec!["ALA".into(); 4]))
            .with_column("name", Column::Str(vec!["N".into(), "CA".into(), "C".into(), "O".into()]))
            .build()
    }

    /// A bare field/value pair selects the atoms whose column equals the value.
    #[test]
    fn name_ca_selects_only_the_alpha_carbon() {
        let ctx = four_atom_alanine();
        let mask = evaluate("name CA", &ctx, &registry()).unwrap();
        assert_eq!(mask.as_slice(), &[false, true, false, false]);
    }

    /// A comparison with no field reference on either side carries no per-atom
    /// information and is rejected rather than silently broadcast to every atom.
    #[test]
    fn pure_numeric_comparison_is_rejected() {
        let ctx = four_atom_alanine();
        let err = evaluate("sqrt(25) < 10", &ctx, &registry()).unwrap_err();
        assert!(matches!(err, SelectError::Eval(error::EvalError::PureNumericMask { .. })));
    }

    /// Every successful evaluation produces a mask with exactly one entry per atom.
    #[test]
    fn mask_length_always_matches_atom_count() {
        let ctx = four_atom_alanine();
        let mask = evaluate("all", &ctx, &registry()).unwrap();
        assert_eq!(mask.len(), ctx.n());
    }

    /// `not not q == q`.
    #[test]
    fn double_negation_is_identity() {
        let ctx = four_atom_alanine();
        let reg = registry();
        let once = evaluate("name CA", &ctx, &reg).unwrap();
        let twice = evaluate("not not name CA", &ctx, &reg).unwrap();
        assert_eq!(once.as_slice(), twice.as_slice());
    }

    /// `q or not q == all`.
    #[test]
    fn excluded_middle_selects_everything() {
        let ctx = four_atom_alanine();
        let mask = evaluate("(name CA) or not (name CA)", &ctx, &registry()).unwrap();
        assert!(mask.as_slice().iter().all(|&b| b));
    }

    /// Implicit `and` (two predicates side by side) matches explicit `and`.
    #[test]
    fn implicit_and_matches_explicit_and() {
        let ctx = four_atom_alanine();
        let reg = registry();
        let implicit = evaluate("resname ALA name CA", &ctx, &reg).unwrap();
        let explicit = evaluate("resname ALA and name CA", &ctx, &reg).unwrap();
        assert_eq!(implicit.as_slice(), explicit.as_slice());
    }

    /// List equivalence: `K v1 v2 == K v1 or K v2`.
    #[test]
    fn list_item_matches_or_of_singletons() {
        let ctx = four_atom_alanine();
        let reg = registry();
        let list = evaluate("name CA C", &ctx, &reg).unwrap();
        let or_form = evaluate("name CA or name C", &ctx, &reg).unwrap();
        assert_eq!(list.as_slice(), or_form.as_slice());
    }

    /// Unknown fields and unbound variables surface as typed errors.
    #[test]
    fn unknown_field_is_reported() {
        let ctx = four_atom_alanine();
        let err = evaluate("beta 10", &ctx, &registry()).unwrap_err();
        assert!(matches!(err, SelectError::Eval(error::EvalError::UnknownField { .. })));
    }
}
