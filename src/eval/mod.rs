//! Walks an IR tree against a [`MolecularContext`], producing a [`Mask`].
//!
//! [`evaluate`] expands macros first (so a caller can hand it raw parser output
//! directly) and then recurses over the logical layer, dispatching each predicate kind
//! to its sub-evaluator: [`predicate`] for boolean flags/property/compare/regex
//! selections, [`spatial`] for `within`/`exwithin`, [`bonded`] for `bonded`/`exbonded`,
//! [`sequence`] for `sequence`, and [`sameas`] for `same ... as`.

pub mod bonded;
pub mod mask;
pub mod predicate;
pub mod sameas;
pub mod sequence;
pub mod spatial;
pub mod value;

pub use mask::Mask;

use crate::context::MolecularContext;
use crate::error::{EvalError, SelectError};
use crate::ir::{Ir, Logical, Predicate};
use crate::registry::Registry;

/// Expands macro references in `ir`, then evaluates the result against `ctx`. This is
/// the evaluator half of the crate's programmatic API; pair it with
/// [`crate::parser::parse`] (and [`crate::grammar::assemble`]) for the full
/// `assemble -> parse -> expand -> evaluate` pipeline, or call the crate-root
/// [`crate::evaluate`] convenience function to run all four stages at once.
pub fn evaluate(ir: &Ir, ctx: &MolecularContext, registry: &Registry) -> Result<Mask, SelectError> {
    let expanded = crate::macro_expander::expand(ir, registry)?;
    Ok(eval_logical(&expanded, ctx)?)
}

/// Evaluates IR that has already been macro-expanded (e.g. by a caller reusing one
/// expansion across many evaluations of different contexts). Unexpanded `BoolFlag(
/// Macro(_))` nodes are a precondition violation and surface as a [`EvalError::TypeError`].
pub fn evaluate_expanded(ir: &Ir, ctx: &MolecularContext) -> Result<Mask, EvalError> {
    eval_logical(ir, ctx)
}

fn eval_logical(node: &Logical, ctx: &MolecularContext) -> Result<Mask, EvalError> {
    match node {
        Logical::And(a, b) => Ok(eval_logical(a, ctx)? & eval_logical(b, ctx)?),
        Logical::Or(a, b) => Ok(eval_logical(a, ctx)? | eval_logical(b, ctx)?),
        Logical::Xor(a, b) => Ok(eval_logical(a, ctx)? ^ eval_logical(b, ctx)?),
        Logical::Not(a) => Ok(!eval_logical(a, ctx)?),
        Logical::Predicate(p) => eval_predicate(p, ctx),
    }
}

fn eval_predicate(predicate: &Predicate, ctx: &MolecularContext) -> Result<Mask, EvalError> {
    match predicate {
        Predicate::BoolFlag(flag) => predicate::eval_bool_flag(flag, ctx),
        Predicate::PropertySel { field, items, span } => predicate::eval_property(field, items, *span, ctx),
        Predicate::CompareSel { operands, ops, .. } => predicate::eval_compare(operands, ops, ctx),
        Predicate::RegexSel { field_expr, pattern, span } => predicate::eval_regex(field_expr, pattern, *span, ctx),
        Predicate::WithinSel { op, distance, inner, span } => {
            let inner_mask = eval_logical(inner, ctx)?;
            let exclude_seed = matches!(op, crate::ir::SpatialOp::ExWithin);
            spatial::eval_within(exclude_seed, *distance, inner_mask, ctx).map_err(|e| promote_span(e, *span))
        }
        Predicate::BondedSel { op, hops, inner, span } => {
            let inner_mask = eval_logical(inner, ctx)?;
            let exclude_direct = matches!(op, crate::ir::BondedOp::ExBonded);
            bonded::eval_bonded(exclude_direct, *hops, inner_mask, ctx, *span)
        }
        Predicate::SequenceSel { pattern, span } => sequence::eval_sequence(pattern, *span, ctx),
        Predicate::SameAsSel { grouping, inner, .. } => {
            let inner_mask = eval_logical(inner, ctx)?;
            Ok(sameas::eval_same_as(*grouping, inner_mask, ctx))
        }
    }
}

/// `within`'s coordinate lookups carry a default span (they are auxiliary-index
/// plumbing, not parsed text); re-anchor any error they raise to the `within` node's
/// own span so callers still get a span that falls inside the original query.
fn promote_span(err: EvalError, span: crate::error::Span) -> EvalError {
    match err {
        EvalError::UnknownField { name, .. } => EvalError::UnknownField { name, span },
        other => other,
    }
}
