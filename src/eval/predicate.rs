//! Evaluation of the non-structural predicate forms: boolean flags, property
//! selections, comparison chains, and regex selections.

use regex::Regex;

use crate::context::{Column, MolecularContext};
use crate::error::{EvalError, Span};
use crate::ir::{BoolFlag, CmpOp, Expr, PropertyField, PropertyItem, TypedExpr};

use super::mask::Mask;
use super::value::{eval_num, numeric_column, NumValue};

pub fn eval_bool_flag(flag: &BoolFlag, ctx: &MolecularContext) -> Result<Mask, EvalError> {
    match flag {
        BoolFlag::All => Ok(Mask::all_true(ctx.n())),
        BoolFlag::None => Ok(Mask::all_false(ctx.n())),
        BoolFlag::Macro(name) => Err(EvalError::TypeError {
            message: format!(
                "macro `{name}` reached the evaluator unexpanded; run macro_expander::expand before evaluate"
            ),
            span: Span::default(),
        }),
        BoolFlag::KeywordFlag(name) => eval_keyword_flag(name, ctx),
    }
}

fn eval_keyword_flag(name: &str, ctx: &MolecularContext) -> Result<Mask, EvalError> {
    match ctx.column(name) {
        Some(Column::Int(values)) => Ok(Mask::from_fn(ctx.n(), |i| values[i] != 0)),
        Some(Column::Float(values)) => Ok(Mask::from_fn(ctx.n(), |i| values[i] != 0.0)),
        Some(Column::Str(values)) => Ok(Mask::from_fn(ctx.n(), |i| !values[i].is_empty())),
        None => Err(EvalError::UnknownField { name: name.to_owned(), span: Span::default() }),
    }
}

pub fn eval_compare(
    operands: &[TypedExpr],
    ops: &[CmpOp],
    ctx: &MolecularContext,
) -> Result<Mask, EvalError> {
    let values: Vec<NumValue> = operands.iter().map(|e| eval_num(e, ctx)).collect::<Result<_, _>>()?;
    let n = ctx.n();
    let mut mask = Mask::all_true(n);
    for (pair, op) in values.windows(2).zip(ops) {
        let lhs = &pair[0];
        let rhs = &pair[1];
        let step = Mask::from_fn(n, |i| apply_cmp(*op, lhs.at(i), rhs.at(i)));
        mask = mask & step;
    }
    Ok(mask)
}

fn apply_cmp(op: CmpOp, a: f64, b: f64) -> bool {
    match op {
        CmpOp::Le => a <= b,
        CmpOp::Ge => a >= b,
        CmpOp::Eq => a == b,
        CmpOp::Ne => a != b,
        CmpOp::Lt => a < b,
        CmpOp::Gt => a > b,
    }
}

pub fn eval_regex(field_expr: &TypedExpr, pattern: &str, span: Span, ctx: &MolecularContext) -> Result<Mask, EvalError> {
    check_pattern_len(pattern, span, ctx)?;
    let re = Regex::new(pattern).map_err(|e| EvalError::PatternError { message: e.to_string(), span })?;
    let values = eval_stringify(field_expr, ctx)?;
    Ok(Mask::from_fn(ctx.n(), |i| re.is_match(&values[i])))
}

/// Rejects a regex literal longer than [`crate::context::EvalLimits::max_regex_pattern_len`],
/// the ambient guard against a pathologically large pattern compiling to a
/// pathologically expensive automaton.
pub(crate) fn check_pattern_len(pattern: &str, span: Span, ctx: &MolecularContext) -> Result<(), EvalError> {
    if let Some(limit) = ctx.limits().max_regex_pattern_len {
        if pattern.len() > limit {
            return Err(EvalError::LimitExceeded {
                message: format!("regex pattern of {} bytes exceeds the configured limit of {limit}", pattern.len()),
                span,
            });
        }
    }
    Ok(())
}

/// Renders a field expression's per-atom value as a string for regex matching. A bare
/// `FieldRef` to a string column is used verbatim; everything else (including a
/// `FieldRef` to a numeric column) goes through
/// numeric evaluation and formatting, since the regex matcher is external and only
/// ever sees text.
fn eval_stringify(expr: &TypedExpr, ctx: &MolecularContext) -> Result<Vec<String>, EvalError> {
    if let Expr::FieldRef(name) = &expr.expr {
        match ctx.column(name) {
            Some(Column::Str(values)) => return Ok(values.clone()),
            Some(Column::Int(values)) => return Ok(values.iter().map(i64::to_string).collect()),
            Some(Column::Float(values)) => return Ok(values.iter().map(|v| format_float(*v)).collect()),
            None => return Err(EvalError::UnknownField { name: name.clone(), span: expr.span }),
        }
    }
    let value = eval_num(expr, ctx)?;
    Ok((0..ctx.n()).map(|i| format_float(value.at(i))).collect())
}

fn format_float(v: f64) -> String {
    if v.fract() == 0.0 && v.is_finite() {
        format!("{v:.0}")
    } else {
        v.to_string()
    }
}

pub fn eval_property(
    field: &PropertyField,
    items: &[PropertyItem],
    span: Span,
    ctx: &MolecularContext,
) -> Result<Mask, EvalError> {
    let n = ctx.n();
    let mut mask = Mask::all_false(n);
    for item in items {
        let item_mask = match field {
            PropertyField::Keyword(name) => eval_item_against_column(name, item, ctx, span)?,
            PropertyField::Expr(expr) => eval_item_against_expr(expr, item, ctx)?,
        };
        mask = mask | item_mask;
    }
    Ok(mask)
}

fn eval_item_against_column(name: &str, item: &PropertyItem, ctx: &MolecularContext, span: Span) -> Result<Mask, EvalError> {
    let column = ctx.column(name).ok_or_else(|| EvalError::UnknownField { name: name.to_owned(), span })?;
    let n = ctx.n();
    match (column, item) {
        (Column::Str(values), PropertyItem::StringLit(lit)) => {
            let case_insensitive = ctx.is_case_insensitive(name);
            Ok(Mask::from_fn(n, |i| str_eq(&values[i], lit, case_insensitive)))
        }
        (Column::Str(values), PropertyItem::Regex(pattern)) => {
            check_pattern_len(pattern, span, ctx)?;
            let re = Regex::new(pattern).map_err(|e| EvalError::PatternError { message: e.to_string(), span })?;
            Ok(Mask::from_fn(n, |i| re.is_match(&values[i])))
        }
        (Column::Int(values), PropertyItem::Number(expr)) => {
            let target = eval_num(expr, ctx)?;
            Ok(Mask::from_fn(n, |i| (values[i] as f64) == target.at(i)))
        }
        (Column::Float(values), PropertyItem::Number(expr)) => {
            let target = eval_num(expr, ctx)?;
            Ok(Mask::from_fn(n, |i| values[i] == target.at(i)))
        }
        (Column::Int(_) | Column::Float(_), PropertyItem::Range { lo, hi, step }) => {
            let values = numeric_column(ctx, name, span)?;
            let is_int = matches!(column, Column::Int(_));
            let lo_v = eval_num(lo, ctx)?;
            let hi_v = eval_num(hi, ctx)?;
            let step_v = step.as_ref().map(|s| eval_num(s, ctx)).transpose()?;
            Ok(Mask::from_fn(n, |i| {
                range_matches(values[i], lo_v.at(i), hi_v.at(i), step_v.as_ref().map(|s| s.at(i)), is_int)
            }))
        }
        (Column::Int(_) | Column::Float(_), PropertyItem::Regex(pattern)) => {
            let values = numeric_column(ctx, name, span)?;
            check_pattern_len(pattern, span, ctx)?;
            let re = Regex::new(pattern).map_err(|e| EvalError::PatternError { message: e.to_string(), span })?;
            Ok(Mask::from_fn(n, |i| re.is_match(&format_float(values[i]))))
        }
        (Column::Str(_), PropertyItem::Number(_) | PropertyItem::Range { .. }) => Err(EvalError::TypeError {
            message: format!("field `{name}` is a string column; a numeric item requires a numeric field"),
            span,
        }),
        (Column::Int(_) | Column::Float(_), PropertyItem::StringLit(_)) => Err(EvalError::TypeError {
            message: format!("field `{name}` is a numeric column; a string item requires a string field"),
            span,
        }),
    }
}

fn eval_item_against_expr(expr: &TypedExpr, item: &PropertyItem, ctx: &MolecularContext) -> Result<Mask, EvalError> {
    let n = ctx.n();
    let field = eval_num(expr, ctx)?;
    match item {
        PropertyItem::Number(target_expr) => {
            let target = eval_num(target_expr, ctx)?;
            Ok(Mask::from_fn(n, |i| field.at(i) == target.at(i)))
        }
        PropertyItem::Range { lo, hi, step } => {
            let lo_v = eval_num(lo, ctx)?;
            let hi_v = eval_num(hi, ctx)?;
            let step_v = step.as_ref().map(|s| eval_num(s, ctx)).transpose()?;
            Ok(Mask::from_fn(n, |i| {
                range_matches(field.at(i), lo_v.at(i), hi_v.at(i), step_v.as_ref().map(|s| s.at(i)), false)
            }))
        }
        PropertyItem::Regex(pattern) => {
            check_pattern_len(pattern, expr.span, ctx)?;
            let re = Regex::new(pattern)
                .map_err(|e| EvalError::PatternError { message: e.to_string(), span: expr.span })?;
            Ok(Mask::from_fn(n, |i| re.is_match(&format_float(field.at(i)))))
        }
        PropertyItem::StringLit(lit) => {
            Ok(Mask::from_fn(n, |i| format_float(field.at(i)) == *lit))
        }
    }
}

fn str_eq(value: &str, lit: &str, case_insensitive: bool) -> bool {
    if case_insensitive {
        value.eq_ignore_ascii_case(lit)
    } else {
        value == lit
    }
}

/// `RangeItem(lo, hi, step)` matching: inclusive `lo <= v <= hi`, and when `step` is
/// present, only values on the `lo + k*step` lattice. Integer semantics
/// (exact lattice membership) apply only when the field is an integer column and every
/// bound is itself whole-valued; otherwise matching uses a small relative tolerance to
/// absorb floating-point round-off in the lattice computation.
fn range_matches(v: f64, lo: f64, hi: f64, step: Option<f64>, field_is_int: bool) -> bool {
    if v < lo || v > hi {
        return false;
    }
    let Some(step) = step else { return true };
    if step == 0.0 {
        return v == lo;
    }
    let k = (v - lo) / step;
    if field_is_int && lo.fract() == 0.0 && hi.fract() == 0.0 && step.fract() == 0.0 {
        k >= -1e-9 && (k - k.round()).abs() < 1e-9
    } else {
        let tol = 1e-9 * step.abs().max(1.0);
        k >= -1e-9 && (v - (lo + k.round() * step)).abs() <= tol
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::EvalLimits;

    fn ctx_with_pattern_limit(limit: usize) -> MolecularContext {
        MolecularContext::builder(1)
            .with_column("name", Column::Str(vec!["CA".to_owned()]))
            .with_limits(EvalLimits { max_bonded_hops: None, max_regex_pattern_len: Some(limit) })
            .build()
    }

    #[test]
    fn pattern_within_the_limit_passes() {
        let ctx = ctx_with_pattern_limit(4);
        assert!(check_pattern_len("C.*", Span::default(), &ctx).is_ok());
    }

    #[test]
    fn pattern_over_the_limit_is_rejected() {
        let ctx = ctx_with_pattern_limit(2);
        assert!(matches!(
            check_pattern_len("C.*", Span::default(), &ctx),
            Err(EvalError::LimitExceeded { .. })
        ));
    }

    #[test]
    fn unbounded_context_never_rejects_a_pattern() {
        let ctx = MolecularContext::builder(1).with_column("name", Column::Str(vec!["CA".to_owned()])).build();
        assert!(check_pattern_len(&"x".repeat(10_000), Span::default(), &ctx).is_ok());
    }
}
