//! Parse-time and static-semantic failure modes: `PureNumericMask` plus malformed-query
//! and unknown-identifier reporting.

use molselect::context::{Column, MolecularContext};
use molselect::error::{EvalError, ParseError, SelectError};
use molselect::registry::Registry;

fn four_atom_alanine() -> MolecularContext {
    MolecularContext::builder(4)
        .with_column("resname", Column::Str(vec!["ALA".into(); 4]))
        .with_column("name", Column::Str(vec!["N".into(), "CA".into(), "C".into(), "O".into()]))
        .build()
}

fn eval(q: &str) -> Result<Vec<bool>, SelectError> {
    let reg = Registry::with_builtins();
    molselect::evaluate(q, &four_atom_alanine(), &reg).map(|m| m.as_slice().to_vec())
}

/// A comparison whose both sides are pure-numeric can never produce a mask, and is
/// rejected before evaluation even runs.
#[test]
fn comparison_of_two_pure_numeric_expressions_is_rejected() {
    let err = eval("sqrt(25) < 10").unwrap_err();
    assert!(matches!(err, SelectError::Eval(EvalError::PureNumericMask { .. })));
}

#[test]
fn pure_numeric_arithmetic_alone_is_also_rejected() {
    let err = eval("1 + 1 < 2").unwrap_err();
    assert!(matches!(err, SelectError::Eval(EvalError::PureNumericMask { .. })));
}

#[test]
fn unbalanced_parens_is_a_parse_error() {
    let err = eval("(name CA").unwrap_err();
    assert!(matches!(err, SelectError::Parse(ParseError { .. })));
}

#[test]
fn dangling_operator_is_a_parse_error() {
    let err = eval("name CA and").unwrap_err();
    assert!(matches!(err, SelectError::Parse(ParseError { .. })));
}

#[test]
fn empty_query_is_a_parse_error() {
    let err = eval("").unwrap_err();
    assert!(matches!(err, SelectError::Parse(ParseError { .. })));
}

/// An identifier that is neither a keyword, a macro, nor a column on the context.
#[test]
fn unknown_bare_identifier_is_a_parse_error() {
    let err = eval("frobnicate").unwrap_err();
    assert!(matches!(err, SelectError::Parse(ParseError { .. })));
}

/// A keyword known to the registry but absent from this particular context's columns.
#[test]
fn keyword_with_no_backing_column_is_an_unknown_field() {
    let err = eval("beta 10").unwrap_err();
    assert!(matches!(err, SelectError::Eval(EvalError::UnknownField { .. })));
}

#[test]
fn unbound_variable_is_reported() {
    let err = eval("resid $cutoff").unwrap_err();
    assert!(matches!(err, SelectError::Eval(EvalError::UnknownVariable { .. })));
}

#[test]
fn parse_errors_carry_a_span_pointing_into_the_query() {
    let err = eval("name CA and").unwrap_err();
    if let SelectError::Parse(e) = err {
        assert!(e.span.start <= e.span.end);
    } else {
        panic!("expected a parse error");
    }
}
