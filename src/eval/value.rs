//! Numeric expression evaluation: [`NumValue`] and [`eval_num`] carry out the
//! `Func`/`Binop`/`FieldRef`/`VarRef` evaluation rules.
//!
//! A [`TypedExpr`] already carries its [`Ty`] from the parser, so `eval_num` never
//! needs to inspect the whole subtree to know whether to loop over atoms: `Ty::Scalar`
//! expressions are folded to one `f64`, `Ty::Vector` expressions produce one `f64` per
//! atom. A `FieldRef`/`VarRef` reached while computing a scalar never happens — the
//! parser only tags a node `Scalar` when no such reference appears in it.

use crate::context::{Column, MolecularContext, Variable};
use crate::error::{EvalError, Span};
use crate::ir::{BinOp, Expr, FuncName, Ty, TypedExpr};

/// The result of evaluating a math expression: one number (scalar) or one number per
/// atom (vector). Binary operators broadcast a `Scalar` against a `Vector` operand.
#[derive(Debug, Clone)]
pub enum NumValue {
    Scalar(f64),
    Vector(Vec<f64>),
}

impl NumValue {
    pub fn at(&self, i: usize) -> f64 {
        match self {
            NumValue::Scalar(v) => *v,
            NumValue::Vector(v) => v[i],
        }
    }

    pub fn broadcast(&self, n: usize) -> Vec<f64> {
        match self {
            NumValue::Scalar(v) => vec![*v; n],
            NumValue::Vector(v) => v.clone(),
        }
    }
}

pub fn eval_num(expr: &TypedExpr, ctx: &MolecularContext) -> Result<NumValue, EvalError> {
    match expr.ty {
        Ty::Scalar => Ok(NumValue::Scalar(eval_scalar(&expr.expr, expr.span)?)),
        Ty::Vector => Ok(NumValue::Vector(eval_vector(&expr.expr, expr.span, ctx)?)),
    }
}

fn eval_scalar(expr: &Expr, span: Span) -> Result<f64, EvalError> {
    match expr {
        Expr::NumLit(v) => Ok(*v),
        Expr::ConstPi => Ok(std::f64::consts::PI),
        Expr::ConstE => Ok(std::f64::consts::E),
        Expr::Neg(inner) => Ok(-eval_scalar(&inner.expr, inner.span)?),
        Expr::Binop(op, a, b) => apply_binop(*op, eval_scalar(&a.expr, a.span)?, eval_scalar(&b.expr, b.span)?, span),
        Expr::Func(f, arg) => apply_func(*f, eval_scalar(&arg.expr, arg.span)?, span),
        Expr::FieldRef(_) | Expr::VarRef(_) => {
            unreachable!("parser never tags a node containing a field/var reference as Ty::Scalar")
        }
    }
}

fn eval_vector(expr: &Expr, span: Span, ctx: &MolecularContext) -> Result<Vec<f64>, EvalError> {
    let n = ctx.n();
    match expr {
        Expr::NumLit(v) => Ok(vec![*v; n]),
        Expr::ConstPi => Ok(vec![std::f64::consts::PI; n]),
        Expr::ConstE => Ok(vec![std::f64::consts::E; n]),
        Expr::Neg(inner) => Ok(eval_vector(&inner.expr, inner.span, ctx)?.into_iter().map(|v| -v).collect()),
        Expr::Binop(op, a, b) => {
            let lhs = eval_num(a, ctx)?;
            let rhs = eval_num(b, ctx)?;
            (0..n).map(|i| apply_binop(*op, lhs.at(i), rhs.at(i), span)).collect()
        }
        Expr::Func(f, arg) => {
            let value = eval_num(arg, ctx)?;
            (0..n).map(|i| apply_func(*f, value.at(i), span)).collect()
        }
        Expr::FieldRef(name) => numeric_column(ctx, name, span),
        Expr::VarRef(name) => match ctx.variable(name) {
            Some(Variable::Scalar(v)) => Ok(vec![*v; n]),
            Some(Variable::PerAtom(v)) => Ok(v.clone()),
            None => Err(EvalError::UnknownVariable { name: name.clone(), span }),
        },
    }
}

/// Reads a keyword's column as a per-atom `f64` vector; integer columns promote to
/// float, string columns are a [`EvalError::TypeError`].
pub(crate) fn numeric_column(ctx: &MolecularContext, name: &str, span: Span) -> Result<Vec<f64>, EvalError> {
    match ctx.column(name) {
        Some(Column::Int(values)) => Ok(values.iter().map(|&v| v as f64).collect()),
        Some(Column::Float(values)) => Ok(values.clone()),
        Some(Column::Str(_)) => Err(EvalError::TypeError {
            message: format!("field `{name}` is a string column; arithmetic requires a numeric field"),
            span,
        }),
        None => Err(EvalError::UnknownField { name: name.to_owned(), span }),
    }
}

fn apply_binop(op: BinOp, a: f64, b: f64, span: Span) -> Result<f64, EvalError> {
    match op {
        BinOp::Add => Ok(a + b),
        BinOp::Sub => Ok(a - b),
        BinOp::Mul => Ok(a * b),
        BinOp::Div => {
            // True division by zero yields NaN rather than signed infinity.
            if b == 0.0 { Ok(f64::NAN) } else { Ok(a / b) }
        }
        BinOp::FloorDiv => {
            if b == 0.0 {
                Err(EvalError::DivByZero { span })
            } else {
                Ok((a / b).floor())
            }
        }
        BinOp::Mod => {
            if b == 0.0 {
                Err(EvalError::DivByZero { span })
            } else {
                Ok(a - b * (a / b).floor())
            }
        }
        BinOp::Pow => {
            let result = a.powf(b);
            if result.is_nan() && !a.is_nan() && !b.is_nan() {
                Err(EvalError::DomainError { message: format!("{a} ** {b} is not a real number"), span })
            } else {
                Ok(result)
            }
        }
    }
}

fn apply_func(f: FuncName, x: f64, span: Span) -> Result<f64, EvalError> {
    let domain_err = |message: String| EvalError::DomainError { message, span };
    match f {
        FuncName::Sin => Ok(x.sin()),
        FuncName::Cos => Ok(x.cos()),
        FuncName::Tan => Ok(x.tan()),
        FuncName::Asin => {
            if (-1.0..=1.0).contains(&x) {
                Ok(x.asin())
            } else {
                Err(domain_err(format!("asin({x}) is outside [-1, 1]")))
            }
        }
        FuncName::Acos => {
            if (-1.0..=1.0).contains(&x) {
                Ok(x.acos())
            } else {
                Err(domain_err(format!("acos({x}) is outside [-1, 1]")))
            }
        }
        FuncName::Atan => Ok(x.atan()),
        FuncName::Sinh => Ok(x.sinh()),
        FuncName::Cosh => Ok(x.cosh()),
        FuncName::Tanh => Ok(x.tanh()),
        FuncName::Exp => Ok(x.exp()),
        FuncName::Log => {
            if x > 0.0 {
                Ok(x.ln())
            } else {
                Err(domain_err(format!("log({x}) is undefined for non-positive arguments")))
            }
        }
        FuncName::Log10 => {
            if x > 0.0 {
                Ok(x.log10())
            } else {
                Err(domain_err(format!("log10({x}) is undefined for non-positive arguments")))
            }
        }
        FuncName::Sqrt => {
            if x >= 0.0 {
                Ok(x.sqrt())
            } else {
                Err(domain_err(format!("sqrt({x}) is undefined for negative arguments")))
            }
        }
        FuncName::Square => Ok(x * x),
        FuncName::Abs => Ok(x.abs()),
        FuncName::Floor => Ok(x.floor()),
        FuncName::Ceil => Ok(x.ceil()),
    }
}
