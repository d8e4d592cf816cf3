//! The typed intermediate representation the parser produces.
//!
//! Every expression node carries a [`Ty`] established at parse time (scalar vs. vector)
//! and preserved through macro expansion; every predicate node yields a mask when
//! evaluated. Tagging each node at parse time avoids duplicating the numeric/mixed math
//! grammar that a type-agnostic IR would otherwise need.

use crate::error::Span;

/// The static type of an expression-producing IR node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ty {
    /// A pure number: no `FieldRef`/`VarRef` anywhere in the subtree.
    Scalar,
    /// Touches at least one per-atom field or variable; evaluates to one value per atom.
    Vector,
}

/// Comparison operators usable in a comparison chain (`a op b op c ...`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum CmpOp {
    #[strum(serialize = "<=")]
    Le,
    #[strum(serialize = ">=")]
    Ge,
    #[strum(serialize = "==")]
    Eq,
    #[strum(serialize = "!=")]
    Ne,
    #[strum(serialize = "<")]
    Lt,
    #[strum(serialize = ">")]
    Gt,
}

/// Arithmetic binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum BinOp {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Sub,
    #[strum(serialize = "*")]
    Mul,
    #[strum(serialize = "/")]
    Div,
    #[strum(serialize = "//")]
    FloorDiv,
    #[strum(serialize = "%")]
    Mod,
    #[strum(serialize = "**")]
    Pow,
}

/// Unary and n-ary math functions available in both the pure-numeric and mixed
/// sub-grammars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum FuncName {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Exp,
    Log,
    Log10,
    #[strum(serialize = "sqrt")]
    Sqrt,
    #[strum(serialize = "sq", serialize = "sqr", serialize = "square")]
    Square,
    Abs,
    Floor,
    Ceil,
}

/// A math expression, typed by the parser as [`Ty::Scalar`] or [`Ty::Vector`].
#[derive(Debug, Clone)]
pub struct TypedExpr {
    pub expr: Expr,
    pub ty: Ty,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum Expr {
    NumLit(f64),
    ConstPi,
    ConstE,
    Neg(Box<TypedExpr>),
    Binop(BinOp, Box<TypedExpr>, Box<TypedExpr>),
    Func(FuncName, Box<TypedExpr>),
    FieldRef(String),
    VarRef(String),
}

/// The left-hand side of a property selection: either a bare keyword (`name CA`) or a
/// parenthesized math expression (`(x + y) 1 to 2`).
#[derive(Debug, Clone)]
pub enum PropertyField {
    Keyword(String),
    Expr(TypedExpr),
}

/// A single item in a property selection's value list.
#[derive(Debug, Clone)]
pub enum PropertyItem {
    Range {
        lo: TypedExpr,
        hi: TypedExpr,
        step: Option<TypedExpr>,
    },
    Regex(String),
    /// Single- or backtick-quoted literal string.
    StringLit(String),
    Number(TypedExpr),
}

/// Which grouping key a `same X as ...` selection expands over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    Residue,
    Chain,
    Segment,
    Fragment,
    Model,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpatialOp {
    Within,
    ExWithin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BondedOp {
    Bonded,
    ExBonded,
}

/// A boolean-flag predicate: no operand list, evaluated directly against the context.
#[derive(Debug, Clone)]
pub enum BoolFlag {
    All,
    None,
    /// An (unexpanded) reference to a registered macro, canonical name.
    Macro(String),
    /// A bare keyword used with no item list: "property exists and is non-zero/non-empty".
    KeywordFlag(String),
}

/// A predicate node; always evaluates to a mask.
#[derive(Debug, Clone)]
pub enum Predicate {
    BoolFlag(BoolFlag),
    PropertySel {
        field: PropertyField,
        items: Vec<PropertyItem>,
        span: Span,
    },
    /// `a op b op c ...`; `operands.len() == ops.len() + 1`.
    CompareSel {
        operands: Vec<TypedExpr>,
        ops: Vec<CmpOp>,
        span: Span,
    },
    RegexSel {
        field_expr: TypedExpr,
        pattern: String,
        span: Span,
    },
    WithinSel {
        op: SpatialOp,
        distance: f64,
        inner: Box<Logical>,
        span: Span,
    },
    BondedSel {
        op: BondedOp,
        hops: u32,
        inner: Box<Logical>,
        span: Span,
    },
    SequenceSel {
        pattern: String,
        span: Span,
    },
    SameAsSel {
        grouping: GroupKind,
        inner: Box<Logical>,
        span: Span,
    },
}

/// The logical layer: a full query is a `Logical` tree. Always evaluates to a mask.
#[derive(Debug, Clone)]
pub enum Logical {
    And(Box<Logical>, Box<Logical>),
    Or(Box<Logical>, Box<Logical>),
    Xor(Box<Logical>, Box<Logical>),
    Not(Box<Logical>),
    Predicate(Predicate),
}

/// Alias documenting that the parser's top-level output is a [`Logical`] tree.
pub type Ir = Logical;
