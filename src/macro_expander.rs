//! Inlines macro references in a parsed IR tree.
//!
//! A macro's `definition` is parsed lazily and cached on [`MacroEntry`] the first time it
//! is expanded; subsequent expansions of the same macro reuse the cached IR rather than
//! re-parsing the definition string. Cycle detection uses a dynamic expansion stack: a
//! macro already on the stack when re-encountered (directly, or via another macro's
//! definition) fails with [`EvalError::MacroCycle`].

use crate::error::{EvalError, SelectError};
use crate::ir::{BoolFlag, Ir, Logical, Predicate};
use crate::registry::Registry;

/// Walks `ir`, substituting every `BoolFlag(Macro(name))` node with that macro's
/// (recursively expanded) definition.
pub fn expand(ir: &Ir, registry: &Registry) -> Result<Ir, SelectError> {
    let mut stack = Vec::new();
    expand_logical(ir, registry, &mut stack)
}

fn expand_logical(node: &Logical, registry: &Registry, stack: &mut Vec<String>) -> Result<Logical, SelectError> {
    match node {
        Logical::And(a, b) => Ok(Logical::And(
            Box::new(expand_logical(a, registry, stack)?),
            Box::new(expand_logical(b, registry, stack)?),
        )),
        Logical::Or(a, b) => Ok(Logical::Or(
            Box::new(expand_logical(a, registry, stack)?),
            Box::new(expand_logical(b, registry, stack)?),
        )),
        Logical::Xor(a, b) => Ok(Logical::Xor(
            Box::new(expand_logical(a, registry, stack)?),
            Box::new(expand_logical(b, registry, stack)?),
        )),
        Logical::Not(a) => Ok(Logical::Not(Box::new(expand_logical(a, registry, stack)?))),
        Logical::Predicate(p) => expand_predicate(p, registry, stack),
    }
}

fn expand_predicate(predicate: &Predicate, registry: &Registry, stack: &mut Vec<String>) -> Result<Logical, SelectError> {
    match predicate {
        Predicate::BoolFlag(BoolFlag::Macro(name)) => expand_macro(name, registry, stack),
        Predicate::WithinSel { op, distance, inner, span } => Ok(Logical::Predicate(Predicate::WithinSel {
            op: *op,
            distance: *distance,
            inner: Box::new(expand_logical(inner, registry, stack)?),
            span: *span,
        })),
        Predicate::BondedSel { op, hops, inner, span } => Ok(Logical::Predicate(Predicate::BondedSel {
            op: *op,
            hops: *hops,
            inner: Box::new(expand_logical(inner, registry, stack)?),
            span: *span,
        })),
        Predicate::SameAsSel { grouping, inner, span } => Ok(Logical::Predicate(Predicate::SameAsSel {
            grouping: *grouping,
            inner: Box::new(expand_logical(inner, registry, stack)?),
            span: *span,
        })),
        other => Ok(Logical::Predicate(other.clone())),
    }
}

fn expand_macro(name: &str, registry: &Registry, stack: &mut Vec<String>) -> Result<Logical, SelectError> {
    if stack.iter().any(|s| s == name) {
        let mut chain = stack.clone();
        chain.push(name.to_owned());
        return Err(SelectError::Eval(EvalError::MacroCycle { chain }));
    }
    let entry = registry
        .macro_entry(name)
        .expect("macro name was resolved against this same registry by the parser");
    let raw_ir = entry.parsed(|definition| {
        log::trace!("parsing macro `{name}` definition on first use");
        let grammar = crate::grammar::assemble(registry);
        crate::parser::parse(&grammar, definition)
    })?;
    stack.push(name.to_owned());
    let expanded = expand_logical(raw_ir, registry, stack);
    stack.pop();
    expanded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar;
    use crate::parser;

    fn expand_query(query: &str) -> Ir {
        let registry = Registry::with_builtins();
        let grammar = grammar::assemble(&registry);
        let ir = parser::parse(&grammar, query).expect("query parses");
        expand(&ir, &registry).expect("macro expands")
    }

    #[test]
    fn water_expands_to_its_definition() {
        let expanded = expand_query("water");
        assert!(!matches!(
            expanded,
            Logical::Predicate(Predicate::BoolFlag(BoolFlag::Macro(_)))
        ));
    }

    #[test]
    fn expanding_is_idempotent_on_the_result() {
        let registry = Registry::with_builtins();
        let grammar = grammar::assemble(&registry);
        let ir = parser::parse(&grammar, "protein").expect("parses");
        let once = expand(&ir, &registry).expect("expands");
        let twice = expand(&once, &registry).expect("re-expands a fully expanded tree");
        assert_eq!(format!("{once:?}"), format!("{twice:?}"));
    }

    #[test]
    fn direct_self_reference_is_a_cycle() {
        let mut registry = Registry::with_builtins();
        registry
            .register_macro(crate::registry::MacroEntry::new("loopy", "loopy"))
            .expect("registers");
        let grammar = grammar::assemble(&registry);
        let ir = parser::parse(&grammar, "loopy").expect("parses");
        let err = expand(&ir, &registry).unwrap_err();
        assert!(matches!(err, SelectError::Eval(EvalError::MacroCycle { .. })));
    }

    #[test]
    fn mutual_reference_is_a_cycle() {
        let mut registry = Registry::with_builtins();
        registry
            .register_macro(crate::registry::MacroEntry::new("ping", "pong"))
            .expect("registers");
        registry
            .register_macro(crate::registry::MacroEntry::new("pong", "ping"))
            .expect("registers");
        let grammar = grammar::assemble(&registry);
        let ir = parser::parse(&grammar, "ping").expect("parses");
        let err = expand(&ir, &registry).unwrap_err();
        assert!(matches!(err, SelectError::Eval(EvalError::MacroCycle { .. })));
    }
}
