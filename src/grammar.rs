//! Builds the reserved-name tables (universal flags, keywords, macros, and the
//! lowest-priority bare-identifier fallback) from the registry's current keyword/macro
//! names, producing a concrete artifact the parser consumes.
//!
//! Rather than filling a textual grammar for an external parser-generator, the
//! assembler fills a [`Grammar`] value: a snapshot of the registry's reserved-name
//! tables that the hand-written lexer in [`crate::lexer`] consults to classify every
//! identifier it reads. This guarantees that any name registered as a keyword/macro can
//! never be misparsed as a bare string value, because the lexer always checks the
//! reserved tables before falling back to a bare-identifier token (the lowest-priority
//! classification arm, preserved below).

use crate::registry::Registry;

/// The four universal boolean flags, reserved regardless of registry contents.
pub const UNIVERSAL_NAMES: [&str; 4] = ["all", "everything", "none", "nothing"];

/// How the grammar classifies a bare identifier token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenClass<'a> {
    /// `all`/`everything` (select every atom) or `none`/`nothing` (select no atom).
    Universal { selects_all: bool },
    /// A registered keyword; `canonical` is its canonical registry name.
    Keyword { canonical: &'a str },
    /// A registered macro; `canonical` is its canonical registry name.
    Macro { canonical: &'a str },
    /// Matches no reserved name — the `LAST_TOKEN` fallback, usable as a bare
    /// identifier only where the grammar explicitly allows one (it never does, since
    /// MolSelect has no bare-identifier literal outside reserved names).
    Bare,
}

/// The concrete, assembled grammar a [`crate::parser::Parser`] is built from.
///
/// Immutable once produced; reassembling after further registrations produces a new,
/// independent `Grammar`. The registry and assembled grammar are immutable after the
/// last registration, so many evaluations/parses may run concurrently against one
/// `Grammar`.
#[derive(Debug, Clone)]
pub struct Grammar {
    registry: Registry,
}

impl Grammar {
    /// Classifies an identifier the lexer has scanned, in priority order: universal
    /// flags, then keywords, then macros, then the `LAST_TOKEN` fallback. This order is
    /// immaterial for correctness (the three reserved namespaces are disjoint by
    /// construction) but documents the assembler's declared priority order.
    pub fn classify<'a>(&'a self, ident: &str) -> TokenClass<'a> {
        if let Some(&name) = UNIVERSAL_NAMES.iter().find(|&&n| n == ident) {
            return TokenClass::Universal {
                selects_all: name == "all" || name == "everything",
            };
        }
        match self.registry.resolve_name(ident) {
            Some(crate::registry::Resolved::Keyword(k)) => TokenClass::Keyword { canonical: &k.name },
            Some(crate::registry::Resolved::Macro(m)) => TokenClass::Macro { canonical: &m.name },
            None => TokenClass::Bare,
        }
    }

    /// True if `ident` can never be parsed as a bare string literal, because it is
    /// claimed by a universal flag, a keyword, or a macro.
    pub fn is_reserved(&self, ident: &str) -> bool {
        UNIVERSAL_NAMES.contains(&ident) || self.registry.is_reserved(ident)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

/// Fills the grammar placeholders from the registry's current contents.
pub fn assemble(registry: &Registry) -> Grammar {
    log::debug!(
        "assembling grammar from {} keywords and {} macros",
        registry.iter_keywords().count(),
        registry.iter_macros().count()
    );
    Grammar {
        registry: registry.clone(),
    }
}
