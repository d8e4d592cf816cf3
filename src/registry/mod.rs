//! The keyword and macro catalog.
//!
//! Populated from two embedded JSON sources at startup (the built-in field keywords and
//! macro catalog) and extensible by a host registering its own
//! keywords/macros before a query is parsed. Keyword and macro namespaces are disjoint:
//! registering a name already claimed by either catalog fails with [`DuplicateName`].

mod keyword;
mod macro_entry;

pub use keyword::{FieldType, KeywordEntry};
pub use macro_entry::MacroEntry;

use ahash::AHashMap;
use indexmap::IndexMap;

use crate::error::DuplicateName;

const BUILTIN_KEYWORDS_JSON: &str = include_str!("data/keywords.json");
const BUILTIN_MACROS_JSON: &str = include_str!("data/macros.json");

/// What a bare identifier resolves to once classified against the registry.
#[derive(Debug, Clone, Copy)]
pub enum Resolved<'a> {
    Keyword(&'a KeywordEntry),
    Macro(&'a MacroEntry),
}

/// The keyword/macro catalog. Immutable after the last registration.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    keywords: IndexMap<String, KeywordEntry>,
    macros: IndexMap<String, MacroEntry>,
    /// Maps every reserved name (canonical or synonym, for either namespace) to the
    /// canonical keyword name it resolves to.
    keyword_names: AHashMap<String, String>,
    /// Maps every reserved name (canonical or synonym) to the canonical macro name.
    macro_names: AHashMap<String, String>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry pre-populated with the standard field keywords and macro
    /// catalog.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        let keywords: Vec<KeywordEntry> =
            serde_json::from_str(BUILTIN_KEYWORDS_JSON).expect("built-in keyword catalog is valid JSON");
        for entry in keywords {
            registry
                .register_keyword(entry)
                .expect("built-in keyword catalog has no internal name collisions");
        }
        let macros: Vec<MacroEntry> =
            serde_json::from_str(BUILTIN_MACROS_JSON).expect("built-in macro catalog is valid JSON");
        for entry in macros {
            registry
                .register_macro(entry)
                .expect("built-in macro catalog has no internal name collisions");
        }
        log::debug!(
            "registry initialized with {} keywords and {} macros",
            registry.keywords.len(),
            registry.macros.len()
        );
        registry
    }

    fn name_taken(&self, name: &str) -> bool {
        self.keyword_names.contains_key(name) || self.macro_names.contains_key(name)
    }

    /// Registers a field keyword. Fails if the canonical name or any synonym is already
    /// claimed by a keyword or a macro.
    pub fn register_keyword(&mut self, entry: KeywordEntry) -> Result<(), DuplicateName> {
        for name in entry.all_names() {
            if self.name_taken(name) {
                return Err(DuplicateName { name: name.to_owned() });
            }
        }
        for name in entry.all_names() {
            self.keyword_names.insert(name.to_owned(), entry.name.clone());
        }
        log::trace!("registered keyword `{}`", entry.name);
        self.keywords.insert(entry.name.clone(), entry);
        Ok(())
    }

    /// Registers a macro. Fails if the canonical name or any synonym is already claimed
    /// by a keyword or another macro.
    pub fn register_macro(&mut self, entry: MacroEntry) -> Result<(), DuplicateName> {
        for name in entry.all_names() {
            if self.name_taken(name) {
                return Err(DuplicateName { name: name.to_owned() });
            }
        }
        for name in entry.all_names() {
            self.macro_names.insert(name.to_owned(), entry.name.clone());
        }
        log::trace!("registered macro `{}`", entry.name);
        self.macros.insert(entry.name.clone(), entry);
        Ok(())
    }

    /// Classifies a bare identifier as a keyword, a macro, or neither.
    pub fn resolve_name(&self, s: &str) -> Option<Resolved<'_>> {
        if let Some(canonical) = self.keyword_names.get(s) {
            return self.keywords.get(canonical).map(Resolved::Keyword);
        }
        if let Some(canonical) = self.macro_names.get(s) {
            return self.macros.get(canonical).map(Resolved::Macro);
        }
        None
    }

    pub fn keyword(&self, canonical_name: &str) -> Option<&KeywordEntry> {
        self.keywords.get(canonical_name)
    }

    pub fn macro_entry(&self, canonical_name: &str) -> Option<&MacroEntry> {
        self.macros.get(canonical_name)
    }

    /// True if `s` (canonical or synonym) is reserved by either namespace.
    pub fn is_reserved(&self, s: &str) -> bool {
        self.name_taken(s)
    }

    /// Iterates keywords in registration order.
    pub fn iter_keywords(&self) -> impl Iterator<Item = &KeywordEntry> {
        self.keywords.values()
    }

    /// Iterates macros in registration order.
    pub fn iter_macros(&self) -> impl Iterator<Item = &MacroEntry> {
        self.macros.values()
    }

    /// Iterates macros offered on the query surface — hidden (`_`-prefixed) macros are
    /// expandable but excluded here, since they exist only to be referenced from other
    /// macro definitions.
    pub fn iter_visible_macros(&self) -> impl Iterator<Item = &MacroEntry> {
        self.macros.values().filter(|m| !m.is_hidden())
    }
}
