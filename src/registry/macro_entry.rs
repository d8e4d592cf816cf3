use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::ir::Ir;

/// A named, reusable query fragment.
///
/// The `definition` is stored unparsed and parsed lazily into `cache` the first time
/// any query uses this macro. Subsequent uses reuse the cached IR rather than
/// re-parsing the definition string.
#[derive(Debug, Serialize, Deserialize)]
pub struct MacroEntry {
    pub name: String,
    #[serde(default)]
    pub synonyms: Vec<String>,
    pub definition: String,
    #[serde(skip)]
    cache: OnceCell<Ir>,
}

impl Clone for MacroEntry {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            synonyms: self.synonyms.clone(),
            definition: self.definition.clone(),
            cache: self.cache.clone(),
        }
    }
}

impl MacroEntry {
    pub fn new(name: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            synonyms: Vec::new(),
            definition: definition.into(),
            cache: OnceCell::new(),
        }
    }

    pub fn with_synonyms(mut self, synonyms: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.synonyms = synonyms.into_iter().map(Into::into).collect();
        self
    }

    /// Hidden macros (leading underscore) are expandable but not offered on the query
    /// surface as a flag name a user would type from a completion list.
    pub fn is_hidden(&self) -> bool {
        self.name.starts_with('_')
    }

    pub fn all_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.synonyms.iter().map(String::as_str))
    }

    /// Returns the cached parsed IR for this macro's definition, parsing (and caching)
    /// it on first call via `parse_fn`.
    pub(crate) fn parsed<E>(&self, parse_fn: impl FnOnce(&str) -> Result<Ir, E>) -> Result<&Ir, E> {
        self.cache.get_or_try_init(|| parse_fn(&self.definition))
    }
}
