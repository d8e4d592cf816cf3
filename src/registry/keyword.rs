use serde::{Deserialize, Serialize};

/// The storage type backing a keyword's per-atom column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Int,
    Float,
    Str,
}

/// A field keyword: a name (plus synonyms) that resolves to a typed per-atom column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordEntry {
    pub name: String,
    #[serde(default)]
    pub synonyms: Vec<String>,
    #[serde(rename = "type")]
    pub ty: FieldType,
    #[serde(default)]
    pub description: String,
    /// Whether string comparisons against this field's column ignore case.
    /// None of the built-in keywords set this; user-registered keywords may.
    #[serde(default)]
    pub case_insensitive: bool,
}

impl KeywordEntry {
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            synonyms: Vec::new(),
            ty,
            description: String::new(),
            case_insensitive: false,
        }
    }

    pub fn with_synonyms(mut self, synonyms: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.synonyms = synonyms.into_iter().map(Into::into).collect();
        self
    }

    pub fn case_insensitive(mut self) -> Self {
        self.case_insensitive = true;
        self
    }

    /// All names (canonical plus synonyms) this keyword is reserved under.
    pub fn all_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.synonyms.iter().map(String::as_str))
    }
}
