//! [`MolecularContext`]: the read-only snapshot the evaluator walks an IR tree against.
//!
//! The engine never builds one of these itself — loading structures from PDB/mmCIF
//! files is an external collaborator's job. A caller populates a context with per-atom
//! columns, optional topology, and optional variables, then hands it to
//! [`crate::eval::evaluate`]. Auxiliary indices the spatial/sequence operators need
//! (an R-tree over coordinates, a per-chain residue sequence table) are expensive to
//! build and cheap to reuse, so they are constructed lazily on first use and cached
//! against the context's own lifetime with `OnceLock`, using the double-checked
//! lazy-init pattern required for structures shared across concurrent evaluations of
//! the same context.

use std::sync::OnceLock;

use ahash::{AHashMap, AHashSet};
use smallvec::SmallVec;

use crate::ir::GroupKind;

/// The storage backing one named per-atom column.
#[derive(Debug, Clone)]
pub enum Column {
    Int(Vec<i64>),
    Float(Vec<f64>),
    Str(Vec<String>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Int(v) => v.len(),
            Column::Float(v) => v.len(),
            Column::Str(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A caller-supplied `$name` binding: either one scalar shared by every atom, or one
/// value per atom.
#[derive(Debug, Clone)]
pub enum Variable {
    Scalar(f64),
    PerAtom(Vec<f64>),
}

/// Bounds on pathological queries: caps that a host embedding the engine against
/// untrusted query text can set so a malformed or adversarial query cannot force an
/// unbounded BFS or regex compile. `Default` imposes no limit.
#[derive(Debug, Clone, Copy)]
pub struct EvalLimits {
    /// Ceiling on `bonded`/`exbonded`'s hop count. `None` means unbounded.
    pub max_bonded_hops: Option<u32>,
    /// Ceiling on a quoted regex pattern's byte length (`RegexItem`/`RegexSel`).
    /// `None` means unbounded.
    pub max_regex_pattern_len: Option<usize>,
}

impl Default for EvalLimits {
    fn default() -> Self {
        Self { max_bonded_hops: None, max_regex_pattern_len: None }
    }
}

impl EvalLimits {
    /// No limit on anything (the default): matches MolSelect's historical behavior.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// A conservative preset for embedding the engine against untrusted query text.
    pub fn sandboxed() -> Self {
        Self { max_bonded_hops: Some(64), max_regex_pattern_len: Some(256) }
    }
}

/// A single residue's place in its chain's ordered sequence, used by `sequence`.
#[derive(Debug, Clone)]
pub(crate) struct SequenceResidue {
    pub code: char,
    pub atoms: Vec<usize>,
}

#[derive(Debug, Clone)]
pub(crate) struct ChainSequence {
    pub residues: Vec<SequenceResidue>,
}

/// Lazily-built auxiliary indices, cached for the lifetime of one [`MolecularContext`].
///
/// Built at most once (double-checked via `OnceLock::get_or_init`), regardless of how
/// many threads concurrently call `evaluate` against the same context: an index tied to
/// a `MolecularContext`'s identity must be guarded by a single-writer lock when built
/// lazily from multiple threads, and a double-check pattern suffices here.
#[derive(Default)]
struct Caches {
    spatial: OnceLock<crate::eval::spatial::SpatialIndex>,
    sequences: OnceLock<AHashMap<String, ChainSequence>>,
    chain_ids: OnceLock<Vec<u32>>,
    segment_ids: OnceLock<Vec<u32>>,
}

impl std::fmt::Debug for Caches {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Caches").finish_non_exhaustive()
    }
}

/// A read-only bundle of atom columns, topology, groupings, and variables. Never
/// mutated by the evaluator.
#[derive(Debug)]
pub struct MolecularContext {
    n: usize,
    columns: AHashMap<String, Column>,
    /// Symmetric neighbor sets, one per atom. `None` means the molecule carries no bond
    /// information; bonded/exbonded queries then fail with `NoTopology`.
    topology: Option<Vec<SmallVec<[usize; 4]>>>,
    variables: AHashMap<String, Variable>,
    /// Field names whose string-column comparisons ignore case. String fields default
    /// to case-sensitive, with this per-field override set by whoever registered the
    /// keyword.
    case_insensitive_fields: AHashSet<String>,
    limits: EvalLimits,
    caches: Caches,
}

impl MolecularContext {
    pub fn n(&self) -> usize {
        self.n
    }

    pub fn limits(&self) -> EvalLimits {
        self.limits
    }

    pub fn builder(n: usize) -> MolecularContextBuilder {
        MolecularContextBuilder {
            n,
            columns: AHashMap::new(),
            topology: None,
            variables: AHashMap::new(),
            case_insensitive_fields: AHashSet::new(),
            limits: EvalLimits::default(),
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    pub fn has_topology(&self) -> bool {
        self.topology.is_some()
    }

    pub fn is_case_insensitive(&self, field: &str) -> bool {
        self.case_insensitive_fields.contains(field)
    }

    pub fn neighbors(&self, atom: usize) -> &[usize] {
        self.topology
            .as_ref()
            .and_then(|t| t.get(atom))
            .map_or(&[], SmallVec::as_slice)
    }

    /// The grouping key for `residue`/`chain`/`segment`/`fragment`/`model`: a small
    /// integer, stable per atom, identical for two atoms in the same group and never
    /// reused across groups of the same kind.
    ///
    /// `residue`, `fragment`, and `model` already carry an integer keyword column in the
    /// registry, so those group ids are that column's value directly. `chain` and
    /// `segment` are string-valued columns; their distinct values are interned to small
    /// integers lazily and cached for the context's lifetime.
    pub fn group_id(&self, kind: GroupKind, atom: usize) -> Option<u32> {
        match kind {
            GroupKind::Residue => self.int_column_value("residue", atom),
            GroupKind::Fragment => self.int_column_value("fragment", atom),
            GroupKind::Model => self.int_column_value("model", atom),
            GroupKind::Chain => self.interned_str_group("chain", &self.caches.chain_ids, atom),
            GroupKind::Segment => self.interned_str_group("segment", &self.caches.segment_ids, atom),
        }
    }

    fn int_column_value(&self, name: &str, atom: usize) -> Option<u32> {
        match self.columns.get(name)? {
            Column::Int(v) => v.get(atom).map(|&x| x as u32),
            _ => None,
        }
    }

    fn interned_str_group(&self, name: &str, cache: &OnceLock<Vec<u32>>, atom: usize) -> Option<u32> {
        let ids = cache.get_or_init(|| {
            let Some(Column::Str(values)) = self.columns.get(name) else {
                return Vec::new();
            };
            let mut interned: AHashMap<&str, u32> = AHashMap::new();
            let mut next = 0u32;
            values
                .iter()
                .map(|v| {
                    *interned.entry(v.as_str()).or_insert_with(|| {
                        let id = next;
                        next += 1;
                        id
                    })
                })
                .collect()
        });
        ids.get(atom).copied()
    }

    pub(crate) fn spatial_index(&self) -> &crate::eval::spatial::SpatialIndex {
        self.caches.spatial.get_or_init(|| crate::eval::spatial::SpatialIndex::build(self))
    }

    pub(crate) fn chain_sequences(&self) -> &AHashMap<String, ChainSequence> {
        self.caches.sequences.get_or_init(|| crate::eval::sequence::build_chain_sequences(self))
    }
}

/// Builds a [`MolecularContext`] one column/grouping at a time.
pub struct MolecularContextBuilder {
    n: usize,
    columns: AHashMap<String, Column>,
    topology: Option<Vec<SmallVec<[usize; 4]>>>,
    variables: AHashMap<String, Variable>,
    case_insensitive_fields: AHashSet<String>,
    limits: EvalLimits,
}

impl MolecularContextBuilder {
    /// Registers a column under `name` (a keyword's canonical name or synonym — the
    /// evaluator looks columns up by whatever name a `FieldRef` carries). Panics if the
    /// column's length does not match `n`: every column in a context must have exactly
    /// `n` entries, one per atom.
    pub fn with_column(mut self, name: impl Into<String>, column: Column) -> Self {
        let name = name.into();
        assert_eq!(column.len(), self.n, "column `{name}` must have length N ({})", self.n);
        self.columns.insert(name, column);
        self
    }

    /// Marks a string field's equality/regex matching as case-insensitive.
    pub fn with_case_insensitive_field(mut self, name: impl Into<String>) -> Self {
        self.case_insensitive_fields.insert(name.into());
        self
    }

    /// Propagates every keyword's `KeywordEntry::case_insensitive` flag (canonical name
    /// plus synonyms) from `registry` onto this builder in one call, so a caller wiring
    /// a context up from a registry does not have to repeat each keyword's declared
    /// case sensitivity by hand.
    pub fn with_case_insensitivity_from(mut self, registry: &crate::registry::Registry) -> Self {
        for keyword in registry.iter_keywords() {
            if keyword.case_insensitive {
                for name in keyword.all_names() {
                    self.case_insensitive_fields.insert(name.to_owned());
                }
            }
        }
        self
    }

    /// Supplies symmetric bond topology: `neighbors[i]` lists every atom bonded to atom
    /// `i`. Callers are responsible for symmetry; this builder does not re-symmetrize.
    pub fn with_topology(mut self, neighbors: Vec<Vec<usize>>) -> Self {
        assert_eq!(neighbors.len(), self.n, "topology must have one entry per atom");
        self.topology = Some(neighbors.into_iter().map(SmallVec::from_vec).collect());
        self
    }

    /// Sets the [`EvalLimits`] this context enforces during evaluation. Unset contexts
    /// default to [`EvalLimits::unbounded`].
    pub fn with_limits(mut self, limits: EvalLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>, variable: Variable) -> Self {
        let name = name.into();
        if let Variable::PerAtom(values) = &variable {
            assert_eq!(values.len(), self.n, "variable `{name}` must have length N ({})", self.n);
        }
        self.variables.insert(name, variable);
        self
    }

    pub fn build(self) -> MolecularContext {
        MolecularContext {
            n: self.n,
            columns: self.columns,
            topology: self.topology,
            variables: self.variables,
            case_insensitive_fields: self.case_insensitive_fields,
            limits: self.limits,
            caches: Caches::default(),
        }
    }
}
