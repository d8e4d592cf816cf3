//! `sequence PATTERN`: matching against each chain's ordered one-letter residue
//! sequence. Every non-standard residue maps to `X`.

use ahash::AHashMap;
use regex::Regex;

use crate::context::{ChainSequence, Column, MolecularContext, SequenceResidue};
use crate::error::{EvalError, Span};

use super::mask::Mask;

/// The 20 standard amino acids' three-letter PDB `resname` mapped to their one-letter
/// sequence code. Anything else maps to `X`.
const STANDARD_AMINO_ACIDS: &[(&str, char)] = &[
    ("ALA", 'A'),
    ("ARG", 'R'),
    ("ASN", 'N'),
    ("ASP", 'D'),
    ("CYS", 'C'),
    ("GLN", 'Q'),
    ("GLU", 'E'),
    ("GLY", 'G'),
    ("HIS", 'H'),
    ("ILE", 'I'),
    ("LEU", 'L'),
    ("LYS", 'K'),
    ("MET", 'M'),
    ("PHE", 'F'),
    ("PRO", 'P'),
    ("SER", 'S'),
    ("THR", 'T'),
    ("TRP", 'W'),
    ("TYR", 'Y'),
    ("VAL", 'V'),
];

fn one_letter_code(resname: &str) -> char {
    STANDARD_AMINO_ACIDS
        .iter()
        .find(|(three, _)| *three == resname)
        .map_or('X', |(_, one)| *one)
}

/// Groups atoms by `chain`, then by `residue`, producing each chain's ordered residue
/// list. Residues are ordered by the index of their first atom, which
/// tracks file order — the order `residue_group` increments in for any context built
/// from a structurally-ordered atom table.
pub(crate) fn build_chain_sequences(ctx: &MolecularContext) -> AHashMap<String, ChainSequence> {
    let Some(Column::Str(chains)) = ctx.column("chain") else {
        return AHashMap::new();
    };
    let Some(Column::Int(residues)) = ctx.column("residue") else {
        return AHashMap::new();
    };
    let resnames = match ctx.column("resname") {
        Some(Column::Str(v)) => Some(v),
        _ => None,
    };

    // chain -> residue id -> (first atom index, atoms, resname)
    let mut by_chain: AHashMap<&str, Vec<(i64, usize, Vec<usize>)>> = AHashMap::new();
    for atom in 0..ctx.n() {
        let chain = chains[atom].as_str();
        let residue_id = residues[atom];
        let entries = by_chain.entry(chain).or_default();
        if let Some(existing) = entries.iter_mut().find(|(rid, _, _)| *rid == residue_id) {
            existing.2.push(atom);
        } else {
            entries.push((residue_id, atom, vec![atom]));
        }
    }

    by_chain
        .into_iter()
        .map(|(chain, mut residues)| {
            residues.sort_by_key(|(_, first_atom, _)| *first_atom);
            let residues = residues
                .into_iter()
                .map(|(_, first_atom, atoms)| {
                    let code = resnames.map_or('X', |names| one_letter_code(&names[first_atom]));
                    SequenceResidue { code, atoms }
                })
                .collect();
            (chain.to_owned(), ChainSequence { residues })
        })
        .collect()
}

fn looks_like_regex(pattern: &str) -> bool {
    pattern.chars().any(|c| "^$.*+?()[]{}|\\".contains(c))
}

/// `sequence PATTERN`: matched per chain against that chain's one-letter code string;
/// every atom of every residue in a matched span is selected.
pub fn eval_sequence(pattern: &str, span: Span, ctx: &MolecularContext) -> Result<Mask, EvalError> {
    let sequences = ctx.chain_sequences();
    let mut mask = Mask::all_false(ctx.n());
    if looks_like_regex(pattern) {
        super::predicate::check_pattern_len(pattern, span, ctx)?;
        let re = Regex::new(pattern).map_err(|e| EvalError::PatternError { message: e.to_string(), span })?;
        for chain_seq in sequences.values() {
            let codes: String = chain_seq.residues.iter().map(|r| r.code).collect();
            for m in re.find_iter(&codes) {
                mark_span(chain_seq, m.start(), m.end(), &mut mask);
            }
        }
    } else {
        for chain_seq in sequences.values() {
            let codes: String = chain_seq.residues.iter().map(|r| r.code).collect();
            let mut start = 0;
            while let Some(offset) = codes[start..].find(pattern) {
                let begin = start + offset;
                let end = begin + pattern.len();
                mark_span(chain_seq, begin, end, &mut mask);
                start = begin + 1;
                if start >= codes.len() {
                    break;
                }
            }
        }
    }
    Ok(mask)
}

fn mark_span(chain_seq: &ChainSequence, begin: usize, end: usize, mask: &mut Mask) {
    for residue in &chain_seq.residues[begin..end] {
        for &atom in &residue.atoms {
            mask.set(atom, true);
        }
    }
}
