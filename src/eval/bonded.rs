//! `bonded`/`exbonded`: breadth-first expansion over bond topology. Fixes the
//! *exactly N hops* reading rather than "within N hops".

use crate::context::MolecularContext;
use crate::error::{EvalError, Span};

use super::mask::Mask;

/// Multi-source BFS from every seed atom; `dist[i]` is the minimum hop count from `i`
/// to the nearest seed, or `None` if `i` is unreachable within `max_hops`.
fn multi_source_hops(seeds: &Mask, ctx: &MolecularContext, max_hops: u32) -> Vec<Option<u32>> {
    let n = ctx.n();
    let mut dist = vec![None; n];
    let mut frontier: Vec<usize> = seeds.iter_selected().collect();
    for i in &frontier {
        dist[*i] = Some(0);
    }
    let mut hop = 0u32;
    while hop < max_hops && !frontier.is_empty() {
        hop += 1;
        let mut next = Vec::new();
        for &atom in &frontier {
            for &neighbor in ctx.neighbors(atom) {
                if dist[neighbor].is_none() {
                    dist[neighbor] = Some(hop);
                    next.push(neighbor);
                }
            }
        }
        frontier = next;
    }
    dist
}

/// `bonded h to inner` / `exbonded h to inner`:
/// 1. evaluate `inner` to a seed mask;
/// 2. BFS outward up to `h` hops; keep atoms reached in *exactly* `h` hops;
/// 3. for `exbonded`, additionally drop direct (hop-1) neighbors of the seed.
pub fn eval_bonded(exclude_direct: bool, hops: u32, inner: Mask, ctx: &MolecularContext, span: Span) -> Result<Mask, EvalError> {
    if !ctx.has_topology() {
        return Err(EvalError::NoTopology { span });
    }
    if let Some(limit) = ctx.limits().max_bonded_hops {
        if hops > limit {
            return Err(EvalError::LimitExceeded {
                message: format!("bonded hop count {hops} exceeds the configured limit of {limit}"),
                span,
            });
        }
    }
    let dist = multi_source_hops(&inner, ctx, hops);
    let mut result = Mask::from_fn(ctx.n(), |i| dist[i] == Some(hops));
    if exclude_direct {
        let direct = Mask::from_fn(ctx.n(), |i| dist[i] == Some(1));
        result = super::mask::and_not(&result, &direct);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Column, MolecularContext};

    fn linear_chain(n: usize) -> MolecularContext {
        let neighbors: Vec<Vec<usize>> = (0..n)
            .map(|i| {
                let mut v = Vec::new();
                if i > 0 {
                    v.push(i - 1);
                }
                if i + 1 < n {
                    v.push(i + 1);
                }
                v
            })
            .collect();
        MolecularContext::builder(n)
            .with_column("serial", Column::Int((0..n as i64).collect()))
            .with_topology(neighbors)
            .build()
    }

    #[test]
    fn exactly_n_hops_matches_a_linear_chain() {
        let ctx = linear_chain(4);
        let mut seed = Mask::all_false(4);
        seed.set(0, true);
        let two_hops = eval_bonded(false, 2, seed.clone(), &ctx, Span::default()).unwrap();
        assert_eq!(two_hops.as_slice(), &[false, false, true, false]);
        let one_hop = eval_bonded(false, 1, seed, &ctx, Span::default()).unwrap();
        assert_eq!(one_hop.as_slice(), &[false, true, false, false]);
    }

    #[test]
    fn no_topology_fails() {
        let ctx = MolecularContext::builder(2).with_column("serial", Column::Int(vec![0, 1])).build();
        let seed = Mask::all_true(2);
        assert!(matches!(
            eval_bonded(false, 1, seed, &ctx, Span::default()),
            Err(EvalError::NoTopology { .. })
        ));
    }

    #[test]
    fn hop_count_beyond_the_configured_limit_is_rejected() {
        let neighbors: Vec<Vec<usize>> = (0..4)
            .map(|i| {
                let mut v = Vec::new();
                if i > 0 {
                    v.push(i - 1);
                }
                if i + 1 < 4 {
                    v.push(i + 1);
                }
                v
            })
            .collect();
        let ctx = MolecularContext::builder(4)
            .with_column("serial", Column::Int((0..4).collect()))
            .with_topology(neighbors)
            .with_limits(crate::context::EvalLimits { max_bonded_hops: Some(1), max_regex_pattern_len: None })
            .build();
        let mut seed = Mask::all_false(4);
        seed.set(0, true);
        assert!(matches!(
            eval_bonded(false, 2, seed.clone(), &ctx, Span::default()),
            Err(EvalError::LimitExceeded { .. })
        ));
        // within the limit still succeeds.
        assert!(eval_bonded(false, 1, seed, &ctx, Span::default()).is_ok());
    }
}
