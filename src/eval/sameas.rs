//! `same KEYWORD as inner`: expand a mask to every atom sharing a grouping key with an
//! already-selected atom.

use ahash::AHashSet;

use crate::context::MolecularContext;
use crate::ir::GroupKind;

use super::mask::Mask;

/// `same grouping as inner`: `G = { group(grouping, i) : inner[i] }`, result is
/// `{ i : group(grouping, i) in G }`. Idempotent by construction — re-applying to an
/// already-expanded mask recomputes the same `G` and the same result set.
pub fn eval_same_as(grouping: GroupKind, inner: Mask, ctx: &MolecularContext) -> Mask {
    let groups: AHashSet<u32> = inner.iter_selected().filter_map(|i| ctx.group_id(grouping, i)).collect();
    Mask::from_fn(ctx.n(), |i| ctx.group_id(grouping, i).is_some_and(|g| groups.contains(&g)))
}
