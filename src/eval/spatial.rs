//! The spatial index backing `within`/`exwithin`.
//!
//! An R-tree over every atom's `(x, y, z)` gives the same "points within a radius of a
//! query point" query a uniform grid would, with no cell-size tuning.
//!
//! Built once per [`MolecularContext`] and cached there: rebuilding per query would
//! redo an O(N log N) bulk load on every `within` in a compound query. The index also
//! keeps the coordinates it was built from, so looking up a seed atom's own position
//! never needs to re-read the underlying columns.

use rstar::primitives::PointWithData;
use rstar::RTree;

use crate::context::MolecularContext;
use crate::error::{EvalError, Span};

use super::mask::Mask;

type IndexedPoint = PointWithData<usize, [f64; 3]>;

pub struct SpatialIndex {
    tree: RTree<IndexedPoint>,
    points: Vec<[f64; 3]>,
}

impl SpatialIndex {
    pub(crate) fn build(ctx: &MolecularContext) -> Self {
        let points = coordinates(ctx, Span::default()).unwrap_or_default();
        let entries: Vec<IndexedPoint> =
            points.iter().enumerate().map(|(i, &p)| PointWithData::new(i, p)).collect();
        Self { tree: RTree::bulk_load(entries), points }
    }

    /// The coordinates of atom `atom`, as bulk-loaded at build time.
    fn point(&self, atom: usize) -> [f64; 3] {
        self.points[atom]
    }

    /// Every atom index within `distance` (inclusive) of `center`.
    fn within(&self, center: [f64; 3], distance: f64) -> impl Iterator<Item = usize> + '_ {
        let radius_sq = distance * distance;
        self.tree.locate_within_distance(center, radius_sq).map(|p| p.data)
    }
}

fn coordinates(ctx: &MolecularContext, span: Span) -> Result<Vec<[f64; 3]>, EvalError> {
    let x = super::value::numeric_column(ctx, "x", span)?;
    let y = super::value::numeric_column(ctx, "y", span)?;
    let z = super::value::numeric_column(ctx, "z", span)?;
    Ok((0..ctx.n()).map(|i| [x[i], y[i], z[i]]).collect())
}

/// `within d of inner` / `exwithin d of inner`: every atom within `d` of some atom in
/// `inner`'s mask, minus the seed set itself for `exwithin`.
pub fn eval_within(
    exclude_seed: bool,
    distance: f64,
    inner: Mask,
    ctx: &MolecularContext,
) -> Result<Mask, EvalError> {
    let index = ctx.spatial_index();
    let mut result = Mask::all_false(ctx.n());
    for seed in inner.iter_selected() {
        let center = index.point(seed);
        for hit in index.within(center, distance) {
            result.set(hit, true);
        }
    }
    if exclude_seed {
        result = super::mask::and_not(&result, &inner);
    }
    Ok(result)
}
