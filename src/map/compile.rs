//! Map composition.
//!
//! Composing the map A: X→Y of one derivation with the map B: Y→Z of the
//! next yields a single map X→Z: every correspondence path x→y→z
//! contributes one entry whose transform is the two path transforms
//! multiplied. Composition is associative, so a chain of derivations can
//! be folded into one effective map in any grouping.

use crate::error::{MeshError, Result};

use super::{ArrayMap, GeometryMap, IdentityMap, IndexMap, MapHalf};

/// Compose two maps: `upstream` relates X→Y, `downstream` relates Y→Z,
/// and the result relates X→Z.
///
/// Every path through a shared middle element contributes its own entry;
/// duplicate indices from distinct paths are kept. Transforms follow the
/// queried→result convention of the module docs, so a composed
/// `from_base` transform is `downstream · upstream` and a composed
/// `to_base` transform is `upstream · downstream`.
///
/// Fails with [`MeshError::LengthMismatch`] when the middle space sizes
/// disagree.
pub fn compile(upstream: &dyn IndexMap, downstream: &dyn IndexMap) -> Result<ArrayMap> {
    let up = upstream.lengths();
    let down = downstream.lengths();
    if up.derived != down.base {
        return Err(MeshError::LengthMismatch {
            upstream: up.derived,
            downstream: down.base,
        });
    }

    let mut from_base = MapHalf::with_capacity(up.base, up.base);
    for x in 0..up.base {
        let middle = upstream.from_base(x)?;
        for (y, t_up) in middle.indices.iter().zip(&middle.transforms) {
            let end = downstream.from_base(*y)?;
            for (z, t_down) in end.indices.iter().zip(&end.transforms) {
                from_base.push_entry(*z, t_down * t_up);
            }
        }
        from_base.finish_row();
    }

    let mut to_base = MapHalf::with_capacity(down.derived, down.derived);
    for z in 0..down.derived {
        let middle = downstream.to_base(z)?;
        for (y, t_down) in middle.indices.iter().zip(&middle.transforms) {
            let end = upstream.to_base(*y)?;
            for (x, t_up) in end.indices.iter().zip(&end.transforms) {
                to_base.push_entry(*x, t_up * t_down);
            }
        }
        to_base.finish_row();
    }

    ArrayMap::new(from_base, to_base)
}

/// Fold a chain of maps into one.
///
/// The chain is ordered base-outward: `maps[0]` relates the root base to
/// the first derived space, `maps[1]` the first to the second, and so
/// on. An empty chain collapses to the identity over `base_len`
/// elements; a one-map chain is returned as-is.
pub fn compile_chain(maps: &[&GeometryMap], base_len: usize) -> Result<GeometryMap> {
    match maps {
        [] => Ok(GeometryMap::Identity(IdentityMap::new(base_len))),
        [only] => Ok((*only).clone()),
        [first, rest @ ..] => {
            let mut acc = compile(*first, rest[0])?;
            for map in &rest[1..] {
                acc = compile(&acc, *map)?;
            }
            Ok(GeometryMap::Array(acc))
        }
    }
}
