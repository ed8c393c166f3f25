//! Bijective (permutation) maps.

use nalgebra::Matrix4;

use crate::error::{MeshError, Result};

use super::{IndexMap, MapEntry, MapLengths};

/// A 1↔1 correspondence between two equally sized spaces: a permutation
/// with one transform per element.
///
/// Only one direction is supplied; the constructor derives the opposite
/// direction by inverting the permutation and inverting each transform,
/// so the two directions are coherent by construction. A `SymmetricMap`
/// is immutable after construction.
#[derive(Clone, Debug)]
pub struct SymmetricMap {
    /// derived index -> base index.
    to_base: Vec<u32>,
    to_base_transforms: Vec<Matrix4<f64>>,
    /// base index -> derived index.
    from_base: Vec<u32>,
    from_base_transforms: Vec<Matrix4<f64>>,
}

impl SymmetricMap {
    /// Build from the derived→base direction: `targets[i]` is the base
    /// element of derived element `i`, with `transforms[i]` mapping the
    /// derived element's frame to the base element's frame.
    pub fn from_derived_to_base(
        targets: Vec<u32>,
        transforms: Vec<Matrix4<f64>>,
    ) -> Result<Self> {
        let (inverse, inverse_transforms) = invert(&targets, &transforms)?;
        Ok(Self {
            to_base: targets,
            to_base_transforms: transforms,
            from_base: inverse,
            from_base_transforms: inverse_transforms,
        })
    }

    /// Build from the base→derived direction: `targets[i]` is the derived
    /// element of base element `i`, with `transforms[i]` mapping the base
    /// element's frame to the derived element's frame.
    pub fn from_base_to_derived(
        targets: Vec<u32>,
        transforms: Vec<Matrix4<f64>>,
    ) -> Result<Self> {
        let (inverse, inverse_transforms) = invert(&targets, &transforms)?;
        Ok(Self {
            from_base: targets,
            from_base_transforms: transforms,
            to_base: inverse,
            to_base_transforms: inverse_transforms,
        })
    }

    /// Number of elements (in either space).
    #[inline]
    pub fn len(&self) -> usize {
        self.to_base.len()
    }

    /// Whether the map covers no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.to_base.is_empty()
    }
}

/// Invert a permutation together with its per-element transforms.
fn invert(
    targets: &[u32],
    transforms: &[Matrix4<f64>],
) -> Result<(Vec<u32>, Vec<Matrix4<f64>>)> {
    if transforms.len() != targets.len() {
        return Err(MeshError::LengthMismatch {
            upstream: targets.len(),
            downstream: transforms.len(),
        });
    }

    let n = targets.len();
    let mut inverse = vec![u32::MAX; n];
    let mut inverse_transforms = vec![Matrix4::identity(); n];

    for (i, &target) in targets.iter().enumerate() {
        let t = target as usize;
        if t >= n {
            return Err(MeshError::OutOfBounds {
                kind: "permutation target",
                index: t,
                len: n,
            });
        }
        if inverse[t] != u32::MAX {
            return Err(MeshError::InvalidPermutation { target: t });
        }
        inverse[t] = i as u32;
        inverse_transforms[t] = transforms[i]
            .try_inverse()
            .ok_or(MeshError::SingularTransform { index: i })?;
    }

    Ok((inverse, inverse_transforms))
}

impl IndexMap for SymmetricMap {
    fn lengths(&self) -> MapLengths {
        MapLengths {
            base: self.len(),
            derived: self.len(),
        }
    }

    fn from_base(&self, index: usize) -> Result<MapEntry> {
        if index >= self.len() {
            return Err(MeshError::OutOfBounds {
                kind: "base element",
                index,
                len: self.len(),
            });
        }
        Ok(MapEntry {
            indices: vec![self.from_base[index] as usize],
            transforms: vec![self.from_base_transforms[index]],
        })
    }

    fn to_base(&self, index: usize) -> Result<MapEntry> {
        if index >= self.len() {
            return Err(MeshError::OutOfBounds {
                kind: "derived element",
                index,
                len: self.len(),
            });
        }
        Ok(MapEntry {
            indices: vec![self.to_base[index] as usize],
            transforms: vec![self.to_base_transforms[index]],
        })
    }
}
