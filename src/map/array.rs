//! Many-to-many maps in CSR storage.

use nalgebra::Matrix4;

use crate::error::{MeshError, Result};

use super::{IndexMap, MapEntry, MapLengths};

/// One direction of an [`ArrayMap`] while it is being assembled: rows of
/// (index, transform) entries packed behind 1-based end offsets, the same
/// layout the mesh uses for faces.
///
/// Push the entries of a row with [`push_entry`](Self::push_entry), then
/// close it with [`finish_row`](Self::finish_row); rows may be empty.
#[derive(Clone, Debug, Default)]
pub struct MapHalf {
    offset1: Vec<u32>,
    indices: Vec<u32>,
    transforms: Vec<Matrix4<f64>>,
}

impl MapHalf {
    /// An empty half with no rows.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty half with pre-allocated capacity.
    pub fn with_capacity(rows: usize, entries: usize) -> Self {
        Self {
            offset1: Vec::with_capacity(rows),
            indices: Vec::with_capacity(entries),
            transforms: Vec::with_capacity(entries),
        }
    }

    /// Append one (index, transform) entry to the current row.
    #[inline]
    pub fn push_entry(&mut self, index: usize, transform: Matrix4<f64>) {
        self.indices.push(index as u32);
        self.transforms.push(transform);
    }

    /// Close the current row.
    #[inline]
    pub fn finish_row(&mut self) {
        self.offset1.push(self.indices.len() as u32);
    }

    /// Number of closed rows.
    #[inline]
    pub fn rows(&self) -> usize {
        self.offset1.len()
    }

    fn max_index(&self) -> Option<usize> {
        self.indices.iter().max().map(|&i| i as usize)
    }

    fn row(&self, r: usize) -> (usize, usize) {
        let start = if r == 0 { 0 } else { self.offset1[r - 1] as usize };
        (start, self.offset1[r] as usize)
    }
}

/// A general many↔many correspondence.
///
/// Both directions are stored independently in CSR form; the constructor
/// checks that every index is in range for the opposite space, but the
/// two directions' *contents* are the producer's responsibility (they
/// must describe the same correspondence set).
#[derive(Clone, Debug)]
pub struct ArrayMap {
    from_base: MapHalf,
    to_base: MapHalf,
}

impl ArrayMap {
    /// Assemble from the two directions: `from_base` has one row per
    /// base element (entries index the derived space), `to_base` one row
    /// per derived element (entries index the base space).
    pub fn new(from_base: MapHalf, to_base: MapHalf) -> Result<Self> {
        if let Some(max) = from_base.max_index() {
            if max >= to_base.rows() {
                return Err(MeshError::OutOfBounds {
                    kind: "derived element",
                    index: max,
                    len: to_base.rows(),
                });
            }
        }
        if let Some(max) = to_base.max_index() {
            if max >= from_base.rows() {
                return Err(MeshError::OutOfBounds {
                    kind: "base element",
                    index: max,
                    len: from_base.rows(),
                });
            }
        }
        Ok(Self { from_base, to_base })
    }

    fn entry(half: &MapHalf, index: usize, kind: &'static str) -> Result<MapEntry> {
        if index >= half.rows() {
            return Err(MeshError::OutOfBounds {
                kind,
                index,
                len: half.rows(),
            });
        }
        let (start, end) = half.row(index);
        Ok(MapEntry {
            indices: half.indices[start..end].iter().map(|&i| i as usize).collect(),
            transforms: half.transforms[start..end].to_vec(),
        })
    }
}

impl IndexMap for ArrayMap {
    fn lengths(&self) -> MapLengths {
        MapLengths {
            base: self.from_base.rows(),
            derived: self.to_base.rows(),
        }
    }

    fn from_base(&self, index: usize) -> Result<MapEntry> {
        Self::entry(&self.from_base, index, "base element")
    }

    fn to_base(&self, index: usize) -> Result<MapEntry> {
        Self::entry(&self.to_base, index, "derived element")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 2 base elements fanning out to 3 derived elements:
    /// base 0 -> {0, 1}, base 1 -> {2}.
    fn fan_map() -> ArrayMap {
        let mut from_base = MapHalf::new();
        from_base.push_entry(0, Matrix4::identity());
        from_base.push_entry(1, Matrix4::identity());
        from_base.finish_row();
        from_base.push_entry(2, Matrix4::identity());
        from_base.finish_row();

        let mut to_base = MapHalf::new();
        for parent in [0, 0, 1] {
            to_base.push_entry(parent, Matrix4::identity());
            to_base.finish_row();
        }
        ArrayMap::new(from_base, to_base).unwrap()
    }

    #[test]
    fn test_array_lengths_and_rows() {
        let map = fan_map();
        assert_eq!(map.lengths(), MapLengths { base: 2, derived: 3 });
        assert_eq!(map.from_base(0).unwrap().indices, vec![0, 1]);
        assert_eq!(map.from_base(1).unwrap().indices, vec![2]);
        assert_eq!(map.to_base(1).unwrap().indices, vec![0]);
        assert_eq!(map.to_base(2).unwrap().indices, vec![1]);
    }

    #[test]
    fn test_array_roundtrip_contains_origin() {
        let map = fan_map();
        for b in 0..2 {
            for &d in &map.from_base(b).unwrap().indices {
                assert!(map.to_base(d).unwrap().indices.contains(&b));
            }
        }
    }

    #[test]
    fn test_array_empty_rows() {
        let mut from_base = MapHalf::new();
        from_base.finish_row();
        let mut to_base = MapHalf::new();
        to_base.finish_row();
        let map = ArrayMap::new(from_base, to_base).unwrap();
        assert_eq!(map.from_base(0).unwrap(), MapEntry::empty());
    }

    #[test]
    fn test_array_rejects_out_of_range() {
        let mut from_base = MapHalf::new();
        from_base.push_entry(5, Matrix4::identity());
        from_base.finish_row();
        let mut to_base = MapHalf::new();
        to_base.push_entry(0, Matrix4::identity());
        to_base.finish_row();
        assert!(matches!(
            ArrayMap::new(from_base, to_base),
            Err(MeshError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_array_bounds() {
        let map = fan_map();
        assert!(map.from_base(2).is_err());
        assert!(map.to_base(3).is_err());
    }
}
