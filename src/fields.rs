//! Element-major storage for modal coefficient fields.
//!
//! The solution `U`, the primitives `P` and the right-hand side `R` all share
//! the same layout: for each element (unknown) a contiguous row of `nprop`
//! reals, where `nprop = ncomp * rdof` and component `c`'s modal coefficients
//! occupy slots `c*rdof .. (c+1)*rdof` of the row.

/// A dense `nunk x nprop` array of reals, row-major by unknown (element).
#[derive(Clone, Debug, PartialEq)]
pub struct Fields {
    nunk: usize,
    nprop: usize,
    data: Vec<f64>,
}

impl Fields {
    /// Allocate a zero-initialized field array.
    pub fn new(nunk: usize, nprop: usize) -> Self {
        Self {
            nunk,
            nprop,
            data: vec![0.0; nunk * nprop],
        }
    }

    /// Number of unknowns (rows).
    #[inline]
    pub fn nunk(&self) -> usize {
        self.nunk
    }

    /// Number of properties per unknown (columns).
    #[inline]
    pub fn nprop(&self) -> usize {
        self.nprop
    }

    /// True if the array holds no data.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Read one entry.
    #[inline]
    pub fn get(&self, e: usize, idx: usize) -> f64 {
        debug_assert!(e < self.nunk && idx < self.nprop);
        self.data[e * self.nprop + idx]
    }

    /// Write one entry.
    #[inline]
    pub fn set(&mut self, e: usize, idx: usize, v: f64) {
        debug_assert!(e < self.nunk && idx < self.nprop);
        self.data[e * self.nprop + idx] = v;
    }

    /// Add to one entry.
    #[inline]
    pub fn add(&mut self, e: usize, idx: usize, v: f64) {
        debug_assert!(e < self.nunk && idx < self.nprop);
        self.data[e * self.nprop + idx] += v;
    }

    /// Borrow the row of element `e`.
    #[inline]
    pub fn row(&self, e: usize) -> &[f64] {
        &self.data[e * self.nprop..(e + 1) * self.nprop]
    }

    /// Mutably borrow the row of element `e`.
    #[inline]
    pub fn row_mut(&mut self, e: usize) -> &mut [f64] {
        &mut self.data[e * self.nprop..(e + 1) * self.nprop]
    }

    /// Set every entry to `v`.
    pub fn fill(&mut self, v: f64) {
        self.data.iter_mut().for_each(|x| *x = v);
    }

    /// Mutably borrow the full backing storage, split by rows.
    ///
    /// Used by the parallel per-element loops: each chunk is one element row.
    pub fn rows_mut(&mut self) -> std::slice::ChunksMut<'_, f64> {
        self.data.chunks_mut(self.nprop)
    }

    /// Rayon-parallel variant of [`Fields::rows_mut`].
    #[cfg(feature = "parallel")]
    pub fn par_rows_mut(&mut self) -> rayon::slice::ChunksMut<'_, f64> {
        use rayon::prelude::*;
        self.data.par_chunks_mut(self.nprop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let mut f = Fields::new(3, 4);
        assert_eq!(f.nunk(), 3);
        assert_eq!(f.nprop(), 4);
        f.set(1, 2, 7.5);
        assert_eq!(f.get(1, 2), 7.5);
        assert_eq!(f.row(1), &[0.0, 0.0, 7.5, 0.0]);
        f.add(1, 2, 0.5);
        assert_eq!(f.get(1, 2), 8.0);
    }

    #[test]
    fn test_fill() {
        let mut f = Fields::new(2, 2);
        f.fill(1.0);
        assert!(f.row(0).iter().chain(f.row(1)).all(|&x| x == 1.0));
    }
}
