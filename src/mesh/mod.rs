//! Unstructured tetrahedral mesh with the derived connectivity the
//! cell-centered DG core consumes.
//!
//! The core treats all of this as read-only input: tet-node connectivity,
//! elements-surrounding-points (esup), face neighbors (esuel), face-element
//! and face-node arrays with boundary faces first (esuf, inpofa), side-set
//! face lists, and precomputed element/face geometry. A structured-box
//! builder is provided for tests and convergence studies.

pub mod geometry;

use std::collections::HashMap;

use crate::error::MultiMatError;
use geometry::jacobian;

/// Local face -> local node map of a tetrahedron, each face ordered so the
/// right-hand-rule normal points out of the element. Face `f` is opposite
/// local node `f`.
pub const LPOFA: [[usize; 3]; 4] = [[1, 2, 3], [0, 3, 2], [0, 1, 3], [0, 2, 1]];

/// Precomputed element geometry.
#[derive(Clone, Copy, Debug)]
pub struct GeoElem {
    /// Element volume.
    pub vol: f64,
    /// Centroid coordinates.
    pub centroid: [f64; 3],
    /// Characteristic length (minimum edge).
    pub h: f64,
}

/// Precomputed face geometry.
#[derive(Clone, Copy, Debug)]
pub struct GeoFace {
    /// Face area.
    pub area: f64,
    /// Outward unit normal (from the left element).
    pub normal: [f64; 3],
    /// Face centroid.
    pub centroid: [f64; 3],
}

/// Tetrahedral mesh partition.
#[derive(Clone, Debug)]
pub struct TetMesh {
    /// Nodal coordinates, one vector per direction.
    pub coord: [Vec<f64>; 3],
    /// Tet-node connectivity, four nodes per element.
    pub inpoel: Vec<usize>,
    /// Elements surrounding each point.
    pub esup: Vec<Vec<usize>>,
    /// Neighbor element across each local face, -1 on the boundary.
    pub esuel: Vec<i64>,
    /// Left/right element of each face; boundary faces (right = -1) first.
    pub esuf: Vec<i64>,
    /// Face-node connectivity, three nodes per face, ordered outward from
    /// the left element.
    pub inpofa: Vec<usize>,
    /// Number of boundary faces (they occupy the front of the face arrays).
    pub nbfac: usize,
    /// Boundary faces per side-set id.
    pub bface: HashMap<i32, Vec<usize>>,
    /// Element geometry.
    pub geo_elem: Vec<GeoElem>,
    /// Face geometry.
    pub geo_face: Vec<GeoFace>,
}

impl TetMesh {
    /// Build a mesh from coordinates, connectivity and a side-set
    /// classifier called with each boundary-face centroid and outward
    /// normal.
    pub fn new(
        coord: [Vec<f64>; 3],
        inpoel: Vec<usize>,
        side_set: impl Fn([f64; 3], [f64; 3]) -> i32,
    ) -> Result<Self, MultiMatError> {
        if inpoel.len() % 4 != 0 {
            return Err(MultiMatError::Contract(
                "tet connectivity length must be a multiple of 4".into(),
            ));
        }
        let nelem = inpoel.len() / 4;
        let npoin = coord[0].len();
        if coord[1].len() != npoin || coord[2].len() != npoin {
            return Err(MultiMatError::Contract(
                "coordinate arrays must have equal length".into(),
            ));
        }

        // elements surrounding points
        let mut esup = vec![Vec::new(); npoin];
        for e in 0..nelem {
            for lp in 0..4 {
                esup[inpoel[4 * e + lp]].push(e);
            }
        }

        // match faces by sorted node triple
        let mut facemap: HashMap<[usize; 3], (usize, usize)> = HashMap::new();
        let mut esuel = vec![-1i64; 4 * nelem];
        for e in 0..nelem {
            for (lf, lnodes) in LPOFA.iter().enumerate() {
                let mut key = [
                    inpoel[4 * e + lnodes[0]],
                    inpoel[4 * e + lnodes[1]],
                    inpoel[4 * e + lnodes[2]],
                ];
                key.sort_unstable();
                if let Some((en, lfn)) = facemap.remove(&key) {
                    esuel[4 * e + lf] = en as i64;
                    esuel[4 * en + lfn] = e as i64;
                } else {
                    facemap.insert(key, (e, lf));
                }
            }
        }

        // face arrays: boundary faces first, then internal, both scanned in
        // (element, local face) order for reproducibility
        let mut esuf = Vec::new();
        let mut inpofa = Vec::new();
        let mut nbfac = 0;
        for e in 0..nelem {
            for (lf, lnodes) in LPOFA.iter().enumerate() {
                if esuel[4 * e + lf] == -1 {
                    esuf.push(e as i64);
                    esuf.push(-1);
                    for &ln in lnodes {
                        inpofa.push(inpoel[4 * e + ln]);
                    }
                    nbfac += 1;
                }
            }
        }
        for e in 0..nelem {
            for (lf, lnodes) in LPOFA.iter().enumerate() {
                let en = esuel[4 * e + lf];
                // register each internal face once, owned by the lower id
                if en > e as i64 {
                    esuf.push(e as i64);
                    esuf.push(en);
                    for &ln in lnodes {
                        inpofa.push(inpoel[4 * e + ln]);
                    }
                }
            }
        }

        // geometry
        let nodal = |n: usize| [coord[0][n], coord[1][n], coord[2][n]];
        let mut geo_elem = Vec::with_capacity(nelem);
        for e in 0..nelem {
            let v: Vec<[f64; 3]> = (0..4).map(|lp| nodal(inpoel[4 * e + lp])).collect();
            let vol = jacobian(&v[0], &v[1], &v[2], &v[3]) / 6.0;
            if vol <= 0.0 {
                return Err(MultiMatError::Contract(format!(
                    "element {e} has non-positive volume {vol}"
                )));
            }
            let centroid = [
                (v[0][0] + v[1][0] + v[2][0] + v[3][0]) / 4.0,
                (v[0][1] + v[1][1] + v[2][1] + v[3][1]) / 4.0,
                (v[0][2] + v[1][2] + v[2][2] + v[3][2]) / 4.0,
            ];
            let mut h = f64::INFINITY;
            for i in 0..4 {
                for j in (i + 1)..4 {
                    let d = ((v[i][0] - v[j][0]).powi(2)
                        + (v[i][1] - v[j][1]).powi(2)
                        + (v[i][2] - v[j][2]).powi(2))
                    .sqrt();
                    h = h.min(d);
                }
            }
            geo_elem.push(GeoElem { vol, centroid, h });
        }

        let nfac = esuf.len() / 2;
        let mut geo_face = Vec::with_capacity(nfac);
        for f in 0..nfac {
            let a = nodal(inpofa[3 * f]);
            let b = nodal(inpofa[3 * f + 1]);
            let c = nodal(inpofa[3 * f + 2]);
            let ab = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
            let ac = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
            let cross = [
                ab[1] * ac[2] - ab[2] * ac[1],
                ab[2] * ac[0] - ab[0] * ac[2],
                ab[0] * ac[1] - ab[1] * ac[0],
            ];
            let twice_area = (cross[0] * cross[0] + cross[1] * cross[1] + cross[2] * cross[2])
                .sqrt();
            let area = 0.5 * twice_area;
            let normal = [
                cross[0] / twice_area,
                cross[1] / twice_area,
                cross[2] / twice_area,
            ];
            let centroid = [
                (a[0] + b[0] + c[0]) / 3.0,
                (a[1] + b[1] + c[1]) / 3.0,
                (a[2] + b[2] + c[2]) / 3.0,
            ];
            geo_face.push(GeoFace {
                area,
                normal,
                centroid,
            });
        }

        // side sets from the classifier
        let mut bface: HashMap<i32, Vec<usize>> = HashMap::new();
        for f in 0..nbfac {
            let gf = &geo_face[f];
            let ss = side_set(gf.centroid, gf.normal);
            bface.entry(ss).or_default().push(f);
        }

        Ok(Self {
            coord,
            inpoel,
            esup,
            esuel,
            esuf,
            inpofa,
            nbfac,
            bface,
            geo_elem,
            geo_face,
        })
    }

    /// Number of elements.
    #[inline]
    pub fn nelem(&self) -> usize {
        self.inpoel.len() / 4
    }

    /// Number of faces (boundary + internal).
    #[inline]
    pub fn nfac(&self) -> usize {
        self.esuf.len() / 2
    }

    /// Vertex coordinates of element `e`.
    #[inline]
    pub fn coordel(&self, e: usize) -> [[f64; 3]; 4] {
        let mut c = [[0.0; 3]; 4];
        for lp in 0..4 {
            let n = self.inpoel[4 * e + lp];
            c[lp] = [self.coord[0][n], self.coord[1][n], self.coord[2][n]];
        }
        c
    }

    /// Vertex coordinates of face `f`.
    #[inline]
    pub fn coordfa(&self, f: usize) -> [[f64; 3]; 3] {
        let mut c = [[0.0; 3]; 3];
        for lp in 0..3 {
            let n = self.inpofa[3 * f + lp];
            c[lp] = [self.coord[0][n], self.coord[1][n], self.coord[2][n]];
        }
        c
    }

    /// Build a structured box mesh: an `nx x ny x nz` grid of cells, each
    /// split into six tetrahedra along the main diagonal (Kuhn subdivision,
    /// conforming across cells). Boundary faces are classified into side
    /// sets 1..6 ordered x-min, x-max, y-min, y-max, z-min, z-max.
    pub fn boxmesh(
        nx: usize,
        ny: usize,
        nz: usize,
        xr: [f64; 2],
        yr: [f64; 2],
        zr: [f64; 2],
    ) -> Self {
        let nid = |i: usize, j: usize, k: usize| (k * (ny + 1) + j) * (nx + 1) + i;
        let mut coord = [Vec::new(), Vec::new(), Vec::new()];
        for k in 0..=nz {
            for j in 0..=ny {
                for i in 0..=nx {
                    coord[0].push(xr[0] + (xr[1] - xr[0]) * i as f64 / nx as f64);
                    coord[1].push(yr[0] + (yr[1] - yr[0]) * j as f64 / ny as f64);
                    coord[2].push(zr[0] + (zr[1] - zr[0]) * k as f64 / nz as f64);
                }
            }
        }

        let mut inpoel = Vec::with_capacity(24 * nx * ny * nz);
        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    let v = |di: usize, dj: usize, dk: usize| nid(i + di, j + dj, k + dk);
                    let (v000, v100, v010, v110) = (v(0, 0, 0), v(1, 0, 0), v(0, 1, 0), v(1, 1, 0));
                    let (v001, v101, v011, v111) = (v(0, 0, 1), v(1, 0, 1), v(0, 1, 1), v(1, 1, 1));
                    // six positively-oriented tets sharing the main diagonal
                    let tets = [
                        [v000, v100, v110, v111],
                        [v000, v100, v111, v101],
                        [v000, v110, v010, v111],
                        [v000, v010, v011, v111],
                        [v000, v001, v101, v111],
                        [v000, v011, v001, v111],
                    ];
                    for t in tets {
                        inpoel.extend_from_slice(&t);
                    }
                }
            }
        }

        let tol = 1e-10
            * (xr[1] - xr[0])
                .abs()
                .max((yr[1] - yr[0]).abs())
                .max((zr[1] - zr[0]).abs());
        let side_set = move |c: [f64; 3], _n: [f64; 3]| -> i32 {
            if (c[0] - xr[0]).abs() < tol {
                1
            } else if (c[0] - xr[1]).abs() < tol {
                2
            } else if (c[1] - yr[0]).abs() < tol {
                3
            } else if (c[1] - yr[1]).abs() < tol {
                4
            } else if (c[2] - zr[0]).abs() < tol {
                5
            } else {
                6
            }
        };

        Self::new(coord, inpoel, side_set).expect("box mesh construction cannot fail")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_mesh_counts_and_volume() {
        let m = TetMesh::boxmesh(2, 2, 2, [0.0, 1.0], [0.0, 1.0], [0.0, 1.0]);
        assert_eq!(m.nelem(), 6 * 8);
        let vol: f64 = m.geo_elem.iter().map(|g| g.vol).sum();
        assert!((vol - 1.0).abs() < 1e-12);
        // 2 boundary triangles per cell face, 4 cell faces per side, 6 sides
        assert_eq!(m.nbfac, 6 * 2 * 4);
        assert_eq!(m.bface.len(), 6);
        for faces in m.bface.values() {
            assert_eq!(faces.len(), 8);
        }
    }

    #[test]
    fn test_face_orientation() {
        let m = TetMesh::boxmesh(2, 1, 1, [0.0, 2.0], [0.0, 1.0], [0.0, 1.0]);
        for f in 0..m.nfac() {
            let el = m.esuf[2 * f] as usize;
            let gf = &m.geo_face[f];
            let ge = &m.geo_elem[el];
            let d: f64 = (0..3)
                .map(|i| gf.normal[i] * (gf.centroid[i] - ge.centroid[i]))
                .sum();
            assert!(d > 0.0, "face {f} normal does not point away from left element");
            if m.esuf[2 * f + 1] >= 0 {
                let er = m.esuf[2 * f + 1] as usize;
                let gr = &m.geo_elem[er];
                let dr: f64 = (0..3)
                    .map(|i| gf.normal[i] * (gr.centroid[i] - gf.centroid[i]))
                    .sum();
                assert!(dr > 0.0, "face {f} normal does not point toward right element");
            } else {
                assert!(f < m.nbfac, "boundary face {f} not in the boundary block");
            }
        }
    }

    #[test]
    fn test_esuel_symmetry() {
        let m = TetMesh::boxmesh(2, 2, 1, [0.0, 1.0], [0.0, 1.0], [0.0, 0.5]);
        for e in 0..m.nelem() {
            for lf in 0..4 {
                let n = m.esuel[4 * e + lf];
                if n >= 0 {
                    let n = n as usize;
                    let back = (0..4).any(|lg| m.esuel[4 * n + lg] == e as i64);
                    assert!(back, "esuel not symmetric between {e} and {n}");
                }
            }
        }
    }

    #[test]
    fn test_esup_contains_own_elements() {
        let m = TetMesh::boxmesh(1, 1, 1, [0.0, 1.0], [0.0, 1.0], [0.0, 1.0]);
        for e in 0..m.nelem() {
            for lp in 0..4 {
                let p = m.inpoel[4 * e + lp];
                assert!(m.esup[p].contains(&e));
            }
        }
    }
}
