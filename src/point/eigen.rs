//! Closed-form eigen-decomposition of small symmetric matrices.
//!
//! 2×2 matrices use the quadratic formula, 3×3 matrices the trigonometric
//! solution of the depressed characteristic cubic. Eigenvectors come from the
//! adjugate of `A − λI`; vectors that vanish numerically (repeated roots) are
//! rebuilt from the others so the result is always an orthonormal basis.
//!
//! Eigenpairs are ordered by ascending `|λ|`, ties broken by signed value.

use std::cmp::Ordering;
use std::f64::consts::PI;

/// Eigenvalues and unit eigenvectors of a symmetric 2×2 or 3×3 matrix.
///
/// For 2×2 input only the first two entries of `values` and the first two
/// components of the first two `vectors` are meaningful; the rest are zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EigenSystem {
    pub dims: usize,
    pub values: [f64; 3],
    pub vectors: [[f64; 3]; 3],
}

impl EigenSystem {
    pub fn value(&self, i: usize) -> f64 {
        self.values[i]
    }

    pub fn vector(&self, i: usize) -> [f64; 3] {
        self.vectors[i]
    }
}

/// Symmetric 3×3 matrix given by its upper triangle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SymmetricMatrix3 {
    pub xx: f64,
    pub xy: f64,
    pub xz: f64,
    pub yy: f64,
    pub yz: f64,
    pub zz: f64,
}

impl SymmetricMatrix3 {
    pub fn diagonal(x: f64, y: f64, z: f64) -> Self {
        Self {
            xx: x,
            yy: y,
            zz: z,
            ..Self::default()
        }
    }

    fn rows(&self) -> [[f64; 3]; 3] {
        [
            [self.xx, self.xy, self.xz],
            [self.xy, self.yy, self.yz],
            [self.xz, self.yz, self.zz],
        ]
    }

    fn max_abs(&self) -> f64 {
        [self.xx, self.xy, self.xz, self.yy, self.yz, self.zz]
            .iter()
            .fold(0.0f64, |m, v| m.max(v.abs()))
    }

    /// Matrix-vector product.
    pub fn apply(&self, v: [f64; 3]) -> [f64; 3] {
        let r = self.rows();
        [dot(r[0], v), dot(r[1], v), dot(r[2], v)]
    }
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn norm(a: [f64; 3]) -> f64 {
    dot(a, a).sqrt()
}

fn scale(a: [f64; 3], s: f64) -> [f64; 3] {
    [a[0] * s, a[1] * s, a[2] * s]
}

fn ordering(a: f64, b: f64) -> Ordering {
    a.abs().total_cmp(&b.abs()).then(a.total_cmp(&b))
}

fn basis(i: usize) -> [f64; 3] {
    let mut e = [0.0; 3];
    e[i] = 1.0;
    e
}

/// Sort eigenpairs by the crate-wide ordering.
fn sorted(dims: usize, values: [f64; 3], vectors: [[f64; 3]; 3]) -> EigenSystem {
    let mut order: Vec<usize> = (0..dims).collect();
    order.sort_by(|&i, &j| ordering(values[i], values[j]));
    let mut out = EigenSystem {
        dims,
        ..EigenSystem::default()
    };
    for (slot, &i) in order.iter().enumerate() {
        out.values[slot] = values[i];
        out.vectors[slot] = vectors[i];
    }
    out
}

/// Eigen-decomposition of `[[a, b], [b, c]]`.
pub fn symmetric_eigen_2x2(a: f64, b: f64, c: f64, epsilon: f64) -> EigenSystem {
    let size = a.abs().max(b.abs()).max(c.abs());
    let half_trace = 0.5 * (a + c);
    let half_diff = 0.5 * (a - c);
    let disc = (half_diff * half_diff + b * b).sqrt();

    if size == 0.0 || disc <= epsilon * size {
        return sorted(
            2,
            [half_trace, half_trace, 0.0],
            [basis(0), basis(1), [0.0; 3]],
        );
    }

    let values = [half_trace - disc, half_trace + disc];
    let mut vectors = [[0.0f64; 2]; 2];
    let mut zero = [false; 2];
    for (k, &lambda) in values.iter().enumerate() {
        // adjugate of A - λI: [[c-λ, -b], [-b, a-λ]]
        let col0 = [c - lambda, -b];
        let col1 = [-b, a - lambda];
        let n0 = col0[0].hypot(col0[1]);
        let n1 = col1[0].hypot(col1[1]);
        let (v, n) = if n0 >= n1 { (col0, n0) } else { (col1, n1) };
        if n <= epsilon.sqrt() * size {
            zero[k] = true;
        } else {
            vectors[k] = [v[0] / n, v[1] / n];
        }
    }
    match zero {
        [true, false] => vectors[0] = [-vectors[1][1], vectors[1][0]],
        [false, true] => vectors[1] = [-vectors[0][1], vectors[0][0]],
        [true, true] => vectors = [[1.0, 0.0], [0.0, 1.0]],
        [false, false] => {}
    }

    sorted(
        2,
        [values[0], values[1], 0.0],
        [
            [vectors[0][0], vectors[0][1], 0.0],
            [vectors[1][0], vectors[1][1], 0.0],
            [0.0; 3],
        ],
    )
}

/// Eigen-decomposition of a symmetric 3×3 matrix.
pub fn symmetric_eigen_3x3(m: &SymmetricMatrix3, epsilon: f64) -> EigenSystem {
    let size = m.max_abs();
    if size == 0.0 {
        return sorted(3, [0.0; 3], [basis(0), basis(1), basis(2)]);
    }

    let p1 = m.xy * m.xy + m.xz * m.xz + m.yz * m.yz;
    if p1.sqrt() <= epsilon * size {
        return sorted(3, [m.xx, m.yy, m.zz], [basis(0), basis(1), basis(2)]);
    }

    let q = (m.xx + m.yy + m.zz) / 3.0;
    let (dx, dy, dz) = (m.xx - q, m.yy - q, m.zz - q);
    let p2 = dx * dx + dy * dy + dz * dz + 2.0 * p1;
    let p = (p2 / 6.0).sqrt();
    if p <= epsilon * size {
        return sorted(3, [q; 3], [basis(0), basis(1), basis(2)]);
    }

    // B = (A - qI) / p, r = det(B) / 2
    let (bxx, byy, bzz) = (dx / p, dy / p, dz / p);
    let (bxy, bxz, byz) = (m.xy / p, m.xz / p, m.yz / p);
    let det = bxx * (byy * bzz - byz * byz) - bxy * (bxy * bzz - byz * bxz)
        + bxz * (bxy * byz - byy * bxz);
    let r = (det / 2.0).clamp(-1.0, 1.0);
    let phi = r.acos() / 3.0;

    let largest = q + 2.0 * p * phi.cos();
    let smallest = q + 2.0 * p * (phi + 2.0 * PI / 3.0).cos();
    let middle = 3.0 * q - largest - smallest;
    let values = [smallest, middle, largest];

    let rows = m.rows();
    let threshold = epsilon.sqrt() * size * size;
    let mut vectors = [[0.0f64; 3]; 3];
    let mut zero = [false; 3];
    for (k, &lambda) in values.iter().enumerate() {
        let mut shifted = rows;
        for (d, row) in shifted.iter_mut().enumerate() {
            row[d] -= lambda;
        }
        let candidates = [
            cross(shifted[0], shifted[1]),
            cross(shifted[0], shifted[2]),
            cross(shifted[1], shifted[2]),
        ];
        let best = candidates
            .iter()
            .copied()
            .max_by(|a, b| norm(*a).total_cmp(&norm(*b)))
            .unwrap_or([0.0; 3]);
        let n = norm(best);
        if n <= threshold {
            zero[k] = true;
        } else {
            vectors[k] = scale(best, 1.0 / n);
        }
    }

    complete_basis(&mut vectors, zero);
    sorted(3, values, vectors)
}

/// Replace flagged vectors so that `vectors` is an orthonormal basis.
fn complete_basis(vectors: &mut [[f64; 3]; 3], zero: [bool; 3]) {
    let missing: Vec<usize> = (0..3).filter(|&k| zero[k]).collect();
    match missing.as_slice() {
        [] => {}
        [k] => {
            let others: Vec<usize> = (0..3).filter(|i| i != k).collect();
            let c = cross(vectors[others[0]], vectors[others[1]]);
            let n = norm(c);
            vectors[*k] = if n > 0.0 { scale(c, 1.0 / n) } else { basis(*k) };
        }
        [a, b] => {
            let known = (0..3).find(|i| !zero[*i]).unwrap_or(0);
            let v = vectors[known];
            // axis least aligned with v
            let axis = (0..3)
                .min_by(|&i, &j| v[i].abs().total_cmp(&v[j].abs()))
                .unwrap_or(0);
            let u = cross(v, basis(axis));
            let u = scale(u, 1.0 / norm(u));
            vectors[*a] = u;
            vectors[*b] = cross(v, u);
        }
        _ => {
            *vectors = [basis(0), basis(1), basis(2)];
        }
    }
}
