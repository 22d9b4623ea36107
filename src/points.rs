//! Sample points at which elements are compared.
use crate::settings::Settings;
use crate::util::sha256_hex;
use defelement_reference::ReferenceCell;
use nalgebra::DMatrix;

/// All points `i / n` of the lattice of size `n` on `cell`, boundary included.
///
/// Points are returned one per row.
pub fn lattice(cell: ReferenceCell, n: usize) -> DMatrix<f64> {
    assert!(n > 0, "lattice size must be positive");
    let h = 1.0 / n as f64;
    let mut points: Vec<[f64; 3]> = Vec::new();
    let simplex = cell.is_simplex();
    let range = |used: usize| if used < n { 0..=n - used } else { 0..=0 };
    match cell.tdim() {
        1 => {
            for i in 0..=n {
                points.push([i as f64 * h, 0.0, 0.0]);
            }
        }
        2 => {
            for j in 0..=n {
                let imax = if simplex { n - j } else { n };
                for i in 0..=imax {
                    points.push([i as f64 * h, j as f64 * h, 0.0]);
                }
            }
        }
        _ => {
            for k in 0..=n {
                let jrange = if simplex { range(k) } else { 0..=n };
                for j in jrange {
                    let irange = if simplex { range(j + k) } else { 0..=n };
                    for i in irange {
                        points.push([i as f64 * h, j as f64 * h, k as f64 * h]);
                    }
                }
            }
        }
    }
    let tdim = cell.tdim();
    DMatrix::from_fn(points.len(), tdim, |i, j| points[i][j])
}

/// The sample points for a cell, using the lattice sizes from the settings.
pub fn sample_points(cell: ReferenceCell, settings: &Settings) -> DMatrix<f64> {
    lattice(cell, settings.lattice_size(cell.tdim()))
}

/// A digest identifying a point set, used as part of cache keys.
pub fn points_digest(points: &DMatrix<f64>) -> String {
    let mut bytes = Vec::with_capacity(16 + 8 * points.len());
    bytes.extend_from_slice(&(points.nrows() as u64).to_le_bytes());
    bytes.extend_from_slice(&(points.ncols() as u64).to_le_bytes());
    for i in 0..points.nrows() {
        for j in 0..points.ncols() {
            bytes.extend_from_slice(&points[(i, j)].to_le_bytes());
        }
    }
    sha256_hex(&bytes)
}
