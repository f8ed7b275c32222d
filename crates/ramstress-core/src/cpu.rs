//! CPU load generator.

use std::hint::black_box;

/// Matrix dimension.
pub const MATRIX_N: usize = 64;

/// Multiply two 64x64 matrices seeded from trigonometric functions.
///
/// `A[i][j] = sin(i)·cos(j)`, `B[i][j] = tan(i+j)`. There is nothing to
/// verify; the result goes through [`black_box`] so the work is kept, and
/// the trace of `C` is returned.
#[must_use]
pub fn matrix_burn() -> f64 {
    let mut a = [[0.0f64; MATRIX_N]; MATRIX_N];
    let mut b = [[0.0f64; MATRIX_N]; MATRIX_N];
    let mut c = [[0.0f64; MATRIX_N]; MATRIX_N];

    for i in 0..MATRIX_N {
        for j in 0..MATRIX_N {
            let (fi, fj) = (black_box(i) as f64, black_box(j) as f64);
            a[i][j] = fi.sin() * fj.cos();
            b[i][j] = (fi + fj).tan();
        }
    }

    for i in 0..MATRIX_N {
        for j in 0..MATRIX_N {
            let mut sum = 0.0;
            for k in 0..MATRIX_N {
                sum += a[i][k] * b[k][j];
            }
            c[i][j] = sum;
        }
    }

    let c = black_box(c);
    (0..MATRIX_N).map(|i| c[i][i]).sum()
}
