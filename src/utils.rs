use {
    crate::error::{Error, Result},
    ndarray::{s, Array1, Array2, Array3, ArrayView2, ShapeBuilder},
};

/// Checks that `len` values fill a field of the given extents.
fn check_len(len: usize, extents: &[usize]) -> Result<()> {
    let expected = extents
        .iter()
        .try_fold(1usize, |n, &e| n.checked_mul(e));

    match expected {
        Some(n) if n == len => Ok(()),
        Some(n) => Err(Error::Format(format!(
            "expected {} values for a {:?} field, found {}",
            n, extents, len
        ))),
        None => Err(Error::Format(format!(
            "field extents {:?} overflow, found {} values",
            extents, len
        ))),
    }
}

/// Builds a 2D array from values stored with the first index varying fastest.
pub fn fortran2d(xs: Vec<f64>, x: usize, y: usize) -> Result<Array2<f64>> {
    check_len(xs.len(), &[x, y])?;
    Array2::from_shape_vec((x, y).strides((1, x)), xs)
        .map_err(|e| Error::Format(format!("invalid {}x{} field: {}", x, y, e)))
}

/// Builds a 3D array from values stored with the first index varying fastest.
pub fn fortran3d(xs: Vec<f64>, x: usize, y: usize, z: usize) -> Result<Array3<f64>> {
    check_len(xs.len(), &[x, y, z])?;
    Array3::from_shape_vec((x, y, z).strides((1, x, x * y)), xs)
        .map_err(|e| Error::Format(format!("invalid {}x{}x{} field: {}", x, y, z, e)))
}

/// `n` evenly spaced points from `a` to `b` inclusive.
pub fn linspace(a: f64, b: f64, n: usize) -> Array1<f64> {
    match n {
        0 => Array1::zeros(0),
        1 => Array1::from_elem(1, a),
        _ => {
            let dx = (b - a) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { b } else { a + dx * i as f64 })
                .collect()
        }
    }
}

pub fn flip_vertical(a: ArrayView2<f64>) -> Array2<f64> {
    a.slice(s![..;-1, ..]).to_owned()
}

pub fn transpose(a: ArrayView2<f64>) -> Array2<f64> {
    a.t().to_owned()
}

/// Parses a float as written by Fortran, accepting `D` exponents.
pub fn parse_f64(token: &str) -> Option<f64> {
    token
        .parse::<f64>()
        .ok()
        .or_else(|| token.replace(|c: char| c == 'D' || c == 'd', "E").parse().ok())
}

pub fn parse_floats(text: &str) -> Result<Vec<f64>> {
    text.split_whitespace()
        .map(|token| {
            parse_f64(token).ok_or_else(|| Error::Format(format!("invalid number {:?}", token)))
        })
        .collect()
}

#[cfg(test)]
pub(crate) fn assert_approx_eq_nan(a: &[f64], b: &[f64]) {
    assert_eq!(a.len(), b.len());
    for (i, e) in a.iter().enumerate() {
        if e.is_nan() || b[i].is_nan() {
            assert!(
                e.is_nan() && b[i].is_nan(),
                "element {}: {} != {}",
                i,
                e,
                b[i]
            );
        } else {
            approx::assert_abs_diff_eq!(*e, b[i], epsilon = 1.0E-12);
        }
    }
}
