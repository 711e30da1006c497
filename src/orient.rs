//! Reorientation of solver fields into display order.
//!
//! The solver stores 2D fields indexed `[ix, iy]` with y ascending. Labeled
//! array consumers expect `[row, col]` with row 0 at the top, so each field is
//! transposed and flipped vertically exactly once.

use {
    crate::{
        error::{Error, Result},
        utils::{flip_vertical, transpose},
    },
    ndarray::Array2,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// `[ix, iy]`, y ascending
    Solver,
    /// `[row, col]`, row 0 is the largest y
    Display,
}

/// 2D field tagged with the order its data is stored in
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    name: String,
    data: Array2<f64>,
    orientation: Orientation,
}

impl Field {
    /// Wraps a field read from solver output.
    pub fn solver<S: Into<String>>(name: S, data: Array2<f64>) -> Self {
        Field {
            name: name.into(),
            data,
            orientation: Orientation::Solver,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn into_data(self) -> Array2<f64> {
        self.data
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }
}

/// Masks, transposes and vertically flips a solver field.
///
/// Cells where `mask` is true become `fill`. The input is left untouched. A
/// field that has already been oriented is rejected.
pub fn orient(field: &Field, mask: Option<&Array2<bool>>, fill: f64) -> Result<Field> {
    if field.orientation == Orientation::Display {
        return Err(Error::AlreadyOriented(field.name.clone()));
    }

    let mut data = field.data.clone();

    if let Some(mask) = mask {
        if mask.shape() != data.shape() {
            return Err(Error::Format(format!(
                "mask shape {:?} does not match field {:?} shape {:?}",
                mask.shape(),
                field.name,
                data.shape()
            )));
        }

        for (v, &masked) in data.iter_mut().zip(mask.iter()) {
            if masked {
                *v = fill;
            }
        }
    }

    Ok(Field {
        name: field.name.clone(),
        data: flip_vertical(transpose(data.view()).view()),
        orientation: Orientation::Display,
    })
}

/// Inverse of [`orient`] without the masking, returning a field in solver order.
pub fn restore_solver_order(field: &Field) -> Result<Field> {
    if field.orientation == Orientation::Solver {
        return Err(Error::Format(format!(
            "field {:?} is already in solver order",
            field.name
        )));
    }

    Ok(Field {
        name: field.name.clone(),
        data: transpose(flip_vertical(field.data.view()).view()),
        orientation: Orientation::Solver,
    })
}
