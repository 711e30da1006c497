//! Readers for Clawpack fixed grid output.
//!
//! GeoClaw and D-Claw write two kinds of fixed grid files: fgout frames,
//! snapshots of the solution at regular times, and fgmax files holding
//! running extremes over a whole run. Both are stored in solver order and
//! are returned here as labeled datasets in display order, with the first
//! row at the largest y.


pub mod constants;
pub mod dataset;
pub mod error;
pub mod fgmax;
pub mod fgout;
pub mod filename;
pub mod metadata;
pub mod orient;
pub mod parameters;
pub mod utils;
pub mod variables;

pub use {
    dataset::Dataset,
    error::{Error, Result},
    fgmax::open_fgmax,
    fgout::open_fgout,
    parameters::ReaderOptions,
};

use std::path::Path;

/// Opens an fgout frame or fgmax file, choosing the reader from the file name.
pub fn open_dataset<P: AsRef<Path>>(path: P, options: &ReaderOptions) -> Result<Dataset> {
    let path = path.as_ref();
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::Format(format!("{} has no file name", path.display())))?;

    if name.starts_with("fgout") {
        open_fgout(path, options)
    } else if name.starts_with("fgmax") {
        open_fgmax(path, options)
    } else {
        Err(Error::Format(format!(
            "{:?} is neither an fgout frame nor an fgmax file",
            name
        )))
    }
}
