/// Depth below which a cell is considered dry
pub const DRY_TOLERANCE: f64 = 0.001;

/// Fill value written into masked cells
pub const NODATA: f64 = std::f64::NAN;

/// Values below this are the solver's "not set" marker in fgmax output
pub const FGMAX_NOTSET: f64 = -1.0e50;

pub const FGOUT_GRIDS_FILE: &str = "fgout_grids.data";
pub const FGMAX_GRIDS_FILE: &str = "fgmax_grids.data";

pub const SPACE_UNIT: &str = "meters";
pub const TIME_UNIT: &str = "seconds";
pub const REFERENCE_TIME: &str = "model start";

pub const GEOCLAW_DESCRIPTION: &str = "GeoClaw model output";
pub const DCLAW_DESCRIPTION: &str = "D-Claw model output";
pub const FGMAX_DESCRIPTION: &str = "Clawpack fgmax output";

/// Name of the scalar coordinate carrying CRS information
pub const SPATIAL_REF: &str = "spatial_ref";
