use {
    crate::{
        constants::{DCLAW_DESCRIPTION, GEOCLAW_DESCRIPTION, NODATA},
        dataset::{Attrs, Variable},
        error::{Error, Result},
        orient::{orient, Field},
    },
    ndarray::{Array2, Axis},
};

/// Name, units and description of an output variable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableInfo {
    pub name: &'static str,
    pub units: &'static str,
    pub long_name: &'static str,
}

const fn info(name: &'static str, units: &'static str, long_name: &'static str) -> VariableInfo {
    VariableInfo {
        name,
        units,
        long_name,
    }
}

pub const GEOCLAW_VARIABLES: [VariableInfo; 4] = [
    info("h", "meters", "Water depth"),
    info("hu", "meters squared per second", "Momentum in x direction"),
    info("hv", "meters squared per second", "Momentum in y direction"),
    info("eta", "meters", "Water surface elevation"),
];

pub const DCLAW_VARIABLES: [VariableInfo; 8] = [
    info("h", "meters", "Flow depth"),
    info("hu", "meters squared per second", "Momentum in x direction"),
    info("hv", "meters squared per second", "Momentum in y direction"),
    info("hm", "meters", "Depth times solid volume fraction"),
    info("pb", "newton per meter squared", "Basal pore pressure"),
    info("hchi", "meters", "Depth times species fraction"),
    info("delta_a", "meters", "Change in topography"),
    info("eta", "meters", "Flow surface elevation"),
];

pub const ARRIVAL_TIME: VariableInfo = info("arrival_time", "seconds", "Wave arrival time");
pub const H_MAX: VariableInfo = info("h_max", "meters", "Maximum water depth");
pub const ETA_MAX: VariableInfo = info("eta_max", "meters", "Maximum water surface elevation");
pub const H_MAX_TIME: VariableInfo = info("h_max_time", "seconds", "Time of maximum water depth");
pub const S_MAX: VariableInfo = info("s_max", "meters per second", "Maximum velocity");
pub const S_MAX_TIME: VariableInfo = info("s_max_time", "seconds", "Time of maximum velocity");
pub const HS_MAX: VariableInfo = info("hs_max", "meters squared per second", "Maximum momentum");
pub const HS_MAX_TIME: VariableInfo = info("hs_max_time", "seconds", "Time of maximum momentum");
pub const HSS_MAX: VariableInfo = info(
    "hss_max",
    "meters cubed per second squared",
    "Maximum momentum flux",
);
pub const HSS_MAX_TIME: VariableInfo = info(
    "hss_max_time",
    "seconds",
    "Time of maximum momentum flux",
);
pub const H_MIN: VariableInfo = info("h_min", "meters", "Minimum depth");
pub const H_MIN_TIME: VariableInfo = info("h_min_time", "seconds", "Time of minimum depth");

/// Variable layout of an fgout frame, determined by its channel count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameSchema {
    /// `h, hu, hv, eta`
    GeoClaw,
    /// `h, hu, hv, hm, pb, hchi, delta_a, eta`
    DClaw,
}

impl FrameSchema {
    pub fn from_channel_count(n: usize) -> Result<Self> {
        match n {
            4 => Ok(FrameSchema::GeoClaw),
            8 => Ok(FrameSchema::DClaw),
            _ => Err(Error::Schema(format!(
                "fgout frames must have 4 (GeoClaw) or 8 (D-Claw) variables, found {}",
                n
            ))),
        }
    }

    pub fn variables(self) -> &'static [VariableInfo] {
        match self {
            FrameSchema::GeoClaw => &GEOCLAW_VARIABLES,
            FrameSchema::DClaw => &DCLAW_VARIABLES,
        }
    }

    pub fn names(self) -> Vec<&'static str> {
        self.variables().iter().map(|v| v.name).collect()
    }

    pub fn description(self) -> &'static str {
        match self {
            FrameSchema::GeoClaw => GEOCLAW_DESCRIPTION,
            FrameSchema::DClaw => DCLAW_DESCRIPTION,
        }
    }
}

pub fn attrs(info: &VariableInfo) -> Attrs {
    let mut attrs = Attrs::new();
    attrs.insert("units".to_owned(), info.units.into());
    attrs.insert("_FillValue".to_owned(), NODATA.into());
    attrs.insert("long_name".to_owned(), info.long_name.into());
    attrs
}

/// Orients a solver field and wraps it as a labeled variable.
///
/// `dims` is either `[y, x]` or `[time, y, x]`, the latter gaining a leading
/// singleton axis.
pub fn prepare_var(
    field: &Field,
    mask: Option<&Array2<bool>>,
    dims: &[&str],
    info: &VariableInfo,
) -> Result<Variable> {
    let data = orient(field, mask, NODATA)?.into_data();

    let data = match dims.len() {
        2 => data.into_dyn(),
        3 => data.insert_axis(Axis(0)).into_dyn(),
        _ => {
            return Err(Error::Schema(format!(
                "cannot label {:?} with dimensions {:?}",
                info.name, dims
            )))
        }
    };

    Ok(Variable::new(dims, data, attrs(info)))
}
