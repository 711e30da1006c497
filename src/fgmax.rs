//! Reader for fgmax output, the running extremes recorded on a fixed grid
//! over a whole simulation.
//!
//! `fgmax<NNNN>.txt` holds one row per grid point, x varying fastest, with
//! columns `x y level v_1..v_mv B t_1..t_mv arrival_time`. The `mv` tracked
//! values are `h, s, hs, hss, -hmin` truncated to 1, 2 or 5 entries.

use {
    crate::{
        constants::{FGMAX_DESCRIPTION, FGMAX_NOTSET, SPACE_UNIT},
        dataset::{Attrs, Dataset, DatasetBuilder, Variable},
        error::{Error, Result},
        filename,
        metadata::{load_fgmax, FgmaxMetadata},
        orient::Field,
        parameters::ReaderOptions,
        utils::{fortran2d, parse_floats},
        variables::*,
    },
    log::debug,
    ndarray::Array2,
    std::{
        collections::{BTreeMap, BTreeSet},
        fs,
        path::Path,
    },
};

/// Which extremes a run was configured to track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccumulationSchema {
    /// Depth only
    Basic,
    /// Depth and speed
    WithSpeed,
    /// Depth, speed, momentum, momentum flux and minimum depth
    WithMomentum,
}

impl AccumulationSchema {
    pub fn from_num_values(n: usize) -> Result<Self> {
        match n {
            1 => Ok(AccumulationSchema::Basic),
            2 => Ok(AccumulationSchema::WithSpeed),
            5 => Ok(AccumulationSchema::WithMomentum),
            _ => Err(Error::Schema(format!(
                "num_fgmax_val must be 1, 2 or 5, found {}",
                n
            ))),
        }
    }

    pub fn num_values(self) -> usize {
        match self {
            AccumulationSchema::Basic => 1,
            AccumulationSchema::WithSpeed => 2,
            AccumulationSchema::WithMomentum => 5,
        }
    }

    /// Columns per row of the output file.
    pub fn num_columns(self) -> usize {
        2 * self.num_values() + 5
    }
}

/// Field indexed `[ix, iy]` with its own validity mask
#[derive(Debug, Clone, PartialEq)]
pub struct MaskedField {
    pub data: Array2<f64>,
    /// True where the value is undefined
    pub mask: Array2<bool>,
}

impl MaskedField {
    fn new(data: Array2<f64>, unset: &Array2<bool>) -> Self {
        let mask = &data.mapv(|v| v < FGMAX_NOTSET) | unset;
        MaskedField { data, mask }
    }

    fn field(&self, name: &str) -> Field {
        Field::solver(name, self.data.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Speed {
    pub s: MaskedField,
    pub s_time: MaskedField,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Momentum {
    pub hs: MaskedField,
    pub hs_time: MaskedField,
    pub hss: MaskedField,
    pub hss_time: MaskedField,
    pub h_min: MaskedField,
    pub h_min_time: MaskedField,
}

/// Optional extremes, present according to the run's schema
#[derive(Debug, Clone, PartialEq)]
pub enum Extremes {
    Basic,
    WithSpeed(Speed),
    WithMomentum(Speed, Momentum),
}

impl Extremes {
    pub fn schema(&self) -> AccumulationSchema {
        match self {
            Extremes::Basic => AccumulationSchema::Basic,
            Extremes::WithSpeed(_) => AccumulationSchema::WithSpeed,
            Extremes::WithMomentum(..) => AccumulationSchema::WithMomentum,
        }
    }

    pub fn speed(&self) -> Option<&Speed> {
        match self {
            Extremes::Basic => None,
            Extremes::WithSpeed(speed) | Extremes::WithMomentum(speed, _) => Some(speed),
        }
    }

    pub fn momentum(&self) -> Option<&Momentum> {
        match self {
            Extremes::WithMomentum(_, momentum) => Some(momentum),
            _ => None,
        }
    }
}

/// Contents of one fgmax output file
#[derive(Debug, Clone, PartialEq)]
pub struct FgmaxRecord {
    /// AMR level each point was last monitored on, 0 if never
    pub level: Array2<i64>,
    /// Topography
    pub b: MaskedField,
    pub h: MaskedField,
    pub h_time: MaskedField,
    pub arrival_time: MaskedField,
    pub extremes: Extremes,
}

pub fn output_file_name(grid_id: u32) -> String {
    format!("fgmax{:04}.txt", grid_id)
}

/// Reads `fgmax<NNNN>.txt` for the grid described by `metadata` from `output_dir`.
pub fn read_output(metadata: &FgmaxMetadata, output_dir: &Path) -> Result<FgmaxRecord> {
    read_output_file(metadata, &output_dir.join(output_file_name(metadata.grid_id)))
}

pub fn read_output_file(metadata: &FgmaxMetadata, path: &Path) -> Result<FgmaxRecord> {
    debug!("Reading fgmax output {}", path.display());
    let text = fs::read_to_string(path).map_err(Error::io(path))?;
    parse_output(metadata, &text)
}

pub fn parse_output(metadata: &FgmaxMetadata, text: &str) -> Result<FgmaxRecord> {
    let (nx, ny) = (metadata.geometry.nx, metadata.geometry.ny);
    let schema = metadata.schema;
    let mv = schema.num_values();
    let ncols = schema.num_columns();

    let rows = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(parse_floats)
        .collect::<Result<Vec<_>>>()?;

    if rows.len() != metadata.geometry.num_points() {
        return Err(Error::Format(format!(
            "fgmax grid {} has {}x{} points, file has {} rows",
            metadata.grid_id,
            nx,
            ny,
            rows.len()
        )));
    }

    if let Some(row) = rows.iter().find(|row| row.len() != ncols) {
        return Err(Error::Schema(format!(
            "fgmax grid {} tracks {} values and needs {} columns, found a row with {}",
            metadata.grid_id,
            mv,
            ncols,
            row.len()
        )));
    }

    let column = |i: usize| fortran2d(rows.iter().map(|row| row[i]).collect(), nx, ny);

    let level = column(2)?.mapv(|v| v as i64);
    let unset = level.mapv(|l| l == 0);

    let value = |k: usize| -> Result<MaskedField> { Ok(MaskedField::new(column(3 + k)?, &unset)) };
    let time = |k: usize| -> Result<MaskedField> {
        Ok(MaskedField::new(column(4 + mv + k)?, &unset))
    };

    let b = MaskedField {
        data: column(3 + mv)?,
        mask: unset.clone(),
    };

    let speed = || -> Result<Speed> {
        Ok(Speed {
            s: value(1)?,
            s_time: time(1)?,
        })
    };

    let extremes = match schema {
        AccumulationSchema::Basic => Extremes::Basic,
        AccumulationSchema::WithSpeed => Extremes::WithSpeed(speed()?),
        AccumulationSchema::WithMomentum => {
            // Minimum depth is tracked as the maximum of -h
            let mut h_min = value(4)?;
            h_min.data.mapv_inplace(|v| -v);

            Extremes::WithMomentum(
                speed()?,
                Momentum {
                    hs: value(2)?,
                    hs_time: time(2)?,
                    hss: value(3)?,
                    hss_time: time(3)?,
                    h_min,
                    h_min_time: time(4)?,
                },
            )
        }
    };

    Ok(FgmaxRecord {
        h: value(0)?,
        h_time: time(0)?,
        arrival_time: MaskedField::new(column(ncols - 1)?, &unset),
        level,
        b,
        extremes,
    })
}

/// Labels every field of a record, skipping names in `drop`.
pub fn assemble(record: &FgmaxRecord, drop: &BTreeSet<&str>) -> Result<BTreeMap<String, Variable>> {
    let dims = ["y", "x"];

    let mut fields: Vec<(VariableInfo, &MaskedField)> = vec![
        (ARRIVAL_TIME, &record.arrival_time),
        (H_MAX, &record.h),
        (H_MAX_TIME, &record.h_time),
    ];
    if let Some(speed) = record.extremes.speed() {
        fields.push((S_MAX, &speed.s));
        fields.push((S_MAX_TIME, &speed.s_time));
    }
    if let Some(momentum) = record.extremes.momentum() {
        fields.push((HS_MAX, &momentum.hs));
        fields.push((HS_MAX_TIME, &momentum.hs_time));
        fields.push((HSS_MAX, &momentum.hss));
        fields.push((HSS_MAX_TIME, &momentum.hss_time));
        fields.push((H_MIN, &momentum.h_min));
        fields.push((H_MIN_TIME, &momentum.h_min_time));
    }

    let mut vars = BTreeMap::new();

    for (info, masked) in fields {
        if drop.contains(info.name) {
            continue;
        }
        let variable = prepare_var(&masked.field(info.name), Some(&masked.mask), &dims, &info)?;
        vars.insert(info.name.to_owned(), variable);
    }

    if !drop.contains(ETA_MAX.name) {
        // Raw sum, masked by depth only
        let eta = Field::solver(ETA_MAX.name, &record.h.data + &record.b.data);
        let variable = prepare_var(&eta, Some(&record.h.mask), &dims, &ETA_MAX)?;
        vars.insert(ETA_MAX.name.to_owned(), variable);
    }

    debug!(
        "Assembled {:?} fgmax variables {:?}",
        record.extremes.schema(),
        vars.keys().collect::<Vec<_>>()
    );

    Ok(vars)
}

pub fn build_dataset(metadata: &FgmaxMetadata, vars: BTreeMap<String, Variable>) -> Result<Dataset> {
    let mut space = Attrs::new();
    space.insert("units".to_owned(), SPACE_UNIT.into());

    vars.into_iter()
        .fold(
            DatasetBuilder::new()
                .dim_coord("y", metadata.geometry.y_labels(), space.clone())
                .dim_coord("x", metadata.geometry.x.clone(), space),
            |builder, (name, variable)| builder.data_var(&name, variable),
        )
        .attr("description", FGMAX_DESCRIPTION)
        .build()
}

/// Opens an fgmax output file as a dataset with dimensions `y, x`.
pub fn open_fgmax(path: &Path, options: &ReaderOptions) -> Result<Dataset> {
    let grid_id = filename::grid_id(path)?;
    let expected = output_file_name(grid_id);
    if path.file_name().and_then(|n| n.to_str()) != Some(expected.as_str()) {
        return Err(Error::Format(format!(
            "{} is not an fgmax output file, expected {}",
            path.display(),
            expected
        )));
    }

    let metadata = load_fgmax(grid_id, &options.run_dir_for(path))?;

    let output_dir = path.parent().unwrap_or_else(|| Path::new(""));
    let record = read_output(&metadata, output_dir)?;
    let vars = assemble(&record, &options.drop_set())?;
    let dataset = build_dataset(&metadata, vars)?;

    match options.epsg {
        Some(epsg) => dataset.write_crs(epsg, "x", "y"),
        None => Ok(dataset),
    }
}
