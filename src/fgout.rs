//! Reader for fgout frames, snapshots of the solution interpolated onto a
//! fixed grid at a sequence of output times.
//!
//! A frame `fgout<NNNN>.<c><MMMM>` stores `num_vars` values per grid point,
//! x varying fastest, either as little-endian 32-bit floats (`b`) or as
//! whitespace-delimited text after a short header (`q`). The frame time is
//! kept in the companion file `fgout<NNNN>.t<MMMM>`.

use {
    crate::{
        constants::{REFERENCE_TIME, SPACE_UNIT, TIME_UNIT},
        dataset::{Attrs, Dataset, DatasetBuilder, Variable},
        error::{Error, Result},
        filename::FrameName,
        metadata::{load_fgout, Encoding, GridMetadata},
        orient::Field,
        parameters::ReaderOptions,
        utils::{fortran3d, parse_f64, parse_floats},
        variables::{prepare_var, FrameSchema},
    },
    byteorder::{ByteOrder, LittleEndian},
    log::{debug, trace},
    ndarray::{array, Array2, Array3, Axis},
    std::{
        collections::{BTreeMap, BTreeSet},
        fs,
        path::Path,
    },
};

/// One snapshot of an fgout grid
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub frame_id: u32,
    pub time: f64,
    /// Solution indexed `[var, ix, iy]`
    pub q: Array3<f64>,
}

impl Frame {
    pub fn num_vars(&self) -> usize {
        self.q.len_of(Axis(0))
    }

    pub fn channel(&self, i: usize) -> Array2<f64> {
        self.q.index_axis(Axis(0), i).to_owned()
    }
}

/// Splits `value  name` header lines from the data that follows them.
fn split_header(text: &str) -> (Vec<(&str, &str)>, Vec<&str>) {
    let mut header = vec![];
    let mut data = vec![];

    for line in text.lines() {
        let mut tokens = line.split_whitespace();
        match (tokens.next(), tokens.next(), tokens.next()) {
            (None, _, _) => {}
            (Some(value), Some(name), None)
                if data.is_empty() && parse_f64(name).is_none() =>
            {
                header.push((name, value))
            }
            _ => data.push(line),
        }
    }

    (header, data)
}

/// Reads the frame time and, when present, the number of variables from a `.t` file.
pub fn read_time(path: &Path) -> Result<(f64, Option<usize>)> {
    let text = fs::read_to_string(path).map_err(Error::io(path))?;
    let (header, _) = split_header(&text);

    let lookup = |key: &str| {
        header
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| *value)
    };

    let time = lookup("time")
        .and_then(parse_f64)
        .filter(|t| t.is_finite())
        .ok_or_else(|| Error::Format(format!("{} has no valid time", path.display())))?;

    let meqn = match lookup("meqn") {
        Some(v) => Some(v.parse().map_err(|_| {
            Error::Format(format!("{} has invalid meqn {:?}", path.display(), v))
        })?),
        None => None,
    };

    Ok((time, meqn))
}

fn read_binary(path: &Path) -> Result<Vec<f64>> {
    let bytes = fs::read(path).map_err(Error::io(path))?;

    if bytes.len() % 4 != 0 {
        return Err(Error::Format(format!(
            "{} has {} bytes, not a whole number of 32-bit values",
            path.display(),
            bytes.len()
        )));
    }

    Ok(bytes
        .chunks(4)
        .map(|b| f64::from(LittleEndian::read_f32(b)))
        .collect())
}

fn read_ascii(path: &Path, metadata: &GridMetadata) -> Result<Vec<f64>> {
    let text = fs::read_to_string(path).map_err(Error::io(path))?;
    let (header, data) = split_header(&text);

    for (key, expected) in &[("mx", metadata.geometry.nx), ("my", metadata.geometry.ny)] {
        if let Some((_, value)) = header.iter().find(|(name, _)| name == key) {
            if value.parse::<usize>().ok() != Some(*expected) {
                return Err(Error::Format(format!(
                    "{} has {} = {}, grid {} declares {}",
                    path.display(),
                    key,
                    value,
                    metadata.grid_id,
                    expected
                )));
            }
        }
    }

    let mut values = Vec::with_capacity(metadata.num_vars * data.len());
    for line in data {
        let row = parse_floats(line)?;
        if row.len() != metadata.num_vars {
            return Err(Error::Format(format!(
                "{}: expected {} values per point, found {} in {:?}",
                path.display(),
                metadata.num_vars,
                row.len(),
                line.trim()
            )));
        }
        values.extend(row);
    }

    Ok(values)
}

/// Reads frame `frame_id` of the grid described by `metadata` from `output_dir`.
pub fn read_frame(metadata: &GridMetadata, frame_id: u32, output_dir: &Path) -> Result<Frame> {
    let name = FrameName {
        grid_id: metadata.grid_id,
        frame_id,
        encoding: metadata.encoding,
    };

    let (time, meqn) = read_time(&output_dir.join(name.time_file_name()))?;
    if let Some(meqn) = meqn {
        if meqn != metadata.num_vars {
            return Err(Error::Format(format!(
                "frame {} has {} variables, grid {} declares {}",
                frame_id, meqn, metadata.grid_id, metadata.num_vars
            )));
        }
    }

    let path = output_dir.join(name.file_name());
    debug!("Reading fgout frame {} at t = {}", path.display(), time);

    let values = match metadata.encoding {
        Encoding::Binary32 => read_binary(&path)?,
        Encoding::Ascii => read_ascii(&path, metadata)?,
    };

    let q = fortran3d(
        values,
        metadata.num_vars,
        metadata.geometry.nx,
        metadata.geometry.ny,
    )
    .map_err(|e| Error::Format(format!("{}: {}", path.display(), e)))?;

    trace!("Frame {} has shape {:?}", frame_id, q.shape());

    Ok(Frame { frame_id, time, q })
}

/// Labels the channels of a frame, masking dry cells in every one of them.
pub fn assemble(
    frame: &Frame,
    dry_tolerance: f64,
    drop: &BTreeSet<&str>,
) -> Result<(FrameSchema, BTreeMap<String, Variable>)> {
    let schema = FrameSchema::from_channel_count(frame.num_vars())?;
    debug!("Frame {} uses the {:?} schema", frame.frame_id, schema);

    let dry = frame
        .q
        .index_axis(Axis(0), 0)
        .mapv(|h| h < dry_tolerance);

    let mut vars = BTreeMap::new();
    for (i, info) in schema.variables().iter().enumerate() {
        if drop.contains(info.name) {
            continue;
        }

        let field = Field::solver(info.name, frame.channel(i));
        let variable = prepare_var(&field, Some(&dry), &["time", "y", "x"], info)?;
        vars.insert(info.name.to_owned(), variable);
    }

    Ok((schema, vars))
}

pub fn build_dataset(
    metadata: &GridMetadata,
    frame: &Frame,
    schema: FrameSchema,
    vars: BTreeMap<String, Variable>,
) -> Result<Dataset> {
    let mut space = Attrs::new();
    space.insert("units".to_owned(), SPACE_UNIT.into());
    let mut time = Attrs::new();
    time.insert("units".to_owned(), TIME_UNIT.into());

    vars.into_iter()
        .fold(
            DatasetBuilder::new()
                .dim_coord("time", array![frame.time], time)
                .dim_coord("y", metadata.geometry.y_labels(), space.clone())
                .dim_coord("x", metadata.geometry.x.clone(), space)
                .text_coord("reference_time", REFERENCE_TIME),
            |builder, (name, variable)| builder.data_var(&name, variable),
        )
        .attr("description", schema.description())
        .build()
}

/// Opens an fgout frame file as a dataset with dimensions `time, y, x`.
///
/// Grid number, frame number and encoding are taken from the file name.
pub fn open_fgout(path: &Path, options: &ReaderOptions) -> Result<Dataset> {
    let name = FrameName::parse(path)?;

    let metadata = load_fgout(name.grid_id, &options.run_dir_for(path))?;
    if metadata.encoding != name.encoding {
        debug!(
            "Grid {} declares {:?} output, reading {:?} from the file name",
            name.grid_id, metadata.encoding, name.encoding
        );
    }
    let metadata = GridMetadata {
        encoding: name.encoding,
        ..metadata
    };

    let output_dir = path.parent().unwrap_or_else(|| Path::new(""));
    let frame = read_frame(&metadata, name.frame_id, output_dir)?;

    let (schema, vars) = assemble(&frame, options.dry_tolerance, &options.drop_set())?;
    let dataset = build_dataset(&metadata, &frame, schema, vars)?;

    match options.epsg {
        Some(epsg) => dataset.write_crs(epsg, "x", "y"),
        None => Ok(dataset),
    }
}
