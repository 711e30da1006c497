//! Grid-description files (`fgout_grids.data`, `fgmax_grids.data`) written by
//! the solver into the run directory.
//!
//! Each line holds one or more values followed by a name, separated by `=:`
//! (or `#` in older files). Grids are listed one after another, each block
//! starting at its `fgno` entry.

use {
    crate::{
        constants::{FGMAX_GRIDS_FILE, FGOUT_GRIDS_FILE},
        error::{Error, Result},
        fgmax::AccumulationSchema,
        utils::{linspace, parse_f64},
    },
    log::debug,
    ndarray::{s, Array1},
    std::{fs, path::Path},
};

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub values: Vec<String>,
    pub key: String,
}

/// Splits a data file into entries. Lines without a name are skipped.
pub fn parse_entries(text: &str) -> Vec<Entry> {
    text.lines()
        .filter_map(|line| {
            let (values, key) = match line.find("=:") {
                Some(i) => (&line[..i], &line[i + 2..]),
                None => {
                    let i = line.find('#')?;
                    (&line[..i], &line[i + 1..])
                }
            };

            let values = values
                .split_whitespace()
                .map(str::to_owned)
                .collect::<Vec<_>>();
            let key = key.split_whitespace().collect::<String>();

            if values.is_empty() || key.is_empty() {
                None
            } else {
                Some(Entry { values, key })
            }
        })
        .collect()
}

/// Entries describing a single grid
#[derive(Debug, Clone, PartialEq)]
pub struct GridBlock {
    pub grid_id: u32,
    entries: Vec<Entry>,
}

impl GridBlock {
    /// Finds the block whose `fgno` matches `grid_id`.
    pub fn find(entries: &[Entry], grid_id: u32) -> Option<GridBlock> {
        let start = entries.iter().position(|e| {
            e.key == "fgno" && e.values[0].parse::<u32>().ok() == Some(grid_id)
        })?;

        let entries = entries[start + 1..]
            .iter()
            .take_while(|e| e.key != "fgno")
            .cloned()
            .collect();

        Some(GridBlock { grid_id, entries })
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.values.as_slice())
    }

    fn require(&self, key: &str) -> Result<&[String]> {
        self.get(key).ok_or_else(|| {
            Error::Config(format!("grid {} is missing {:?}", self.grid_id, key))
        })
    }

    fn floats(&self, key: &str, n: usize) -> Result<Vec<f64>> {
        let values = self.require(key)?;
        if values.len() < n {
            return Err(Error::Config(format!(
                "grid {}: {:?} needs {} values, found {}",
                self.grid_id,
                key,
                n,
                values.len()
            )));
        }

        values[..n]
            .iter()
            .map(|v| {
                parse_f64(v).ok_or_else(|| {
                    Error::Config(format!("grid {}: invalid {:?} {:?}", self.grid_id, key, v))
                })
            })
            .collect()
    }

    fn optional_float(&self, key: &str) -> Result<Option<f64>> {
        match self.get(key) {
            Some(_) => Ok(Some(self.floats(key, 1)?[0])),
            None => Ok(None),
        }
    }

    fn integers(&self, key: &str, n: usize) -> Result<Vec<i64>> {
        self.floats(key, n)?
            .into_iter()
            .map(|v| {
                if v.fract() == 0.0 {
                    Ok(v as i64)
                } else {
                    Err(Error::Config(format!(
                        "grid {}: {:?} must be an integer, found {}",
                        self.grid_id, key, v
                    )))
                }
            })
            .collect()
    }

    pub fn point_style(&self) -> Result<PointStyle> {
        PointStyle::from_code(self.integers("point_style", 1)?[0])
    }
}

/// Layout of the points in a fixed grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointStyle {
    Scattered,
    Transect,
    UniformRegular,
    Quadrilateral,
    Patch,
}

impl PointStyle {
    pub fn from_code(code: i64) -> Result<Self> {
        Ok(match code {
            0 => PointStyle::Scattered,
            1 => PointStyle::Transect,
            2 => PointStyle::UniformRegular,
            3 => PointStyle::Quadrilateral,
            4 => PointStyle::Patch,
            _ => return Err(Error::Config(format!("unknown point_style {}", code))),
        })
    }

    pub fn code(self) -> i64 {
        match self {
            PointStyle::Scattered => 0,
            PointStyle::Transect => 1,
            PointStyle::UniformRegular => 2,
            PointStyle::Quadrilateral => 3,
            PointStyle::Patch => 4,
        }
    }
}

/// On-disk encoding of fgout frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Ascii,
    Binary32,
}

impl Encoding {
    /// Decodes the `output_format` entry of `fgout_grids.data`.
    pub fn from_output_format(value: &str) -> Result<Self> {
        match value.trim_matches(|c| c == '\'' || c == '"') {
            "1" | "ascii" => Ok(Encoding::Ascii),
            "3" | "binary32" => Ok(Encoding::Binary32),
            "2" | "binary64" | "binary" => Err(Error::Config(
                "64-bit binary fgout output is not supported".to_owned(),
            )),
            other => Err(Error::Config(format!("unknown output_format {:?}", other))),
        }
    }

    /// Decodes the type character of a frame file extension.
    pub fn from_type_code(c: char) -> Result<Self> {
        match c {
            'q' => Ok(Encoding::Ascii),
            'b' => Ok(Encoding::Binary32),
            _ => Err(Error::Format(format!(
                "invalid fgout output format {:?}, must be 'q' (ascii) or 'b' (binary)",
                c
            ))),
        }
    }

    pub fn type_code(self) -> char {
        match self {
            Encoding::Ascii => 'q',
            Encoding::Binary32 => 'b',
        }
    }
}

/// Extent and resolution of a uniform regular grid
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub nx: usize,
    pub ny: usize,
    /// Ascending x coordinates
    pub x: Array1<f64>,
    /// Ascending y coordinates
    pub y: Array1<f64>,
}

impl Geometry {
    pub fn new(lower: (f64, f64), upper: (f64, f64), nx: usize, ny: usize) -> Result<Self> {
        let (x1, y1) = lower;
        let (x2, y2) = upper;

        if nx == 0 || ny == 0 {
            return Err(Error::Config(format!(
                "grid must have at least one point per axis, found {}x{}",
                nx, ny
            )));
        }
        if nx.checked_mul(ny).is_none() {
            return Err(Error::Config(format!(
                "grid of {}x{} points is too large",
                nx, ny
            )));
        }
        if (nx > 1 && !(x2 > x1)) || (ny > 1 && !(y2 > y1)) {
            return Err(Error::Config(format!(
                "grid extent ({}, {}) to ({}, {}) is not ascending",
                x1, y1, x2, y2
            )));
        }

        Ok(Geometry {
            x1,
            y1,
            x2,
            y2,
            nx,
            ny,
            x: linspace(x1, x2, nx),
            y: linspace(y1, y2, ny),
        })
    }

    pub fn num_points(&self) -> usize {
        self.nx * self.ny
    }

    /// Row labels in display order, largest y first.
    pub fn y_labels(&self) -> Array1<f64> {
        self.y.slice(s![..;-1]).to_owned()
    }

    fn from_block(block: &GridBlock) -> Result<Self> {
        let point_style = block.point_style()?;
        if point_style != PointStyle::UniformRegular {
            return Err(Error::Config(format!(
                "grid {} has point_style={}, only point_style=2 (uniform regular) is supported",
                block.grid_id,
                point_style.code()
            )));
        }

        let n = block.integers("nx,ny", 2)?;
        if n.iter().any(|&n| n < 1) {
            return Err(Error::Config(format!(
                "grid {}: invalid nx,ny {:?}",
                block.grid_id, n
            )));
        }
        let lower = block.floats("x1,y1", 2)?;
        let upper = block.floats("x2,y2", 2)?;

        Geometry::new(
            (lower[0], lower[1]),
            (upper[0], upper[1]),
            n[0] as usize,
            n[1] as usize,
        )
    }
}

/// Description of one fgout grid
#[derive(Debug, Clone, PartialEq)]
pub struct GridMetadata {
    pub grid_id: u32,
    pub point_style: PointStyle,
    pub geometry: Geometry,
    /// Number of solution components written per point
    pub num_vars: usize,
    pub encoding: Encoding,
    pub tstart: Option<f64>,
    pub tend: Option<f64>,
    pub nout: Option<usize>,
}

/// Description of one fgmax grid
#[derive(Debug, Clone, PartialEq)]
pub struct FgmaxMetadata {
    pub grid_id: u32,
    pub point_style: PointStyle,
    pub geometry: Geometry,
    pub schema: AccumulationSchema,
    pub tstart_max: Option<f64>,
    pub tend_max: Option<f64>,
    pub dt_check: Option<f64>,
    pub min_level_check: Option<i64>,
    pub arrival_tol: Option<f64>,
}

fn read_entries(run_dir: &Path, name: &str) -> Result<Vec<Entry>> {
    let path = run_dir.join(name);
    debug!("Reading grid description {}", path.display());

    let text = fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("failed to read {}: {}", path.display(), e)))?;

    Ok(parse_entries(&text))
}

fn find_block(entries: &[Entry], grid_id: u32, name: &str) -> Result<GridBlock> {
    GridBlock::find(entries, grid_id)
        .ok_or_else(|| Error::Config(format!("grid {} not found in {}", grid_id, name)))
}

/// Loads the description of fgout grid `grid_id` from `run_dir`.
pub fn load_fgout(grid_id: u32, run_dir: &Path) -> Result<GridMetadata> {
    let entries = read_entries(run_dir, FGOUT_GRIDS_FILE)?;
    let block = find_block(&entries, grid_id, FGOUT_GRIDS_FILE)?;

    let geometry = Geometry::from_block(&block)?;

    let encoding = Encoding::from_output_format(&block.require("output_format")?[0])?;

    let num_vars = block.require("q_out_vars")?.len();

    let nout = match block.get("nout") {
        Some(_) => Some(block.integers("nout", 1)?[0].max(0) as usize),
        None => None,
    };

    let metadata = GridMetadata {
        grid_id,
        point_style: PointStyle::UniformRegular,
        geometry,
        num_vars,
        encoding,
        tstart: block.optional_float("tstart")?,
        tend: block.optional_float("tend")?,
        nout,
    };

    debug!(
        "fgout grid {}: {}x{} points, {} variables, {:?}",
        grid_id, metadata.geometry.nx, metadata.geometry.ny, num_vars, encoding
    );

    Ok(metadata)
}

/// Loads the description of fgmax grid `grid_id` from `run_dir`.
pub fn load_fgmax(grid_id: u32, run_dir: &Path) -> Result<FgmaxMetadata> {
    let entries = read_entries(run_dir, FGMAX_GRIDS_FILE)?;

    let num_fgmax_val = entries
        .iter()
        .find(|e| e.key == "num_fgmax_val")
        .and_then(|e| e.values[0].parse::<usize>().ok())
        .ok_or_else(|| {
            Error::Config(format!("{} is missing num_fgmax_val", FGMAX_GRIDS_FILE))
        })?;

    let block = find_block(&entries, grid_id, FGMAX_GRIDS_FILE)?;
    let geometry = Geometry::from_block(&block)?;
    let schema = AccumulationSchema::from_num_values(num_fgmax_val)?;

    debug!(
        "fgmax grid {}: {}x{} points, {:?}",
        grid_id, geometry.nx, geometry.ny, schema
    );

    Ok(FgmaxMetadata {
        grid_id,
        point_style: PointStyle::UniformRegular,
        geometry,
        schema,
        tstart_max: block.optional_float("tstart_max")?,
        tend_max: block.optional_float("tend_max")?,
        dt_check: block.optional_float("dt_check")?,
        min_level_check: match block.get("min_level_check") {
            Some(_) => Some(block.integers("min_level_check", 1)?[0]),
            None => None,
        },
        arrival_tol: block.optional_float("arrival_tol")?,
    })
}

#[cfg(test)]
mod test {
    use {super::*, std::fs::write, tempdir::TempDir};

    const FGOUT_GRIDS: &str = "
# fgout grid data, setrun.py
2                    =: num_fgout_grids

1                    =: fgno
0.0                  =: tstart
3600.0               =: tend
61                   =: nout
2                    =: point_style
3                    =: output_format
1 2 3 4              =: q_out_vars
3 3                  =: nx, ny
0.0 0.0              =: x1, y1
2.0 2.0              =: x2, y2

2                    =: fgno
2                    =: point_style
1                    =: output_format
1 2 3 4 5 6 7 8      =: q_out_vars
5 4                  =: nx, ny
-120.0 45.0          =: x1, y1
-119.0 45.75         =: x2, y2
";

    fn run_dir(name: &str, contents: &str) -> TempDir {
        let dir = TempDir::new("fixed-grid").unwrap();
        write(dir.path().join(name), contents).unwrap();
        dir
    }

    #[test]
    fn entries() {
        let entries = parse_entries("1 2 =: nx, ny\n\n# comment only\n3.5D0   # x1\n");
        assert_eq!(
            entries,
            vec![
                Entry {
                    values: vec!["1".into(), "2".into()],
                    key: "nx,ny".into()
                },
                Entry {
                    values: vec!["3.5D0".into()],
                    key: "x1".into()
                },
            ]
        );
    }

    #[test]
    fn fgout_grid() {
        let dir = run_dir(FGOUT_GRIDS_FILE, FGOUT_GRIDS);

        let metadata = load_fgout(1, dir.path()).unwrap();
        assert_eq!(metadata.num_vars, 4);
        assert_eq!(metadata.encoding, Encoding::Binary32);
        assert_eq!(metadata.point_style, PointStyle::UniformRegular);
        assert_eq!(metadata.geometry.x.to_vec(), vec![0.0, 1.0, 2.0]);
        assert_eq!(metadata.geometry.y.to_vec(), vec![0.0, 1.0, 2.0]);
        assert_eq!(metadata.nout, Some(61));
        assert_eq!(metadata.tend, Some(3600.0));

        let metadata = load_fgout(2, dir.path()).unwrap();
        assert_eq!(metadata.num_vars, 8);
        assert_eq!(metadata.encoding, Encoding::Ascii);
        assert_eq!((metadata.geometry.nx, metadata.geometry.ny), (5, 4));
        assert_eq!(metadata.tstart, None);

        let y = metadata.geometry.y.to_vec();
        assert!(y.windows(2).all(|w| w[0] < w[1]));
        approx::assert_abs_diff_eq!(y[1], 45.25, epsilon = 1.0E-12);
    }

    #[test]
    fn missing_grid() {
        let dir = run_dir(FGOUT_GRIDS_FILE, FGOUT_GRIDS);
        assert!(matches!(load_fgout(3, dir.path()), Err(Error::Config(_))));
    }

    #[test]
    fn missing_file() {
        let dir = TempDir::new("fixed-grid").unwrap();
        assert!(matches!(load_fgout(1, dir.path()), Err(Error::Config(_))));
        assert!(matches!(load_fgmax(1, dir.path()), Err(Error::Config(_))));
    }

    #[test]
    fn unsupported_point_style() {
        let dir = run_dir(
            FGOUT_GRIDS_FILE,
            &FGOUT_GRIDS.replacen("2                    =: point_style", "1 =: point_style", 1),
        );

        let block = GridBlock::find(
            &parse_entries(&fs::read_to_string(dir.path().join(FGOUT_GRIDS_FILE)).unwrap()),
            1,
        )
        .unwrap();
        assert_eq!(block.point_style().unwrap(), PointStyle::Transect);

        match load_fgout(1, dir.path()) {
            Err(Error::Config(msg)) => assert!(msg.contains("point_style=1")),
            other => panic!("expected config error, got {:?}", other),
        }
        assert!(load_fgout(2, dir.path()).is_ok());
    }

    #[test]
    fn unsupported_binary64() {
        let dir = run_dir(
            FGOUT_GRIDS_FILE,
            &FGOUT_GRIDS.replacen("3                    =: output_format", "2 =: output_format", 1),
        );
        assert!(matches!(load_fgout(1, dir.path()), Err(Error::Config(_))));
    }

    #[test]
    fn oversized_grid() {
        assert!(matches!(
            Geometry::new((0.0, 0.0), (1.0, 1.0), std::usize::MAX, 2),
            Err(Error::Config(_))
        ));
        assert_eq!(
            Geometry::new((0.0, 0.0), (2.0, 1.0), 3, 2)
                .unwrap()
                .num_points(),
            6
        );
    }

    #[test]
    fn descending_extent() {
        let dir = run_dir(
            FGOUT_GRIDS_FILE,
            &FGOUT_GRIDS.replacen("2.0 2.0              =: x2, y2", "2.0 -1.0 =: x2, y2", 1),
        );
        assert!(matches!(load_fgout(1, dir.path()), Err(Error::Config(_))));
    }

    #[test]
    fn fgmax_grid() {
        let dir = run_dir(
            FGMAX_GRIDS_FILE,
            "
5                    =: num_fgmax_val
1                    =: num_fgmax_grids

1                    =: fgno
10.0                 =: tstart_max
1.0e10               =: tend_max
60.0                 =: dt_check
3                    =: min_level_check
0.01                 =: arrival_tol
0                    =: interp_method
2                    =: point_style
4 2                  =: nx,ny
0.0 10.0             =: x1,y1
3.0 11.0             =: x2,y2
",
        );

        let metadata = load_fgmax(1, dir.path()).unwrap();
        assert_eq!(metadata.schema, AccumulationSchema::WithMomentum);
        assert_eq!(metadata.geometry.x.to_vec(), vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(metadata.geometry.y.to_vec(), vec![10.0, 11.0]);
        assert_eq!(metadata.arrival_tol, Some(0.01));
        assert_eq!(metadata.dt_check, Some(60.0));
        assert_eq!(metadata.min_level_check, Some(3));
    }

    #[test]
    fn fgmax_unknown_num_values() {
        let dir = run_dir(
            FGMAX_GRIDS_FILE,
            "3 =: num_fgmax_val\n1 =: fgno\n2 =: point_style\n2 2 =: nx,ny\n0 0 =: x1,y1\n1 1 =: x2,y2\n",
        );
        assert!(matches!(load_fgmax(1, dir.path()), Err(Error::Schema(_))));
    }
}
