use {
    crate::{
        constants::DRY_TOLERANCE,
        error::{Error, Result},
    },
    serde::Deserialize,
    std::{collections::BTreeSet, fs::File, path::Path, path::PathBuf},
};

/// Options controlling how a fixed grid file is turned into a dataset
#[derive(Debug, PartialEq, Clone, Deserialize)]
#[serde(default)]
pub struct ReaderOptions {
    /// Directory holding the grid-description files, defaults to the directory of the opened file
    pub run_dir: Option<PathBuf>,
    /// EPSG code to tag the dataset with
    pub epsg: Option<u32>,
    /// Variables omitted from the dataset
    pub drop_variables: Vec<String>,
    /// Depth below which a cell is treated as dry
    pub dry_tolerance: f64,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        ReaderOptions {
            run_dir: None,
            epsg: None,
            drop_variables: vec![],
            dry_tolerance: DRY_TOLERANCE,
        }
    }
}

impl ReaderOptions {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(Error::io(path))?;

        serde_yaml::from_reader(file)
            .map_err(|e| Error::Config(format!("failed to parse {}: {}", path.display(), e)))
    }

    /// Resolves the run directory for a data file.
    pub fn run_dir_for(&self, data_file: &Path) -> PathBuf {
        match &self.run_dir {
            Some(dir) => dir.clone(),
            None => data_file
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
        }
    }

    pub fn drop_set(&self) -> BTreeSet<&str> {
        self.drop_variables.iter().map(String::as_str).collect()
    }
}
