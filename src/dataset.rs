//! Self-describing labeled array container.
//!
//! A `Dataset` holds named dimensions, coordinate variables, data variables
//! and global attributes, in the shape expected by array interchange formats.

use {
    crate::{
        constants::SPATIAL_REF,
        error::{Error, Result},
    },
    log::debug,
    ndarray::{Array1, ArrayD, IxDyn},
    serde::{Deserialize, Serialize},
    std::{
        collections::BTreeMap,
        fmt,
        fs::File,
        io::{BufReader, BufWriter},
        path::Path,
    },
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Int(v) => write!(f, "{}", v),
            AttrValue::Float(v) => write!(f, "{}", v),
            AttrValue::Str(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Str(v.to_owned())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        AttrValue::Str(v)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Float(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Int(v)
    }
}

pub type Attrs = BTreeMap<String, AttrValue>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Values {
    Float(ArrayD<f64>),
    Text(String),
}

impl Values {
    pub fn shape(&self) -> &[usize] {
        match self {
            Values::Float(a) => a.shape(),
            Values::Text(_) => &[],
        }
    }

    pub fn as_float(&self) -> Option<&ArrayD<f64>> {
        match self {
            Values::Float(a) => Some(a),
            Values::Text(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub dims: Vec<String>,
    pub values: Values,
    pub attrs: Attrs,
}

impl Variable {
    pub fn new(dims: &[&str], data: ArrayD<f64>, attrs: Attrs) -> Self {
        Variable {
            dims: dims.iter().map(|d| (*d).to_owned()).collect(),
            values: Values::Float(data),
            attrs,
        }
    }

    pub fn data(&self) -> Option<&ArrayD<f64>> {
        self.values.as_float()
    }
}

/// Coordinate reference system bound to two spatial dimensions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crs {
    pub epsg: u32,
    pub x_dim: String,
    pub y_dim: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Dimension names and lengths, in order
    pub dims: Vec<(String, usize)>,
    pub coords: BTreeMap<String, Variable>,
    pub data_vars: BTreeMap<String, Variable>,
    pub attrs: Attrs,
    pub crs: Option<Crs>,
}

#[derive(Debug, Default)]
pub struct DatasetBuilder {
    dims: Vec<(String, usize)>,
    coords: BTreeMap<String, Variable>,
    data_vars: BTreeMap<String, Variable>,
    attrs: Attrs,
}

impl DatasetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a dimension coordinate, defining the dimension of the same name.
    pub fn dim_coord(mut self, name: &str, values: Array1<f64>, attrs: Attrs) -> Self {
        self.dims.push((name.to_owned(), values.len()));
        self.coords.insert(
            name.to_owned(),
            Variable {
                dims: vec![name.to_owned()],
                values: Values::Float(values.into_dyn()),
                attrs,
            },
        );
        self
    }

    /// Adds a dimensionless text coordinate.
    pub fn text_coord(mut self, name: &str, value: &str) -> Self {
        self.coords.insert(
            name.to_owned(),
            Variable {
                dims: vec![],
                values: Values::Text(value.to_owned()),
                attrs: Attrs::new(),
            },
        );
        self
    }

    pub fn data_var(mut self, name: &str, variable: Variable) -> Self {
        self.data_vars.insert(name.to_owned(), variable);
        self
    }

    pub fn attr<V: Into<AttrValue>>(mut self, name: &str, value: V) -> Self {
        self.attrs.insert(name.to_owned(), value.into());
        self
    }

    /// Checks every variable against the declared dimensions.
    pub fn build(self) -> Result<Dataset> {
        let dataset = Dataset {
            dims: self.dims,
            coords: self.coords,
            data_vars: self.data_vars,
            attrs: self.attrs,
            crs: None,
        };

        for (name, variable) in dataset.coords.iter().chain(dataset.data_vars.iter()) {
            let expected = variable
                .dims
                .iter()
                .map(|d| {
                    dataset.dim_len(d).ok_or_else(|| {
                        Error::Schema(format!("variable {:?} uses unknown dimension {:?}", name, d))
                    })
                })
                .collect::<Result<Vec<usize>>>()?;

            if variable.values.shape() != expected.as_slice() {
                return Err(Error::Schema(format!(
                    "variable {:?} has shape {:?}, dimensions {:?} require {:?}",
                    name,
                    variable.values.shape(),
                    variable.dims,
                    expected
                )));
            }
        }

        debug!(
            "Built dataset with dimensions {:?} and variables {:?}",
            dataset.dims,
            dataset.data_vars.keys().collect::<Vec<_>>()
        );

        Ok(dataset)
    }
}

/// Overview of a dataset without its data
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub dims: BTreeMap<String, usize>,
    pub coords: BTreeMap<String, VariableSummary>,
    pub data_vars: BTreeMap<String, VariableSummary>,
    pub attrs: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableSummary {
    pub dims: Vec<String>,
    pub attrs: BTreeMap<String, String>,
}

fn summarize_attrs(attrs: &Attrs) -> BTreeMap<String, String> {
    attrs
        .iter()
        .map(|(k, v)| (k.clone(), v.to_string()))
        .collect()
}

fn summarize_vars(vars: &BTreeMap<String, Variable>) -> BTreeMap<String, VariableSummary> {
    vars.iter()
        .map(|(name, v)| {
            (
                name.clone(),
                VariableSummary {
                    dims: v.dims.clone(),
                    attrs: summarize_attrs(&v.attrs),
                },
            )
        })
        .collect()
}

impl Dataset {
    pub fn dim_len(&self, name: &str) -> Option<usize> {
        self.dims.iter().find(|(d, _)| d == name).map(|(_, n)| *n)
    }

    pub fn coord(&self, name: &str) -> Option<&ArrayD<f64>> {
        self.coords.get(name).and_then(Variable::data)
    }

    pub fn data_var(&self, name: &str) -> Option<&ArrayD<f64>> {
        self.data_vars.get(name).and_then(Variable::data)
    }

    /// Tags the dataset with an EPSG coordinate reference system bound to the
    /// given spatial dimensions, returning the tagged copy.
    pub fn write_crs(&self, epsg: u32, x_dim: &str, y_dim: &str) -> Result<Dataset> {
        if epsg == 0 {
            return Err(Error::GeoTag("EPSG code must be positive".to_owned()));
        }
        for dim in &[x_dim, y_dim] {
            if self.dim_len(dim).is_none() {
                return Err(Error::GeoTag(format!(
                    "dataset has no spatial dimension {:?}, found {:?}",
                    dim,
                    self.dims.iter().map(|(d, _)| d).collect::<Vec<_>>()
                )));
            }
        }
        if x_dim == y_dim {
            return Err(Error::GeoTag(format!(
                "x and y must be distinct dimensions, both are {:?}",
                x_dim
            )));
        }

        let mut tagged = self.clone();

        let mut attrs = Attrs::new();
        attrs.insert("crs".to_owned(), format!("EPSG:{}", epsg).into());
        attrs.insert("epsg".to_owned(), AttrValue::Int(i64::from(epsg)));
        if let Some(transform) = self.geo_transform(x_dim, y_dim) {
            attrs.insert("GeoTransform".to_owned(), transform.into());
        }
        tagged.coords.insert(
            SPATIAL_REF.to_owned(),
            Variable {
                dims: vec![],
                values: Values::Float(ArrayD::zeros(IxDyn(&[]))),
                attrs,
            },
        );

        for (dim, axis) in &[(x_dim, "X"), (y_dim, "Y")] {
            if let Some(coord) = tagged.coords.get_mut(*dim) {
                coord.attrs.insert("axis".to_owned(), (*axis).into());
                coord.attrs.insert(
                    "standard_name".to_owned(),
                    format!("projection_{}_coordinate", axis.to_lowercase()).into(),
                );
            }
        }

        for variable in tagged.data_vars.values_mut() {
            if variable.dims.iter().any(|d| d == x_dim)
                && variable.dims.iter().any(|d| d == y_dim)
            {
                variable
                    .attrs
                    .insert("grid_mapping".to_owned(), SPATIAL_REF.into());
            }
        }

        tagged.crs = Some(Crs {
            epsg,
            x_dim: x_dim.to_owned(),
            y_dim: y_dim.to_owned(),
        });

        Ok(tagged)
    }

    /// GDAL style affine transform derived from the spatial coordinates.
    fn geo_transform(&self, x_dim: &str, y_dim: &str) -> Option<String> {
        let x = self.coord(x_dim)?;
        let y = self.coord(y_dim)?;
        if x.len() < 2 || y.len() < 2 {
            return None;
        }

        let dx = x[[1]] - x[[0]];
        let dy = y[[1]] - y[[0]];

        Some(format!(
            "{} {} 0 {} 0 {}",
            x[[0]] - dx / 2.0,
            dx,
            y[[0]] - dy / 2.0,
            dy
        ))
    }

    pub fn summary(&self) -> Summary {
        Summary {
            dims: self.dims.iter().cloned().collect(),
            coords: summarize_vars(&self.coords),
            data_vars: summarize_vars(&self.data_vars),
            attrs: summarize_attrs(&self.attrs),
        }
    }

    pub fn write_bincode<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(Error::io(path))?;
        bincode::serialize_into(BufWriter::new(file), self)?;
        Ok(())
    }

    pub fn read_bincode<P: AsRef<Path>>(path: P) -> Result<Dataset> {
        let path = path.as_ref();
        let file = File::open(path).map_err(Error::io(path))?;
        Ok(bincode::deserialize_from(BufReader::new(file))?)
    }
}
