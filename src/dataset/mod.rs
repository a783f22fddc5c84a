//! Generic self-describing array datasets
//!
//! # Overview
//!
//! Grid files in most conventions are netCDF datasets: a set of named
//! dimensions, typed variables shaped over those dimensions, and attributes
//! attached to either a variable or the dataset itself.
//!
//! The [Dataset] type holds exactly that, without any knowledge of grid
//! conventions. Detection only ever asks whether a marker variable exists, and
//! the format populators pull coordinate and connectivity arrays out by name.
//!
//! The on-disk form is the CDL text notation produced by `ncdump`, which is
//! read through [read_dataset](crate::readers::read_dataset) and written with
//! [Dataset::write].
//!
//! ```rust
//! # use uxgrid::dataset::Dataset;
//! let cdl = r#"
//! netcdf demo {
//! dimensions:
//!     n = 3 ;
//! variables:
//!     double x(n) ;
//!         x:units = "degrees_east" ;
//! data:
//!  x = 0, 1.5, 3 ;
//! }"#;
//!
//! let dataset = Dataset::from_cdl(cdl).unwrap();
//! assert!(dataset.has_variable("x"));
//! assert_eq!(dataset.doubles("x").unwrap(), vec![0.0, 1.5, 3.0]);
//! ```

mod values;

// standard library
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

// internal modules
use crate::error::{DatasetError, GridError};
use crate::utils::f;

// external crates
use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};

#[doc(inline)]
pub use crate::dataset::values::{DataType, Values};

/// Named dimension of a dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    /// Dimension name, e.g. `nMesh2_node`
    pub name: String,
    /// Current length
    pub len: usize,
    /// Length is defined by the data rather than the declaration
    pub unlimited: bool,
}

impl Dimension {
    /// Fixed-length dimension
    pub fn new(name: &str, len: usize) -> Self {
        Self {
            name: name.to_string(),
            len,
            unlimited: false,
        }
    }
}

/// Named attribute on a variable or on the dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub value: Values,
}

/// Typed variable shaped over zero or more dimensions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    /// Variable name, e.g. `grid_center_lon`
    pub name: String,
    /// Declared type
    pub dtype: DataType,
    /// Names of the dimensions, outermost first
    pub dims: Vec<String>,
    /// Attached attributes in declaration order
    pub attributes: Vec<Attribute>,
    /// Flattened data in row-major order
    pub data: Values,
}

impl Variable {
    /// New variable with no attributes
    pub fn new(name: &str, dtype: DataType, dims: &[&str], data: Values) -> Self {
        Self {
            name: name.to_string(),
            dtype,
            dims: dims.iter().map(|d| d.to_string()).collect(),
            attributes: Vec::new(),
            data,
        }
    }

    /// Builder-style attribute setter
    pub fn with_attribute(mut self, name: &str, value: Values) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Add or replace an attribute
    pub fn set_attribute(&mut self, name: &str, value: Values) {
        set_attribute(&mut self.attributes, name, value)
    }

    /// Look up an attribute by name
    pub fn attribute(&self, name: &str) -> Option<&Values> {
        find_attribute(&self.attributes, name)
    }

    /// Attribute value if it is text
    pub fn text_attribute(&self, name: &str) -> Option<&str> {
        self.attribute(name).and_then(Values::as_text)
    }

    /// First value of a numeric attribute as an integer
    pub fn int_attribute(&self, name: &str) -> Option<i64> {
        match self.attribute(name)? {
            Values::Integer(v) => v.first().copied(),
            Values::Double(v) => v.first().map(|x| *x as i64),
            Values::Text(_) => None,
        }
    }

    /// The value used to mark missing data
    ///
    /// Taken from `_FillValue` if present, otherwise the netCDF default for
    /// the declared type.
    pub fn fill_value(&self) -> f64 {
        match self.attribute("_FillValue") {
            Some(Values::Integer(v)) if !v.is_empty() => v[0] as f64,
            Some(Values::Double(v)) if !v.is_empty() => v[0],
            _ => self.dtype.default_fill(),
        }
    }
}

/// Representation of a whole dataset
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Dataset {
    /// Name given after the `netcdf` keyword
    pub name: String,
    /// Declared dimensions
    pub dimensions: Vec<Dimension>,
    /// Declared variables
    pub variables: Vec<Variable>,
    /// Global attributes
    pub attributes: Vec<Attribute>,
}

/// Lookups and accessors
impl Dataset {
    /// Empty dataset with the given name
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Parse a dataset from CDL text
    pub fn from_cdl(text: &str) -> Result<Self, DatasetError> {
        crate::readers::DatasetReader::new().parse_str(text)
    }

    /// Marker probe, does a variable of this name exist?
    pub fn has_variable(&self, name: &str) -> bool {
        self.variable(name).is_some()
    }

    /// Look up a variable by name
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }

    /// Mutable lookup of a variable by name
    pub fn variable_mut(&mut self, name: &str) -> Option<&mut Variable> {
        self.variables.iter_mut().find(|v| v.name == name)
    }

    /// Look up a variable, failing with [GridError::MissingVariable]
    pub fn require(&self, name: &str) -> Result<&Variable> {
        self.variable(name)
            .ok_or_else(|| GridError::MissingVariable(name.to_string()).into())
    }

    /// Names of all variables in declaration order
    pub fn variable_names(&self) -> Vec<&str> {
        self.variables.iter().map(|v| v.name.as_str()).collect()
    }

    /// Look up a dimension by name
    pub fn dimension(&self, name: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.name == name)
    }

    /// Length of each dimension of a variable, outermost first
    pub fn shape(&self, name: &str) -> Result<Vec<usize>> {
        let variable = self.require(name)?;
        variable
            .dims
            .iter()
            .map(|d| {
                self.dimension(d)
                    .map(|d| d.len)
                    .with_context(|| f!("Dimension \"{d}\" of \"{name}\" is not declared"))
            })
            .collect()
    }

    /// Numeric data of a variable as `f64`, converting integers if needed
    pub fn doubles(&self, name: &str) -> Result<Vec<f64>> {
        let variable = self.require(name)?;
        variable.data.to_f64().ok_or_else(|| {
            GridError::VariableType {
                name: name.to_string(),
                expected: "numeric",
            }
            .into()
        })
    }

    /// Integer data of a variable
    pub fn integers(&self, name: &str) -> Result<&[i64]> {
        let variable = self.require(name)?;
        match &variable.data {
            Values::Integer(v) => Ok(v),
            _ => Err(GridError::VariableType {
                name: name.to_string(),
                expected: "integer",
            }
            .into()),
        }
    }

    /// Look up a global attribute by name
    pub fn attribute(&self, name: &str) -> Option<&Values> {
        find_attribute(&self.attributes, name)
    }

    /// Add or replace a global attribute
    pub fn set_attribute(&mut self, name: &str, value: Values) {
        set_attribute(&mut self.attributes, name, value)
    }
}

/// Modification
impl Dataset {
    /// Add a dimension, replacing any existing one of the same name
    pub fn add_dimension(&mut self, name: &str, len: usize) {
        match self.dimensions.iter_mut().find(|d| d.name == name) {
            Some(d) => {
                d.len = len;
                d.unlimited = false;
            }
            None => self.dimensions.push(Dimension::new(name, len)),
        }
    }

    /// Add a variable, replacing any existing one of the same name
    ///
    /// Replacement keeps the original declaration position so that output
    /// ordering is stable.
    pub fn insert_variable(&mut self, variable: Variable) {
        match self.variables.iter_mut().find(|v| v.name == variable.name) {
            Some(existing) => *existing = variable,
            None => self.variables.push(variable),
        }
    }

    /// Remove a variable, returning it if it was there
    pub fn remove_variable(&mut self, name: &str) -> Option<Variable> {
        let index = self.variables.iter().position(|v| v.name == name)?;
        Some(self.variables.remove(index))
    }
}

/// Writers
impl Dataset {
    /// CDL text representation, the same as [Display](std::fmt::Display)
    pub fn to_cdl(&self) -> String {
        let mut s = f!("netcdf {} {{\n", self.name);

        s += "dimensions:\n";
        for d in &self.dimensions {
            if d.unlimited {
                s += &f!("\t{} = UNLIMITED ; // ({} currently)\n", d.name, d.len);
            } else {
                s += &f!("\t{} = {} ;\n", d.name, d.len);
            }
        }

        s += "variables:\n";
        for v in &self.variables {
            match v.dims.is_empty() {
                true => s += &f!("\t{} {} ;\n", v.dtype.keyword(), v.name),
                false => {
                    s += &f!(
                        "\t{} {}({}) ;\n",
                        v.dtype.keyword(),
                        v.name,
                        v.dims.join(", ")
                    )
                }
            }
            for a in &v.attributes {
                s += &f!("\t\t{}:{} = {} ;\n", v.name, a.name, a.value.to_cdl());
            }
        }

        if !self.attributes.is_empty() {
            s += "\n// global attributes:\n";
            for a in &self.attributes {
                s += &f!("\t\t:{} = {} ;\n", a.name, a.value.to_cdl());
            }
        }

        s += "data:\n";
        for v in &self.variables {
            if v.data.is_empty() {
                continue;
            }
            let line = f!(" {} = {} ;", v.name, v.data.to_cdl());
            match &v.data {
                // wrap long numeric rows, but never split a quoted string
                Values::Text(_) => s += &line,
                _ => {
                    let options = textwrap::Options::new(80)
                        .subsequent_indent("    ")
                        .break_words(false)
                        .word_splitter(textwrap::WordSplitter::NoHyphenation);
                    s += &textwrap::fill(&line, options);
                }
            }
            s += "\n\n";
        }

        s += "}\n";
        s
    }

    /// Write the dataset to a CDL text file
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).with_context(|| f!("Could not create {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        debug!("Writing dataset \"{}\" to {}", self.name, path.display());
        writer.write_all(self.to_cdl().as_bytes())?;
        writer.flush()?;
        Ok(())
    }
}

impl std::fmt::Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.to_cdl())
    }
}

fn find_attribute<'a>(attributes: &'a [Attribute], name: &str) -> Option<&'a Values> {
    attributes.iter().find(|a| a.name == name).map(|a| &a.value)
}

fn set_attribute(attributes: &mut Vec<Attribute>, name: &str, value: Values) {
    match attributes.iter_mut().find(|a| a.name == name) {
        Some(a) => a.value = value,
        None => attributes.push(Attribute {
            name: name.to_string(),
            value,
        }),
    }
}
