//! Data types and value storage for dataset variables and attributes

// internal modules
use crate::utils::f;

// external crates
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Declared type of a variable
///
/// Only three storage classes are actually kept, see [Values]. The declared
/// type is remembered so that files are written back the way they came in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Byte,
    Short,
    Int,
    Int64,
    UByte,
    UShort,
    UInt,
    UInt64,
    Float,
    Double,
    Char,
    String,
}

impl DataType {
    /// Parse a CDL type keyword
    ///
    /// ```rust
    /// # use uxgrid::dataset::DataType;
    /// assert_eq!(DataType::from_keyword("double"), Some(DataType::Double));
    /// assert_eq!(DataType::from_keyword("long"), Some(DataType::Int));
    /// assert_eq!(DataType::from_keyword("complex"), None);
    /// ```
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let dtype = match keyword {
            "byte" => Self::Byte,
            "short" => Self::Short,
            "int" | "long" => Self::Int,
            "int64" => Self::Int64,
            "ubyte" => Self::UByte,
            "ushort" => Self::UShort,
            "uint" => Self::UInt,
            "uint64" => Self::UInt64,
            "float" | "real" => Self::Float,
            "double" => Self::Double,
            "char" => Self::Char,
            "string" => Self::String,
            _ => return None,
        };
        Some(dtype)
    }

    /// CDL type keyword
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Int => "int",
            Self::Int64 => "int64",
            Self::UByte => "ubyte",
            Self::UShort => "ushort",
            Self::UInt => "uint",
            Self::UInt64 => "uint64",
            Self::Float => "float",
            Self::Double => "double",
            Self::Char => "char",
            Self::String => "string",
        }
    }

    /// Stored as [Values::Integer]
    pub fn is_integer(&self) -> bool {
        !self.is_float() && !self.is_text()
    }

    /// Stored as [Values::Double]
    pub fn is_float(&self) -> bool {
        matches!(self, Self::Float | Self::Double)
    }

    /// Stored as [Values::Text]
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Char | Self::String)
    }

    /// The netCDF default fill value for the type
    ///
    /// `uint64` cannot be held exactly in an `i64`, so it saturates.
    pub fn default_fill(&self) -> f64 {
        match self {
            Self::Byte => -127.0,
            Self::Short => -32767.0,
            Self::Int => -2147483647.0,
            Self::Int64 => -9223372036854775806.0,
            Self::UByte => 255.0,
            Self::UShort => 65535.0,
            Self::UInt => 4294967295.0,
            Self::UInt64 => i64::MAX as f64,
            Self::Float | Self::Double => 9.969209968386869e36,
            Self::Char | Self::String => 0.0,
        }
    }

    /// Empty storage of the right class
    pub fn empty_values(&self) -> Values {
        if self.is_text() {
            Values::Text(String::new())
        } else if self.is_float() {
            Values::Double(Vec::new())
        } else {
            Values::Integer(Vec::new())
        }
    }
}

/// Storage for variable data and attribute values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Values {
    /// Any of the integer types
    Integer(Vec<i64>),
    /// Either of the floating point types
    Double(Vec<f64>),
    /// Character data, concatenated
    Text(String),
}

impl Values {
    /// Number of values, or characters for text
    pub fn len(&self) -> usize {
        match self {
            Self::Integer(v) => v.len(),
            Self::Double(v) => v.len(),
            Self::Text(s) => s.chars().count(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric values as floats, `None` for text
    pub fn to_f64(&self) -> Option<Vec<f64>> {
        match self {
            Self::Integer(v) => Some(v.iter().map(|x| *x as f64).collect()),
            Self::Double(v) => Some(v.clone()),
            Self::Text(_) => None,
        }
    }

    /// CDL literal list
    ///
    /// Doubles always carry a decimal point or exponent so that attribute
    /// types survive being read back. Text is a single quoted string.
    pub(crate) fn to_cdl(&self) -> String {
        match self {
            Self::Integer(v) => v.iter().join(", "),
            Self::Double(v) => v.iter().map(|x| f!("{x:?}")).join(", "),
            Self::Text(s) => f!("\"{}\"", escape(s)),
        }
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out
}
