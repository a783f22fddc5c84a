//! Reader for CDL text datasets
//!
//! CDL is the text form of netCDF produced by `ncdump`. It is the generic
//! container every dataset-based grid convention is loaded through, so the
//! reader is strict about the difference between "this is not a dataset"
//! and "this is a broken dataset".

// internal modules
use crate::dataset::{Attribute, DataType, Dataset, Dimension, Values, Variable};
use crate::error::DatasetError;
use crate::readers::parsers::{self, Token};
use crate::utils::f;

// standard library
use std::collections::HashMap;
use std::path::Path;

// external crates
use log::{debug, trace};

/// A reader for CDL text datasets
///
/// Example:
/// ```ignore
///     let reader = DatasetReader::new();
///     let dataset = reader.parse(Path::new("grid.cdl"))?;
/// ```
#[derive(Debug, Default)]
pub struct DatasetReader;

impl DatasetReader {
    /// Just calls Default::default(), nothing special to be initialised
    pub fn new() -> Self {
        Default::default()
    }

    /// Load a dataset from a file
    ///
    /// Anything that cannot be read as UTF-8 text, or that does not start with
    /// a `netcdf <name> {` header, is [DatasetError::NotADataset].
    pub fn parse(&self, path: &Path) -> Result<Dataset, DatasetError> {
        let bytes = std::fs::read(path).map_err(|e| DatasetError::NotADataset(e.to_string()))?;
        let text = String::from_utf8(bytes)
            .map_err(|_| DatasetError::NotADataset("content is not UTF-8 text".into()))?;
        self.parse_str(&text)
    }

    /// Load a dataset from CDL text already in memory
    pub fn parse_str(&self, text: &str) -> Result<Dataset, DatasetError> {
        let (body, name) = parsers::cdl_header(text)
            .map_err(|_| DatasetError::NotADataset("missing \"netcdf <name> {\" header".into()))?;
        debug!("Reading dataset \"{name}\"");

        // everything between the header and the closing brace
        let body = strip_comments(body);
        let end = last_brace(&body).ok_or_else(|| malformed("missing closing brace"))?;

        let mut builder = Builder::new(name);
        let mut section = "";

        for statement in split_statements(&body[..end]) {
            let mut statement = statement.trim();
            while let Some((keyword, remainder)) = parsers::section_keyword(statement) {
                trace!("[Section] {keyword}");
                section = keyword;
                statement = remainder.trim();
            }
            if statement.is_empty() {
                continue;
            }
            match section {
                "dimensions" => builder.dimension(statement)?,
                "variables" => builder.variable_or_attribute(statement)?,
                "data" => builder.data(statement)?,
                _ => return Err(malformed(&f!("statement outside of a section: {statement}"))),
            }
        }

        builder.finish()
    }
}

/// Accumulates declarations and resolves shapes at the end
struct Builder {
    dataset: Dataset,
    /// Raw data tokens are kept until the unlimited dimensions are known
    data: HashMap<String, Vec<String>>,
    /// Quoted strings, only valid for text variables
    text: HashMap<String, String>,
}

impl Builder {
    fn new(name: &str) -> Self {
        Self {
            dataset: Dataset::new(name),
            data: HashMap::new(),
            text: HashMap::new(),
        }
    }

    fn dimension(&mut self, statement: &str) -> Result<(), DatasetError> {
        trace!("[Dimension] {statement}");
        let (_, (name, len)) = parsers::dimension_decl(statement)
            .map_err(|_| malformed(&f!("invalid dimension \"{statement}\"")))?;
        self.dataset.dimensions.push(Dimension {
            name: name.to_string(),
            len: len.unwrap_or(0) as usize,
            unlimited: len.is_none(),
        });
        Ok(())
    }

    fn variable_or_attribute(&mut self, statement: &str) -> Result<(), DatasetError> {
        if let Ok((_, (owner, name, values))) = parsers::attribute_decl(statement) {
            trace!("[Attribute] {statement}");
            let value = attribute_values(values)?;
            let attribute = Attribute {
                name: name.to_string(),
                value,
            };
            return match owner {
                None => {
                    self.dataset.attributes.push(attribute);
                    Ok(())
                }
                Some(owner) => {
                    let variable = self.dataset.variable_mut(owner).ok_or_else(|| {
                        malformed(&f!("attribute \"{name}\" on undeclared variable \"{owner}\""))
                    })?;
                    variable.attributes.push(attribute);
                    Ok(())
                }
            };
        }

        trace!("[Variable] {statement}");
        let (_, (keyword, name, dims)) = parsers::variable_decl(statement)
            .map_err(|_| malformed(&f!("invalid declaration \"{statement}\"")))?;
        let dtype = DataType::from_keyword(keyword)
            .ok_or_else(|| malformed(&f!("unknown type \"{keyword}\" for \"{name}\"")))?;

        if let Some(d) = dims.iter().find(|d| self.dataset.dimension(d).is_none()) {
            return Err(malformed(&f!("\"{name}\" uses undeclared dimension \"{d}\"")));
        }

        self.dataset.variables.push(Variable {
            name: name.to_string(),
            dtype,
            dims: dims.iter().map(|d| d.to_string()).collect(),
            attributes: Vec::new(),
            data: dtype.empty_values(),
        });
        Ok(())
    }

    fn data(&mut self, statement: &str) -> Result<(), DatasetError> {
        let (_, (name, values)) = parsers::data_decl(statement)
            .map_err(|_| malformed(&f!("invalid data statement \"{statement}\"")))?;
        trace!("[Data] {name}");

        if self.dataset.variable(name).is_none() {
            return Err(malformed(&f!("data for undeclared variable \"{name}\"")));
        }

        let (_, tokens) = parsers::value_list(values)
            .map_err(|_| malformed(&f!("invalid values for \"{name}\"")))?;

        for token in tokens {
            match token {
                Token::Raw(raw) => self.data.entry(name.to_string()).or_default().push(raw.to_string()),
                Token::Text(s) => self.text.entry(name.to_string()).or_default().push_str(&s),
            }
        }
        Ok(())
    }

    /// Convert raw data, size unlimited dimensions and check every shape
    fn finish(mut self) -> Result<Dataset, DatasetError> {
        for variable in &mut self.dataset.variables {
            let raw = self.data.remove(&variable.name).unwrap_or_default();
            let text = self.text.remove(&variable.name);
            variable.data = convert_data(variable, raw, text)?;
        }

        self.size_unlimited_dimensions();

        for variable in &mut self.dataset.variables {
            if variable.dtype.is_text() {
                continue;
            }
            let expected = element_count(
                variable
                    .dims
                    .iter()
                    .filter_map(|d| self.dataset.dimensions.iter().find(|x| &x.name == d))
                    .map(|d| d.len),
            )
            .ok_or_else(|| malformed(&f!("\"{}\" is too large to index", variable.name)))?;

            match variable.data.len() {
                // declared without data, so fill
                0 => variable.data = filled(variable, expected)?,
                n if n == expected => (),
                n => {
                    return Err(malformed(&f!(
                        "\"{}\" has {n} values, expected {expected}",
                        variable.name
                    )))
                }
            }
        }

        Ok(self.dataset)
    }

    /// Unlimited dimensions take their length from the first variable using them
    fn size_unlimited_dimensions(&mut self) {
        let lengths: Vec<(String, usize)> = self
            .dataset
            .dimensions
            .iter()
            .filter(|d| d.unlimited)
            .filter_map(|d| {
                let variable = self
                    .dataset
                    .variables
                    .iter()
                    .find(|v| v.dims.first() == Some(&d.name) && !v.data.is_empty())?;
                // an overflowing shape is left at 0 and rejected by the length check
                let inner = element_count(
                    variable
                        .dims
                        .iter()
                        .skip(1)
                        .filter_map(|n| self.dataset.dimension(n))
                        .map(|d| d.len),
                )?;
                let len = match inner {
                    0 => 0,
                    inner => variable.data.len() / inner,
                };
                Some((d.name.clone(), len))
            })
            .collect();

        for (name, len) in lengths {
            if let Some(d) = self.dataset.dimensions.iter_mut().find(|d| d.name == name) {
                d.len = len;
            }
        }
    }
}

fn malformed(reason: &str) -> DatasetError {
    DatasetError::Malformed(reason.to_string())
}

/// Typed data for a variable from its raw tokens
fn convert_data(
    variable: &Variable,
    raw: Vec<String>,
    text: Option<String>,
) -> Result<Values, DatasetError> {
    let name = &variable.name;
    let fill = variable.fill_value();

    if variable.dtype.is_text() {
        if !raw.is_empty() {
            return Err(malformed(&f!("non-text data for text variable \"{name}\"")));
        }
        return Ok(Values::Text(text.unwrap_or_default()));
    }

    if text.is_some() {
        return Err(malformed(&f!("text data for numeric variable \"{name}\"")));
    }

    if variable.dtype.is_float() {
        raw.iter()
            .map(|t| match t.as_str() {
                "_" => Ok(fill),
                t => parse_double(t).ok_or_else(|| malformed(&f!("\"{t}\" is not a number in \"{name}\""))),
            })
            .collect::<Result<Vec<f64>, _>>()
            .map(Values::Double)
    } else {
        raw.iter()
            .map(|t| match t.as_str() {
                "_" => Ok(fill as i64),
                t => parse_integer(t).ok_or_else(|| malformed(&f!("\"{t}\" is not an integer in \"{name}\""))),
            })
            .collect::<Result<Vec<i64>, _>>()
            .map(Values::Integer)
    }
}

/// Number of values for a shape, `None` if it overflows
fn element_count<I: IntoIterator<Item = usize>>(lengths: I) -> Option<usize> {
    lengths.into_iter().try_fold(1usize, |n, len| n.checked_mul(len))
}

/// Most values a variable declared without data is filled with
const MAX_FILL_VALUES: usize = 1 << 27;

/// Variable declared without data is entirely fill values
fn filled(variable: &Variable, len: usize) -> Result<Values, DatasetError> {
    if len > MAX_FILL_VALUES {
        return Err(malformed(&f!(
            "\"{}\" declares {len} values without data, more than {MAX_FILL_VALUES}",
            variable.name
        )));
    }
    let fill = variable.fill_value();
    Ok(match variable.dtype.is_float() {
        true => Values::Double(vec![fill; len]),
        false => Values::Integer(vec![fill as i64; len]),
    })
}

/// Attribute values, with the type inferred from the literals
///
/// Any literal with a decimal point, exponent or float suffix makes the whole
/// attribute a double, as `ncgen` does.
fn attribute_values(values: &str) -> Result<Values, DatasetError> {
    let (_, tokens) = parsers::value_list(values)
        .map_err(|_| malformed(&f!("invalid attribute values \"{values}\"")))?;

    let mut text = String::new();
    let mut raw = Vec::new();
    for token in tokens {
        match token {
            Token::Text(s) => text.push_str(&s),
            Token::Raw(r) => raw.push(r),
        }
    }

    match (text.is_empty(), raw.is_empty()) {
        (_, true) => Ok(Values::Text(text)),
        (true, false) => {
            if let Some(ints) = raw.iter().map(|r| parse_integer(r)).collect::<Option<Vec<i64>>>() {
                return Ok(Values::Integer(ints));
            }
            raw.iter()
                .map(|r| parse_double(r))
                .collect::<Option<Vec<f64>>>()
                .map(Values::Double)
                .ok_or_else(|| malformed(&f!("invalid numeric attribute \"{values}\"")))
        }
        (false, false) => Err(malformed(&f!("mixed text and numbers in \"{values}\""))),
    }
}

/// Integer literal, allowing the CDL type suffixes (`b`, `s`, `l`, `u`...)
fn parse_integer(token: &str) -> Option<i64> {
    let digits = token.trim_end_matches(|c: char| "bBsSlLuU".contains(c));
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Floating point literal, allowing the `f`/`d` suffixes
fn parse_double(token: &str) -> Option<f64> {
    token
        .parse()
        .ok()
        .or_else(|| {
            token
                .strip_suffix(|c: char| "fFdD".contains(c))
                .and_then(|t| t.parse().ok())
        })
        .or_else(|| parse_integer(token).map(|v| v as f64))
}

/// Remove `//` comments, leaving string contents untouched
fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match (escaped, c) {
                (true, _) => escaped = false,
                (false, '\\') => escaped = true,
                (false, '"') => in_string = false,
                _ => (),
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '/' if chars.peek() == Some(&'/') => {
                // skip to the end of the line, keeping the newline
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            _ => out.push(c),
        }
    }
    out
}

/// Split on `;` outside of strings
fn split_statements(text: &str) -> Vec<&str> {
    let mut statements = Vec::new();
    let mut start = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, c) in text.char_indices() {
        if in_string {
            match (escaped, c) {
                (true, _) => escaped = false,
                (false, '\\') => escaped = true,
                (false, '"') => in_string = false,
                _ => (),
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            ';' => {
                statements.push(&text[start..idx]);
                start = idx + 1;
            }
            _ => (),
        }
    }
    statements.push(&text[start..]);
    statements
}

/// Position of the closing brace, which must be outside any string
fn last_brace(text: &str) -> Option<usize> {
    let end = text.rfind('}')?;
    let tail_is_blank = text[end + 1..].trim().is_empty();
    tail_is_blank.then_some(end)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIP: &str = r#"netcdf scrip {
dimensions:
	grid_size = 3 ;
	grid_rank = 1 ;
variables:
	double grid_center_lon(grid_size) ;
		grid_center_lon:units = "degrees" ;
	double grid_center_lat(grid_size) ;
	int grid_dims(grid_rank) ;

// global attributes:
		:title = "tiny; with a semicolon" ;
		:version = 2 ;
		:scale = 1.5f ;
data:

 grid_center_lon = 0, 90.5, 180 ; // trailing comment

 grid_center_lat = -10, _, 10 ;

 grid_dims = 3 ;
}
"#;

    #[test]
    fn reads_scrip_like_dataset() {
        let ds = DatasetReader::new().parse_str(SCRIP).unwrap();
        assert_eq!(ds.name, "scrip");
        assert_eq!(ds.variable_names(), vec!["grid_center_lon", "grid_center_lat", "grid_dims"]);
        assert_eq!(ds.doubles("grid_center_lon").unwrap(), vec![0.0, 90.5, 180.0]);
        assert_eq!(ds.integers("grid_dims").unwrap(), &[3]);

        let lat = ds.doubles("grid_center_lat").unwrap();
        assert_eq!(lat[1], DataType::Double.default_fill());

        assert_eq!(
            ds.attribute("title"),
            Some(&Values::Text("tiny; with a semicolon".into()))
        );
        assert_eq!(ds.attribute("version"), Some(&Values::Integer(vec![2])));
        assert_eq!(ds.attribute("scale"), Some(&Values::Double(vec![1.5])));
        assert_eq!(
            ds.variable("grid_center_lon").unwrap().text_attribute("units"),
            Some("degrees")
        );
    }

    #[test]
    fn unlimited_dimension_from_data() {
        let text = "netcdf t {\ndimensions:\n time = UNLIMITED ; // (2 currently)\n n = 2 ;\n\
                    variables:\n int v(time, n) ;\n data:\n v = 1, 2, 3, 4 ;\n}";
        let ds = DatasetReader::new().parse_str(text).unwrap();
        assert_eq!(ds.dimension("time").unwrap().len, 2);
        assert!(ds.dimension("time").unwrap().unlimited);
    }

    #[test]
    fn missing_data_is_filled() {
        let text = "netcdf t {\ndimensions:\n n = 2 ;\nvariables:\n int v(n) ;\n  v:_FillValue = -1 ;\n}";
        let ds = DatasetReader::new().parse_str(text).unwrap();
        assert_eq!(ds.integers("v").unwrap(), &[-1, -1]);
    }

    #[test]
    fn not_a_dataset() {
        let error = DatasetReader::new().parse_str("4 2 0 0 0 0 0\n").unwrap_err();
        assert!(matches!(error, DatasetError::NotADataset(_)));
    }

    #[test]
    fn malformed_datasets() {
        let cases = [
            // wrong number of values
            "netcdf t {\ndimensions:\n n = 3 ;\nvariables:\n double x(n) ;\ndata:\n x = 1, 2 ;\n}",
            // unknown type
            "netcdf t {\ndimensions:\n n = 1 ;\nvariables:\n complex x(n) ;\n}",
            // undeclared dimension
            "netcdf t {\nvariables:\n double x(m) ;\n}",
            // attribute on undeclared variable
            "netcdf t {\nvariables:\n y:units = \"m\" ;\n}",
            // data for undeclared variable
            "netcdf t {\ndata:\n y = 1 ;\n}",
            // text in numeric data
            "netcdf t {\ndimensions:\n n = 1 ;\nvariables:\n int x(n) ;\ndata:\n x = \"a\" ;\n}",
            // no closing brace
            "netcdf t {\ndimensions:\n n = 1 ;\n",
            // shape too large to index
            "netcdf t {\ndimensions:\n n = 4294967296 ;\n m = 4294967296 ;\n\
             variables:\n int coordx(n, m) ;\ndata:\n coordx = 1 ;\n}",
            // far too many values to fill
            "netcdf t {\ndimensions:\n n = 4294967296 ;\nvariables:\n double x(n) ;\n}",
        ];
        for case in cases {
            let error = DatasetReader::new().parse_str(case).unwrap_err();
            assert!(matches!(error, DatasetError::Malformed(_)), "{case}");
        }
    }

    #[test]
    fn literals() {
        assert_eq!(parse_integer("10L"), Some(10));
        assert_eq!(parse_integer("-3s"), Some(-3));
        assert_eq!(parse_integer("1.5"), None);
        assert_eq!(parse_double("1.5f"), Some(1.5));
        assert_eq!(parse_double("2"), Some(2.0));
        assert!(parse_double("NaN").unwrap().is_nan());
        assert_eq!(parse_double("inf"), Some(f64::INFINITY));
        assert_eq!(parse_double("abc"), None);
    }

    #[test]
    fn comments_keep_strings() {
        let text = "a = \"x // y\" ; // comment\nb = 1 ;";
        assert_eq!(strip_comments(text), "a = \"x // y\" ; \nb = 1 ;");
        assert_eq!(split_statements("a = \"x;y\" ; b = 1"), vec!["a = \"x;y\" ", " b = 1"]);
    }
}
