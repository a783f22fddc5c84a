//! Parser combinators shared by the text readers
//!
//! The CDL reader splits the body into `;` terminated statements first, so
//! every parser here works on a single trimmed statement. This keeps the
//! combinators small and the error reporting per statement.

// external crates
use nom::branch::alt;
use nom::bytes::complete::{tag, tag_no_case, take_while, take_while1};
use nom::character::complete::{char, multispace0, multispace1, satisfy, u64 as nom_u64};
use nom::combinator::{all_consuming, map, opt, recognize, rest};
use nom::error::{Error, ErrorKind};
use nom::multi::{separated_list0, separated_list1};
use nom::sequence::{delimited, pair, preceded, separated_pair, terminated, tuple};
use nom::IResult;

/// A raw literal from a value list
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'a> {
    /// Unquoted literal such as `1.5f`, `-1` or `_`
    Raw(&'a str),
    /// Quoted string with escapes resolved
    Text(String),
}

/// Wraps a parser to skip surrounding whitespace
fn ws<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

/// Name of a dimension, variable, attribute or dataset
///
/// netCDF allows rather more than C identifiers, so dots, dashes and plus
/// signs are accepted after the first character.
pub fn identifier(i: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c| c.is_alphabetic() || c == '_'),
        take_while(|c: char| c.is_alphanumeric() || "_.-+@".contains(c)),
    ))(i)
}

/// The `netcdf <name> {` header, returning the dataset name
pub fn cdl_header(i: &str) -> IResult<&str, &str> {
    preceded(
        pair(multispace0, tag("netcdf")),
        terminated(
            preceded(multispace1, identifier),
            preceded(multispace0, char('{')),
        ),
    )(i)
}

/// `name = 10` or `name = UNLIMITED`, with `None` for unlimited
pub fn dimension_decl(i: &str) -> IResult<&str, (&str, Option<u64>)> {
    all_consuming(separated_pair(
        identifier,
        ws(char('=')),
        alt((
            map(tag_no_case("UNLIMITED"), |_| None),
            map(nom_u64, Some),
        )),
    ))(i)
}

/// `double name(dim1, dim2)`, returning (type, name, dims)
pub fn variable_decl(i: &str) -> IResult<&str, (&str, &str, Vec<&str>)> {
    let dims = delimited(
        ws(char('(')),
        separated_list0(ws(char(',')), identifier),
        ws(char(')')),
    );
    all_consuming(map(
        tuple((identifier, preceded(multispace1, identifier), opt(dims))),
        |(dtype, name, dims)| (dtype, name, dims.unwrap_or_default()),
    ))(i)
}

/// `var:name = values` or `:name = values` for global attributes
///
/// Returns the owning variable (if any), the attribute name, and the unparsed
/// value list.
pub fn attribute_decl(i: &str) -> IResult<&str, (Option<&str>, &str, &str)> {
    tuple((
        opt(identifier),
        preceded(char(':'), identifier),
        preceded(ws(char('=')), rest),
    ))(i)
}

/// `name = values` in the data section
pub fn data_decl(i: &str) -> IResult<&str, (&str, &str)> {
    separated_pair(identifier, ws(char('=')), rest)(i)
}

/// Comma separated list of quoted strings and raw literals
pub fn value_list(i: &str) -> IResult<&str, Vec<Token>> {
    all_consuming(ws(separated_list1(ws(char(',')), value)))(i)
}

/// A single literal, quoted or not
fn value(i: &str) -> IResult<&str, Token> {
    alt((
        map(quoted, Token::Text),
        map(
            take_while1(|c: char| !(c == ',' || c == '"' || c.is_whitespace())),
            Token::Raw,
        ),
    ))(i)
}

/// Double quoted string, resolving backslash escapes
pub fn quoted(i: &str) -> IResult<&str, String> {
    let (body, _) = char('"')(i)?;
    let mut out = String::new();
    let mut chars = body.char_indices();
    while let Some((idx, c)) = chars.next() {
        match c {
            '"' => return Ok((&body[idx + 1..], out)),
            '\\' => match chars.next() {
                Some((_, 'n')) => out.push('\n'),
                Some((_, 't')) => out.push('\t'),
                Some((_, '0')) => (),
                Some((_, other)) => out.push(other),
                None => break,
            },
            _ => out.push(c),
        }
    }
    // ran out of input before the closing quote
    Err(nom::Err::Error(Error::new(i, ErrorKind::Char)))
}

/// Header line of an AFLR3 ugrid file
///
/// Seven counts: nodes, surface triangles, surface quads, tetrahedra,
/// pyramids, prisms, hexahedra.
pub fn ugrid_header(i: &str) -> IResult<&str, [usize; 7]> {
    let (i, counts) = all_consuming(ws(separated_list1(multispace1, nom_u64)))(i)?;
    match <[u64; 7]>::try_from(counts) {
        Ok(c) => Ok((i, c.map(|v| v as usize))),
        Err(_) => Err(nom::Err::Error(Error::new(i, ErrorKind::Count))),
    }
}

/// Checks if a statement opens one of the CDL sections
///
/// Returns the section keyword and the remainder of the statement. The
/// keyword must be followed by whitespace so that an attribute such as
/// `data:units` on a variable named `data` is not mistaken for a section.
pub fn section_keyword(i: &str) -> Option<(&'static str, &str)> {
    for keyword in ["dimensions", "variables", "data"] {
        let parsed: IResult<&str, &str> = terminated(tag(keyword), ws(char(':')))(i);
        if let Ok((remainder, _)) = parsed {
            let separated = remainder.len() < i.len() - keyword.len() - 1;
            if remainder.is_empty() || separated {
                return Some((keyword, remainder));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header() {
        let (rest, name) = cdl_header("\n netcdf mesh_01 {\ndimensions:").unwrap();
        assert_eq!(name, "mesh_01");
        assert_eq!(rest, "\ndimensions:");
        assert!(cdl_header("netcdf{").is_err());
        assert!(cdl_header("PK\u{3}\u{4}").is_err());
    }

    #[test]
    fn dimensions() {
        assert_eq!(dimension_decl("n = 4").unwrap().1, ("n", Some(4)));
        assert_eq!(dimension_decl("time=UNLIMITED").unwrap().1, ("time", None));
        assert!(dimension_decl("n = four").is_err());
    }

    #[test]
    fn variables() {
        let (_, (dtype, name, dims)) = variable_decl("double grid_corner_lon(grid_size, grid_corners)").unwrap();
        assert_eq!(dtype, "double");
        assert_eq!(name, "grid_corner_lon");
        assert_eq!(dims, vec!["grid_size", "grid_corners"]);

        let (_, (_, name, dims)) = variable_decl("int Mesh2").unwrap();
        assert_eq!(name, "Mesh2");
        assert!(dims.is_empty());
    }

    #[test]
    fn attributes() {
        let (_, (var, name, values)) = attribute_decl("Mesh2:cf_role = \"mesh_topology\"").unwrap();
        assert_eq!(var, Some("Mesh2"));
        assert_eq!(name, "cf_role");
        assert_eq!(values, "\"mesh_topology\"");

        let (_, (var, name, _)) = attribute_decl(":title = \"t\"").unwrap();
        assert_eq!(var, None);
        assert_eq!(name, "title");

        // a declaration is not an attribute
        assert!(attribute_decl("double x(n)").is_err());
    }

    #[test]
    fn values() {
        let (_, tokens) = value_list(" 1, -2.5e3,_ ,1.5f ").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Raw("1"),
                Token::Raw("-2.5e3"),
                Token::Raw("_"),
                Token::Raw("1.5f")
            ]
        );

        let (_, tokens) = value_list(r#""a \"b\"", "c""#).unwrap();
        assert_eq!(
            tokens,
            vec![Token::Text("a \"b\"".into()), Token::Text("c".into())]
        );
        assert!(quoted("\"unterminated").is_err());
    }

    #[test]
    fn sections() {
        assert_eq!(section_keyword("dimensions:\n\tn = 3"), Some(("dimensions", "n = 3")));
        assert_eq!(section_keyword("data:"), Some(("data", "")));
        assert_eq!(section_keyword("data:units = \"m\""), None);
        assert_eq!(section_keyword("n = 3"), None);
    }

    #[test]
    fn aflr3_header() {
        assert_eq!(ugrid_header("4 2 0 0 0 0 0").unwrap().1, [4, 2, 0, 0, 0, 0, 0]);
        assert!(ugrid_header("4 2 0").is_err());
    }
}
