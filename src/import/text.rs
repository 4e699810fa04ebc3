//! Parsing coordinate text.
//!
//! Coordinates are given as plain text with one point per line. Each line
//! contains two numbers separated by a comma:
//!
//! ```text
//! text        ::=  *(point-line | blank-line)
//! point-line  ::=  *sp number *sp "," *sp number *sp line-end
//! blank-line  ::=  *sp line-end
//! line-end    ::=  ["\r"] "\n" | end-of-input
//! ```
//!
//! Blank lines separate sequences of points. For absolute coordinates the
//! numbers are latitude and longitude, for local coordinates they are the
//! offsets north and east of the origin in meters.

use std::fmt;
use std::f64::consts::PI;
use std::str::FromStr;
use nom::IResult;
use nom::branch::alt;
use nom::character::complete::{
    char as tag_char, line_ending, multispace0, space0
};
use nom::combinator::{eof, map, recognize};
use nom::number::complete::recognize_float;
use crate::geo::{GeoPoint, LocalPoint, RangeError};
use crate::geodesy::EARTH_RADIUS;

type Span<'a> = nom_locate::LocatedSpan<&'a str>;

/// The largest distance from the origin a local point may have.
///
/// This is half the circumference of the Earth. Anything further away
/// wraps around the globe and is most likely a typo.
pub const MAX_LOCAL_DISTANCE: f64 = PI * EARTH_RADIUS;


//------------ Parsing Sets --------------------------------------------------

/// Parses text into sequences of absolute points.
///
/// Each line is `lat,lon`. Latitude and longitude must be in range.
pub fn parse_global_sets(text: &str) -> Result<Vec<Vec<GeoPoint>>, Error> {
    parse_sets(text, |lat, lon| {
        GeoPoint::checked(lat, lon).map_err(ErrorKind::Range)
    })
}

/// Parses text into sequences of local points.
///
/// Each line is `north,east` in meters. Points must not be further than
/// [`MAX_LOCAL_DISTANCE`] from the origin.
pub fn parse_local_sets(text: &str) -> Result<Vec<Vec<LocalPoint>>, Error> {
    parse_sets(text, |north, east| {
        if !north.is_finite() || !east.is_finite() {
            return Err(ErrorKind::NotFinite)
        }
        let point = LocalPoint::new(north, east);
        if !(point.distance() <= MAX_LOCAL_DISTANCE) {
            return Err(ErrorKind::TooFar)
        }
        Ok(point)
    })
}

/// Parses text containing exactly one absolute point.
///
/// Surrounding white space, including line feeds, is allowed.
pub fn parse_geo_point(text: &str) -> Result<GeoPoint, Error> {
    let input = Span::new(text);
    let (input, _) = skip(multispace0, input);
    if input.fragment().is_empty() {
        return Err(Error::new(Pos::capture(&input), ErrorKind::Empty))
    }
    let pos = Pos::capture(&input);
    let (input, (lat, lon)) = pair(input)?;
    let (input, _) = skip(multispace0, input);
    if !input.fragment().is_empty() {
        return Err(Error::new(
            Pos::capture(&input), ErrorKind::TrailingCharacters
        ))
    }
    GeoPoint::checked(lat, lon).map_err(|err| {
        Error::new(pos, ErrorKind::Range(err))
    })
}

fn parse_sets<T>(
    text: &str,
    convert: impl Fn(f64, f64) -> Result<T, ErrorKind>,
) -> Result<Vec<Vec<T>>, Error> {
    let mut res = Vec::new();
    let mut current = Vec::new();
    let mut input = Span::new(text);
    while !input.fragment().is_empty() {
        let (rest, line) = Line::parse(input)?;
        match line {
            Line::Blank => {
                if !current.is_empty() {
                    res.push(std::mem::take(&mut current))
                }
            }
            Line::Point { first, second, pos } => {
                current.push(
                    convert(first, second).map_err(|kind| {
                        Error::new(pos, kind)
                    })?
                )
            }
        }
        input = rest;
    }
    if !current.is_empty() {
        res.push(current)
    }
    Ok(res)
}


//------------ Formatting Sets -----------------------------------------------

/// Formats sequences of points in the format understood by the parser.
///
/// Every point is written on a line of its own using its `Display`
/// implementation and sequences are separated by a blank line.
pub fn format_sets<T: fmt::Display>(sets: &[Vec<T>]) -> String {
    let mut res = String::new();
    for (i, set) in sets.iter().enumerate() {
        if i > 0 {
            res.push('\n');
        }
        for point in set {
            res.push_str(&point.to_string());
            res.push('\n');
        }
    }
    res
}


//------------ Line ----------------------------------------------------------

/// A single line of input.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Line {
    Blank,
    Point { first: f64, second: f64, pos: Pos },
}

impl Line {
    fn parse(input: Span) -> Result<(Span, Self), Error> {
        let (input, _) = skip(space0, input);
        if let Ok((input, _)) = line_end(input) {
            return Ok((input, Line::Blank))
        }
        let pos = Pos::capture(&input);
        let (input, (first, second)) = pair(input)?;
        let (input, _) = skip(space0, input);
        match line_end(input) {
            Ok((input, _)) => Ok((input, Line::Point { first, second, pos })),
            Err(_) => {
                Err(Error::new(
                    Pos::capture(&input), ErrorKind::TrailingCharacters
                ))
            }
        }
    }
}


//------------ Parsers -------------------------------------------------------

/// Parses two comma separated numbers.
fn pair(input: Span) -> Result<(Span, (f64, f64)), Error> {
    let (input, first) = number(input)?;
    let (input, _) = skip(space0, input);
    let (input, _) = tag_char::<_, nom::error::Error<Span>>(',')(input)
        .map_err(|_| {
            Error::new(Pos::capture(&input), ErrorKind::MissingComma)
        })?;
    let (input, _) = skip(space0, input);
    let (input, second) = number(input)?;
    Ok((input, (first, second)))
}

/// Parses a floating point number.
fn number(input: Span) -> Result<(Span, f64), Error> {
    let pos = Pos::capture(&input);
    let (rest, value) = recognize_float::<_, nom::error::Error<Span>>(input)
        .map_err(|_| Error::new(pos, ErrorKind::InvalidNumber))?;
    match f64::from_str(value.fragment()) {
        Ok(value) => Ok((rest, value)),
        Err(_) => Err(Error::new(pos, ErrorKind::InvalidNumber))
    }
}

/// The end of a line or the end of all input.
fn line_end(input: Span) -> IResult<Span, ()> {
    map(alt((recognize(line_ending), eof)), |_| ())(input)
}

/// Runs a parser that cannot fail.
fn skip<'a>(
    parse: impl Fn(Span<'a>) -> IResult<Span<'a>, Span<'a>>,
    input: Span<'a>,
) -> (Span<'a>, ()) {
    match parse(input) {
        Ok((rest, _)) => (rest, ()),
        Err(_) => (input, ()),
    }
}


//------------ Pos -----------------------------------------------------------

/// The position of an item within input.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Pos {
    pub line: u32,
    pub col: usize,
}

impl Pos {
    pub fn new(line: u32, col: usize) -> Self {
        Pos { line, col }
    }

    fn capture(span: &Span) -> Self {
        Pos {
            line: span.location_line(),
            col: span.get_utf8_column(),
        }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}


//============ Error =========================================================

/// An error happened while parsing coordinate text.
#[derive(Clone, Copy, Debug, PartialEq, thiserror::Error)]
#[error("{pos}: {kind}")]
pub struct Error {
    pos: Pos,
    kind: ErrorKind,
}

impl Error {
    fn new(pos: Pos, kind: ErrorKind) -> Self {
        Error { pos, kind }
    }

    pub fn pos(&self) -> Pos {
        self.pos
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

#[derive(Clone, Copy, Debug, PartialEq, thiserror::Error)]
pub enum ErrorKind {
    #[error("expected a number")]
    InvalidNumber,

    #[error("expected a comma")]
    MissingComma,

    #[error("unexpected characters after the second number")]
    TrailingCharacters,

    #[error("expected a coordinate")]
    Empty,

    #[error("number is not finite")]
    NotFinite,

    #[error("point is further than half way around the Earth")]
    TooFar,

    #[error(transparent)]
    Range(RangeError),
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn global_groups() {
        let sets = parse_global_sets(
            "37.8044,-122.2712\n 37.8, -122.27 \n\n\n-27.4698,153.0251\n"
        ).unwrap();
        assert_eq!(sets, vec![
            vec![
                GeoPoint::new(37.8044, -122.2712),
                GeoPoint::new(37.8, -122.27),
            ],
            vec![GeoPoint::new(-27.4698, 153.0251)],
        ]);
    }

    #[test]
    fn crlf_and_blank_whitespace() {
        let sets = parse_global_sets("1,2\r\n  \r\n3,4").unwrap();
        assert_eq!(sets, vec![
            vec![GeoPoint::new(1., 2.)], vec![GeoPoint::new(3., 4.)]
        ]);
    }

    #[test]
    fn empty_input() {
        assert!(parse_global_sets("").unwrap().is_empty());
        assert!(parse_local_sets("\n\n  \n").unwrap().is_empty());
    }

    #[test]
    fn local_axis_order() {
        let sets = parse_local_sets("100,-20.5\n1e2,0").unwrap();
        assert_eq!(sets, vec![vec![
            LocalPoint::new(100., -20.5), LocalPoint::new(100., 0.)
        ]]);
    }

    #[test]
    fn errors() {
        fn err(text: &str) -> (Pos, ErrorKind) {
            let err = parse_global_sets(text).unwrap_err();
            (err.pos(), err.kind())
        }

        assert_eq!(err("1,2\nfoo,3"), (Pos::new(2, 1), ErrorKind::InvalidNumber));
        assert_eq!(err("1 2"), (Pos::new(1, 3), ErrorKind::MissingComma));
        assert_eq!(err("1,2,3"), (Pos::new(1, 4), ErrorKind::TrailingCharacters));
        assert_eq!(err("  1,"), (Pos::new(1, 5), ErrorKind::InvalidNumber));
        assert_eq!(
            err("\n\n 91,0"),
            (Pos::new(3, 2), ErrorKind::Range(RangeError::Latitude(91.)))
        );
        assert_eq!(
            err("0,-200"),
            (Pos::new(1, 1), ErrorKind::Range(RangeError::Longitude(-200.)))
        );
    }

    #[test]
    fn local_errors() {
        fn err(text: &str) -> (Pos, ErrorKind) {
            let err = parse_local_sets(text).unwrap_err();
            (err.pos(), err.kind())
        }

        assert_eq!(err("1e400,0"), (Pos::new(1, 1), ErrorKind::NotFinite));
        assert_eq!(err("0,-1e400"), (Pos::new(1, 1), ErrorKind::NotFinite));
        assert_eq!(
            err("0,0\n 1.7e308,1.7e308"), (Pos::new(2, 2), ErrorKind::TooFar)
        );
        assert_eq!(err("0,-20100000"), (Pos::new(1, 1), ErrorKind::TooFar));
        assert!(parse_local_sets("20000000,0\n0,-20000000").is_ok());
    }

    #[test]
    fn error_display() {
        let err = parse_global_sets("1,2\n1;2").unwrap_err();
        assert_eq!(err.to_string(), "2:2: expected a comma");
    }

    #[test]
    fn single_point() {
        assert_eq!(
            parse_geo_point(" 37.8044,-122.2712\n").unwrap(),
            GeoPoint::new(37.8044, -122.2712)
        );
        assert_eq!(parse_geo_point("  ").unwrap_err().kind(), ErrorKind::Empty);
        assert_eq!(
            parse_geo_point("1,2\n3,4").unwrap_err().kind(),
            ErrorKind::TrailingCharacters
        );
    }

    #[test]
    fn format_round_trip() {
        let sets = vec![
            vec![LocalPoint::new(1., 2.), LocalPoint::new(3.5, -4.)],
            vec![LocalPoint::new(0., 0.)],
        ];
        let text = format_sets(&sets);
        assert_eq!(text, "1.00,2.00\n3.50,-4.00\n\n0.00,0.00\n");
        assert_eq!(parse_local_sets(&text).unwrap(), sets);
    }
}
