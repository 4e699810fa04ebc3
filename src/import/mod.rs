//! Importing user-provided coordinates.

pub use self::text::{
    Error, ErrorKind, Pos, format_sets, parse_geo_point, parse_global_sets,
    parse_local_sets,
};

pub mod text;
