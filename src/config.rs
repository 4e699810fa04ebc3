//! Configuration of the process.
//!
//! Configuration is taken from an optional TOML file and the command line,
//! with the command line overriding the file.

use std::{fs, io};
use std::net::SocketAddr;
use std::path::PathBuf;
use clap::{
    Arg, ArgAction, ArgGroup, ArgMatches, Command, crate_version,
    crate_authors, value_parser,
};
use serde::Deserialize;
use crate::geo::GeoPoint;
use crate::import;

const DEFAULT_CONFIG_PATH: &str = "/etc/localmap.conf";
const DEFAULT_TILE_CACHE: usize = 4096;


//------------ Config --------------------------------------------------------

/// What the process should do.
#[derive(Clone, Debug)]
pub enum Config {
    Serve(ServeConfig),
    Convert(ConvertConfig),
}

/// Configuration for running the map server.
#[derive(Clone, Debug)]
pub struct ServeConfig {
    /// The session file to start with.
    pub session: Option<PathBuf>,

    /// The origin to use if there is no session file.
    pub origin: Option<GeoPoint>,

    /// The address to listen on.
    pub listen: SocketAddr,

    /// The number of rendered tiles to keep.
    pub tile_cache: usize,
}

/// Configuration for converting coordinate text.
#[derive(Clone, Debug)]
pub struct ConvertConfig {
    pub origin: GeoPoint,
    pub direction: Direction,

    /// The file to read, standard input if missing.
    pub input: Option<PathBuf>,
}

/// The direction of a conversion.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Direction {
    /// From `lat,lon` to `north,east`.
    ToLocal,

    /// From `north,east` to `lat,lon`.
    ToGlobal,
}

impl Config {
    /// Creates the configuration from the process’s arguments.
    pub fn get() -> Result<Self, Error> {
        Self::from_matches(Self::command().get_matches())
    }

    pub fn command() -> Command {
        Command::new("localmap")
            .version(crate_version!())
            .author(crate_authors!())
            .about("draws coordinates on a local plane onto a map")
            .subcommand_required(true)
            .arg(Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("the configuration file")
                .action(ArgAction::Set)
                .global(true)
            )
            .subcommand(Command::new("serve")
                .about("runs the map server")
                .arg(Arg::new("session")
                    .short('s')
                    .long("session")
                    .value_name("FILE")
                    .value_parser(value_parser!(PathBuf))
                    .help("the session file to start with")
                    .action(ArgAction::Set)
                )
                .arg(origin_arg())
                .arg(Arg::new("listen")
                    .short('l')
                    .long("listen")
                    .value_name("ADDR")
                    .value_parser(value_parser!(SocketAddr))
                    .help("the addr to listen on")
                    .action(ArgAction::Set)
                )
                .arg(Arg::new("tile-cache")
                    .long("tile-cache")
                    .value_name("COUNT")
                    .value_parser(value_parser!(usize))
                    .help("the number of rendered tiles to keep")
                    .action(ArgAction::Set)
                )
            )
            .subcommand(Command::new("convert")
                .about("converts coordinate text between global and local")
                .arg(origin_arg())
                .arg(Arg::new("to-local")
                    .long("to-local")
                    .help("convert lat,lon lines into north,east lines")
                    .action(ArgAction::SetTrue)
                )
                .arg(Arg::new("to-global")
                    .long("to-global")
                    .help("convert north,east lines into lat,lon lines")
                    .action(ArgAction::SetTrue)
                )
                .group(ArgGroup::new("direction")
                    .args(["to-local", "to-global"])
                    .required(true)
                )
                .arg(Arg::new("input")
                    .value_name("FILE")
                    .value_parser(value_parser!(PathBuf))
                    .help("the file to read, standard input if missing")
                )
            )
    }

    pub fn from_matches(mut matches: ArgMatches) -> Result<Self, Error> {
        let (name, mut sub) = matches.remove_subcommand().ok_or(
            Error::MissingCommand
        )?;

        // The config arg is global, so it shows up in the subcommand.
        let (config_path, insist) = match sub.remove_one::<PathBuf>(
            "config"
        ) {
            Some(path) => (path, true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };
        let file = ConfigFile::load(config_path, insist)?;
        let file_origin = match file.origin {
            Some(ref origin) => {
                Some(import::parse_geo_point(origin).map_err(Error::Origin)?)
            }
            None => None
        };

        match name.as_str() {
            "serve" => {
                Ok(Config::Serve(ServeConfig {
                    session: sub.remove_one("session").or(file.session),
                    origin: sub.remove_one("origin").or(file_origin),
                    listen: sub.remove_one("listen").or(file.listen)
                        .unwrap_or_else(default_listen),
                    tile_cache: sub.remove_one("tile-cache")
                        .or(file.tile_cache)
                        .unwrap_or(DEFAULT_TILE_CACHE),
                }))
            }
            "convert" => {
                Ok(Config::Convert(ConvertConfig {
                    origin: sub.remove_one("origin").or(file_origin)
                        .ok_or(Error::MissingOrigin)?,
                    direction: if sub.get_flag("to-global") {
                        Direction::ToGlobal
                    }
                    else {
                        Direction::ToLocal
                    },
                    input: sub.remove_one("input"),
                }))
            }
            _ => Err(Error::MissingCommand)
        }
    }
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn origin_arg() -> Arg {
    Arg::new("origin")
        .short('o')
        .long("origin")
        .value_name("LAT,LON")
        .value_parser(parse_origin)
        .allow_hyphen_values(true)
        .help("the origin of local coordinates")
        .action(ArgAction::Set)
}

fn parse_origin(value: &str) -> Result<GeoPoint, String> {
    import::parse_geo_point(value).map_err(|err| err.to_string())
}


//------------ ConfigFile ----------------------------------------------------

/// The content of the configuration file.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub session: Option<PathBuf>,
    pub origin: Option<String>,
    pub listen: Option<SocketAddr>,
    pub tile_cache: Option<usize>,
}

impl ConfigFile {
    /// Loads the config file.
    ///
    /// If `insist` is `false`, a missing file results in an empty config.
    pub fn load(path: PathBuf, insist: bool) -> Result<Self, Error> {
        match fs::read_to_string(&path) {
            Ok(content) => {
                toml::from_str(&content).map_err(|err| {
                    Error::Parse { path, err }
                })
            }
            Err(err) => {
                if matches!(err.kind(), io::ErrorKind::NotFound) && !insist {
                    Ok(ConfigFile::default())
                }
                else {
                    Err(Error::Read { path, err })
                }
            }
        }
    }
}


//============ Error =========================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read config file {}: {err}", .path.display())]
    Read { path: PathBuf, err: io::Error },

    #[error("failed to parse config file {}: {err}", .path.display())]
    Parse { path: PathBuf, err: toml::de::Error },

    #[error("invalid origin in config file: {0}")]
    Origin(import::Error),

    #[error("no origin given")]
    MissingOrigin,

    #[error("no command given")]
    MissingCommand,
}


//============ Tests =========================================================
