pub use self::config::Config;
pub use self::geo::{GeoPoint, LocalPoint, format_absolute};
pub use self::geodesy::{Geodesy, Spherical};
pub use self::projection::{
    LocalProjection, format_local, to_global, to_local
};
pub use self::server::Server;
pub use self::session::{Session, SessionFile, SessionSource};

pub mod canvas;
pub mod color;
pub mod config;
pub mod convert;
pub mod feature;
pub mod geo;
pub mod geodesy;
pub mod import;
pub mod projection;
pub mod server;
pub mod session;
pub mod style;
pub mod tile;
