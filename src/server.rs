//! The HTTP server.
//!
//! The server provides the map page, the overlay tiles drawn from the
//! current session, the pointer read-out in absolute and local coordinates,
//! and a way to replace the session.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::sync::Arc;
use hyper::{Body, Method, Request, Response, StatusCode};
use hyper::header::{CACHE_CONTROL, CONTENT_TYPE, HeaderValue};
use hyper::service::{make_service_fn, service_fn};
use log::{debug, error, info, warn};
use lru::LruCache;
use tokio::sync::{Mutex, RwLock};
use crate::feature::FeatureSet;
use crate::geo::GeoPoint;
use crate::geodesy::wrap_lon;
use crate::session::{Session, SessionSource};
use crate::style::Style;
use crate::tile::{Tile, TileId};


//------------ Server --------------------------------------------------------

#[derive(Clone)]
pub struct Server {
    state: Arc<State>,
}

struct State {
    /// The currently drawn session.
    current: RwLock<Arc<Current>>,

    /// Rendered tiles keyed by session generation and tile.
    ///
    /// This is `None` if caching is disabled.
    cache: Option<Mutex<LruCache<(u64, TileId), Arc<Vec<u8>>>>>,

    /// The style to draw all sessions with.
    style: Style,
}

/// A session prepared for drawing.
struct Current {
    session: Session,
    features: FeatureSet,
    generation: u64,
}

impl Server {
    /// Creates a new server for the given session.
    ///
    /// Up to `cache_size` rendered tiles are kept. If it is zero, tiles are
    /// rendered anew for every request.
    pub fn new(session: Session, style: Style, cache_size: usize) -> Server {
        let features = FeatureSet::new(&session, style);
        Server {
            state: Arc::new(State {
                current: RwLock::new(Arc::new(Current {
                    session, features, generation: 0
                })),
                cache: NonZeroUsize::new(cache_size).map(|size| {
                    Mutex::new(LruCache::new(size))
                }),
                style,
            })
        }
    }

    pub async fn run(&self, addr: SocketAddr) -> Result<(), hyper::Error> {
        let server = self.clone();
        let make_svc = make_service_fn(move |_conn| {
            let this = server.clone();
            async move {
                Ok::<_, Infallible>(service_fn(move |r| {
                    let this = this.clone();
                    async move { this.process(r).await }
                }))
            }
        });

        let server = hyper::Server::try_bind(&addr)?.serve(make_svc);
        info!("Listening on http://{}/", addr);

        // Run this server for... forever!
        server.await
    }

    /// Replaces the current session.
    ///
    /// Returns the generation of the new session.
    pub async fn replace(&self, session: Session) -> u64 {
        let features = FeatureSet::new(&session, self.state.style);
        let generation = {
            let mut current = self.state.current.write().await;
            let generation = current.generation + 1;
            *current = Arc::new(Current { session, features, generation });
            generation
        };
        if let Some(cache) = self.state.cache.as_ref() {
            cache.lock().await.clear();
        }
        generation
    }

    async fn current(&self) -> Arc<Current> {
        self.state.current.read().await.clone()
    }
}

impl Server {
    async fn process(
        &self, request: Request<Body>
    ) -> Result<Response<Body>, Infallible> {
        debug!("{} {}", request.method(), request.uri());
        let method = request.method().clone();
        let path = request.uri().path().to_owned();
        let response = match (&method, path.as_str()) {
            (&Method::GET, "/") => {
                response(
                    StatusCode::OK, "text/html;charset=utf-8",
                    include_str!("../html/index.html")
                )
            }
            (&Method::GET, "/pointer") => {
                self.pointer(request.uri().query()).await
            }
            (&Method::GET, "/session") => self.session().await,
            (&Method::POST, "/session") => self.redraw(request).await,
            (&Method::GET, path) => {
                match TileId::from_path(path) {
                    Ok(tile) => self.tile(tile).await,
                    Err(_) => not_found(),
                }
            }
            _ => not_found(),
        };
        Ok(response)
    }

    async fn pointer(&self, query: Option<&str>) -> Response<Body> {
        match parse_pointer_query(query) {
            Ok(point) => {
                let current = self.current().await;
                text(StatusCode::OK, current.session.format_pointer(point))
            }
            Err(err) => text(StatusCode::BAD_REQUEST, err),
        }
    }

    async fn session(&self) -> Response<Body> {
        let current = self.current().await;
        text(
            StatusCode::OK,
            format!("{}\n{}\n", current.session.origin(), current.generation)
        )
    }

    async fn redraw(&self, request: Request<Body>) -> Response<Body> {
        let body = match hyper::body::to_bytes(request.into_body()).await {
            Ok(body) => body,
            Err(err) => {
                warn!("Failed to read redraw request: {}", err);
                return text(StatusCode::BAD_REQUEST, err.to_string())
            }
        };
        let session = match Session::from_source(
            &SessionSource::from_form(&body)
        ) {
            Ok(session) => session,
            Err(err) => {
                debug!("Rejected redraw: {}", err);
                return text(StatusCode::BAD_REQUEST, err.to_string())
            }
        };
        let origin = session.origin();
        let len = session.len();
        let generation = self.replace(session).await;
        info!(
            "Redraw {}: origin {}, {} sequences.", generation, origin, len
        );
        text(StatusCode::OK, format!("{}\n", generation))
    }

    async fn tile(&self, id: TileId) -> Response<Body> {
        let current = self.current().await;
        let key = (current.generation, id);
        if let Some(cache) = self.state.cache.as_ref() {
            if let Some(data) = cache.lock().await.get(&key) {
                return tile_response(id, data.as_ref().clone())
            }
        }

        let data = match Tile::new(id).render(&current.features) {
            Ok(data) => data,
            Err(err) => {
                error!("Failed to render tile {}: {}", id, err);
                return text(
                    StatusCode::INTERNAL_SERVER_ERROR, "rendering failed"
                )
            }
        };

        // A tile of an outdated session may still end up in here after a
        // redraw cleared the cache. It is never found again and just ages
        // out.
        if let Some(cache) = self.state.cache.as_ref() {
            cache.lock().await.put(key, Arc::new(data.clone()));
        }
        tile_response(id, data)
    }
}


//------------ Helper Functions ----------------------------------------------

/// Parses the `lat` and `lon` parameters of a pointer query.
///
/// The longitude is wrapped around since the map may have been panned
/// across the antimeridian.
fn parse_pointer_query(query: Option<&str>) -> Result<GeoPoint, String> {
    let mut lat = None;
    let mut lon = None;
    for (key, value) in url::form_urlencoded::parse(
        query.unwrap_or("").as_bytes()
    ) {
        let target = match key.as_ref() {
            "lat" => &mut lat,
            "lon" | "lng" => &mut lon,
            _ => continue,
        };
        *target = Some(value.parse::<f64>().map_err(|_| {
            format!("invalid value for {}", key)
        })?);
    }
    let lat = lat.ok_or("missing lat")?;
    let lon = lon.ok_or("missing lon")?;
    GeoPoint::checked(lat, wrap_lon(lon)).map_err(|err| err.to_string())
}

fn response(
    status: StatusCode, content_type: &'static str, body: impl Into<Body>
) -> Response<Body> {
    let mut res = Response::new(body.into());
    *res.status_mut() = status;
    res.headers_mut().insert(
        CONTENT_TYPE, HeaderValue::from_static(content_type)
    );
    res
}

fn text(status: StatusCode, body: impl Into<Body>) -> Response<Body> {
    response(status, "text/plain;charset=utf-8", body)
}

fn not_found() -> Response<Body> {
    text(StatusCode::NOT_FOUND, "not found")
}

fn tile_response(id: TileId, data: Vec<u8>) -> Response<Body> {
    let mut res = response(StatusCode::OK, id.format.content_type(), data);
    res.headers_mut().insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    res
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    fn server() -> Server {
        Server::new(Session::new(GeoPoint::new(10., 20.)), Style::default(), 16)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    async fn body_bytes(response: Response<Body>) -> Vec<u8> {
        hyper::body::to_bytes(response.into_body()).await.unwrap().to_vec()
    }

    async fn body_text(response: Response<Body>) -> String {
        String::from_utf8(body_bytes(response).await).unwrap()
    }

    #[test]
    fn pointer_query() {
        assert_eq!(
            parse_pointer_query(Some("lat=1.5&lon=-2")),
            Ok(GeoPoint::new(1.5, -2.))
        );
        assert_eq!(
            parse_pointer_query(Some("lng=3&lat=4&zoom=2")),
            Ok(GeoPoint::new(4., 3.))
        );
        assert_eq!(
            parse_pointer_query(Some("lat=1")), Err("missing lon".into())
        );
        assert_eq!(
            parse_pointer_query(Some("lat=x&lon=1")),
            Err("invalid value for lat".into())
        );
        assert_eq!(
            parse_pointer_query(Some("lat=1&lon=190")),
            Ok(GeoPoint::new(1., -170.))
        );
        assert_eq!(
            parse_pointer_query(Some("lat=1&lng=-540")),
            Ok(GeoPoint::new(1., -180.))
        );
        assert!(parse_pointer_query(Some("lat=100&lon=1")).is_err());
        assert!(parse_pointer_query(Some("lat=1&lon=inf")).is_err());
        assert!(parse_pointer_query(None).is_err());
    }

    #[tokio::test]
    async fn routes() {
        let server = server();

        let res = server.process(get("/")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let res = server.process(get("/pointer?lat=10&lon=20")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            body_text(res).await,
            "Lat,Lon: {10.000000, 20.000000}\nNorth, east: {0.00, 0.00}"
        );

        let res = server.process(get("/pointer?lat=10")).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let res = server.process(get("/session")).await.unwrap();
        assert_eq!(body_text(res).await, "10.000000,20.000000\n0\n");

        let res = server.process(get("/nothing/here")).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let res = server.process(get("/2/3/1.png")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[CONTENT_TYPE], "image/png");
    }

    #[tokio::test]
    async fn redraw() {
        let server = server();

        let res = server.process(
            Request::post("/session").body(Body::from(
                "origin=1%2C2&local_polylines=0%2C0%0A10%2C0"
            )).unwrap()
        ).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_text(res).await, "1\n");

        let res = server.process(get("/session")).await.unwrap();
        assert_eq!(body_text(res).await, "1.000000,2.000000\n1\n");

        let res = server.process(
            Request::post("/session").body(Body::from(
                "origin=1%2C2&global_polygons=1%2C2%0A3"
            )).unwrap()
        ).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_text(res).await, "global_polygons: 2:2: expected a comma"
        );

        // The failed redraw keeps the previous session.
        let res = server.process(get("/session")).await.unwrap();
        assert_eq!(body_text(res).await, "1.000000,2.000000\n1\n");
    }

    #[tokio::test]
    async fn redraw_renders_tiles_anew() {
        let server = server();
        let id = TileId::from_path("/0/0/0.png").unwrap();
        let cache = server.state.cache.as_ref().unwrap();

        let before = body_bytes(
            server.process(get("/0/0/0.png")).await.unwrap()
        ).await;
        assert!(cache.lock().await.contains(&(0, id)));

        let res = server.process(
            Request::post("/session").body(Body::from(
                "origin=10%2C20&global_polylines=0%2C0%0A40%2C60"
            )).unwrap()
        ).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(!cache.lock().await.contains(&(0, id)));

        // A tile of the old session stored after the cache was cleared.
        cache.lock().await.put((0, id), Arc::new(b"old".to_vec()));

        let after = body_bytes(
            server.process(get("/0/0/0.png")).await.unwrap()
        ).await;
        assert!(after.starts_with(b"\x89PNG"));
        assert_ne!(before, after);
        assert!(cache.lock().await.contains(&(1, id)));

        // The second request is served from the cache.
        let again = body_bytes(
            server.process(get("/0/0/0.png")).await.unwrap()
        ).await;
        assert_eq!(after, again);
    }
}
