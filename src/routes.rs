use std::convert::Infallible;
use std::path::Path;
use warp::filters::cors::CorsForbidden;
use warp::filters::path::Peek;
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use crate::server::Server;

/// `/ws`, `/health`, then the static frontend with an `index.html` fallback.
/// The fallback never answers for the `/ws` or `/health` paths.
///
/// `origin` must already be validated (see [`crate::config::Config::allowed_origin`]).
pub fn routes(
    server: Server,
    static_dir: &Path,
    origin: &str,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let ws_route = warp::path("ws")
        .and(warp::path::end())
        .and(warp::ws())
        .and(with_server(server.clone()))
        .map(|ws: warp::ws::Ws, server: Server| {
            ws.on_upgrade(move |socket| async move {
                server.handle_connection(socket).await;
            })
        });

    let cors = warp::cors()
        .allow_origin(origin)
        .allow_methods(vec!["GET", "POST"]);

    let health = warp::path("health").and(warp::path::end()).and(
        warp::get()
            .and(with_server(server))
            .then(|server: Server| async move { warp::reply::json(&server.health().await) })
            .with(cors)
            .recover(forbidden_origin),
    );

    let static_files = warp::get().and(not_reserved()).and(
        warp::fs::dir(static_dir.to_path_buf())
            .or(warp::fs::file(static_dir.join("index.html"))),
    );

    ws_route.or(health).or(static_files)
}

async fn forbidden_origin(rejection: Rejection) -> Result<impl Reply, Rejection> {
    match rejection.find::<CorsForbidden>() {
        Some(forbidden) => Ok(warp::reply::with_status(
            forbidden.to_string(),
            StatusCode::FORBIDDEN,
        )),
        None => Err(rejection),
    }
}

fn not_reserved() -> impl Filter<Extract = (), Error = Rejection> + Clone {
    warp::path::peek()
        .and_then(|peek: Peek| async move {
            match peek.segments().next() {
                Some("ws" | "health") => Err(warp::reject::not_found()),
                _ => Ok(()),
            }
        })
        .untuple_one()
}

fn with_server(server: Server) -> impl Filter<Extract = (Server,), Error = Infallible> + Clone {
    warp::any().map(move || server.clone())
}
