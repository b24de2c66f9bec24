use clap::Parser;
use log::{error, info};

use community_chat::config::Config;
use community_chat::routes::routes;
use community_chat::server::Server;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();
    let (origin, tls) = match (config.allowed_origin(), config.tls()) {
        (Ok(origin), Ok(tls)) => (origin, tls),
        (Err(e), _) | (_, Err(e)) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let server = Server::new();
    let routes = routes(server, &config.static_dir, &origin);
    let addr = config.socket_addr();

    if !config.index_file().exists() {
        info!("No frontend found at {}, serving API only", config.static_dir.display());
    }

    match tls {
        Some((cert, key)) => {
            info!("Community chat listening on https://{} (WSS at /ws)", addr);
            info!("Serving static files from: {}", config.static_dir.display());
            info!("Health check available at: https://{}/health", addr);
            warp::serve(routes)
                .tls()
                .cert_path(cert)
                .key_path(key)
                .run(addr)
                .await;
        }
        None => {
            info!("Community chat listening on http://{} (WS at /ws)", addr);
            info!("Serving static files from: {}", config.static_dir.display());
            info!("Health check available at: http://{}/health", addr);
            warp::serve(routes).run(addr).await;
        }
    }
}
