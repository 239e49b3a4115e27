//! Platform liveness endpoint.
//!
//! A single unauthenticated GET route answering with a static body so the
//! hosting platform's health checks pass. The endpoint is non-critical: a
//! port that is already bound is logged and the bot keeps running without it.

use anyhow::Result;
use hyper::server::conn::http1;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const LIVENESS_BODY: &str = "Bot is running!";

/// Spawn the liveness server, logging instead of failing if the port is taken
pub fn spawn_liveness_server(port: u16) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(err) = run_liveness_server(port).await {
            warn!(port = port, error = %err, "Liveness server unavailable, continuing without it");
        }
    })
}

async fn run_liveness_server(port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("Liveness server listening on {}", addr);

    loop {
        match listener.accept().await {
            Ok((stream, _)) => {
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = hyper::service::service_fn(
                        |req: hyper::Request<hyper::body::Incoming>| async move {
                            match (req.method(), req.uri().path()) {
                                (&hyper::Method::GET, "/") => Ok::<_, std::convert::Infallible>(
                                    hyper::Response::new(LIVENESS_BODY.to_string()),
                                ),
                                _ => {
                                    let mut response =
                                        hyper::Response::new("Not Found".to_string());
                                    *response.status_mut() = hyper::StatusCode::NOT_FOUND;
                                    Ok(response)
                                }
                            }
                        },
                    );

                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        debug!("Error serving liveness connection: {:?}", err);
                    }
                });
            }
            Err(e) => {
                warn!("Error accepting liveness connection: {}", e);
            }
        }
    }
}
