use crate::application::App;
use crate::mountpath::MountPathExt;
use http_body_util::BodyExt;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, StatusCode, body::Incoming};
use hyper_util::rt::TokioIo;
use log::{error, info, warn};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::signal;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid listen address `{0}`")]
    InvalidAddress(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Where the HTTP server listens.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    /// Reads `HOST` and `PORT`, keeping the defaults for unset or unparsable values.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let host = std::env::var("HOST").unwrap_or(defaults.host);
        let port = match std::env::var("PORT") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                warn!("ignoring invalid PORT value `{}`", raw);
                defaults.port
            }),
            Err(_) => defaults.port,
        };

        Self { host, port }
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn addr(&self) -> Result<SocketAddr, ServerError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse().map_err(|_| ServerError::InvalidAddress(raw))
    }
}

pub(crate) struct Server;

impl Server {
    pub async fn bind(addr: SocketAddr, app: Arc<App>) -> Result<(), ServerError> {
        let listener = TcpListener::bind(addr).await?;

        let mut shutdown = tokio::spawn(async {
            if let Err(e) = signal::ctrl_c().await {
                error!("failed to listen for ctrl_c: {}", e);
                std::future::pending::<()>().await;
            }
            info!("🛑 Received Ctrl+C, shutting down server...");
        });

        loop {
            tokio::select! {
                Ok((stream, _)) = listener.accept() => {
                    let app = Arc::clone(&app);
                    let io = TokioIo::new(stream);

                    tokio::spawn(async move {
                        let service = service_fn(move |req| serve(Arc::clone(&app), req));
                        if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                            error!("Connection error: {}", err);
                        }
                    });
                }
                _ = &mut shutdown => {
                    break;
                }
            }
        }

        Ok(())
    }
}

async fn serve(
    app: Arc<App>,
    req: Request<Incoming>,
) -> Result<hyper::Response<http_body_util::Full<bytes::Bytes>>, Infallible> {
    let start = Instant::now();
    let (parts, body) = req.into_parts();

    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!("failed to read request body: {}", e);
            let mut res = crate::handler::Response::new();
            res.send_status(StatusCode::BAD_REQUEST);
            return Ok(res.into_hyper());
        }
    };

    let mut req = crate::handler::Request::from_parts(parts, body);
    let res = app.handle(&mut req).await;

    info!(
        "{} {} -> {} [{}] ({} ms)",
        req.method(),
        req.uri().path(),
        res.current_status().as_u16(),
        req.mount_path().as_deref().unwrap_or("-"),
        start.elapsed().as_millis()
    );

    Ok(res.into_hyper())
}
