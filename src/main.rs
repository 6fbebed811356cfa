use express_mountpath::{
    Handler, HandlerError, RequestExt, RequestLogger, Router, ServerConfig, app, mountpath,
    mountpath::MountPathExt,
};
use hyper::{StatusCode, header::HeaderValue};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    mountpath::install();

    let mut users = Router::new();
    users
        .get(
            "/:id",
            Handler::endpoint_sync(|req, res| {
                let body = json!({
                    "id": req.param("id"),
                    "route": req.mount_path(),
                });
                if let Err(e) = res.json(&body) {
                    log::error!("failed to serialize user: {}", e);
                    res.send_status(StatusCode::INTERNAL_SERVER_ERROR);
                }
            }),
        )?
        .post(
            "/",
            Handler::middleware_sync(|req, _res, next| {
                if req.body().is_empty() {
                    next.fail(HandlerError::new(400, "empty user payload"));
                    return;
                }
                next.call();
            }),
        )?
        .post(
            "/",
            Handler::endpoint_sync(|_req, res| {
                res.send_status(StatusCode::CREATED);
            }),
        )?;

    let mut api = Router::new();
    api.mount("/users", users)?;

    let mut app = app();
    app.use_with(RequestLogger::new())?;
    app.mount("/api", api)?;
    app.get(
        "/",
        Handler::endpoint_sync(|_req, res| {
            res.r#type(HeaderValue::from_static("text/plain; charset=utf-8"))
                .send("try GET /api/users/42");
        }),
    )?;
    app.mount(
        "/",
        Handler::error_aware_sync(|err, req, res, _next| {
            let route = req.mount_path().unwrap_or_default();
            res.status(err.status()).send(format!("{} (at {})", err, route));
        }),
    )?;

    let config = ServerConfig::from_env();
    let port = config.port;
    app.listen(config, || log::info!("🚀 Server listening on port {}", port))
        .await?;

    Ok(())
}
