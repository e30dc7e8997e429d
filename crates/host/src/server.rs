//! Static-file serving for the configured applications.

use std::future::Future;
use std::net::SocketAddr;

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::config::HostConfig;

/// Router serving every application under its mount path.
pub fn router(config: &HostConfig) -> Router {
    let site = &config.site;
    let mut router = Router::new();

    for app in &site.application {
        let files = ServeDir::new(&app.physical_path).append_index_html_on_directories(true);
        debug!(
            path = app.mount_path(),
            "Serving {}",
            app.physical_path.display()
        );
        router = if app.is_root() {
            router.fallback_service(files)
        } else {
            router.nest_service(app.mount_path(), files)
        };
    }

    if site.windows_authentication {
        router = router.layer(middleware::from_fn(negotiate_challenge));
    }

    router.layer(TraceLayer::new_for_http())
}

/// Integrated authentication stand-in: anything carrying an `Authorization`
/// header passes, everything else gets the `Negotiate` challenge.
async fn negotiate_challenge(req: Request, next: Next) -> Response {
    if req.headers().contains_key(header::AUTHORIZATION) {
        return next.run(req).await;
    }
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Negotiate")],
    )
        .into_response()
}

/// Serve on `127.0.0.1:<port>` until `shutdown` resolves.
pub async fn serve<F>(config: HostConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = SocketAddr::from(([127, 0, 0, 1], config.site.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        site = %config.site.name,
        "Host listening on http://{}",
        addr
    );

    axum::serve(listener, router(&config))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Host stopped");
    Ok(())
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Ctrl-C handler unavailable: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!("SIGTERM handler unavailable: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
