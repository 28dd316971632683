mod app;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use listenfd::ListenFd;
use reactviews::ViewsConfig;
use tokio::{net::TcpListener, signal};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::create_app;

/// Serve React templates from a views directory
#[derive(Parser, Debug)]
#[command(name = "reactviews-demo")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Host address to bind the server to
    #[arg(long, short = 'H', default_value = "0.0.0.0", env = "HOST")]
    host: String,

    /// Port to listen on
    #[arg(long, short, default_value = "3000", env = "PORT")]
    port: u16,

    /// Directory holding the templates
    #[arg(long, env = "VIEWS_DIR")]
    views: Option<PathBuf>,

    /// Environment name ("development" reloads templates on every request)
    #[arg(long, env = "VIEWS_ENV")]
    env: Option<String>,

    /// Bundle defining React and ReactDOMServer
    #[arg(long, env = "VIEWS_RENDERER_BUNDLE")]
    renderer: Option<PathBuf>,

    /// Babel standalone bundle used to compile JSX templates
    #[arg(long, env = "VIEWS_BABEL_BUNDLE")]
    babel: Option<PathBuf>,
}

impl Cli {
    /// Apply command-line overrides on top of the environment configuration.
    fn views_config(&self) -> ViewsConfig {
        let mut config = ViewsConfig::from_env();
        if let Some(views) = &self.views {
            config.views_dir = views.clone();
        }
        if let Some(env) = &self.env {
            config.env = env.clone();
        }
        if let Some(renderer) = &self.renderer {
            config.renderer_bundle = renderer.clone();
        }
        if self.babel.is_some() {
            config.babel_bundle = self.babel.clone();
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Template console output arrives under the reactviews::js target
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "reactviews=debug,reactviews_demo=debug,tower_http=debug".into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = cli.views_config();
    let engines = config.build()?;

    tracing::info!(
        views = %config.views_dir.display(),
        env = %config.env,
        development = config.is_development(),
        "View engines ready"
    );

    let app = create_app(engines);

    // Auto-reload support via listenfd
    let mut listenfd = ListenFd::from_env();
    let listener = match listenfd.take_tcp_listener(0)? {
        Some(listener) => {
            listener.set_nonblocking(true)?;
            TcpListener::from_std(listener)?
        }
        None => {
            let addr = format!("{}:{}", cli.host, cli.port);
            TcpListener::bind(&addr).await?
        }
    };

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Resolve once the process is asked to stop.
///
/// Listens for Ctrl+C everywhere and SIGTERM on unix. A handler that cannot
/// be installed is logged and never fires.
async fn shutdown_signal() {
    let interrupt = async {
        match signal::ctrl_c().await {
            Ok(()) => "SIGINT",
            Err(e) => {
                tracing::warn!(error = %e, "Ctrl+C handler unavailable");
                std::future::pending().await
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                "SIGTERM"
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<&'static str>();

    let received = tokio::select! {
        name = interrupt => name,
        name = terminate => name,
    };
    tracing::info!(signal = received, "Shutting down, draining open requests");
}
