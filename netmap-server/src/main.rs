use std::process;

use netmap_core::Store;
use netmap_server::state::AppState;
use netmap_server::{cli, handlers, ingest};

#[tokio::main]
async fn main() {
    let args = cli::parse();

    // install global collector configured based on RUST_LOG env var.
    tracing_subscriber::fmt::init();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting {}", env!("CARGO_PKG_NAME"));

    let mut store = Store::new();
    if let Some(seed_path) = &args.seed_path {
        if let Err(e) = ingest::load_seed(&mut store, seed_path) {
            tracing::error!(error = ?e, path = %seed_path.display(), "error loading seed data");
            process::exit(exitcode::DATAERR);
        }
    }

    let listener = match tokio::net::TcpListener::bind(args.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = ?e, addr = %args.bind_addr, "error binding listener");
            process::exit(exitcode::OSERR);
        }
    };

    tracing::info!(addr = %args.bind_addr, "listening");

    let router = handlers::router(AppState::new(store)).layer(tower_http::trace::TraceLayer::new_for_http());

    if let Err(e) = axum::serve(listener, router).await {
        tracing::error!(error = ?e, "server error");
        process::exit(exitcode::SOFTWARE);
    }
}
