use clap::Parser;
use idmesh::{build_router, AppState, IdentityResolver, ServiceConfig};
use std::net::SocketAddr;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "idmeshd", version, about = "Contact identity reconciliation service")]
struct Cli {
    /// Socket address to bind, e.g. 127.0.0.1:3000
    #[arg(long, env = "IDMESH_LISTEN")]
    listen: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "idmesh=info,info".to_string()),
        )
        .init();

    let cli = Cli::parse();
    let mut config = ServiceConfig::default();
    if let Some(listen) = cli.listen {
        config.listen = listen;
    }

    let state = AppState::new(IdentityResolver::new());
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.listen).await?;
    info!("idmesh listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
