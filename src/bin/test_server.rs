// Standalone local application server for the `local` environment

use std::net::SocketAddr;
use tracing::Level;

use dashprobe::environment::CredentialSet;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    // Parse port from args or use the local environment's default
    let port: u16 = std::env::args()
        .nth(1)
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));

    let credentials = CredentialSet::from_lookup(&|key: &str| std::env::var(key).ok());
    dashprobe::mock_app::serve(addr, &credentials).await
}
