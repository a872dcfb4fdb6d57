use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rmcp::{
    transport::stdio,
    transport::streamable_http_server::{
        session::local::LocalSessionManager, StreamableHttpService,
    },
    ServiceExt,
};
use tracing_subscriber::EnvFilter;

use tfstate_lib::StoreConfig;
use tfstate_mcp::{ServerOptions, TfstateServer};

#[derive(Parser, Debug)]
#[command(version, about = "Terraform state analysis MCP server")]
struct Cli {
    /// Transport protocol to serve MCP over.
    #[arg(long, value_enum, default_value = "stdio")]
    transport: Transport,

    /// Bind address for the streamable HTTP transport.
    #[arg(long, default_value = "127.0.0.1:8000")]
    bind: SocketAddr,

    /// Default S3 bucket used when a tool call omits bucket_name.
    #[arg(long, env = "TFSTATE_BUCKET_NAME")]
    bucket: Option<String>,

    /// Default AWS credential profile used when a tool call omits profile_name.
    #[arg(long)]
    profile: Option<String>,

    /// AWS region override for the S3 client.
    #[arg(long)]
    region: Option<String>,

    /// Custom endpoint URL for S3-compatible stores.
    #[arg(long)]
    endpoint_url: Option<String>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Transport {
    Stdio,
    StreamableHttp,
}

impl Cli {
    fn server_options(&self) -> ServerOptions {
        let mut store = StoreConfig::default();
        if let Some(profile) = &self.profile {
            store = store.with_profile(profile);
        }
        if let Some(region) = &self.region {
            store = store.with_region(region);
        }
        if let Some(endpoint_url) = &self.endpoint_url {
            store = store.with_endpoint_url(endpoint_url);
        }

        ServerOptions {
            default_bucket: self.bucket.clone(),
            store,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let server = TfstateServer::new(cli.server_options());

    tracing::info!(
        transport = ?cli.transport,
        default_bucket = cli.bucket.as_deref().unwrap_or("<none>"),
        "starting tfstate MCP server v{}",
        env!("CARGO_PKG_VERSION")
    );

    match cli.transport {
        Transport::Stdio => serve_stdio(server).await,
        Transport::StreamableHttp => serve_http(server, cli.bind).await,
    }
}

/// Logging goes to stderr only: on the stdio transport, stdout belongs to
/// the protocol.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

async fn serve_stdio(server: TfstateServer) -> Result<()> {
    let running = server
        .serve(stdio())
        .await
        .context("failed to start stdio transport")?;

    tracing::info!("server ready, waiting for requests on stdio");
    running.waiting().await.context("stdio transport failed")?;

    tracing::info!("server shutdown complete");
    Ok(())
}

async fn serve_http(server: TfstateServer, bind: SocketAddr) -> Result<()> {
    let service = StreamableHttpService::new(
        move || Ok(server.clone()),
        LocalSessionManager::default().into(),
        Default::default(),
    );

    let router = axum::Router::new().nest_service("/mcp", service);
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;

    tracing::info!("server ready, serving streamable HTTP at http://{bind}/mcp");
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("HTTP transport failed")?;

    tracing::info!("server shutdown complete");
    Ok(())
}
