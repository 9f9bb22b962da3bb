use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tonic::transport::Server;
use tracing_subscriber::EnvFilter;

use dip_judge_engine::config::{load_config, load_default_config};
use dip_judge_engine::judge::registry::Judge;
use dip_judge_engine::server::proto::judge_service_server::JudgeServiceServer;
use dip_judge_engine::server::JudgeServer;

#[derive(Parser)]
#[command(name = "dip-judge-engine", about = "Diplomacy judge front-end gRPC server")]
struct Cli {
    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "DIP_JUDGE_PORT")]
    port: Option<u16>,

    /// Path to judge.toml (default: auto-discover)
    #[arg(long, env = "DIP_JUDGE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cli = Cli::parse();

    let mut config = match cli.config {
        Some(ref path) => load_config(path).map_err(|e| format!("{e}"))?,
        None => load_default_config(),
    };
    if let Some(port) = cli.port {
        config.port = port;
    }
    let port = config.port;

    tracing::info!(
        press = config.press.name(),
        deadline_hours = config.deadline_hours,
        auto_process = config.auto_process,
        "judge configured"
    );

    let server = JudgeServer::new(Judge::new(config));

    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    tracing::info!(%addr, "starting gRPC server");

    Server::builder()
        .add_service(JudgeServiceServer::new(server))
        .serve(addr)
        .await?;

    Ok(())
}
