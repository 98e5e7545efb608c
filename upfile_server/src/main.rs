use clap::Parser;
use file_reconstruction::{EncodingProfile, FileReader};
use ledger_client::RpcClient;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};
use upfile_server::{Config, HealthState, Server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "upfile_server=info,file_reconstruction=info".into()),
        )
        .with(fmt::layer())
        .init();

    let config = Config::parse();
    info!(network = %config.network, "starting file gateway");

    let rpc = RpcClient::new(
        &config.rpc_endpoint(),
        &config.ledger_rpc_user,
        &config.ledger_rpc_password,
    )?;
    let reader = FileReader::new(rpc, EncodingProfile::upfile());

    let server = Server::new(reader, HealthState::new(), &config.http_host, config.http_port);
    server.run().await
}
