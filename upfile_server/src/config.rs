use clap::Parser;

/// Runtime configuration, taken from flags or the environment.
#[derive(Parser, Debug, Clone)]
#[command(name = "upfile_server", about = "HTTP gateway for files stored on a public ledger")]
pub struct Config {
    /// Ledger node RPC host.
    #[arg(long, env = "LEDGER_RPC_HOST", default_value = "127.0.0.1")]
    pub ledger_rpc_host: String,

    /// Ledger node RPC port.
    #[arg(long, env = "LEDGER_RPC_PORT", default_value_t = 8332)]
    pub ledger_rpc_port: u16,

    /// Ledger node RPC user.
    #[arg(long, env = "LEDGER_RPC_USER")]
    pub ledger_rpc_user: String,

    /// Ledger node RPC password.
    #[arg(long, env = "LEDGER_RPC_PASSWORD", hide_env_values = true)]
    pub ledger_rpc_password: String,

    /// Network label, surfaced in startup logs only.
    #[arg(long, env = "NETWORK", default_value = "mainnet")]
    pub network: String,

    /// Address the HTTP server binds to.
    #[arg(long, env = "HTTP_HOST", default_value = "0.0.0.0")]
    pub http_host: String,

    /// Port the HTTP server binds to.
    #[arg(long, env = "HTTP_PORT", default_value_t = 80)]
    pub http_port: u16,
}

impl Config {
    pub fn rpc_endpoint(&self) -> String {
        format!("http://{}:{}/", self.ledger_rpc_host, self.ledger_rpc_port)
    }
}
