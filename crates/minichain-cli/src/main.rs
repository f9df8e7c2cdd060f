use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "minichain-cli")]
#[command(about = "CLI client for a running minichain node")]
struct Cli {
    /// Node base URL (e.g. http://127.0.0.1:8080)
    #[arg(long, global = true, default_value = "http://127.0.0.1:8080")]
    node: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a transaction to the pending pool
    Submit {
        /// Sender
        #[arg(long)]
        sender: String,
        /// Recipient
        #[arg(long)]
        receiver: String,
        /// Amount
        #[arg(long)]
        amount: u64,
    },
    /// Mine the next block
    Mine,
    /// Print the full chain
    Chain,
    /// Check chain validity
    Validate,
    /// Register peer node addresses
    Peers {
        /// Peer URLs, e.g. http://127.0.0.1:5001
        addresses: Vec<String>,
    },
    /// Run longest-chain consensus against the registered peers
    Resolve,
}

#[derive(Serialize)]
struct Tx {
    sender: String,
    receiver: String,
    amount: u64,
}

#[derive(Serialize)]
struct Nodes {
    nodes: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .pretty()
        .init();

    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let node = cli.node;

    let res = match cli.cmd {
        Command::Submit {
            sender,
            receiver,
            amount,
        } => {
            let tx = Tx {
                sender,
                receiver,
                amount,
            };
            client
                .post(format!("{node}/transactions"))
                .json(&tx)
                .send()
                .await?
        }
        Command::Mine => client.get(format!("{node}/mine")).send().await?,
        Command::Chain => client.get(format!("{node}/chain")).send().await?,
        Command::Validate => client.get(format!("{node}/chain/valid")).send().await?,
        Command::Peers { addresses } => {
            client
                .post(format!("{node}/nodes"))
                .json(&Nodes { nodes: addresses })
                .send()
                .await?
        }
        Command::Resolve => client.get(format!("{node}/resolve")).send().await?,
    };

    let status = res.status();
    let body = res.text().await?;
    println!("status: {}", status);
    println!("{body}");
    Ok(())
}
