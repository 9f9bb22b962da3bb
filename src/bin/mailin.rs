//! Mail intake CLI — deliver one inbound email to a running judge and
//! print the replies it queues.
//!
//! Usage:
//!   cargo run --bin mailin -- --from player@example.com --subject "JOIN demo"
//!   echo "ORDERS\nF LON-NTH\nEND" | cargo run --bin mailin -- --from england@example.com

use std::io::Read;
use std::path::PathBuf;

use clap::Parser;

use dip_judge_engine::server::proto::judge_service_client::JudgeServiceClient;
use dip_judge_engine::server::proto::{FetchOutboundRequest, SubmitEmailRequest};

#[derive(Parser)]
#[command(name = "mailin", about = "Pipe an inbound email into a running judge")]
struct Cli {
    /// Judge endpoint
    #[arg(long, default_value = "http://127.0.0.1:50051", env = "DIP_JUDGE_ADDR")]
    addr: String,

    /// Sender address
    #[arg(long = "from")]
    from_addr: String,

    /// Subject line
    #[arg(long, default_value = "")]
    subject: String,

    /// Read the body from this file instead of stdin
    #[arg(long)]
    file: Option<PathBuf>,

    /// Also drain and print the judge's outbound queue afterwards
    #[arg(long, default_value = "true")]
    fetch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let body = match &cli.file {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let mut client = JudgeServiceClient::connect(cli.addr.clone()).await?;
    let response = client
        .submit_email(SubmitEmailRequest {
            subject: cli.subject.clone(),
            body,
            from_email: cli.from_addr.clone(),
        })
        .await?
        .into_inner();

    if response.handled {
        println!("accepted: command handled by the judge");
    } else {
        println!("ignored: the judge did not recognize a command");
    }

    if cli.fetch {
        let outbound = client
            .fetch_outbound(FetchOutboundRequest {})
            .await?
            .into_inner();
        for email in outbound.emails {
            println!("--- to: {} | subject: {}", email.to, email.subject);
            println!("{}", email.body);
        }
    }

    Ok(())
}
