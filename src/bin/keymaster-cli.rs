use clap::{Parser, Subcommand};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use std::io::Write;

#[derive(Parser)]
#[command(name = "keymaster-cli")]
#[command(about = "Client for keymasterd", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:7878", env = "KEYMASTER_URL")]
    url: String,

    #[arg(long, env = "KEYMASTERD_USERNAME")]
    username: Option<String>,

    #[arg(long, env = "KEYMASTERD_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the daemon is up
    Health,
    /// Fetch a secret; the daemon will ask the user to confirm
    Get {
        /// Key name
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let request = match &cli.command {
        Commands::Health => client.get(format!("{base}/health")),
        Commands::Get { name } => {
            let encoded = utf8_percent_encode(name, NON_ALPHANUMERIC);
            let request = client.get(format!("{base}/key/{encoded}"));
            match &cli.username {
                Some(username) => request.basic_auth(username, cli.password.as_deref()),
                None => request,
            }
        }
    };

    let res = request.send().await?;
    let status = res.status();
    let body = res.bytes().await?;

    if !status.is_success() {
        eprintln!("Error: keymasterd returned status {}", status);
        if !body.is_empty() {
            eprintln!("Response: {}", String::from_utf8_lossy(&body));
        }
        std::process::exit(1);
    }

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&body)?;
    if matches!(cli.command, Commands::Health) {
        writeln!(stdout)?;
    }
    Ok(())
}
