use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "relay")]
#[command(about = "Relay CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory and default files (config and an editable training definition).
    Init {
        /// Config file path (default: RELAY_CONFIG_PATH or ~/.relay/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,
    },

    /// Run the gateway (HTTP). The assistant workspace is resolved or created on the first message.
    Gateway {
        /// Config file path (default: RELAY_CONFIG_PATH or ~/.relay/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// HTTP port (default from config or 3000)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Chat with the assistant through a running gateway (interactive).
    Chat {
        /// Config file path (default: RELAY_CONFIG_PATH or ~/.relay/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("relay {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init { config }) => {
            if let Err(e) = run_init(config) {
                log::error!("init failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Gateway { config, port }) => {
            if let Err(e) = run_gateway(config, port).await {
                log::error!("gateway failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Chat { config }) => {
            if let Err(e) = run_chat(config).await {
                log::error!("chat failed: {}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn run_init(config_path: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(relay_core::config::default_config_path);
    let dir = relay_core::init::init_config_dir(&path)?;
    println!("initialized configuration at {}", dir.display());
    Ok(())
}

async fn run_gateway(
    config_path: Option<std::path::PathBuf>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let (mut config, path) = relay_core::config::load_config(config_path)?;
    if let Some(p) = port {
        config.gateway.port = p;
    }
    log::info!("starting gateway on {}:{}", config.gateway.bind, config.gateway.port);
    relay_core::gateway::run_gateway(config, path).await
}

/// One conversation: the first turn sends empty text so the assistant can greet; each reply's
/// `context` is sent back with the next turn.
async fn run_chat(config_path: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    use std::io::{self, Write};

    let (config, _) = relay_core::config::load_config(config_path)?;
    let url = format!(
        "http://{}:{}/api/message",
        config.gateway.bind.trim(),
        config.gateway.port
    );
    let client = reqwest::Client::new();
    let mut context: Option<Value> = None;

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut input = String::new();

    loop {
        match send_turn(&client, &url, &input, context.take()).await {
            Ok(reply) => {
                context = reply.get("context").cloned();
                for line in reply_lines(&reply) {
                    println!("< {}", line);
                }
            }
            Err(e) => {
                eprintln!("chat error: {}", e);
            }
        }

        input = loop {
            write!(stdout, "> ")?;
            stdout.flush()?;
            let mut line = String::new();
            if stdin.read_line(&mut line)? == 0 {
                return Ok(());
            }
            let line = line.trim().to_string();
            if line.eq_ignore_ascii_case("/exit") || line.eq_ignore_ascii_case("/quit") {
                return Ok(());
            }
            if !line.is_empty() {
                break line;
            }
        };
    }
}

async fn send_turn(
    client: &reqwest::Client,
    url: &str,
    text: &str,
    context: Option<Value>,
) -> anyhow::Result<Value> {
    let mut body = json!({ "input": { "text": text } });
    if let Some(ctx) = context {
        body["context"] = ctx;
    }
    let res = client.post(url).json(&body).send().await?;
    let status = res.status();
    if !status.is_success() {
        let text = res.text().await.unwrap_or_default();
        anyhow::bail!("{} {}", status, text);
    }
    Ok(res.json().await?)
}

/// Lines of `output.text` (an array of strings in the assistant response).
fn reply_lines(reply: &Value) -> Vec<&str> {
    reply
        .get("output")
        .and_then(|o| o.get("text"))
        .and_then(|t| t.as_array())
        .map(|a| a.iter().filter_map(|v| v.as_str()).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_lines_reads_output_text() {
        let reply = json!({ "output": { "text": ["Hello.", "How can I help?"] } });
        assert_eq!(reply_lines(&reply), ["Hello.", "How can I help?"]);
        assert!(reply_lines(&json!({})).is_empty());
    }
}
