mod cli;
mod config;
mod demo;

use clap::Parser;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, Flow, Repl};
use crate::config::Config;

const PROMPT: &str = "TWINKLY> ";

fn init_tracing() {
    // Diagnostics go to stderr so they never interleave with prompt output.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn prompt() {
    print!("{PROMPT}");
    let _ = std::io::stdout().flush();
}

async fn run_once(repl: &mut Repl, words: &[String]) -> anyhow::Result<()> {
    let line = words.join(" ");
    let command = match Command::parse(&line) {
        Ok(Some(command)) => command,
        Ok(None) => return Ok(()),
        Err(err) => anyhow::bail!("{err}"),
    };
    if command.needs_session() {
        repl.execute(Command::Connect(None)).await?;
    }
    repl.execute(command).await?;
    Ok(())
}

async fn run_prompt(repl: &mut Repl) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt();
    while let Some(line) = lines.next_line().await? {
        match Command::parse(&line) {
            Ok(Some(command)) => match repl.execute(command).await {
                Ok(Flow::Exit) => break,
                Ok(Flow::Continue) => {}
                Err(err) => {
                    tracing::debug!(target: "twinkly::cli", error = ?err, "command failed");
                    println!("An error occurred: {err:#}");
                }
            },
            Ok(None) => {}
            Err(err) => println!("{err}"),
        }
        prompt();
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env().with_overrides(&cli);
    tracing::info!(
        target: "twinkly::cli",
        host = %config.host,
        led_count = config.led_count,
        use_proxy = config.use_proxy,
        "starting"
    );

    let mut repl = Repl::new(config);
    let result = if cli.command.is_empty() {
        run_prompt(&mut repl).await
    } else {
        run_once(&mut repl, &cli.command).await
    };

    if let Err(err) = result {
        eprintln!("❌ {err:#}");
        std::process::exit(1);
    }
}
