use anyhow::{Context, Result, bail};
use clap::Parser;
use std::fmt;
use twinkly_client::{DeviceMode, Session};

use crate::config::Config;
use crate::demo::demo_movie;

#[derive(Parser, Debug)]
#[command(name = "twinkly")]
#[command(about = "Interactive controller for Twinkly LED devices")]
pub struct Cli {
    /// Device hostname or IP address (overrides TWINKLY_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Number of LEDs on the strand (overrides TWINKLY_LED_COUNT)
    #[arg(long)]
    pub led_count: Option<usize>,

    /// Delay between movie frames in milliseconds
    #[arg(long)]
    pub frame_delay: Option<u32>,

    /// Proxy URL used when proxying is enabled (overrides TWINKLY_PROXY)
    #[arg(long)]
    pub proxy: Option<String>,

    /// Route device traffic through the proxy from the start
    #[arg(long)]
    pub use_proxy: bool,

    /// Run a single command after connecting instead of starting the prompt,
    /// e.g. `twinkly -- set-mode off`
    #[arg(trailing_var_arg = true)]
    pub command: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Connect(Option<String>),
    Disconnect,
    SetMode(DeviceMode),
    SendDemo,
    EnableProxy,
    DisableProxy,
    Help,
    Exit,
}

pub const COMMANDS: &[(&str, &str)] = &[
    (
        "connect",
        "Connects to the given IP/hostname, or the configured default if none is given",
    ),
    ("disconnect", "Abandons the current session"),
    (
        "set-mode",
        "Sets the controller mode. Valid modes are {modes}",
    ),
    (
        "send-demo",
        "Uploads a two-frame demo movie to the connected controller and plays it",
    ),
    (
        "enable-proxy",
        "Routes traffic of the next connection through the configured proxy",
    ),
    ("disable-proxy", "Stops routing new connections through the proxy"),
    ("help", "Lists supported commands"),
    ("exit", "Exits the prompt"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    Unknown,
    Invalid(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Unknown => f.write_str("Unknown command"),
            ParseError::Invalid(message) => f.write_str(message),
        }
    }
}

impl Command {
    /// Parses one prompt line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> std::result::Result<Option<Command>, ParseError> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Ok(None);
        };
        // Commands take at most one parameter.
        let arg = words.next();

        let command = match name {
            "connect" => Command::Connect(arg.map(str::to_string)),
            "disconnect" => Command::Disconnect,
            "set-mode" => {
                let mode = arg.ok_or_else(|| {
                    ParseError::Invalid(format!("set-mode requires a mode ({})", mode_names()))
                })?;
                let mode = mode
                    .parse::<DeviceMode>()
                    .map_err(|_| ParseError::Invalid(format!("Unsupported mode '{mode}'")))?;
                Command::SetMode(mode)
            }
            "send-demo" => Command::SendDemo,
            "enable-proxy" => Command::EnableProxy,
            "disable-proxy" => Command::DisableProxy,
            "help" => Command::Help,
            "exit" | "quit" => Command::Exit,
            other => {
                tracing::debug!(target: "twinkly::cli", command = other, "unknown command");
                return Err(ParseError::Unknown);
            }
        };
        Ok(Some(command))
    }

    /// Commands that act on a device; one-shot mode connects before running them.
    pub fn needs_session(&self) -> bool {
        matches!(
            self,
            Command::Disconnect | Command::SetMode(_) | Command::SendDemo
        )
    }
}

/// Mode names accepted by `set-mode`, e.g. `off, movie, demo, realtime`.
pub fn mode_names() -> String {
    DeviceMode::ALL
        .iter()
        .map(DeviceMode::display_name)
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn help_text() -> String {
    COMMANDS
        .iter()
        .map(|(name, help)| {
            let help = help.replace("{modes}", &mode_names());
            format!("{name:<14} - {help}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Prompt state: the one outstanding session and the proxy toggle.
pub struct Repl {
    config: Config,
    session: Option<Session>,
    use_proxy: bool,
}

impl Repl {
    pub fn new(config: Config) -> Self {
        let use_proxy = config.use_proxy;
        Self {
            config,
            session: None,
            use_proxy,
        }
    }

    #[cfg(test)]
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    #[cfg(test)]
    pub fn proxy_enabled(&self) -> bool {
        self.use_proxy
    }

    fn require_session(&self) -> Result<&Session> {
        match &self.session {
            Some(session) => Ok(session),
            None => bail!(
                "This command requires an active session. Use the \"connect\" command to begin one."
            ),
        }
    }

    pub async fn execute(&mut self, command: Command) -> Result<Flow> {
        tracing::debug!(target: "twinkly::cli", ?command, "executing");
        match command {
            Command::Connect(host) => {
                let host = host.unwrap_or_else(|| self.config.host.clone());
                println!("Connecting to Twinkly device at {host}");
                // The current session survives a failed attempt.
                let transport = self.config.transport(self.use_proxy);
                let session = Session::connect_with(&host, &transport)
                    .await
                    .with_context(|| format!("failed to connect to {host}"))?;
                self.session = Some(session);
                println!("Connected!");
            }
            Command::Disconnect => {
                self.require_session()?;
                self.session = None;
                println!("Session abandoned");
            }
            Command::SetMode(mode) => {
                self.require_session()?
                    .set_mode(mode)
                    .await
                    .with_context(|| format!("failed to set mode {}", mode.display_name()))?;
                println!("Mode set to {}", mode.display_name());
            }
            Command::SendDemo => {
                let session = self.require_session()?;
                println!("Creating new movie");
                let movie = demo_movie(self.config.led_count, self.config.frame_delay_ms)?;
                println!("Uploading movie ...");
                session
                    .upload_movie(&movie)
                    .await
                    .context("failed to upload demo movie")?;
                println!("Setting mode to movie...");
                session
                    .set_mode(DeviceMode::Movie)
                    .await
                    .context("failed to start movie playback")?;
                println!("Demo playing");
            }
            Command::EnableProxy => {
                self.use_proxy = true;
                println!("Proxy {} enabled for new connections", self.config.proxy);
            }
            Command::DisableProxy => {
                self.use_proxy = false;
                println!("Proxy disabled for new connections");
            }
            Command::Help => println!("{}", help_text()),
            Command::Exit => return Ok(Flow::Exit),
        }
        Ok(Flow::Continue)
    }
}
