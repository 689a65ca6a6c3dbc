//! watchdog-guard operator CLI
//!
//! Startup checks, key generation and manual token encryption for the bot's
//! access gate and credential cipher.

use anyhow::{Context, bail};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use std::io::Read;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use watchdog_guard::{
    AppConfig, SecurityContext, TokenCipher,
    config::{LogFormat, load_config},
    dispatch::{CallbackEvent, DenialReply, InboundEvent, MessageEvent, Responder, Sender},
    error::DispatchError,
    generate_secret_key,
};

/// Access gate and credential cipher for the watchdog bot
#[derive(Parser, Debug)]
#[command(name = "watchdog-guard")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "WATCHDOG_GUARD_CONFIG")]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long, env = "WATCHDOG_GUARD_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format; overrides the config file
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate SECRET_KEY and report the access mode
    Check,
    /// Print a fresh random value for SECRET_KEY
    GenerateKey,
    /// Encrypt a token (reads stdin when TEXT is omitted)
    Encrypt { text: Option<String> },
    /// Decrypt a token (reads stdin when TOKEN is omitted)
    Decrypt { token: Option<String> },
    /// Run a simulated event from USER_ID through the startup check and middleware chain
    Access {
        user_id: u64,
        #[arg(long)]
        username: Option<String>,
        /// Simulate a button press instead of a message
        #[arg(long)]
        callback: bool,
        /// Print the decision as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Prints denial replies to stdout
struct ConsoleResponder;

#[async_trait]
impl Responder for ConsoleResponder {
    async fn respond(&self, reply: DenialReply) -> Result<(), DispatchError> {
        println!("{}", reply.text());
        Ok(())
    }
}

fn init_logging(config: &AppConfig, args: &Args) {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(config.logging.level.as_str());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let format = args.log_format.unwrap_or(config.logging.format);

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}

fn read_input(arg: Option<String>) -> anyhow::Result<String> {
    match arg {
        Some(value) => Ok(value),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            Ok(buf.trim_end_matches(['\r', '\n']).to_string())
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // .env is optional
    let _ = dotenvy::dotenv();

    let config = load_config(args.config.as_deref()).context("Failed to load configuration")?;
    init_logging(&config, &args);

    match args.command {
        Command::GenerateKey => {
            println!("{}", generate_secret_key());
        }
        Command::Check => {
            let context = SecurityContext::from_config(&config)
                .inspect_err(|e| error!(error = %e, "Security check failed"))?;
            info!(mode = %context.report.access_mode, "Security check passed");
        }
        Command::Encrypt { text } => {
            let cipher = TokenCipher::from_config(&config.security);
            let plaintext = read_input(text)?;
            match cipher.encrypt_token(&plaintext) {
                Some(token) => println!("{token}"),
                None => bail!("encryption failed"),
            }
        }
        Command::Decrypt { token } => {
            let cipher = TokenCipher::from_config(&config.security);
            let token = read_input(token)?;
            match cipher.decrypt_token(&token) {
                Some(plaintext) => println!("{plaintext}"),
                None => bail!("decryption failed"),
            }
        }
        Command::Access {
            user_id,
            username,
            callback,
            json,
        } => {
            let context = SecurityContext::from_config(&config)?;

            let mut sender = Sender::new(user_id);
            sender.username = username;
            let event: InboundEvent = if callback {
                CallbackEvent::new(sender, "ping").into()
            } else {
                MessageEvent::text(sender, "/start").into()
            };

            let outcome = context
                .middleware
                .handle(&event, &ConsoleResponder, || {
                    context
                        .event_logger
                        .handle(&event, || async { Ok::<_, DispatchError>("handler ran") })
                })
                .await;

            if json {
                let decision = watchdog_guard::AccessDecision {
                    allowed: !outcome.is_denied(),
                    user_id,
                    username: event.username().map(str::to_string),
                };
                println!("{}", serde_json::to_string(&decision)?);
            } else if let Some(result) = outcome.handled() {
                println!("{}", result?);
            }
        }
    }

    Ok(())
}
