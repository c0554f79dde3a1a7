//! `doorgate` binary.
//!
//! `run` drives the control loop with a simulated reader and button fed
//! from stdin, a logging servo and a logging indicator:
//!
//! ```text
//! card 04abcdef   present a credential (hex)
//! press           pull the button low
//! release         let the button go
//! quit            stop the loop (EOF does the same)
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use doorgate_controller::{ControlLoop, EntryController};
use doorgate_core::config::{DoorgateConfig, Settings};
use doorgate_core::{Credential, DeviceId, EncryptionKey};
use doorgate_hardware::feedback;
use doorgate_hardware::mock::{
    LoggingIndicator, LoggingServo, MockButton, MockButtonHandle, MockReader, MockReaderHandle,
};
use doorgate_hardware::{ServoDrive, ServoProfile};
use doorgate_network::{AuthorizationClient, AuthorizationClientConfig};
use doorgate_protocol::{AuthorizationPayload, CredentialEncoder, OsIvSource};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, prelude::*};

#[derive(Parser)]
#[command(name = "doorgate")]
#[command(about = "Networked door access endpoint")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the control loop with a simulated reader and button on stdin
    Run {
        /// Configuration file
        #[arg(long, short)]
        config: PathBuf,
    },

    /// Validate a configuration file and print the effective settings
    CheckConfig {
        /// Configuration file
        #[arg(long, short)]
        config: PathBuf,
    },

    /// Seal one credential and print the request body
    Encode {
        /// AES-128 key, 32 hex digits
        #[arg(long)]
        key: String,

        /// Device UUID (random when omitted)
        #[arg(long)]
        device: Option<String>,

        /// Credential bytes in hex
        credential: String,
    },
}

/// One line of simulator input.
#[derive(Debug, PartialEq, Eq)]
enum SimCommand {
    Card(Credential),
    Press,
    Release,
    Quit,
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(env_filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run { config } => run(load_settings(&config)?).await,
        Commands::CheckConfig { config } => {
            let settings = load_settings(&config)?;
            println!("{}", describe(&settings));
            Ok(())
        }
        Commands::Encode {
            key,
            device,
            credential,
        } => {
            println!("{}", encode(&key, device.as_deref(), &credential)?);
            Ok(())
        }
    }
}

fn load_settings(path: &Path) -> Result<Settings> {
    let config = DoorgateConfig::load(path)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid configuration in {}", path.display()))
}

/// Human-readable summary of validated settings. The key is never printed.
fn describe(settings: &Settings) -> String {
    format!(
        "server:    {}:{}\n\
         timeouts:  connect {}ms, response {}ms, drain {}ms\n\
         device:    {}\n\
         timing:    movement {}ms, open {}ms, debounce {}ms, poll {}ms",
        settings.server.host,
        settings.server.port,
        settings.server.connect_timeout.as_millis(),
        settings.server.response_timeout.as_millis(),
        settings.server.drain_timeout.as_millis(),
        settings.device_id,
        settings.timing.movement.as_millis(),
        settings.timing.open.as_millis(),
        settings.timing.debounce.as_millis(),
        settings.poll_interval.as_millis(),
    )
}

async fn run(settings: Settings) -> Result<()> {
    let (reader, reader_handle) = MockReader::new();
    let (button, button_handle) = MockButton::new();
    let drive = ServoDrive::new(LoggingServo::new(), ServoProfile::default())?;

    let (feedback, worker) = feedback::channel(LoggingIndicator);
    let worker = tokio::spawn(worker.run());

    let controller = EntryController::new(drive, settings.timing, Instant::now())?;
    let client = AuthorizationClient::new(
        AuthorizationClientConfig::from(&settings.server),
        settings.device_id,
        settings.key,
    );
    info!(
        device = %client.device_id(),
        server = %format!("{}:{}", settings.server.host, settings.server.port),
        "Endpoint ready"
    );

    let mut control = ControlLoop::new(
        reader,
        button,
        controller,
        client,
        feedback,
        settings.poll_interval,
    );

    let (quit_tx, quit_rx) = oneshot::channel();
    tokio::spawn(simulate(reader_handle, button_handle, quit_tx));

    let shutdown = async {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => info!("Interrupted"),
            _ = quit_rx => {}
        }
    };
    control.run(shutdown).await?;

    // Dropping the loop closes the feedback channel; let queued patterns finish.
    drop(control);
    worker.await.context("Feedback worker panicked")?;
    Ok(())
}

/// Feed stdin lines into the simulated peripherals until `quit` or EOF.
async fn simulate(reader: MockReaderHandle, button: MockButtonHandle, quit: oneshot::Sender<()>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "Failed to read stdin");
                break;
            }
        };

        match parse_command(&line) {
            Ok(Some(SimCommand::Card(credential))) => {
                if let Err(e) = reader.present(credential).await {
                    warn!(error = %e, "Reader gone");
                    break;
                }
            }
            Ok(Some(SimCommand::Press)) => button.press(),
            Ok(Some(SimCommand::Release)) => button.release(),
            Ok(Some(SimCommand::Quit)) => break,
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Ignoring input"),
        }
    }

    let _ = quit.send(());
}

fn parse_command(line: &str) -> Result<Option<SimCommand>> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "card" => {
            let hex = words.next().context("usage: card <hex>")?;
            SimCommand::Card(Credential::from_hex(hex)?)
        }
        "press" => SimCommand::Press,
        "release" => SimCommand::Release,
        "quit" | "exit" => SimCommand::Quit,
        other => bail!("unknown command '{other}'"),
    };

    if words.next().is_some() {
        bail!("trailing input after '{verb}'");
    }
    Ok(Some(command))
}

fn encode(key: &str, device: Option<&str>, credential: &str) -> Result<String> {
    let key = EncryptionKey::from_hex(key).context("Invalid key")?;
    let device_id = match device {
        Some(id) => id.parse::<DeviceId>()?,
        None => DeviceId::generate(),
    };
    let credential = Credential::from_hex(credential)?;

    let mut encoder = CredentialEncoder::new(key, OsIvSource);
    let sealed = encoder.seal(credential.as_bytes())?;
    Ok(AuthorizationPayload::new(&device_id, &sealed).to_json()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use doorgate_protocol::decrypt_block;
    use rstest::rstest;
    use std::io::Write;

    const KEY: &str = "2b7e151628aed2a6abf7158809cf4f3c";
    const DEVICE: &str = "6f9619ff-8b86-d011-b42d-00c04fc964ff";

    #[rstest]
    #[case("press", SimCommand::Press)]
    #[case("  RELEASE ", SimCommand::Release)]
    #[case("quit", SimCommand::Quit)]
    #[case("exit", SimCommand::Quit)]
    fn test_parse_simple_commands(#[case] line: &str, #[case] expected: SimCommand) {
        assert_eq!(parse_command(line).unwrap(), Some(expected));
    }

    #[test]
    fn test_parse_card() {
        let command = parse_command("card 04ABcdef").unwrap();
        assert_eq!(
            command,
            Some(SimCommand::Card(Credential::new(vec![0x04, 0xAB, 0xCD, 0xEF]).unwrap()))
        );
    }

    #[rstest]
    #[case("card")]
    #[case("card zz")]
    #[case("press now")]
    #[case("open")]
    fn test_parse_rejects(#[case] line: &str) {
        assert!(parse_command(line).is_err());
    }

    #[test]
    fn test_blank_line_is_ignored() {
        assert_eq!(parse_command("   ").unwrap(), None);
    }

    #[test]
    fn test_encode_produces_decryptable_body() {
        let body = encode(KEY, Some(DEVICE), "12345678").unwrap();
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["UUID"], DEVICE);

        let iv: [u8; 16] = hex::decode(json["iv"].as_str().unwrap())
            .unwrap()
            .try_into()
            .unwrap();
        let content: [u8; 16] = hex::decode(json["content"].as_str().unwrap())
            .unwrap()
            .try_into()
            .unwrap();

        let key = EncryptionKey::from_hex(KEY).unwrap();
        assert_eq!(decrypt_block(&key, &iv, &content).unwrap(), vec![0x12, 0x34, 0x56, 0x78]);
    }

    #[test]
    fn test_encode_rejects_bad_input() {
        assert!(encode("abcd", None, "12345678").is_err());
        assert!(encode(KEY, Some("not-a-uuid"), "12345678").is_err());
        assert!(encode(KEY, None, "").is_err());
        assert!(encode(KEY, None, &"ab".repeat(16)).is_err());
    }

    #[test]
    fn test_describe_hides_key() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "[server]\nhost = \"auth.local\"\nport = 8080\n\n[device]\nid = \"{DEVICE}\"\nkey = \"{KEY}\"\n"
        )
        .unwrap();

        let settings = DoorgateConfig::from_file(file.path())
            .unwrap()
            .validate()
            .unwrap();
        let text = describe(&settings);

        assert!(text.contains("auth.local:8080"));
        assert!(text.contains(DEVICE));
        assert!(!text.contains(KEY));
    }
}
