//! Interactive terminal chat for the energy audit.
//!
//! Reads one message per line from stdin and prints the assistant's reply.
//! Configure with `AUDIT_ASSISTANT__*` environment variables or a `.env` file.

use std::error::Error;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use audit_assistant::adapters::OpenAIProvider;
use audit_assistant::application::{AuditAssistant, AuditSession, GenerationSettings};
use audit_assistant::config::{AppConfig, LogFormat, LoggingConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::load()?;
    config.validate()?;
    init_tracing(&config.logging)?;

    let assistant = if config.ai.enabled {
        let provider = OpenAIProvider::new(config.ai.to_openai_config())?;
        tracing::info!(model = %config.ai.model, base_url = %config.ai.base_url, "model enabled");
        AuditAssistant::new(Arc::new(provider))
    } else {
        tracing::info!("model disabled, simulator only");
        AuditAssistant::simulator_only()
    }
    .with_settings(GenerationSettings {
        temperature: config.ai.temperature,
        max_tokens: config.ai.max_tokens,
    });

    let mut session = AuditSession::new(Arc::new(assistant));
    for turn in session.history() {
        println!("{}\n", turn.text);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let message = line.trim();
        if message.is_empty() {
            continue;
        }

        let update = session.send(message).await;
        println!("\n{}\n", update.reply.result.reply_text);
        if let Some(stage) = update.advanced_to {
            println!("[{}]", stage.label());
        }
        if let Some(announcement) = update.announcement {
            println!("{}\n", announcement);
        }
        if update.finished {
            println!("{}", serde_json::to_string_pretty(session.profile())?);
            break;
        }
    }

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) -> Result<(), Box<dyn Error>> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(logging.env_filter()?)
        .with_writer(std::io::stderr);

    let installed = match logging.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.try_init(),
    };
    installed.map_err(|err| err as Box<dyn Error>)
}
