//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::TapConfig;
use crate::error::{Error, Result};
use crate::messages::Message;
use crate::tap::KlaviyoTap;
use std::fs;
use std::io::Write;
use std::path::Path;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Check => self.check().await,
            Commands::Discover => self.discover().await,
            Commands::Read { output } => self.read(output.as_deref()).await,
        }
    }

    /// Load the tap configuration from --config or --config-json
    fn load_config(&self) -> Result<TapConfig> {
        if let Some(json) = &self.cli.config_json {
            return TapConfig::from_json(json);
        }
        if let Some(path) = &self.cli.config {
            return TapConfig::from_file(path);
        }
        Err(Error::config(
            "Configuration not specified (use --config or --config-json)",
        ))
    }

    /// Run the connection check
    async fn check(&self) -> Result<()> {
        let tap = KlaviyoTap::new(self.load_config()?)?;
        let result = tap.check().await?;

        match self.cli.format {
            OutputFormat::Json => println!("{}", serde_json::to_string(&result)?),
            OutputFormat::Pretty => {
                if result.success {
                    println!("Connection OK");
                } else {
                    println!(
                        "Connection failed: {}",
                        result.message.as_deref().unwrap_or("unknown error")
                    );
                }
            }
        }

        if result.success {
            Ok(())
        } else {
            Err(Error::connection_check(
                result.message.unwrap_or_else(|| "unknown error".to_string()),
            ))
        }
    }

    /// Print the stream catalog
    async fn discover(&self) -> Result<()> {
        let tap = KlaviyoTap::new(self.load_config()?)?;
        let catalog = tap.discover()?;

        match self.cli.format {
            OutputFormat::Json => println!("{}", serde_json::to_string(&catalog)?),
            OutputFormat::Pretty => {
                for stream in &catalog.streams {
                    println!("{} (primary key: {})", stream.name, stream.primary_key.join(", "));
                }
            }
        }
        Ok(())
    }

    /// Read all streams and write messages
    async fn read(&self, output: Option<&Path>) -> Result<()> {
        let mut tap = KlaviyoTap::new(self.load_config()?)?;
        let messages = tap.read().await?;

        let mut writer: Box<dyn Write> = match output {
            Some(path) => Box::new(fs::File::create(path)?),
            None => Box::new(std::io::stdout().lock()),
        };

        for message in &messages {
            match self.cli.format {
                OutputFormat::Json => {
                    writeln!(writer, "{}", serde_json::to_string(message)?)?;
                }
                OutputFormat::Pretty => match message {
                    Message::Schema { stream, .. } => {
                        writeln!(writer, "SCHEMA {stream}")?;
                    }
                    Message::Record { stream, record, .. } => {
                        writeln!(writer, "RECORD {stream}: {record}")?;
                    }
                    Message::Log { level, message } => {
                        writeln!(writer, "LOG [{level:?}] {message}")?;
                    }
                },
            }
        }
        writer.flush()?;

        let stats = tap.stats();
        eprintln!(
            "Synced {} records from {} list(s) in {}ms",
            stats.records_synced, stats.lists_synced, stats.duration_ms
        );

        Ok(())
    }
}
