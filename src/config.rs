use chrono::{Local, NaiveDate};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use crate::core::rate_limiter::ADAPTER_PAUSE;

pub const DEFAULT_OUTPUT: &str = "public/rates.json";
pub const DEFAULT_DEBUG_DIR: &str = "tools/_debug";

/// Daily builder for Uzbek banks' buy/sell exchange rates.
#[derive(Parser, Debug, Default)]
#[command(name = "bank-rates", version)]
pub struct Cli {
    /// Run a single bank (hamkorbank, agrobank, kapitalbank, ipakyulibank, tbcbank)
    pub bank: Option<String>,

    /// Save every fetched page under tools/_debug
    #[arg(long)]
    pub debug: bool,
}

/// Explicit settings for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub date: NaiveDate,
    /// Only run the adapter with this id.
    pub only: Option<String>,
    pub debug_dir: Option<PathBuf>,
    pub output: PathBuf,
    /// Pause between adapters.
    pub pause: Duration,
    /// Query the central bank when no adapter produced rates.
    pub fallback: bool,
}

impl RunConfig {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            only: None,
            debug_dir: None,
            output: PathBuf::from(DEFAULT_OUTPUT),
            pause: ADAPTER_PAUSE,
            fallback: true,
        }
    }

    pub fn from_cli(cli: Cli) -> Self {
        let mut config = Self::new(Local::now().date_naive());
        // non-alphabetic tokens never name a bank and are ignored
        config.only = cli.bank.filter(|b| !b.is_empty() && b.chars().all(char::is_alphabetic));
        if cli.debug {
            config.debug_dir = Some(PathBuf::from(DEFAULT_DEBUG_DIR));
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RunConfig::from_cli(Cli::default());
        assert_eq!(config.only, None);
        assert_eq!(config.debug_dir, None);
        assert_eq!(config.output, PathBuf::from("public/rates.json"));
        assert_eq!(config.pause, Duration::from_secs(1));
        assert!(config.fallback);
    }

    #[test]
    fn test_parse_bank_and_debug() {
        let cli = Cli::try_parse_from(["bank-rates", "hamkorbank", "--debug"]).unwrap();
        let config = RunConfig::from_cli(cli);
        assert_eq!(config.only.as_deref(), Some("hamkorbank"));
        assert_eq!(config.debug_dir, Some(PathBuf::from("tools/_debug")));
    }

    #[test]
    fn test_non_alphabetic_bank_is_ignored() {
        let cli = Cli::try_parse_from(["bank-rates", "tbc_bank_uz"]).unwrap();
        assert_eq!(RunConfig::from_cli(cli).only, None);
    }

    #[test]
    fn test_unknown_flag_is_rejected() {
        assert!(Cli::try_parse_from(["bank-rates", "--verbose"]).is_err());
    }
}
