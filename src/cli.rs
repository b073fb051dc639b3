use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::Config;
use crate::session::FailurePolicy;

#[derive(Parser)]
#[command(name = "crypto-holdings-tracker")]
#[command(about = "Track the market value of the KR1 crypto holdings", long_about = None)]
pub struct Cli {
    /// Path to a JSON config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Reference currency (e.g. usd, eur)
    #[arg(long, global = true)]
    pub currency: Option<String>,

    /// CoinGecko API key
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// What to record when prices cannot be fetched
    #[arg(long, global = true, value_enum)]
    pub policy: Option<PolicyArg>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run valuation cycles back to back and print the results
    Cycle {
        /// Number of cycles to run
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        cycles: u32,
        /// Print the reports as a JSON array
        #[arg(long)]
        json: bool,
        /// Also write the history chart to this PDF
        #[arg(long)]
        pdf: Option<PathBuf>,
    },
    /// Run a cycle each time Enter is pressed (default)
    Interactive,
    /// List the registered holdings
    Holdings {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PolicyArg {
    Skip,
    AppendZero,
}

impl From<PolicyArg> for FailurePolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Skip => FailurePolicy::Skip,
            PolicyArg::AppendZero => FailurePolicy::AppendZero,
        }
    }
}

impl Cli {
    /// Flags win over file and environment settings
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(ref currency) = self.currency {
            config.currency = currency.clone();
        }
        if let Some(ref key) = self.api_key {
            config.api_key = Some(key.clone());
        }
        if let Some(policy) = self.policy {
            config.failure_policy = policy.into();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_none() {
        let cli = Cli::parse_from(["crypto-holdings-tracker"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from([
            "crypto-holdings-tracker",
            "cycle",
            "--json",
            "--currency",
            "eur",
            "--policy",
            "append-zero",
        ]);
        let mut config = Config::default();
        cli.apply_to(&mut config);

        assert_eq!(config.currency, "eur");
        assert_eq!(config.failure_policy, FailurePolicy::AppendZero);
        assert!(matches!(
            cli.command,
            Some(Commands::Cycle { cycles: 1, json: true, pdf: None })
        ));
    }

    #[test]
    fn test_cycle_count() {
        let args = |n: &'static str| ["crypto-holdings-tracker", "cycle", "--cycles", n];

        let cli = Cli::try_parse_from(args("3")).unwrap();
        assert!(matches!(cli.command, Some(Commands::Cycle { cycles: 3, .. })));

        assert!(Cli::try_parse_from(args("0")).is_err());
    }
}
