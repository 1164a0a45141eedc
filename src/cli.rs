//! Command-line interface for the pricewatch client.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::models::{AlertType, Condition, Platform};

/// Command-line client for the pricewatch alerting and portfolio service.
///
/// Talks to the remote service that evaluates price and percentage alerts,
/// sends push notifications, and values portfolios. Credentials are cached
/// between invocations; run `pricewatch login` once.
#[derive(Parser, Debug)]
#[command(name = "pricewatch")]
#[command(version)]
#[command(about = "Command-line client for the pricewatch alerting service", long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, env = "PRICEWATCH_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Service base URL (overrides the config file)
    #[arg(long, env = "PRICEWATCH_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Emit raw JSON instead of formatted text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check service health
    Health,

    /// Log in and cache the bearer token
    Login {
        #[arg(long, env = "PRICEWATCH_EMAIL")]
        email: String,
        #[arg(long, env = "PRICEWATCH_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account and cache the bearer token
    Signup {
        #[arg(long, env = "PRICEWATCH_EMAIL")]
        email: String,
        #[arg(long, env = "PRICEWATCH_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the cached bearer token
    Logout,

    /// Show the signed-in user and effective plan
    Whoami,

    /// Manage price alerts
    #[command(subcommand)]
    Alert(AlertCommand),

    /// Manage portfolio positions
    #[command(subcommand)]
    Portfolio(PortfolioCommand),

    /// Search the asset master
    Assets {
        /// Asset class filter (us_stock, jp_stock, crypto, precious_metal, etf)
        #[arg(long)]
        class: Option<String>,
        /// Free-text ticker/name search
        #[arg(long)]
        query: Option<String>,
        /// Only popular assets
        #[arg(long)]
        popular: bool,
    },

    /// Manage push notification tokens
    #[command(subcommand)]
    Push(PushCommand),

    /// Trigger a server-side alert evaluation run
    Check,

    /// Analyze a screenshot and create percent alerts from it
    Import {
        /// Image file to upload
        image: PathBuf,
        /// Tickers to keep (default: every extracted candidate)
        #[arg(long, value_delimiter = ',')]
        tickers: Option<Vec<String>>,
        /// Percent threshold for the created alerts
        #[arg(long, default_value = "5")]
        percent: f64,
    },

    /// Subscription status and receipt verification
    #[command(subcommand)]
    Plan(PlanCommand),
}

#[derive(Subcommand, Debug)]
pub enum AlertCommand {
    /// List alerts
    List,

    /// Show one alert
    Get { id: i64 },

    /// Create an alert
    ///
    /// Single direction: --condition plus --threshold. Dual direction:
    /// --up plus --down (percent alerts then also need --base-price).
    Create {
        /// Ticker symbol, e.g. AAPL or BTC-USD
        #[arg(short, long)]
        symbol: String,
        /// absolute compares prices, percent compares moves from a base price
        #[arg(long = "type", value_enum, default_value = "absolute")]
        kind: AlertTypeArg,
        #[arg(long, value_enum)]
        condition: Option<ConditionArg>,
        /// Single-direction threshold (a price, or a percent for --type percent)
        #[arg(long)]
        threshold: Option<f64>,
        /// Dual-direction upper threshold
        #[arg(long)]
        up: Option<f64>,
        /// Dual-direction lower threshold
        #[arg(long)]
        down: Option<f64>,
        /// Reference price for percent alerts (service uses the market price when omitted)
        #[arg(long)]
        base_price: Option<f64>,
    },

    /// Re-arm an alert; clears the notified latch so it can fire again
    Enable { id: i64 },

    /// Pause an alert without touching the notified latch
    Disable { id: i64 },

    /// Edit thresholds on an existing alert
    Edit {
        id: i64,
        #[arg(long, value_enum)]
        condition: Option<ConditionArg>,
        #[arg(long)]
        threshold: Option<f64>,
        #[arg(long)]
        up: Option<f64>,
        #[arg(long)]
        down: Option<f64>,
        #[arg(long)]
        base_price: Option<f64>,
        /// Re-anchor the percent base price at the current market price
        #[arg(long)]
        reset_base: bool,
    },

    /// Delete an alert (no undo)
    Delete { id: i64 },

    /// Recent trigger history
    History {
        #[arg(long, default_value = "30")]
        days: u32,
    },

    /// Aggregate trigger statistics
    Stats {
        #[arg(long, default_value = "30")]
        days: u32,
    },
}

#[derive(Subcommand, Debug)]
pub enum PortfolioCommand {
    /// List raw positions
    List,

    /// Show one position
    Get { id: i64 },

    /// Add a position
    Add {
        /// Ticker symbol
        #[arg(short, long)]
        ticker: String,
        /// Number of shares/units
        #[arg(short, long)]
        quantity: f64,
        /// Purchase price per share/unit
        #[arg(short, long)]
        price: f64,
        /// Purchase date (YYYY-MM-DD)
        #[arg(short, long)]
        date: String,
        /// Asset class (us_stock, crypto, ...)
        #[arg(long)]
        class: Option<String>,
        /// Free-form note
        #[arg(long)]
        notes: Option<String>,
    },

    /// Edit a position
    Edit {
        id: i64,
        #[arg(short, long)]
        quantity: Option<f64>,
        #[arg(short, long)]
        price: Option<f64>,
        /// Purchase date (YYYY-MM-DD)
        #[arg(short, long)]
        date: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },

    /// Remove a position
    Remove { id: i64 },

    /// Server-computed valuation and performance
    Summary,
}

#[derive(Subcommand, Debug)]
pub enum PushCommand {
    /// Register a device push token
    Register {
        /// FCM/APNs device token
        token: String,
        /// Stable device identifier (defaults to the configured one)
        #[arg(long)]
        device_id: Option<String>,
        #[arg(long, value_enum)]
        platform: Option<PlatformArg>,
    },

    /// Ask the service to send a test notification
    Test,
}

#[derive(Subcommand, Debug)]
pub enum PlanCommand {
    /// Current entitlement state
    Status,

    /// Verify a store receipt
    Verify {
        #[arg(long, value_enum)]
        platform: PlatformArg,
        /// Raw receipt / purchase token from the store
        #[arg(long)]
        receipt: String,
        #[arg(long, default_value = "premium_monthly")]
        product: String,
    },
}

/// Alert type options.
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum AlertTypeArg {
    /// Fire when the price crosses an absolute boundary
    #[default]
    Absolute,
    /// Fire when the price moves a percentage from a base price
    Percent,
}

impl From<AlertTypeArg> for AlertType {
    fn from(arg: AlertTypeArg) -> Self {
        match arg {
            AlertTypeArg::Absolute => AlertType::Absolute,
            AlertTypeArg::Percent => AlertType::Percent,
        }
    }
}

/// Trigger direction options.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ConditionArg {
    /// Notify at or above the threshold
    Above,
    /// Notify at or below the threshold
    Below,
}

impl From<ConditionArg> for Condition {
    fn from(arg: ConditionArg) -> Self {
        match arg {
            ConditionArg::Above => Condition::Above,
            ConditionArg::Below => Condition::Below,
        }
    }
}

/// App store platform options.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PlatformArg {
    Ios,
    Android,
}

impl From<PlatformArg> for Platform {
    fn from(arg: PlatformArg) -> Self {
        match arg {
            PlatformArg::Ios => Platform::Ios,
            PlatformArg::Android => Platform::Android,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_create_flags() {
        let cli = Cli::parse_from([
            "pricewatch", "alert", "create", "-s", "AAPL", "--type", "absolute",
            "--condition", "above", "--threshold", "150",
        ]);
        let Command::Alert(AlertCommand::Create {
            symbol,
            kind,
            condition,
            threshold,
            ..
        }) = cli.command
        else {
            panic!("expected alert create");
        };
        assert_eq!(symbol, "AAPL");
        assert!(matches!(kind, AlertTypeArg::Absolute));
        assert!(matches!(condition, Some(ConditionArg::Above)));
        assert_eq!(threshold, Some(150.0));
    }

    #[test]
    fn test_import_ticker_list() {
        let cli = Cli::parse_from([
            "pricewatch", "import", "shot.png", "--tickers", "AAPL,NVDA",
        ]);
        let Command::Import { tickers, percent, .. } = cli.command else {
            panic!("expected import");
        };
        assert_eq!(
            tickers,
            Some(vec!["AAPL".to_string(), "NVDA".to_string()])
        );
        assert_eq!(percent, 5.0);
    }

    #[test]
    fn test_global_json_flag_after_subcommand() {
        let cli = Cli::parse_from(["pricewatch", "alert", "list", "--json"]);
        assert!(cli.json);
    }
}
