use std::fmt;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum, builder::BoolishValueParser};
use uuid::Uuid;

/// Command-line arguments for the `spendwise-cli` binary.
#[derive(Debug, Parser)]
#[command(
    name = "spendwise-cli",
    version,
    about = "Spendwise expense tracker command-line client"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "SPENDWISE_CONFIG_FILE",
        value_name = "PATH",
        global = true
    )]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: Overrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args, Default, Clone)]
pub struct Overrides {
    /// Override the API base URL, e.g. <http://localhost:8000/api/>.
    #[arg(long = "api-url", value_name = "URL", global = true)]
    pub api_url: Option<String>,

    /// Override where the credential pair is persisted.
    #[arg(long = "credentials-file", value_name = "PATH", global = true)]
    pub credentials_file: Option<PathBuf>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Sign in, sign up and manage the current session.
    #[command(subcommand)]
    Auth(AuthCommand),
    /// Expense records, summaries and exports.
    #[command(subcommand)]
    Expenses(ExpensesCommand),
    /// Monthly category budgets.
    #[command(subcommand)]
    Budgets(BudgetsCommand),
}

#[derive(Debug, Subcommand, Clone)]
pub enum AuthCommand {
    /// Exchange email and password for a session.
    ///
    /// The password is read from `SPENDWISE_PASSWORD` or the first line of stdin.
    Login {
        #[arg(long)]
        email: String,
    },
    /// Register a new account.
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
    },
    /// Confirm an email address with the token from the verification mail.
    VerifyEmail { token: String },
    /// Forget the stored session.
    Logout,
    /// Show the signed-in profile.
    Me,
    /// Change the theme preference.
    Theme { theme: ThemeArg },
}

#[derive(Debug, Subcommand, Clone)]
pub enum ExpensesCommand {
    /// List expenses with optional filters.
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        from_date: Option<String>,
        #[arg(long)]
        to_date: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        min_amount: Option<String>,
        #[arg(long)]
        max_amount: Option<String>,
    },
    /// Show one expense.
    Get { id: Uuid },
    /// Record an expense.
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        amount: String,
        #[arg(long, default_value = "USD")]
        currency: String,
        #[arg(long)]
        category: String,
        /// Calendar date, YYYY-MM-DD.
        #[arg(long)]
        date: String,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Change selected fields of an expense.
    Update {
        id: Uuid,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        amount: Option<String>,
        #[arg(long)]
        currency: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete an expense.
    Delete { id: Uuid },
    /// Spending summary, optionally for one month (YYYY-MM).
    Summary {
        #[arg(long)]
        month: Option<String>,
    },
    /// Download all expenses as CSV.
    Export {
        /// Write to a file instead of stdout.
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Subcommand, Clone)]
pub enum BudgetsCommand {
    /// List budgets.
    List,
    /// Create a budget for a category.
    Create {
        #[arg(long)]
        category: String,
        #[arg(long)]
        amount: String,
    },
    /// Replace a budget's category and amount.
    Update {
        id: Uuid,
        #[arg(long)]
        category: String,
        #[arg(long)]
        amount: String,
    },
    /// Delete a budget.
    Delete { id: Uuid },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ThemeArg {
    Light,
    Dark,
    /// Switch to the opposite of the current preference.
    Toggle,
}

impl fmt::Display for ThemeArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ThemeArg::Light => "light",
            ThemeArg::Dark => "dark",
            ThemeArg::Toggle => "toggle",
        };
        f.write_str(s)
    }
}
