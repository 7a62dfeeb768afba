//! These structs provide the CLI interface for the cashcal CLI.

use crate::model::EventType;
use crate::ClientConfig;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;
use url::Url;

/// The widest navigable range, in months either side of the current one.
const MAX_MONTH_RANGE_LIMIT: i64 = 1200;

/// cashcal: A calendar of your income and expenses.
///
/// Events are stored by an external ledger backend. `cashcal serve` runs a small proxy in front
/// of it that holds the backend's token, and the other subcommands talk to that proxy to show a
/// month, its statistics, or to add and edit events.
///
/// The proxy reads its endpoints from the environment or from a `.env` file in the working
/// directory: ENDPOINT_UPSERT, ENDPOINT_FILTER, ENDPOINT_MONTH, ENDPOINT_SUM,
/// ENDPOINT_DROPDOWN_TYPE, ENDPOINT_DROPDOWN_INCOME, ENDPOINT_DROPDOWN_EXPENSE, TOKEN and,
/// optionally, TIMEZONE.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the proxy server in front of the ledger backend.
    ///
    /// When CASHCAL_IN_TEST_MODE is set and non-empty, the proxy serves from an in-memory backend
    /// instead, so that the whole program can be tried without one.
    Serve(ServeArgs),
    /// Show the calendar of a month.
    Calendar(CalendarArgs),
    /// Show the income and expense totals of a month.
    Stats(StatsArgs),
    /// Add an event.
    Add(AddArgs),
    /// Change an existing event.
    Edit(EditArgs),
    /// Show or change the color theme.
    Theme(ThemeArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where cashcal keeps its settings. Defaults to ~/.cashcal
    #[arg(long, env = "CASHCAL_HOME", default_value_t = default_home())]
    home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, home: PathBuf) -> Self {
        Self {
            log_level,
            home: home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn home(&self) -> &DisplayPath {
        &self.home
    }
}

/// (Not shown): Args for the `cashcal serve` command.
#[derive(Debug, Parser, Clone)]
pub struct ServeArgs {
    /// The address the proxy listens on.
    #[arg(long, env = "CASHCAL_ADDR", default_value = "127.0.0.1:3000")]
    addr: SocketAddr,

    /// The most events a day may hold. Only used by the in-memory backend.
    #[arg(long, env = "EVENT_LIMIT", default_value_t = 10)]
    event_limit: usize,
}

impl ServeArgs {
    pub fn new(addr: SocketAddr, event_limit: usize) -> Self {
        Self { addr, event_limit }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn event_limit(&self) -> usize {
        self.event_limit
    }
}

/// (Not shown): The settings every client command needs. There are no defaults for the limits;
/// the command fails when they are not given.
#[derive(Debug, Parser, Clone)]
pub struct ClientArgs {
    /// The base URL of the proxy server.
    #[arg(long, env = "CASHCAL_PROXY_URL", default_value = "http://127.0.0.1:3000")]
    proxy_url: Url,

    /// How long a request may take, in milliseconds.
    #[arg(long, env = "REQUEST_TIMEOUT", value_parser = clap::value_parser!(u64).range(1..))]
    request_timeout: u64,

    /// How many months before and after the current one may be shown, at most 1200.
    #[arg(
        long,
        env = "MONTH_RANGE_LIMIT",
        value_parser = clap::value_parser!(u32).range(1..=MAX_MONTH_RANGE_LIMIT)
    )]
    month_range_limit: u32,

    /// The most events a day may hold.
    #[arg(long, env = "EVENT_LIMIT", value_parser = clap::value_parser!(u32).range(1..))]
    event_limit: u32,

    /// The IANA name of the local timezone, sent with month queries. Defaults to TZ or the
    /// system zone, and should only be given when neither names it.
    #[arg(long, env = "CASHCAL_TIMEZONE")]
    timezone: Option<String>,
}

impl ClientArgs {
    pub fn new(
        proxy_url: Url,
        request_timeout: u64,
        month_range_limit: u32,
        event_limit: u32,
    ) -> Self {
        Self {
            proxy_url,
            request_timeout,
            month_range_limit,
            event_limit,
            timezone: None,
        }
    }

    pub fn config(&self) -> ClientConfig {
        let config = ClientConfig::new(
            self.proxy_url.clone(),
            Duration::from_millis(self.request_timeout),
            self.month_range_limit,
            self.event_limit as usize,
        );
        match &self.timezone {
            Some(tz) => config.with_timezone(tz.clone()),
            None => config,
        }
    }
}

/// (Not shown): Args for the `cashcal calendar` command.
#[derive(Debug, Parser, Clone)]
pub struct CalendarArgs {
    #[clap(flatten)]
    client: ClientArgs,

    /// The year to show. Defaults to the current year.
    #[arg(long)]
    year: Option<i32>,

    /// The month to show, 1 to 12. Defaults to the current month.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    month: Option<u32>,
}

impl CalendarArgs {
    pub fn new(client: ClientArgs, year: Option<i32>, month: Option<u32>) -> Self {
        Self {
            client,
            year,
            month,
        }
    }

    pub fn client(&self) -> &ClientArgs {
        &self.client
    }

    pub fn year(&self) -> Option<i32> {
        self.year
    }

    pub fn month(&self) -> Option<u32> {
        self.month
    }
}

/// (Not shown): Args for the `cashcal stats` command.
#[derive(Debug, Parser, Clone)]
pub struct StatsArgs {
    #[clap(flatten)]
    calendar: CalendarArgs,

    /// Also show the categories of this type: income or expense.
    #[arg(long)]
    expand: Option<EventType>,
}

impl StatsArgs {
    pub fn new(calendar: CalendarArgs, expand: Option<EventType>) -> Self {
        Self { calendar, expand }
    }

    pub fn calendar(&self) -> &CalendarArgs {
        &self.calendar
    }

    pub fn expand(&self) -> Option<EventType> {
        self.expand
    }
}

/// The fields of an event that can be given on the command line.
#[derive(Debug, Parser, Clone, Default)]
pub struct EventFields {
    /// income or expense. Defaults to the first type offered by the backend.
    #[arg(long = "type")]
    kind: Option<EventType>,

    /// Defaults to the first category offered for the type.
    #[arg(long)]
    category: Option<String>,

    #[arg(long)]
    description: Option<String>,
}

impl EventFields {
    pub fn new(
        kind: Option<EventType>,
        category: Option<String>,
        description: Option<String>,
    ) -> Self {
        Self {
            kind,
            category,
            description,
        }
    }

    pub fn kind(&self) -> Option<EventType> {
        self.kind
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// (Not shown): Args for the `cashcal add` command.
#[derive(Debug, Parser, Clone)]
pub struct AddArgs {
    #[clap(flatten)]
    client: ClientArgs,

    /// The day of the event, YYYY-MM-DD.
    #[arg(long)]
    date: NaiveDate,

    /// The amount, with or without thousands separators, e.g. 1,234.50
    #[arg(long)]
    amount: String,

    #[clap(flatten)]
    fields: EventFields,
}

impl AddArgs {
    pub fn new(
        client: ClientArgs,
        date: NaiveDate,
        amount: impl Into<String>,
        fields: EventFields,
    ) -> Self {
        Self {
            client,
            date,
            amount: amount.into(),
            fields,
        }
    }

    pub fn client(&self) -> &ClientArgs {
        &self.client
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn fields(&self) -> &EventFields {
        &self.fields
    }
}

/// (Not shown): Args for the `cashcal edit` command.
#[derive(Debug, Parser, Clone)]
pub struct EditArgs {
    #[clap(flatten)]
    client: ClientArgs,

    /// The id of the event to change.
    #[arg(long)]
    id: String,

    /// Move the event to this day, YYYY-MM-DD.
    #[arg(long)]
    date: Option<NaiveDate>,

    /// The new amount.
    #[arg(long)]
    amount: Option<String>,

    #[clap(flatten)]
    fields: EventFields,
}

impl EditArgs {
    pub fn new(
        client: ClientArgs,
        id: impl Into<String>,
        date: Option<NaiveDate>,
        amount: Option<String>,
        fields: EventFields,
    ) -> Self {
        Self {
            client,
            id: id.into(),
            date,
            amount,
            fields,
        }
    }

    pub fn client(&self) -> &ClientArgs {
        &self.client
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn amount(&self) -> Option<&str> {
        self.amount.as_deref()
    }

    pub fn fields(&self) -> &EventFields {
        &self.fields
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeAction {
    Light,
    Dark,
    Toggle,
}

serde_plain::derive_display_from_serialize!(ThemeAction);
serde_plain::derive_fromstr_from_deserialize!(ThemeAction);

/// (Not shown): Args for the `cashcal theme` command.
#[derive(Debug, Parser, Clone)]
pub struct ThemeArgs {
    /// light, dark or toggle. Without it the current theme is shown.
    action: Option<ThemeAction>,
}

impl ThemeArgs {
    pub fn new(action: Option<ThemeAction>) -> Self {
        Self { action }
    }

    pub fn action(&self) -> Option<ThemeAction> {
        self.action
    }
}

fn default_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join(".cashcal"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --home or CASHCAL_HOME instead of relying on the default \
                directory. If you continue using the program right now, you may have problems!",
            );
            PathBuf::from(".cashcal")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLIENT: [&str; 6] = [
        "--request-timeout",
        "5000",
        "--month-range-limit",
        "3",
        "--event-limit",
        "4",
    ];

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        let mut argv = vec!["cashcal", "--home", "/tmp/cashcal-home"];
        argv.extend_from_slice(args);
        Args::try_parse_from(argv)
    }

    #[test]
    fn test_serve_defaults() {
        let args = parse(&["serve"]).unwrap();
        let Command::Serve(serve) = args.command() else {
            panic!("expected serve");
        };
        assert_eq!(serve.addr().to_string(), "127.0.0.1:3000");
        assert_eq!(args.common().log_level(), LevelFilter::INFO);
        assert_eq!(args.common().home().path(), Path::new("/tmp/cashcal-home"));
    }

    #[test]
    fn test_calendar_args() {
        let mut argv = vec!["calendar", "--year", "2024", "--month", "3"];
        argv.extend_from_slice(&CLIENT);
        let args = parse(&argv).unwrap();
        let Command::Calendar(calendar) = args.command() else {
            panic!("expected calendar");
        };
        assert_eq!(calendar.year(), Some(2024));
        assert_eq!(calendar.month(), Some(3));
        let config = calendar.client().config();
        assert_eq!(config.request_timeout(), Duration::from_millis(5000));
        assert_eq!(config.month_range().limit(), 3);
        assert_eq!(config.event_limit(), 4);
        assert_eq!(config.proxy_url().as_str(), "http://127.0.0.1:3000/");
    }

    #[test]
    fn test_client_limits_are_required_and_positive() {
        assert!(parse(&["calendar", "--request-timeout", "5000", "--event-limit", "4"]).is_err());
        let mut argv = vec!["calendar", "--month-range-limit", "0"];
        argv.extend_from_slice(&CLIENT[..2]);
        argv.extend_from_slice(&CLIENT[4..]);
        assert!(parse(&argv).is_err());
    }

    #[test]
    fn test_month_range_limit_is_capped() {
        let mut argv = vec!["calendar", "--month-range-limit", "1200"];
        argv.extend_from_slice(&CLIENT[..2]);
        argv.extend_from_slice(&CLIENT[4..]);
        assert!(parse(&argv).is_ok());
        argv[2] = "4294967295";
        assert!(parse(&argv).is_err());
    }

    #[test]
    fn test_timezone_override() {
        let mut argv = vec!["calendar", "--timezone", "Asia/Jakarta"];
        argv.extend_from_slice(&CLIENT);
        let args = parse(&argv).unwrap();
        let Command::Calendar(calendar) = args.command() else {
            panic!("expected calendar");
        };
        assert_eq!(calendar.client().config().timezone(), "Asia/Jakarta");
    }

    #[test]
    fn test_month_out_of_range() {
        let mut argv = vec!["calendar", "--month", "13"];
        argv.extend_from_slice(&CLIENT);
        assert!(parse(&argv).is_err());
    }

    #[test]
    fn test_add_args() {
        let mut argv = vec![
            "add",
            "--date",
            "2024-03-05",
            "--amount",
            "1,200",
            "--type",
            "expense",
        ];
        argv.extend_from_slice(&CLIENT);
        let args = parse(&argv).unwrap();
        let Command::Add(add) = args.command() else {
            panic!("expected add");
        };
        assert_eq!(add.date(), NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(add.amount(), "1,200");
        assert_eq!(add.fields().kind(), Some(EventType::Expense));
        assert_eq!(add.fields().category(), None);
    }

    #[test]
    fn test_theme_args() {
        let args = parse(&["theme", "toggle"]).unwrap();
        let Command::Theme(theme) = args.command() else {
            panic!("expected theme");
        };
        assert_eq!(theme.action(), Some(ThemeAction::Toggle));
        assert!(parse(&["theme", "blue"]).is_err());
    }
}
