//! Clap derive structures for the `bookdesk` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use bookdesk_core::ActiveFilter;
use bookdesk_core::api::{AuthorRole, MetricKind, MetricPeriod, StorageCategory};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// bookdesk -- admin console for the bookstore catalog
#[derive(Debug, Parser)]
#[command(
    name = "bookdesk",
    version,
    about = "Administer the bookstore catalog from the command line",
    long_about = "Manage books, authors, categories, users and site settings of a\n\
        bookstore admin API, upload files to its storage, and read its\n\
        dashboard statistics.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Profile to use
    #[arg(long, short = 'p', env = "BOOKDESK_PROFILE", global = true)]
    pub profile: Option<String>,

    /// API base URL (overrides profile)
    #[arg(long, env = "BOOKDESK_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "BOOKDESK_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "BOOKDESK_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "BOOKDESK_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and store the session token
    Login(LoginArgs),

    /// Forget the stored session token
    Logout,

    /// Show the active profile and session state
    Whoami,

    /// Manage books
    #[command(alias = "b")]
    Books(BooksArgs),

    /// Manage authors
    #[command(alias = "a")]
    Authors(AuthorsArgs),

    /// Manage categories
    #[command(alias = "cat")]
    Categories(CategoriesArgs),

    /// Manage subcategories
    #[command(alias = "sub")]
    Subcategories(SubcategoriesArgs),

    /// Manage admin users
    #[command(alias = "u")]
    Users(UsersArgs),

    /// Manage site settings
    Settings(SettingsArgs),

    /// Upload files and resolve storage keys
    Storage(StorageArgs),

    /// Show the dashboard overview
    #[command(alias = "dash")]
    Dashboard(DashboardArgs),

    /// Read individual statistics endpoints
    Stats(StatsArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SESSION
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Account email (prompted when omitted)
    #[arg(long, short = 'e')]
    pub email: Option<String>,

    /// Read the password from the first line of stdin
    #[arg(long)]
    pub password_stdin: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SHARED LIST / WRITE ARGS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Default, Args)]
pub struct ListArgs {
    /// Page to fetch (1-based)
    #[arg(long)]
    pub page: Option<u32>,

    /// Rows per page
    #[arg(long, short = 'l')]
    pub limit: Option<u32>,

    /// Case-insensitive search within the fetched page
    #[arg(long = "q", visible_alias = "search")]
    pub query: Option<String>,

    /// Activity filter
    #[arg(long, value_enum)]
    pub active: Option<ActiveArg>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ActiveArg {
    Any,
    Active,
    Inactive,
}

impl From<ActiveArg> for ActiveFilter {
    fn from(arg: ActiveArg) -> Self {
        match arg {
            ActiveArg::Any => Self::Any,
            ActiveArg::Active => Self::Active,
            ActiveArg::Inactive => Self::Inactive,
        }
    }
}

/// Write options shared by every create/update command.
#[derive(Debug, Clone, Default, Args)]
pub struct FromFileArg {
    /// JSON object of form fields; flags given alongside override it
    #[arg(long, short = 'F')]
    pub from_file: Option<PathBuf>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  BOOKS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct BooksArgs {
    #[command(subcommand)]
    pub command: BooksCommand,
}

#[derive(Debug, Subcommand)]
pub enum BooksCommand {
    /// List books
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        list: ListArgs,

        /// Only books in this category
        #[arg(long)]
        category_id: Option<u64>,

        /// Only featured books
        #[arg(long)]
        featured: bool,
    },

    /// Show one book with its authors and specifications
    Get {
        /// Book ID
        id: String,
    },

    /// Create a book
    Create(BookFields),

    /// Update a book
    Update {
        /// Book ID
        id: String,

        #[command(flatten)]
        fields: BookFields,
    },

    /// Delete a book
    #[command(alias = "rm")]
    Delete {
        /// Book ID
        id: String,

        /// Also delete the stored book file
        #[arg(long)]
        delete_file: bool,
    },
}

#[derive(Debug, Clone, Default, Args)]
pub struct BookFields {
    #[command(flatten)]
    pub file: FromFileArg,

    #[arg(long)]
    pub title: Option<String>,

    /// Derived from the title on create when omitted
    #[arg(long)]
    pub slug: Option<String>,

    #[arg(long)]
    pub category_id: Option<u64>,

    #[arg(long)]
    pub subcategory_id: Option<u64>,

    #[arg(long)]
    pub short_description: Option<String>,

    #[arg(long)]
    pub long_description: Option<String>,

    #[arg(long)]
    pub meta_title: Option<String>,

    #[arg(long)]
    pub meta_description: Option<String>,

    /// Listed in the storefront (true/false)
    #[arg(long)]
    pub active: Option<bool>,

    /// Shown among featured books (true/false)
    #[arg(long)]
    pub featured: Option<bool>,

    /// Book file to upload (PDF, EPUB, ...)
    #[arg(long = "file", value_name = "PATH")]
    pub book_file: Option<PathBuf>,

    /// Cover image to upload
    #[arg(long, value_name = "PATH")]
    pub thumbnail: Option<PathBuf>,

    /// Remove the current cover
    #[arg(long, conflicts_with = "thumbnail")]
    pub clear_thumbnail: bool,

    /// Attach an author: ID or ID:ROLE (author, translator, editor)
    #[arg(long = "author", value_name = "ID[:ROLE]", value_parser = parse_author)]
    pub authors: Vec<AuthorArg>,

    /// Drop the book's current authors before adding --author ones
    #[arg(long)]
    pub clear_authors: bool,

    /// Add a specification: [GROUP/]NAME=VALUE, `!` suffix on NAME hides it
    #[arg(long = "spec", value_name = "[GROUP/]NAME=VALUE", value_parser = parse_spec)]
    pub specs: Vec<SpecArg>,

    /// Drop the book's current specifications before adding --spec ones
    #[arg(long)]
    pub clear_specs: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorArg {
    pub id: u64,
    pub role: AuthorRole,
}

fn parse_author(raw: &str) -> Result<AuthorArg, String> {
    let (id, role) = match raw.split_once(':') {
        Some((id, role)) => (id, role.parse().map_err(|_| format!("unknown role '{role}'"))?),
        None => (raw, AuthorRole::default()),
    };
    let id = id
        .trim()
        .parse()
        .map_err(|_| format!("expected a numeric author ID, got '{id}'"))?;
    Ok(AuthorArg { id, role })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecArg {
    pub group: String,
    pub name: String,
    pub value: String,
    pub visible: bool,
}

fn parse_spec(raw: &str) -> Result<SpecArg, String> {
    let (path, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected [GROUP/]NAME=VALUE, got '{raw}'"))?;
    let (group, name) = path.rsplit_once('/').unwrap_or(("", path));
    let (name, visible) = match name.strip_suffix('!') {
        Some(name) => (name, false),
        None => (name, true),
    };
    Ok(SpecArg {
        group: group.trim().to_owned(),
        name: name.trim().to_owned(),
        value: value.trim().to_owned(),
        visible,
    })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  AUTHORS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct AuthorsArgs {
    #[command(subcommand)]
    pub command: AuthorsCommand,
}

#[derive(Debug, Subcommand)]
pub enum AuthorsCommand {
    /// List authors
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show one author
    Get { id: String },

    /// Create an author
    Create(AuthorFields),

    /// Update an author
    Update {
        id: String,

        #[command(flatten)]
        fields: AuthorFields,
    },

    /// Delete an author
    #[command(alias = "rm")]
    Delete { id: String },
}

#[derive(Debug, Clone, Default, Args)]
pub struct AuthorFields {
    #[command(flatten)]
    pub file: FromFileArg,

    #[arg(long)]
    pub name: Option<String>,

    /// Derived from the name on create when omitted
    #[arg(long)]
    pub slug: Option<String>,

    #[arg(long)]
    pub bio: Option<String>,

    /// true/false
    #[arg(long)]
    pub active: Option<bool>,

    /// Portrait to upload
    #[arg(long, value_name = "PATH")]
    pub image: Option<PathBuf>,

    /// Remove the current portrait
    #[arg(long, conflicts_with = "image")]
    pub clear_image: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CATEGORIES / SUBCATEGORIES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CategoriesArgs {
    #[command(subcommand)]
    pub command: CategoriesCommand,
}

#[derive(Debug, Subcommand)]
pub enum CategoriesCommand {
    /// List categories
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show one category
    Get { id: String },

    /// Create a category
    Create(CategoryFields),

    /// Update a category
    Update {
        id: String,

        #[command(flatten)]
        fields: CategoryFields,
    },

    /// Delete a category
    #[command(alias = "rm")]
    Delete { id: String },
}

#[derive(Debug, Clone, Default, Args)]
pub struct CategoryFields {
    #[command(flatten)]
    pub file: FromFileArg,

    #[arg(long)]
    pub name: Option<String>,

    /// Derived from the name on create when omitted
    #[arg(long)]
    pub slug: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    /// true/false
    #[arg(long)]
    pub active: Option<bool>,
}

#[derive(Debug, Args)]
pub struct SubcategoriesArgs {
    #[command(subcommand)]
    pub command: SubcategoriesCommand,
}

#[derive(Debug, Subcommand)]
pub enum SubcategoriesCommand {
    /// List subcategories
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        list: ListArgs,

        /// Only subcategories of this category
        #[arg(long)]
        category_id: Option<u64>,
    },

    /// Show one subcategory
    Get { id: String },

    /// Create a subcategory
    Create(SubcategoryFields),

    /// Update a subcategory
    Update {
        id: String,

        #[command(flatten)]
        fields: SubcategoryFields,
    },

    /// Delete a subcategory
    #[command(alias = "rm")]
    Delete { id: String },
}

#[derive(Debug, Clone, Default, Args)]
pub struct SubcategoryFields {
    #[command(flatten)]
    pub file: FromFileArg,

    #[arg(long)]
    pub name: Option<String>,

    /// Derived from the name on create when omitted
    #[arg(long)]
    pub slug: Option<String>,

    /// Parent category
    #[arg(long)]
    pub category_id: Option<u64>,

    /// true/false
    #[arg(long)]
    pub active: Option<bool>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  USERS / SETTINGS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct UsersArgs {
    #[command(subcommand)]
    pub command: UsersCommand,
}

#[derive(Debug, Subcommand)]
pub enum UsersCommand {
    /// List admin users
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show one user
    Get { id: String },

    /// Create a user
    Create(UserFields),

    /// Update a user
    Update {
        id: String,

        #[command(flatten)]
        fields: UserFields,
    },

    /// Delete a user
    #[command(alias = "rm")]
    Delete { id: String },
}

#[derive(Debug, Clone, Default, Args)]
pub struct UserFields {
    #[command(flatten)]
    pub file: FromFileArg,

    #[arg(long)]
    pub full_name: Option<String>,

    #[arg(long)]
    pub email: Option<String>,

    /// Prompt for a password (required on create, optional on update)
    #[arg(long)]
    pub password: bool,

    /// Read the password from the first line of stdin
    #[arg(long, conflicts_with = "password")]
    pub password_stdin: bool,

    /// Role name, e.g. admin or employee
    #[arg(long)]
    pub role: Option<String>,

    /// true/false
    #[arg(long)]
    pub active: Option<bool>,
}

#[derive(Debug, Args)]
pub struct SettingsArgs {
    #[command(subcommand)]
    pub command: SettingsCommand,
}

#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    /// List settings
    #[command(alias = "ls")]
    List {
        /// Case-insensitive search on key and value
        #[arg(long = "q", visible_alias = "search")]
        query: Option<String>,
    },

    /// Create or update a setting
    Set { key: String, value: String },

    /// Delete a setting
    #[command(alias = "rm")]
    Delete { key: String },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  STORAGE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct StorageArgs {
    #[command(subcommand)]
    pub command: StorageCommand,
}

#[derive(Debug, Subcommand)]
pub enum StorageCommand {
    /// Upload a file and print its storage key
    Upload {
        path: PathBuf,

        /// Destination bucket: books, thumbnails or uploads
        #[arg(long, short = 't', default_value = "uploads", value_parser = parse_category)]
        category: StorageCategory,

        /// Store under this key instead of a generated one
        #[arg(long)]
        key: Option<String>,
    },

    /// Resolve a storage key to a servable URL
    Url { key: String },
}

fn parse_category(raw: &str) -> Result<StorageCategory, String> {
    raw.parse()
        .map_err(|_| format!("expected books, thumbnails or uploads, got '{raw}'"))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  DASHBOARD / STATS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct DashboardArgs {
    /// Overview range in days: 7, 14, 30 or 60
    #[arg(long, short = 'd', default_value_t = 30)]
    pub days: u32,

    /// Change a metric card's window, e.g. downloads=30d (repeatable)
    #[arg(long = "card", value_name = "KIND=PERIOD", value_parser = parse_card)]
    pub cards: Vec<(MetricKind, MetricPeriod)>,

    /// Write the overview chart to this SVG file
    #[arg(long, value_name = "FILE")]
    pub svg: Option<PathBuf>,

    /// Chart width in pixels
    #[arg(long)]
    pub width: Option<f64>,
}

fn parse_card(raw: &str) -> Result<(MetricKind, MetricPeriod), String> {
    let (kind, period) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KIND=PERIOD, got '{raw}'"))?;
    Ok((parse_kind(kind)?, parse_period(period)?))
}

fn parse_kind(raw: &str) -> Result<MetricKind, String> {
    raw.trim()
        .parse()
        .map_err(|_| format!("expected books, downloads or views, got '{raw}'"))
}

fn parse_period(raw: &str) -> Result<MetricPeriod, String> {
    raw.trim()
        .parse()
        .map_err(|_| format!("expected 1d, 7d, 30d or total, got '{raw}'"))
}

#[derive(Debug, Args)]
pub struct StatsArgs {
    #[command(subcommand)]
    pub command: StatsCommand,
}

#[derive(Debug, Subcommand)]
pub enum StatsCommand {
    /// Headline totals
    Summary,

    /// Most recent download and last-hour views
    Activity,

    /// Metric counts; every kind unless --kind is given
    Metrics {
        #[arg(long, value_parser = parse_kind)]
        kind: Option<MetricKind>,

        #[arg(long, default_value = "total", value_parser = parse_period)]
        period: MetricPeriod,
    },

    /// Daily views and downloads
    Overview {
        #[arg(long, short = 'd', default_value_t = 30)]
        days: u32,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG / COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create or extend the config file with guided setup
    Init,

    /// Display the current configuration
    Show,

    /// Set a profile value
    Set {
        /// Profile key: api_url, email, ca_cert, insecure, timeout, page_size
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn author_args_default_to_author_role() {
        assert_eq!(
            parse_author("3").unwrap(),
            AuthorArg {
                id: 3,
                role: AuthorRole::Author
            }
        );
        assert_eq!(parse_author("4:Translator").unwrap().role, AuthorRole::Translator);
        assert!(parse_author("x:editor").is_err());
        assert!(parse_author("4:ghost").is_err());
    }

    #[test]
    fn spec_args_split_group_and_visibility() {
        let spec = parse_spec("Print/Pages!=412").unwrap();
        assert_eq!(spec.group, "Print");
        assert_eq!(spec.name, "Pages");
        assert_eq!(spec.value, "412");
        assert!(!spec.visible);

        let spec = parse_spec("Format=PDF").unwrap();
        assert_eq!(spec.group, "");
        assert!(spec.visible);
        assert!(parse_spec("Format").is_err());
    }

    #[test]
    fn cards_parse_kind_and_period() {
        assert_eq!(
            parse_card("downloads=30d").unwrap(),
            (MetricKind::Downloads, MetricPeriod::Month)
        );
        assert!(parse_card("downloads").is_err());
        assert!(parse_card("likes=1d").is_err());
    }
}
