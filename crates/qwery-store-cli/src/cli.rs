use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use qwery_store::VERSION;

/// Qwery Store - inspect and maintain the local Qwery document store
#[derive(Parser)]
#[command(name = "qwery-store")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Storage root directory (overrides the config file and environment)
    #[arg(short, long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Secret vault key
    #[arg(long, global = true, env = "QWERY_ENCRYPTION_KEY", hide_env_values = true)]
    pub key: Option<String>,

    /// Disable interactive prompts
    #[arg(long, global = true)]
    pub no_input: bool,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the resolved storage root
    Root,

    /// List document keys under a prefix
    Keys(KeysArgs),

    /// Print one document
    Get(KeyArgs),

    /// Remove one document
    Rm(KeyArgs),

    /// List entities of one kind
    List(ListArgs),

    /// Page through the messages of a conversation
    Messages(MessagesArgs),

    /// Generate an identifier
    Id(IdArgs),

    /// Print the creation time embedded in an identifier
    IdTime(IdTimeArgs),

    /// Protect a value with the secret vault
    Protect(SecretArgs),

    /// Reveal a protected value
    Reveal(SecretArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Arguments for the `keys` command
#[derive(Args)]
pub struct KeysArgs {
    /// Key prefix segments (e.g., `message conv_123`)
    #[arg(value_name = "SEGMENT")]
    pub prefix: Vec<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `get` and `rm` commands
#[derive(Args)]
pub struct KeyArgs {
    /// Key segments, or a single `a/b/c` path
    #[arg(value_name = "SEGMENT", required = true)]
    pub key: Vec<String>,
}

/// Arguments for the `list` command
#[derive(Args)]
pub struct ListArgs {
    /// Entity kind (e.g., `project` or `prj`)
    #[arg(value_name = "ENTITY")]
    pub entity: String,

    /// Only entities of this project
    #[arg(long, value_name = "ID")]
    pub project: Option<String>,

    /// Only projects of this organization
    #[arg(long, value_name = "ID")]
    pub organization: Option<String>,

    /// Only entities of this conversation
    #[arg(long, value_name = "ID")]
    pub conversation: Option<String>,

    /// Case-insensitive text filter (organizations and projects)
    #[arg(long)]
    pub search: Option<String>,

    /// Number of entities to skip
    #[arg(long, default_value_t = 0)]
    pub offset: usize,

    /// Maximum number of entities
    #[arg(long)]
    pub limit: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `messages` command
#[derive(Args)]
pub struct MessagesArgs {
    /// Conversation ID
    #[arg(value_name = "CONVERSATION")]
    pub conversation: String,

    /// Cursor returned by the previous page
    #[arg(long)]
    pub cursor: Option<String>,

    /// Page size
    #[arg(long, default_value_t = 20)]
    pub limit: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `id` command
#[derive(Args)]
pub struct IdArgs {
    /// Entity kind (e.g., `project` or `prj`)
    #[arg(value_name = "ENTITY")]
    pub entity: String,

    /// Newer identifiers sort first
    #[arg(long)]
    pub descending: bool,
}

/// Arguments for the `id-time` command
#[derive(Args)]
pub struct IdTimeArgs {
    /// Identifier generated in ascending mode
    #[arg(value_name = "ID")]
    pub id: String,
}

/// Arguments for the `protect` and `reveal` commands
#[derive(Args)]
pub struct SecretArgs {
    /// Value to transform (read from stdin when omitted)
    #[arg(value_name = "VALUE")]
    pub value: Option<String>,
}
