use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "lumen")]
#[command(about = "Manage photos and videos on a Lumen server", long_about = None)]
pub struct Cli {
    /// Server URL, e.g. http://localhost:2283 (env: LUMEN_ENDPOINT)
    #[arg(short, long, global = true)]
    pub endpoint: Option<String>,

    /// API key for the server (env: LUMEN_API_KEY)
    #[arg(short = 'k', long, global = true)]
    pub api_key: Option<String>,

    /// Skip TLS certificate verification
    #[arg(long, global = true)]
    pub no_verify_ssl: bool,

    /// Request timeout in seconds
    #[arg(long, global = true, default_value_t = 60)]
    pub timeout: u64,

    /// Log mutating requests instead of sending them
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Server information and connectivity
    Server {
        #[command(subcommand)]
        command: ServerCommands,
    },
    /// Upload and manage assets
    Asset {
        #[command(subcommand)]
        command: AssetCommands,
    },
    /// Manage albums
    Album {
        #[command(subcommand)]
        command: AlbumCommands,
    },
    /// Manage tags
    Tag {
        #[command(subcommand)]
        command: TagCommands,
    },
    /// Inspect and control server job queues
    Job {
        #[command(subcommand)]
        command: JobCommands,
    },
}

#[derive(Debug, Subcommand)]
pub enum ServerCommands {
    /// Check that the server is reachable
    Ping,
    /// Show server version and build information
    Info,
    /// Show server usage statistics
    Stats,
    /// List the file extensions the server accepts
    MediaTypes,
}

#[derive(Debug, Subcommand)]
pub enum AssetCommands {
    /// Upload a file, a directory, or an archive of files
    Upload {
        /// File, directory, or archive to upload
        path: PathBuf,
        /// Add uploaded assets to this album (created if absent).
        /// Defaults to the directory or archive name for batch uploads.
        #[arg(short, long)]
        album: Option<String>,
        /// Upload even if the local ledger says the file was sent before
        #[arg(long)]
        ignore_dedup: bool,
        /// Disable the progress display
        #[arg(long)]
        no_progress: bool,
        /// Mark uploaded assets as favorites
        #[arg(long)]
        favorite: bool,
        /// Mark uploaded assets as archived
        #[arg(long)]
        archived: bool,
        /// Sidecar metadata file (single-file uploads only)
        #[arg(long)]
        sidecar: Option<PathBuf>,
        /// Device identifier reported to the server
        #[arg(long)]
        device_id: Option<String>,
    },
    /// Show one asset
    Info { id: String },
    /// List assets, optionally filtered by original file name
    List {
        /// Exact original file name to match
        #[arg(long)]
        name: Option<String>,
    },
    /// Download an asset's original file
    Download {
        id: String,
        /// Output path (defaults to the asset's original file name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Update asset fields from a JSON object
    Update {
        id: String,
        /// JSON object of fields to set, e.g. '{"isFavorite": true}'
        fields: String,
    },
    /// Delete assets
    Delete {
        ids: Vec<String>,
        /// Delete permanently instead of moving to trash
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum AlbumCommands {
    /// List all albums
    List,
    /// Show one album with its assets
    Info { id: String },
    /// Create an album
    Create {
        name: String,
        #[arg(short, long, default_value = "")]
        description: String,
    },
    /// Delete an album
    Delete { id: String },
    /// Add assets to an album
    AddAssets {
        id: String,
        asset_ids: Vec<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum TagCommands {
    /// List all tags
    List,
    /// Create tags by name, returning existing ones unchanged
    Upsert { names: Vec<String> },
    /// Attach a tag to assets
    TagAssets {
        tag_id: String,
        asset_ids: Vec<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum JobCommands {
    /// Show all job queues
    List,
    /// Send a command to a job queue
    Command {
        /// Queue name, e.g. thumbnailGeneration
        job_id: String,
        /// start, pause, resume, empty, or clear-failed
        command: String,
        #[arg(long)]
        force: bool,
    },
    /// Ask the server to run a maintenance job
    Create {
        /// person-cleanup, tag-cleanup, or user-cleanup
        name: String,
    },
}
