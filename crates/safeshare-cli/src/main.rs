//! safeshare: client-side encrypted file sharing CLI
//!
//! Backend commands:
//!   upload <path>        - encrypt locally, then upload blob + metadata
//!   download <link>      - download, decrypt, and save a shared file
//!   list [--shared]      - list uploaded (or shared-with-me) files
//!   delete <id>          - delete an uploaded file
//!   share <id> --email   - share a file with other users
//!   usage                - show storage usage and role
//!
//! Offline commands:
//!   encrypt <path>       - encrypt to a blob file plus a metadata file
//!   decrypt <blob>       - decrypt a blob file with its metadata file
//!   config show          - display current configuration

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use secrecy::SecretString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use safeshare_client::{
    download_file, read_plaintext, save_decrypted, upload_file, ApiClient, DownloadHandle,
    MetadataSource, UploadOptions,
};
use safeshare_core::config::{LogFormat, SafeshareConfig};
use safeshare_core::media_type::guess_media_type;
use safeshare_core::types::{ExpiryDays, FileDescriptor, FileStatus};
use safeshare_crypto::{decrypt_file, encrypt_file, EncryptedBlob, EncryptionMetadata};

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "safeshare",
    version,
    about = "Client-side encrypted file sharing",
    long_about = "safeshare: encrypt files locally with AES-256-GCM, share them through the \
                  file-sharing backend, and decrypt downloads on this machine"
)]
struct Cli {
    /// Path to safeshare.toml configuration file
    #[arg(long, short = 'c', env = "SAFESHARE_CONFIG", default_value = "safeshare.toml")]
    config: PathBuf,

    /// Session token for the backend (sent as a bearer token)
    #[arg(long, env = "SAFESHARE_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Log level or filter directive (overrides logging.level)
    #[arg(long, env = "SAFESHARE_LOG")]
    log: Option<String>,

    /// Log output format (overrides logging.format)
    #[arg(long, value_enum)]
    log_format: Option<LogFormatArg>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormatArg {
    Text,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Text => LogFormat::Text,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encrypt a file locally and upload it
    ///
    /// The per-file key travels only inside the encryption_metadata form field.
    Upload {
        /// Local file to upload
        path: PathBuf,
        /// Make the file public instead of the configured default status
        #[arg(long)]
        public: bool,
        /// Days until the backend expires the file (1-30)
        #[arg(long)]
        expiry_days: Option<u32>,
        /// Also write the full metadata (key, IV, original name) to this file
        #[arg(long)]
        metadata_out: Option<PathBuf>,
    },

    /// Download a shared file, decrypt it, and save it locally
    Download {
        /// Download link handle issued at upload
        link: String,
        /// Metadata file to decrypt with (default: fetch from the backend)
        #[arg(long, short = 'm')]
        metadata: Option<PathBuf>,
        /// Name to save under when the metadata carries none
        #[arg(long)]
        name: Option<String>,
        /// Destination directory (overrides transfer.download_dir)
        #[arg(long, short = 'o')]
        out_dir: Option<PathBuf>,
    },

    /// List uploaded files
    List {
        /// List files shared with you instead
        #[arg(long)]
        shared: bool,
    },

    /// Delete an uploaded file
    Delete {
        /// File id (see `safeshare list`)
        id: u64,
    },

    /// Share a file with other users
    Share {
        /// File id (see `safeshare list`)
        id: u64,
        /// Recipient email address (repeatable)
        #[arg(long = "email", short = 'e', required = true)]
        emails: Vec<String>,
    },

    /// Show storage usage and role
    Usage,

    // ── Offline commands ───────────────────────────────────────────────────────

    /// Encrypt a file to a local blob without contacting the backend
    Encrypt {
        /// Local file to encrypt
        path: PathBuf,
        /// Where to write the encrypted blob
        #[arg(long, short = 'o')]
        out: PathBuf,
        /// Where to write the metadata (contains the key)
        #[arg(long)]
        metadata_out: PathBuf,
    },

    /// Decrypt a local blob with its metadata file
    Decrypt {
        /// Encrypted blob file
        blob: PathBuf,
        /// Metadata file written by `encrypt` or `upload --metadata-out`
        #[arg(long, short = 'm')]
        metadata: PathBuf,
        /// Destination directory (overrides transfer.download_dir)
        #[arg(long, short = 'o')]
        out_dir: Option<PathBuf>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file)
    Show,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    let level = cli.log.as_deref().unwrap_or(&config.logging.level);
    let format = cli.log_format.map(LogFormat::from).unwrap_or(config.logging.format);
    init_logging(level, format);

    let token = cli.token.map(SecretString::from);

    match cli.command {
        Commands::Upload { path, public, expiry_days, metadata_out } => {
            cmd_upload(&config, token, &path, public, expiry_days, metadata_out.as_deref()).await
        }
        Commands::Download { link, metadata, name, out_dir } => {
            cmd_download(
                &config,
                token,
                &link,
                metadata.as_deref(),
                name.as_deref(),
                out_dir.as_deref(),
            )
            .await
        }
        Commands::List { shared } => cmd_list(&config, token, shared).await,
        Commands::Delete { id } => cmd_delete(&config, token, id).await,
        Commands::Share { id, emails } => cmd_share(&config, token, id, &emails).await,
        Commands::Usage => cmd_usage(&config, token).await,
        Commands::Encrypt { path, out, metadata_out } => {
            cmd_encrypt(&path, &out, &metadata_out).await
        }
        Commands::Decrypt { blob, metadata, out_dir } => {
            cmd_decrypt(&config, &blob, &metadata, out_dir.as_deref()).await
        }
        Commands::Config { action: ConfigAction::Show } => cmd_config_show(&config, &cli.config),
    }
}

// ── Logging ───────────────────────────────────────────────────────────────────

fn init_logging(level: &str, format: LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout is reserved for command output
    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

// ── Config loading ────────────────────────────────────────────────────────────

fn load_config(path: &Path) -> Result<SafeshareConfig> {
    SafeshareConfig::load(path).with_context(|| format!("loading config: {}", path.display()))
}

fn build_client(config: &SafeshareConfig, token: Option<SecretString>) -> Result<ApiClient> {
    if token.is_none() {
        tracing::warn!("no session token given (--token or SAFESHARE_TOKEN); requests are anonymous");
    }
    ApiClient::from_config(&config.server, token)
        .with_context(|| format!("configuring backend client for {}", config.server.base_url))
}

// ── Progress helpers ──────────────────────────────────────────────────────────

fn make_spinner(prefix: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{prefix:.bold} {spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_prefix(prefix.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

// ── `safeshare upload` ────────────────────────────────────────────────────────

/// Flags win over `[transfer]` defaults.
fn upload_options(
    config: &SafeshareConfig,
    public: bool,
    expiry_days: Option<u32>,
) -> Result<UploadOptions> {
    let expiry_days = match expiry_days {
        Some(days) => Some(ExpiryDays::new(days).context("invalid --expiry-days")?),
        None => config.default_expiry()?,
    };
    Ok(UploadOptions {
        status: if public { FileStatus::Public } else { config.transfer.default_status },
        expiry_days,
        max_bytes: config.transfer.max_upload_bytes,
    })
}

async fn cmd_upload(
    config: &SafeshareConfig,
    token: Option<SecretString>,
    path: &Path,
    public: bool,
    expiry_days: Option<u32>,
    metadata_out: Option<&Path>,
) -> Result<()> {
    let client = build_client(config, token)?;
    let options = upload_options(config, public, expiry_days)?;

    let file = read_plaintext(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;

    println!("Uploading {} → {}", path.display(), client.base_url());

    let pb = make_spinner("upload");
    pb.set_message(format!("encrypting {}", file.name));
    let outcome = upload_file(&client, file, &options).await;
    pb.finish_and_clear();
    let outcome = outcome.with_context(|| format!("uploading {}", path.display()))?;

    if let Some(out) = metadata_out {
        write_metadata(out, &outcome.metadata).await?;
    }

    let descriptor = &outcome.descriptor;
    println!("  id:      {}", descriptor.id);
    println!("  name:    {}", descriptor.name);
    println!("  bytes:   {} (encrypted {})", fmt_bytes(outcome.plaintext_bytes), fmt_bytes(descriptor.size));
    println!("  status:  {}", descriptor.status);
    println!("  expires: {}", fmt_expiry(descriptor));
    if let Some(link) = &descriptor.download_link {
        println!("  link:    {link}");
    }
    if let Some(out) = metadata_out {
        println!("  metadata written to {} (contains the decryption key)", out.display());
    }
    Ok(())
}

// ── `safeshare download` ──────────────────────────────────────────────────────

async fn cmd_download(
    config: &SafeshareConfig,
    token: Option<SecretString>,
    link: &str,
    metadata: Option<&Path>,
    name: Option<&str>,
    out_dir: Option<&Path>,
) -> Result<()> {
    let client = build_client(config, token)?;
    let handle = DownloadHandle::parse(link)?;
    let source = match metadata {
        Some(path) => MetadataSource::Provided(read_metadata(path).await?),
        None => MetadataSource::Fetch,
    };
    let dest = out_dir.unwrap_or(&config.transfer.download_dir);

    let pb = make_spinner("download");
    pb.set_message(handle.to_string());
    let outcome = download_file(&client, &handle, source, name, dest).await;
    pb.finish_and_clear();
    let outcome = outcome.with_context(|| format!("downloading {handle}"))?;

    println!("Saved {} ({}, {})", outcome.path.display(), outcome.media_type, fmt_bytes(outcome.bytes));
    Ok(())
}

// ── `safeshare list` ──────────────────────────────────────────────────────────

async fn cmd_list(config: &SafeshareConfig, token: Option<SecretString>, shared: bool) -> Result<()> {
    let client = build_client(config, token)?;
    let files = if shared {
        client.list_shared().await.context("listing shared files")?
    } else {
        client.list_uploaded().await.context("listing uploaded files")?
    };

    if files.is_empty() {
        println!("no files");
        return Ok(());
    }

    println!("{:>6}  {:<32}  {:>10}  {:<8}  {:<20}  LINK", "ID", "NAME", "SIZE", "STATUS", "EXPIRES");
    for file in &files {
        println!(
            "{:>6}  {:<32}  {:>10}  {:<8}  {:<20}  {}",
            file.id,
            file.name,
            fmt_bytes(file.size),
            file.status,
            fmt_expiry(file),
            file.download_link.as_deref().unwrap_or("-"),
        );
    }
    Ok(())
}

// ── `safeshare delete` / `safeshare share` ────────────────────────────────────

async fn cmd_delete(config: &SafeshareConfig, token: Option<SecretString>, id: u64) -> Result<()> {
    let client = build_client(config, token)?;
    client
        .delete_file(id)
        .await
        .with_context(|| format!("deleting file {id}"))?;
    println!("Deleted file {id}");
    Ok(())
}

async fn cmd_share(
    config: &SafeshareConfig,
    token: Option<SecretString>,
    id: u64,
    emails: &[String],
) -> Result<()> {
    let client = build_client(config, token)?;
    let descriptor = client
        .share_file(id, emails)
        .await
        .with_context(|| format!("sharing file {id}"))?;
    println!("Shared file {id} with {}", emails.join(", "));
    println!("  status:  {}", descriptor.status);
    // sharing issues a new link; the previous one stops working
    if let Some(link) = &descriptor.download_link {
        println!("  link:    {link}");
    }
    Ok(())
}

// ── `safeshare usage` ─────────────────────────────────────────────────────────

async fn cmd_usage(config: &SafeshareConfig, token: Option<SecretString>) -> Result<()> {
    let client = build_client(config, token)?;
    let data = client.user_data().await.context("fetching user data")?;

    println!("user:    {}", if data.name.is_empty() { "-" } else { data.name.as_str() });
    println!("role:    {}", data.current_role);
    println!("files:   {}", data.total_files_shared);
    match data.allocated_storage {
        Some(allocated) => println!(
            "storage: {} of {}",
            fmt_bytes(data.used_storage),
            fmt_bytes(allocated)
        ),
        None => println!("storage: {}", fmt_bytes(data.used_storage)),
    }
    Ok(())
}

// ── `safeshare encrypt` / `safeshare decrypt` ─────────────────────────────────

async fn cmd_encrypt(path: &Path, out: &Path, metadata_out: &Path) -> Result<()> {
    let file = read_plaintext(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let size = file.bytes.len() as u64;

    let (blob, metadata) = encrypt_file(file)
        .await
        .with_context(|| format!("encrypting {}", path.display()))?;

    tokio::fs::write(out, &blob.ciphertext)
        .await
        .with_context(|| format!("writing {}", out.display()))?;
    write_metadata(metadata_out, &metadata).await?;

    println!("Encrypted {} → {}", path.display(), out.display());
    println!("  bytes:    {} (encrypted {})", fmt_bytes(size), fmt_bytes(blob.len() as u64));
    println!("  metadata: {} (contains the decryption key)", metadata_out.display());
    Ok(())
}

async fn cmd_decrypt(
    config: &SafeshareConfig,
    blob_path: &Path,
    metadata_path: &Path,
    out_dir: Option<&Path>,
) -> Result<()> {
    let metadata = read_metadata(metadata_path).await?;
    let ciphertext = tokio::fs::read(blob_path)
        .await
        .with_context(|| format!("reading {}", blob_path.display()))?;

    let name = metadata
        .original_name
        .clone()
        .unwrap_or_else(|| default_decrypted_name(blob_path));
    let blob = EncryptedBlob::new(ciphertext, guess_media_type(&name));

    let decrypted = decrypt_file(blob, metadata, name)
        .await
        .with_context(|| format!("decrypting {}", blob_path.display()))?;

    let dest = out_dir.unwrap_or(&config.transfer.download_dir);
    let saved = save_decrypted(&decrypted, dest)
        .with_context(|| format!("saving into {}", dest.display()))?;

    println!("Saved {} ({})", saved.display(), fmt_bytes(decrypted.bytes.len() as u64));
    Ok(())
}

/// `report.pdf.enc` → `report.pdf`; anything else keeps its name.
fn default_decrypted_name(blob_path: &Path) -> String {
    let name = blob_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match name.strip_suffix(".enc") {
        Some(stripped) if !stripped.is_empty() => stripped.to_string(),
        _ => name,
    }
}

async fn read_metadata(path: &Path) -> Result<EncryptionMetadata> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading metadata: {}", path.display()))?;
    let metadata = EncryptionMetadata::from_json(&content)
        .with_context(|| format!("parsing metadata: {}", path.display()))?;
    metadata
        .validate()
        .with_context(|| format!("validating metadata: {}", path.display()))?;
    Ok(metadata)
}

/// Metadata holds the file key: never replace an existing file, and on unix
/// create it owner-only from the start.
async fn write_metadata(path: &Path, metadata: &EncryptionMetadata) -> Result<()> {
    use tokio::io::AsyncWriteExt;

    let rendered = metadata.to_json_pretty()?;
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options
        .open(path)
        .await
        .with_context(|| format!("creating metadata file: {}", path.display()))?;
    file.write_all(rendered.as_bytes())
        .await
        .with_context(|| format!("writing metadata: {}", path.display()))?;
    file.flush()
        .await
        .with_context(|| format!("writing metadata: {}", path.display()))?;
    Ok(())
}

// ── `safeshare config show` ───────────────────────────────────────────────────

fn cmd_config_show(config: &SafeshareConfig, config_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!("# Configuration from: {}", config_path.display());
    } else {
        println!("# Configuration: defaults (no file at {})", config_path.display());
    }
    println!();
    let rendered = toml::to_string_pretty(config).context("serializing config to TOML")?;
    print!("{rendered}");
    Ok(())
}

// ── Utilities ─────────────────────────────────────────────────────────────────

fn fmt_expiry(file: &FileDescriptor) -> String {
    match file.expiry_date {
        Some(date) if file.is_expired_at(chrono::Utc::now()) => {
            format!("{} (expired)", date.format("%Y-%m-%d %H:%M"))
        }
        Some(date) => date.format("%Y-%m-%d %H:%M").to_string(),
        None => "never".to_string(),
    }
}

fn fmt_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
