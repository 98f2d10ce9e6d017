//! # arcwrite Create Command
//!
//! File: cli/src/commands/create.rs
//!
//! ## Overview
//!
//! Implements `arcwrite create`: writes one archive containing every given
//! path (directories recursively), using flags first, then the loaded
//! configuration, then built-in defaults.
//!
//! ## Architecture
//!
//! 1. Load configuration (`core::config::load_config`).
//! 2. Resolve format, filter, options string and block size.
//! 3. Write the archive:
//!    - `-o -`: to stdout through `create_stream`; the summary goes to stderr.
//!    - `-o FILE`: through `create_file`, after creating the parent directory.
//!      If the run fails, the partial file is removed.
//! 4. Print a summary line.
//!
//! ## Examples
//!
//! ```bash
//! arcwrite create -o site.tar.gz --filter gzip public/
//! ARCWRITE_PASSPHRASE=s3cret arcwrite create -o secrets.zip --format zip notes/
//! arcwrite create -o - --format cpio etc/ | ssh host 'cpio -idm'
//! ```
//!
use anyhow::{Context, Result};
use arcwrite::common::fs::io;
use arcwrite::core::config::{self, Config};
use arcwrite::{create_file, CreateOptions, FilterCode, FormatCode, SourceEntry, DEFAULT_OPTIONS};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// # Create Arguments (`CreateArgs`)
///
/// Command-line arguments for `arcwrite create`.
#[derive(Parser, Debug)]
pub struct CreateArgs {
    /// Archive to write, or `-` for standard output.
    #[arg(short, long, value_name = "OUT")]
    pub output: PathBuf,

    /// Archive format: tar, pax, ustar, gnutar, zip, cpio, odc.
    #[arg(short, long)]
    pub format: Option<String>,

    /// Compression filter: none, gzip, bzip2, zstd.
    #[arg(long)]
    pub filter: Option<String>,

    /// Encrypt zip entries with this passphrase. Ignored for other formats.
    #[arg(long, env = "ARCWRITE_PASSPHRASE", hide_env_values = true)]
    pub passphrase: Option<String>,

    /// Option string applied with the passphrase (e.g. `zip:encryption=aes256`).
    /// Only zip archives with a passphrase use it; otherwise it is ignored with a warning.
    #[arg(long)]
    pub options: Option<String>,

    /// Read chunk size in bytes.
    #[arg(long)]
    pub block_size: Option<usize>,

    /// Files and directories to archive.
    #[arg(required = true, value_name = "PATH")]
    pub paths: Vec<PathBuf>,
}

/// Settings after merging flags with the configuration.
#[derive(Debug, PartialEq, Eq)]
struct Resolved {
    format: FormatCode,
    filter: Option<FilterCode>,
    options: CreateOptions,
}

fn resolve(args: &CreateArgs, cfg: &Config) -> Result<Resolved> {
    let format_name = args.format.as_deref().unwrap_or(&cfg.create.format);
    let format = FormatCode::from_name(format_name)
        .with_context(|| format!("Unknown archive format '{}'", format_name))?;

    let filter = match args.filter.as_deref().or(cfg.create.filter.as_deref()) {
        None => None,
        Some(name) => match FilterCode::from_name(name) {
            Some(FilterCode::None) => None,
            Some(filter) => Some(filter),
            None => anyhow::bail!("Unknown filter '{}'", name),
        },
    };

    let block_size = args.block_size.unwrap_or(cfg.create.block_size);
    if block_size == 0 {
        anyhow::bail!("Block size must be greater than zero");
    }

    let mut options = CreateOptions::default().block_size(block_size).options(
        args.options
            .as_deref()
            .or(cfg.create.options.as_deref())
            .unwrap_or(DEFAULT_OPTIONS),
    );
    if let Some(filter) = filter {
        options = options.filter(filter.code());
    }
    if let Some(passphrase) = &args.passphrase {
        options = options.passphrase(passphrase.as_str());
    }

    Ok(Resolved {
        format,
        filter,
        options,
    })
}

/// # Handle Create Command (`handle_create`)
///
/// Writes the archive described by `args`.
///
/// ## Returns
///
/// * `Ok(())` once the archive is complete and closed.
/// * `Err` if configuration is invalid or any step of archive creation
///   fails. No output file is left behind in that case.
pub fn handle_create(args: CreateArgs) -> Result<()> {
    info!("Handling create command...");
    let cfg = config::load_config().context("Failed to load arcwrite configuration")?;
    let resolved = resolve(&args, &cfg)?;
    debug!("Resolved create settings: {:?}", resolved);

    let label = match resolved.filter {
        Some(filter) => format!("{}+{}", resolved.format.name(), filter.name()),
        None => resolved.format.name().to_string(),
    };

    if args.output == Path::new("-") {
        let entries = write_stdout(&resolved, &args.paths)?;
        eprintln!("Archived {} entries to <stdout> ({})", entries.len(), label);
        return Ok(());
    }

    let output = cfg.resolve_output(&args.output);
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        io::ensure_dir_exists(parent)?;
    }

    let entries = match create_file(
        &output,
        resolved.format.code(),
        &args.paths,
        &resolved.options,
    ) {
        Ok(entries) => entries,
        Err(e) => {
            io::remove_partial_output(&output)?;
            return Err(e)
                .with_context(|| format!("Failed to create archive '{}'", output.display()));
        }
    };
    println!(
        "Archived {} entries to {} ({})",
        entries.len(),
        output.display(),
        label
    );
    Ok(())
}

#[cfg(unix)]
fn write_stdout(resolved: &Resolved, paths: &[PathBuf]) -> Result<Vec<SourceEntry>> {
    let stdout = std::io::stdout();
    arcwrite::create_stream(&stdout, resolved.format.code(), paths, &resolved.options)
        .context("Failed to write archive to standard output")
}

#[cfg(not(unix))]
fn write_stdout(_resolved: &Resolved, _paths: &[PathBuf]) -> Result<Vec<SourceEntry>> {
    anyhow::bail!("Writing archives to standard output is only supported on Unix")
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use arcwrite::core::config::CreateDefaults;

    fn parse(args: &[&str]) -> CreateArgs {
        CreateArgs::try_parse_from(std::iter::once("create").chain(args.iter().copied()))
            .expect("arguments should parse")
    }

    #[test]
    fn test_requires_output_and_paths() {
        assert!(CreateArgs::try_parse_from(["create", "dir"]).is_err());
        assert!(CreateArgs::try_parse_from(["create", "-o", "a.tar"]).is_err());
    }

    #[test]
    fn test_flags_override_config() -> Result<()> {
        let cfg = Config {
            create: CreateDefaults {
                format: "zip".into(),
                filter: Some("bzip2".into()),
                block_size: 1024,
                options: Some("zip:encryption=aes128".into()),
            },
            ..Default::default()
        };

        let resolved = resolve(&parse(&["-o", "x", "dir"]), &cfg)?;
        assert_eq!(resolved.format, FormatCode::Zip);
        assert_eq!(resolved.filter, Some(FilterCode::Bzip2));
        assert_eq!(resolved.options.block_size, 1024);
        assert_eq!(resolved.options.options, "zip:encryption=aes128");

        let resolved = resolve(
            &parse(&["-o", "x", "-f", "gnutar", "--filter", "none", "--block-size", "64", "dir"]),
            &cfg,
        )?;
        assert_eq!(resolved.format, FormatCode::TarGnu);
        assert_eq!(resolved.filter, None);
        assert_eq!(resolved.options.filter, None);
        assert_eq!(resolved.options.block_size, 64);
        Ok(())
    }

    #[test]
    fn test_defaults_without_config() -> Result<()> {
        let resolved = resolve(&parse(&["-o", "x", "dir"]), &Config::default())?;
        assert_eq!(resolved.format, FormatCode::TarPaxRestricted);
        assert_eq!(resolved.options, CreateOptions::default());
        Ok(())
    }

    #[test]
    fn test_rejects_unknown_names() {
        let cfg = Config::default();
        assert!(resolve(&parse(&["-o", "x", "-f", "rar", "dir"]), &cfg).is_err());
        assert!(resolve(&parse(&["-o", "x", "--filter", "xz", "dir"]), &cfg).is_err());
        assert!(resolve(&parse(&["-o", "x", "--block-size", "0", "dir"]), &cfg).is_err());
    }
}
