//! # Format/Filter Configuration (`pipeline::configure`)
//!
//! File: cli/src/pipeline/configure.rs
//!
//! Applies the format, the optional filter and, for zip only, the options
//! string and passphrase to a freshly created writer. Order is fixed: format,
//! then filter, then options, then passphrase. A passphrase given for any
//! other format is ignored with a warning, and so is a non-default options
//! string that never reaches the writer.
//!
use crate::common::archive::format::FormatCode;
use crate::common::archive::writer::ArchiveWriter;
use crate::core::error::Result;
use crate::pipeline::DEFAULT_OPTIONS;
use tracing::{debug, warn};

pub fn configure(
    writer: &mut ArchiveWriter<'_>,
    format: i32,
    filter: Option<i32>,
    passphrase: Option<&str>,
    options: &str,
) -> Result<()> {
    writer.set_format(format)?;
    if let Some(filter) = filter {
        writer.add_filter(filter)?;
    }

    if let Some(options) = unapplied_options(writer.format(), passphrase, options) {
        warn!(
            "Options '{}' ignored: options are only applied to zip archives with a passphrase",
            options
        );
    }

    let Some(passphrase) = passphrase else {
        return Ok(());
    };
    if writer.format() == Some(FormatCode::Zip) {
        debug!("Enabling zip encryption with options: {}", options);
        writer.set_options(options)?;
        writer.set_passphrase(passphrase)?;
    } else {
        warn!(
            "Passphrase ignored: {} archives do not support encryption",
            writer.format().map_or("this format", FormatCode::name)
        );
    }
    Ok(())
}

/// The options string, when it was set explicitly but will not be applied.
fn unapplied_options<'o>(
    format: Option<FormatCode>,
    passphrase: Option<&str>,
    options: &'o str,
) -> Option<&'o str> {
    let applied = format == Some(FormatCode::Zip) && passphrase.is_some();
    let explicit = !options.is_empty() && options != DEFAULT_OPTIONS;
    (explicit && !applied).then_some(options)
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::archive::format::*;
    use crate::common::archive::writer::Phase;

    #[test]
    fn test_configure_tar_with_filter() {
        let mut writer = ArchiveWriter::new();
        configure(
            &mut writer,
            ARCHIVE_FORMAT_TAR_USTAR,
            Some(ARCHIVE_FILTER_GZIP),
            None,
            "",
        )
        .unwrap();
        assert_eq!(writer.format(), Some(FormatCode::TarUstar));
        assert_eq!(writer.filter(), Some(FilterCode::Gzip));
        assert_eq!(writer.phase(), Phase::Configured);
    }

    #[test]
    fn test_passphrase_ignored_for_tar() {
        let mut writer = ArchiveWriter::new();
        // An invalid options string would fail if it were applied.
        configure(&mut writer, ARCHIVE_FORMAT_TAR_GNUTAR, None, Some("pw"), "zip:bogus").unwrap();
        assert_eq!(writer.error_string(), None);
    }

    #[test]
    fn test_zip_options_applied_with_passphrase() {
        let mut writer = ArchiveWriter::new();
        let err = configure(&mut writer, ARCHIVE_FORMAT_ZIP, None, Some("pw"), "zip:bogus")
            .unwrap_err();
        assert_eq!(err.to_string(), "Undefined option: `zip:bogus'");
    }

    #[test]
    fn test_options_without_passphrase_are_not_applied() {
        let mut writer = ArchiveWriter::new();
        // Invalid keys would fail here if the string reached set_options.
        configure(
            &mut writer,
            ARCHIVE_FORMAT_TAR_USTAR,
            Some(ARCHIVE_FILTER_GZIP),
            None,
            "gzip:bogus,totally:wrong",
        )
        .unwrap();
        assert_eq!(writer.error_string(), None);

        let tar = Some(FormatCode::TarUstar);
        let zip = Some(FormatCode::Zip);
        assert_eq!(
            unapplied_options(tar, None, "gzip:compression-level=1"),
            Some("gzip:compression-level=1")
        );
        assert_eq!(
            unapplied_options(zip, None, "zip:compression=store"),
            Some("zip:compression=store")
        );
        assert_eq!(
            unapplied_options(tar, Some("pw"), "zip:encryption=aes256"),
            Some("zip:encryption=aes256")
        );
        assert_eq!(unapplied_options(zip, Some("pw"), "zip:encryption=aes256"), None);
        assert_eq!(unapplied_options(tar, None, DEFAULT_OPTIONS), None);
        assert_eq!(unapplied_options(tar, None, ""), None);
    }

    #[test]
    fn test_unsupported_filter_fails() {
        let mut writer = ArchiveWriter::new();
        let err = configure(
            &mut writer,
            ARCHIVE_FORMAT_ZIP,
            Some(ARCHIVE_FILTER_COMPRESS),
            None,
            "",
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Unsupported filter: compress");
    }
}
