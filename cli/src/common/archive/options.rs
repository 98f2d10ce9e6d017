//! # arcwrite Option Strings (`common::archive::options`)
//!
//! File: cli/src/common/archive/options.rs
//!
//! ## Overview
//!
//! Parses libarchive-style option strings such as
//! `"zip:encryption=zipcrypt,gzip:compression-level=9"` and applies the
//! individual settings to the format or filter module they address.
//!
//! Grammar: comma-separated items, each `[module:]key[=value]` or
//! `[module:]!key`. A bare `key` means "enabled" (value `"1"`), `!key` means
//! "disabled" (no value).
//!
use crate::common::archive::format::FilterCode;

/// One parsed `module:key=value` item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveOption {
    pub module: Option<String>,
    pub key: String,
    /// `None` when the option was negated with `!`.
    pub value: Option<String>,
}

impl ArchiveOption {
    /// `module:key` or just `key`, as shown in diagnostics.
    pub fn qualified_key(&self) -> String {
        match &self.module {
            Some(module) => format!("{}:{}", module, self.key),
            None => self.key.clone(),
        }
    }
}

/// Splits an option string into items. Empty items are skipped.
pub fn parse_options(options: &str) -> Result<Vec<ArchiveOption>, String> {
    let mut parsed = Vec::new();
    for item in options.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (module, rest) = match item.split_once(':') {
            // A ':' inside the value (e.g. "key=a:b") is not a module separator.
            Some((module, rest)) if !module.contains('=') => (Some(module.trim()), rest.trim()),
            _ => (None, item),
        };
        if module == Some("") {
            return Err(format!("Empty module name in option `{}'", item));
        }

        let (key, value) = if let Some(negated) = rest.strip_prefix('!') {
            (negated.trim(), None)
        } else {
            match rest.split_once('=') {
                Some((key, value)) => (key.trim(), Some(value.trim().to_string())),
                None => (rest, Some("1".to_string())),
            }
        };
        if key.is_empty() {
            return Err(format!("Empty option name in `{}'", item));
        }

        parsed.push(ArchiveOption {
            module: module.map(str::to_string),
            key: key.to_string(),
            value,
        });
    }
    Ok(parsed)
}

/// Encryption methods the zip writer supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZipEncryption {
    /// PKWARE traditional ("ZipCrypto") encryption.
    Traditional,
    Aes128,
    Aes256,
}

/// Settings addressable as `zip:<key>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZipSettings {
    pub encryption: Option<ZipEncryption>,
    /// Store entries uncompressed instead of deflating them.
    pub store: bool,
    pub level: Option<i64>,
}

impl ZipSettings {
    /// Returns `Ok(false)` for keys the zip module does not define.
    pub fn apply(&mut self, option: &ArchiveOption) -> Result<bool, String> {
        match option.key.as_str() {
            "encryption" => {
                self.encryption = match option.value.as_deref() {
                    None => None,
                    Some("zipcrypt") | Some("traditional") | Some("1") => {
                        Some(ZipEncryption::Traditional)
                    }
                    Some("aes128") => Some(ZipEncryption::Aes128),
                    Some("aes256") => Some(ZipEncryption::Aes256),
                    Some(other) => return Err(illegal_value(option, other)),
                };
                Ok(true)
            }
            "compression" => {
                self.store = match option.value.as_deref() {
                    Some("store") => true,
                    Some("deflate") | None => false,
                    Some(other) => return Err(illegal_value(option, other)),
                };
                Ok(true)
            }
            "compression-level" => {
                self.level = Some(parse_level(option, 0, 9)?);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// Settings addressable as `<filter>:<key>`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterSettings {
    pub level: Option<i64>,
}

impl FilterSettings {
    /// Returns `Ok(false)` for keys the filter does not define.
    pub fn apply(&mut self, filter: FilterCode, option: &ArchiveOption) -> Result<bool, String> {
        if option.key != "compression-level" {
            return Ok(false);
        }
        let (min, max) = match filter {
            FilterCode::None => return Ok(false),
            FilterCode::Gzip => (0, 9),
            FilterCode::Bzip2 => (1, 9),
            FilterCode::Zstd => (1, 22),
        };
        self.level = Some(parse_level(option, min, max)?);
        Ok(true)
    }
}

fn parse_level(option: &ArchiveOption, min: i64, max: i64) -> Result<i64, String> {
    let raw = option
        .value
        .as_deref()
        .ok_or_else(|| format!("Option `{}' requires a value", option.qualified_key()))?;
    match raw.parse::<i64>() {
        Ok(level) if (min..=max).contains(&level) => Ok(level),
        _ => Err(illegal_value(option, raw)),
    }
}

fn illegal_value(option: &ArchiveOption, value: &str) -> String {
    format!(
        "Illegal value `{}' for option `{}'",
        value,
        option.qualified_key()
    )
}
