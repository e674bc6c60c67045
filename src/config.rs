//! Runtime configuration.
//!
//! Values come from an optional TOML file and are overridden by CLI flags.
//! The result is a single immutable [`Config`] handed to each component.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::cli::ScanArgs;
use crate::error::{Error, Result};
use crate::report::Limits;

const DEFAULT_EXCLUDED_EXTENSIONS: &[&str] = &[
    "tmp", "temp", "log", "bak", "swp", "lock", "txt", "xml", "cache", "sql", "zip", "rar", "tar",
    "gz", "7z",
];

const DEFAULT_EXCLUDED_DIRS: &[&str] = &[
    "vendor", "cache", "tmp", "temp", "logs", "backup", "archives", ".git", ".idea", "node_modules",
];

const DEFAULT_EXCLUDED_TABLES: &[&str] = &["logs", "sessions", "cache_table", "transients"];

const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(60 * 60);
const DEFAULT_TIME_BUDGET: Duration = Duration::from_secs(10 * 60);
const DEFAULT_SUBJECT: &str = "Site Changes Detected (Detailed Report)";

/// On-disk shape of config.toml. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub monitor_dir: Option<PathBuf>,
    pub state_file: Option<PathBuf>,
    pub scan_interval: Option<String>,
    pub time_budget: Option<String>,
    pub excluded_dirs: Option<Vec<String>>,
    pub excluded_extensions: Option<Vec<String>>,
    pub excluded_tables: Option<Vec<String>>,
    pub database: DatabaseSection,
    pub report: ReportSection,
    pub mail: Option<MailConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseSection {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportSection {
    pub content_chars: Option<usize>,
    pub field_chars: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MailConfig {
    /// Program and arguments; the message is written to its stdin.
    pub command: Vec<String>,
    pub from: String,
    pub to: String,
    #[serde(default = "default_subject")]
    pub subject: String,
}

fn default_subject() -> String {
    DEFAULT_SUBJECT.to_string()
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", "sitewatch")
}

/// ~/.config/sitewatch/config.toml or platform equivalent
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|d| d.config_dir().join("config.toml"))
}

/// ~/.local/share/sitewatch/scan_state.json or platform equivalent
pub fn default_state_path() -> PathBuf {
    project_dirs()
        .map(|d| d.data_dir().join("scan_state.json"))
        .unwrap_or_else(|| PathBuf::from("scan_state.json"))
}

impl ConfigFile {
    /// An explicit path must exist; the default location is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => match default_config_path() {
                Some(p) if p.exists() => p,
                _ => return Ok(ConfigFile::default()),
            },
        };

        let text = std::fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::parse(&text).map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    pub fn parse(text: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn state_file(&self, flag: Option<&Path>) -> PathBuf {
        flag.map(Path::to_path_buf)
            .or_else(|| self.state_file.clone())
            .unwrap_or_else(default_state_path)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub monitor_dir: PathBuf,
    pub database: Option<PathBuf>,
    pub state_file: PathBuf,
    pub excluded_dirs: BTreeSet<String>,
    /// lower-cased, without the leading dot
    pub excluded_extensions: BTreeSet<String>,
    pub excluded_tables: BTreeSet<String>,
    pub scan_interval: Duration,
    pub time_budget: Duration,
    pub limits: Limits,
    pub mail: Option<MailConfig>,
    pub dry_run: bool,
}

impl Config {
    pub fn from_scan_args(file: ConfigFile, args: &ScanArgs) -> Result<Self> {
        let state_file = file.state_file(args.state_file.as_deref());

        let monitor_dir = args
            .root
            .clone()
            .or(file.monitor_dir)
            .ok_or_else(|| Error::Config("no monitor_dir configured (use --root)".to_string()))?;

        let scan_interval = match file.scan_interval {
            Some(s) => parse_duration("scan_interval", &s)?,
            None => DEFAULT_SCAN_INTERVAL,
        };

        let time_budget = match args.time_budget.as_ref().or(file.time_budget.as_ref()) {
            Some(s) => parse_duration("time_budget", s)?,
            None => DEFAULT_TIME_BUDGET,
        };

        let defaults = Limits::default();
        let limits = Limits {
            content_chars: file.report.content_chars.unwrap_or(defaults.content_chars),
            field_chars: file.report.field_chars.unwrap_or(defaults.field_chars),
        };

        if let Some(mail) = &file.mail {
            if mail.command.is_empty() {
                return Err(Error::Config("mail.command must name a program".to_string()));
            }
        }

        Ok(Config {
            monitor_dir,
            database: args.database.clone().or(file.database.path),
            state_file,
            excluded_dirs: to_set(file.excluded_dirs, DEFAULT_EXCLUDED_DIRS, false),
            excluded_extensions: to_set(file.excluded_extensions, DEFAULT_EXCLUDED_EXTENSIONS, true),
            excluded_tables: to_set(file.excluded_tables, DEFAULT_EXCLUDED_TABLES, false),
            scan_interval,
            time_budget,
            limits,
            mail: file.mail,
            dry_run: args.dry_run,
        })
    }

    pub fn subject(&self) -> &str {
        self.mail
            .as_ref()
            .map(|m| m.subject.as_str())
            .unwrap_or(DEFAULT_SUBJECT)
    }

    /// Defaults only, rooted at `monitor_dir`.
    pub fn for_root(monitor_dir: impl Into<PathBuf>, state_file: impl Into<PathBuf>) -> Self {
        Config {
            monitor_dir: monitor_dir.into(),
            database: None,
            state_file: state_file.into(),
            excluded_dirs: to_set(None, DEFAULT_EXCLUDED_DIRS, false),
            excluded_extensions: to_set(None, DEFAULT_EXCLUDED_EXTENSIONS, true),
            excluded_tables: to_set(None, DEFAULT_EXCLUDED_TABLES, false),
            scan_interval: DEFAULT_SCAN_INTERVAL,
            time_budget: DEFAULT_TIME_BUDGET,
            limits: Limits::default(),
            mail: None,
            dry_run: false,
        }
    }
}

fn to_set(values: Option<Vec<String>>, defaults: &[&str], lowercase: bool) -> BTreeSet<String> {
    let values = values.unwrap_or_else(|| defaults.iter().map(|s| s.to_string()).collect());
    values
        .into_iter()
        .map(|v| {
            if lowercase {
                v.trim_start_matches('.').to_lowercase()
            } else {
                v
            }
        })
        .collect()
}

fn parse_duration(field: &str, value: &str) -> Result<Duration> {
    humantime::parse_duration(value)
        .map_err(|e| Error::Config(format!("invalid {field} '{value}': {e}")))
}
