// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page store connection settings.
//
// Values come from the process environment first, then from a `.env` file in
// the working directory or its parent.

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::error::{PageScanError, Result};

pub const DB_HOST: &str = "DB_HOST";
pub const DB_USERNAME: &str = "DB_USERNAME";
pub const DB_PASSWORD: &str = "DB_PASSWORD";
pub const DB_NAME: &str = "DB_NAME";

/// Connection parameters for the relational page store.
#[derive(Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub host: String,
    pub username: String,
    pub password: String,
    pub database: String,
}

impl StoreConfig {
    /// Load from the environment, falling back to `.env` files.
    ///
    /// Fails with [`PageScanError::Config`] naming every missing key. No
    /// network I/O happens here.
    pub fn from_env() -> Result<Self> {
        let dotenv = load_dotenv(&default_dotenv_paths());
        Self::from_sources(|key| std::env::var(key).ok(), &dotenv)
    }

    /// Merge environment-style values with parsed `.env` values.
    ///
    /// Environment values are used exactly as given. One that is set but
    /// empty defers to the `.env` value for the same key, if any.
    pub fn from_sources<F>(env: F, dotenv: &HashMap<String, String>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::from_lookup(|key| match env(key) {
            Some(val) if !val.is_empty() => Some(val),
            Some(val) => dotenv.get(key).cloned().or(Some(val)),
            None => dotenv.get(key).cloned(),
        })
    }

    /// Build from an arbitrary key lookup.
    ///
    /// `DB_PASSWORD` may resolve to an empty string; the other keys must be
    /// non-empty.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut missing = Vec::new();
        let host = required(&lookup, DB_HOST, false, &mut missing);
        let username = required(&lookup, DB_USERNAME, false, &mut missing);
        let password = required(&lookup, DB_PASSWORD, true, &mut missing);
        let database = required(&lookup, DB_NAME, false, &mut missing);

        if !missing.is_empty() {
            return Err(PageScanError::Config(format!(
                "missing required setting(s): {}",
                missing.join(", ")
            )));
        }

        let config = Self {
            host,
            username,
            password,
            database,
        };
        debug!(config = %config.redacted(), "store configuration resolved");
        Ok(config)
    }

    /// Human-readable summary with the password masked.
    pub fn redacted(&self) -> String {
        format!(
            "host={} database={} username={} password={}",
            self.host,
            self.database,
            self.username,
            mask_secret(&self.password)
        )
    }
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &mask_secret(&self.password))
            .field("database", &self.database)
            .finish()
    }
}

fn required<F>(
    lookup: &F,
    key: &'static str,
    allow_empty: bool,
    missing: &mut Vec<&'static str>,
) -> String
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(val) if allow_empty || !val.is_empty() => val,
        _ => {
            missing.push(key);
            String::new()
        }
    }
}

/// Replace all but the last two characters with `*`.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    let keep = chars.len().min(2);
    let hidden = chars.len() - keep;
    let mut out = "*".repeat(hidden);
    out.extend(&chars[hidden..]);
    out
}

fn default_dotenv_paths() -> Vec<PathBuf> {
    let Ok(cwd) = std::env::current_dir() else {
        return Vec::new();
    };
    let mut paths = vec![cwd.join(".env")];
    if let Some(parent) = cwd.parent() {
        paths.push(parent.join(".env"));
    }
    paths
}

/// Read every `.env` file in `paths` that exists; earlier files take
/// precedence. A malformed line stops reading that file.
pub fn load_dotenv(paths: &[PathBuf]) -> HashMap<String, String> {
    let mut values = HashMap::new();
    for path in paths {
        if !path.is_file() {
            continue;
        }
        let entries = match dotenvy::from_path_iter(path) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "unreadable .env file skipped");
                continue;
            }
        };
        debug!(path = %path.display(), "loading .env file");
        for entry in entries {
            match entry {
                Ok((key, val)) => {
                    values.entry(key).or_insert(val);
                }
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "malformed .env line");
                    break;
                }
            }
        }
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn all_keys_present() {
        let config = StoreConfig::from_lookup(lookup_from(&[
            (DB_HOST, "db.internal"),
            (DB_USERNAME, "ingest"),
            (DB_PASSWORD, "hunter22"),
            (DB_NAME, "archive"),
        ]))
        .unwrap();
        assert_eq!(config.host, "db.internal");
        assert_eq!(config.database, "archive");
    }

    #[test]
    fn missing_keys_are_all_reported() {
        let err = StoreConfig::from_lookup(lookup_from(&[(DB_HOST, "localhost")])).unwrap_err();
        let msg = err.to_string();
        assert_eq!(err.kind(), "ConfigError");
        assert!(msg.contains(DB_USERNAME), "{msg}");
        assert!(msg.contains(DB_PASSWORD), "{msg}");
        assert!(msg.contains(DB_NAME), "{msg}");
        assert!(!msg.contains(DB_HOST), "{msg}");
    }

    #[test]
    fn empty_password_allowed_but_empty_host_is_not() {
        let ok = StoreConfig::from_lookup(lookup_from(&[
            (DB_HOST, "localhost"),
            (DB_USERNAME, "root"),
            (DB_PASSWORD, ""),
            (DB_NAME, "archive"),
        ]));
        assert!(ok.is_ok());

        let err = StoreConfig::from_lookup(lookup_from(&[
            (DB_HOST, ""),
            (DB_USERNAME, "root"),
            (DB_PASSWORD, ""),
            (DB_NAME, "archive"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains(DB_HOST));
    }

    #[test]
    fn debug_output_masks_password() {
        let config = StoreConfig {
            host: "localhost".into(),
            username: "root".into(),
            password: "supersecret".into(),
            database: "archive".into(),
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("supersecret"));
        assert!(debug.contains("*********et"));
        assert!(config.redacted().ends_with("password=*********et"));
    }

    #[test]
    fn mask_short_secrets() {
        assert_eq!(mask_secret(""), "");
        assert_eq!(mask_secret("ab"), "ab");
        assert_eq!(mask_secret("abc"), "*bc");
    }

    fn write_env(dir: &std::path::Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn dotenv_syntax() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_env(
            dir.path(),
            ".env",
            "# comment\n\nDB_HOST=\"db.example\"\nexport DB_NAME='archive'\nDB_USERNAME=ingest # service account\n",
        );
        let values = load_dotenv(&[path]);
        assert_eq!(values.get(DB_HOST).map(String::as_str), Some("db.example"));
        assert_eq!(values.get(DB_NAME).map(String::as_str), Some("archive"));
        assert_eq!(values.get(DB_USERNAME).map(String::as_str), Some("ingest"));
    }

    #[test]
    fn inline_comment_is_not_part_of_the_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_env(
            dir.path(),
            ".env",
            "DB_PASSWORD=s3cret # production\nDB_HOST=db # primary\n",
        );
        let values = load_dotenv(&[path]);
        assert_eq!(values.get(DB_PASSWORD).map(String::as_str), Some("s3cret"));
        assert_eq!(values.get(DB_HOST).map(String::as_str), Some("db"));
    }

    #[test]
    fn empty_password_in_dotenv_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_env(
            dir.path(),
            ".env",
            "DB_HOST=localhost\nDB_USERNAME=root\nDB_PASSWORD=\nDB_NAME=archive\n",
        );
        let dotenv = load_dotenv(&[path]);
        assert_eq!(dotenv.get(DB_PASSWORD).map(String::as_str), Some(""));

        let config = StoreConfig::from_sources(|_| None, &dotenv).unwrap();
        assert_eq!(config.password, "");
        assert_eq!(config.database, "archive");
    }

    #[test]
    fn environment_values_are_used_verbatim() {
        let env = lookup_from(&[
            (DB_HOST, " db.internal "),
            (DB_USERNAME, "ingest"),
            (DB_PASSWORD, "'pa ss'word'"),
            (DB_NAME, "\"archive\""),
        ]);
        let config = StoreConfig::from_sources(env, &HashMap::new()).unwrap();
        assert_eq!(config.password, "'pa ss'word'");
        assert_eq!(config.host, " db.internal ");
        assert_eq!(config.database, "\"archive\"");
    }

    #[test]
    fn environment_overrides_dotenv_unless_empty() {
        let dotenv: HashMap<String, String> = [
            (DB_HOST, "from-file"),
            (DB_USERNAME, "file-user"),
            (DB_PASSWORD, "file-pass"),
            (DB_NAME, "file-db"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let env = lookup_from(&[(DB_HOST, "from-env"), (DB_PASSWORD, "")]);

        let config = StoreConfig::from_sources(env, &dotenv).unwrap();
        assert_eq!(config.host, "from-env");
        assert_eq!(config.password, "file-pass");
        assert_eq!(config.username, "file-user");
    }

    #[test]
    fn earlier_dotenv_file_wins() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_env(dir.path(), "first.env", "DB_HOST=primary\n");
        let second = write_env(dir.path(), "second.env", "DB_HOST=fallback\nDB_NAME=archive\n");

        let values = load_dotenv(&[first, dir.path().join("absent.env"), second]);
        assert_eq!(values.get("DB_HOST").map(String::as_str), Some("primary"));
        assert_eq!(values.get("DB_NAME").map(String::as_str), Some("archive"));
    }
}
