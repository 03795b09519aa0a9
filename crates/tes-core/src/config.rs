use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::{errors::Error, Result};

pub const PROGRAM_NAME: &str = "telegram-export-stickers";

/// Public test credentials used when `--app-id`/`--app-hash` are not given.
pub const TEST_APP_ID: i32 = 17349;
pub const TEST_APP_HASH: &str = "344583e45741c457fe1862106095a5eb";

const SESSION_FILE_NAME: &str = "tg.session";

/// Typed configuration, built once at startup and passed to every component.
#[derive(Clone, Debug)]
pub struct Config {
    pub program_name: String,

    // Session; `None` when no data directory can be located
    pub session_file: Option<PathBuf>,
    pub phone: Option<String>,

    // Credentials and defaults
    pub default_app_id: i32,
    pub default_app_hash: String,
    pub default_directory: PathBuf,

    // Remote paging
    pub archived_page_size: i32,
    pub download_chunk_size: i32,

    // Sent with `initConnection`
    pub app_version: String,
    pub device_model: String,
    pub system_version: String,
    pub lang_code: String,
}

impl Config {
    /// Read the environment (and `.env`, if present). Never fails: a missing
    /// session location only matters once a session has to be persisted.
    pub fn load() -> Self {
        load_dotenv_if_present(Path::new(".env"));

        let mut cfg = Self::defaults(resolve_session_file(
            env_path("TES_SESSION_FILE"),
            env_path("XDG_DATA_HOME"),
            env_path("HOME"),
        ));
        cfg.phone = env_str("TELEGRAM_PHONE").and_then(non_empty);
        cfg
    }

    /// Defaults without touching the environment.
    pub fn with_session_file(session_file: PathBuf) -> Self {
        Self::defaults(Some(session_file))
    }

    /// The session file, or a config error naming the variables to set.
    pub fn require_session_file(&self) -> Result<&Path> {
        self.session_file.as_deref().ok_or_else(|| {
            Error::Config(
                "cannot locate the session file: set TES_SESSION_FILE, XDG_DATA_HOME or HOME"
                    .to_string(),
            )
        })
    }

    fn defaults(session_file: Option<PathBuf>) -> Self {
        Self {
            program_name: PROGRAM_NAME.to_string(),
            session_file,
            phone: None,
            default_app_id: TEST_APP_ID,
            default_app_hash: TEST_APP_HASH.to_string(),
            default_directory: PathBuf::from("stickers/"),
            archived_page_size: 100,
            // upload.getFile limit: multiple of 4 KiB, at most 1 MiB
            download_chunk_size: 512 * 1024,
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            device_model: "Unknown".to_string(),
            system_version: format!("{}/{}", env::consts::OS, env::consts::ARCH),
            lang_code: "en".to_string(),
        }
    }
}

/// `explicit`, else `<data home>/telegram-export-stickers/tg.session` where the
/// data home is an absolute `XDG_DATA_HOME` or `$HOME/.local/share`.
fn resolve_session_file(
    explicit: Option<PathBuf>,
    xdg_data_home: Option<PathBuf>,
    home: Option<PathBuf>,
) -> Option<PathBuf> {
    if explicit.is_some() {
        return explicit;
    }
    xdg_data_home
        .filter(|p| p.is_absolute())
        .or_else(|| home.map(|h| h.join(".local/share")))
        .map(|data| data.join(PROGRAM_NAME).join(SESSION_FILE_NAME))
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var_os(key)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Apply `.env` entries for variables that are not already set.
fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };
    for (key, value) in dotenv_entries(&contents) {
        if env::var_os(&key).is_none() {
            env::set_var(key, value);
        }
    }
}

/// `KEY=value` lines. `#` comments, an `export ` prefix and one pair of
/// matching quotes are accepted; malformed lines are skipped.
fn dotenv_entries(contents: &str) -> Vec<(String, String)> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let line = line.strip_prefix("export ").unwrap_or(line);
            let (key, value) = line.split_once('=')?;
            let key = key.trim();
            if key.is_empty() || key.contains(char::is_whitespace) {
                return None;
            }
            Some((key.to_string(), unquote(value.trim()).to_string()))
        })
        .collect()
}

fn unquote(value: &str) -> &str {
    for q in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(q)
            .and_then(|rest| rest.strip_suffix(q))
        {
            return inner;
        }
    }
    value
}

fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
