//! Command-line argument parsing.
//!
//! Every validation failure is a distinct [`ArgsError`]. `-h` wins over any other
//! error on the command line.

use std::{path::PathBuf, sync::OnceLock};

use regex::Regex;

use crate::config::Config;

/// Validated options for one export run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportOptions {
    /// Short names to export. Empty means "every set of the account".
    pub sticker_set_names: Vec<String>,
    pub directory: PathBuf,
    pub save_session: bool,
    pub app_id: i32,
    pub app_hash: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Help,
    Export(ExportOptions),
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ArgsError {
    #[error("{0} option is provided more than one time")]
    DuplicateOption(&'static str),

    #[error("option {0} requires a value")]
    MissingValue(String),

    #[error("--app-id value has to be a 32-bit integer, got \"{0}\"")]
    InvalidAppId(String),

    #[error("--app-hash value has to be a hex string of 32 characters, got \"{0}\"")]
    InvalidAppHash(String),

    #[error("\"{0}\" is not a sticker set name or URL")]
    InvalidStickerSet(String),

    #[error("--app-hash is provided, but --app-id isn't")]
    AppHashWithoutAppId,

    #[error("--app-id is provided, but --app-hash isn't")]
    AppIdWithoutAppHash,
}

fn sticker_set_url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:https?://)?[^/]+/addstickers/([A-Za-z0-9_]{5,32})(?:/.*)?$")
            .expect("valid regex")
    })
}

fn sticker_set_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_]{5,32}$").expect("valid regex"))
}

/// Extract a sticker set short name from a bare name or an `/addstickers/` URL.
pub fn sticker_set_name(token: &str) -> Option<String> {
    if let Some(caps) = sticker_set_url_re().captures(token) {
        return caps.get(1).map(|m| m.as_str().to_string());
    }
    if sticker_set_name_re().is_match(token) {
        return Some(token.to_string());
    }
    None
}

pub fn is_app_hash(s: &str) -> bool {
    s.len() == 32 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

#[derive(Default)]
struct Parsed {
    names: Vec<String>,
    directory: Option<PathBuf>,
    dont_save_session: bool,
    app_id: Option<i32>,
    app_hash: Option<String>,
}

/// Parse arguments (program name already stripped).
///
/// Tokens are processed left to right. The first validation error is kept, but
/// scanning continues so a later `-h`/`--help` still returns [`Command::Help`].
pub fn parse_args<I, S>(args: I, cfg: &Config) -> Result<Command, ArgsError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let args: Vec<String> = args.into_iter().map(Into::into).collect();
    let mut parsed = Parsed::default();
    let mut first_error: Option<ArgsError> = None;

    let mut i = 0;
    while i < args.len() {
        let arg = args[i].as_str();
        let step = match arg {
            "-h" | "--help" => return Ok(Command::Help),
            // Ignored for compatibility with the older CLI.
            "-s" | "--stickerpacks" => Ok(()),
            "-d" | "--directory" => take_value(&args, &mut i).and_then(|v| {
                if parsed.directory.is_some() {
                    return Err(ArgsError::DuplicateOption("--directory"));
                }
                parsed.directory = Some(PathBuf::from(v));
                Ok(())
            }),
            "--dont-save-session" => {
                if parsed.dont_save_session {
                    Err(ArgsError::DuplicateOption("--dont-save-session"))
                } else {
                    parsed.dont_save_session = true;
                    Ok(())
                }
            }
            "--app-id" => take_value(&args, &mut i).and_then(|v| {
                if parsed.app_id.is_some() {
                    return Err(ArgsError::DuplicateOption("--app-id"));
                }
                let id = v
                    .parse::<i32>()
                    .map_err(|_| ArgsError::InvalidAppId(v.to_string()))?;
                parsed.app_id = Some(id);
                Ok(())
            }),
            "--app-hash" => take_value(&args, &mut i).and_then(|v| {
                if parsed.app_hash.is_some() {
                    return Err(ArgsError::DuplicateOption("--app-hash"));
                }
                if !is_app_hash(v) {
                    return Err(ArgsError::InvalidAppHash(v.to_string()));
                }
                parsed.app_hash = Some(v.to_string());
                Ok(())
            }),
            other => match sticker_set_name(other) {
                Some(name) => {
                    parsed.names.push(name);
                    Ok(())
                }
                None => Err(ArgsError::InvalidStickerSet(other.to_string())),
            },
        };

        if let Err(e) = step {
            first_error.get_or_insert(e);
        }
        i += 1;
    }

    if let Some(e) = first_error {
        return Err(e);
    }

    let (app_id, app_hash) = match (parsed.app_id, parsed.app_hash) {
        (Some(id), Some(hash)) => (id, hash),
        (None, None) => (cfg.default_app_id, cfg.default_app_hash.clone()),
        (None, Some(_)) => return Err(ArgsError::AppHashWithoutAppId),
        (Some(_), None) => return Err(ArgsError::AppIdWithoutAppHash),
    };

    Ok(Command::Export(ExportOptions {
        sticker_set_names: parsed.names,
        directory: parsed
            .directory
            .unwrap_or_else(|| cfg.default_directory.clone()),
        save_session: !parsed.dont_save_session,
        app_id,
        app_hash,
    }))
}

fn take_value<'a>(args: &'a [String], i: &mut usize) -> Result<&'a str, ArgsError> {
    let option = &args[*i];
    if *i + 1 >= args.len() {
        return Err(ArgsError::MissingValue(option.clone()));
    }
    *i += 1;
    Ok(args[*i].as_str())
}

pub fn help_message(cfg: &Config) -> String {
    format!(
        "usage: {prog} [-h] [-d DIRECTORY] [--dont-save-session] [--app-id APP_ID] [--app-hash APP_HASH] [STICKER_SETS ...]

Export sticker sets from telegram.

positional arguments:
  STICKER_SETS          Sticker set names or urls

options:
  -h, --help            Show this help message and exit
  -d DIRECTORY, --directory DIRECTORY
                        Directory to export stickers to
  --dont-save-session   Don't save session file (and don't use already saved one)
  --app-id APP_ID       Test credentials are used by default
  --app-hash APP_HASH   Test credentials are used by default
  -s, --stickerpacks    Ignored for compatibility

{session}
",
        prog = cfg.program_name,
        session = match &cfg.session_file {
            Some(path) => format!("Session file is saved to {}", path.display()),
            None => "Session file location is unknown: set XDG_DATA_HOME or HOME".to_string(),
        },
    )
}
