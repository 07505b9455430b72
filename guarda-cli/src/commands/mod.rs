//! CLI command implementations

pub mod account;
pub mod balance;
pub mod biometric;
pub mod document;
pub mod expense;
pub mod login;
pub mod logs;
pub mod register;

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use dialoguer::Password;
use serde::Serialize;

use crate::output;
use guarda_core::domain::result::{Error as CoreError, Result as CoreResult};
use guarda_core::{
    EntryPoint, FilePayload, GuardaContext, LogEvent, LoggingService, Operation, OperationResult,
};

/// Env var holding the account password for non-interactive use
const PASSWORD_ENV: &str = "GUARDA_PASSWORD";

/// A failure already rendered to the user as an envelope
#[derive(Debug)]
pub struct Reported {
    pub status: u16,
    /// Failure that never reached the core, kept for the event log
    pub cause: Option<String>,
}

impl fmt::Display for Reported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "operation failed with status {}", self.status)
    }
}

impl std::error::Error for Reported {}

/// Handles opened once per process and shared by every command.
///
/// The event log is opened here and nowhere else: a second handle on the
/// same logs.duckdb in one process would drop its writes.
pub struct Session {
    guarda_dir: PathBuf,
    logger: Option<Arc<LoggingService>>,
}

impl Session {
    pub fn open() -> Self {
        Self::in_dir(get_guarda_dir())
    }

    pub fn in_dir(guarda_dir: PathBuf) -> Self {
        // Logging failures never block a command
        let logger = std::fs::create_dir_all(&guarda_dir)
            .ok()
            .and_then(|_| {
                LoggingService::new(&guarda_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION")).ok()
            })
            .map(Arc::new);
        Self { guarda_dir, logger }
    }

    pub fn logger(&self) -> Option<&LoggingService> {
        self.logger.as_deref()
    }

    /// Log an event, ignoring any errors
    pub fn log(&self, event: LogEvent) {
        if let Some(logger) = &self.logger {
            let _ = logger.log(event);
        }
    }

    /// Open the account store and wire collaborators from settings
    pub fn context(&self) -> Result<GuardaContext> {
        std::fs::create_dir_all(&self.guarda_dir).with_context(|| {
            format!("Failed to create guarda directory: {:?}", self.guarda_dir)
        })?;

        let ctx =
            GuardaContext::new(&self.guarda_dir).context("Failed to initialize guarda context")?;
        Ok(match &self.logger {
            Some(logger) => ctx.with_logger(Arc::clone(logger)),
            None => ctx,
        })
    }
}

/// Get the guarda directory from environment or default
fn get_guarda_dir() -> PathBuf {
    if let Ok(dir) = env::var("GUARDA_DIR") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".guarda")
}

/// Fold a failure outside the core (settings, files, arguments) into the
/// core result as an internal error, keeping its text for the event log
fn settle<T>(
    operation: Operation,
    outcome: Result<CoreResult<T>>,
) -> (OperationResult<T>, Option<String>) {
    match outcome {
        Ok(result) => (OperationResult::from_result(operation, result), None),
        Err(e) => {
            let cause = format!("{:#}", e);
            let result = Err(CoreError::Other(cause.clone()));
            (OperationResult::from_result(operation, result), Some(cause))
        }
    }
}

/// Run a command body and render its outcome as the response envelope.
///
/// With `json` the envelope is printed as is; otherwise `show` renders the
/// data and failures print status and message. Failures before the core is
/// reached render as a generic internal error for `operation`. A failure
/// returns `Reported` so the process exits non-zero without printing twice.
pub fn report<T: Serialize>(
    operation: Operation,
    json: bool,
    body: impl FnOnce() -> Result<CoreResult<T>>,
    show: impl FnOnce(&T),
) -> Result<()> {
    let (envelope, cause) = settle(operation, body());

    if json {
        println!("{}", serde_json::to_string_pretty(&envelope)?);
    } else if let Some(data) = &envelope.data {
        show(data);
    } else {
        output::error(&format!(
            "Error ({}): {}",
            envelope.status,
            envelope.message.as_deref().unwrap_or_default()
        ));
    }

    if envelope.success {
        Ok(())
    } else {
        Err(Reported {
            status: envelope.status,
            cause,
        }
        .into())
    }
}

/// Read a file into a payload, guessing the content type from its extension
pub fn load_file(path: &Path, content_type: Option<String>) -> Result<FilePayload> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
    let content_type = content_type.unwrap_or_else(|| guess_content_type(path).to_string());
    Ok(FilePayload::from_bytes(&bytes, content_type))
}

fn guess_content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// Get password from --password flag, GUARDA_PASSWORD env var, or prompt
pub fn get_password_or_prompt(password_flag: Option<String>, confirm: bool) -> Result<String> {
    if let Some(p) = password_flag {
        return Ok(p);
    }

    if let Ok(p) = env::var(PASSWORD_ENV) {
        return Ok(p);
    }

    if !atty::is(atty::Stream::Stdin) {
        anyhow::bail!("No password given: use --password or {}", PASSWORD_ENV);
    }

    let mut prompt = Password::new().with_prompt("Senha");
    if confirm {
        prompt = prompt.with_confirmation("Confirme a senha", "As senhas não conferem");
    }
    Ok(prompt.interact()?)
}
