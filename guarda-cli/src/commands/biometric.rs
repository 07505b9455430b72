//! Biometric command - submit, check and validate reference face images

use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;
use uuid::Uuid;

use super::{load_file, report, Session};
use crate::output;
use guarda_core::{BiometricStatus, BiometricSubject, Error, Operation};

#[derive(Subcommand)]
pub enum BiometricCommands {
    /// Store the reference image of an account, or a standalone partner image
    Submit {
        /// Account ID (omit with --partner)
        id: Option<Uuid>,
        /// Path to the face image
        #[arg(long)]
        file: PathBuf,
        /// Store as a partner submission with a new submission id
        #[arg(long)]
        partner: bool,
        #[arg(long)]
        content_type: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Compare an image against the stored reference
    Validate {
        /// Account ID, or submission id with --partner
        id: Uuid,
        /// Path to the probe image
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        partner: bool,
        #[arg(long)]
        content_type: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show whether a reference image is on file
    Status {
        /// Account ID, or submission id with --partner
        id: Uuid,
        #[arg(long)]
        partner: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn subject(id: Uuid, partner: bool) -> BiometricSubject {
    if partner {
        BiometricSubject::Partner(id)
    } else {
        BiometricSubject::Owned(id)
    }
}

pub fn run(session: &Session, command: BiometricCommands) -> Result<()> {
    match command {
        BiometricCommands::Submit {
            id,
            file,
            partner,
            content_type,
            json,
        } => report(
            Operation::SaveBiometric,
            json,
            || {
                let payload = load_file(&file, content_type)?;
                let accounts = session.context()?.accounts;
                Ok(match (id, partner) {
                    (None, true) => accounts.submit_partner_biometric(payload),
                    (Some(id), false) => accounts.submit_biometric(id, payload),
                    (Some(_), true) => Err(Error::validation(
                        "--partner submissions get a new id; omit the account ID",
                    )),
                    (None, false) => {
                        Err(Error::validation("An account ID is required (or use --partner)"))
                    }
                })
            },
            |status| output::success(&format!("Biometric stored for {}", status.subject)),
        ),
        BiometricCommands::Validate {
            id,
            file,
            partner,
            content_type,
            json,
        } => report(
            Operation::ValidateBiometric,
            json,
            || {
                let probe = load_file(&file, content_type)?;
                let result = session
                    .context()?
                    .accounts
                    .validate_biometric(&subject(id, partner), &probe)
                    .map(|_| serde_json::json!({ "match": true }));
                Ok(result)
            },
            |_| output::success("Biometric matches"),
        ),
        BiometricCommands::Status { id, partner, json } => report(
            Operation::GetBiometric,
            json,
            || Ok(session.context()?.accounts.biometric_status(&subject(id, partner))),
            print_status,
        ),
    }
}

fn print_status(status: &BiometricStatus) {
    let mut table = output::create_table();
    table.add_row(vec!["Subject".to_string(), status.subject.to_string()]);
    table.add_row(vec!["Content type".to_string(), status.content_type.clone()]);
    table.add_row(vec![
        "Updated".to_string(),
        status.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
    ]);
    println!("{}", table);
}
