//! Document command - attach and list identity documents

use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;
use uuid::Uuid;

use super::{load_file, report, Session};
use crate::output;
use guarda_core::{Document, DocumentType, Operation};

#[derive(Subcommand)]
pub enum DocumentCommands {
    /// Attach a document to an account
    Add {
        /// Account ID
        id: Uuid,
        /// Document type (cnh, rne, rg)
        #[arg(long = "type")]
        document_type: String,
        /// Path to the scanned document
        file: PathBuf,
        /// Content type (guessed from the extension when omitted)
        #[arg(long)]
        content_type: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the documents of an account
    List {
        /// Account ID
        id: Uuid,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(session: &Session, command: DocumentCommands) -> Result<()> {
    match command {
        DocumentCommands::Add {
            id,
            document_type,
            file,
            content_type,
            json,
        } => report(
            Operation::SaveDocument,
            json,
            || {
                let kind = match document_type.parse::<DocumentType>() {
                    Ok(kind) => kind,
                    Err(e) => return Ok(Err(e)),
                };
                let payload = load_file(&file, content_type)?;
                Ok(session.context()?.accounts.add_document(id, kind, payload))
            },
            |document| {
                output::success(&format!(
                    "Document {} ({}) attached",
                    document.id, document.document_type
                ));
            },
        ),
        DocumentCommands::List { id, json } => report(
            Operation::ListDocuments,
            json,
            || Ok(session.context()?.accounts.list_documents(id)),
            |documents| print_documents(documents),
        ),
    }
}

fn print_documents(documents: &[Document]) {
    if documents.is_empty() {
        output::info("No documents attached.");
        return;
    }

    let mut table = output::create_table();
    table.set_header(vec!["ID", "Type", "Content type", "Attached"]);
    for document in documents {
        table.add_row(vec![
            document.id.to_string(),
            document.document_type.to_string(),
            document.file.content_type.clone(),
            document.created_at.format("%Y-%m-%d %H:%M").to_string(),
        ]);
    }
    println!("{}", table);
}
