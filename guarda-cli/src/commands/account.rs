//! Account command - show an account profile

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use uuid::Uuid;

use super::{report, Session};
use crate::output;
use guarda_core::{AccountProfile, Operation};

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Show an account with its decrypted identity fields
    Show {
        /// Account ID
        id: Uuid,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(session: &Session, command: AccountCommands) -> Result<()> {
    match command {
        AccountCommands::Show { id, json } => report(
            Operation::GetAccount,
            json,
            || Ok(session.context()?.accounts.get_account(id)),
            print_profile,
        ),
    }
}

fn print_profile(profile: &AccountProfile) {
    println!("{}", profile.name.bold());
    println!();

    let mut table = output::create_table();
    table.add_row(vec!["ID".to_string(), profile.id.to_string()]);
    table.add_row(vec!["Phone".to_string(), profile.cellphone.clone()]);
    table.add_row(vec!["Email".to_string(), output::optional(profile.email.as_deref())]);
    table.add_row(vec!["CPF".to_string(), output::optional(profile.cpf.as_deref())]);
    table.add_row(vec!["CNPJ".to_string(), output::optional(profile.cnpj.as_deref())]);
    table.add_row(vec![
        "Balance".to_string(),
        output::format_money(profile.balance, &profile.currency),
    ]);
    table.add_row(vec![
        "Bank".to_string(),
        format!(
            "{} / {} / {}",
            profile.banking.institution, profile.banking.agency, profile.banking.account_number
        ),
    ]);
    table.add_row(vec!["Ledger id".to_string(), profile.external_id.clone()]);
    table.add_row(vec![
        "Created".to_string(),
        profile.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
    ]);
    println!("{}", table);
}
