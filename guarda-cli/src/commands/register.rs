//! Register command - create an account and its ledger counterpart

use anyhow::Result;
use clap::Args;
use rust_decimal::Decimal;

use super::{get_password_or_prompt, report, Session};
use crate::output;
use guarda_core::domain::BankingDetails;
use guarda_core::{AccountProfile, Operation, Registration};

#[derive(Args)]
pub struct RegisterArgs {
    /// Full name
    #[arg(long)]
    name: String,
    /// Phone number, digits with optional leading +
    #[arg(long)]
    cellphone: String,
    #[arg(long)]
    email: Option<String>,
    /// Individual tax id
    #[arg(long)]
    cpf: Option<String>,
    /// Entity tax id
    #[arg(long)]
    cnpj: Option<String>,
    /// Account password (or GUARDA_PASSWORD, or prompt)
    #[arg(long)]
    password: Option<String>,
    /// Currency code (default BRL)
    #[arg(long)]
    currency: Option<String>,
    /// Opening balance (default 0)
    #[arg(long)]
    balance: Option<Decimal>,
    #[arg(long, requires_all = ["institution", "account_number"])]
    agency: Option<String>,
    #[arg(long)]
    institution: Option<String>,
    #[arg(long)]
    account_number: Option<String>,
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(session: &Session, args: RegisterArgs) -> Result<()> {
    let json = args.json;
    report(
        Operation::Register,
        json,
        || {
            let registration = registration(args)?;
            Ok(session.context()?.accounts.register(registration))
        },
        print_created,
    )
}

fn registration(args: RegisterArgs) -> Result<Registration> {
    let password = get_password_or_prompt(args.password, true)?;

    let banking = match (args.agency, args.institution, args.account_number) {
        (Some(agency), Some(institution), Some(account_number)) => Some(BankingDetails {
            agency,
            institution,
            account_number,
        }),
        _ => None,
    };

    Ok(Registration {
        name: args.name,
        cellphone: args.cellphone,
        email: args.email,
        cpf: args.cpf,
        cnpj: args.cnpj,
        password,
        currency: args.currency,
        balance: args.balance,
        banking,
    })
}

fn print_created(profile: &AccountProfile) {
    output::success(&format!("Account created: {}", profile.id));
    println!("  Ledger id: {}", profile.external_id);
}
