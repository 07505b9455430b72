//! Balance command - read or replace an account balance

use anyhow::Result;
use clap::Subcommand;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::{report, Session};
use crate::output;
use guarda_core::{BalanceView, Operation};

#[derive(Subcommand)]
pub enum BalanceCommands {
    /// Show the current balance
    Get {
        /// Account ID
        id: Uuid,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Replace the balance
    Set {
        /// Account ID
        id: Uuid,
        /// New balance (e.g., 1500.00)
        amount: Decimal,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(session: &Session, command: BalanceCommands) -> Result<()> {
    match command {
        BalanceCommands::Get { id, json } => report(
            Operation::GetBalance,
            json,
            || Ok(session.context()?.accounts.get_balance(id)),
            print_balance,
        ),
        BalanceCommands::Set { id, amount, json } => report(
            Operation::UpdateBalance,
            json,
            || Ok(session.context()?.accounts.update_balance(id, amount)),
            |view| {
                let amount = output::format_money(view.balance, &view.currency);
                output::success(&format!("Balance set to {}", amount));
            },
        ),
    }
}

fn print_balance(view: &BalanceView) {
    println!("{}", output::format_money(view.balance, &view.currency));
}
