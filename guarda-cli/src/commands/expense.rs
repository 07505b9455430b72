//! Expense command - create and list expenses on the ledger

use anyhow::Result;
use clap::Subcommand;
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use super::{report, Session};
use crate::output;
use guarda_core::domain::ExpenseCategory;
use guarda_core::{NewExpense, Operation};

#[derive(Subcommand)]
pub enum ExpenseCommands {
    /// Create an expense for an account
    Add {
        /// Account ID
        id: Uuid,
        /// What the expense was for
        #[arg(long)]
        reason: String,
        #[arg(long)]
        amount: Decimal,
        /// Ledger category id (see `guarda expense categories`)
        #[arg(long)]
        category: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the expenses of an account
    List {
        /// Account ID
        id: Uuid,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List expense categories
    Categories {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(session: &Session, command: ExpenseCommands) -> Result<()> {
    match command {
        ExpenseCommands::Add {
            id,
            reason,
            amount,
            category,
            json,
        } => {
            let expense = NewExpense {
                reason,
                amount,
                category,
            };
            report(
                Operation::CreateExpense,
                json,
                || Ok(session.context()?.accounts.create_expense(id, &expense)),
                |_| output::success("Expense created"),
            )
        }
        ExpenseCommands::List { id, json } => report(
            Operation::ListExpenses,
            json,
            || Ok(session.context()?.accounts.list_expenses(id)),
            |records| print_expenses(records),
        ),
        ExpenseCommands::Categories { json } => report(
            Operation::ListExpenseCategories,
            json,
            || Ok(session.context()?.accounts.list_expense_categories()),
            |categories| print_categories(categories),
        ),
    }
}

fn field(record: &JsonValue, key: &str) -> String {
    match &record[key] {
        JsonValue::Null => "-".to_string(),
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn print_expenses(records: &[JsonValue]) {
    if records.is_empty() {
        output::info("No expenses found.");
        return;
    }

    // Records come from the ledger unchanged; show the common fields
    let mut table = output::create_table();
    table.set_header(vec!["Name", "Amount", "Category", "Paid on"]);
    for record in records {
        table.add_row(vec![
            field(record, "name"),
            field(record, "amount"),
            field(record, "category"),
            field(record, "payment_date"),
        ]);
    }
    println!("{}", table);
}

fn print_categories(categories: &[ExpenseCategory]) {
    let mut table = output::create_table();
    table.set_header(vec!["ID", "Name", "Description"]);
    for category in categories {
        table.add_row(vec![
            category.id.clone(),
            category.name.clone(),
            category.description.clone().unwrap_or_default(),
        ]);
    }
    println!("{}", table);
}
