//! Guarda CLI - identity and account management in your terminal

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{account, balance, biometric, document, expense, login, logs, register};
use guarda_core::LogEvent;

/// Guarda - identity and account management
#[derive(Parser)]
#[command(name = "guarda", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new account
    Register(register::RegisterArgs),

    /// Check an account password
    Login(login::LoginArgs),

    /// Inspect accounts
    Account {
        #[command(subcommand)]
        command: account::AccountCommands,
    },

    /// Read or replace account balances
    Balance {
        #[command(subcommand)]
        command: balance::BalanceCommands,
    },

    /// Attach and list identity documents
    Document {
        #[command(subcommand)]
        command: document::DocumentCommands,
    },

    /// Manage reference biometrics
    Biometric {
        #[command(subcommand)]
        command: biometric::BiometricCommands,
    },

    /// Create and list ledger expenses
    Expense {
        #[command(subcommand)]
        command: expense::ExpenseCommands,
    },

    /// Show recent events and failures
    Logs(logs::LogsArgs),
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Register(_) => "register",
            Commands::Login(_) => "login",
            Commands::Account { .. } => "account",
            Commands::Balance { .. } => "balance",
            Commands::Document { .. } => "document",
            Commands::Biometric { .. } => "biometric",
            Commands::Expense { .. } => "expense",
            Commands::Logs(_) => "logs",
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let session = commands::Session::open();
    let command = cli.command.name();
    session.log(LogEvent::new("command_executed").with_command(command));

    let Err(e) = run(&session, cli) else {
        return ExitCode::SUCCESS;
    };

    let failed = LogEvent::new("command_failed").with_command(command);
    match e.downcast_ref::<commands::Reported>() {
        // Core failures were logged by the service as they happened
        Some(reported) => {
            if let Some(cause) = &reported.cause {
                session.log(failed.with_error(cause.clone()));
            }
        }
        None => {
            session.log(failed.with_error(e.to_string()).with_error_details(format!("{:#}", e)));
            output::error(&format!("{:#}", e));
        }
    }
    ExitCode::FAILURE
}

fn run(session: &commands::Session, cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Register(args) => register::run(session, args),
        Commands::Login(args) => login::run(session, args),
        Commands::Account { command } => account::run(session, command),
        Commands::Balance { command } => balance::run(session, command),
        Commands::Document { command } => document::run(session, command),
        Commands::Biometric { command } => biometric::run(session, command),
        Commands::Expense { command } => expense::run(session, command),
        Commands::Logs(args) => logs::run(session, args),
    }
}
