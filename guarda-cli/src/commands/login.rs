//! Login command - check a password against an account

use anyhow::Result;
use clap::Args;

use super::{get_password_or_prompt, report, Session};
use crate::output;
use guarda_core::{LoginRequest, Operation};

#[derive(Args)]
pub struct LoginArgs {
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    cpf: Option<String>,
    #[arg(long)]
    cnpj: Option<String>,
    /// Account password (or GUARDA_PASSWORD, or prompt)
    #[arg(long)]
    password: Option<String>,
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(session: &Session, args: LoginArgs) -> Result<()> {
    let json = args.json;
    report(
        Operation::Login,
        json,
        || {
            let request = LoginRequest {
                email: args.email,
                cpf: args.cpf,
                cnpj: args.cnpj,
                password: get_password_or_prompt(args.password, false)?,
            };
            Ok(session.context()?.accounts.login(&request))
        },
        |outcome| output::success(&format!("Logged in as {}", outcome.account_id)),
    )
}
