//! Payload validation rules
//!
//! Field presence and format checks that run before any service logic.
//! Every failure is a `Error::Validation` carrying the message shown to the caller.

use std::sync::OnceLock;

use base64::Engine;
use regex::Regex;
use rust_decimal::Decimal;

use super::result::{Error, Result};

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex is valid")
    })
}

fn cellphone_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\+?\d+$").expect("cellphone regex is valid"))
}

fn special_char_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[!@#$%^&*()_+{}\[\]:;<>,.?~\\-]").expect("special char regex is valid")
    })
}

fn digits(value: &str) -> Vec<u32> {
    value.chars().filter_map(|c| c.to_digit(10)).collect()
}

fn check_digit(sum: u32) -> u32 {
    let digit = 11 - (sum % 11);
    if digit > 9 {
        0
    } else {
        digit
    }
}

fn all_same(digits: &[u32]) -> bool {
    digits.windows(2).all(|w| w[0] == w[1])
}

/// Check a CPF (individual tax ID) by its two check digits.
/// Punctuation is ignored.
pub fn is_valid_cpf(cpf: &str) -> bool {
    let d = digits(cpf);
    if d.len() != 11 || all_same(&d) {
        return false;
    }

    let sum: u32 = (0..9).map(|i| d[i] * (10 - i as u32)).sum();
    if d[9] != check_digit(sum) {
        return false;
    }

    let sum: u32 = (0..10).map(|i| d[i] * (11 - i as u32)).sum();
    d[10] == check_digit(sum)
}

/// Check a CNPJ (entity tax ID) by its two check digits.
/// Punctuation is ignored.
pub fn is_valid_cnpj(cnpj: &str) -> bool {
    const FIRST_WEIGHTS: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
    const SECOND_WEIGHTS: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

    let d = digits(cnpj);
    if d.len() != 14 || all_same(&d) {
        return false;
    }

    let sum: u32 = FIRST_WEIGHTS.iter().zip(&d).map(|(w, v)| w * v).sum();
    if d[12] != check_digit(sum) {
        return false;
    }

    let sum: u32 = SECOND_WEIGHTS.iter().zip(&d).map(|(w, v)| w * v).sum();
    d[13] == check_digit(sum)
}

pub fn validate_email(email: &str) -> Result<()> {
    if email_regex().is_match(email) {
        Ok(())
    } else {
        Err(Error::validation("O endereço de e-mail fornecido não é válido"))
    }
}

pub fn validate_cpf(cpf: &str) -> Result<()> {
    if is_valid_cpf(cpf) {
        Ok(())
    } else {
        Err(Error::validation("CPF inválido"))
    }
}

pub fn validate_cnpj(cnpj: &str) -> Result<()> {
    if is_valid_cnpj(cnpj) {
        Ok(())
    } else {
        Err(Error::validation("CNPJ inválido"))
    }
}

pub fn validate_cellphone(cellphone: &str) -> Result<()> {
    if cellphone_regex().is_match(cellphone) {
        Ok(())
    } else {
        Err(Error::validation(
            "O número de telefone deve conter apenas dígitos",
        ))
    }
}

pub fn validate_password_complexity(password: &str) -> Result<()> {
    if password.chars().count() < 8 {
        return Err(Error::validation("A senha deve ter no mínimo 8 caracteres"));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(Error::validation(
            "A senha deve conter pelo menos uma letra maiúscula",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(Error::validation("A senha deve conter pelo menos um número"));
    }
    if !special_char_regex().is_match(password) {
        return Err(Error::validation(
            "A senha deve conter pelo menos um caractere especial",
        ));
    }
    Ok(())
}

/// A stored payload must be valid standard base64 and carry a content type
pub fn validate_file(file_b64: &str, content_type: &str) -> Result<()> {
    if file_b64.is_empty() {
        return Err(Error::validation("Arquivo é obrigatório"));
    }
    if content_type.trim().is_empty() {
        return Err(Error::validation("O tipo do arquivo é obrigatório"));
    }
    base64::engine::general_purpose::STANDARD
        .decode(file_b64)
        .map_err(|_| Error::validation("Arquivo inválido: conteúdo não está em base64"))?;
    Ok(())
}

/// Balances are non-negative with at most cent precision
pub fn validate_balance(balance: Decimal) -> Result<()> {
    if balance.is_sign_negative() && !balance.is_zero() {
        return Err(Error::validation("O saldo não pode ser negativo"));
    }
    if balance.normalize().scale() > 2 {
        return Err(Error::validation(
            "O saldo deve ter no máximo duas casas decimais",
        ));
    }
    Ok(())
}
