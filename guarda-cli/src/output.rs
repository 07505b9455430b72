//! Output formatting utilities

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, ContentArrangement, Table};
use rust_decimal::Decimal;

/// Print a success message
pub fn success(msg: &str) {
    println!("{}", msg.green());
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{}", msg.cyan());
}

/// Create a styled table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Format an amount with its currency code
pub fn format_money(amount: Decimal, currency: &str) -> String {
    format!("{} {:.2}", currency, amount)
}

/// Render an optional field, dimmed when absent
pub fn optional(value: Option<&str>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "-".dimmed().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_money_pads_cents() {
        assert_eq!(format_money(Decimal::new(10, 0), "BRL"), "BRL 10.00");
        assert_eq!(format_money(Decimal::new(1050, 2), "EUR"), "EUR 10.50");
    }
}
