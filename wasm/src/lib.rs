//! WebAssembly module for the Stock Ledger
//!
//! Provides client-side previews for the browser forms:
//! - Sale total from draft lines
//! - Stock availability of a line before submitting
//! - Signed adjustment delta
//! - Allowed sale status moves

use rust_decimal::Decimal;
use serde::Deserialize;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;
pub use shared::validation::*;

/// A sale line as held by the form before submission
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DraftLine {
    quantity: i64,
    price_per_unit: Decimal,
}

#[cfg(target_arch = "wasm32")]
fn warn(message: &str) {
    web_sys::console::warn_1(&JsValue::from_str(message));
}

#[cfg(not(target_arch = "wasm32"))]
fn warn(_message: &str) {}

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    // Set up panic hook for better error messages in browser console
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Total of draft sale lines, as a decimal string
#[wasm_bindgen]
pub fn calculate_sale_total(lines_json: &str) -> Result<String, JsValue> {
    let lines: Vec<DraftLine> = serde_json::from_str(lines_json).map_err(|e| {
        warn(&format!("Invalid sale lines: {}", e));
        JsValue::from_str(&format!("Invalid sale lines JSON: {}", e))
    })?;

    let total = lines
        .iter()
        .try_fold(Decimal::ZERO, |total, line| {
            line_subtotal(line.price_per_unit, line.quantity)
                .and_then(|subtotal| total.checked_add(subtotal))
        })
        .ok_or_else(|| JsValue::from_str("Sale total is too large"))?;
    Ok(total.to_string())
}

/// Whether an item holding `available` can cover `requested`
#[wasm_bindgen]
pub fn check_stock_available(available: i32, requested: i32) -> bool {
    has_sufficient_stock(i64::from(available), i64::from(requested))
}

/// Signed delta of an adjustment (`Increase` or `Decrease`)
#[wasm_bindgen]
pub fn adjustment_delta(adjustment_type: &str, amount: i32) -> Result<i32, JsValue> {
    let kind: AdjustmentType = adjustment_type
        .parse()
        .map_err(|e: String| JsValue::from_str(&e))?;

    i32::try_from(kind.signed(i64::from(amount)))
        .map_err(|_| JsValue::from_str("Adjustment amount out of range"))
}

/// The status a sale moves to next, or `None` when it is terminal
#[wasm_bindgen]
pub fn next_sale_status(current: &str) -> Option<String> {
    let status: SaleStatus = current.parse().ok()?;
    let next = match status {
        SaleStatus::Processing => SaleStatus::Shipped,
        SaleStatus::Shipped => SaleStatus::Completed,
        SaleStatus::Completed => return None,
    };
    Some(next.as_str().to_string())
}

/// Whether a sale may move from `from` to `to`
#[wasm_bindgen]
pub fn can_transition_sale(from: &str, to: &str) -> bool {
    match (from.parse::<SaleStatus>(), to.parse::<SaleStatus>()) {
        (Ok(from), Ok(to)) => from.transition(to).is_ok(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sale_total() {
        let lines = r#"[
            {"quantity": 3, "pricePerUnit": "15000"},
            {"quantity": 2, "pricePerUnit": "2500.50"}
        ]"#;
        assert_eq!(calculate_sale_total(lines).unwrap(), "50001.00");
    }

    #[test]
    fn test_stock_check() {
        assert!(check_stock_available(5, 5));
        assert!(!check_stock_available(4, 5));
        assert!(check_stock_available(0, 0));
    }

    #[test]
    fn test_adjustment_delta() {
        assert_eq!(adjustment_delta("Increase", 7).unwrap(), 7);
        assert_eq!(adjustment_delta("Decrease", 7).unwrap(), -7);
    }

    #[test]
    fn test_sale_status_moves() {
        assert_eq!(next_sale_status("Diproses").as_deref(), Some("Dikirim"));
        assert_eq!(next_sale_status("Dikirim").as_deref(), Some("Selesai"));
        assert_eq!(next_sale_status("Selesai"), None);
        assert!(can_transition_sale("Dikirim", "Selesai"));
        assert!(!can_transition_sale("Diproses", "Selesai"));
    }
}
