//! Validation utilities for the Stock Ledger
//!
//! Pure checks shared by the backend services and the browser helpers.

use rust_decimal::Decimal;

// ============================================================================
// Quantity and Price Validations
// ============================================================================

/// Largest quantity a single line, posting or adjustment may carry
pub const MAX_QUANTITY: i64 = 1_000_000_000;

/// Largest unit price or cash amount accepted
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(2_764_472_320, 232_830, 0, false, 0);

/// Quantities moved by sales, purchases, returns and productions are
/// positive whole units
pub fn validate_quantity(quantity: i64) -> Result<(), &'static str> {
    if quantity <= 0 {
        return Err("Quantity must be a positive whole number");
    }
    if quantity > MAX_QUANTITY {
        return Err("Quantity is too large");
    }
    Ok(())
}

/// Stock an item is created with
pub fn validate_opening_stock(stock: i64) -> Result<(), &'static str> {
    if stock < 0 {
        return Err("Opening stock cannot be negative");
    }
    if stock > MAX_QUANTITY {
        return Err("Opening stock is too large");
    }
    Ok(())
}

/// Unit prices may be zero (samples, gifts) but never negative
pub fn validate_unit_price(price: Decimal) -> Result<(), &'static str> {
    if price < Decimal::ZERO {
        return Err("Price cannot be negative");
    }
    if price > MAX_AMOUNT {
        return Err("Price is too large");
    }
    Ok(())
}

/// Whether `available` units cover a decrement of `requested` units
pub fn has_sufficient_stock(available: i64, requested: i64) -> bool {
    requested <= available
}

// ============================================================================
// Text Validations
// ============================================================================

/// Names of customers, items and productions
pub fn validate_name(name: &str) -> Result<(), &'static str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Name cannot be empty");
    }
    if trimmed.chars().count() > 120 {
        return Err("Name must be at most 120 characters");
    }
    Ok(())
}

/// Courier receipt (airway bill) numbers: letters, digits and dashes
pub fn validate_receipt_number(receipt: &str) -> Result<(), &'static str> {
    let len = receipt.len();
    if !(4..=40).contains(&len) {
        return Err("Receipt number must be between 4 and 40 characters");
    }
    if !receipt.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err("Receipt number may only contain letters, digits and dashes");
    }
    Ok(())
}
