//! Domain models for the Stock Ledger

mod adjustment;
mod finance;
mod item;
mod movement;
mod production;
mod purchase;
mod sale;
mod stock_return;

pub use adjustment::*;
pub use finance::*;
pub use item::*;
pub use movement::*;
pub use production::*;
pub use purchase::*;
pub use sale::*;
pub use stock_return::*;
