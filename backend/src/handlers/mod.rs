//! HTTP request handlers

pub mod event;
pub mod finance;
pub mod health;
pub mod item;
pub mod ledger;
pub mod production;
pub mod purchase;
pub mod sale;
pub mod stock;
pub mod stock_return;

pub use event::*;
pub use finance::*;
pub use health::*;
pub use item::*;
pub use ledger::*;
pub use production::*;
pub use purchase::*;
pub use sale::*;
pub use stock::*;
pub use stock_return::*;
