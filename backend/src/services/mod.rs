//! Business logic services for the Stock Ledger

pub mod adjustment;
pub mod finance;
pub mod item;
pub mod ledger;
pub mod production;
pub mod purchase;
pub mod sale;
pub mod stock_return;
pub mod trigger;

pub use adjustment::AdjustmentService;
pub use finance::FinanceService;
pub use item::ItemService;
pub use ledger::{AuditMode, LedgerBatch, LedgerService, PartialWriteFailure, Recorded};
pub use production::ProductionService;
pub use purchase::PurchaseService;
pub use sale::SaleService;
pub use stock_return::ReturnService;
pub use trigger::{StockEvent, StockEventProcessor, TriggerOutcome};
