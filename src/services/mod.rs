pub mod ledger;
pub mod requests;
pub mod sku;
pub mod stock;

pub use ledger::LedgerService;
pub use requests::RequestService;
pub use sku::SkuService;
pub use stock::StockService;
