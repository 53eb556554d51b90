pub mod builder;
pub mod ledger;
pub mod package;
pub mod pricing;
pub mod service;

pub use builder::PackageDealBuilder;
pub use ledger::{Adjustment, AdjustmentPlan, ItemKind, LedgerError};
pub use package::PackageDeal;
pub use pricing::ServiceCost;
pub use service::{CatalogError, Flight, Hotel, ServiceKind, TravelService};
