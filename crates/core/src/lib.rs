pub mod access;
pub mod config;
pub mod domain;
pub mod errors;
pub mod stock;

pub use access::{AccessDecision, AccessPolicy, Screen, SharedPasswordPolicy};
pub use domain::balance::ReconciledBalance;
pub use domain::entry::{LotLabel, StockEntry};
pub use domain::sale::Sale;
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use stock::lots::next_lot;
pub use stock::reconcile::reconcile;
