pub mod lots;
pub mod reconcile;

pub use lots::next_lot;
pub use reconcile::reconcile;
