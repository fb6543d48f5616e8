//! Business operations over the repositories
//!
//! Each public function here is one unit of work: it opens at most one write
//! transaction and commits it once.

pub mod fulfillment;
pub mod inventory;
pub mod order_status;
pub mod stock_transfer;
