//! Domain records shared by the store, the check-in engine and the views.

pub mod participant;
pub mod ticket;
pub mod transaction;

pub use participant::Participant;
pub use ticket::{ParseTicketError, TicketType};
pub use transaction::{Transaction, TransactionType};
