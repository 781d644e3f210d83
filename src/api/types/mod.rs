//! Request and response types for account queries.

pub mod balance;
pub mod house_bet;
pub mod verification;

pub use balance::*;
pub use house_bet::*;
pub use verification::*;
