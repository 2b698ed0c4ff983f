mod consumption;
mod item;
mod ledger;
mod log;
mod quantity;
mod receipt;
mod validation;
mod vocabulary;

pub use consumption::*;
pub use item::*;
pub use ledger::*;
pub use log::*;
pub use quantity::*;
pub use receipt::*;
pub use validation::ValidationError;
pub use vocabulary::*;
