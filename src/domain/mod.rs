mod document;
mod entry;
mod filter;
mod ledger;
mod money;
mod party;

pub use document::*;
pub use entry::*;
pub use filter::*;
pub use ledger::*;
pub use money::*;
pub use party::*;
