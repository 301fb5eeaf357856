//! object exchange between on-disk peer repositories

mod fetch;
mod local;
mod push;

pub use fetch::fetch;
pub use local::{copy_object, TransferStats};
pub use push::push;
