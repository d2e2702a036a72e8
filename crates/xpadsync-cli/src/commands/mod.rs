pub mod common;
pub mod monitor;
pub mod status;
pub mod sync;

pub use common::CommandOptions;
pub use monitor::Monitor;
pub use status::Status;
pub use sync::SyncOnce;
