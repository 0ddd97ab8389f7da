pub mod command;
pub mod log;
pub mod quote;

pub use command::{GitCli, GitCommand, GitRunner};
pub use log::{LOG_PRETTY, format_epoch, parse_log};
pub use quote::quote;
