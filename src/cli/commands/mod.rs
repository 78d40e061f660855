//! CLI command implementations.

mod ask;
mod config;
mod doctor;
mod ingest;
mod init;
mod list;
mod serve;

pub use ask::run_ask;
pub use config::run_config;
pub use doctor::run_doctor;
pub use ingest::run_ingest;
pub use init::run_init;
pub use list::run_list;
pub use serve::run_serve;
