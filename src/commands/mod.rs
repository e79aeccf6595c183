//! CLI commands implementation

pub mod browse;
pub mod ingest;
pub mod init;
pub mod status;

pub use browse::*;
pub use ingest::*;
pub use init::*;
pub use status::*;
