pub mod archive_store;
pub mod expander;
pub mod migrator;
pub mod pipeline;
pub mod record_store;
pub mod recovery;
pub mod resolver;
pub mod transport;
