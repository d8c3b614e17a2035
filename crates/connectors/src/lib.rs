pub mod error;
pub mod file;
pub mod salesforce;
pub mod sink;
pub mod sqlite;
pub mod store;
