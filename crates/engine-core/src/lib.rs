pub mod attachments;
pub mod connection;
pub mod error;
pub mod export;
pub mod flatten;
pub mod operations;
pub mod pagination;

#[cfg(test)]
mod testing;
