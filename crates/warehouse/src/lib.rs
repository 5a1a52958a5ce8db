pub mod client;
pub mod error;
pub mod storage;
pub mod table;
