pub mod sqlite;

pub use sqlite::TokenStore;
