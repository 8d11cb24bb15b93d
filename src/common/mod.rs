pub mod encoding;
pub mod error;
pub mod mode;
pub mod stream;
pub mod types;
