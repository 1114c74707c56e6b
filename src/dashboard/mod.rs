pub mod models;
pub mod server;
pub mod utils;
