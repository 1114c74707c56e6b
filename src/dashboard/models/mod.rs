pub mod keyspace;
pub mod key_detail;
