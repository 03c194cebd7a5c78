pub mod config;
pub mod http;
pub mod test_helpers;
