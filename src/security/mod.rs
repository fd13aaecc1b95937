pub mod api_key;
pub mod audit_log;
pub mod token;
