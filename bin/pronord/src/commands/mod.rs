pub mod cache_cmd;
pub mod config_cmd;
pub mod lookup;
