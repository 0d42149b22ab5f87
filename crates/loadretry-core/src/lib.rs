pub mod config;
pub mod logging;

pub mod connectivity;
pub mod control;
pub mod fetch;
pub mod retry;
