//! CLI command handlers. Each command is in its own file.

mod completions;
mod config;
mod decide;
pub(crate) mod fetch;
mod man;
pub(crate) mod plan;
pub(crate) mod probe;

pub use completions::run_completions;
pub use config::run_config;
pub use decide::run_decide;
pub use fetch::run_fetch;
pub use man::run_man;
pub use plan::run_plan;
pub use probe::run_probe;
