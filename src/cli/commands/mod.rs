//! One module per subcommand, each taking the already-parsed `Cli` args
//! it needs and returning `anyhow::Result<()>` for `main` to report.

mod bootstrap;
mod clean;
mod load;
mod reindex;
mod reset;
mod save;

pub use bootstrap::run as bootstrap;
pub use clean::run as clean;
pub use load::run as load;
pub use reindex::run as reindex;
pub use reset::run as reset;
pub use save::run as save;
