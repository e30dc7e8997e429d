//! Building and packaging the site with MSBuild.

mod invoker;
mod outcome;

pub use invoker::BuildInvoker;
pub use outcome::BuildOutcome;
