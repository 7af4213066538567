mod classify;
mod watch;

pub use classify::{ClassifyArgs, run_classify};
pub use watch::{WatchArgs, run_watch};
