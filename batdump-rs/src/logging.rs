//! Logging setup.
//!
//! Log lines go to stderr so stdout carries only the JSON document. The level
//! comes from `RUST_LOG` when set, otherwise `info` (`debug` with `-v`).

use std::io::Write;

use chrono::Local;
use env_logger::{Builder, Env, Target};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Initialize the global logger.
pub(crate) fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };

    let _ = Builder::from_env(Env::default().default_filter_or(default_level))
        .target(Target::Stderr)
        .format(|buf, record| {
            writeln!(
                buf,
                "{} {:<5} {}: {}",
                Local::now().format(TIMESTAMP_FORMAT),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .try_init();
}
