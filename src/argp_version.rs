//! `--version`/`-V` handling for the `argp` command line.
//!
//! `argp` has no built-in version flag, so a lone `--version` or `-V` is
//! intercepted before the regular parser runs.
use std::{ffi::OsString, path::Path};

use argp::TopLevelCommand;

/// Version line printed for `--version`, e.g. `dtbtool 0.1.0 1a2b3c4`.
pub fn version_string(command_name: &str) -> String {
    let commit = env!("GIT_COMMIT_SHA").trim();
    if commit.is_empty() {
        format!("{} {}", command_name, env!("CARGO_PKG_VERSION"))
    } else {
        format!("{} {} {}", command_name, env!("CARGO_PKG_VERSION"), commit)
    }
}

fn is_version_request(args: &[OsString]) -> bool {
    matches!(args, [arg] if arg == "--version" || arg == "-V")
}

/// Create a `FromArgs` type from the current process's `env::args`.
///
/// Exits early if parsing fails or `--help`/`--version` was requested.
pub fn from_env<T>() -> T
where T: TopLevelCommand {
    let mut args = std::env::args_os();
    let command_name = args
        .next()
        .as_deref()
        .and_then(|arg| Path::new(arg).file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string());
    if is_version_request(&args.collect::<Vec<_>>()) {
        println!("{}", version_string(&command_name));
        std::process::exit(0);
    }
    argp::parse_args_or_exit(argp::DEFAULT)
}
