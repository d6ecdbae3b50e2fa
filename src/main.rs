//! CLI binary for `session_hooks`.
//!
//! This binary is a thin wrapper that reads stdin and delegates to the library.

use std::io::{self, Read};
use std::panic::{self, AssertUnwindSafe};
use std::process::ExitCode;

use clap::Parser;
use session_hooks::cli::{self, Cli, CliOutput};

fn main() -> ExitCode {
    session_hooks::logging::init();

    let command = Cli::parse().command;

    // Only read stdin for commands that need it (avoids blocking on terminal)
    let stdin = if command.needs_stdin() { read_stdin() } else { Ok(String::new()) };

    let output = match stdin {
        Ok(stdin) => {
            let fallback = command.fallback_json();
            panic::catch_unwind(AssertUnwindSafe(|| cli::run(command, &stdin))).unwrap_or_else(
                |_| CliOutput {
                    exit_code: ExitCode::from(1),
                    stdout: fallback.map(str::to_string).into_iter().collect(),
                    stderr: vec!["session-hooks panicked; wrote fallback output".to_string()],
                },
            )
        }
        Err(e) => cli::fault_output(&command, &format!("could not read stdin: {e}")),
    };

    for line in output.stdout {
        println!("{line}");
    }
    for msg in output.stderr {
        eprintln!("{msg}");
    }

    output.exit_code
}

fn read_stdin() -> io::Result<String> {
    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;
    Ok(input)
}
