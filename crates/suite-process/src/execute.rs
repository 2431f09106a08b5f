//! Process execution primitives.
//!
//! The server under test is launched through the platform shell (`sh -c` on
//! Unix, `cmd /C` on Windows) so that the configured command line behaves the
//! same way it does when typed by hand.

use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Launch options for a supervised command.
#[derive(Debug, Clone, Default)]
pub struct CommandSpec<'a> {
    pub command: &'a str,
    pub args: &'a [String],
    pub working_directory: Option<&'a Path>,
    pub environment: Option<&'a HashMap<String, String>>,
}

/// Joins the command and its arguments into one shell command line.
///
/// Arguments are quoted only when the shell would otherwise split or
/// reinterpret them.
pub fn shell_command_line(command: &str, args: &[String]) -> String {
    let mut line = command.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(&quote_arg(arg));
    }
    line
}

#[cfg(unix)]
fn quote_arg(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,+@%".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

#[cfg(windows)]
fn quote_arg(arg: &str) -> String {
    if !arg.is_empty() && !arg.contains([' ', '\t', '"']) {
        arg.to_string()
    } else {
        format!("\"{}\"", arg.replace('"', "\\\""))
    }
}

/// Builds the shell invocation for `spec` with supervision settings applied:
/// stdin detached, stdout/stderr piped, killed on drop, and isolated in its
/// own process group so the whole tree can be signalled at once.
pub fn supervised_command(spec: &CommandSpec<'_>) -> Command {
    let line = shell_command_line(spec.command, spec.args);

    #[cfg(unix)]
    let mut cmd = {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(&line);
        cmd.process_group(0);
        cmd
    };

    #[cfg(windows)]
    let mut cmd = {
        const CREATE_NEW_PROCESS_GROUP: u32 = 0x00000200;
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(&line);
        cmd.creation_flags(CREATE_NEW_PROCESS_GROUP);
        cmd
    };

    if let Some(dir) = spec.working_directory {
        cmd.current_dir(dir);
    }

    if let Some(environment) = spec.environment {
        for (key, value) in environment {
            cmd.env(key, value);
        }
    }

    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    cmd
}
