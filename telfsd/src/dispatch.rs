//! Verb handlers.
//!
//! The dispatcher holds no state of its own: it receives the issuing session's
//! working directory and returns the reply lines (unframed) to send back.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::fs::Filesystem;
use crate::parser::{Command, Verb};

pub const INCORRECT_PATH: &str = "Incorrect path";
pub const FILE_EXISTS: &str = "File already exist";
pub const FOLDER_EXISTS: &str = "Folder already exist";
pub const FILE_MISSING: &str = "File does not exist";
pub const SOURCE_MISSING: &str = "Source file does not exist";

pub const HELP: [&str; 7] = [
    "input ls for show file list",
    "input cd <name> for change directory",
    "input touch <name> for create file",
    "input mkdir <name> for create directory",
    "input rm <name> for delete file",
    "input copy <src> <dst> for copy file from <src> to <dst>",
    "input cat <name> for print file contents",
];

/// Runs `cmd` against `cwd`. Wrong arity yields no lines and no effect.
pub fn dispatch<F: Filesystem + ?Sized>(fs: &F, cwd: &mut PathBuf, cmd: &Command) -> Vec<String> {
    if cmd.args.len() != cmd.verb.arity() {
        debug!(verb = cmd.verb.as_str(), args = cmd.args.len(), "arity mismatch, ignored");
        return Vec::new();
    }
    let args = &cmd.args;
    match cmd.verb {
        Verb::Help => HELP.iter().map(|l| l.to_string()).collect(),
        Verb::Ls => match fs.list(cwd) {
            Ok(names) => vec![names.join(" ")],
            Err(e) => failure("ls", cwd, e),
        },
        Verb::Cd => change_dir(fs, cwd, &args[0]),
        Verb::Touch => {
            let target = cwd.join(&args[0]);
            if fs.exists(&target) {
                return vec![FILE_EXISTS.to_string()];
            }
            fs.create_file(&target).map_or_else(|e| failure("touch", &target, e), |()| Vec::new())
        }
        Verb::Mkdir => {
            let target = cwd.join(&args[0]);
            if fs.exists(&target) {
                return vec![FOLDER_EXISTS.to_string()];
            }
            fs.create_dir(&target).map_or_else(|e| failure("mkdir", &target, e), |()| Vec::new())
        }
        Verb::Rm => {
            let target = cwd.join(&args[0]);
            if !fs.exists(&target) {
                return vec![FILE_MISSING.to_string()];
            }
            fs.delete(&target).map_or_else(|e| failure("rm", &target, e), |()| Vec::new())
        }
        Verb::Cat => {
            let target = cwd.join(&args[0]);
            if !fs.exists(&target) {
                return vec![FILE_MISSING.to_string()];
            }
            fs.read_lines(&target).unwrap_or_else(|e| failure("cat", &target, e))
        }
        Verb::Copy => {
            let src = cwd.join(&args[0]);
            let dst = cwd.join(&args[1]);
            if !fs.exists(&src) {
                return vec![SOURCE_MISSING.to_string()];
            }
            fs.copy(&src, &dst).map_or_else(|e| failure("copy", &src, e), |()| Vec::new())
        }
    }
}

fn change_dir<F: Filesystem + ?Sized>(fs: &F, cwd: &mut PathBuf, arg: &str) -> Vec<String> {
    let target = match arg {
        "." => cwd.clone(),
        ".." => cwd.parent().map_or_else(|| cwd.clone(), Path::to_path_buf),
        other => match fs.canonicalize(&cwd.join(other)) {
            Ok(path) => path,
            Err(_) => return vec![INCORRECT_PATH.to_string()],
        },
    };
    if !fs.is_dir(&target) {
        return vec![INCORRECT_PATH.to_string()];
    }
    *cwd = target;
    vec![format!("Current path: {}", cwd.display())]
}

fn failure(op: &str, path: &Path, err: io::Error) -> Vec<String> {
    warn!(op, path = %path.display(), error = %err, "filesystem operation failed");
    vec![format!("Operation failed: {err}")]
}
