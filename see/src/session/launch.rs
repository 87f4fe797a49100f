//! Child process launch with the preload shim injected.

use std::ffi::{OsStr, OsString};
use std::io;
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::{Child, Command, Stdio};

use log::debug;
use see_common::{PRELOAD_SEPARATOR, PRELOAD_VAR};

use crate::domain::LaunchError;

/// Value of [`PRELOAD_VAR`] for the child: the shim first, followed by
/// whatever the caller already preloads.
#[must_use]
pub fn preload_value(library: &Path, existing: Option<&OsStr>) -> OsString {
    let mut value = OsString::from(library.as_os_str());
    if let Some(existing) = existing.filter(|v| !v.is_empty()) {
        value.push(PRELOAD_SEPARATOR);
        value.push(existing);
    }
    value
}

/// Build the command for the traced program.
///
/// `program` is the resolved executable; `name` is what the user typed and
/// becomes the child's `argv[0]`. Stdout and stderr are left for the
/// transport to wire.
pub fn build_command(program: &Path, name: &OsStr, args: &[OsString], library: &Path) -> Command {
    let preload = preload_value(library, std::env::var_os(PRELOAD_VAR).as_deref());
    debug!("{PRELOAD_VAR}={}", preload.to_string_lossy());

    let mut command = Command::new(program);
    command.arg0(name).args(args).env(PRELOAD_VAR, preload).stdin(Stdio::inherit());
    command
}

/// Spawn `command`, naming the program in the error.
///
/// # Errors
/// [`LaunchError::ProgramNotFound`] if the executable vanished since lookup,
/// [`LaunchError::SpawnFailed`] for any other spawn failure.
pub fn spawn_child(command: &mut Command, name: &OsStr) -> Result<Child, LaunchError> {
    command.spawn().map_err(|source| {
        let program = name.to_string_lossy().into_owned();
        if source.kind() == io::ErrorKind::NotFound {
            LaunchError::ProgramNotFound(program)
        } else {
            LaunchError::SpawnFailed { program, source }
        }
    })
}
