//! Resolve the traced program the way a shell would.

use std::env;
use std::ffi::OsStr;
use std::fs;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use crate::domain::LaunchError;

/// Find the executable for `name`.
///
/// Names containing a `/` are taken as paths; anything else is searched for
/// in the directories of `$PATH`, first match wins. The name is used as raw
/// bytes and need not be UTF-8.
///
/// # Errors
/// Returns [`LaunchError::ProgramNotFound`] if no executable file matches.
pub fn resolve_program(name: &OsStr) -> Result<PathBuf, LaunchError> {
    resolve_in(name, env::var_os("PATH").as_deref())
}

fn resolve_in(name: &OsStr, search_path: Option<&OsStr>) -> Result<PathBuf, LaunchError> {
    let not_found = || LaunchError::ProgramNotFound(name.to_string_lossy().into_owned());

    if name.is_empty() {
        return Err(not_found());
    }

    if name.as_bytes().contains(&b'/') {
        let path = Path::new(name);
        return if is_executable(path) { Ok(path.to_path_buf()) } else { Err(not_found()) };
    }

    search_path
        .into_iter()
        .flat_map(env::split_paths)
        // An empty PATH entry means the current directory
        .map(|dir| if dir.as_os_str().is_empty() { PathBuf::from(".") } else { dir })
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
        .ok_or_else(not_found)
}

/// Check if `path` is a regular file with any execute bit set.
fn is_executable(path: &Path) -> bool {
    fs::metadata(path).is_ok_and(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
}
