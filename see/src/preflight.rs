//! Pre-flight checks for see
//!
//! Validates the preload library before the traced program is launched.
//! The dynamic loader silently skips a preload entry it cannot use, so a bad
//! path would otherwise just produce a run without any report.

use anyhow::{bail, Context, Result};
use object::{Object, ObjectKind};
use std::path::{Path, PathBuf};

/// Run all pre-flight checks and return the library's absolute path.
///
/// The loader resolves relative preload entries against the child's working
/// directory, so the path handed to it is made absolute here.
pub fn run_preflight_checks(library: &Path) -> Result<PathBuf> {
    check_library_exists(library)?;
    check_shared_object(library)?;
    std::fs::canonicalize(library)
        .with_context(|| format!("Failed to resolve path: {}", library.display()))
}

/// Check if the preload library exists and is a regular file
fn check_library_exists(library: &Path) -> Result<()> {
    if !library.exists() {
        bail!(
            "Preload library not found: {}\n\n\
             Build it with: cargo run -p xtask -- build-shim\n\
             or point to it with --library / LIBSEE_LIBRARY.",
            library.display()
        );
    }
    if !library.is_file() {
        bail!(
            "Not a file: {}\n\n\
             --library must point to a shared object, not a directory.",
            library.display()
        );
    }
    Ok(())
}

/// Warn if the library is not a shared object the loader can preload
fn check_shared_object(library: &Path) -> Result<()> {
    let file_data = std::fs::read(library)
        .with_context(|| format!("Failed to read library: {}", library.display()))?;

    match object::File::parse(&*file_data) {
        Ok(obj) if obj.kind() == ObjectKind::Dynamic => {}
        Ok(_) => eprintln!(
            "warning: {} is not a shared object, the loader will not preload it",
            library.display()
        ),
        Err(_) => eprintln!(
            "warning: {} is not an ELF file, no report will be produced",
            library.display()
        ),
    }

    Ok(())
}
