//! Shell Resolution
//!
//! Decides which shell executable to wrap. Candidates are tried in
//! precedence order: explicit override, `$SHELL`, the user's passwd
//! entry, then `/bin/bash` and `/bin/sh`. Every candidate is validated
//! for existence and execute permission; an invalid one logs a warning
//! and falls through. The session is refused only when the whole chain
//! is exhausted.

use std::env;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::models::ShellType;

/// Hard fallbacks tried after the environment and account record
const FALLBACK_SHELLS: [&str; 2] = ["/bin/bash", "/bin/sh"];

/// A shell accepted for spawning, with its classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedShell {
    /// Validated executable path
    pub path: PathBuf,
    /// Classification derived from the path's file name
    pub shell_type: ShellType,
}

/// Resolve the shell to wrap.
///
/// The classification of the winning candidate never fails resolution:
/// an executable that is not bash/zsh/fish resolves as `Unknown`, which
/// disables hook injection but still runs.
pub fn resolve(explicit_override: Option<&Path>) -> Result<ResolvedShell> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Some(path) = explicit_override {
        candidates.push(path.to_path_buf());
    }
    if let Ok(shell) = env::var("SHELL") {
        if !shell.is_empty() {
            candidates.push(PathBuf::from(shell));
        }
    }
    if let Some(shell) = login_shell() {
        candidates.push(shell);
    }
    for fallback in FALLBACK_SHELLS {
        candidates.push(PathBuf::from(fallback));
    }

    for candidate in &candidates {
        match validate_shell(candidate) {
            Ok(()) => {
                let shell_type = ShellType::from_path(candidate);
                debug!("resolved shell {} as {}", candidate.display(), shell_type);
                return Ok(ResolvedShell {
                    path: candidate.clone(),
                    shell_type,
                });
            }
            Err(err) => {
                warn!("skipping shell candidate {}: {}", candidate.display(), err);
            }
        }
    }

    Err(Error::ShellNotFound { candidates })
}

/// Check that a path names an executable regular file
pub fn validate_shell(path: &Path) -> Result<()> {
    let metadata = match std::fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(err) => return Err(Error::Other(format!("not found ({})", err))),
    };
    if !metadata.is_file() {
        return Err(Error::Other("not a regular file".to_string()));
    }
    if metadata.permissions().mode() & 0o111 == 0 {
        return Err(Error::Other("not executable".to_string()));
    }
    Ok(())
}

/// The login shell from the user's passwd entry, if readable
fn login_shell() -> Option<PathBuf> {
    use nix::unistd::{Uid, User};
    match User::from_uid(Uid::current()) {
        Ok(Some(user)) => Some(user.shell),
        Ok(None) => None,
        Err(err) => {
            debug!("passwd lookup failed: {}", err);
            None
        }
    }
}
