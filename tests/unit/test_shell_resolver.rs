//! Unit tests for shell resolution and classification

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use prismshell::models::ShellType;
use prismshell::shell::{resolve, validate_shell};

fn executable(dir: &TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, "#!/bin/sh\nexit 0\n").expect("write script");
    let mut perms = fs::metadata(&path).expect("stat script").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).expect("chmod script");
    path
}

#[cfg(test)]
mod classification_tests {
    use super::*;

    #[test]
    fn test_classify_common_install_paths() {
        let cases = [
            ("/bin/bash", ShellType::Bash),
            ("/usr/bin/bash", ShellType::Bash),
            ("/usr/local/bin/zsh", ShellType::Zsh),
            ("/opt/homebrew/bin/fish", ShellType::Fish),
            ("/nix/store/abc123-zsh-5.9/bin/zsh", ShellType::Zsh),
            ("/bin/sh", ShellType::Unknown),
            ("/usr/bin/dash", ShellType::Unknown),
            ("/usr/bin/nu", ShellType::Unknown),
        ];
        for (path, expected) in cases {
            assert_eq!(
                ShellType::from_path(Path::new(path)),
                expected,
                "classifying {}",
                path
            );
        }
    }

    #[test]
    fn test_versioned_binary_names_are_unknown() {
        // Only the plain names classify; a versioned install is wrapped
        // without hooks rather than hooked with the wrong recipe.
        assert_eq!(
            ShellType::from_path(Path::new("/usr/bin/bash-5.2")),
            ShellType::Unknown
        );
        assert_eq!(
            ShellType::from_path(Path::new("/usr/bin/zsh5")),
            ShellType::Unknown
        );
    }

    #[test]
    fn test_hook_support_follows_classification() {
        assert!(ShellType::Bash.supports_hooks());
        assert!(ShellType::Zsh.supports_hooks());
        assert!(ShellType::Fish.supports_hooks());
        assert!(!ShellType::Unknown.supports_hooks());
    }
}

#[cfg(test)]
mod resolution_tests {
    use super::*;

    #[test]
    fn test_resolve_always_finds_a_shell() {
        // Worst case the /bin/sh fallback wins; the chain never comes up
        // empty on a Unix host.
        let resolved = resolve(None).expect("some shell resolves");
        assert!(validate_shell(&resolved.path).is_ok());
    }

    #[test]
    fn test_valid_override_wins_over_everything() {
        let dir = TempDir::new().unwrap();
        let zsh = executable(&dir, "zsh");
        let resolved = resolve(Some(&zsh)).expect("override resolves");
        assert_eq!(resolved.path, zsh);
        assert_eq!(resolved.shell_type, ShellType::Zsh);
    }

    #[test]
    fn test_broken_override_degrades_instead_of_failing() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("no-such-shell");
        let resolved = resolve(Some(&missing)).expect("fallback chain still runs");
        assert_ne!(resolved.path, missing);
    }

    #[test]
    fn test_symlinked_shell_validates() {
        let dir = TempDir::new().unwrap();
        let real = executable(&dir, "fish");
        let link = dir.path().join("shell-link");
        std::os::unix::fs::symlink(&real, &link).expect("create symlink");

        assert!(validate_shell(&link).is_ok());
        let resolved = resolve(Some(&link)).expect("symlink resolves");
        assert_eq!(resolved.path, link);
    }

    #[test]
    fn test_directory_named_like_a_shell_is_rejected() {
        let dir = TempDir::new().unwrap();
        let fake = dir.path().join("bash");
        fs::create_dir(&fake).unwrap();
        assert!(validate_shell(&fake).is_err());

        let resolved = resolve(Some(&fake)).expect("fallback chain still runs");
        assert_ne!(resolved.path, fake);
    }

    #[test]
    fn test_execute_bit_required() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("readable-only");
        fs::write(&path, "#!/bin/sh\n").unwrap();
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o644);
        fs::set_permissions(&path, perms).unwrap();

        assert!(validate_shell(&path).is_err());
    }
}
