//! Unit tests for hook script contracts that span shells
//!
//! Per-recipe details (quoting, trap wiring, prompt wrapping) are
//! covered by the inline tests next to the recipes. These tests pin the
//! contracts shared by every shell and the composition of the zsh
//! delivery files.

use prismshell::models::ShellType;
use prismshell::shell::{zdotdir_zshenv, HookScript, InjectionMethod};

/// Marker printf fragments every hooked shell must emit
const MARKER_FRAGMENTS: [&str; 4] = [
    r"\033]133;A\007",
    r"\033]133;B;%d\007",
    r"\033]133;P\007",
    r"\033]133;Q\007",
];

const HOOKED_SHELLS: [ShellType; 3] = [ShellType::Bash, ShellType::Zsh, ShellType::Fish];

#[cfg(test)]
mod hook_script_tests {
    use super::*;

    #[test]
    fn test_every_hooked_shell_emits_all_markers() {
        for shell_type in HOOKED_SHELLS {
            let hooks = HookScript::for_shell(shell_type);
            assert!(!hooks.is_empty(), "{} has a recipe", shell_type);
            for fragment in MARKER_FRAGMENTS {
                assert!(
                    hooks.script.contains(fragment),
                    "{} script must emit {}",
                    shell_type,
                    fragment
                );
            }
        }
    }

    #[test]
    fn test_scripts_contain_no_raw_control_bytes() {
        // Markers are printed by the shell at runtime via printf octal
        // escapes; the script text itself stays plain ASCII so it
        // survives quoting and environment transport.
        for shell_type in HOOKED_SHELLS {
            let hooks = HookScript::for_shell(shell_type);
            assert!(
                hooks.script.bytes().all(|b| b != 0x1b && b != 0x07),
                "{} script carries pre-baked control bytes",
                shell_type
            );
        }
    }

    #[test]
    fn test_hook_functions_share_a_namespace() {
        // Uniform names keep the recipes greppable in a live session and
        // out of the way of user-defined functions.
        for shell_type in HOOKED_SHELLS {
            let hooks = HookScript::for_shell(shell_type);
            assert!(hooks.script.contains("__prismshell_preexec"));
            assert!(hooks.script.contains("__prismshell_precmd"));
        }
    }

    #[test]
    fn test_injection_method_mapping() {
        let cases = [
            (ShellType::Bash, InjectionMethod::EnvironmentVariable),
            (ShellType::Zsh, InjectionMethod::FunctionDefinition),
            (ShellType::Fish, InjectionMethod::FunctionDefinition),
            (ShellType::Unknown, InjectionMethod::None),
        ];
        for (shell_type, method) in cases {
            assert_eq!(HookScript::for_shell(shell_type).method, method);
        }
    }

    #[test]
    fn test_generation_is_pure() {
        for shell_type in HOOKED_SHELLS {
            assert_eq!(
                HookScript::for_shell(shell_type),
                HookScript::for_shell(shell_type)
            );
        }
    }

    #[test]
    fn test_unknown_shell_has_nothing_to_deliver() {
        let hooks = HookScript::for_shell(ShellType::Unknown);
        assert!(hooks.is_empty());
        assert_eq!(hooks.script, "");
        assert!(hooks.zdotdir_zshrc().is_none());
    }
}

#[cfg(test)]
mod zdotdir_delivery_tests {
    use super::*;

    #[test]
    fn test_zshrc_embeds_the_hook_script_verbatim() {
        let hooks = HookScript::for_shell(ShellType::Zsh);
        let zshrc = hooks.zdotdir_zshrc().unwrap();
        assert!(zshrc.contains(&hooks.script));
    }

    #[test]
    fn test_zshrc_sources_user_rc_before_registering_hooks() {
        let hooks = HookScript::for_shell(ShellType::Zsh);
        let zshrc = hooks.zdotdir_zshrc().unwrap();

        let source_pos = zshrc
            .find(r#"builtin source "${ZDOTDIR:-$HOME}/.zshrc""#)
            .expect("user rc must be sourced");
        let hook_pos = zshrc
            .find("add-zsh-hook precmd")
            .expect("hooks must be registered");
        assert!(
            source_pos < hook_pos,
            "hooks register after the user's rc so it cannot unregister them"
        );
        assert!(zshrc.contains("unset _PRISMSHELL_USER_ZDOTDIR"));
    }

    #[test]
    fn test_zshenv_round_trips_the_dotdir() {
        let zshenv = zdotdir_zshenv();
        // The user's zshenv runs with their dotdir in effect, whatever
        // ZDOTDIR it establishes is recorded, then the transient
        // directory takes over again so the hooked .zshrc is read next.
        let record_pos = zshenv
            .find(r#"_PRISMSHELL_USER_ZDOTDIR="$ZDOTDIR""#)
            .expect("resulting dotdir must be recorded");
        let repoint_pos = zshenv
            .find(r#"ZDOTDIR="$_prismshell_zdotdir""#)
            .expect("transient dotdir must be restored");
        assert!(record_pos < repoint_pos);
        assert!(zshenv.contains(r#"builtin source "${ZDOTDIR:-$HOME}/.zshenv""#));
    }
}
