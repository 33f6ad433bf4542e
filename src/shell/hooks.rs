//! Shell Hook Generation
//!
//! Builds the per-shell startup scripts that make the wrapped shell
//! emit boundary markers. Generation is pure string construction and
//! cannot fail; shells without a recipe get an empty script and the
//! session runs as a plain passthrough.
//!
//! All markers are written with the shell's `printf` builtin, never
//! through a subprocess.
//!
//! Delivery differs per shell and is the bridge's job:
//! - bash rides an exported `PROMPT_COMMAND`: the variable's first
//!   evaluation (at the first prompt, inside the interactive process)
//!   defines hook functions, installs the DEBUG trap, and replaces
//!   itself with the per-prompt hook call. A `PROMPT_COMMAND` assembled
//!   by rc files after launch replaces the bootstrap and disables hooks;
//!   one inherited from the environment is preserved inside the hook.
//! - zsh hooks are function definitions registered with `add-zsh-hook`;
//!   they are sourced from a transient `ZDOTDIR` whose rc files chain to
//!   the user's own (see [`zdotdir_zshenv`] and [`HookScript::zdotdir_zshrc`]).
//! - fish hooks are event-bound functions passed via `fish -C`.

use serde::{Deserialize, Serialize};

use crate::models::ShellType;

/// Bash bootstrap, carried in the exported `PROMPT_COMMAND`.
///
/// The pre-command trap fires per simple command, so it guards on a
/// flag the prompt hook raises: only the first command after a prompt
/// emits a start marker, and the hook call itself never does. The
/// `${PROMPT_COMMAND:-:}` splice expands when this line runs, folding
/// any prompt command inherited from the environment into the hook.
const BASH_HOOKS: &str = r#"PROMPT_COMMAND="__prismshell_preexec() { if [ -n \"\$_PRISMSHELL_AT_PROMPT\" ]; then case \"\$BASH_COMMAND\" in __prismshell_precmd) :;; *) _PRISMSHELL_AT_PROMPT=; printf '\033]133;A\007';; esac; fi; }; __prismshell_precmd() { local _prismshell_status=\$?; printf '\033]133;B;%d\007' \"\$_prismshell_status\"; printf '\033]133;P\007'; ${PROMPT_COMMAND:-:}; printf '\033]133;Q\007'; _PRISMSHELL_AT_PROMPT=1; }; trap '__prismshell_preexec' DEBUG; PROMPT_COMMAND=__prismshell_precmd; __prismshell_precmd"; export PROMPT_COMMAND"#;

/// Zsh hook block, sourced at the end of the transient `.zshrc`.
///
/// `add-zsh-hook` chains onto any preexec/precmd the user's rc files
/// registered instead of clobbering them. The prompt-end marker rides
/// the prompt string itself so it is emitted after the prompt renders.
const ZSH_HOOKS: &str = r#"__prismshell_preexec() { printf '\033]133;A\007'; }
__prismshell_precmd() { local _prismshell_status=$?; printf '\033]133;B;%d\007' "$_prismshell_status"; printf '\033]133;P\007'; }
autoload -Uz add-zsh-hook
add-zsh-hook preexec __prismshell_preexec
add-zsh-hook precmd __prismshell_precmd
PROMPT="${PROMPT}"$'\033]133;Q\007'"#;

/// Fish hook script, passed via `fish -C`.
///
/// The existing prompt function is copied aside with `functions -c` and
/// wrapped so the prompt-end marker follows the rendered prompt.
const FISH_HOOKS: &str = r#"function __prismshell_preexec --on-event fish_preexec; printf '\033]133;A\007'; end; function __prismshell_precmd --on-event fish_prompt; printf '\033]133;B;%d\007' $status; printf '\033]133;P\007'; end; functions -q fish_prompt; and functions -c fish_prompt __prismshell_user_prompt; function fish_prompt; functions -q __prismshell_user_prompt; and __prismshell_user_prompt; printf '\033]133;Q\007'; end"#;

/// How a hook script reaches the interactive shell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InjectionMethod {
    /// Carried in an exported environment variable the shell evaluates
    EnvironmentVariable,
    /// Function definitions sourced or run at shell startup
    FunctionDefinition,
    /// No hooks; the session is a plain passthrough
    None,
}

/// Startup script that makes one shell type emit boundary markers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookScript {
    /// Shell the script was built for
    pub shell_type: ShellType,
    /// The script text; empty when `method` is `None`
    pub script: String,
    /// How the bridge must deliver the script
    pub method: InjectionMethod,
}

impl HookScript {
    /// Build the hook script for a shell type. Cannot fail; unknown
    /// shells get an empty passthrough script.
    pub fn for_shell(shell_type: ShellType) -> Self {
        let (script, method) = match shell_type {
            ShellType::Bash => (BASH_HOOKS, InjectionMethod::EnvironmentVariable),
            ShellType::Zsh => (ZSH_HOOKS, InjectionMethod::FunctionDefinition),
            ShellType::Fish => (FISH_HOOKS, InjectionMethod::FunctionDefinition),
            ShellType::Unknown => ("", InjectionMethod::None),
        };
        Self {
            shell_type,
            script: script.to_string(),
            method,
        }
    }

    /// True when no hooks will be injected
    pub fn is_empty(&self) -> bool {
        self.script.is_empty()
    }

    /// Contents of the transient `.zshrc` for zsh delivery: chain to the
    /// user's own rc file, then register the hooks. Returns `None` for
    /// every other shell.
    pub fn zdotdir_zshrc(&self) -> Option<String> {
        if self.shell_type != ShellType::Zsh {
            return None;
        }
        Some(format!(
            r#"if [[ -n "$_PRISMSHELL_USER_ZDOTDIR" ]]; then
  ZDOTDIR="$_PRISMSHELL_USER_ZDOTDIR"
else
  unset ZDOTDIR
fi
if [[ -f "${{ZDOTDIR:-$HOME}}/.zshrc" ]]; then
  builtin source "${{ZDOTDIR:-$HOME}}/.zshrc"
fi
unset _PRISMSHELL_USER_ZDOTDIR
{}
"#,
            self.script
        ))
    }
}

/// Contents of the transient `.zshenv` for zsh delivery.
///
/// Runs first in the startup sequence: it sources the user's own
/// `.zshenv` with their dotdir restored, records any `ZDOTDIR` that
/// file established, then points `ZDOTDIR` back at the transient
/// directory so the hooked `.zshrc` is read next.
pub fn zdotdir_zshenv() -> String {
    r#"_prismshell_zdotdir="$ZDOTDIR"
if [[ -n "$_PRISMSHELL_USER_ZDOTDIR" ]]; then
  ZDOTDIR="$_PRISMSHELL_USER_ZDOTDIR"
else
  unset ZDOTDIR
fi
if [[ -f "${ZDOTDIR:-$HOME}/.zshenv" ]]; then
  builtin source "${ZDOTDIR:-$HOME}/.zshenv"
fi
_PRISMSHELL_USER_ZDOTDIR="$ZDOTDIR"
ZDOTDIR="$_prismshell_zdotdir"
unset _prismshell_zdotdir
"#
    .to_string()
}
