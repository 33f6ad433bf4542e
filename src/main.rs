//! prismshell - a transparent PTY bridge with command boundary events
//!
//! Wraps the user's own shell on a pseudoterminal, forwards bytes in
//! both directions, and dispatches command-boundary events scanned from
//! the output stream. The wrapper exits with the shell's own code.

use std::env;
use std::path::PathBuf;
use std::process;

use tracing::{debug, info};

use prismshell::config::{self, Config};
use prismshell::error::Result;
use prismshell::events::EventLogger;
use prismshell::shell::{self, HookScript, ResolvedShell};
use prismshell::{BridgeIo, PtyBridge, SessionSummary};

/// Command-line options
#[derive(Debug, Default)]
struct AppArgs {
    /// Shell override; wins over the config file
    shell: Option<PathBuf>,
    /// Disable all visual effects
    plain: bool,
    /// Verbose logging
    debug: bool,
}

impl AppArgs {
    /// Parse command line arguments
    fn parse() -> Result<Self> {
        let args: Vec<String> = env::args().skip(1).collect();
        Self::parse_from(&args)
    }

    fn parse_from(args: &[String]) -> Result<Self> {
        let mut parsed = AppArgs::default();

        let mut i = 0;
        while i < args.len() {
            match args[i].as_str() {
                "--shell" | "-s" => {
                    if i + 1 < args.len() {
                        parsed.shell = Some(PathBuf::from(&args[i + 1]));
                        i += 1;
                    } else {
                        return Err("--shell requires a path".into());
                    }
                }
                "--plain" | "--no-effects" => {
                    parsed.plain = true;
                }
                "--debug" | "-d" => {
                    parsed.debug = true;
                }
                "--config-dir" => match config::loader::config_dir(None) {
                    Some(dir) => {
                        println!("{}", dir.display());
                        process::exit(0);
                    }
                    None => {
                        eprintln!("prismshell error: no configuration directory on this system");
                        process::exit(1);
                    }
                },
                "--help" | "-h" => {
                    print_help();
                    process::exit(0);
                }
                "--version" | "-v" => {
                    println!("prismshell v{}", env!("CARGO_PKG_VERSION"));
                    process::exit(0);
                }
                arg if arg.starts_with('-') => {
                    return Err(format!("unknown option: {}", arg).into());
                }
                arg => {
                    return Err(format!("unexpected argument: {}", arg).into());
                }
            }
            i += 1;
        }

        Ok(parsed)
    }
}

/// Print help information
fn print_help() {
    println!("prismshell - a transparent PTY bridge with command boundary events");
    println!();
    println!("USAGE:");
    println!("    prismshell [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -s, --shell <PATH>     Wrap this shell instead of auto-detecting");
    println!("        --plain            Disable visual effects (alias: --no-effects)");
    println!("        --config-dir       Print the configuration directory and exit");
    println!("    -d, --debug            Verbose logging");
    println!("    -h, --help             Print this help message");
    println!("    -v, --version          Print version information");
    println!();
    println!("CONFIGURATION:");
    println!("    prismshell reads <config dir>/prismshell/config.toml and writes a");
    println!("    starter file there on first run. A broken config never stops the");
    println!("    shell from starting.");
    println!();
    println!("ENVIRONMENT:");
    println!("    PRISMSHELL_DEBUG       Enable debug logging (1 or true)");
    println!("    RUST_LOG               Set logging level (error, warn, info, debug, trace)");
}

/// Initialize logging to stderr.
///
/// The default level is `warn`: the wrapped session owns the terminal,
/// so routine logging would scribble over the shell's display.
fn init_logging(args: &AppArgs) {
    let default_level = if args.debug
        || env::var("PRISMSHELL_DEBUG").map_or(false, |v| v == "1" || v.to_lowercase() == "true")
    {
        "debug"
    } else {
        "warn"
    };

    let env_filter = env::var("RUST_LOG").unwrap_or_else(|_| default_level.to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from(env_filter))
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

/// One line before raw mode: version, shell, and what the session does
fn print_banner(shell: &ResolvedShell, hooks: &HookScript, effects: bool) {
    let markers = if hooks.is_empty() {
        "markers off"
    } else {
        "markers on"
    };
    let fx = if effects { "effects on" } else { "effects off" };
    println!(
        "prismshell v{} | {} | {} | {}",
        env!("CARGO_PKG_VERSION"),
        shell.path.display(),
        markers,
        fx
    );
}

async fn run(args: AppArgs, config: Config) -> Result<SessionSummary> {
    let override_path = args
        .shell
        .as_deref()
        .or(config.shell.override_path.as_deref());
    let shell = shell::resolve(override_path)?;

    let hooks = HookScript::for_shell(shell.shell_type);
    if hooks.is_empty() {
        info!(
            "no hook recipe for '{}', running as a plain passthrough",
            shell.path.display()
        );
    }

    let effects = config.effects.enabled && !args.plain;
    if config.shell.startup_banner {
        print_banner(&shell, &hooks, effects);
    }

    let mut bridge = PtyBridge::new(shell, hooks, BridgeIo::stdio());
    if effects {
        bridge.register_consumer(Box::new(EventLogger));
    } else {
        bridge.set_echo_detection(false);
    }
    if config.safety.no_echo_detection {
        bridge.set_echo_detection(false);
    }

    bridge.run().await
}

#[tokio::main]
async fn main() {
    let args = AppArgs::parse().unwrap_or_else(|e| {
        eprintln!("prismshell error: {}", e);
        eprintln!();
        print_help();
        process::exit(1);
    });

    init_logging(&args);

    let config = config::load(None);

    match run(args, config).await {
        Ok(summary) => {
            debug!("session over: {}", summary.exit);
            process::exit(summary.exit.code());
        }
        Err(e) => {
            eprintln!("prismshell error: {}", e);
            process::exit(1);
        }
    }
}
