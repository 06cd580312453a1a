//! CLI driver (spec.md §6 / `SPEC_FULL.md` §6). This crate has no
//! lexer/parser (out of scope per spec.md §1), so the `<path>`/`-f`/`-r`
//! inputs here are a JSON-serialized `Vec<ast::Stmt>` program rather than
//! source text — the `ast.rs` node types derive `serde` for exactly this
//! boundary. An external front-end producing that JSON is left to the host;
//! this binary only wires the already-built AST through `Compiler` and `Vm`.

use clap::Parser;
use phpv::ast::Stmt;
use phpv::compiler::Compiler;
use phpv::host::HostContext;
use phpv::registry::Registry;
use phpv::value::array::ArrayData;
use phpv::value::Value;
use phpv::vm::Vm;
use std::io::{self, BufRead, Write as _};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "phpv", version, disable_version_flag = true, about = "A bytecode compiler and VM for a PHP-like scripting language")]
struct Cli {
    /// Path to a JSON-encoded program (same as `-f`).
    path: Option<String>,

    #[arg(short = 'f', long = "file", conflicts_with = "path")]
    file: Option<String>,

    /// Print version and exit (spec.md §6 names `-v`, not clap's default `-V`).
    #[arg(short = 'v', long = "version", action = clap::ArgAction::Version)]
    version: (),

    #[arg(short = 'r', long = "run")]
    code: Option<String>,

    #[arg(short = 'a', long = "interactive")]
    interactive: bool,

    #[arg(short = 'S', long = "server")]
    server: Option<String>,

    /// Trailing arguments bound to `$argv`/`$argc`.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    script_args: Vec<String>,
}

fn main() -> ExitCode {
    phpv::logger::init_logger();
    let cli = Cli::parse();

    if let Some(addr) = cli.server {
        log::warn!("built-in HTTP server ({addr}) is not implemented in this build");
        return ExitCode::from(0);
    }

    if cli.interactive {
        return run_interactive();
    }

    let source = if let Some(code) = cli.code {
        code
    } else if let Some(path) = cli.file.or(cli.path) {
        match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) => {
                log::error!("cannot read {path}: {err}");
                return ExitCode::from(1);
            }
        }
    } else {
        log::error!("usage: phpv <path> | -f <path> | -r <code> | -a");
        return ExitCode::from(1);
    };

    run_program(&source, &cli.script_args)
}

fn run_program(json_source: &str, script_args: &[String]) -> ExitCode {
    let program: Vec<Stmt> = match serde_json::from_str(json_source) {
        Ok(p) => p,
        Err(err) => {
            log::error!("parse error: {err}");
            return ExitCode::from(1);
        }
    };

    let compiler = Compiler::new("<main>");
    let unit = match compiler.compile(&program) {
        Ok(unit) => unit,
        Err(errors) => {
            for err in errors.0.iter() {
                log::error!("compile error: {err}");
            }
            return ExitCode::from(1);
        }
    };

    let mut registry = Registry::new();
    phpv::stdlib::register(&mut registry);

    let mut vm = Vm::new(unit, registry, Box::new(io::stdout()));
    seed_argv(&mut vm, script_args);

    match vm.run() {
        Ok(()) => {
            for warning in vm.warnings() {
                log::warn!("{warning}");
            }
            ExitCode::from(vm.exit_code().unwrap_or(0))
        }
        Err(exception) => {
            log::error!("uncaught {}", exception.to_php_string().to_string_lossy());
            ExitCode::from(vm.exit_code().unwrap_or(255))
        }
    }
}

fn seed_argv(vm: &mut Vm, script_args: &[String]) {
    let mut argv = ArrayData::new();
    for arg in script_args {
        argv.push(Value::new_string(arg.clone()));
    }
    vm.set_global("argc", Value::new_int(script_args.len() as i64));
    vm.set_global("argv", Value::new_array(argv));
}

/// `-a`: accumulate lines until the buffer parses as a complete JSON value,
/// execute it as a one-statement program, echo the top-level result, and
/// persist the line to a history file (spec.md §6's "host-chosen file").
fn run_interactive() -> ExitCode {
    let stdin = io::stdin();
    let mut history = history_writer();
    let mut buffer = String::new();
    let mut registry = Registry::new();
    phpv::stdlib::register(&mut registry);

    print!("phpv> ");
    let _ = io::stdout().flush();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let trimmed = line.trim();
        if trimmed == "exit" || trimmed == "quit" {
            break;
        }
        buffer.push_str(&line);
        buffer.push('\n');

        match serde_json::from_str::<Stmt>(&buffer) {
            Ok(stmt) => {
                if let Some(file) = history.as_mut() {
                    let _ = writeln!(file, "{line}");
                }
                let compiler = Compiler::new("<shell>");
                match compiler.compile(&[stmt]) {
                    Ok(unit) => {
                        let mut vm = Vm::new(unit, std::mem::take(&mut registry), Box::new(io::stdout()));
                        match vm.run() {
                            Ok(()) => {}
                            Err(exception) => {
                                println!("uncaught {}", exception.to_php_string().to_string_lossy());
                            }
                        }
                        registry = std::mem::replace(vm.registry_mut(), Registry::new());
                    }
                    Err(errors) => {
                        for err in errors.0.iter() {
                            println!("compile error: {err}");
                        }
                    }
                }
                buffer.clear();
                print!("phpv> ");
                let _ = io::stdout().flush();
            }
            Err(err) if err.is_eof() => {
                // unbalanced input so far; keep accumulating lines.
                print!("  -> ");
                let _ = io::stdout().flush();
            }
            Err(err) => {
                println!("parse error: {err}");
                buffer.clear();
                print!("phpv> ");
                let _ = io::stdout().flush();
            }
        }
    }
    ExitCode::from(0)
}

fn history_writer() -> Option<std::fs::File> {
    let path = std::env::var("PHPV_HISTORY_FILE").ok().unwrap_or_else(|| ".phpv_history".to_string());
    std::fs::OpenOptions::new().create(true).append(true).open(path).ok()
}
