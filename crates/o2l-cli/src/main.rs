use std::{
    fs,
    io::{self, BufRead, Write as _},
    path::{Path, PathBuf},
    process::ExitCode,
};

use o2l::{Interpreter, Lexer, ReplSession, Value, entrypoint_from_manifest, parse_program};

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let Some(command) = args.get(1) else {
        print_usage();
        return ExitCode::SUCCESS;
    };

    match command.as_str() {
        "--help" => {
            print_help();
            ExitCode::SUCCESS
        }
        "--version" => {
            println!("O²L v{VERSION}");
            println!("Apache License 2.0");
            ExitCode::SUCCESS
        }
        "run" => run_command(&args[2..]),
        "parse" => parse_command(&args[2..]),
        "repl" => repl_command(),
        other => {
            eprintln!("Error: Unknown command '{other}'");
            eprintln!("Use 'o2l --help' for usage information");
            ExitCode::FAILURE
        }
    }
}

fn print_usage() {
    println!("O²L Programming Language Interpreter v{VERSION}\n");
    println!("Usage:");
    println!("  o2l run [file.obq]       Run an O²L program (uses o2l.toml entrypoint if no file)");
    println!("  o2l parse <file.obq>     Parse file and output AST");
    println!("  o2l repl                 Start interactive REPL");
    println!("  o2l --help               Show this help message");
    println!("  o2l --version            Show version information");
}

fn print_help() {
    println!("O²L Programming Language Interpreter\n");
    println!("A fully object-oriented programming language with immutable objects.\n");
    println!("Commands:");
    println!("  run [file]     Execute an O²L source file (.obq) or use o2l.toml entrypoint");
    println!("  parse <file>   Parse file and output AST (for LSP/tooling)");
    println!("  repl           Start interactive Read-Eval-Print Loop");
    println!("  --debug        Enable debug output (use with run command)");
    println!("  --json-output  Output in JSON format (use with parse command)");
    println!("  --help         Show this help message");
    println!("  --version      Show version information");
}

fn run_command(args: &[String]) -> ExitCode {
    // Either an explicit file, or the entrypoint from o2l.toml.
    let (filename, flag_args) = match args.first() {
        Some(first) if !first.starts_with("--") => (first.clone(), &args[1..]),
        _ => {
            let manifest = Path::new("o2l.toml");
            if !manifest.exists() {
                eprintln!("Error: No input file specified and no o2l.toml found");
                eprintln!("Usage: o2l run <file.obq>");
                eprintln!("   or: o2l run  (uses entrypoint from o2l.toml)");
                return ExitCode::FAILURE;
            }
            match entrypoint_from_manifest(manifest) {
                Ok(entrypoint) => (entrypoint, args),
                Err(err) => {
                    eprintln!("Error: {}", err.message());
                    eprintln!("Add 'entrypoint = \"src/main.obq\"' to your o2l.toml");
                    return ExitCode::FAILURE;
                }
            }
        }
    };

    let mut debug_mode = false;
    let mut program_args = vec![filename.clone()];
    for arg in flag_args {
        if arg == "--debug" {
            debug_mode = true;
        } else {
            program_args.push(arg.clone());
        }
    }

    if !Path::new(&filename).exists() {
        eprintln!("Error: File '{filename}' not found");
        return ExitCode::FAILURE;
    }
    if !filename.ends_with(".obq") {
        eprintln!("Warning: File '{filename}' does not have .obq extension");
    }
    let source = match fs::read_to_string(&filename) {
        Ok(source) => source,
        Err(_) => {
            eprintln!("Error: Cannot open file '{filename}'");
            return ExitCode::FAILURE;
        }
    };

    if debug_mode {
        println!("[DEBUG] Running file: {filename}");
        println!("[DEBUG] Source code length: {} characters", source.len());
        println!("[DEBUG] Starting lexical analysis...");
    }

    if debug_mode {
        match Lexer::new(&source).tokenize_all() {
            Ok(tokens) => {
                println!("[DEBUG] Tokenized {} tokens", tokens.len());
                for token in &tokens {
                    println!(
                        "[DEBUG] Token: {} '{}' at {}:{}",
                        token.kind,
                        token.lexeme.escape_debug(),
                        token.line,
                        token.column
                    );
                }
                println!("[DEBUG] Starting parsing...");
            }
            Err(err) => {
                eprintln!("{err}");
                return ExitCode::FAILURE;
            }
        }
    }

    let nodes = match parse_program(&source, &filename) {
        Ok(nodes) => nodes,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };
    if debug_mode {
        println!("[DEBUG] Parsed {} AST nodes", nodes.len());
        for node in &nodes {
            println!("[DEBUG] AST Node: {node}");
        }
        println!("[DEBUG] Starting interpretation...");
    }

    let mut interpreter = Interpreter::new(&filename);
    interpreter.set_program_args(program_args);
    let source_path = PathBuf::from(&filename);
    if let Some(source_dir) = source_path.parent() {
        if !source_dir.as_os_str().is_empty() {
            interpreter.add_module_search_path(source_dir);
        }
    }

    match interpreter.execute(&nodes) {
        Ok(Value::Int(exit_code)) => {
            if debug_mode {
                println!("[DEBUG] Execution completed");
                println!("[DEBUG] Main returned exit code: {exit_code}");
            }
            ExitCode::from((exit_code & 0xff) as u8)
        }
        Ok(result) => {
            if debug_mode {
                println!("[DEBUG] Execution completed");
                println!("[DEBUG] Result: {}", interpreter.display_value(&result));
            } else {
                println!("{}", interpreter.display_value(&result));
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn parse_command(args: &[String]) -> ExitCode {
    let Some(filename) = args.first().filter(|a| !a.starts_with("--")) else {
        eprintln!("Error: No input file specified");
        eprintln!("Usage: o2l parse <file.obq> [--json-output]");
        return ExitCode::FAILURE;
    };
    let json_output = args.iter().any(|a| a == "--json-output");

    if !Path::new(filename).exists() {
        if json_output {
            println!("{}", error_envelope(filename, &format!("File not found: {filename}")));
        } else {
            eprintln!("Error: File '{filename}' not found");
        }
        return ExitCode::FAILURE;
    }
    if !filename.ends_with(".obq") && !json_output {
        eprintln!("Warning: File '{filename}' does not have .obq extension");
    }
    let source = match fs::read_to_string(filename) {
        Ok(source) => source,
        Err(_) => {
            if json_output {
                println!("{}", error_envelope(filename, &format!("Cannot open file: {filename}")));
            } else {
                eprintln!("Error: Cannot open file '{filename}'");
            }
            return ExitCode::FAILURE;
        }
    };

    match parse_program(&source, filename) {
        Ok(nodes) => {
            if json_output {
                let envelope = serde_json::json!({
                    "success": true,
                    "file": filename,
                    "ast": nodes,
                });
                match serde_json::to_string_pretty(&envelope) {
                    Ok(rendered) => println!("{rendered}"),
                    Err(err) => {
                        println!("{}", error_envelope(filename, &format!("Serialization failed: {err}")));
                        return ExitCode::FAILURE;
                    }
                }
            } else {
                println!("Successfully parsed {} AST nodes:", nodes.len());
                for (index, node) in nodes.iter().enumerate() {
                    println!("[{index}] {node}");
                }
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            if json_output {
                println!("{}", error_envelope(filename, &err.to_string()));
            } else {
                eprintln!("Parse Error: {err}");
            }
            ExitCode::FAILURE
        }
    }
}

fn error_envelope(filename: &str, message: &str) -> String {
    serde_json::json!({
        "success": false,
        "file": filename,
        "error": message,
    })
    .to_string()
}

fn repl_command() -> ExitCode {
    println!("O²L REPL v{VERSION}");
    println!("Type 'exit' to quit\n");

    let mut session = ReplSession::new();
    let stdin = io::stdin();
    loop {
        print!("o2l> ");
        let _ = io::stdout().flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => {
                println!("Goodbye!");
                return ExitCode::SUCCESS;
            }
            Ok(_) => {}
        }
        let line = line.trim();
        if line == "exit" || line == "quit" {
            println!("Goodbye!");
            return ExitCode::SUCCESS;
        }
        if line.is_empty() {
            continue;
        }

        match session.eval_line(line) {
            Ok(Some(rendered)) => println!("{rendered}"),
            Ok(None) => {}
            Err(err) => println!("Error: {}", err.message()),
        }
    }
}
