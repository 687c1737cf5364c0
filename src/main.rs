use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use actorscript::diagnostics::{render_error, render_warning};
use actorscript::symbols::Registry;

#[derive(Parser)]
#[command(name = "actorscript", version, about = "Actor definition script front end")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a script and print its AST as an s-expression
    Dump {
        /// Source file path
        file: PathBuf,
    },
    /// Compile the states blocks of every class in a script
    Compile {
        /// Source file path
        file: PathBuf,
        /// Print the compiled state tables as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.command {
        Commands::Dump { file } => {
            let Some(source) = read_source(&file) else {
                return ExitCode::FAILURE;
            };
            match actorscript::dump_ast(&source) {
                Ok(text) => {
                    println!("{text}");
                    ExitCode::SUCCESS
                }
                Err(err) => {
                    render_error(&source, &file.display().to_string(), &err);
                    ExitCode::FAILURE
                }
            }
        }
        Commands::Compile { file, json } => {
            let Some(source) = read_source(&file) else {
                return ExitCode::FAILURE;
            };
            let filename = file.display().to_string();
            let registry = Registry::with_actor_defaults();
            match actorscript::compile_file(&source, &registry) {
                Ok(classes) => {
                    let mut failed = false;
                    for class in &classes {
                        for warning in &class.states.warnings {
                            render_warning(&source, &filename, warning);
                        }
                        for error in &class.states.errors {
                            render_error(&source, &filename, error);
                            failed = true;
                        }
                        if json {
                            println!("{}", class.states.summary_json(&class.class));
                        } else {
                            println!(
                                "{}: {} states, {} labels, {} deferred calls",
                                class.class,
                                class.states.states.len(),
                                class.states.labels.len(),
                                class.states.temp_calls.len(),
                            );
                        }
                    }
                    if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS }
                }
                Err(err) => {
                    render_error(&source, &filename, &err);
                    ExitCode::FAILURE
                }
            }
        }
    }
}

fn read_source(file: &PathBuf) -> Option<String> {
    match std::fs::read_to_string(file) {
        Ok(source) => Some(source),
        Err(err) => {
            eprintln!("error: failed to read {}: {err}", file.display());
            None
        }
    }
}
