use std::io::Read;
use std::path::Path;
use std::process::ExitCode;

use clap::{Arg, ArgAction, Command};
use tracing_subscriber::EnvFilter;

use chalktalk::matching;
use chalktalk::parsing;
use chalktalk::problem;
use chalktalk::validation;

fn main() -> ExitCode {
    const VERSION: &str = concat!("v", env!("CARGO_PKG_VERSION"));

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let matches = Command::new("chalktalk")
        .version(VERSION)
        .propagate_version(true)
        .about("The ChalkTalk mathematics language.")
        .disable_help_subcommand(true)
        .subcommand(
            Command::new("check")
                .about("Parse and check the given document")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Report problems as JSON instead of readable diagnostics."),
                )
                .arg(
                    Arg::new("filename")
                        .required(true)
                        .help("The document to check, or '-' to read standard input."),
                ),
        )
        .subcommand(
            Command::new("expand")
                .about("Rewrite every statement into its declared written form")
                .arg(
                    Arg::new("filename")
                        .required(true)
                        .help("The document to expand, or '-' to read standard input."),
                ),
        )
        .subcommand(
            Command::new("signatures")
                .about("List every command signature used in the document")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Emit the signatures as a JSON array."),
                )
                .arg(
                    Arg::new("filename")
                        .required(true)
                        .help("The document to scan, or '-' to read standard input."),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("check", submatches)) => {
            let filename = filename_argument(submatches);
            let content = match read_input(filename) {
                Ok(content) => content,
                Err(code) => return code,
            };
            let errors = match parsing::parse(&content) {
                Ok(document) => validation::check_document(&document),
                Err(errors) => errors,
            };
            if errors.is_empty() {
                ExitCode::SUCCESS
            } else {
                if submatches.get_flag("json") {
                    println!("{}", problem::render_json(&errors));
                } else {
                    eprintln!("{}", problem::render_all(&errors, filename, &content));
                }
                ExitCode::FAILURE
            }
        }
        Some(("expand", submatches)) => {
            let filename = filename_argument(submatches);
            let content = match read_input(filename) {
                Ok(content) => content,
                Err(code) => return code,
            };
            match parsing::parse(&content) {
                Ok(document) => {
                    let (expanded, errors) = matching::expand_with_errors(document);
                    println!("{}", expanded.to_code());
                    if !errors.is_empty() {
                        eprintln!("{}", problem::render_all(&errors, filename, &content));
                        return ExitCode::FAILURE;
                    }
                    ExitCode::SUCCESS
                }
                Err(errors) => {
                    eprintln!("{}", problem::render_all(&errors, filename, &content));
                    ExitCode::FAILURE
                }
            }
        }
        Some(("signatures", submatches)) => {
            let filename = filename_argument(submatches);
            let content = match read_input(filename) {
                Ok(content) => content,
                Err(code) => return code,
            };
            match parsing::parse(&content) {
                Ok(document) => {
                    let signatures = matching::find_all_signatures(&document);
                    if submatches.get_flag("json") {
                        println!(
                            "{}",
                            serde_json::to_string_pretty(&signatures)
                                .unwrap_or_else(|_| "[]".to_string())
                        );
                    } else {
                        for signature in signatures {
                            println!("{}", signature);
                        }
                    }
                    ExitCode::SUCCESS
                }
                Err(errors) => {
                    eprintln!("{}", problem::render_all(&errors, filename, &content));
                    ExitCode::FAILURE
                }
            }
        }
        _ => {
            println!("usage: chalktalk [COMMAND] ...");
            println!("Try '--help' for more information.");
            ExitCode::SUCCESS
        }
    }
}

fn filename_argument(submatches: &clap::ArgMatches) -> &Path {
    match submatches.get_one::<String>("filename") {
        Some(filename) => Path::new(filename),
        None => Path::new("-"),
    }
}

fn read_input(filename: &Path) -> Result<String, ExitCode> {
    if filename == Path::new("-") {
        let mut content = String::new();
        match std::io::stdin().read_to_string(&mut content) {
            Ok(_) => Ok(content),
            Err(error) => {
                eprintln!("error: failed reading standard input: {}", error);
                Err(ExitCode::FAILURE)
            }
        }
    } else {
        match parsing::load(filename) {
            Ok(content) => Ok(content),
            Err(error) => {
                eprintln!("{}", problem::loading_details(&error));
                Err(ExitCode::FAILURE)
            }
        }
    }
}
