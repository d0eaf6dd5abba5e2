//! Prompt Forge CLI
//!
//! Usage:
//!   prompt-forge [--config <FILE>] <COMMAND>
//!
//! Commands:
//!   render <FILE>    Render a template document
//!   validate <FILE>  Validate a template document
//!   check <FILE>     Lint the body's directive syntax
//!   vars <FILE>      List variables referenced by the body
//!   list [DIR]       Load a directory of templates and list their ids

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use prompt_forge::{
    extract_variables, load_document, render_with_options, validate, validate_syntax, Settings,
    Template, TemplateRegistry, Value, Variables,
};

#[derive(Parser)]
#[command(name = "prompt-forge")]
#[command(about = "Render and validate prompt templates with conditional directives")]
struct Cli {
    /// Settings file (TOML format)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a template document
    Render {
        file: PathBuf,

        /// JSON file with an object of variable bindings
        #[arg(long)]
        vars: Option<PathBuf>,

        /// Single binding; the value is read as JSON when it parses, else as a string
        #[arg(long = "var", value_name = "KEY=VALUE")]
        var: Vec<String>,

        /// Start from the input bindings of this test case
        #[arg(long)]
        test_case: Option<String>,

        /// Treat the file as a bare body with no metadata block
        #[arg(long)]
        raw: bool,

        /// Print the full render result as JSON
        #[arg(long)]
        json: bool,

        /// Exit with status 1 on errors, missing variables or security violations
        #[arg(long)]
        strict: bool,
    },
    /// Validate a template document; exits with status 1 when invalid
    Validate {
        file: PathBuf,

        #[arg(long)]
        json: bool,
    },
    /// Lint the body's directive syntax
    Check { file: PathBuf },
    /// List variables referenced by the body
    Vars { file: PathBuf },
    /// Load a directory of templates and list their ids
    List { dir: Option<PathBuf> },
}

fn main() {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => match Settings::from_file(path) {
            Ok(s) => s,
            Err(e) => fail(&format!("Error loading settings '{}': {}", path.display(), e)),
        },
        None => Settings::default(),
    };
    init_logging(&settings.logging.level);

    match cli.command {
        Command::Render {
            file,
            vars,
            var,
            test_case,
            raw,
            json,
            strict,
        } => {
            let (body, declarations, options, mut bindings) = if raw {
                let body = read_file(&file);
                (body, Vec::new(), settings.render, Variables::new())
            } else {
                let template = load_template(&file);
                let bindings = match &test_case {
                    Some(id) => match template.test_cases.iter().find(|case| &case.id == id) {
                        Some(case) => case.input.clone(),
                        None => fail(&format!("Unknown test case '{}' in '{}'", id, file.display())),
                    },
                    None => Variables::new(),
                };
                let options = template.render_options();
                (template.body, template.variables, options, bindings)
            };

            if let Some(path) = &vars {
                bindings.extend(read_vars_file(path));
            }
            for pair in &var {
                let Some((key, value)) = pair.split_once('=') else {
                    fail(&format!("Invalid --var '{}': expected KEY=VALUE", pair));
                };
                bindings.insert(key.trim().to_string(), parse_cli_value(value));
            }

            let result = render_with_options(&body, &bindings, &declarations, &options);
            if json {
                print_json(&result);
            } else {
                println!("{}", result.content);
                for error in &result.errors {
                    eprintln!("error: {}", error);
                }
                for warning in &result.warnings {
                    eprintln!("warning: {}", warning);
                }
                for violation in &result.security_violations {
                    eprintln!("security: {}", violation);
                }
            }
            if strict && !result.is_clean() {
                process::exit(1);
            }
        }
        Command::Validate { file, json } => {
            let template = load_template(&file);
            let report = validate(&template);
            if json {
                print_json(&report);
            } else {
                for issue in &report.errors {
                    println!("error {}", issue);
                }
                for issue in &report.warnings {
                    println!("warning {}", issue);
                }
                for suggestion in &report.suggestions {
                    println!("suggestion: {}", suggestion);
                }
                println!(
                    "{}: {}",
                    file.display(),
                    if report.valid { "valid" } else { "invalid" }
                );
            }
            if !report.valid {
                process::exit(1);
            }
        }
        Command::Check { file } => {
            let template = load_template(&file);
            let report = validate_syntax(&template.body);
            let name = file.display().to_string();
            for issue in report.errors.iter().chain(&report.warnings) {
                eprint!("{}", issue.format(&template.body, &name));
            }
            if !report.valid {
                process::exit(1);
            }
            println!("{}: syntax ok", name);
        }
        Command::Vars { file } => {
            let template = load_template(&file);
            for name in extract_variables(&template.body) {
                let status = match template.variable(&name) {
                    Some(decl) if decl.required => "required",
                    Some(_) => "optional",
                    None => "undeclared",
                };
                println!("{}\t{}", name, status);
            }
        }
        Command::List { dir } => {
            let dir = dir.unwrap_or_else(|| settings.templates.dir.clone());
            let mut registry = TemplateRegistry::new();
            let report = match registry.load_dir(&dir, &settings.templates.extension) {
                Ok(report) => report,
                Err(e) => fail(&format!("Error: {}", e)),
            };
            for template in registry.iter() {
                println!("{}\t{}", template.id(), template.name);
            }
            for failure in &report.failures {
                eprintln!("skipped {}: {}", failure.path.display(), failure.reason);
            }
        }
    }
}

/// Install the stderr subscriber; `RUST_LOG` wins over the configured level
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn fail(message: &str) -> ! {
    eprintln!("{}", message);
    process::exit(1);
}

fn read_file(path: &Path) -> String {
    match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => fail(&format!("Error reading file '{}': {}", path.display(), e)),
    }
}

fn load_template(path: &Path) -> Template {
    match load_document(path) {
        Ok(template) => template,
        Err(e) => fail(&format!("Error: {}", e)),
    }
}

fn read_vars_file(path: &Path) -> Variables {
    let content = read_file(path);
    match serde_json::from_str::<Variables>(&content) {
        Ok(vars) => vars,
        Err(e) => fail(&format!(
            "Error parsing variables '{}': {} (expected a JSON object)",
            path.display(),
            e
        )),
    }
}

/// `--var n=3` binds a number, `--var name=Ada` a string
fn parse_cli_value(raw: &str) -> Value {
    serde_json::from_str::<serde_json::Value>(raw)
        .map(Value::from)
        .unwrap_or_else(|_| Value::from(raw))
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => fail(&format!("Error encoding JSON: {}", e)),
    }
}
