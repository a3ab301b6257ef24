use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use stubdoc::{
    display_error,
    docstring::docstring::render_unit,
    resolver::context::ResolutionContext,
    scope::scope::SourceUnit,
};
use tracing_subscriber::EnvFilter;

/// Print docstring templates for the functions of a Python file.
#[derive(Parser, Debug)]
#[command(name = "stubdoc", version)]
struct Args {
    /// Python source file
    file: PathBuf,

    /// Only this function; `Class.method` selects a method
    #[arg(long)]
    function: Option<String>,

    /// Do not resolve calls through functions defined in the same file
    #[arg(long, default_value_t = false)]
    no_follow: bool,

    /// Print the numbered template instead of the snippet
    #[arg(long, default_value_t = false)]
    numbered_only: bool,
}

fn main() -> ExitCode {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let file_name = args.file.display().to_string();

    let unit = match SourceUnit::load(&args.file) {
        Ok(unit) => unit,
        Err(error) => {
            // Parse errors point into the file, so show the line
            let source = std::fs::read_to_string(&args.file).unwrap_or_default();
            eprint!("{}", display_error(&error, &file_name, &source));
            return ExitCode::FAILURE;
        }
    };

    let context = ResolutionContext {
        follow_local_definitions: !args.no_follow,
        ..ResolutionContext::default()
    };

    let rendered = match render_unit(&unit, args.function.as_deref(), &context) {
        Ok(rendered) => rendered,
        Err(error) => {
            eprint!("{}", display_error(&error, &file_name, unit.source()));
            return ExitCode::FAILURE;
        }
    };

    for (index, function) in rendered.iter().enumerate() {
        if index > 0 {
            println!();
        }
        println!("# {}", function.function);
        if args.numbered_only {
            print!("{}", function.numbered);
        } else {
            print!("{}", function.snippet);
        }
    }

    ExitCode::SUCCESS
}
