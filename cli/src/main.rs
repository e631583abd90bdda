mod config;
mod error;
mod template;
mod test_runner;

use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Parser, Subcommand};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use tracing_subscriber::EnvFilter;

use engine::{Format, FsAssets};

use crate::error::CliError;

const SUBCOMMANDS: &[&str] = &["render", "test", "help"];

#[derive(Parser)]
#[command(
    name = "mdt",
    version,
    about = "Markdown with numbered theorems, cross-references and LaTeX output"
)]
struct Cli {
    /// Disable colored diagnostics
    #[arg(long, global = true)]
    no_color: bool,

    /// More log output (repeatable). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a document
    Render(RenderArgs),

    /// Run .test.md conformance files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct RenderArgs {
    /// Document to convert
    document: PathBuf,

    /// Output format: html or latex
    #[arg(short, long)]
    format: Option<Format>,

    /// Template with {{ key }} placeholders
    #[arg(short, long)]
    template: Option<PathBuf>,

    /// Write to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Render option `key=value` (repeatable)
    #[arg(short = 'O', long = "option")]
    options: Vec<String>,

    /// Template substitution `key=value` (repeatable)
    #[arg(short = 's', long = "subst")]
    substitutions: Vec<String>,

    /// Config file (default: mdt.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print all template variables as JSON
    #[arg(long)]
    json: bool,

    /// Print the resolved document tree
    #[arg(long)]
    ast: bool,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.md file or directory containing them
    path: PathBuf,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    // `mdt doc.md` means `mdt render doc.md`.
    let mut args: Vec<String> = std::env::args().collect();
    if let Some(first_pos) = args.iter().skip(1).find(|a| !a.starts_with('-')) {
        if !SUBCOMMANDS.contains(&first_pos.as_str()) {
            args.insert(1, "render".to_string());
        }
    }

    let cli = Cli::parse_from(&args);
    init_tracing(cli.verbose);

    match cli.command {
        Command::Render(render_args) => {
            if let Err(e) = do_render(render_args, cli.no_color) {
                eprintln!("error: {}", e);
                process::exit(1);
            }
        }
        Command::Test(test_args) => {
            if test_args.list_categories {
                test_runner::list_categories(&test_args.path);
                return;
            }
            let exit_code = test_runner::run_tests(&test_args.path, cli.no_color, &test_args.category);
            process::exit(exit_code);
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn do_render(args: RenderArgs, no_color: bool) -> Result<(), CliError> {
    let config = config::load(args.config.as_deref())?;
    let (options, option_errors) = config.options_with(args.format, &args.options);

    let source = std::fs::read_to_string(&args.document).map_err(|source| CliError::Read {
        path: args.document.clone(),
        source,
    })?;
    let base_dir = args
        .document
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let mut files = SimpleFiles::new();
    let output = engine::convert_with(&source, 0, &options, &FsAssets::new(base_dir));
    let file_id = files.add(args.document.display().to_string(), output.source.clone());

    let color_choice = if no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };
    let writer = StandardStream::stderr(color_choice);
    let term_config = term::Config::default();
    let issues = option_errors
        .iter()
        .map(|e| e.to_issue(file_id))
        .chain(output.issues.iter().cloned());
    for mut issue in issues {
        issue.file_id = file_id;
        let diagnostic = issue.to_diagnostic();
        let _ = term::emit_to_write_style(&mut writer.lock(), &term_config, &files, &diagnostic);
    }

    if args.ast {
        println!("{:#?}", output.root);
        return Ok(());
    }

    let (vars, subst_errors) = config.variables_with(output.variables(), &args.substitutions);
    for e in subst_errors {
        eprintln!("warning: ignoring substitution '{}': {}", e.option(), e);
    }

    let rendered = if args.json {
        serde_json::to_string_pretty(&vars)?
    } else {
        let template_path = args.template.or(config.template);
        let template_text = match &template_path {
            Some(path) => std::fs::read_to_string(path).map_err(|source| CliError::Template {
                path: path.clone(),
                source,
            })?,
            None => template::DEFAULT_TEMPLATE.to_string(),
        };
        template::substitute(&template_text, &vars)
    };

    match &args.output {
        Some(path) => std::fs::write(path, rendered).map_err(|source| CliError::Write {
            path: path.clone(),
            source,
        })?,
        None => println!("{}", rendered),
    }
    Ok(())
}
