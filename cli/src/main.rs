use std::cell::RefCell;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use clap::{Args, Parser, Subcommand};
use cmdroute_core::{Bindings, FlagSet};
use cmdroute_dispatch::{Dispatcher, Manifest, Outcome};
use serde::Serialize;
use tracing::debug;

/// Output format for structured results.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
}

/// Shell dialect for completions.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum Shell {
    Bash,
    Zsh,
}

#[derive(Debug, Parser)]
#[command(name = "cmdroute")]
#[command(about = "Inspect, validate and exercise command manifests")]
struct Cli {
    /// Log filter used when RUST_LOG is unset (e.g. debug, cmdroute_dispatch=trace).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Route arguments through a manifest and print the resulting bindings.
    Parse(ParseArgs),
    /// Print the normalized command table of a manifest.
    Describe(DescribeArgs),
    /// Validate one or more manifest files.
    Validate(ValidateArgs),
    /// Print completion candidates for partially typed words.
    Complete(CompleteArgs),
    /// Print a shell completion script for the program a manifest declares.
    Completion(CompletionArgs),
}

#[derive(Debug, Args)]
struct ParseArgs {
    /// Manifest file (YAML or JSON).
    #[arg(long, short = 'm')]
    manifest: PathBuf,
    /// Output format.
    #[arg(long, short = 'f', default_value = "json")]
    format: OutputFormat,
    /// Program arguments, after `--`.
    #[arg(last = true)]
    args: Vec<String>,
}

#[derive(Debug, Args)]
struct DescribeArgs {
    /// Manifest file (YAML or JSON).
    #[arg(long, short = 'm')]
    manifest: PathBuf,
    /// Output format.
    #[arg(long, short = 'f', default_value = "yaml")]
    format: OutputFormat,
}

#[derive(Debug, Args)]
struct ValidateArgs {
    /// Manifest files.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

#[derive(Debug, Args)]
struct CompleteArgs {
    /// Manifest file (YAML or JSON).
    #[arg(long, short = 'm')]
    manifest: PathBuf,
    /// Candidate format.
    #[arg(long, default_value = "bash")]
    shell: Shell,
    /// Words typed so far, after `--`; the last one is being completed.
    #[arg(last = true)]
    words: Vec<String>,
}

#[derive(Debug, Args)]
struct CompletionArgs {
    /// Shell to generate the script for.
    shell: Shell,
    /// Manifest file (YAML or JSON).
    #[arg(long, short = 'm')]
    manifest: PathBuf,
}

/// What `parse` prints for a command that ran.
#[derive(Debug, Serialize)]
struct ParseReport {
    command: String,
    #[serde(flatten)]
    bindings: Bindings,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .init();

    let result = match cli.command {
        Command::Parse(args) => run_parse(args),
        Command::Describe(args) => run_describe(args),
        Command::Validate(args) => run_validate(args),
        Command::Complete(args) => run_complete(args),
        Command::Completion(args) => run_completion(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run_parse(args: ParseArgs) -> Result<(), String> {
    let manifest = load_manifest(&args.manifest)?;

    let captured: Rc<RefCell<Option<Bindings>>> = Rc::default();
    let mut dispatcher = manifest
        .build_dispatcher(|_| {
            let captured = Rc::clone(&captured);
            move |flags: &FlagSet, _: &[String]| {
                *captured.borrow_mut() = Some(flags.bindings());
                Ok(())
            }
        })
        .map_err(|err| invalid_manifest(&args.manifest, err))?;

    let mut out = Vec::new();
    let outcome = dispatcher
        .execute_with(&args.args, &mut out)
        .map_err(|err| err.to_string())?;

    let mut stdout = io::stdout().lock();
    stdout
        .write_all(&out)
        .map_err(|err| format!("Failed to write output: {err}"))?;

    if let Outcome::Ran(command) = outcome {
        let bindings = captured
            .borrow_mut()
            .take()
            .ok_or_else(|| format!("command '{command}' ran without recording its bindings"))?;
        let report = ParseReport { command, bindings };
        writeln!(stdout, "{}", render(&report, args.format)?.trim_end())
            .map_err(|err| format!("Failed to write output: {err}"))?;
    }
    Ok(())
}

fn run_describe(args: DescribeArgs) -> Result<(), String> {
    let manifest = load_manifest(&args.manifest)?;
    let dispatcher = inert_dispatcher(&manifest, &args.manifest)?;
    let described = Manifest::from_dispatcher(&dispatcher);
    println!("{}", render(&described, args.format)?.trim_end());
    Ok(())
}

fn run_validate(args: ValidateArgs) -> Result<(), String> {
    let mut commands = 0;
    for path in &args.inputs {
        let manifest = load_manifest(path)?;
        manifest
            .validate()
            .map_err(|err| invalid_manifest(path, err))?;
        debug!(path = %path.display(), commands = manifest.commands.len(), "manifest is valid");
        commands += manifest.commands.len();
    }
    println!(
        "Validated {} manifest(s) declaring {commands} command(s).",
        args.inputs.len()
    );
    Ok(())
}

fn run_complete(args: CompleteArgs) -> Result<(), String> {
    let manifest = load_manifest(&args.manifest)?;
    let dispatcher = inert_dispatcher(&manifest, &args.manifest)?;

    let mut stdout = io::stdout().lock();
    match args.shell {
        Shell::Bash => dispatcher.write_bash_completions(&args.words, &mut stdout),
        Shell::Zsh => dispatcher.write_zsh_completions(&args.words, &mut stdout),
    }
    .map_err(|err| format!("Failed to write completions: {err}"))
}

fn run_completion(args: CompletionArgs) -> Result<(), String> {
    let manifest = load_manifest(&args.manifest)?;
    let dispatcher = inert_dispatcher(&manifest, &args.manifest)?;
    let script = match args.shell {
        Shell::Bash => dispatcher.bash_completion_script(),
        Shell::Zsh => dispatcher.zsh_completion_script(),
    };
    print!("{script}");
    Ok(())
}

fn load_manifest(path: &Path) -> Result<Manifest, String> {
    let manifest = Manifest::load(path)
        .map_err(|err| format!("Failed to load '{}': {err}", path.display()))?;
    debug!(path = %path.display(), program = %manifest.name, "loaded manifest");
    Ok(manifest)
}

/// A dispatcher whose commands do nothing, for inspection only.
fn inert_dispatcher(manifest: &Manifest, path: &Path) -> Result<Dispatcher, String> {
    manifest
        .build_dispatcher(|_| |_: &FlagSet, _: &[String]| Ok(()))
        .map_err(|err| invalid_manifest(path, err))
}

fn invalid_manifest(path: &Path, err: impl std::fmt::Display) -> String {
    format!("Invalid manifest '{}': {err}", path.display())
}

fn render<T: Serialize>(value: &T, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)
            .map_err(|err| format!("Failed to serialize output: {err}")),
        OutputFormat::Yaml => {
            serde_yaml::to_string(value).map_err(|err| format!("Failed to serialize output: {err}"))
        }
    }
}
