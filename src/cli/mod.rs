//! Command-line interface for autobuild
//!
//! Flags double as environment variables (`STEP`, `SKIP`, `NO_BUILD`, ...)
//! so existing wrapper scripts keep working. A `.autobuild.env` file in the
//! working directory is loaded before parsing and fills in unset variables.
//!
//! - no subcommand: extract the pipeline steps and run them
//! - `shell`: interactive login shell in the build container
//! - `config`: print the resolved configuration
//! - `completions`: generate shell completions

pub mod completions;

use anyhow::{Context, Result};
use autobuild::executor::{EngineOptions, ExecutionEngine, ListFormat, RunOutcome, Selection};
use autobuild::executor::{CommandRunner, ShellConfig, ShellRunner};
use autobuild::infrastructure::{
    ContainerInvocationBuilder, Environment, HostIdentity, RunConfig, init_logging, level_for,
    load_override_file, prepare_image,
};
use autobuild::pipeline::PipelineExtractor;
use clap::builder::FalseyValueParser;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

/// Command run by `autobuild shell`
const LOGIN_SHELL: &str = "bash --login";

/// CLI arguments for autobuild
#[derive(Parser, Debug)]
#[command(name = "autobuild")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file, relative to the working directory
    #[arg(short, long, global = true, default_value = RunConfig::DEFAULT_FILE)]
    config: PathBuf,

    /// Verbosity; enables debug logs and is forwarded into the container
    ///
    /// A value must be attached with `=`, e.g. `-v=2`.
    #[arg(
        short,
        long,
        global = true,
        env = "VERBOSE",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "1"
    )]
    verbose: Option<String>,

    #[command(flatten)]
    run: RunArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

/// Options for running the pipeline; subcommands ignore them
#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Run only steps whose name contains this text (case-insensitive)
    #[arg(long, env = "STEP")]
    step: Option<String>,

    /// Run only steps of these stages; ignored when --step is given
    #[arg(long, env = "STAGES", value_delimiter = ',')]
    stages: Vec<String>,

    /// Skip steps whose name contains any of these
    #[arg(long, env = "SKIP", value_delimiter = ',')]
    skip: Vec<String>,

    /// Stop successfully after the first executed step whose name contains this
    #[arg(long, env = "UNTIL")]
    until: Option<String>,

    /// List the steps without building the image or running anything
    #[arg(long, env = "NO_BUILD", value_parser = FalseyValueParser::new())]
    dry_run: bool,

    /// Listing format for --dry-run
    #[arg(long, value_enum, default_value_t = FormatArg::Text)]
    format: FormatArg,

    /// Run container steps directly on the host
    #[arg(long, env = "NO_DOCKER", value_parser = FalseyValueParser::new())]
    no_docker: bool,

    /// Wait for Enter before each step
    #[arg(long, env = "PAUSE", value_parser = FalseyValueParser::new())]
    pause: bool,

    /// Keep going when steps whose name contains any of these fail
    #[arg(long, env = "IGNORE_FAILURES", value_delimiter = ',')]
    ignore_failures: Vec<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open an interactive login shell in the build container
    Shell,

    /// Print the resolved configuration
    Config,

    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    #[default]
    Text,
    Json,
}

impl RunArgs {
    fn engine_options(&self) -> EngineOptions {
        let format = match self.format {
            FormatArg::Text => ListFormat::Text,
            FormatArg::Json => ListFormat::Json,
        };

        EngineOptions::new()
            .with_selection(Selection::from_parts(
                self.step.clone(),
                self.stages.clone(),
            ))
            .with_skip(self.skip.iter().cloned())
            .with_until(self.until.clone())
            .with_dry_run(self.dry_run, format)
            .with_no_container(self.no_docker)
            .with_pause(self.pause)
            .with_ignore_failures(self.ignore_failures.iter().cloned())
    }
}

/// Build the CLI command for completion generation
pub fn build_cli() -> clap::Command {
    Args::command()
}

/// Parse and execute CLI arguments
pub fn run() -> Result<()> {
    let workdir = std::env::current_dir().context("Cannot determine the working directory")?;
    let override_file = load_override_file(&workdir)?;

    let args = Args::parse();
    init_logging(level_for(args.verbose.as_deref()));

    if let Some(path) = override_file {
        tracing::debug!(file = %path.display(), "Loaded environment overrides");
    }

    match &args.command {
        None => run_pipeline(&args, &workdir),
        Some(Command::Shell) => open_shell(&args, &workdir),
        Some(Command::Config) => {
            let config = load_config(&args, &workdir)?;
            print!("{}", config.dump());
            Ok(())
        }
        Some(Command::Completions { shell, output }) => {
            completions::write_completions(*shell, output.as_deref())
        }
    }
}

fn load_config(args: &Args, workdir: &Path) -> Result<RunConfig> {
    let path = workdir.join(&args.config);
    RunConfig::load(&path).context("Cannot load the autobuild configuration")
}

fn run_pipeline(args: &Args, workdir: &Path) -> Result<()> {
    let config = load_config(args, workdir)?;
    let jenkins_file = workdir.join(&config.jenkins_file);
    let steps = PipelineExtractor::new()
        .extract_file(&jenkins_file)
        .with_context(|| format!("Cannot extract steps from {}", jenkins_file.display()))?;

    let options = args.run.engine_options();
    let runner = ShellRunner::new(ShellConfig::default().with_cwd(workdir));

    let builder = if options.dry_run || options.no_container {
        None
    } else {
        Some(container_builder(
            &runner,
            config,
            args.verbose.clone(),
            workdir,
        )?)
    };

    let mut engine = ExecutionEngine::new(runner, builder, options);
    match engine.run(&steps)? {
        RunOutcome::Completed { executed, skipped } => {
            tracing::info!(executed, skipped, "All steps finished");
        }
        RunOutcome::Halted { step, .. } => {
            tracing::info!(step = %step, "Stopped after step");
        }
        RunOutcome::Listed { steps } => {
            tracing::debug!(steps, "Listed steps");
        }
    }
    Ok(())
}

fn open_shell(args: &Args, workdir: &Path) -> Result<()> {
    let config = load_config(args, workdir)?;
    let runner = ShellRunner::new(ShellConfig::default().with_cwd(workdir));
    let builder = container_builder(&runner, config, args.verbose.clone(), workdir)?;

    let invocation = builder
        .build(LOGIN_SHELL, true)
        .context("Cannot prepare the interactive shell")?;
    runner.run(&invocation.command_line(), None, true)?;
    Ok(())
}

/// Resolves the host identity, prepares the image and creates the builder
fn container_builder(
    runner: &ShellRunner,
    config: RunConfig,
    verbose: Option<String>,
    workdir: &Path,
) -> Result<ContainerInvocationBuilder> {
    let environment = Environment::from_process();
    let identity = HostIdentity::detect(runner, &environment)
        .context("Cannot resolve the host user for the container")?;

    prepare_image(runner, &config).context("Cannot prepare the build image")?;

    let builder = ContainerInvocationBuilder::new(config, identity, environment, workdir)?
        .with_verbosity(verbose);
    Ok(builder)
}
