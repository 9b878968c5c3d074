//! `mrs-sdkgen` command line.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mrs_sdkgen::{
    GenerateOptions, SdkGenConfig, SdkLanguage, generate_from_file, get_base_classes,
    write_output,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mrs-sdkgen")]
#[command(version)]
#[command(about = "Generate client SDKs for MySQL REST Service endpoints")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Project root holding .mrs-sdkgen/config.toml
    #[arg(long, value_name = "DIR", global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the SDK of a service graph (JSON, or YAML by extension)
    Generate {
        /// Service graph file
        service: PathBuf,

        /// Target language
        #[arg(short, long)]
        language: Option<String>,

        /// Output file (stdout when omitted)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Emit a single import-free blob for an interactive runtime
        #[arg(long, conflicts_with = "package")]
        runtime: bool,

        /// Emit package sources even if the configuration selects runtime mode
        #[arg(long)]
        package: bool,

        /// Base URL the service is reachable under
        #[arg(long, value_name = "URL")]
        service_url: Option<String>,

        /// Directory overriding the builtin templates
        #[arg(long, value_name = "DIR")]
        templates: Option<PathBuf>,

        /// Seed for generated fallback identifiers
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Print the base classes the generated SDK builds on
    BaseClasses {
        /// Target language
        #[arg(short, long)]
        language: Option<String>,

        /// Output file (stdout when omitted)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Strip package-only regions and exports
        #[arg(long, conflicts_with = "package")]
        runtime: bool,

        /// Keep exports even if the configuration selects runtime mode
        #[arg(long)]
        package: bool,
    },

    /// List supported languages
    Languages,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env("MRS_SDKGEN_LOG")
        .unwrap_or_else(|_| EnvFilter::new(format!("mrs_sdkgen={}", default)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// `--runtime` and `--package` win over the configured mode.
fn runtime_mode(runtime: bool, package: bool, configured: Option<bool>) -> bool {
    if runtime {
        true
    } else if package {
        false
    } else {
        configured.unwrap_or(false)
    }
}

fn emit(output: Option<&Path>, code: &str) -> Result<()> {
    match output {
        Some(path) => {
            write_output(path, code)?;
            tracing::info!(path = %path.display(), "wrote output");
        }
        None => print!("{}", code),
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir().context("failed to determine current directory")?,
    };
    let config = SdkGenConfig::load(&root).context("failed to load configuration")?;
    let default_language = config
        .generate
        .language
        .clone()
        .unwrap_or_else(|| SdkLanguage::TypeScript.name().to_string());

    match cli.command {
        Commands::Generate {
            service,
            language,
            output,
            runtime,
            package,
            service_url,
            templates,
            seed,
        } => {
            let defaults = config.generate_options();
            let options = GenerateOptions {
                prepare_for_runtime: runtime_mode(
                    runtime,
                    package,
                    config.generate.prepare_for_runtime,
                ),
                service_url: service_url.or(defaults.service_url),
                identifier_seed: seed.or(defaults.identifier_seed),
                template_dir: templates.or(defaults.template_dir),
            };
            let language = language.unwrap_or(default_language);
            let code = generate_from_file(&service, &language, &options)
                .with_context(|| format!("failed to generate SDK for {}", service.display()))?;
            emit(output.as_deref(), &code)
        }
        Commands::BaseClasses {
            language,
            output,
            runtime,
            package,
        } => {
            let language = language.unwrap_or(default_language);
            let runtime = runtime_mode(runtime, package, config.generate.prepare_for_runtime);
            let code = get_base_classes(&language, runtime, config.generate.template_dir.as_deref())
                .with_context(|| format!("failed to load {} base classes", language))?;
            emit(output.as_deref(), &code)
        }
        Commands::Languages => {
            for language in SdkLanguage::ALL {
                println!("{:<12} .{}", language.name(), language.extension());
            }
            Ok(())
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    if let Err(err) = run(cli) {
        eprintln!("error: {:#}", err);
        std::process::exit(1);
    }
}
