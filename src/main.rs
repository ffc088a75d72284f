use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use apiweave::EnhancementType;
use apiweave::cli::commands;
use apiweave::cli::commands::generate::GenerateOptions;

#[derive(Parser)]
#[command(name = "apiweave")]
#[command(
    version,
    about = "Framework-aware API integration templates for your project"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long)]
    verbose: bool,

    #[arg(long, short)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect the frameworks a project uses
    Detect {
        #[arg(help = "Project root (default: current directory)")]
        path: Option<PathBuf>,
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: String,
    },

    /// Suggest templates for environment variable names
    Suggest {
        #[arg(long, short, help = "Variable names (repeatable or comma separated)")]
        env: Vec<String>,
        #[arg(long, help = "Read variable names from a dotenv file")]
        env_file: Option<PathBuf>,
        #[arg(long, short, help = "Project to scan for frameworks and dotenv files")]
        path: Option<PathBuf>,
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: String,
    },

    /// Check a provider/framework/feature combination
    Validate {
        #[arg(long, short, help = "Provider id")]
        provider: String,
        #[arg(long, help = "Framework key")]
        framework: String,
        #[arg(long, short, help = "Template id")]
        template: Option<String>,
        #[arg(long = "feature", value_delimiter = ',', help = "Requested features")]
        features: Vec<String>,
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: String,
    },

    /// Generate integration files for a provider and framework
    Generate {
        #[arg(long, short, help = "Provider id")]
        provider: String,
        #[arg(long, help = "Framework key")]
        framework: String,
        #[arg(long, short, help = "Template id (default: quickest for the pair)")]
        template: Option<String>,
        #[arg(long = "feature", value_delimiter = ',', help = "Requested features")]
        features: Vec<String>,
        #[arg(long, short, help = "Environment variable names to wire in")]
        env: Vec<String>,
        #[arg(
            long,
            help = "Enhancement: documentation, error-handling, security, best-practices"
        )]
        enhance: Option<EnhancementType>,
        #[arg(long, help = "Render without persisting and print file contents")]
        preview: bool,
        #[arg(long, help = "Give up waiting after this many seconds")]
        timeout: Option<u64>,
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: String,
    },

    /// List catalog providers and templates
    Catalog {
        #[arg(long, short, help = "Only show this provider")]
        provider: Option<String>,
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: String,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(
            short = 'f',
            long,
            default_value = "toml",
            help = "Output format: toml, json"
        )]
        format: String,
    },
    /// Show configuration file paths
    Path,
    /// Initialize configuration
    Init {
        #[arg(long, short, help = "Initialize global config")]
        global: bool,
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mApiWeave encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        // Backtrace when RUST_BACKTRACE=1
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Detect { path, format } => {
            let rt = Runtime::new()?;
            rt.block_on(commands::detect::run(path, &format))?;
        }
        Commands::Suggest {
            env,
            env_file,
            path,
            format,
        } => {
            let rt = Runtime::new()?;
            rt.block_on(commands::suggest::run(env, env_file, path, &format))?;
        }
        Commands::Validate {
            provider,
            framework,
            template,
            features,
            format,
        } => {
            commands::validate::run(provider, framework, template, features, &format)?;
        }
        Commands::Generate {
            provider,
            framework,
            template,
            features,
            env,
            enhance,
            preview,
            timeout,
            format,
        } => {
            let rt = Runtime::new()?;
            rt.block_on(commands::generate::run(GenerateOptions {
                provider,
                framework,
                template,
                features,
                env,
                enhancement: enhance,
                preview,
                timeout_secs: timeout,
                format,
            }))?;
        }
        Commands::Catalog { provider, format } => {
            commands::catalog::run(provider, &format)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { format } => commands::config::show(&format)?,
            ConfigAction::Path => commands::config::path()?,
            ConfigAction::Init { global, force } => commands::config::init(global, force)?,
        },
    }

    Ok(())
}
