use adsctl::{
    app::{Application, Overrides},
    config::{history_path, load_config, Bootstrap, ConfigFile},
    fetch::SearchMode,
    prompt::{interrupt_flag, Prompt},
    render::{write_outcome, OutputFormat},
};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::{
    io,
    path::PathBuf,
    process::ExitCode,
    sync::atomic::{AtomicBool, Ordering},
};
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "adsctl",
    author,
    version,
    about = "Run GAQL queries against the Google Ads API and print the results as tables"
)]
struct Cli {
    /// Config file (default: ~/.adsctl/config.yaml)
    #[arg(short = 'f', long, global = true)]
    config: Option<PathBuf>,
    /// Customer id to query, overriding the account's
    #[arg(short, long, global = true)]
    customer_id: Option<String>,
    /// Account from the config file to use
    #[arg(short, long, global = true)]
    account: Option<String>,
    /// Output format
    #[arg(short = 'o', long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    format: OutputFormat,
    /// Drop this field from every table (repeatable)
    #[arg(long = "ignore-field", value_name = "FIELD", global = true)]
    ignore_fields: Vec<String>,
    /// Keep the row that creates a table as a data row too
    #[arg(long, global = true)]
    include_first_row: bool,
    /// Use paged `search` instead of `searchStream`
    #[arg(long, global = true)]
    paged: bool,
    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run one query and print its tables
    Query {
        #[arg(required = true, trailing_var_arg = true, value_name = "GAQL")]
        query: Vec<String>,
    },
    /// Interactive query prompt (default)
    Prompt,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Show the config in use, secrets masked
    Config,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    let command = cli.command.unwrap_or(Command::Prompt);
    if let Command::Init { force } = command {
        return init(cli.config, force);
    }

    let file = match load_config(cli.config.as_deref())? {
        Bootstrap::Loaded(file) => file,
        Bootstrap::Created(path) => {
            println!("No config file found, creating one with default settings now...");
            println!("Default config file created at: {}", path.display());
            println!("Edit that file to include your Google Ads credentials.");
            return Ok(ExitCode::SUCCESS);
        }
    };

    if let Command::Config = command {
        return show_config(&file, cli.account.as_deref());
    }

    let overrides = Overrides {
        customer_id: cli.customer_id,
        account: cli.account,
        ignore_fields: cli.ignore_fields,
        include_first_row: cli.include_first_row,
        mode: if cli.paged {
            SearchMode::Paged
        } else {
            SearchMode::Stream
        },
    };
    let app = Application::new(file.model(), overrides)?;
    let interrupt = interrupt_flag()?;

    match command {
        Command::Query { query } => query_once(&app, &query.join(" "), cli.format, &interrupt),
        _ => {
            info!(customer_id = app.customer_id(), "starting prompt");
            Prompt::new(&app, cli.format, interrupt)
                .with_history(history_path())
                .run()?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn query_once(
    app: &Application,
    query: &str,
    format: OutputFormat,
    interrupt: &AtomicBool,
) -> Result<ExitCode> {
    let done = match app.query_until(query, interrupt) {
        Ok(done) => done,
        Err(err) => {
            eprintln!("{}", err.report());
            return Ok(ExitCode::FAILURE);
        }
    };
    write_outcome(&done.outcome, format, &mut io::stdout(), &mut io::stderr())?;
    if done.interrupted || interrupt.load(Ordering::SeqCst) {
        debug!("query interrupted");
        return Ok(ExitCode::from(130));
    }
    Ok(ExitCode::SUCCESS)
}

fn init(explicit: Option<PathBuf>, force: bool) -> Result<ExitCode> {
    let path = explicit.unwrap_or_else(ConfigFile::default_path);
    if path.exists() && !force {
        bail!(
            "config file `{}` already exists; pass --force to overwrite it",
            path.display()
        );
    }
    ConfigFile::new(&path)
        .restore()
        .with_context(|| format!("Unable to create config file located at `{}`", path.display()))?;
    println!("Default config file created at: {}", path.display());
    println!("Edit that file to include your Google Ads credentials.");
    Ok(ExitCode::SUCCESS)
}

fn show_config(file: &ConfigFile, account: Option<&str>) -> Result<ExitCode> {
    let model = file.model();
    let current = account.unwrap_or(model.current_account.as_str());
    model.account_named(current)?;
    println!("config file: {}", file.path().display());
    println!("current account: {}", current);
    println!();
    print!(
        "{}",
        serde_yaml::to_string(&model.masked()).context("serializing config")?
    );
    Ok(ExitCode::SUCCESS)
}
