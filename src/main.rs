use anyhow::{Context, Result};
use batchboard::commands;
use batchboard::commands::enrollment::ExportOptions;
use batchboard::config;
use batchboard::export::ExportFormat;
use batchboard::view::{ListQuery, SortKey, StatusFilter};
use batchboard::window::parse_date;
use batchboard::OutputFormat;
use chrono::{DateTime, Utc};
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bboard")]
#[command(about = "Enrollment window calculator and batch enrollment admin")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(
        long,
        global = true,
        help = "Evaluate statuses at this instant instead of now (ISO 8601)"
    )]
    now: Option<String>,

    #[arg(short, long, global = true, action = ArgAction::Count, help = "More log output (-v, -vv)")]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a free-text duration such as "3 months"
    Parse {
        text: String,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Compute the end date of an enrollment window
    EndDate {
        #[arg(long, help = "Start date (ISO 8601)")]
        start: String,
        #[arg(long, help = "Duration text, e.g. \"6 weeks\"")]
        duration: String,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Classify an enrollment window as active, upcoming or completed
    Status {
        #[arg(long, help = "Start date (ISO 8601)")]
        start: Option<String>,
        #[arg(long, help = "Duration text, e.g. \"6 weeks\"")]
        duration: Option<String>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// List batch enrollments
    List {
        #[arg(long, help = "Search student, email, course or batch")]
        search: Option<String>,
        #[arg(long, value_enum, help = "Filter by computed status")]
        status: Option<StatusFilter>,
        #[arg(long, value_enum, default_value_t = SortKey::Start)]
        sort: SortKey,
        #[arg(long, help = "Sort descending")]
        desc: bool,
        #[arg(long, default_value = "1")]
        page: usize,
        #[arg(long, help = "Rows per page (defaults to display.page_size)")]
        page_size: Option<usize>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Show one enrollment with its computed window
    Show {
        id: String,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Count enrollments per status
    Stats {
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Export enrollments to CSV or JSON
    Export {
        #[arg(long, help = "Output file path")]
        output: Option<std::path::PathBuf>,
        #[arg(long, value_enum, help = "csv or json (default: from extension, else csv)")]
        format: Option<ExportFormat>,
        #[arg(long, value_enum)]
        status: Option<StatusFilter>,
        #[arg(long)]
        search: Option<String>,
    },

    /// Delete an enrollment
    Delete {
        id: String,
        #[arg(long, help = "Preview without deleting")]
        dry_run: bool,
    },

    /// Manage configuration
    Config(ConfigArgs),
}

#[derive(Parser)]
struct ConfigArgs {
    #[command(subcommand)]
    action: ConfigAction,
}

#[derive(Subcommand)]
enum ConfigAction {
    List,
    Set { key: String, value: String },
    Get { key: String },
}

fn init_tracing(verbose: u8, configured: &str) {
    let fallback = match verbose {
        0 => configured,
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = config::config_path()?;

    let loaded = if config_path.exists() {
        config::load()
    } else {
        Ok(config::Config::default())
    };
    let level = loaded
        .as_ref()
        .map(|c| c.log.level.as_str())
        .unwrap_or("warn");
    init_tracing(cli.verbose, level);

    // Setting a key must work even when the current file fails validation
    if let Commands::Config(ConfigArgs {
        action: ConfigAction::Set { key, value },
    }) = &cli.command
    {
        return commands::config::set(&config_path, key, value);
    }

    let config = loaded?;
    if !config_path.exists() {
        tracing::warn!(
            "no config found at {}. Run 'bboard config set api.base_url <URL>'",
            config_path.display()
        );
    }

    // One evaluation instant per invocation
    let now: DateTime<Utc> = match &cli.now {
        Some(s) => parse_date(s).context("Invalid --now")?,
        None => Utc::now(),
    };

    match cli.command {
        Commands::Parse { text, format } => {
            commands::window::parse(&text, format)?;
        }
        Commands::EndDate {
            start,
            duration,
            format,
        } => {
            commands::window::end_date(&start, &duration, &config.display.date_format, format)?;
        }
        Commands::Status {
            start,
            duration,
            format,
        } => {
            commands::window::status(start.as_deref(), duration.as_deref(), now, format)?;
        }
        Commands::List {
            search,
            status,
            sort,
            desc,
            page,
            page_size,
            format,
        } => {
            let query = ListQuery {
                search,
                status,
                sort,
                descending: desc,
                page,
                page_size: page_size.unwrap_or(config.display.page_size),
            };
            commands::enrollment::list(&config, &query, now, format)?;
        }
        Commands::Show { id, format } => {
            commands::enrollment::show(&config, &id, now, format)?;
        }
        Commands::Stats { format } => {
            commands::enrollment::stats(&config, now, format)?;
        }
        Commands::Export {
            output,
            format,
            status,
            search,
        } => {
            let options = ExportOptions {
                output,
                format,
                status,
                search,
            };
            commands::enrollment::export(&config, options, now)?;
        }
        Commands::Delete { id, dry_run } => {
            commands::enrollment::delete(&config, &id, dry_run)?;
        }
        Commands::Config(args) => match args.action {
            ConfigAction::List => commands::config::list(&config)?,
            ConfigAction::Get { key } => commands::config::get(&key, &config)?,
            ConfigAction::Set { key, value } => commands::config::set(&config_path, &key, &value)?,
        },
    }

    Ok(())
}
