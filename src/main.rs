use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;

use chime::app_state::AppContext;
use chime::commands;
use chime::logging;
use chime::repl::readline;
use chime_core::context::{SchedulerConfig, SchedulerConfigExt};

#[derive(Parser)]
#[command(version, about = "Interactive timer scheduler shell")]
struct Args {
    /// Read settings from this TOML file instead of the saved configuration
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => SchedulerConfig::load_from(path).map_err(|e| e.to_string())?,
        None => SchedulerConfig::load(),
    };

    let _log_guard = logging::init(&config.logging);
    let ctx = AppContext::new(config).map_err(|e| e.to_string())?;

    loop {
        let line = readline()?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match respond(line, &ctx).await {
            Ok(quit) => {
                if quit {
                    break;
                }
            }
            Err(err) => {
                writeln!(std::io::stdout(), "{}", err.trim_end()).map_err(|e| e.to_string())?;
                std::io::stdout().flush().map_err(|e| e.to_string())?;
            }
        }
    }

    Ok(())
}

#[derive(Parser)]
#[command(version, about = "chime")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a message once after a delay
    Once {
        #[arg(short, long)]
        secs: f64,
        #[arg(short, long, default_value = "")]
        message: String,
    },
    /// Print a message on an interval
    Every {
        #[arg(short, long)]
        secs: f64,
        /// Number of fires (0 repeats until stopped)
        #[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
        times: i64,
        #[arg(short, long, default_value = "")]
        message: String,
    },
    Stop {
        #[arg(short, long)]
        id: u64,
    },
    List,
    Tick,
    Pause,
    Resume,
    Stats,
    Config,
    SaveConfig,
    Exit,
}

async fn respond(line: &str, ctx: &AppContext) -> Result<bool, String> {
    let mut args = shlex::split(line).ok_or("error: Invalid quoting")?;
    args.insert(0, "chime".to_string());
    let cli = Cli::try_parse_from(args).map_err(|e| e.to_string())?;

    match cli.command {
        Some(Commands::Once { secs, message }) => commands::schedule_once(ctx, secs, message)?,
        Some(Commands::Every {
            secs,
            times,
            message,
        }) => commands::schedule_every(ctx, secs, times, message)?,
        Some(Commands::Stop { id }) => commands::stop(ctx, id)?,
        Some(Commands::List) => commands::list_timers(ctx),
        Some(Commands::Tick) => commands::tick(ctx),
        Some(Commands::Pause) => commands::pause(ctx).await,
        Some(Commands::Resume) => commands::resume(ctx).await,
        Some(Commands::Stats) => commands::show_stats(ctx).await,
        Some(Commands::Config) => commands::show_settings(ctx).await,
        Some(Commands::SaveConfig) => commands::save_settings(ctx).await?,
        Some(Commands::Exit) => {
            commands::exit(ctx).await?;
            return Ok(true);
        }
        None => {}
    }
    Ok(false)
}
