use clap::{Parser, Subcommand};
use daemonize::Daemonize;
use dailywall::config::{Config, DownloadPeriod, RefreshPeriod, ScheduleConfig};
use dailywall::setter::SetterKind;
use dailywall::signals::{Action, Signal};
use dailywall::{client, daemon};
use dailywall::{DEFAULT_MARKET, FEED_HOST, LOG_FILE_NAME, WALLPAPERS_DIR_NAME};
use log::{error, info};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::process::ExitCode;

/// Daemon which downloads the wallpaper of the day and rotates the desktop background
///
/// * changing wallpapers every refresh period
/// * downloading the wallpaper of the day every download period
/// * listens to client events which can be triggered by the user
#[derive(Parser, Debug)]
struct StartArgs {
    /// Directory of the wallpapers
    #[arg(short = 'd', long, env = "DAILYWALL_DIR", default_value = WALLPAPERS_DIR_NAME)]
    wallpapers_directory: PathBuf,

    /// Interval between changing wallpapers
    #[arg(long, value_enum, env = "DAILYWALL_REFRESH", default_value_t = RefreshPeriod::default())]
    refresh: RefreshPeriod,

    /// Interval between downloading the wallpaper of the day
    #[arg(long, value_enum, env = "DAILYWALL_DOWNLOAD", default_value_t = DownloadPeriod::default())]
    download: DownloadPeriod,

    /// Tool used to apply wallpapers
    #[arg(long, value_enum, env = "DAILYWALL_SETTER", default_value_t = SetterKind::default())]
    setter: SetterKind,

    /// Market the wallpaper of the day is picked for
    #[arg(long, env = "DAILYWALL_MARKET", default_value = DEFAULT_MARKET)]
    market: String,

    /// Host of the image of the day feed
    #[arg(long, env = "DAILYWALL_FEED_HOST", default_value = FEED_HOST)]
    feed_host: String,

    /// Detach from the terminal and keep running in the background
    #[arg(long)]
    detach: bool,

    /// File the detached daemon appends its log to
    #[arg(long, env = "DAILYWALL_LOG_FILE", default_value_os_t = LOG_FILE_NAME.clone())]
    log_file: PathBuf,
}

/// Wallpaper of the day downloader and desktop background rotator.
///
/// Allows to spawn a daemon which is responsible for
///
/// * changing wallpapers
/// * downloading the wallpaper of the day
/// * listens to client events which can be triggered by the user
#[derive(Parser)]
#[command(author, version, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    Start(StartArgs),
    Do(DoArgs),
    Restart(RestartArgs),
}

/// Client might interact with the daemon through that subcommand
///
/// It triggers an operation right away, timers are left untouched
#[derive(Parser, Debug)]
struct DoArgs {
    #[arg(value_enum)]
    action: Action,
}

/// Rearms the daemon's timers, optionally with new periods
#[derive(Parser, Debug)]
struct RestartArgs {
    /// New interval between changing wallpapers
    #[arg(long, value_enum)]
    refresh: Option<RefreshPeriod>,

    /// New interval between downloading the wallpaper of the day
    #[arg(long, value_enum)]
    download: Option<DownloadPeriod>,
}

fn run_daemon(args: StartArgs) -> std::io::Result<()> {
    let config = Config::new(&args.wallpapers_directory, &args.feed_host, &args.market, args.setter)?;
    let schedule = ScheduleConfig::new(args.refresh, args.download);

    if args.detach {
        let log = OpenOptions::new().create(true).append(true).open(&args.log_file)?;
        Daemonize::new()
            .working_directory(std::env::current_dir()?)
            .stdout(log.try_clone()?)
            .stderr(log)
            .start()
            .map_err(|why| std::io::Error::new(std::io::ErrorKind::Other, why.to_string()))?;
    }

    // The runtime is built after forking, its threads would not survive it
    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    runtime.block_on(daemon::init(config, schedule))?;
    info!("Daemon shut down");
    Ok(())
}

fn main() -> ExitCode {
    // Setup logger
    let env = env_logger::Env::default().default_filter_or("info");
    env_logger::init_from_env(env);

    let cli = Cli::parse();

    let result = match cli.cmd {
        Cmd::Start(args) => run_daemon(args),
        Cmd::Do(args) => client::invoke(args.action.into()),
        Cmd::Restart(args) => client::invoke(Signal::Restart {
            refresh: args.refresh,
            download: args.download,
        }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(why) => {
            error!("{why}");
            ExitCode::FAILURE
        }
    }
}
