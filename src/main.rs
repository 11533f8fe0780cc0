use anyhow::Result;
use clap::Parser;
use reccam::{EventBus, EventFilter, EventReceiver, ReccamConfig, ReccamOrchestrator};
use std::io::IsTerminal;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;

#[derive(Parser, Debug)]
#[command(name = "reccam")]
#[command(about = "Video capture screen with a recording timer, driven from the terminal")]
#[command(version)]
#[command(long_about = "Runs a video capture screen against a simulated camera. \
The capture button starts and stops recordings while an elapsed-time readout ticks once \
per second; saved recordings land in the configured output directory.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "reccam.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit without starting")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,

    /// Directory for daily rolling log files
    #[arg(long, value_name = "DIR", help = "Also write logs to a daily rolling file in DIR")]
    log_dir: Option<String>,

    /// Print events as JSON lines
    #[arg(long, help = "Print screen events as JSON lines instead of text")]
    json_events: bool,

    /// Leave timer ticks out of the printed events
    #[arg(long, help = "Do not print elapsed-time timer updates")]
    hide_timer: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        print_default_config()?;
        return Ok(());
    }

    let mut config = match ReccamConfig::load_from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if args.debug {
        config.system.debug_events = true;
    }

    let log_dir = args.log_dir.clone().or_else(|| config.system.log_dir.clone());
    let _guard = init_logging(&args, log_dir.as_deref())?;

    info!("Starting reccam v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    if args.validate_config {
        match config.validate() {
            Ok(()) => {
                info!("Configuration validation successful");
                println!("✓ Configuration is valid");
                return Ok(());
            }
            Err(e) => {
                error!("Configuration validation failed: {}", e);
                eprintln!("✗ Configuration validation failed: {}", e);
                std::process::exit(1);
            }
        }
    }

    let mut orchestrator = ReccamOrchestrator::new(config).await.map_err(|e| {
        error!("Failed to create orchestrator: {}", e);
        e
    })?;

    // Raw mode needs a real terminal
    let interactive = std::io::stdin().is_terminal();
    orchestrator.set_keyboard_enabled(interactive);

    let filter = if args.hide_timer {
        EventFilter::Excluding(vec!["timer_updated"])
    } else {
        EventFilter::All
    };
    spawn_event_printer(orchestrator.event_bus(), filter, args.json_events, interactive);

    orchestrator.initialize().await.map_err(|e| {
        error!("Failed to initialize system: {}", e);
        e
    })?;

    orchestrator.start().await.map_err(|e| {
        error!("Failed to start system: {}", e);
        e
    })?;

    let exit_code = orchestrator.run().await.map_err(|e| {
        error!("System error during execution: {}", e);
        e
    })?;

    info!("reccam exited with code: {}", exit_code);
    std::process::exit(exit_code);
}

fn init_logging(args: &Args, log_dir: Option<&str>) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("reccam={}", log_level)));

    let fmt_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .boxed(),
        Some("pretty") | None => fmt::layer()
            .pretty()
            .with_target(true)
            .with_thread_ids(args.debug)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer()
                .with_target(true)
                .with_thread_ids(args.debug)
                .with_file(args.debug)
                .with_line_number(args.debug)
                .boxed()
        }
    };

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "reccam.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(file_layer)
        .with(env_filter)
        .init();

    Ok(guard)
}

/// Echo screen events to stdout
fn spawn_event_printer(event_bus: EventBus, filter: EventFilter, json: bool, raw_mode: bool) {
    let mut events = EventReceiver::new(event_bus.subscribe(), filter, "printer".to_string());
    // Raw mode does not translate "\n" into a carriage return
    let line_end = if raw_mode { "\r\n" } else { "\n" };

    tokio::spawn(async move {
        // Lagging is logged by the receiver; an error means the bus closed
        while let Ok(event) = events.recv().await {
            let line = if json {
                match serde_json::to_string(&event) {
                    Ok(line) => line,
                    Err(e) => {
                        warn!("Failed to serialize event: {}", e);
                        continue;
                    }
                }
            } else {
                event.description()
            };
            print!("{}{}", line, line_end);
        }
    });
}

/// Print default configuration in TOML format
fn print_default_config() -> Result<()> {
    println!("# reccam configuration file");
    println!("# Every option with its default value; RECCAM_<SECTION>__<KEY> overrides any of them");
    println!();
    println!("{}", ReccamConfig::default().to_toml()?);
    Ok(())
}
