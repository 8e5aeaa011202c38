use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use dc_autoheal::{install_panic_hook, AutoHealService, CaptureLayer, HttpFixGenerator};
use dc_cli::commands::{self, ServicesSnapshot, SnapshotBackend, SOURCE_NAMES};
use dc_cli::AppConfig;
use dc_core::logging::ExtraLayer;
use dc_core::{init_tracing_with, ApiClient, LiveMetric};
use dc_demo::{DemoPlayer, PlayerOptions};
use dc_vertical::{HttpVerticalConfigBackend, VerticalConfigBackend};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

fn cli() -> Command {
    Command::new("datacendia")
        .version(dc_cli::VERSION)
        .about("Datacendia client services: vertical toggles, demo mode and auto-heal")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Configuration file (default: ./datacendia.toml if present)"),
        )
        .subcommand(
            Command::new("demo")
                .about("List or play guided demos")
                .subcommand_required(true)
                .subcommand(Command::new("list").about("List available demos"))
                .subcommand(
                    Command::new("run")
                        .about("Play a demo in the terminal")
                        .arg(Arg::new("id").required(true).help("Demo id"))
                        .arg(
                            Arg::new("auto-advance")
                                .long("auto-advance")
                                .action(ArgAction::SetTrue)
                                .help("Do not wait for Enter on click-to-continue steps"),
                        )
                        .arg(
                            Arg::new("speed")
                                .long("speed")
                                .value_parser(commands::parse_speed)
                                .help("Playback speed multiplier (overrides [demo] speed)"),
                        ),
                ),
        )
        .subcommand(
            Command::new("services")
                .about("Show the enabled service set")
                .arg(
                    Arg::new("snapshot")
                        .long("snapshot")
                        .value_parser(value_parser!(PathBuf))
                        .required_unless_present("remote")
                        .help("JSON file with {catalog, verticals, config}"),
                )
                .arg(
                    Arg::new("remote")
                        .long("remote")
                        .action(ArgAction::SetTrue)
                        .conflicts_with("snapshot")
                        .help("Load from the configured backend"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("classify")
                .about("Classify an error message")
                .arg(Arg::new("message").required(true).help("Error message text"))
                .arg(
                    Arg::new("source")
                        .long("source")
                        .default_value("manual")
                        .value_parser(SOURCE_NAMES)
                        .help("Where the error was captured"),
                ),
        )
        .subcommand(
            Command::new("parse-fix")
                .about("Parse a saved model response into a fix")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("File holding the raw response"),
                ),
        )
        .subcommand(
            Command::new("ticks")
                .about("Print a deterministic live-metric walk")
                .arg(Arg::new("key").long("key").required(true).help("Metric seed key"))
                .arg(
                    Arg::new("count")
                        .long("count")
                        .default_value("10")
                        .value_parser(value_parser!(usize))
                        .help("Number of ticks"),
                )
                .arg(
                    Arg::new("initial")
                        .long("initial")
                        .default_value("50")
                        .value_parser(commands::parse_finite)
                        .help("Starting value"),
                )
                .arg(
                    Arg::new("min")
                        .long("min")
                        .default_value("0")
                        .value_parser(commands::parse_finite)
                        .help("Lower bound"),
                )
                .arg(
                    Arg::new("max")
                        .long("max")
                        .default_value("100")
                        .value_parser(commands::parse_finite)
                        .help("Upper bound"),
                ),
        )
        .subcommand(Command::new("config").about("Print the effective configuration"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();

    let config = AppConfig::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))?
        .with_env_overrides();
    let api = ApiClient::new(config.client.clone())?;

    let auto_heal = Arc::new(AutoHealService::new(
        config.auto_heal.clone(),
        Arc::new(HttpFixGenerator::new(api.clone())),
    ));
    install_panic_hook(Arc::clone(&auto_heal));
    let capture: ExtraLayer = Box::new(CaptureLayer::new(Arc::clone(&auto_heal)));
    init_tracing_with(&config.logging, Some(capture))?;

    match matches.subcommand() {
        Some(("demo", args)) => demo(args, &config, &auto_heal).await,
        Some(("services", args)) => services(args, &config, api).await,
        Some(("classify", args)) => {
            let message = args.get_one::<String>("message").map_or("", String::as_str);
            let source = args
                .get_one::<String>("source")
                .and_then(|s| commands::parse_source(s))
                .unwrap_or(dc_autoheal::ErrorSource::Manual);
            let c = commands::classify_message(message, source);

            println!("Severity: {}", c.severity);
            println!("Agent: {}", c.agent);
            println!("Captured from logs: {}", if c.console_capture { "yes" } else { "no" });
            Ok(())
        }
        Some(("parse-fix", args)) => {
            let path = args
                .get_one::<PathBuf>("file")
                .context("missing response file")?;
            let draft = commands::parse_fix_file(path)?;
            println!("{}", serde_json::to_string_pretty(&draft)?);
            Ok(())
        }
        Some(("ticks", args)) => {
            let key = args.get_one::<String>("key").context("missing --key")?;
            let count = args.get_one::<usize>("count").copied().unwrap_or(10);
            let initial = args.get_one::<f64>("initial").copied().unwrap_or(50.0);
            let min = args.get_one::<f64>("min").copied().unwrap_or(0.0);
            let max = args.get_one::<f64>("max").copied().unwrap_or(100.0);

            let metric = LiveMetric::new(key.as_str(), initial, min, max);
            for (tick, value) in commands::tick_series(&metric, count) {
                println!("{tick:>5}  {value:.2}");
            }
            Ok(())
        }
        Some(("config", _)) => {
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
        _ => Ok(()),
    }
}

async fn demo(args: &ArgMatches, config: &AppConfig, auto_heal: &Arc<AutoHealService>) -> anyhow::Result<()> {
    let catalog = commands::load_catalog(&config.demo)?;
    let completions = commands::completion_store(&config.demo)?;

    match args.subcommand() {
        Some(("list", _)) => {
            for demo in commands::demo_summaries(&catalog, completions.as_ref()) {
                let done = if demo.completed { " (completed)" } else { "" };
                println!(
                    "{:<26} {:<32} {:>2} steps  {:>5.0}s{done}",
                    demo.id, demo.name, demo.steps, demo.total_secs
                );
            }
            Ok(())
        }
        Some(("run", run)) => {
            let id = run.get_one::<String>("id").context("missing demo id")?;
            let options = run
                .get_one::<f64>("speed")
                .map_or_else(|| config.player_options(), |&speed| PlayerOptions { speed });

            let processor = auto_heal.spawn_processor(Duration::from_secs(10));
            let player = DemoPlayer::with_options(Arc::new(catalog), completions, options);
            let input = tokio::io::BufReader::new(tokio::io::stdin());
            let mut out = std::io::stdout();
            let result =
                commands::run_demo(&player, id, run.get_flag("auto-advance"), input, &mut out).await;
            processor.abort();
            result
        }
        _ => Ok(()),
    }
}

async fn services(args: &ArgMatches, config: &AppConfig, api: ApiClient) -> anyhow::Result<()> {
    let backend: Arc<dyn VerticalConfigBackend> = if args.get_flag("remote") {
        Arc::new(HttpVerticalConfigBackend::new(api))
    } else {
        let path = args
            .get_one::<PathBuf>("snapshot")
            .context("either --snapshot or --remote is required")?;
        Arc::new(SnapshotBackend::new(ServicesSnapshot::load(path)?))
    };

    let report = commands::inspect_services(backend, &config.vertical).await?;
    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.render());
    }
    Ok(())
}
