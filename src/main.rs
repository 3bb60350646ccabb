use clap::{Args, Parser, Subcommand};
use edgelog::{AdapterRequest, DiscoveryEngine, Inputs, SourceType};
use edgelog_core::config::Config;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "edgelog", about = "Edge event adapters: normalize web, load-balancer, firewall, DNS, syslog and application logs")]
struct Cli {
    /// Log discovery and parsing decisions to stderr.
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// nginx / Apache access logs.
    Web(AdapterArgs),
    /// Load-balancer access logs.
    Alb(AdapterArgs),
    /// Firewall and flow logs (JSON, key=value, CEF, CSV).
    Firewall(AdapterArgs),
    /// Resolver query logs (BIND, dnsmasq / Pi-hole, unbound).
    Dns(AdapterArgs),
    /// Syslog files: flows, DNS queries and logins found in messages.
    Syslog(AdapterArgs),
    /// Application logs: logins and configuration changes.
    App(AdapterArgs),
    /// Concatenate JSONL outputs into one file.
    Merge {
        #[arg(long)]
        out: PathBuf,
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
}

#[derive(Args)]
struct AdapterArgs {
    /// Asset identifier stamped on every event.
    #[arg(long)]
    asset: String,

    /// JSONL output path.
    #[arg(long)]
    out: PathBuf,

    /// Input file (repeatable). Without any, inputs are discovered.
    #[arg(long = "input")]
    inputs: Vec<PathBuf>,

    /// Search root for load-balancer and firewall discovery.
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Journal lookback for web discovery, e.g. "2 hours ago".
    #[arg(long)]
    since: Option<String>,

    /// Extra config file layered over the defaults.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .init();
}

async fn run_adapter(source_type: SourceType, args: AdapterArgs) -> anyhow::Result<()> {
    let config = Config::load(args.config.as_deref())?;
    let mut engine = DiscoveryEngine::system(config).with_root(args.root);
    if let Some(since) = args.since {
        engine = engine.with_journal_since(since);
    }

    let inputs = if args.inputs.is_empty() {
        Inputs::Discover
    } else {
        Inputs::Explicit(args.inputs)
    };
    let summary = edgelog::run(
        AdapterRequest {
            source_type,
            inputs,
            asset: args.asset,
            output: args.out.clone(),
        },
        &engine,
    )
    .await?;

    eprintln!(
        "{}: {} events ({} raw-only) from {} inputs -> {}",
        source_type,
        summary.events,
        summary.raw_only,
        summary.inputs_read,
        args.out.display()
    );
    if let Some(report) = summary.report {
        eprintln!("discovery report -> {}", report.display());
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    match cli.command {
        Command::Web(args) => runtime.block_on(run_adapter(SourceType::Web, args)),
        Command::Alb(args) => runtime.block_on(run_adapter(SourceType::Alb, args)),
        Command::Firewall(args) => runtime.block_on(run_adapter(SourceType::Firewall, args)),
        Command::Dns(args) => runtime.block_on(run_adapter(SourceType::Dns, args)),
        Command::Syslog(args) => runtime.block_on(run_adapter(SourceType::Syslog, args)),
        Command::App(args) => runtime.block_on(run_adapter(SourceType::App, args)),
        Command::Merge { out, inputs } => {
            let n = edgelog_core::export::merge_jsonl(&out, &inputs)?;
            eprintln!("merged {n} events -> {}", out.display());
            Ok(())
        }
    }
}
