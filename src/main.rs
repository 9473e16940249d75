use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use swim_suspicion::config::NodeConfig;
use swim_suspicion::membership::service::MembershipService;

/// Runs a single node's suspicion protocol against scripted gossip, with no network.
#[derive(Debug, Parser)]
#[command(name = "suspicion-sim", version)]
struct Args {
    /// JSON config file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address of the local node
    #[arg(long)]
    local: Option<String>,

    /// Suspicion timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Known member as `addr` or `addr@incarnation` (repeatable)
    #[arg(long = "member")]
    members: Vec<String>,

    /// Member to report as suspect at startup (repeatable)
    #[arg(long = "suspect")]
    suspects: Vec<String>,

    /// Suspect that refutes the suspicion after `--refute-after-ms` (repeatable)
    #[arg(long = "refute")]
    refutes: Vec<String>,

    #[arg(long, default_value_t = 1000)]
    refute_after_ms: u64,

    /// How long to let timers run before shutting down
    #[arg(long, default_value_t = 8000)]
    run_for_ms: u64,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    let mut config = match &args.config {
        Some(path) => NodeConfig::from_json_file(path)?,
        None => NodeConfig::default(),
    };
    if let Some(local) = &args.local {
        config.local_address = local.clone();
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.suspicion.timeout = Duration::from_millis(timeout_ms);
    }

    let service = MembershipService::new(&config)?;

    for spec in &args.members {
        let (address, incarnation) = parse_member(spec)?;
        service.handle_join(&address, incarnation);
    }

    for address in &args.suspects {
        let Some(member) = service.get_member(address) else {
            tracing::warn!("Unknown suspect {}, pass it with --member first", address);
            continue;
        };
        service.handle_suspect(&member.address, member.incarnation);
    }

    if !args.refutes.is_empty() {
        let refuter = service.clone();
        let refutes = args.refutes.clone();
        let delay = Duration::from_millis(args.refute_after_ms);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            for address in refutes {
                match refuter.get_member(&address) {
                    Some(member) => {
                        refuter.handle_alive(&address, member.incarnation + 1);
                    }
                    None => tracing::warn!("Unknown member {} cannot refute", address),
                }
            }
        });
    }

    tokio::time::sleep(Duration::from_millis(args.run_for_ms)).await;

    service.suspicion().disable();

    let mut members = service.memberlist.members();
    members.sort_by(|a, b| a.address.cmp(&b.address));
    tracing::info!("Final membership: {} members", members.len());
    for member in members {
        tracing::info!(
            "  - {} {:?} (inc={})",
            member.address,
            member.status,
            member.incarnation
        );
    }

    Ok(())
}

fn parse_member(spec: &str) -> anyhow::Result<(String, u64)> {
    match spec.split_once('@') {
        Some((address, incarnation)) => {
            let incarnation = incarnation
                .parse()
                .map_err(|e| anyhow::anyhow!("bad incarnation in {}: {}", spec, e))?;
            Ok((address.to_string(), incarnation))
        }
        None => Ok((spec.to_string(), 1)),
    }
}
