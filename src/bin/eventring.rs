//! Interactive console: starts the router and nodes, then forwards commands

use clap::Parser;
use eventring::common::{Config, Request};
use eventring::Cluster;
use std::io::Write;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "Unknown command. Available commands: get {event}, update {event}, status, exit";

#[derive(Parser, Debug)]
#[command(name = "eventring")]
#[command(about = "Event counters routed across local nodes with consistent hashing")]
#[command(version)]
struct Args {
    /// Config file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Router listen address
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Number of nodes to start (prompted when omitted)
    #[arg(long)]
    nodes: Option<usize>,

    /// Virtual nodes per node on the hash ring
    #[arg(long)]
    replicas: Option<usize>,

    /// First port probed for node listeners
    #[arg(long)]
    node_base_port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    /// Load the config file, then let CLI flags take priority
    fn into_config(self) -> anyhow::Result<Config> {
        let mut config = match self.config.as_deref() {
            Some(path) => Config::load_from(Some(path))?,
            None => Config::load()?,
        };
        if let Some(bind) = self.bind {
            config.router.bind_addr = bind;
        }
        if let Some(nodes) = self.nodes {
            config.nodes.count = Some(nodes);
        }
        if let Some(replicas) = self.replicas {
            config.ring.replica_factor = replicas;
        }
        if let Some(port) = self.node_base_port {
            config.nodes.base_port = port;
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }
        config.validate()?;
        Ok(config)
    }
}

fn prompt(text: &str) {
    print!("{}", text);
    let _ = std::io::stdout().flush();
}

async fn read_node_count(lines: &mut Lines<BufReader<Stdin>>) -> anyhow::Result<Option<usize>> {
    loop {
        prompt("Enter number of nodes to start: > ");
        let Some(line) = lines.next_line().await? else {
            return Ok(None);
        };
        match line.trim().parse::<usize>() {
            Ok(count) if count > 0 => return Ok(Some(count)),
            _ => tracing::warn!("Invalid input. Please enter a valid number."),
        }
    }
}

async fn show_all_counters(cluster: &Cluster) {
    let ports: Vec<u16> = cluster.nodes().iter().map(|n| n.addr.port()).collect();
    println!("Nodes running on ports: {:?}", ports);
    println!("Current counters on all nodes:");

    let client = cluster.client();
    for node in cluster.nodes() {
        println!("Node on port {}:", node.addr.port());
        match client.status(node.addr).await {
            Ok(text) => println!("{}", text),
            Err(e) => println!("Error: {}", e),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Args::parse().into_config()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    println!("Welcome to Consistent Hashing based Distributed Key-Value Store");

    let mut cluster = Cluster::start(&config).await?;
    let router = cluster.router_addr();
    let client = cluster.client();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let count = match config.nodes.count {
        Some(count) => count,
        None => match read_node_count(&mut lines).await? {
            Some(count) => count,
            None => return Ok(()),
        },
    };
    cluster.add_nodes(count).await?;

    loop {
        prompt("> ");
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input == "exit" {
            println!("Exiting...");
            break;
        }

        match Request::parse(input) {
            Ok(Request::Status) => show_all_counters(&cluster).await,
            Ok(request @ (Request::Get(_) | Request::Update(_))) => {
                match client.send(router, &request.to_string()).await {
                    Ok(response) => println!("{}", response),
                    Err(e) => println!("Error: {}", e),
                }
            }
            _ => println!("{}", USAGE),
        }
    }

    cluster.shutdown();
    Ok(())
}
