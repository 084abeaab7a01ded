//! Scripted fault-injection 9P2000 server.
//!
//! # Usage
//!
//! Serve on the default ports (control 2342, protocol 4223):
//! ```bash
//! ninep-fault-server
//! ```
//!
//! List every scenario:
//! ```bash
//! ninep-fault-server --list
//! ```
//!
//! List the scenarios of one category as JSON:
//! ```bash
//! ninep-fault-server --list --category walk --format json
//! ```

use clap::Parser;
use facet::Facet;
use ninep_conformance::config::{
    DEFAULT_CONTROL_ADDR, DEFAULT_MAX_MESSAGE_SIZE, DEFAULT_PROTOCOL_ADDR,
};
use ninep_conformance::{HandoffMode, ScenarioRegistry, Server, ServerConfig};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser, Debug)]
#[command(name = "ninep-fault-server")]
#[command(about = "Scripted fault-injection server for 9P2000 client conformance tests")]
struct Args {
    /// Address of the control listener
    #[arg(short, long, env = "NINEP_CONTROL_ADDR", default_value = DEFAULT_CONTROL_ADDR)]
    control_addr: String,

    /// Address of the 9P listener
    #[arg(short, long, env = "NINEP_PROTOCOL_ADDR", default_value = DEFAULT_PROTOCOL_ADDR)]
    protocol_addr: String,

    /// How control connections are matched to protocol connections (paired, global)
    #[arg(long, env = "NINEP_HANDOFF", default_value_t = HandoffMode::Paired)]
    handoff: HandoffMode,

    /// Largest request frame accepted, in bytes
    #[arg(long, env = "NINEP_MAX_MESSAGE_SIZE", default_value_t = DEFAULT_MAX_MESSAGE_SIZE)]
    max_message_size: u32,

    /// List available scenarios and exit
    #[arg(long)]
    list: bool,

    /// Filter the listing by category (header, version, attach, stat, walk, open, read, write, fid)
    #[arg(long)]
    category: Option<String>,

    /// Listing format (text, json)
    #[arg(long, default_value = "text")]
    format: String,
}

impl Args {
    fn config(&self) -> ServerConfig {
        ServerConfig {
            control_addr: self.control_addr.clone(),
            protocol_addr: self.protocol_addr.clone(),
            handoff: self.handoff,
            max_message_size: self.max_message_size,
        }
    }
}

/// JSON output for one scenario.
#[derive(Facet)]
struct ScenarioJson {
    name: String,
    category: String,
    expects: String,
    fault: String,
    description: String,
}

fn main() {
    let args = Args::parse();

    if args.list {
        list_scenarios(&args);
        return;
    }

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("failed to start runtime: {e}");
            std::process::exit(2);
        }
    };

    let config = args.config();
    runtime.block_on(async {
        match Server::bind(&config).await {
            Ok(server) => server.run().await,
            Err(e) => {
                tracing::error!(error = %e, "startup failed");
                std::process::exit(1);
            }
        }
    });
}

fn list_scenarios(args: &Args) {
    let registry = ScenarioRegistry::builtin();
    let mut entries: Vec<_> = registry
        .iter()
        .filter(|e| {
            args.category
                .as_deref()
                .is_none_or(|c| e.scenario.category() == c)
        })
        .collect();
    entries.sort_by_key(|e| (e.scenario.category(), e.name));

    if args.format == "json" {
        let output: Vec<ScenarioJson> = entries
            .iter()
            .map(|e| ScenarioJson {
                name: e.name.to_string(),
                category: e.scenario.category().to_string(),
                expects: e.expects.to_string(),
                fault: e.scenario.fault().to_string(),
                description: e.scenario.description().to_string(),
            })
            .collect();
        println!("{}", facet_json::to_string(&output));
        return;
    }

    println!("Available scenarios:\n");
    let mut current_category = "";
    for entry in &entries {
        let category = entry.scenario.category();
        if category != current_category {
            if !current_category.is_empty() {
                println!();
            }
            println!("## {}", category);
            current_category = category;
        }
        println!(
            "  {:<28} {:<9} {:<13} {}",
            entry.name,
            entry.expects.to_string(),
            entry.scenario.fault().as_str(),
            entry.scenario.description()
        );
    }
    println!("\nTotal: {} scenarios", entries.len());
}
