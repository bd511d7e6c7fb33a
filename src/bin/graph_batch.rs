//! graph-batch: run a file of object-graph calls as bounded, rate-limited batches.
//!
//! Usage:
//!   graph-batch run <calls.json> [--token <t>] [--base-url <url>]   Execute calls, print ordered results
//!   graph-batch split <count> [--size <n>] [--concurrency <n>]     Show the chunk and wave plan

use anyhow::{anyhow, bail, Context};
use graph_batch_rust::batch::{chunk_count, Args, BatchExecutorConfig};
use graph_batch_rust::{GraphBatchClient, HttpOptions, HttpVerb};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Deserialize)]
struct CallSpec {
    #[serde(default = "default_method")]
    method: String,
    path: String,
    #[serde(default)]
    args: Args,
}

fn default_method() -> String {
    "get".to_string()
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("graph_batch_rust=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let outcome = match args[1].as_str() {
        "run" => cmd_run(&args[2..]).await,
        "split" => cmd_split(&args[2..]),
        "version" | "--version" | "-V" => {
            println!("graph-batch {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = outcome {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn print_usage() {
    println!(
        r#"graph-batch: batch orchestrator for object-graph APIs

USAGE:
    graph-batch <COMMAND> [OPTIONS]

COMMANDS:
    run <calls.json>            Execute a JSON array of {{method, path, args}} calls
        --token <t>             Access token (or GRAPH_ACCESS_TOKEN)
        --base-url <url>        API base URL (or GRAPH_API_BASE_URL)
    split <count>               Print the chunk/wave plan for <count> calls
        --size <n>              Calls per wire request (default 10)
        --concurrency <n>       Chunks in flight per wave (default 10)
    version                     Show version information
    help                        Show this help message

ENVIRONMENT:
    GRAPH_BATCH_MAX_SET_SIZE, GRAPH_BATCH_MAX_CONCURRENCY
    GRAPH_RATE_COUNT_LIMIT, GRAPH_RATE_WINDOW_SECS, GRAPH_RATE_COOLDOWN_SECS
    GRAPH_HTTP_TIMEOUT_SECS, GRAPH_PROXY_URL
    RUST_LOG                    Log filter (default graph_batch_rust=info)"#
    );
}

fn flag_value<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

async fn cmd_run(args: &[String]) -> anyhow::Result<()> {
    let path = args
        .first()
        .filter(|a| !a.starts_with("--"))
        .ok_or_else(|| anyhow!("missing <calls.json>"))?;
    let token = match flag_value(args, "--token") {
        Some(t) => t.to_string(),
        None => std::env::var("GRAPH_ACCESS_TOKEN")
            .context("no --token given and GRAPH_ACCESS_TOKEN is not set")?,
    };

    let content =
        std::fs::read_to_string(path).with_context(|| format!("cannot read {path}"))?;
    let calls: Vec<CallSpec> =
        serde_json::from_str(&content).with_context(|| format!("{path} is not a call list"))?;

    let mut builder = GraphBatchClient::builder();
    if let Some(url) = flag_value(args, "--base-url") {
        builder = builder.base_url_override(url);
    }
    let client = builder.build()?;

    let api = client.batch_api(token);
    for call in calls {
        let verb: HttpVerb = call.method.parse()?;
        api.graph_call(call.path, call.args, verb, HttpOptions::default(), None);
    }

    let results = api.execute(&HttpOptions::default()).await?;
    let rendered: Vec<serde_json::Value> = results
        .iter()
        .map(|r| match r {
            Ok(value) => serde_json::json!({ "ok": value }),
            Err(e) => serde_json::json!({ "error": e.to_string() }),
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&rendered)?);
    Ok(())
}

fn cmd_split(args: &[String]) -> anyhow::Result<()> {
    let count: usize = args
        .first()
        .ok_or_else(|| anyhow!("missing <count>"))?
        .parse()
        .context("<count> must be a non-negative integer")?;

    let mut config = BatchExecutorConfig::from_env();
    if let Some(size) = flag_value(args, "--size") {
        config.max_batch_set_size = size.parse().context("--size must be an integer")?;
    }
    if let Some(c) = flag_value(args, "--concurrency") {
        config.max_concurrency = c.parse().context("--concurrency must be an integer")?;
    }
    config.validate()?;
    if count == 0 {
        bail!("nothing to plan for zero calls");
    }

    let chunks = chunk_count(count, config.max_batch_set_size);
    let waves = chunks.div_ceil(config.max_concurrency);
    println!("calls:        {count}");
    println!("chunk size:   {}", config.max_batch_set_size);
    let charged = if chunks > 1 { chunks } else { 0 };
    println!("chunks:       {chunks} (rate budget charged {charged} time(s))");
    println!("waves:        {waves} (up to {} chunks each)", config.max_concurrency);
    for chunk in 0..chunks {
        let start = chunk * config.max_batch_set_size;
        let end = (start + config.max_batch_set_size).min(count);
        println!(
            "  wave {:>3}  chunk {:>4}  calls [{start}, {end})",
            chunk / config.max_concurrency,
            chunk
        );
    }
    Ok(())
}
