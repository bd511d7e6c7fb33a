//! Batch Usage Example
//!
//! This example walks through the batch orchestrator:
//! - Planning: how a queue is split into wire calls and waves
//! - A custom rate limiter with its own counter store
//! - The block form `GraphBatchClient::batch` over an in-process transport
//! - The same block form against the live API when a token is available
//!
//! Usage:
//!   cargo run --example batch_usage
//!   GRAPH_ACCESS_TOKEN=... cargo run --example batch_usage

use async_trait::async_trait;
use graph_batch_rust::batch::{split, BatchOperation, BatchQueue, HttpOptions, HttpVerb};
use graph_batch_rust::resilience::{MemoryRateLimitStore, RateLimiter, RateLimiterConfig};
use graph_batch_rust::transport::{ChunkResponse, ChunkTransport, TransportError};
use graph_batch_rust::types::RawResult;
use graph_batch_rust::GraphBatchClient;
use std::sync::Arc;
use std::time::Duration;

/// Answers every call with `{"id": <path>}` without touching the network.
struct EchoTransport;

#[async_trait]
impl ChunkTransport for EchoTransport {
    async fn dispatch(
        &self,
        _credential: &str,
        operations: &[BatchOperation],
        _options: &HttpOptions,
    ) -> Result<ChunkResponse, TransportError> {
        Ok(Some(
            operations
                .iter()
                .map(|op| Some(RawResult::new(200, serde_json::json!({ "id": op.path() }).to_string())))
                .collect(),
        ))
    }

    fn name(&self) -> &'static str {
        "echo"
    }
}

#[tokio::main]
async fn main() -> graph_batch_rust::Result<()> {
    println!("=== Graph Batch Demo ===\n");

    demo_planning();
    demo_custom_limiter().await;
    demo_block_form().await?;
    demo_live_api().await?;

    Ok(())
}

fn demo_planning() {
    println!("--- Example 1: Chunk planning ---\n");

    let queue = BatchQueue::new();
    for i in 0..23 {
        queue.enqueue(BatchOperation::new(format!("{}", 1000 + i), HttpVerb::Get, "token"));
    }

    for chunk in split(queue.drain(), 10) {
        println!(
            "chunk of {:>2} calls at positions {:?}..={:?}",
            chunk.len(),
            chunk.indices.first(),
            chunk.indices.last()
        );
    }
    println!();
}

async fn demo_custom_limiter() {
    println!("--- Example 2: Custom rate limiter ---\n");

    // A tight budget so the cooldown is visible.
    let config = RateLimiterConfig::new()
        .with_count_limit(3)
        .with_window_period(Duration::from_secs(60))
        .with_cooldown(Duration::from_millis(200));
    let limiter = RateLimiter::with_store(config, Arc::new(MemoryRateLimitStore::new()));

    for i in 1..=4 {
        let admission = limiter.admit("demo-token").await;
        println!("admission {}: {:?}", i, admission);
    }
    if let Ok(snapshot) = limiter.snapshot("demo-token").await {
        println!("snapshot: {:?}\n", snapshot);
    }
}

async fn demo_block_form() -> graph_batch_rust::Result<()> {
    println!("--- Example 3: Block form over an in-process transport ---\n");

    let client = GraphBatchClient::builder()
        .transport(Arc::new(EchoTransport))
        .rate_limit_store(Arc::new(MemoryRateLimitStore::new()))
        .rate_limit(RateLimiterConfig::new().with_count_limit(100))
        .build()?;

    let results = client
        .batch("demo-token", |b| {
            b.get_object("me", Default::default());
            for i in 0..14 {
                b.get_connections(&format!("{}", 2000 + i), "likes", Default::default());
            }
        })
        .await?;

    for (i, result) in results.iter().enumerate().take(3) {
        println!("result {}: {:?}", i, result);
    }
    println!("... {} results in enqueue order\n", results.len());
    Ok(())
}

async fn demo_live_api() -> graph_batch_rust::Result<()> {
    println!("--- Example 4: Live API ---\n");

    let Ok(token) = std::env::var("GRAPH_ACCESS_TOKEN") else {
        println!("GRAPH_ACCESS_TOKEN not set; skipping\n");
        return Ok(());
    };

    let client = GraphBatchClient::new()?;
    let results = client
        .batch(token, |b| {
            b.get_object("me", Default::default());
            b.get_connections("me", "friends", Default::default());
        })
        .await?;

    for result in results {
        match result {
            Ok(value) => println!("ok: {:?}", value),
            Err(e) => println!("failed: {}", e),
        }
    }
    Ok(())
}
