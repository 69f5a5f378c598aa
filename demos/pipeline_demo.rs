// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use signalflow::engine::SequentialGenerator;
use signalflow::observability::init_tracing;
use signalflow::{Ctx, Data, NodeError, Runtime, Value};

/// Demo: a data-only stage that can fail, an error-only stage that watches for
/// failures, and a sink that reports everything written to it.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("signalflow=debug");
    println!("=== signalflow data/error pipeline demo ===\n");

    let rt = Runtime::builder()
        .id_generator(SequentialGenerator::new("demo"))
        .max_concurrency(2)
        .build();

    // Uppercases text, rejects empty strings.
    let shout = rt.data_async(|ctx: &Ctx, data: Option<&Data>| {
        let text = data
            .and_then(|d| d.downcast_ref::<&'static str>())
            .copied()
            .unwrap_or_default();
        if text.is_empty() {
            ctx.rw().write(ctx, Value::of(anyhow::anyhow!("empty input")));
        } else {
            ctx.rw().write(ctx, text.to_uppercase());
        }
    });

    let report = rt.sink(|ctx: &Ctx, value: &Value| match value {
        Value::Data(d) => println!("[{}] data: {:?}", ctx.rw().id(), d.downcast_ref::<String>()),
        Value::Error(e) => println!("[{}] error: {}", ctx.rw().id(), e),
        Value::Empty => println!("[{}] empty", ctx.rw().id()),
    });
    shout.signal_node(&report);

    // The body runs only on clean reads, always with `None`; an error read
    // skips the body and forwards the absent payload through `write`.
    let watcher = report.signal_e(|_ctx: &Ctx, err: Option<&NodeError>| {
        println!("watcher ran on a clean read (error = {:?})", err.map(|e| e.to_string()));
    });

    for input in ["hello", "", "signalflow"] {
        shout.read(input, None);
    }
    watcher.read(1u8, None);

    rt.drain().await;
    println!("\nnodes: {} -> {} -> {}", shout.id(), report.id(), watcher.id());
    rt.shutdown().await?;
    Ok(())
}
