// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::env;
use std::path::Path;

use anyhow::Context;
use signalflow::config::{load_and_validate_config, Config};
use signalflow::observability::init_tracing;
use signalflow::{lift, Ctx, Data, NodeError, Runtime, Value};

fn is_config_path(arg: &str) -> bool {
    matches!(
        Path::new(arg).extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml" | "toml")
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("info");

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} [config.yaml] <numbers...>", args[0]);
        eprintln!("Example: {} 1 2 forty 300", args[0]);
        std::process::exit(1);
    }

    let (config, inputs) = if is_config_path(&args[1]) {
        let cfg = load_and_validate_config(&args[1])
            .with_context(|| format!("loading {}", args[1]))?;
        (cfg, &args[2..])
    } else {
        (Config::from_env().context("reading SIGNALFLOW_* overrides")?, &args[1..])
    };

    let rt = Runtime::from_config(&config);

    let parse = rt.data_async(|ctx: &Ctx, data: Option<&Data>| {
        let text = data
            .and_then(|d| d.downcast_ref::<String>())
            .map(String::as_str)
            .unwrap_or("");
        match text.parse::<i64>() {
            Ok(n) => ctx.rw().write(ctx, n),
            Err(e) => ctx.rw().write(
                ctx,
                Value::of(anyhow::anyhow!("'{}' is not a number: {}", text, e)),
            ),
        }
    });
    let double = rt.data_async(|ctx: &Ctx, data: Option<&Data>| {
        if let Some(n) = data.and_then(|d| d.downcast_ref::<i64>()) {
            ctx.rw().write(ctx, n * 2);
        }
    });
    let print = rt.sync_node(|_ctx: &Ctx, err: Option<&NodeError>, data: Option<&Data>| {
        match (err, data.and_then(|d| d.downcast_ref::<i64>())) {
            (Some(err), _) => println!("❌ {}", err),
            (None, Some(n)) => println!("✅ {}", n),
            (None, None) => println!("∅ empty"),
        }
    });

    lift(&[parse.clone(), rt.relay(&double)]);
    lift(&[double.clone(), rt.relay(&print)]);

    println!("🚀 signalflow parse → double → print");
    println!("═══════════════════════════════════");
    for input in inputs {
        parse.read(input.clone(), None);
    }

    rt.drain().await;
    rt.shutdown().await.context("shutting down dispatch")?;
    Ok(())
}
