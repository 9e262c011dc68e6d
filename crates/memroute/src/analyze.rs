// SPDX-FileCopyrightText: 2026 Memroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `memroute classify` and `memroute route` command implementations.
//!
//! Both run the analysis pipeline only; no backend is contacted.

use std::io::IsTerminal;

use memroute_config::MemrouteConfig;
use memroute_core::{Context, ExtractedEntity, MemoryRequest, MemrouteError, Operation};
use memroute_memory::MemoryRouter;
use memroute_router::RoutingDecision;
use serde::Serialize;
use serde_json::Value;

/// Structured route output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct RouteResponse {
    pub operation: Operation,
    pub entities: Vec<ExtractedEntity>,
    pub decision: RoutingDecision,
}

/// Build the request context from command-line flags.
fn build_context(urgency: Option<&str>) -> Option<Context> {
    urgency.map(|u| {
        let mut ctx = Context::new();
        ctx.insert("urgency".into(), Value::String(u.to_string()));
        ctx
    })
}

fn use_color(plain: bool) -> bool {
    !plain && std::io::stdout().is_terminal()
}

/// Run `memroute classify`.
pub fn run_classify(
    config: &MemrouteConfig,
    text: &str,
    json: bool,
    plain: bool,
) -> Result<(), MemrouteError> {
    let router = MemoryRouter::builder().config(config).build();
    let result = router.classify(text, None);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!();
    println!("  memroute classify");
    println!("  {}", "-".repeat(35));
    if use_color(plain) {
        use colored::Colorize;
        let intent = result.intent.to_string();
        let intent = if result.is_degenerate() {
            intent.yellow()
        } else {
            intent.green()
        };
        println!("    Intent:     {intent}");
    } else {
        println!("    Intent:     {}", result.intent);
    }
    println!("    Confidence: {:.2}", result.confidence);
    println!("    Tier:       {} ({})", result.tier, result.reason);
    if !result.patterns_matched.is_empty() {
        println!("    Matched:    {}", result.patterns_matched.join(", "));
    }
    println!();
    Ok(())
}

/// Run `memroute route`.
pub fn run_route(
    config: &MemrouteConfig,
    text: &str,
    operation: Operation,
    urgency: Option<&str>,
    json: bool,
    plain: bool,
) -> Result<(), MemrouteError> {
    let router = MemoryRouter::builder().config(config).build();
    let mut request = MemoryRequest::new(operation, text);
    if let Some(ctx) = build_context(urgency) {
        request = request.with_context(ctx);
    }

    let decision = router.route(&mut request);

    let response = RouteResponse {
        operation,
        entities: request.entities,
        decision,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print_route(&response, use_color(plain));
    }
    Ok(())
}

fn print_route(resp: &RouteResponse, use_color: bool) {
    let decision = &resp.decision;
    let intent = &decision.classification;
    println!();
    println!("  memroute route ({})", resp.operation);
    println!("  {}", "-".repeat(35));
    println!(
        "    Intent:      {} ({:.2}, {} tier)",
        intent.intent, intent.confidence, intent.tier
    );

    if use_color {
        use colored::Colorize;
        println!(
            "    Primary:     {} ({:.2})",
            decision.primary.to_string().green(),
            decision.confidence
        );
    } else {
        println!("    Primary:     {} ({:.2})", decision.primary, decision.confidence);
    }

    if !decision.secondaries.is_empty() {
        let names: Vec<String> = decision.secondaries.iter().map(|s| s.to_string()).collect();
        println!("    Secondaries: {}", names.join(", "));
    }

    println!("    Scores:");
    for (system, score) in decision.scores.ranked() {
        println!("      {system:<9} {score:.4}");
    }

    if !resp.entities.is_empty() {
        println!("    Entities:");
        for entity in &resp.entities {
            println!("      {} ({}, {:.2})", entity.name, entity.kind, entity.confidence);
        }
    }
    println!("    Reasoning:   {}", decision.reasoning);
    println!();
}
