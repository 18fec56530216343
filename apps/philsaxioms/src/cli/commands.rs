//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::api::{self, check_selection};
use crate::{AppError, Config, DatasetStore};
use philsaxioms_core::formats::{STATIC_GRAPH_FILE, STATIC_QUESTIONNAIRE_FILE};
use philsaxioms_core::{NodeId, build_static_bundle, check};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

async fn open_store(config: &Config) -> Arc<DatasetStore> {
    DatasetStore::open(&config.data_dir, config.layout, config.cache_capacity).await
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), AppError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::Core(philsaxioms_core::AxiomsError::Serialization(e.to_string())))?;
    println!("{}", text);
    Ok(())
}

fn to_id_set(ids: &[String]) -> BTreeSet<NodeId> {
    ids.iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(NodeId::new)
        .collect()
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(config: &Config) -> Result<(), AppError> {
    println!("PhilsAxioms Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:     {}", config.host);
    println!("  Port:     {}", config.port);
    println!("  Data:     {}", config.data_dir.display());
    println!("  Watch:    {}", config.watch);
    println!();
    println!("Endpoints:");
    for endpoint in api::ENDPOINTS {
        println!("  {}", endpoint);
    }
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    api::run_server(config).await
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show dataset counts.
pub async fn cmd_status(config: &Config, json_mode: bool) -> Result<(), AppError> {
    let dataset = open_store(config).await.load().await;
    let graph = &dataset.graph;
    let axioms = graph.axioms().count();
    let arguments = graph.arguments().count();

    if json_mode {
        return print_json(&serde_json::json!({
            "data_dir": config.data_dir.to_string_lossy(),
            "nodes": graph.len(),
            "axioms": axioms,
            "arguments": arguments,
            "edges": graph.edge_count(),
            "categories": graph.categories().len(),
            "checksum": dataset.checksum,
        }));
    }

    println!("PhilsAxioms Dataset Status");
    println!("==========================");
    println!("Data:       {}", config.data_dir.display());
    println!();
    println!("Nodes:      {}", graph.len());
    println!("Axioms:     {}", axioms);
    println!("Arguments:  {}", arguments);
    println!("Edges:      {}", graph.edge_count());
    println!("Categories: {}", graph.categories().len());
    println!("Checksum:   {}", dataset.checksum);

    Ok(())
}

// =============================================================================
// CHECK COMMAND
// =============================================================================

/// Run the consistency report. Fails when the dataset has errors.
pub async fn cmd_check(config: &Config, json_mode: bool) -> Result<(), AppError> {
    let dataset = open_store(config).await.load().await;
    let report = check(&dataset.graph);

    if json_mode {
        print_json(&report)?;
    } else {
        println!("PhilsAxioms Consistency Check");
        println!("=============================");
        println!(
            "{} axioms, {} arguments, {} edges, {} categories",
            report.summary.axioms,
            report.summary.arguments,
            report.summary.edges,
            report.summary.categories
        );
        println!(
            "{} arguments activatable with every axiom accepted",
            report.summary.activatable_with_all_axioms
        );
        println!();

        for error in &report.errors {
            println!("ERROR:   {}", error);
        }
        for warning in &report.warnings {
            println!("WARNING: {}", warning);
        }
        if report.errors.is_empty() && report.warnings.is_empty() {
            println!("No problems found");
        }
    }

    if report.is_valid {
        Ok(())
    } else {
        Err(AppError::DatasetInvalid(report.errors.len()))
    }
}

// =============================================================================
// EVALUATE COMMAND
// =============================================================================

/// Print the valid arguments for a selection.
pub async fn cmd_evaluate(
    config: &Config,
    json_mode: bool,
    accept: &[String],
    reject: &[String],
) -> Result<(), AppError> {
    let accepted = to_id_set(accept);
    let rejected = to_id_set(reject);
    check_selection(&accepted, &rejected).map_err(AppError::BadRequest)?;

    let store = open_store(config).await;
    let evaluation = store.evaluate(&accepted, &rejected).await?;

    if json_mode {
        return print_json(&*evaluation);
    }

    for id in &evaluation.unknown_ids {
        tracing::warn!("Not an axiom of this dataset: {}", id);
    }

    let dataset = store.load().await;
    println!(
        "{} of {} arguments are valid",
        evaluation.valid_arguments.len(),
        dataset.graph.arguments().count()
    );
    for id in &evaluation.valid_arguments {
        let title = dataset.graph.node(id.as_str()).map_or("", |n| n.title.as_str());
        println!("  {}  {}", id, title);
    }

    Ok(())
}

// =============================================================================
// LAYOUT COMMAND
// =============================================================================

/// Print level and coordinates per node, top row first.
pub async fn cmd_layout(config: &Config, json_mode: bool) -> Result<(), AppError> {
    let layout = open_store(config).await.layout().await?;

    if json_mode {
        return print_json(&*layout);
    }

    let mut rows: Vec<_> = layout.nodes.values().collect();
    rows.sort_by(|a, b| b.level.cmp(&a.level).then(a.x.cmp(&b.x)));

    println!("{:<24} {:<9} {:>5} {:>8} {:>8}", "ID", "TYPE", "LEVEL", "X", "Y");
    for node in rows {
        let marker = if layout.fallback.contains(&node.id) { " *" } else { "" };
        println!(
            "{:<24} {:<9} {:>5} {:>8} {:>8}{}",
            node.id.as_str(),
            node.kind.as_str(),
            node.level,
            node.x,
            node.y,
            marker
        );
    }
    if !layout.fallback.is_empty() {
        println!();
        println!("* placed at the fallback level (unresolved dependencies)");
    }

    Ok(())
}

// =============================================================================
// BUILD-STATIC COMMAND
// =============================================================================

/// Write the static front-end bundle to `output`.
pub async fn cmd_build_static(config: &Config, output: &Path) -> Result<(), AppError> {
    let dataset = open_store(config).await.load().await;
    let bundle = build_static_bundle(&dataset.graph)?;

    tokio::fs::create_dir_all(output).await?;
    let graph_path = output.join(STATIC_GRAPH_FILE);
    let questionnaire_path = output.join(STATIC_QUESTIONNAIRE_FILE);
    tokio::fs::write(&graph_path, bundle.graph_data).await?;
    tokio::fs::write(&questionnaire_path, bundle.questionnaire).await?;

    println!(
        "Static data built: {} nodes, {} questionnaire items",
        dataset.graph.len(),
        dataset.questionnaire.len()
    );
    println!("  {}", graph_path.display());
    println!("  {}", questionnaire_path.display());

    Ok(())
}
