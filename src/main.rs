use anyhow::{Context, Result};
use clap::Parser;
use class_refs::catalog::load_classes;
use class_refs::cli::{Cli, Commands, OutputFormat};
use class_refs::config::{init_logging, init_thread_pool, resolve_inputs, resolve_threads};
use class_refs::matcher::TextMatchMode;
use class_refs::query::{MemberTarget, QueryDescription, ReferenceQuery};
use class_refs::scan::collect_inputs;
use class_refs::search::{SearchHit, search_classes};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    init_thread_pool(resolve_threads(&cli)?)?;

    let (query, inputs) = build_query(&cli.command)?;
    let roots = resolve_inputs(&cli, inputs)?;
    let report = run_search(&query, &roots)?;
    write_output(&report, cli.format, cli.output.as_deref())
}

fn build_query(command: &Commands) -> Result<(ReferenceQuery, &[PathBuf])> {
    match command {
        Commands::Class {
            target,
            mode,
            inputs,
        } => {
            let target = target.as_deref().map(|t| normalize_class_name(t, *mode));
            Ok((
                ReferenceQuery::class(*mode, target.as_deref()),
                inputs.as_slice(),
            ))
        }
        Commands::Member {
            owner,
            name,
            descriptor,
            method,
            mode,
            owner_match,
            name_match,
            desc_match,
            inputs,
        } => {
            let owner_mode = owner_match.unwrap_or(*mode);
            let (owner, name, descriptor) = match method {
                Some(raw) => {
                    let parsed = MemberTarget::parse(raw).with_context(|| {
                        format!("Invalid --method {raw:?}, expected OWNER.NAME[DESCRIPTOR]")
                    })?;
                    (
                        Some(normalize_class_name(&parsed.owner, owner_mode)),
                        Some(parsed.name),
                        descriptor.clone().or(parsed.descriptor),
                    )
                }
                None => (
                    owner.as_deref().map(|o| normalize_class_name(o, owner_mode)),
                    name.clone(),
                    descriptor.clone(),
                ),
            };
            let query = ReferenceQuery::member_with_modes(
                owner_mode,
                name_match.unwrap_or(*mode),
                desc_match.unwrap_or(*mode),
                owner.as_deref(),
                name.as_deref(),
                descriptor.as_deref(),
            );
            Ok((query, inputs.as_slice()))
        }
    }
}

/// Dotted names become internal names unless the target is a pattern.
fn normalize_class_name(raw: &str, mode: TextMatchMode) -> String {
    let s = raw.trim();
    if mode.is_regex() {
        return s.to_string();
    }
    s.replace('.', "/")
}

#[derive(Debug, Serialize)]
struct SearchReport {
    query: QueryDescription,
    roots: Vec<String>,
    inputs_scanned: usize,
    classes_searched: usize,
    duration_ms: u64,
    hits: Vec<SearchHit>,
}

fn run_search(query: &ReferenceQuery, roots: &[PathBuf]) -> Result<SearchReport> {
    let start = Instant::now();
    let inputs = collect_inputs(roots)?;
    tracing::info!("Searching {} inputs", inputs.len());

    let per_input: Vec<(usize, Vec<SearchHit>)> = inputs
        .par_iter()
        .map(|input| match load_classes(input) {
            Ok(classes) => (classes.len(), search_classes(query, &classes)),
            Err(e) => {
                tracing::warn!("Skipping {}: {e:#}", input.path().display());
                (0, Vec::new())
            }
        })
        .collect();

    let classes_searched = per_input.iter().map(|(n, _)| n).sum();
    let hits: Vec<SearchHit> = per_input.into_iter().flat_map(|(_, h)| h).collect();
    tracing::info!("Found {} references in {classes_searched} classes", hits.len());

    Ok(SearchReport {
        query: query.describe(),
        roots: roots.iter().map(|p| p.display().to_string()).collect(),
        inputs_scanned: inputs.len(),
        classes_searched,
        duration_ms: start.elapsed().as_millis() as u64,
        hits,
    })
}

fn render_text(report: &SearchReport) -> String {
    let mut out = String::new();
    for hit in &report.hits {
        out.push_str(&format!(
            "{}: {} -> {}\n",
            hit.origin, hit.location, hit.reference
        ));
    }
    out.push_str(&format!(
        "{} references in {} classes ({} inputs, {} ms)\n",
        report.hits.len(),
        report.classes_searched,
        report.inputs_scanned,
        report.duration_ms
    ));
    out
}

fn write_output(report: &SearchReport, format: OutputFormat, output: Option<&Path>) -> Result<()> {
    let content = match format {
        OutputFormat::Json => serde_json::to_string_pretty(report)?,
        OutputFormat::Text => render_text(report),
    };

    if let Some(path) = output {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write output: {}", path.display()))?;
    } else {
        print!("{content}");
        if !content.ends_with('\n') {
            println!();
        }
    }

    Ok(())
}
