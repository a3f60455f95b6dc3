//! Reconcile command - the full pipeline from input files to reports.
//!
//! Loads the species tree, the `S{i}_S{j}` pair files and the gene families,
//! reconciles every family component in parallel, then writes the gene info
//! report and the ortholog groups and prints a run summary.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::Args;

use crate::cli::OutputFormat;
use crate::labeling::LabelingStrategy;
use crate::parsing::families::load_families;
use crate::parsing::newick::load_species_tree;
use crate::parsing::pairs::load_pair_directory;
use crate::pipeline::{ReconcileConfig, ReconciliationEngine, RunResults, RunSummary};

/// Arguments for the reconcile command
#[derive(Args)]
pub struct ReconcileArgs {
    /// Species tree file (one Newick line, or a postfix string over 0/1/N)
    #[arg(required = true)]
    pub species_tree: PathBuf,

    /// Gene family file, one whitespace-separated family per line
    #[arg(required = true)]
    pub families: PathBuf,

    /// Directory holding the S{i}_S{j} ortholog pair files
    #[arg(short = 'p', long, default_value = ".")]
    pub pairs_dir: PathBuf,

    /// Expected number of species; must match the species tree when given
    #[arg(short = 's', long)]
    pub species: Option<usize>,

    /// Output file for gene births, duplications and losses
    #[arg(short = 'o', long, required = true)]
    pub gene_info: PathBuf,

    /// Output file for ortholog groups, one tab-separated group per line
    #[arg(short = 'g', long, required = true)]
    pub ortho_groups: PathBuf,

    /// Labeling strategy
    #[arg(long, value_enum, default_value = "auto")]
    pub strategy: LabelingStrategy,

    /// With --strategy auto, use the node-centric solver below this many layers
    #[arg(long, default_value = "5", value_parser = clap::value_parser!(u32).range(1..=16))]
    pub node_centric_max_layers: u32,

    /// Worker threads (default: all available cores)
    #[arg(short = 't', long)]
    pub threads: Option<usize>,

    /// Smallest ortholog group to report
    #[arg(long, default_value = "2", value_parser = clap::value_parser!(u32).range(1..))]
    pub min_group_size: u32,
}

/// Execute the reconcile command
///
/// # Errors
///
/// Returns an error if inputs cannot be loaded, the thread pool cannot be
/// built, or an output file cannot be written.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: ReconcileArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let start = Instant::now();

    let named = load_species_tree(&args.species_tree, args.species).with_context(|| {
        format!(
            "Failed to load species tree from {}",
            args.species_tree.display()
        )
    })?;
    let tree = &named.tree;
    if verbose {
        eprintln!(
            "Species tree: {} species, {} internal nodes ({})",
            tree.species_count(),
            tree.internal_count(),
            named.leaf_names.join(", ")
        );
    }

    let graph = load_pair_directory(&args.pairs_dir, tree.species_count()).with_context(|| {
        format!(
            "Failed to load ortholog pairs from {}",
            args.pairs_dir.display()
        )
    })?;
    if verbose {
        eprintln!(
            "Loaded {} genes and {} ortholog pairs",
            graph.gene_count(),
            graph.pair_count()
        );
    }

    let families = load_families(&args.families)
        .with_context(|| format!("Failed to load families from {}", args.families.display()))?;
    if families.is_empty() {
        eprintln!("Warning: No gene families to reconcile.");
    } else if verbose {
        eprintln!("Loaded {} gene families", families.len());
    }

    let config = ReconcileConfig {
        strategy: args.strategy,
        node_centric_max_layers: args.node_centric_max_layers as usize,
        num_threads: args.threads,
        min_group_size: args.min_group_size as usize,
    };
    let engine = ReconciliationEngine::new(tree, &graph, config);
    let results = engine.run(&families)?;

    write_file(&args.gene_info, |out| write_gene_info(out, &results))?;
    write_file(&args.ortho_groups, |out| write_groups(out, &results))?;

    let summary = results.summary(start.elapsed().as_millis());
    if summary.components_failed > 0 {
        eprintln!(
            "Warning: {} component(s) failed and were left out of the output.",
            summary.components_failed
        );
    }

    match format {
        OutputFormat::Text => print_text_summary(&summary),
        OutputFormat::Json => print_json_summary(&summary)?,
        OutputFormat::Tsv => print_tsv_summary(&summary),
    }

    Ok(())
}

fn write_file<F>(path: &Path, write: F) -> anyhow::Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
{
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    write(&mut out)
        .and_then(|()| out.flush())
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Write the three-line gene info report
pub(crate) fn write_gene_info<W: Write>(out: &mut W, results: &RunResults) -> std::io::Result<()> {
    write!(out, "Gene birth: ")?;
    write_joined(out, results.births.iter())?;

    write!(out, "Gene duplication: ")?;
    write_joined(out, results.duplications.iter())?;

    write!(out, "Gene loss: ")?;
    let losses: Vec<String> = results
        .losses
        .iter()
        .map(|(site, count)| format!("{site}\t{count}"))
        .collect();
    write_joined(out, losses.iter())
}

fn write_joined<W, I, T>(out: &mut W, items: I) -> std::io::Result<()>
where
    W: Write,
    I: Iterator<Item = T>,
    T: std::fmt::Display,
{
    for (i, item) in items.enumerate() {
        if i > 0 {
            write!(out, "\t")?;
        }
        write!(out, "{item}")?;
    }
    writeln!(out)
}

/// Write ortholog groups, one per line, in sorted order
pub(crate) fn write_groups<W: Write>(out: &mut W, results: &RunResults) -> std::io::Result<()> {
    for group in &results.groups {
        writeln!(out, "{group}")?;
    }
    Ok(())
}

fn print_text_summary(summary: &RunSummary) {
    println!("Reconciliation summary");
    println!("   Families: {}", summary.families);
    println!(
        "   Components: {} reconciled, {} failed",
        summary.components_succeeded, summary.components_failed
    );
    println!("   Gene births: {}", summary.births);
    println!("   Gene duplications: {}", summary.duplications);
    println!(
        "   Gene losses: {} across {} sites",
        summary.loss_events, summary.loss_sites
    );
    println!("   Ortholog groups: {}", summary.ortholog_groups);
    println!("   Total substitutions: {}", summary.total_substitutions);
    println!("   Elapsed: {} ms", summary.elapsed_ms);
}

fn print_json_summary(summary: &RunSummary) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(summary)?);
    Ok(())
}

fn print_tsv_summary(summary: &RunSummary) {
    println!(
        "families\tcomponents_succeeded\tcomponents_failed\tbirths\tduplications\tloss_sites\tloss_events\tortholog_groups\ttotal_substitutions\telapsed_ms"
    );
    println!(
        "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
        summary.families,
        summary.components_succeeded,
        summary.components_failed,
        summary.births,
        summary.duplications,
        summary.loss_sites,
        summary.loss_events,
        summary.ortholog_groups,
        summary.total_substitutions,
        summary.elapsed_ms,
    );
}
