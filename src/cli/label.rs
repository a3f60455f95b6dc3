//! Label command - run a labeling solver on hand-written parallel trees.
//!
//! Useful for inspecting a single component or checking that the two
//! solvers agree on the optimal number of substitutions.

use std::path::Path;

use anyhow::{bail, Context};
use clap::Args;

use crate::cli::OutputFormat;
use crate::core::layer::ParallelTree;
use crate::core::species_tree::SpeciesTree;
use crate::labeling::{label_layers, Labeling, LabelingStrategy};
use crate::parsing::newick::{load_species_tree, parse_species_tree};

#[derive(Args)]
pub struct LabelArgs {
    /// Species tree: a postfix string such as 11N1N, a Newick string, or a
    /// file containing either
    #[arg(required = true)]
    pub tree: String,

    /// Parallel trees in postfix form, one per layer (e.g. 10N0N)
    #[arg(required = true, num_args = 1..)]
    pub layers: Vec<String>,

    /// Labeling strategy
    #[arg(long, value_enum, default_value = "auto")]
    pub strategy: LabelingStrategy,

    /// With --strategy auto, use the node-centric solver below this many layers
    #[arg(long, default_value = "5", value_parser = clap::value_parser!(u32).range(1..=16))]
    pub node_centric_max_layers: u32,
}

/// Execute the label command
///
/// # Errors
///
/// Returns an error if the tree or a layer cannot be parsed, or no valid
/// labeling exists.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: LabelArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let tree = read_tree(&args.tree)?;
    let layers = parse_layers(&args.layers)?;

    let max_layers = args.node_centric_max_layers as usize;
    let strategy = args.strategy.resolve(layers.len(), max_layers);
    if verbose {
        eprintln!(
            "Labeling {} layer(s) on a {}-species tree with the {} solver",
            layers.len(),
            tree.species_count(),
            strategy.as_str()
        );
    }

    let labeling = label_layers(&tree, &layers, strategy, max_layers)?;

    match format {
        OutputFormat::Text => print_text_results(&layers, &labeling, strategy),
        OutputFormat::Json => print_json_results(&layers, &labeling, strategy)?,
        OutputFormat::Tsv => print_tsv_results(&layers, &labeling),
    }

    Ok(())
}

/// Accept a tree given inline or as a file path
fn read_tree(arg: &str) -> anyhow::Result<SpeciesTree> {
    let path = Path::new(arg);
    let named = if path.is_file() {
        load_species_tree(path, None)
            .with_context(|| format!("Failed to load species tree from {arg}"))?
    } else {
        parse_species_tree(arg).with_context(|| format!("Invalid species tree '{arg}'"))?
    };
    Ok(named.tree)
}

fn parse_layers(patterns: &[String]) -> anyhow::Result<Vec<ParallelTree>> {
    let mut layers = Vec::with_capacity(patterns.len());
    for (i, pattern) in patterns.iter().enumerate() {
        let layer: ParallelTree = pattern
            .parse()
            .with_context(|| format!("Invalid parallel tree for layer {i}: '{pattern}'"))?;
        if layer.is_empty() {
            bail!("Parallel tree for layer {i} is empty");
        }
        layers.push(layer);
    }
    Ok(layers)
}

fn print_text_results(layers: &[ParallelTree], labeling: &Labeling, strategy: LabelingStrategy) {
    println!("Solver: {}", strategy.as_str());
    println!("Total substitutions: {}", labeling.total_substitutions);
    for (i, (layer, labeled)) in layers.iter().zip(&labeling.layers).enumerate() {
        println!("   Layer {i}: {layer} -> {labeled}");
    }
}

fn print_json_results(
    layers: &[ParallelTree],
    labeling: &Labeling,
    strategy: LabelingStrategy,
) -> anyhow::Result<()> {
    let output = serde_json::json!({
        "solver": strategy,
        "total_substitutions": labeling.total_substitutions,
        "layers": layers
            .iter()
            .zip(&labeling.layers)
            .map(|(layer, labeled)| serde_json::json!({
                "input": layer.to_string(),
                "labeled": labeled,
            }))
            .collect::<Vec<_>>(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_tsv_results(layers: &[ParallelTree], labeling: &Labeling) {
    println!("layer\tinput\tlabeled");
    for (i, (layer, labeled)) in layers.iter().zip(&labeling.layers).enumerate() {
        println!("{i}\t{layer}\t{labeled}");
    }
}
