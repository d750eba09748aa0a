use anyhow::{Context, Result};
use clap::Parser;
use std::io::{stdout, BufWriter, Write};
use std::path::PathBuf;

use phylolabel::formats::{read_tree, write_tree, TreeFormat};
use phylolabel::labeling::labeler::label_tree;
use phylolabel::utils::now_str;

fn main() -> Result<()> {
    let args = Cli::parse();

    eprintln!("[{}] Reading phylogeny", now_str());
    let mut phylogeny =
        read_tree(&args.phylogeny_file, args.phylogeny_format).context("Unable to read phylogeny")?;

    eprintln!("[{}] Reading taxonomy", now_str());
    let mut taxonomy =
        read_tree(&args.taxonomy_file, args.taxonomy_format).context("Unable to read taxonomy")?;

    eprintln!("[{}] Labeling phylogeny", now_str());
    let labels = label_tree(&mut phylogeny, &mut taxonomy, args.root.as_deref());
    eprintln!("[{}] Found {} labels shared by both trees", now_str(), labels.len());

    let mut writer = BufWriter::new(stdout());
    write_tree(&mut writer, &phylogeny, args.output_format)
        .context("Unable to write annotated phylogeny")?;
    writer.flush().context("Unable to flush output")?;

    Ok(())
}

#[derive(Parser, Debug)]
struct Cli {
    /// Path to the phylogeny
    phylogeny_file: PathBuf,

    /// Path to the taxonomy
    taxonomy_file: PathBuf,

    /// Phylogeny format (newick, nexus)
    #[clap(short = 'p', long, default_value_t = TreeFormat::Newick)]
    phylogeny_format: TreeFormat,

    /// Taxonomy format (newick, nexus)
    #[clap(short = 't', long, default_value_t = TreeFormat::Newick)]
    taxonomy_format: TreeFormat,

    /// Output format (newick, nexus)
    #[clap(short = 'o', long, default_value_t = TreeFormat::Newick)]
    output_format: TreeFormat,

    /// Name of the taxon to use as root of the taxonomy
    #[clap(short = 'r', long)]
    root: Option<String>,
}
