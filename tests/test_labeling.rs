//! End-to-end checks of the parse -> label -> serialize pipeline.

use phylolabel::formats::{read_tree_str, write_tree, TreeFormat};
use phylolabel::labeling::labeler::label_tree;
use phylolabel::model::tree::Tree;

const PHYLOGENY: &str = "((Homo_sapiens:1,Pan_troglodytes:1):1,Mus_musculus:2);";
const TAXONOMY: &str =
    "(((Homo_sapiens)Homo,(Pan_troglodytes)Pan)Hominidae,((Mus_musculus)Mus)Muridae)Mammalia;";

fn labeled_phylogeny() -> Tree {
    let mut phylogeny = read_tree_str(PHYLOGENY, TreeFormat::Newick).unwrap();
    let mut taxonomy = read_tree_str(TAXONOMY, TreeFormat::Newick).unwrap();
    label_tree(&mut phylogeny, &mut taxonomy, None);
    phylogeny
}

#[test]
fn test_pipeline_labels_every_shared_taxon() {
    let mut phylogeny = read_tree_str(PHYLOGENY, TreeFormat::Newick).unwrap();
    let mut taxonomy = read_tree_str(TAXONOMY, TreeFormat::Newick).unwrap();

    let labels = label_tree(&mut phylogeny, &mut taxonomy, None);

    for expected in [
        "Homo sapiens",
        "Pan troglodytes",
        "Mus musculus",
        "Homo",
        "Pan",
        "Mus",
        "Hominidae",
        "Muridae",
        "Mammalia",
    ] {
        assert!(labels.contains(expected), "missing label {}", expected);
    }
    assert_eq!(labels.len(), 9);
}

#[test]
fn test_pipeline_newick_output() {
    let phylogeny = labeled_phylogeny();

    let mut out = Vec::new();
    write_tree(&mut out, &phylogeny, TreeFormat::Newick).unwrap();
    let newick = String::from_utf8(out).unwrap();

    // Genera are stacked above their single sampled species with
    // zero-length branches; families and the root label the matching clades.
    assert_eq!(
        newick,
        "((('Homo sapiens':1)Homo:0,('Pan troglodytes':1)Pan:0)Hominidae:1,\
         (('Mus musculus':2)Mus:0)Muridae:0)Mammalia;\n"
    );
}

#[test]
fn test_pipeline_nexus_output_round_trips() {
    let phylogeny = labeled_phylogeny();

    let mut out = Vec::new();
    write_tree(&mut out, &phylogeny, TreeFormat::Nexus).unwrap();
    let text = String::from_utf8(out).unwrap();

    let reparsed = read_tree_str(&text, TreeFormat::Nexus).unwrap();
    assert_eq!(reparsed.leaves().len(), 3);
    assert_eq!(reparsed.name(reparsed.root()), Some("Mammalia"));
    assert!(reparsed.find_name("Muridae").is_some());
    assert!(reparsed.find_name("Homo sapiens").is_some());
}

#[test]
fn test_pipeline_accepts_nexus_input() {
    let nexus = "#NEXUS\n\
        Begin trees;\n\
        \tTranslate\n\
        \t\t1 Homo_sapiens,\n\
        \t\t2 Pan_troglodytes,\n\
        \t\t3 Mus_musculus\n\
        \t\t;\n\
        \ttree tree1 = ((1:1,2:1):1,3:2);\n\
        End;\n";

    let mut phylogeny = read_tree_str(nexus, TreeFormat::Nexus).unwrap();
    let mut taxonomy = read_tree_str(TAXONOMY, TreeFormat::Newick).unwrap();

    let labels = label_tree(&mut phylogeny, &mut taxonomy, None);

    assert!(labels.contains("Hominidae"));
    assert!(labels.contains("Mammalia"));
    assert!(phylogeny.find_name("Hominidae").is_some());
}

#[test]
fn test_pipeline_with_taxonomy_root() {
    let mut phylogeny = read_tree_str(PHYLOGENY, TreeFormat::Newick).unwrap();
    let mut taxonomy = read_tree_str(TAXONOMY, TreeFormat::Newick).unwrap();

    let labels = label_tree(&mut phylogeny, &mut taxonomy, Some("Hominidae"));

    assert!(labels.contains("Homo"));
    assert!(labels.contains("Pan"));
    assert!(!labels.contains("Muridae"));
    assert!(!labels.contains("Mammalia"));
    assert!(phylogeny.find_name("Muridae").is_none());
}
