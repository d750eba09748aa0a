use std::collections::{HashMap, HashSet};

use crate::model::tree::{Clade, NodeIndex, Tree};

/// Branch length given to clades inserted when a node has to carry more
/// than one taxonomic label. Zero-length branches mark such chains, so the
/// splitting logic also uses it to recognize them.
const SPLIT_BRANCH_LENGTH: f64 = 0.0;

/// Adds taxonomic labels to the phylogeny, in place.
///
/// Every named leaf of the phylogeny is matched by name against the
/// taxonomy. For each higher-order taxon (named taxonomy ancestor) of a
/// matched leaf, the most recent common ancestor of the taxon's members is
/// located in the phylogeny and named after the taxon. When that node
/// already carries a name, it is split into a chain of zero-length branches
/// so that each label gets a node of its own, ordered by taxonomic rank.
///
/// Underscores in names are replaced by spaces in both trees first, so the
/// two files may use either convention.
///
/// `taxonomy_root`, if given, should name a node of the taxonomy; the
/// taxonomy is then restricted to that subtree, which avoids taxonomic
/// homonym issues. An unknown name is reported on stderr and ignored.
///
/// Returns the set of names common to both trees: the matched species plus
/// every label that was applied.
pub fn label_tree(
    phylogeny: &mut Tree,
    taxonomy: &mut Tree,
    taxonomy_root: Option<&str>,
) -> HashSet<String> {
    phylogeny.normalize_names();
    taxonomy.normalize_names();

    if let Some(root_name) = taxonomy_root {
        let root_name = root_name.replace('_', " ");
        match taxonomy.find_name(&root_name) {
            Some(node) => taxonomy.set_root(node),
            None => eprintln!(
                "Warning: taxon \"{}\" not found in taxonomy, using the full taxonomy",
                root_name
            ),
        }
    }

    let species: Vec<NodeIndex> = phylogeny
        .leaves()
        .into_iter()
        .filter(|&leaf| phylogeny.name(leaf).is_some())
        .collect();

    // Map the species to the taxonomy and back
    let mut phylogeny_to_taxonomy: HashMap<NodeIndex, NodeIndex> = HashMap::new();
    let mut taxonomy_to_phylogeny: HashMap<NodeIndex, NodeIndex> = HashMap::new();
    for &sp in &species {
        if let Some(tax_node) = phylogeny.name(sp).and_then(|name| taxonomy.find_name(name)) {
            phylogeny_to_taxonomy.insert(sp, tax_node);
            taxonomy_to_phylogeny.insert(tax_node, sp);
        }
    }

    // Walk through the species, marking the common ancestor of every
    // taxonomic grouping they are a member of
    let mut done: HashSet<String> = HashSet::new();

    for &sp in &species {
        let Some(&tax_sp) = phylogeny_to_taxonomy.get(&sp) else {
            continue;
        };
        let Some(sp_name) = phylogeny.name(sp).map(str::to_string) else {
            continue;
        };
        if done.contains(&sp_name) {
            continue;
        }

        for group in taxonomy.ancestors(tax_sp) {
            let Some(group_name) = taxonomy.name(group).map(str::to_string) else {
                continue;
            };
            if done.contains(&group_name) {
                continue;
            }

            // The members of this grouping that are present in the phylogeny
            let fellows: Vec<NodeIndex> = taxonomy
                .descendants(group)
                .into_iter()
                .filter_map(|node| taxonomy_to_phylogeny.get(&node))
                .copied()
                .collect();

            let Some(group_root) = phylogeny.common_ancestor(&fellows) else {
                continue;
            };

            if phylogeny.name(group_root).is_none() {
                phylogeny.set_name(group_root, &group_name);
            } else {
                attach_extra_label(phylogeny, taxonomy, group_root, group, &group_name);
            }

            done.insert(group_name);
        }

        done.insert(sp_name);
    }

    done
}

/// Places `new_name` at a node that is already labeled, by growing the
/// chain of zero-length branches stacked on that node.
///
/// The chain consists of `group_root` plus every ancestor reached through
/// named, zero-length branches. If one of the chain's labels is an ancestor
/// of the new taxon in the taxonomy, the new (lower-ranked) label goes
/// below that node and adopts its children; otherwise the new label
/// outranks the chain and is inserted above its top.
fn attach_extra_label(
    phylogeny: &mut Tree,
    taxonomy: &Tree,
    group_root: NodeIndex,
    new_group: NodeIndex,
    new_name: &str,
) {
    // (phylogeny node, taxonomy node of its label), bottom-up
    let mut chain: Vec<(NodeIndex, Option<NodeIndex>)> = Vec::new();
    chain.push((
        group_root,
        phylogeny.name(group_root).and_then(|name| taxonomy.find_name(name)),
    ));
    for ancestor in phylogeny.ancestors(group_root) {
        if phylogeny.branch_length(ancestor) == Some(SPLIT_BRANCH_LENGTH)
            && phylogeny.name(ancestor).is_some()
        {
            chain.push((
                ancestor,
                phylogeny.name(ancestor).and_then(|name| taxonomy.find_name(name)),
            ));
        } else {
            break;
        }
    }

    let new_clade = Clade::new(Some(new_name), Some(SPLIT_BRANCH_LENGTH));
    let new_group_ancestors: HashSet<NodeIndex> = taxonomy.ancestors(new_group).into_iter().collect();

    for &(chain_node, old_group) in &chain {
        if let Some(old_group) = old_group {
            if new_group_ancestors.contains(&old_group) {
                // The label already placed here outranks the new one
                phylogeny.push_down_children(chain_node, new_clade);
                return;
            }
        }
    }

    // The new label outranks the whole chain
    let top = chain.last().map_or(group_root, |&(node, _)| node);
    phylogeny.insert_parent_above(top, new_clade);
}
