use anyhow::{Context, Error, Result};
use std::collections::HashMap;
use std::io::Write;

use crate::formats::newick;
use crate::formats::newick::escape_label;
use crate::model::tree::Tree;

/// NEXUS file header
const NEXUS_HEADER: &str = "#NEXUS";

/// Parses the first tree from a NEXUS file.
///
/// Only what tree round-tripping needs is supported: the file must start
/// with `#NEXUS`, contain a TREES block, and the first TREE statement in
/// that block is read. An optional TRANSLATE command is honored by renaming
/// the leaves after the embedded Newick string is parsed. Keywords are
/// matched case-insensitively; rooting comments such as `[&R]` are skipped.
pub fn read(input: &str) -> Result<Tree> {
    let trimmed = input.trim_start();
    if trimmed.len() < NEXUS_HEADER.len()
        || !trimmed[..NEXUS_HEADER.len()].eq_ignore_ascii_case(NEXUS_HEADER)
    {
        return Err(Error::msg("Missing #NEXUS header"));
    }
    let body = &trimmed[NEXUS_HEADER.len()..];

    let mut in_trees = false;
    let mut translate: HashMap<String, String> = HashMap::new();

    for command in split_commands(body) {
        let command = command.trim();
        if command.is_empty() {
            continue;
        }

        let (keyword, rest) = match command.split_once(char::is_whitespace) {
            Some((keyword, rest)) => (keyword, rest),
            None => (command, ""),
        };

        match keyword.to_ascii_lowercase().as_str() {
            "begin" => in_trees = rest.trim().eq_ignore_ascii_case("trees"),
            "end" | "endblock" => in_trees = false,
            "translate" if in_trees => {
                translate = parse_translate(rest).context("Failed to parse TRANSLATE command")?;
            }
            "tree" if in_trees => {
                let (_, newick_text) = rest
                    .split_once('=')
                    .context("TREE statement is missing '='")?;

                // Commands were split on ';', so put the terminator back
                let mut tree = newick::read(&format!("{};", newick_text.trim()))
                    .context("Failed to parse Newick string of TREE statement")?;

                apply_translate(&mut tree, &translate);
                return Ok(tree);
            }
            _ => {}
        }
    }

    Err(Error::msg("No TREE statement found in a TREES block"))
}

/// Writes the tree as a NEXUS file with a TAXA block and a TREES block.
///
/// Leaf labels are written verbatim in the tree statement (quoted where
/// needed) rather than through a TRANSLATE table.
pub fn write<W: Write>(writer: &mut W, tree: &Tree) -> Result<()> {
    let labels: Vec<String> = tree
        .leaves()
        .into_iter()
        .filter_map(|leaf| tree.name(leaf).map(str::to_string))
        .collect();

    writeln!(writer, "{}", NEXUS_HEADER)?;
    writeln!(writer)?;
    writeln!(writer, "Begin taxa;")?;
    writeln!(writer, "\tDimensions ntax={};", labels.len())?;
    writeln!(writer, "\tTaxlabels")?;
    for label in &labels {
        writeln!(writer, "\t\t{}", escape_label(label))?;
    }
    writeln!(writer, "\t\t;")?;
    writeln!(writer, "End;")?;
    writeln!(writer, "Begin trees;")?;
    writeln!(writer, "\ttree tree1 = {}", newick::to_newick(tree))?;
    writeln!(writer, "End;")?;

    Ok(())
}

/// Splits the body of a NEXUS file into its ';'-terminated commands,
/// ignoring semicolons inside quoted labels and square-bracket comments.
fn split_commands(body: &str) -> Vec<&str> {
    let mut commands = Vec::new();
    let bytes = body.as_bytes();
    let mut start = 0;
    let mut in_quote = false;
    let mut in_comment = false;

    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'\'' if !in_comment => in_quote = !in_quote,
            b'[' if !in_quote => in_comment = true,
            b']' if !in_quote => in_comment = false,
            b';' if !in_quote && !in_comment => {
                commands.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }

    if start < body.len() {
        commands.push(&body[start..]);
    }

    commands
}

/// Parses the entries of a TRANSLATE command: comma-separated `key label`
/// pairs, where the label may be quoted.
fn parse_translate(entries: &str) -> Result<HashMap<String, String>> {
    let mut translation = HashMap::new();

    for entry in split_entries(entries) {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }

        let (key, label) = entry
            .split_once(char::is_whitespace)
            .with_context(|| format!("TRANSLATE entry \"{}\" has no label", entry))?;
        translation.insert(key.to_string(), unquote_label(label.trim()));
    }

    Ok(translation)
}

/// Splits TRANSLATE entries on commas outside quoted labels.
fn split_entries(entries: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let bytes = entries.as_bytes();
    let mut start = 0;
    let mut in_quote = false;

    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'\'' => in_quote = !in_quote,
            b',' if !in_quote => {
                parts.push(&entries[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }

    if start < entries.len() {
        parts.push(&entries[start..]);
    }

    parts
}

fn unquote_label(label: &str) -> String {
    if label.len() >= 2 && label.starts_with('\'') && label.ends_with('\'') {
        label[1..label.len() - 1].replace("''", "'")
    } else {
        label.to_string()
    }
}

/// Renames leaves whose label is a TRANSLATE key to the translated label.
fn apply_translate(tree: &mut Tree, translate: &HashMap<String, String>) {
    if translate.is_empty() {
        return;
    }

    for leaf in tree.leaves() {
        let translated = tree.name(leaf).and_then(|name| translate.get(name)).cloned();
        if let Some(label) = translated {
            tree.set_name(leaf, &label);
        }
    }
}
