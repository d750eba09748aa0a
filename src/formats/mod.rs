pub mod newick;
pub mod nexus;

use anyhow::{Context, Result};
use std::io::{Read, Write};
use std::path::PathBuf;
use strum_macros::{Display, EnumString};

use crate::model::tree::Tree;
use crate::utils::files::open_read;

/// Tree serialization formats understood by the readers and writers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum TreeFormat {
    #[strum(serialize = "newick")]
    Newick,
    #[strum(serialize = "nexus")]
    Nexus,
}

/// Reads a tree from the file at `path` in the given format.
pub fn read_tree(path: &PathBuf, format: TreeFormat) -> Result<Tree> {
    let mut reader = open_read(path)?;
    let mut input = String::new();
    reader
        .read_to_string(&mut input)
        .with_context(|| format!("Failed to read file \"{}\"", path.display()))?;

    read_tree_str(&input, format)
        .with_context(|| format!("Failed to parse \"{}\" as {}", path.display(), format))
}

/// Reads a tree from a string in the given format.
pub fn read_tree_str(input: &str, format: TreeFormat) -> Result<Tree> {
    match format {
        TreeFormat::Newick => newick::read(input),
        TreeFormat::Nexus => nexus::read(input),
    }
}

/// Writes a tree in the given format.
pub fn write_tree<W: Write>(writer: &mut W, tree: &Tree, format: TreeFormat) -> Result<()> {
    match format {
        TreeFormat::Newick => newick::write(writer, tree),
        TreeFormat::Nexus => nexus::write(writer, tree),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_format_from_str() {
        assert_eq!(TreeFormat::from_str("newick").unwrap(), TreeFormat::Newick);
        assert_eq!(TreeFormat::from_str("nexus").unwrap(), TreeFormat::Nexus);
        assert!(TreeFormat::from_str("phyloxml").is_err());
    }

    #[test]
    fn test_format_display() {
        assert_eq!(TreeFormat::Newick.to_string(), "newick");
        assert_eq!(TreeFormat::Nexus.to_string(), "nexus");
    }

    #[test]
    fn test_dispatch_round_trip() {
        let tree = read_tree_str("(A:1,B:2)root;", TreeFormat::Newick).unwrap();

        let mut out = Vec::new();
        write_tree(&mut out, &tree, TreeFormat::Nexus).unwrap();
        let text = String::from_utf8(out).unwrap();

        let reparsed = read_tree_str(&text, TreeFormat::Nexus).unwrap();
        assert_eq!(reparsed.name(reparsed.root()), Some("root"));
        assert_eq!(reparsed.leaves().len(), 2);
    }
}
