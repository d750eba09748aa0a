use anyhow::{Context, Error, Result};
use std::io::Write;

use crate::model::tree::{Clade, NodeIndex, Tree};

/// Bytes that terminate an unquoted Newick label
const LABEL_DELIMITERS: &[u8] = b"()[],:; \t\n\r";

/// Bytes that force a label to be quoted when writing
const QUOTE_TRIGGERS: &[u8] = b"()[]',:; \t\n\r";

/// Parses a single Newick tree from the given string.
///
/// Supported grammar:
/// * tree ::= subtree ';'
/// * subtree ::= '(' subtree (',' subtree)* ')' [label] [':' number]
///             | label [':' number]
///
/// Multifurcations and named internal nodes are allowed. Labels may be
/// quoted with single quotes ('' escapes an embedded quote). Square-bracket
/// comments are skipped wherever whitespace may occur, and branch lengths
/// may use scientific notation.
pub fn read(input: &str) -> Result<Tree> {
    let mut scanner = Scanner::new(input);
    scanner.skip_trivia()?;

    if scanner.peek().is_none() {
        return Err(Error::msg("Empty Newick input"));
    }

    let mut tree = Tree::with_root(Clade::unnamed());
    let root = tree.root();
    parse_clade(&mut scanner, &mut tree, root)?;

    scanner.skip_trivia()?;
    if !scanner.consume_if(b';') {
        return Err(scanner.error("Expected ';' at end of tree"));
    }

    Ok(tree)
}

/// Returns the Newick representation of the tree, terminated with `;`.
pub fn to_newick(tree: &Tree) -> String {
    let mut out = String::new();
    build_newick(tree, tree.root(), &mut out);
    out.push(';');
    out
}

/// Writes the tree in Newick format, followed by a newline.
pub fn write<W: Write>(writer: &mut W, tree: &Tree) -> Result<()> {
    writer.write_all(to_newick(tree).as_bytes())?;
    writer.write_all(b"\n")?;
    Ok(())
}

fn build_newick(tree: &Tree, index: NodeIndex, out: &mut String) {
    let children = tree.children(index);
    if !children.is_empty() {
        out.push('(');
        for (i, &child) in children.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            build_newick(tree, child, out);
        }
        out.push(')');
    }

    if let Some(name) = tree.name(index) {
        out.push_str(&escape_label(name));
    }
    if let Some(branch_length) = tree.branch_length(index) {
        out.push(':');
        out.push_str(&branch_length.to_string());
    }
}

/// Quotes a label if it contains delimiters, doubling embedded quotes.
pub(crate) fn escape_label(label: &str) -> String {
    if label.bytes().any(|b| QUOTE_TRIGGERS.contains(&b)) {
        format!("'{}'", label.replace('\'', "''"))
    } else {
        label.to_string()
    }
}

/// Parses one subtree into the already-allocated node `index`.
fn parse_clade(scanner: &mut Scanner, tree: &mut Tree, index: NodeIndex) -> Result<()> {
    if scanner.peek() == Some(b'(') {
        scanner.bump();
        loop {
            scanner.skip_trivia()?;
            let child = tree.add_child(index, Clade::unnamed());
            parse_clade(scanner, tree, child)?;

            scanner.skip_trivia()?;
            if scanner.consume_if(b',') {
                continue;
            }
            if scanner.consume_if(b')') {
                break;
            }
            return Err(scanner.error("Expected ',' or ')' after clade"));
        }
        scanner.skip_trivia()?;
    }

    if let Some(label) = parse_label(scanner)? {
        tree.set_name(index, &label);
    }

    scanner.skip_trivia()?;
    if scanner.consume_if(b':') {
        scanner.skip_trivia()?;
        let branch_length = parse_number(scanner)?;
        tree.set_branch_length(index, Some(branch_length));
    }

    Ok(())
}

/// Parses an optional label, quoted or unquoted. Returns `None` if the
/// scanner is positioned at a delimiter (anonymous node).
fn parse_label(scanner: &mut Scanner) -> Result<Option<String>> {
    // Delimiters are all ASCII, so scanning byte-wise keeps multi-byte
    // UTF-8 sequences intact; the collected bytes are validated at the end.
    let mut raw: Vec<u8> = Vec::new();

    if scanner.peek() == Some(b'\'') {
        scanner.bump();
        loop {
            match scanner.bump() {
                Some(b'\'') => {
                    // '' is an escaped quote, a lone ' ends the label
                    if scanner.peek() == Some(b'\'') {
                        scanner.bump();
                        raw.push(b'\'');
                    } else {
                        break;
                    }
                }
                Some(b) => raw.push(b),
                None => return Err(scanner.error("Unterminated quoted label")),
            }
        }
    } else {
        while let Some(b) = scanner.peek() {
            if LABEL_DELIMITERS.contains(&b) {
                break;
            }
            raw.push(b);
            scanner.bump();
        }
    }

    if raw.is_empty() {
        return Ok(None);
    }

    let label = String::from_utf8(raw)
        .with_context(|| format!("Label ending at byte {} is not valid UTF-8", scanner.pos))?;
    Ok(Some(label))
}

/// Parses a branch length, accepting scientific notation.
fn parse_number(scanner: &mut Scanner) -> Result<f64> {
    let mut literal = String::new();
    while let Some(b) = scanner.peek() {
        if b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E') {
            literal.push(b as char);
            scanner.bump();
        } else {
            break;
        }
    }

    literal
        .parse::<f64>()
        .with_context(|| format!("Invalid branch length \"{}\" at byte {}", literal, scanner.pos))
}

/// Byte cursor over a Newick string.
struct Scanner<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Scanner {
            bytes: input.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek();
        if b.is_some() {
            self.pos += 1;
        }
        b
    }

    fn consume_if(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Skips whitespace and square-bracket comments.
    fn skip_trivia(&mut self) -> Result<()> {
        loop {
            match self.peek() {
                Some(b) if b.is_ascii_whitespace() => {
                    self.pos += 1;
                }
                Some(b'[') => {
                    self.pos += 1;
                    loop {
                        match self.bump() {
                            Some(b']') => break,
                            Some(_) => {}
                            None => return Err(self.error("Unterminated comment")),
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn error(&self, message: &str) -> Error {
        match self.peek() {
            Some(b) => Error::msg(format!(
                "{} at byte {} (found '{}')",
                message, self.pos, b as char
            )),
            None => Error::msg(format!("{} at byte {} (end of input)", message, self.pos)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_tree() {
        let tree = read("(A:1.0,(B:2.0,C:3.0)inner:4.0)root;").unwrap();

        let root = tree.root();
        assert_eq!(tree.name(root), Some("root"));
        assert_eq!(tree.children(root).len(), 2);

        let inner = tree.find_name("inner").unwrap();
        assert_eq!(tree.branch_length(inner), Some(4.0));
        assert_eq!(tree.children(inner).len(), 2);

        let b = tree.find_name("B").unwrap();
        assert!(tree.is_leaf(b));
        assert_eq!(tree.branch_length(b), Some(2.0));
    }

    #[test]
    fn test_parse_multifurcation() {
        let tree = read("(A,B,C,D);").unwrap();
        assert_eq!(tree.children(tree.root()).len(), 4);
        assert_eq!(tree.leaves().len(), 4);
    }

    #[test]
    fn test_parse_quoted_labels() {
        let tree = read("('Homo sapiens':1,'it''s':2);").unwrap();
        assert!(tree.find_name("Homo sapiens").is_some());
        assert!(tree.find_name("it's").is_some());
    }

    #[test]
    fn test_parse_skips_comments() {
        let tree = read("[&R] (A[comment]:1.0,B:2.0) [another] ;").unwrap();
        assert_eq!(tree.leaves().len(), 2);
        let a = tree.find_name("A").unwrap();
        assert_eq!(tree.branch_length(a), Some(1.0));
    }

    #[test]
    fn test_parse_scientific_notation() {
        let tree = read("(A:1.5e-10,B:2E3);").unwrap();
        let a = tree.find_name("A").unwrap();
        let b = tree.find_name("B").unwrap();
        assert_eq!(tree.branch_length(a), Some(1.5e-10));
        assert_eq!(tree.branch_length(b), Some(2000.0));
    }

    #[test]
    fn test_parse_single_leaf() {
        let tree = read("A;").unwrap();
        assert!(tree.is_leaf(tree.root()));
        assert_eq!(tree.name(tree.root()), Some("A"));
    }

    #[test]
    fn test_parse_errors() {
        assert!(read("").is_err());
        assert!(read("(A,B)").is_err());
        assert!(read("(A,B;").is_err());
        assert!(read("(A:abc,B);").is_err());
        assert!(read("('A,B);").is_err());
        assert!(read("[unterminated (A,B);").is_err());
    }

    #[test]
    fn test_round_trip() {
        let input = "(A:1,(B:2,C:3)inner:4)root;";
        let tree = read(input).unwrap();
        assert_eq!(to_newick(&tree), input);
    }

    #[test]
    fn test_write_quotes_labels_with_spaces() {
        let mut tree = Tree::with_root(Clade::unnamed());
        tree.add_child(tree.root(), Clade::named("Homo sapiens"));
        tree.add_child(tree.root(), Clade::named("Pan_troglodytes"));

        assert_eq!(to_newick(&tree), "('Homo sapiens',Pan_troglodytes);");
    }
}
