use std::mem;

/// Index of a clade in the tree arena
pub type NodeIndex = usize;

/// A single node of a rooted tree: an optional name, an optional branch
/// length (for the branch leading into the node), and links to its parent
/// and children.
///
/// Both leaves and internal nodes may carry a name; in a taxonomy the
/// internal names are the higher-order taxa.
#[derive(Debug, Clone, Default)]
pub struct Clade {
    pub name: Option<String>,
    pub branch_length: Option<f64>,
    parent: Option<NodeIndex>,
    children: Vec<NodeIndex>,
}

impl Clade {
    pub fn new(name: Option<&str>, branch_length: Option<f64>) -> Self {
        Clade {
            name: name.map(str::to_string),
            branch_length,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn named(name: &str) -> Self {
        Self::new(Some(name), None)
    }

    pub fn unnamed() -> Self {
        Self::new(None, None)
    }
}

/// A rooted tree of [Clade]s stored in an arena.
///
/// Nodes are addressed by [NodeIndex] into an append-only vector, so indices
/// held by callers stay valid across mutations; restructuring only rewires
/// parent/child links. Arity is arbitrary.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Clade>,
    root: NodeIndex,
}

impl Tree {
    /// Creates a tree consisting of the given root clade.
    pub fn with_root(clade: Clade) -> Self {
        Tree {
            nodes: vec![clade],
            root: 0,
        }
    }

    /// Appends a new clade as the last child of `parent`.
    pub fn add_child(&mut self, parent: NodeIndex, clade: Clade) -> NodeIndex {
        let index = self.nodes.len();
        self.nodes.push(clade);
        self.nodes[index].parent = Some(parent);
        self.nodes[parent].children.push(index);
        index
    }

    pub fn root(&self) -> NodeIndex {
        self.root
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn name(&self, index: NodeIndex) -> Option<&str> {
        self.nodes[index].name.as_deref()
    }

    pub fn set_name(&mut self, index: NodeIndex, name: &str) {
        self.nodes[index].name = Some(name.to_string());
    }

    pub fn branch_length(&self, index: NodeIndex) -> Option<f64> {
        self.nodes[index].branch_length
    }

    pub fn set_branch_length(&mut self, index: NodeIndex, branch_length: Option<f64>) {
        self.nodes[index].branch_length = branch_length;
    }

    pub fn parent(&self, index: NodeIndex) -> Option<NodeIndex> {
        self.nodes[index].parent
    }

    pub fn children(&self, index: NodeIndex) -> &[NodeIndex] {
        &self.nodes[index].children
    }

    pub fn is_leaf(&self, index: NodeIndex) -> bool {
        self.nodes[index].children.is_empty()
    }

    /// Returns the subtree rooted at `index` in preorder, including `index`.
    pub fn descendants(&self, index: NodeIndex) -> Vec<NodeIndex> {
        let mut order = Vec::new();
        let mut stack = vec![index];

        while let Some(node) = stack.pop() {
            order.push(node);
            for &child in self.nodes[node].children.iter().rev() {
                stack.push(child);
            }
        }

        order
    }

    /// Returns all leaves reachable from the root, in preorder.
    pub fn leaves(&self) -> Vec<NodeIndex> {
        self.descendants(self.root)
            .into_iter()
            .filter(|&node| self.is_leaf(node))
            .collect()
    }

    /// Returns the first node (preorder from the root) with the given name,
    /// searching leaves and internal nodes alike.
    pub fn find_name(&self, name: &str) -> Option<NodeIndex> {
        self.descendants(self.root)
            .into_iter()
            .find(|&node| self.name(node) == Some(name))
    }

    /// Returns the ancestors of `index`, immediate parent first, excluding
    /// `index` itself.
    pub fn ancestors(&self, index: NodeIndex) -> Vec<NodeIndex> {
        let mut chain = Vec::new();
        let mut current = index;

        while let Some(parent) = self.nodes[current].parent {
            chain.push(parent);
            current = parent;
        }

        chain
    }

    /// Returns the most recent common ancestor of the given nodes.
    ///
    /// For a single node this is the node itself. Returns `None` for an
    /// empty slice.
    pub fn common_ancestor(&self, nodes: &[NodeIndex]) -> Option<NodeIndex> {
        let &first = nodes.first()?;
        let mut shared = self.path_from_root(first);

        for &node in &nodes[1..] {
            let path = self.path_from_root(node);
            let common = shared
                .iter()
                .zip(path.iter())
                .take_while(|(a, b)| a == b)
                .count();
            shared.truncate(common);
            if shared.is_empty() {
                return None;
            }
        }

        shared.last().copied()
    }

    /// Detaches the subtree at `index` from its parent and makes it the new
    /// root. Nodes outside the subtree become unreachable.
    pub fn set_root(&mut self, index: NodeIndex) {
        if let Some(parent) = self.nodes[index].parent {
            self.nodes[parent].children.retain(|&child| child != index);
            self.nodes[index].parent = None;
        }
        self.root = index;
    }

    /// Inserts `clade` between `index` and its parent: the new node takes
    /// `index`'s position in the parent's child list (or becomes the root)
    /// and adopts `index` as its only child.
    pub fn insert_parent_above(&mut self, index: NodeIndex, clade: Clade) -> NodeIndex {
        let new_index = self.nodes.len();
        self.nodes.push(clade);

        match self.nodes[index].parent {
            Some(parent) => {
                for child in self.nodes[parent].children.iter_mut() {
                    if *child == index {
                        *child = new_index;
                    }
                }
                self.nodes[new_index].parent = Some(parent);
            }
            None => self.root = new_index,
        }

        self.nodes[new_index].children.push(index);
        self.nodes[index].parent = Some(new_index);

        new_index
    }

    /// Inserts `clade` below `index`: the new node adopts all of `index`'s
    /// children and becomes its only child.
    pub fn push_down_children(&mut self, index: NodeIndex, clade: Clade) -> NodeIndex {
        let new_index = self.nodes.len();
        self.nodes.push(clade);

        let adopted = mem::take(&mut self.nodes[index].children);
        for &child in &adopted {
            self.nodes[child].parent = Some(new_index);
        }

        self.nodes[new_index].children = adopted;
        self.nodes[new_index].parent = Some(index);
        self.nodes[index].children.push(new_index);

        new_index
    }

    /// Replaces underscores with spaces in all node names, so that labels
    /// written in either convention compare equal.
    pub fn normalize_names(&mut self) {
        for clade in &mut self.nodes {
            if let Some(name) = &mut clade.name {
                if name.contains('_') {
                    *name = name.replace('_', " ");
                }
            }
        }
    }

    fn path_from_root(&self, index: NodeIndex) -> Vec<NodeIndex> {
        let mut path = self.ancestors(index);
        path.reverse();
        path.push(index);
        path
    }
}
