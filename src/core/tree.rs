// --- File: src/core/tree.rs
use crate::core::newick::{parse_forest, NewickTree};
use crate::error::{ProjectionError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::warn;

/// Name of the synthetic node joining several trees into one forest.
pub const ROOT: &str = "ROOT";

const UNNAMED_PREFIX: &str = "unnamedNode";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub parent: Option<String>,
    pub children: BTreeSet<String>,
    pub annotations: BTreeSet<String>,
    pub branch_length: Option<f64>,
}

/// An immutable forest of language trees with cached root paths.
///
/// Several input trees hang below the synthetic `ROOT`. A single input tree
/// is not wrapped: its own root (named `ROOT` when unnamed) is the forest
/// root, so its children are the top-level families.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageTree {
    root: String,
    nodes: BTreeMap<String, TreeNode>,
    /// Ancestor chains; every cached path is a prefix of one of them.
    chains: Vec<Vec<String>>,
    paths: BTreeMap<String, PathSpan>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct PathSpan {
    chain: usize,
    len: usize,
}

// --- Builder: turns parsed Newick trees into the node table ---

struct TreeBuilder {
    nodes: BTreeMap<String, TreeNode>,
    unnamed: usize,
}

impl TreeBuilder {
    fn new() -> Self {
        Self { nodes: BTreeMap::new(), unnamed: 0 }
    }

    fn name_for(&mut self, name: Option<String>) -> String {
        name.unwrap_or_else(|| {
            let name = format!("{}{}", UNNAMED_PREFIX, self.unnamed);
            self.unnamed += 1;
            name
        })
    }

    /// Adds one parsed tree below `attach_to`. Nodes arrive in pre-order, so
    /// a parent is always named before its children. `root_name` replaces
    /// the tree root's own name.
    fn add_tree(&mut self, tree: NewickTree, root_name: Option<&str>, attach_to: Option<&str>) {
        let mut names: Vec<String> = Vec::with_capacity(tree.nodes().len());

        for (id, node) in tree.into_nodes().into_iter().enumerate() {
            let parent = match node.parent {
                Some(p) => Some(names[p].clone()),
                None => attach_to.map(str::to_string),
            };
            let name = match root_name {
                Some(name) if id == 0 => name.to_string(),
                _ => {
                    let name = self.name_for(node.name);
                    if self.nodes.contains_key(&name) {
                        warn!(node = %name, offset = node.offset, "duplicate node name in tree, paths may be wrong");
                    }
                    name
                }
            };

            if let Some(parent) = &parent {
                self.nodes.entry(parent.clone()).or_default().children.insert(name.clone());
            }
            let entry = self.nodes.entry(name.clone()).or_default();
            if parent.is_some() {
                entry.parent = parent;
            }
            entry.annotations.extend(node.annotations);
            if node.branch_length.is_some() {
                entry.branch_length = node.branch_length;
            }
            names.push(name);
        }
    }
}

impl LanguageTree {
    pub fn from_newick(text: &str) -> Result<Self> {
        Self::from_newick_sources([text])
    }

    /// Unions the trees of several Newick sources into one forest.
    pub fn from_newick_sources<I, S>(sources: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut trees = Vec::new();
        for source in sources {
            trees.extend(parse_forest(source.as_ref())?);
        }
        Ok(Self::from_trees(trees))
    }

    pub fn from_newick_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_newick(&text)
    }

    pub fn from_trees(mut trees: Vec<NewickTree>) -> Self {
        let mut builder = TreeBuilder::new();

        let root = if trees.len() == 1 {
            let tree = trees.remove(0);
            let name = tree.root().name.clone().unwrap_or_else(|| ROOT.to_string());
            builder.add_tree(tree, Some(&name), None);
            name
        } else {
            builder.nodes.insert(ROOT.to_string(), TreeNode::default());
            for tree in trees {
                if tree.root().name.as_deref() == Some(ROOT) {
                    builder.add_tree(tree, Some(ROOT), None);
                } else {
                    builder.add_tree(tree, None, Some(ROOT));
                }
            }
            ROOT.to_string()
        };

        let mut tree = Self {
            root,
            nodes: builder.nodes,
            chains: Vec::new(),
            paths: BTreeMap::new(),
        };
        tree.compute_paths();
        tree
    }

    /// One top-down pass from the root, each top-level node seeded with an
    /// empty path.
    ///
    /// A node's children share the path `path(node) + [node]`. It extends the
    /// chain holding `path(node)` when that chain still ends there, and is
    /// copied into a new chain otherwise, so a deep unbranched lineage costs
    /// one chain rather than one path per level.
    fn compute_paths(&mut self) {
        let mut chains: Vec<Vec<String>> = vec![Vec::new()];
        let mut paths = BTreeMap::new();
        let empty = PathSpan { chain: 0, len: 0 };
        paths.insert(self.root.clone(), empty);

        let mut stack: Vec<(String, PathSpan)> = self
            .top_level()
            .iter()
            .rev()
            .map(|name| (name.clone(), empty))
            .collect();

        while let Some((name, path)) = stack.pop() {
            if let Some(node) = self.nodes.get(&name) {
                if !node.children.is_empty() {
                    let chain = if chains[path.chain].len() == path.len {
                        path.chain
                    } else {
                        chains.push(chains[path.chain][..path.len].to_vec());
                        chains.len() - 1
                    };
                    chains[chain].push(name.clone());
                    let extended = PathSpan { chain, len: path.len + 1 };

                    for child in node.children.iter().rev() {
                        if *child == name || paths.contains_key(child) {
                            warn!(node = %child, "node already placed through a duplicate name, not descending");
                            continue;
                        }
                        stack.push((child.clone(), extended));
                    }
                }
            }
            paths.insert(name, path);
        }
        self.chains = chains;
        self.paths = paths;
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// Ancestors of `name` from just below the root down to its parent.
    pub fn path_from_root(&self, name: &str) -> Result<&[String]> {
        self.paths
            .get(name)
            .map(|span| &self.chains[span.chain][..span.len])
            .ok_or_else(|| ProjectionError::not_found(name))
    }

    pub fn node(&self, name: &str) -> Option<&TreeNode> {
        self.nodes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn parent(&self, name: &str) -> Option<&str> {
        self.nodes.get(name).and_then(|n| n.parent.as_deref())
    }

    pub fn children(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.nodes.get(name).map(|n| &n.children)
    }

    pub fn annotations(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.nodes.get(name).map(|n| &n.annotations)
    }

    /// The children of the root: one entry per family.
    pub fn top_level(&self) -> &BTreeSet<String> {
        static EMPTY: BTreeSet<String> = BTreeSet::new();
        self.children(&self.root).unwrap_or(&EMPTY)
    }

    /// Childless nodes other than the root, in name order.
    pub fn leaves(&self) -> impl Iterator<Item = &str> + '_ {
        self.nodes
            .iter()
            .filter(move |(name, node)| node.children.is_empty() && **name != self.root)
            .map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unnamed_single_root_leaves_are_top_level() {
        let tree = LanguageTree::from_newick("(A,B);").unwrap();
        assert_eq!(tree.root(), ROOT);
        assert!(tree.path_from_root("A").unwrap().is_empty());
        assert!(tree.path_from_root("B").unwrap().is_empty());
        assert_eq!(tree.parent("A"), Some(ROOT));
        assert_eq!(tree.top_level().len(), 2);
    }

    #[test]
    fn named_inner_node_is_family() {
        let tree = LanguageTree::from_newick("((A,B)X,C);").unwrap();
        assert_eq!(tree.path_from_root("A").unwrap(), ["X".to_string()]);
        assert_eq!(tree.path_from_root("B").unwrap(), ["X".to_string()]);
        assert!(tree.path_from_root("C").unwrap().is_empty());
    }

    #[test]
    fn several_trees_join_under_synthetic_root() {
        let tree = LanguageTree::from_newick("((A,B)W,C)F;\n(D,E)G;").unwrap();
        assert_eq!(tree.root(), ROOT);
        assert_eq!(tree.parent("F"), Some(ROOT));
        assert_eq!(tree.parent("G"), Some(ROOT));
        assert_eq!(tree.path_from_root("A").unwrap(), ["F".to_string(), "W".to_string()]);
        assert_eq!(tree.path_from_root("E").unwrap(), ["G".to_string()]);
        assert!(tree.path_from_root("F").unwrap().is_empty());
    }

    #[test]
    fn sources_are_unioned() {
        let tree = LanguageTree::from_newick_sources(["(A,B)F;", "(C,D)G;"]).unwrap();
        assert_eq!(tree.top_level().iter().cloned().collect::<Vec<_>>(), vec!["F", "G"]);
    }

    #[test]
    fn explicit_root_is_not_wrapped() {
        let tree = LanguageTree::from_newick("((A,B)F,(C,D)G)ROOT;").unwrap();
        assert_eq!(tree.root(), ROOT);
        assert_eq!(tree.path_from_root("A").unwrap(), ["F".to_string()]);
        assert!(!tree.contains("unnamedNode0"));
    }

    #[test]
    fn explicit_root_among_several_trees_is_merged() {
        let tree = LanguageTree::from_newick("((A,B)F)ROOT;\n(C,D)G;").unwrap();
        assert_eq!(tree.path_from_root("A").unwrap(), ["F".to_string()]);
        assert_eq!(tree.path_from_root("C").unwrap(), ["G".to_string()]);
        assert_eq!(tree.parent(ROOT), None);
    }

    #[test]
    fn unnamed_inner_nodes_get_unique_names() {
        let tree = LanguageTree::from_newick("((A,B),(C,D));").unwrap();
        let top: Vec<_> = tree.top_level().iter().cloned().collect();
        assert_eq!(top, vec!["unnamedNode0", "unnamedNode1"]);
        assert_eq!(tree.path_from_root("C").unwrap(), ["unnamedNode1".to_string()]);
    }

    #[test]
    fn children_are_ordered_by_name() {
        let tree = LanguageTree::from_newick("((z,a,m)F,b);").unwrap();
        let children: Vec<_> = tree.children("F").unwrap().iter().cloned().collect();
        assert_eq!(children, vec!["a", "m", "z"]);
    }

    #[test]
    fn annotations_and_lengths_do_not_change_topology() {
        let tree = LanguageTree::from_newick("((A:0.1#x,B:0.2)X:0.3#Germanic/West,C[iso=ccc]);").unwrap();
        assert_eq!(tree.path_from_root("A").unwrap(), ["X".to_string()]);
        let x = tree.node("X").unwrap();
        assert_eq!(x.branch_length, Some(0.3));
        assert!(x.annotations.contains("Germanic"));
        assert!(x.annotations.contains("West"));
        assert!(tree.annotations("C").unwrap().contains("iso=ccc"));
    }

    #[test]
    fn unknown_name_is_not_found() {
        let tree = LanguageTree::from_newick("(A,B);").unwrap();
        assert!(matches!(tree.path_from_root("Z"), Err(ProjectionError::NotFound { .. })));
    }

    #[test]
    fn leaves_exclude_inner_nodes() {
        let tree = LanguageTree::from_newick("((A,B)X,C);").unwrap();
        assert_eq!(tree.leaves().collect::<Vec<_>>(), vec!["A", "B", "C"]);
    }

    #[test]
    fn empty_input_is_a_bare_root() {
        let tree = LanguageTree::from_newick("").unwrap();
        assert_eq!(tree.len(), 1);
        assert!(tree.top_level().is_empty());
        assert_eq!(tree.leaves().count(), 0);
    }

    fn nested(depth: usize) -> String {
        let mut text = "(".repeat(depth);
        text.push('A');
        for i in 0..depth {
            text.push_str(&format!(")N{}", i));
        }
        text.push(';');
        text
    }

    #[test]
    fn deep_nesting_builds_full_paths() {
        let tree = LanguageTree::from_newick(&nested(10_000)).unwrap();
        assert_eq!(tree.root(), "N9999");
        assert_eq!(tree.len(), 10_001);

        let path = tree.path_from_root("A").unwrap();
        assert_eq!(path.len(), 9_999);
        assert_eq!(path[0], "N9998");
        assert_eq!(path[9_998], "N0");
        assert_eq!(tree.parent("A"), Some("N0"));
        assert_eq!(tree.path_from_root("N0").unwrap().len(), 9_998);
        assert!(tree.path_from_root("N9998").unwrap().is_empty());
    }

    #[test]
    fn siblings_below_a_branch_get_separate_paths() {
        let tree = LanguageTree::from_newick("(((A,B)X,(C)Y)F,(D)G);").unwrap();
        assert_eq!(tree.path_from_root("A").unwrap(), ["F".to_string(), "X".to_string()]);
        assert_eq!(tree.path_from_root("C").unwrap(), ["F".to_string(), "Y".to_string()]);
        assert_eq!(tree.path_from_root("D").unwrap(), ["G".to_string()]);
        assert_eq!(tree.path_from_root("Y").unwrap(), ["F".to_string()]);
    }

    #[test]
    fn self_parenting_duplicate_terminates() {
        let tree = LanguageTree::from_newick("((A)A,B);").unwrap();
        assert!(tree.path_from_root("A").is_ok());
    }
}
