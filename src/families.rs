// File: src/families.rs
use crate::core::tree::LanguageTree;
use crate::core::types::LanguagePair;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// The family of `language`: the first node on its path below the root, or
/// the language itself when it hangs directly off the root.
pub fn family_of(tree: &LanguageTree, language: &str) -> Result<String> {
    let path = tree.path_from_root(language)?;
    Ok(path.first().cloned().unwrap_or_else(|| language.to_string()))
}

/// Language-to-family assignment for the languages of a dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FamilyIndex {
    families: BTreeMap<String, String>,
}

impl FamilyIndex {
    /// Languages missing from the tree become singleton families.
    pub fn from_tree<I, S>(tree: &LanguageTree, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut families = BTreeMap::new();
        for language in languages {
            let language = language.as_ref();
            let family = family_of(tree, language).unwrap_or_else(|e| {
                warn!(language, error = %e, "language not in tree, treating it as its own family");
                language.to_string()
            });
            families.insert(language.to_string(), family);
        }
        Self { families }
    }

    pub fn family(&self, language: &str) -> Option<&str> {
        self.families.get(language).map(String::as_str)
    }

    pub fn same_family(&self, a: &str, b: &str) -> bool {
        matches!((self.family(a), self.family(b)), (Some(x), Some(y)) if x == y)
    }

    /// Family name -> member languages.
    pub fn members(&self) -> BTreeMap<&str, BTreeSet<&str>> {
        let mut members: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for (language, family) in &self.families {
            members.entry(family.as_str()).or_default().insert(language.as_str());
        }
        members
    }

    /// Every ordered pair of distinct languages that share a family.
    pub fn same_family_pairs(&self) -> Vec<LanguagePair> {
        let mut pairs = Vec::new();
        for languages in self.members().values() {
            for &from in languages {
                for &to in languages {
                    if from != to {
                        pairs.push(LanguagePair::new(from, to));
                    }
                }
            }
        }
        pairs.sort();
        pairs
    }

    pub fn len(&self) -> usize {
        self.families.len()
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> LanguageTree {
        LanguageTree::from_newick("((deu,nld)Germanic,(fra,ita)Romance,eus);\n").unwrap()
    }

    #[test]
    fn family_is_first_ancestor() {
        let tree = tree();
        assert_eq!(family_of(&tree, "deu").unwrap(), "Germanic");
        assert_eq!(family_of(&tree, "ita").unwrap(), "Romance");
    }

    #[test]
    fn isolate_is_its_own_family() {
        assert_eq!(family_of(&tree(), "eus").unwrap(), "eus");
    }

    #[test]
    fn deep_languages_use_top_level_ancestor() {
        let tree = LanguageTree::from_newick("(((deu,nld)West,swe)Germanic,fin)IE;\n(hun,est)Uralic;").unwrap();
        assert_eq!(family_of(&tree, "deu").unwrap(), "IE");
        assert_eq!(family_of(&tree, "hun").unwrap(), "Uralic");
    }

    #[test]
    fn unknown_language_is_singleton() {
        let index = FamilyIndex::from_tree(&tree(), ["deu", "xyz"]);
        assert_eq!(index.family("xyz"), Some("xyz"));
        assert!(!index.same_family("deu", "xyz"));
    }

    #[test]
    fn pairs_stay_within_families() {
        let index = FamilyIndex::from_tree(&tree(), ["deu", "nld", "fra", "ita", "eus"]);
        let pairs = index.same_family_pairs();
        assert_eq!(pairs.len(), 4);
        assert!(pairs.contains(&LanguagePair::new("deu", "nld")));
        assert!(pairs.contains(&LanguagePair::new("nld", "deu")));
        assert!(!pairs.iter().any(|p| p.from == "eus" || p.to == "eus"));
        assert!(index.same_family("fra", "ita"));
    }
}
