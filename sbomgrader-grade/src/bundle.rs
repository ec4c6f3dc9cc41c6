//! [`CookbookBundle`] — an unordered set of [`Cookbook`]s with an optional
//! decisive member, deriving one overall [`Grade`] (spec.md §4.5).

use crate::cookbook::{Cookbook, CookbookResult};
use crate::grade::Grade;
use crate::ruleset::Format;
use sbomgrader_core::Document;

/// Composes several [`Cookbook`]s. If `decisive_cookbook` names a member,
/// the bundle's grade is exactly that cookbook's grade; otherwise it is the
/// worst grade across every member (spec.md §9, ambiguity 4).
#[derive(Debug, Clone, Default)]
pub struct CookbookBundle {
    pub cookbooks: Vec<Cookbook>,
    pub decisive_cookbook: Option<String>,
}

impl CookbookBundle {
    #[must_use]
    pub fn new(cookbooks: Vec<Cookbook>, decisive_cookbook: Option<String>) -> Self {
        CookbookBundle {
            cookbooks,
            decisive_cookbook,
        }
    }

    #[must_use]
    pub fn all_rules(&self) -> std::collections::HashSet<String> {
        self.cookbooks
            .iter()
            .flat_map(Cookbook::all_used_rule_names)
            .collect()
    }

    /// Grades `doc` against every member cookbook.
    pub fn call(&self, doc: &Document, format: &Format) -> CookbookBundleResult {
        let cookbook_results = self.cookbooks.iter().map(|c| c.call(doc, format)).collect();
        CookbookBundleResult {
            decisive_cookbook: self.decisive_cookbook.clone(),
            cookbook_results,
        }
    }
}

/// The per-cookbook results produced by one [`CookbookBundle::call`], plus
/// the derived overall [`Grade`].
#[derive(Debug, Clone)]
pub struct CookbookBundleResult {
    pub decisive_cookbook: Option<String>,
    pub cookbook_results: Vec<CookbookResult>,
}

impl CookbookBundleResult {
    /// The decisive cookbook's grade if named and present; otherwise the
    /// worst (lexicographically largest letter) grade across members
    /// (spec.md §9, ambiguity 4 — "worst grade across members", not the
    /// original Python source's raw character-code sort, though the two
    /// agree for this closed alphabet).
    #[must_use]
    pub fn grade(&self) -> Grade {
        if let Some(decisive) = &self.decisive_cookbook {
            if let Some(result) = self.cookbook_results.iter().find(|r| &r.cookbook_name == decisive) {
                return result.grade();
            }
        }
        self.cookbook_results
            .iter()
            .map(CookbookResult::grade)
            .max()
            .unwrap_or(Grade::A)
    }
}
