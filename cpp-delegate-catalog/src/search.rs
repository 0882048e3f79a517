//! Fuzzy lookup over catalog names

use crate::catalog::TypeCatalog;
use serde::Serialize;
use strsim::levenshtein;

/// A fuzzy match suggestion with candidate name and edit distance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub candidate: String,
    pub distance: usize,
}

/// Which half of the catalog a search result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogSection {
    Attribute,
    Function,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub name: String,
    pub section: CatalogSection,
}

/// Suggest similar names from a list of candidates using fuzzy matching.
///
/// Returns candidates sorted by edit distance (closest first).
/// Exact matches are excluded. Case-insensitive matches get distance 0,
/// substring matches get distance 1, and Levenshtein matches use their
/// actual edit distance.
pub fn suggest_similar(name: &str, candidates: &[&str], max_distance: usize) -> Vec<Suggestion> {
    let name_lower = name.to_lowercase();
    let mut suggestions: Vec<Suggestion> = candidates
        .iter()
        .filter_map(|&candidate| {
            if candidate == name {
                return None;
            }
            let candidate_lower = candidate.to_lowercase();
            if candidate_lower == name_lower {
                return Some(Suggestion {
                    candidate: candidate.to_string(),
                    distance: 0,
                });
            }
            if candidate_lower.contains(&name_lower) || name_lower.contains(&candidate_lower) {
                return Some(Suggestion {
                    candidate: candidate.to_string(),
                    distance: 1,
                });
            }
            let dist = levenshtein(name, candidate);
            (dist <= max_distance).then(|| Suggestion {
                candidate: candidate.to_string(),
                distance: dist,
            })
        })
        .collect();
    suggestions.sort_by_key(|s| s.distance);
    suggestions
}

/// Case-insensitive substring search across attribute and function names.
pub fn search_catalog(catalog: &TypeCatalog, query: &str) -> Vec<SearchResult> {
    let q = query.to_lowercase();
    let attributes = catalog
        .attributes()
        .keys()
        .filter(|name| name.to_lowercase().contains(&q))
        .map(|name| SearchResult {
            name: name.clone(),
            section: CatalogSection::Attribute,
        });
    let table = catalog.functions();
    let functions = table
        .iter()
        .filter(|(_, f)| f.name.to_lowercase().contains(&q))
        .filter_map(|(opcode, _)| table.symbol(opcode))
        .map(|name| SearchResult {
            name,
            section: CatalogSection::Function,
        });
    attributes.chain(functions).collect()
}
