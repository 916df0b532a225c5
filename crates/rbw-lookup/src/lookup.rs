//! Batch lookup over a list of search terms

use serde_json::Value;
use tracing::debug;

use crate::client::Vault;
use crate::error::LookupError;
use crate::resolve::resolve_field;

/// Label used in error messages for the implicit default term
const DEFAULT_TERM_LABEL: &str = "<default>";

/// Look up every term and return one entry per term, in term order
///
/// Each entry is a list: the matched records when `field` is `None` or
/// empty, otherwise the values of `field` on those records. An empty
/// `terms` slice is a single lookup of the tool's default entry.
///
/// The vault must be unlocked before anything is fetched. A missing field
/// fails the whole batch only when no record in the batch has it; records
/// without the field are otherwise dropped from their entry.
pub fn lookup<V: Vault + ?Sized>(
    vault: &V,
    terms: &[String],
    field: Option<&str>,
) -> Result<Vec<Vec<Value>>, LookupError> {
    if !vault.is_unlocked()? {
        return Err(LookupError::Locked);
    }

    let field = field.filter(|f| !f.is_empty());
    let terms: Vec<Option<&str>> = if terms.is_empty() {
        vec![None]
    } else {
        terms.iter().map(|t| Some(t.as_str())).collect()
    };

    let mut results = Vec::with_capacity(terms.len());
    let mut matched = 0;
    let mut resolved = 0;

    for term in &terms {
        let matches = vault.fetch_matches(*term)?;
        matched += matches.len();

        let Some(field) = field else {
            results.push(matches);
            continue;
        };

        let values: Vec<Value> = matches
            .iter()
            .filter_map(|record| resolve_field(record, field))
            .map(|(location, value)| {
                debug!("Resolved {} from {}", field, location.name());
                value.clone()
            })
            .collect();

        resolved += values.len();
        results.push(values);
    }

    if let Some(field) = field {
        if matched > 0 && resolved == 0 {
            return Err(LookupError::FieldNotFound {
                field: field.to_string(),
                terms: terms
                    .iter()
                    .map(|t| t.unwrap_or(DEFAULT_TERM_LABEL).to_string())
                    .collect(),
            });
        }
    }

    Ok(results)
}

/// Reduce per-term entries to a single list of values
pub fn flatten(results: Vec<Vec<Value>>) -> Vec<Value> {
    results.into_iter().flatten().collect()
}
