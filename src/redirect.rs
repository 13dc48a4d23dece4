//! Extraction of gateway identifiers from a redirect URL.
//!
//! The payment gateway sends the user back with the transaction details in
//! the query string. Missing identifiers are a data condition, reported as
//! [`MissingParams`], never a panic or an infrastructure error.

use serde::Serialize;
use url::Url;

/// Identifiers read from the redirect query string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedirectParams {
    /// Payment or order reference (e.g. `purchase_order_id`, `invoice_no`).
    pub reference_id: String,
    /// Gateway transaction identifier (e.g. `pidx`).
    pub transaction_id: String,
    /// Gateway-reported status (e.g. `Completed`), if the flow reads one.
    pub status_hint: Option<String>,
}

/// Query parameter names for each identifier.
///
/// Each identifier accepts a list of names in priority order; the first one
/// carrying a non-empty value is used.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamNames {
    /// Names for the reference id.
    pub reference: Vec<String>,
    /// Names for the transaction id.
    pub transaction: Vec<String>,
    /// Name for the status hint.
    pub status: Option<String>,
}

/// Required identifiers that were absent or empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingParams {
    /// Parameter names that were looked for and not found.
    pub missing: Vec<String>,
}

impl std::fmt::Display for MissingParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "missing redirect parameters: {}", self.missing.join(", "))
    }
}

/// Read the redirect identifiers from `query`.
///
/// `query` can be a full URL, a query string with a leading `?`, or a bare
/// query string.
///
/// # Errors
///
/// Returns [`MissingParams`] if the reference or transaction id is absent.
pub fn extract_params(query: &str, names: &ParamNames) -> Result<RedirectParams, MissingParams> {
    let pairs = query_pairs(query);

    let reference_id = first_non_empty(&pairs, &names.reference);
    let transaction_id = first_non_empty(&pairs, &names.transaction);
    let status_hint = names
        .status
        .as_ref()
        .and_then(|name| first_non_empty(&pairs, std::slice::from_ref(name)));

    match (reference_id, transaction_id) {
        (Some(reference_id), Some(transaction_id)) => Ok(RedirectParams {
            reference_id,
            transaction_id,
            status_hint,
        }),
        (reference_id, transaction_id) => {
            let mut missing = Vec::new();
            if reference_id.is_none() {
                missing.push(describe(&names.reference));
            }
            if transaction_id.is_none() {
                missing.push(describe(&names.transaction));
            }
            Err(MissingParams { missing })
        }
    }
}

/// Decoded key/value pairs of the query component, in order.
fn query_pairs(query: &str) -> Vec<(String, String)> {
    let raw = match Url::parse(query) {
        Ok(url) => url.query().unwrap_or_default().to_string(),
        Err(_) => query.trim_start_matches('?').to_string(),
    };

    url::form_urlencoded::parse(raw.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.trim().to_string()))
        .collect()
}

/// First non-empty value among `names`, taking the first occurrence of each key.
fn first_non_empty(pairs: &[(String, String)], names: &[String]) -> Option<String> {
    names.iter().find_map(|name| {
        pairs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
            .filter(|v| !v.is_empty())
            .cloned()
    })
}

fn describe(names: &[String]) -> String {
    if names.is_empty() {
        "<unconfigured>".to_string()
    } else {
        names.join("|")
    }
}
