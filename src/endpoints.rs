//! The API endpoint URIs.
//!
//! For endpoints that take a parameter, e.g., '/financial-records/{record_id}', use [format_endpoint].

/// The route for creating records.
pub const RECORDS: &str = "/financial-records";
/// The route for listing all of a user's records.
pub const RECORDS_BY_USER: &str = "/financial-records/getAllByUserID/{user_id}";
/// The route for updating or deleting a single record.
pub const RECORD: &str = "/financial-records/{record_id}";

/// Replace the first parameter in `endpoint_path` with `param`.
///
/// `param` is percent-encoded, so opaque IDs containing '/' or spaces still
/// form a single path segment.
///
/// # Examples
///
/// ```
/// use ledger_sync::endpoints::{RECORD, format_endpoint};
///
/// assert_eq!(format_endpoint(RECORD, "abc123"), "/financial-records/abc123");
/// assert_eq!(format_endpoint(RECORD, "a b"), "/financial-records/a%20b");
/// assert_eq!(format_endpoint("/no/params", "abc123"), "/no/params");
/// ```
pub fn format_endpoint(endpoint_path: &str, param: &str) -> String {
    let param_start = match endpoint_path.find('{') {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|end| param_start + end + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        urlencoding::encode(param),
        &endpoint_path[param_end..]
    )
}
