//! Report page URLs.

use report_harvest_models::ResolvedRange;

/// Builds the URL of a report page for one store and date window.
///
/// `{base}/{store_id}{report_path}?dateRange=custom&start={start}&end={end}`
#[must_use]
pub fn build_report_url(
    base_url: &str,
    store_id: &str,
    report_path: &str,
    range: &ResolvedRange,
) -> String {
    format!(
        "{}/{store_id}{report_path}?dateRange=custom&start={}&end={}",
        base_url.trim_end_matches('/'),
        range.start_iso(),
        range.end_iso()
    )
}
