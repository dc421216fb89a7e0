//! Download-control selection.
//!
//! Controls are found by visible text or by position among the page's
//! download buttons. Class names and `data-baseweb` attributes change
//! between portal deploys and are never used.

use std::fmt;

use report_harvest_models::ReportType;

/// Identifies one download control on a report page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlSpec {
    /// The first visible button whose text contains this label.
    Labelled(String),
    /// The `index`-th visible button whose text contains `download_text`.
    Positional {
        /// Text shared by every download button.
        download_text: String,
        /// Zero-based position.
        index: usize,
    },
}

impl ControlSpec {
    /// Builds the spec for `report`, preferring its positional index when
    /// one is configured.
    #[must_use]
    pub fn for_report(report: &ReportType, download_text: &str) -> Self {
        report.control_index.map_or_else(
            || Self::Labelled(report.label.clone()),
            |index| Self::Positional {
                download_text: download_text.to_owned(),
                index,
            },
        )
    }

    /// XPath matching every candidate button; callers filter to visible
    /// ones and pick by [`ControlSpec::position`].
    #[must_use]
    pub fn xpath(&self) -> String {
        match self {
            Self::Labelled(label) => button_containing(label),
            Self::Positional { download_text, .. } => button_containing(download_text),
        }
    }

    /// Which visible match to use.
    #[must_use]
    pub const fn position(&self) -> usize {
        match self {
            Self::Labelled(_) => 0,
            Self::Positional { index, .. } => *index,
        }
    }
}

impl fmt::Display for ControlSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Labelled(label) => write!(f, "'{label}'"),
            Self::Positional {
                download_text,
                index,
            } => write!(f, "'{download_text}' #{index}"),
        }
    }
}

/// XPath for `<button>` elements whose normalized text contains `text`.
#[must_use]
pub fn button_containing(text: &str) -> String {
    format!(
        "//button[contains(normalize-space(.), {})]",
        xpath_literal(text)
    )
}

/// Quotes `s` as an XPath 1.0 string literal.
///
/// XPath 1.0 has no escape sequences, so a value containing both quote
/// characters is assembled with `concat()`.
#[must_use]
pub fn xpath_literal(s: &str) -> String {
    if !s.contains('\'') {
        return format!("'{s}'");
    }
    if !s.contains('"') {
        return format!("\"{s}\"");
    }
    let parts: Vec<String> = s
        .split('\'')
        .map(|part| format!("'{part}'"))
        .collect();
    format!("concat({})", parts.join(", \"'\", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(label: &str, control_index: Option<usize>) -> ReportType {
        ReportType {
            key: "sales".to_owned(),
            path: "/analytics/sales-v2".to_owned(),
            label: label.to_owned(),
            control_index,
        }
    }

    #[test]
    fn labelled_spec_matches_button_text() {
        let spec = ControlSpec::for_report(&report("下載銷售額", None), "下載");
        assert_eq!(spec, ControlSpec::Labelled("下載銷售額".to_owned()));
        assert_eq!(
            spec.xpath(),
            "//button[contains(normalize-space(.), '下載銷售額')]"
        );
        assert_eq!(spec.position(), 0);
    }

    #[test]
    fn positional_spec_uses_shared_download_text() {
        let spec = ControlSpec::for_report(&report("下載轉換率", Some(1)), "下載");
        assert_eq!(spec.xpath(), "//button[contains(normalize-space(.), '下載')]");
        assert_eq!(spec.position(), 1);
    }

    #[test]
    fn literal_quoting() {
        assert_eq!(xpath_literal("plain"), "'plain'");
        assert_eq!(xpath_literal("it's"), "\"it's\"");
        assert_eq!(
            xpath_literal(r#"a'b"c"#),
            r#"concat('a', "'", 'b"c')"#
        );
    }
}
