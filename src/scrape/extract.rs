//! Anchor and label/value extraction from monitoring pages.
//!
//! Detail pages are flat tables: a label cell (`td.n`) followed by its value
//! one cell later for the first six labels and two cells later for the rest.
//! Values are located by searching the label text among all `td` texts, so a
//! label whose text also occurs earlier on the page resolves to the wrong
//! cell. Such labels are reported as [`ExtractionIssue::AmbiguousLabel`].

use crate::scrape::ScrapeError;
use scraper::{Html, Selector};

/// Href prefix of region pages on the index page.
pub const REGION_PREFIX: &str = "_vpo/material.php?type=2";
/// Href prefix of entity detail pages on a region page.
pub const ENTITY_PREFIX: &str = "inst";

const LEADING_LABELS: usize = 6;

/// An anchor: display text and href.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Link {
    pub text: String,
    pub href: String,
}

fn selector(css: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(css).map_err(|_| ScrapeError::Selector(css.to_string()))
}

fn element_text(element: scraper::ElementRef<'_>) -> String {
    element.text().collect()
}

/// Anchors whose href starts with `prefix`, in document order.
///
/// A repeated text keeps its first position and its last href.
pub fn links_with_prefix(html: &str, prefix: &str) -> Result<Vec<Link>, ScrapeError> {
    let document = Html::parse_document(html);
    let anchors = selector("a[href]")?;
    let mut links: Vec<Link> = Vec::new();
    for anchor in document.select(&anchors) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if !href.starts_with(prefix) {
            continue;
        }
        let text = element_text(anchor).trim().to_string();
        match links.iter_mut().find(|l| l.text == text) {
            Some(existing) => existing.href = href.to_string(),
            None => links.push(Link {
                text,
                href: href.to_string(),
            }),
        }
    }
    Ok(links)
}

pub fn region_links(html: &str) -> Result<Vec<Link>, ScrapeError> {
    links_with_prefix(html, REGION_PREFIX)
}

pub fn entity_links(html: &str) -> Result<Vec<Link>, ScrapeError> {
    links_with_prefix(html, ENTITY_PREFIX)
}

/// Stripped texts of every `td.n` label cell.
pub fn column_labels(html: &str) -> Result<Vec<String>, ScrapeError> {
    let document = Html::parse_document(html);
    let labels = selector("td.n")?;
    Ok(document
        .select(&labels)
        .map(|td| element_text(td).trim().to_string())
        .collect())
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExtractionIssue {
    /// The label text does not occur among the cell texts.
    LabelNotFound { label: String },
    /// The value position lies past the last cell.
    ValueOutOfRange { label: String, position: usize },
    /// The label text occurs more than once; the first occurrence was used.
    AmbiguousLabel { label: String, occurrences: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Confidence {
    High,
    Low,
}

/// Best-effort record extracted from one detail page.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Extraction {
    /// One slot per label; `None` where the value could not be located.
    pub values: Vec<Option<String>>,
    pub issues: Vec<ExtractionIssue>,
}

impl Extraction {
    /// True when every one of `expected` values was located.
    pub fn is_complete(&self, expected: usize) -> bool {
        self.values.len() == expected && self.values.iter().all(Option::is_some)
    }

    pub fn confidence(&self) -> Confidence {
        if self.issues.is_empty() {
            Confidence::High
        } else {
            Confidence::Low
        }
    }
}

/// Locates the value of every `td.n` label on a detail page.
pub fn extract_record(html: &str) -> Result<Extraction, ScrapeError> {
    let document = Html::parse_document(html);
    let cells: Vec<String> = document.select(&selector("td")?).map(element_text).collect();
    let labels: Vec<String> = document
        .select(&selector("td.n")?)
        .map(element_text)
        .collect();

    let mut extraction = Extraction::default();
    for (i, label) in labels.iter().enumerate() {
        let offset = if i < LEADING_LABELS { 1 } else { 2 };
        let Some(first) = cells.iter().position(|c| c == label) else {
            extraction.issues.push(ExtractionIssue::LabelNotFound {
                label: label.clone(),
            });
            extraction.values.push(None);
            continue;
        };

        let occurrences = cells.iter().filter(|c| *c == label).count();
        if occurrences > 1 {
            extraction.issues.push(ExtractionIssue::AmbiguousLabel {
                label: label.clone(),
                occurrences,
            });
        }

        let position = first + offset;
        match cells.get(position) {
            Some(value) => extraction.values.push(Some(value.clone())),
            None => {
                extraction.issues.push(ExtractionIssue::ValueOutOfRange {
                    label: label.clone(),
                    position,
                });
                extraction.values.push(None);
            }
        }
    }
    Ok(extraction)
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX: &str = r#"
        <html><body>
          <a href="_vpo/material.php?type=2&id=10">Region A</a>
          <a href="about.php">About</a>
          <a href="_vpo/material.php?type=2&id=20"> Region B </a>
          <a href="_vpo/material.php?type=1&id=30">Other</a>
        </body></html>"#;

    fn detail_page(values: &[&str]) -> String {
        let mut rows = String::new();
        for (i, value) in values.iter().enumerate() {
            if i < LEADING_LABELS {
                rows.push_str(&format!(
                    "<tr><td class=\"n\">L{i}</td><td>{value}</td></tr>"
                ));
            } else {
                rows.push_str(&format!(
                    "<tr><td class=\"n\">L{i}</td><td>unit</td><td>{value}</td></tr>"
                ));
            }
        }
        format!("<html><body><table>{rows}</table></body></html>")
    }

    #[test]
    fn test_region_links_filtered_by_prefix() {
        let links = region_links(INDEX).unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].text, "Region A");
        assert_eq!(links[0].href, "_vpo/material.php?type=2&id=10");
        assert_eq!(links[1].text, "Region B");
    }

    #[test]
    fn test_entity_links() {
        let html = r#"<a href="inst.php?id=1">Uni 1</a><a href="x.php">no</a><a href="inst.php?id=2">Uni 2</a>"#;
        let links = entity_links(html).unwrap();
        assert_eq!(
            links.iter().map(|l| l.href.as_str()).collect::<Vec<_>>(),
            vec!["inst.php?id=1", "inst.php?id=2"]
        );
    }

    #[test]
    fn test_column_labels_are_stripped() {
        let html = r#"<table><tr><td class="n">  Label one </td><td>1</td></tr>
                      <tr><td class="n">Label two</td><td>2</td></tr></table>"#;
        assert_eq!(column_labels(html).unwrap(), vec!["Label one", "Label two"]);
    }

    #[test]
    fn test_extract_record_offsets() {
        let values: Vec<String> = (0..8).map(|i| format!("{}", 100 + i)).collect();
        let refs: Vec<&str> = values.iter().map(String::as_str).collect();
        let extraction = extract_record(&detail_page(&refs)).unwrap();

        assert!(extraction.is_complete(8));
        assert_eq!(extraction.confidence(), Confidence::High);
        let got: Vec<&str> = extraction.values.iter().map(|v| v.as_deref().unwrap()).collect();
        assert_eq!(got, refs);
    }

    #[test]
    fn test_ambiguous_label_lowers_confidence() {
        // value of L0 equals the text of label L7
        let page = detail_page(&["L7", "1", "2", "3", "4", "5", "6", "7"]);
        let extraction = extract_record(&page).unwrap();
        assert_eq!(extraction.confidence(), Confidence::Low);
        assert!(extraction
            .issues
            .iter()
            .any(|i| matches!(i, ExtractionIssue::AmbiguousLabel { label, .. } if label == "L7")));
        // first occurrence wins: L7 resolves two cells after the L0 value cell
        assert_eq!(extraction.values[7].as_deref(), Some("1"));
    }

    #[test]
    fn test_value_out_of_range_is_incomplete() {
        let html = r#"<table><tr><td>a</td></tr><tr><td class="n">last</td></tr></table>"#;
        let extraction = extract_record(html).unwrap();
        assert!(!extraction.is_complete(1));
        assert!(matches!(
            extraction.issues[0],
            ExtractionIssue::ValueOutOfRange { position: 2, .. }
        ));
    }
}
