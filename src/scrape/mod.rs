//! Collection of the indicator workbook from the public monitoring site.
//!
//! - [`fetch`]: page retrieval behind the [`PageFetcher`] seam.
//! - [`extract`]: anchor and table-cell extraction from fetched HTML.
//! - [`assemble`]: the serial crawl and the output workbook.

pub mod assemble;
pub mod extract;
pub mod fetch;

pub use assemble::{AssembledDataset, Assembler, Record, REGION_INDEX_PAGE};
pub use extract::{
    column_labels, entity_links, extract_record, region_links, Confidence, Extraction,
    ExtractionIssue, Link, ENTITY_PREFIX, REGION_PREFIX,
};
pub use fetch::{HttpFetcher, PageFetcher};

use crate::spreadsheet::SpreadsheetError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("invalid CSS selector '{0}'")]
    Selector(String),
    #[error("no indicator labels found on reference page {0}")]
    NoLabels(String),
    #[error(transparent)]
    Spreadsheet(#[from] SpreadsheetError),
}
