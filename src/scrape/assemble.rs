use crate::schema::{
    indicator_names, DATA_SHEET, ENTITIES_SHEET, INDICATOR_COUNT, INFO_COLUMNS, INFO_SHEET,
};
use crate::scrape::extract::{
    column_labels, entity_links, extract_record, region_links, Confidence,
};
use crate::scrape::fetch::PageFetcher;
use crate::scrape::ScrapeError;
use crate::spreadsheet::{parse_number, write_workbook, Cell, Sheet};
use std::path::Path;
use tracing::{info, warn};

/// Index page listing every region, relative to the base URL.
pub const REGION_INDEX_PAGE: &str = "index.php?m=vpo";

/// Entity detail pages live under this directory of the base URL.
const ENTITY_DIR: &str = "_vpo/";

/// One complete entity record.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub name: String,
    pub values: Vec<String>,
}

/// Result of a crawl: the reference labels and every complete record.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AssembledDataset {
    pub labels: Vec<String>,
    pub records: Vec<Record>,
    /// Entities dropped because of fetch failures or incomplete records.
    pub skipped: usize,
}

/// Serial crawler over the monitoring site.
pub struct Assembler<F> {
    fetcher: F,
    base_url: String,
    reference_page: String,
}

impl<F: PageFetcher> Assembler<F> {
    /// `base_url` is joined with relative hrefs as-is, so it should end in `/`.
    pub fn new(fetcher: F, base_url: impl Into<String>, reference_page: impl Into<String>) -> Self {
        Self {
            fetcher,
            base_url: base_url.into(),
            reference_page: reference_page.into(),
        }
    }

    /// Crawls the index, the reference page, every region and every entity.
    ///
    /// Only the index and reference pages are required; a region or entity
    /// that fails to load or parse is logged and skipped.
    pub fn assemble(&self) -> Result<AssembledDataset, ScrapeError> {
        let index = self.fetcher.fetch(&format!("{}{}", self.base_url, REGION_INDEX_PAGE))?;
        let regions = region_links(&index)?;

        let reference_url = format!("{}{}", self.base_url, self.reference_page);
        let labels = column_labels(&self.fetcher.fetch(&reference_url)?)?;
        if labels.is_empty() {
            return Err(ScrapeError::NoLabels(reference_url));
        }
        if labels.len() != INDICATOR_COUNT {
            warn!(
                found = labels.len(),
                expected = INDICATOR_COUNT,
                "reference page label count differs from the schema"
            );
        }
        info!(regions = regions.len(), labels = labels.len(), "starting crawl");

        let mut dataset = AssembledDataset {
            labels,
            ..Default::default()
        };
        for region in &regions {
            let url = format!("{}{}", self.base_url, region.href);
            let entities = match self.fetcher.fetch(&url).and_then(|html| entity_links(&html)) {
                Ok(entities) => entities,
                Err(e) => {
                    warn!(region = %region.text, error = %e, "skipping region");
                    continue;
                }
            };

            for entity in &entities {
                let url = format!("{}{}{}", self.base_url, ENTITY_DIR, entity.href);
                let extraction = match self.fetcher.fetch(&url).and_then(|html| extract_record(&html)) {
                    Ok(extraction) => extraction,
                    Err(e) => {
                        warn!(entity = %entity.text, error = %e, "skipping entity");
                        dataset.skipped += 1;
                        continue;
                    }
                };
                if !extraction.is_complete(INDICATOR_COUNT) {
                    warn!(
                        entity = %entity.text,
                        values = extraction.values.len(),
                        issues = extraction.issues.len(),
                        "incomplete record excluded"
                    );
                    dataset.skipped += 1;
                    continue;
                }
                if extraction.confidence() == Confidence::Low {
                    warn!(entity = %entity.text, issues = ?extraction.issues, "low-confidence record");
                }
                dataset.records.push(Record {
                    name: entity.text.clone(),
                    values: extraction.values.into_iter().flatten().collect(),
                });
            }
            info!(region = %region.text, entities = entities.len(), "region done");
        }
        Ok(dataset)
    }
}

fn value_cell(raw: &str) -> Cell {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Cell::Empty
    } else {
        parse_number(trimmed).map_or_else(|| Cell::Text(trimmed.to_string()), Cell::Number)
    }
}

impl AssembledDataset {
    /// Sheets `data`, `about` and `entities`, ids starting at 1.
    pub fn sheets(&self) -> Vec<Sheet> {
        let mut header = vec!["id".to_string()];
        header.extend(indicator_names().iter().map(|s| s.to_string()));
        let mut data = Sheet::new(DATA_SHEET, header);
        let mut entities = Sheet::new(ENTITIES_SHEET, vec!["id".into(), "name".into()]);
        for (i, record) in self.records.iter().enumerate() {
            let id = (i + 1) as f64;
            let mut row = vec![Cell::Number(id)];
            row.extend(record.values.iter().map(|v| value_cell(v)));
            data.rows.push(row);
            entities
                .rows
                .push(vec![Cell::Number(id), Cell::Text(record.name.clone())]);
        }

        let mut about = Sheet::new(INFO_SHEET, INFO_COLUMNS.iter().map(|c| c.to_string()).collect());
        for (i, name) in indicator_names().iter().enumerate() {
            let description = self
                .labels
                .get(i)
                .map_or(Cell::Empty, |label| Cell::Text(label.clone()));
            about.rows.push(vec![
                Cell::Number((i + 1) as f64),
                Cell::Text(name.to_string()),
                description,
            ]);
        }
        vec![data, about, entities]
    }

    /// Overwrites the workbook at `path`.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), ScrapeError> {
        write_workbook(path.as_ref(), &self.sheets())?;
        info!(
            path = %path.as_ref().display(),
            records = self.records.len(),
            skipped = self.skipped,
            "dataset written"
        );
        Ok(())
    }
}
