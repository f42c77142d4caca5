//! The DSPT reference catalog: standards, assertions and evidence items.
//!
//! The catalog is loaded once from a flat CSV export and never mutated. The
//! DSPT v8 (2025-26) GP practice dataset ships embedded in the binary.

mod parser;

use std::cmp::Ordering;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use serde::Serialize;

use super::domain::{Assertion, EvidenceItem, EvidenceItemId, Exemption, InputType, Standard};
use parser::CatalogRow;

const DSPT_V8_GP_CSV: &str = include_str!("../../../data/dspt-v8-gp.csv");

#[derive(Debug, thiserror::Error)]
pub enum CatalogImportError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid catalog CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: unrecognised {field} '{value}'")]
    InvalidField {
        row: usize,
        field: &'static str,
        value: String,
    },
    #[error("evidence item {0} appears more than once")]
    DuplicateEvidence(String),
    #[error("standard {0} is described inconsistently across rows")]
    InconsistentStandard(u32),
    #[error("assertion {0} is described inconsistently across rows")]
    InconsistentAssertion(String),
}

/// Counts reported after loading a catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub standards: usize,
    pub assertions: usize,
    pub evidence_items: usize,
}

/// Immutable, validated catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    standards: Vec<Standard>,
    assertions: Vec<Assertion>,
    items: Vec<EvidenceItem>,
    index: HashMap<EvidenceItemId, usize>,
}

impl Catalog {
    /// DSPT v8 GP practice (category 4) requirements.
    pub fn dspt_v8_gp() -> Result<Self, CatalogImportError> {
        CatalogImporter::from_reader(DSPT_V8_GP_CSV.as_bytes())
    }

    pub fn is_empty(&self) -> bool {
        self.standards.is_empty()
    }

    /// Standards ordered by number.
    pub fn standards(&self) -> &[Standard] {
        &self.standards
    }

    pub fn standard(&self, number: u32) -> Option<&Standard> {
        self.standards
            .iter()
            .find(|standard| standard.number == number)
    }

    pub fn assertions(&self) -> &[Assertion] {
        &self.assertions
    }

    pub fn items(&self) -> &[EvidenceItem] {
        &self.items
    }

    pub fn item(&self, id: &EvidenceItemId) -> Option<&EvidenceItem> {
        self.index.get(id).map(|position| &self.items[*position])
    }

    /// Items of one standard in dotted reference order (`1.3.2` before `1.3.13`).
    pub fn items_for_standard(&self, number: u32) -> Vec<&EvidenceItem> {
        let mut items: Vec<&EvidenceItem> = self
            .items
            .iter()
            .filter(|item| item.standard_number == number)
            .collect();
        items.sort_by(|a, b| compare_refs(&a.reference, &b.reference));
        items
    }

    pub fn total_items(&self) -> usize {
        self.items.len()
    }

    pub fn mandatory_items(&self) -> usize {
        self.items.iter().filter(|item| item.mandatory).count()
    }

    pub fn approaching_items(&self) -> usize {
        self.items
            .iter()
            .filter(|item| item.approaching_mandatory)
            .count()
    }

    pub fn seed_summary(&self) -> SeedSummary {
        SeedSummary {
            standards: self.standards.len(),
            assertions: self.assertions.len(),
            evidence_items: self.items.len(),
        }
    }
}

pub struct CatalogImporter;

impl CatalogImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Catalog, CatalogImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Catalog, CatalogImportError> {
        let rows = parser::parse_rows(reader)?;
        let mut catalog = Catalog::default();

        for (position, row) in rows.into_iter().enumerate() {
            // header is line 1
            apply_row(&mut catalog, row, position + 2)?;
        }

        catalog.standards.sort_by_key(|standard| standard.number);
        Ok(catalog)
    }
}

fn apply_row(
    catalog: &mut Catalog,
    row: CatalogRow,
    line: usize,
) -> Result<(), CatalogImportError> {
    let input_type =
        InputType::parse(&row.input_type).ok_or_else(|| CatalogImportError::InvalidField {
            row: line,
            field: "input_type",
            value: row.input_type.clone(),
        })?;

    let exemptions = row
        .exemption_tokens()
        .map(|token| {
            Exemption::parse(token).ok_or_else(|| CatalogImportError::InvalidField {
                row: line,
                field: "exemption",
                value: token.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let id = EvidenceItemId(row.evidence_ref.clone());
    if catalog.index.contains_key(&id) {
        return Err(CatalogImportError::DuplicateEvidence(row.evidence_ref));
    }

    let standard = catalog
        .standards
        .iter()
        .position(|standard| standard.number == row.standard_number);
    match standard {
        Some(position) => {
            let existing = &catalog.standards[position];
            if existing.title != row.standard_title
                || existing.description != row.standard_description
            {
                return Err(CatalogImportError::InconsistentStandard(row.standard_number));
            }
        }
        None => catalog.standards.push(Standard {
            number: row.standard_number,
            title: row.standard_title,
            description: row.standard_description,
        }),
    }

    let assertion = catalog
        .assertions
        .iter()
        .position(|assertion| assertion.reference == row.assertion_ref);
    match assertion {
        Some(position) => {
            let existing = &catalog.assertions[position];
            if existing.title != row.assertion_title
                || existing.standard_number != row.standard_number
            {
                return Err(CatalogImportError::InconsistentAssertion(row.assertion_ref));
            }
        }
        None => catalog.assertions.push(Assertion {
            reference: row.assertion_ref.clone(),
            title: row.assertion_title,
            standard_number: row.standard_number,
        }),
    }

    catalog.index.insert(id.clone(), catalog.items.len());
    catalog.items.push(EvidenceItem {
        id,
        reference: row.evidence_ref,
        assertion_ref: row.assertion_ref,
        standard_number: row.standard_number,
        input_type,
        evidence_text: row.evidence_text,
        tooltip: row.tooltip,
        plain_english_question: row.plain_english_question,
        clinic_help: row.clinic_help,
        mandatory: row.mandatory,
        approaching_mandatory: row.approaching_mandatory,
        exemptions,
        change_from_v7: row.change_from_v7,
        new_in_v8: row.new_in_v8,
    });

    Ok(())
}

/// Compares dotted references segment by segment, numerically where possible.
pub(crate) fn compare_refs(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => {
                let ordering = match (l.parse::<u32>(), r.parse::<u32>()) {
                    (Ok(l), Ok(r)) => l.cmp(&r),
                    _ => l.cmp(r),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
        }
    }
}
