use serde::{Deserialize, Deserializer};
use std::io::Read;

/// One flattened catalog line: an evidence item with its parent standard and
/// assertion repeated alongside it.
#[derive(Debug, Deserialize)]
pub(crate) struct CatalogRow {
    pub(crate) standard_number: u32,
    pub(crate) standard_title: String,
    pub(crate) standard_description: String,
    pub(crate) assertion_ref: String,
    pub(crate) assertion_title: String,
    pub(crate) evidence_ref: String,
    pub(crate) input_type: String,
    pub(crate) mandatory: bool,
    pub(crate) approaching_mandatory: bool,
    #[serde(default)]
    pub(crate) new_in_v8: bool,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) exemptions: Option<String>,
    pub(crate) evidence_text: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) tooltip: Option<String>,
    pub(crate) plain_english_question: String,
    pub(crate) clinic_help: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub(crate) change_from_v7: Option<String>,
}

impl CatalogRow {
    pub(crate) fn exemption_tokens(&self) -> impl Iterator<Item = &str> {
        self.exemptions
            .as_deref()
            .unwrap_or_default()
            .split(';')
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }
}

pub(crate) fn parse_rows<R: Read>(reader: R) -> Result<Vec<CatalogRow>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    csv_reader.deserialize::<CatalogRow>().collect()
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
