use clinicshield::error::AppError;
use clinicshield::questionnaire::{AnswerValues, Catalog, CatalogImporter};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Loads the catalog from `path` when given, otherwise the embedded DSPT v8 GP set.
pub(crate) fn load_catalog(path: Option<&Path>) -> Result<Catalog, AppError> {
    let catalog = match path {
        Some(path) => CatalogImporter::from_path(path)?,
        None => Catalog::dspt_v8_gp()?,
    };
    if catalog.is_empty() {
        return Err(AppError::Input("catalog contains no standards".to_string()));
    }
    Ok(catalog)
}

pub(crate) fn read_answer_values(path: &Path) -> Result<Vec<AnswerValues>, AppError> {
    let raw = std::fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|err| {
        AppError::Input(format!(
            "failed to parse answers in {}: {err}",
            path.display()
        ))
    })
}
