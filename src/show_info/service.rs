//! Fail-soft wrapper around catalog loading and the extraction engine
//!
//! Enrichment is best-effort: a missing or broken pattern document must
//! never take the host down with it. The service attempts the catalog
//! load once at construction, logs a single error on failure, and
//! degrades to a disabled no-op for the rest of the session.

use tracing::{error, info};

use crate::assets::PatternAssets;
use crate::config::{EnrichmentConfig, EngineConfig};
use crate::models::ProgramEntry;
use crate::show_info::catalog::PatternCatalog;
use crate::show_info::engine::ExtractionEngine;
use crate::utils::regex_guard::{RegexGuard, RegexGuardConfig};

pub struct ShowInfoService {
    engine: Option<ExtractionEngine>,
}

impl ShowInfoService {
    /// Build the service from configuration.
    ///
    /// Uses the configured pattern file when one is set, otherwise the
    /// pattern document embedded in the binary. Never fails: any load
    /// problem leaves the service disabled.
    pub fn new(enrichment: &EnrichmentConfig, engine: &EngineConfig) -> Self {
        if !enrichment.enabled {
            info!("show info extraction disabled by configuration");
            return Self { engine: None };
        }

        let guard = RegexGuard::new(RegexGuardConfig::from(engine));

        let catalog = match &enrichment.pattern_file {
            Some(path) => PatternCatalog::load(path, &guard),
            None => PatternCatalog::parse(&PatternAssets::default_pattern_document(), &guard),
        };

        match catalog {
            Ok(catalog) => {
                info!(
                    catalog = %catalog.name,
                    rules = catalog.rule_count(),
                    "show info pattern catalog loaded"
                );
                Self {
                    engine: Some(ExtractionEngine::new(catalog)),
                }
            }
            Err(e) => {
                error!(
                    pattern_file = ?enrichment.pattern_file,
                    "could not load show info pattern file: {e}"
                );
                Self { engine: None }
            }
        }
    }

    /// Wrap an already-built engine; used by callers that manage their
    /// own catalog loading
    pub fn from_engine(engine: ExtractionEngine) -> Self {
        Self {
            engine: Some(engine),
        }
    }

    /// Whether extraction will actually run for entries
    pub fn is_enabled(&self) -> bool {
        self.engine.is_some()
    }

    /// Enrich one entry in place; a no-op when the service is disabled
    pub fn extract_from_entry(&self, entry: &mut ProgramEntry) {
        if let Some(engine) = &self.engine {
            engine.extract_from_entry(entry);
        }
    }
}
