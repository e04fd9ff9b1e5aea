//! Compiled pattern collections loaded from a show-info document
//!
//! The catalog is built once at service construction time and never
//! mutated afterwards; the engine takes it by ownership and only ever
//! reads it. Entry order within each collection is file order and acts
//! as rule priority.

use std::path::Path;

use regex::Regex;

use crate::errors::{PatternFileError, PatternFileResult};
use crate::models::TextPropertyKind;
use crate::show_info::loader;
use crate::utils::regex_guard::RegexGuard;

/// One season/episode extraction rule.
///
/// The master expression isolates the substring the sub-patterns are
/// then applied to. The episode sub-pattern is required; the season
/// sub-pattern is optional and independently toggled per rule.
#[derive(Debug, Clone)]
pub struct SeasonEpisodePattern {
    pub master: Regex,
    pub episode: Regex,
    pub season: Option<Regex>,
}

impl SeasonEpisodePattern {
    pub fn new(master: Regex, episode: Regex, season: Option<Regex>) -> Self {
        Self {
            master,
            episode,
            season,
        }
    }

    pub fn has_season_pattern(&self) -> bool {
        self.season.is_some()
    }
}

/// All patterns from one show-info document, compiled and ready to match
#[derive(Debug, Clone, Default)]
pub struct PatternCatalog {
    /// `name` attribute of the document root, used in diagnostics
    pub name: String,
    pub season_episode_patterns: Vec<SeasonEpisodePattern>,
    pub year_patterns: Vec<Regex>,
    pub title_patterns: Vec<(TextPropertyKind, Regex)>,
    pub description_patterns: Vec<(TextPropertyKind, Regex)>,
}

impl PatternCatalog {
    /// Load and compile a pattern document from disk.
    ///
    /// Structural problems (missing file, malformed XML, missing root or
    /// required sections) abort the whole load. Individual malformed
    /// entries inside valid sections are skipped with a logged warning
    /// and do not affect their siblings.
    pub fn load<P: AsRef<Path>>(path: P, guard: &RegexGuard) -> PatternFileResult<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(PatternFileError::Missing {
                path: path.to_path_buf(),
            });
        }

        let contents =
            std::fs::read_to_string(path).map_err(|source| PatternFileError::Unreadable {
                path: path.to_path_buf(),
                source,
            })?;

        Self::parse(&contents, guard)
    }

    /// Compile a pattern document already held in memory
    pub fn parse(contents: &str, guard: &RegexGuard) -> PatternFileResult<Self> {
        if contents.trim().is_empty() {
            return Err(PatternFileError::Empty);
        }

        loader::parse_pattern_document(contents, guard)
    }

    /// Total number of compiled rules across all collections
    pub fn rule_count(&self) -> usize {
        self.season_episode_patterns.len()
            + self.year_patterns.len()
            + self.title_patterns.len()
            + self.description_patterns.len()
    }
}
