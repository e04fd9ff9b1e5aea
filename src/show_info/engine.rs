//! Pattern-driven extraction of structured metadata from entry text
//!
//! The engine owns an immutable [`PatternCatalog`] and applies it to one
//! entry at a time. Extraction is total: it has no error channel, and
//! anything that goes wrong internally (a substring that fails numeric
//! parsing, an empty catalog) degrades to "no match" so best-effort
//! enrichment can never block guide ingestion.
//!
//! Every matching step prefers the entry's plot outline and falls back
//! to the full plot only when the outline yields no match.

use regex::Regex;
use tracing::debug;

use crate::models::{ProgramEntry, TextPropertyKind};
use crate::show_info::catalog::PatternCatalog;

/// Applies a compiled pattern catalog to program entries.
///
/// The catalog is moved in at construction and never mutated, so a
/// single engine can be shared across threads and applied to
/// independent entries concurrently.
#[derive(Debug, Clone)]
pub struct ExtractionEngine {
    catalog: PatternCatalog,
}

impl ExtractionEngine {
    pub fn new(catalog: PatternCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &PatternCatalog {
        &self.catalog
    }

    /// Fill the entry's unknown structured fields from its text.
    ///
    /// Fields already supplied by the upstream source are never
    /// overwritten; a second invocation on the same entry is a no-op.
    pub fn extract_from_entry(&self, entry: &mut ProgramEntry) {
        self.extract_season_episode(entry);
        self.extract_year(entry);
        self.extract_text_properties(entry);
    }

    /// Two-pass season/episode extraction: the master expression
    /// isolates a substring, the sub-patterns run against that substring
    /// only. Rule iteration stops once an episode number is known; a
    /// season number captured by an earlier rule survives a later rule
    /// that supplies only the episode.
    fn extract_season_episode(&self, entry: &mut ProgramEntry) {
        for rule in &self.catalog.season_episode_patterns {
            let master_text = matched_text(&entry.plot_outline, &entry.plot, &rule.master)
                .map(str::to_owned);

            if let Some(master_text) = master_text {
                if entry.season.is_none() {
                    if let Some(season_regex) = &rule.season {
                        if let Some(season) = captured_number(&master_text, season_regex) {
                            debug!(title = %entry.title, season, "extracted season number");
                            entry.season = Some(season);
                        }
                    }
                }

                if entry.episode.is_none() {
                    if let Some(episode) = captured_number(&master_text, &rule.episode) {
                        debug!(title = %entry.title, episode, "extracted episode number");
                        entry.episode = Some(episode);
                    }
                }
            }

            // Once we have at least an episode number we are done
            if entry.episode.is_some() {
                break;
            }
        }
    }

    /// First year pattern that matches and parses wins
    fn extract_year(&self, entry: &mut ProgramEntry) {
        if entry.year.is_some() {
            return;
        }

        for pattern in &self.catalog.year_patterns {
            let year = captures_in_texts(&entry.plot_outline, &entry.plot, pattern)
                .and_then(parse_number);

            if let Some(year) = year {
                debug!(title = %entry.title, year, "extracted year");
                entry.year = Some(year);
                break;
            }
        }
    }

    /// Resolve the three flags independently; each flag goes at most
    /// `false -> true` and is never reset by a later non-matching rule
    fn extract_text_properties(&self, entry: &mut ProgramEntry) {
        let is_new = entry.is_new || self.has_text_property(TextPropertyKind::New, entry);
        let is_live = entry.is_live || self.has_text_property(TextPropertyKind::Live, entry);
        let is_premiere =
            entry.is_premiere || self.has_text_property(TextPropertyKind::Premiere, entry);

        entry.is_new = is_new;
        entry.is_live = is_live;
        entry.is_premiere = is_premiere;
    }

    /// Scan title rules for this category first, then description
    /// rules; the first matching rule decides and ends the scan
    fn has_text_property(&self, kind: TextPropertyKind, entry: &ProgramEntry) -> bool {
        for (rule_kind, regex) in &self.catalog.title_patterns {
            if *rule_kind == kind && regex.is_match(&entry.title) {
                debug!(title = %entry.title, %kind, "title pattern matched");
                return true;
            }
        }

        for (rule_kind, regex) in &self.catalog.description_patterns {
            if *rule_kind == kind
                && (regex.is_match(&entry.plot_outline) || regex.is_match(&entry.plot))
            {
                debug!(title = %entry.title, %kind, "description pattern matched");
                return true;
            }
        }

        false
    }
}

/// Find `regex` in the short text, falling back to the long text only
/// when the short text yields no match; returns the whole matched
/// substring
fn matched_text<'t>(short_text: &'t str, long_text: &'t str, regex: &Regex) -> Option<&'t str> {
    regex
        .find(short_text)
        .or_else(|| regex.find(long_text))
        .map(|m| m.as_str())
}

/// Like [`matched_text`] but returns capture group 1 when the pattern
/// has one, so extraction patterns can isolate digits inside decoration
fn captures_in_texts<'t>(
    short_text: &'t str,
    long_text: &'t str,
    regex: &Regex,
) -> Option<&'t str> {
    regex
        .captures(short_text)
        .or_else(|| regex.captures(long_text))
        .and_then(|caps| caps.get(1).or_else(|| caps.get(0)))
        .map(|m| m.as_str())
}

/// Run a sub-pattern against master text and parse the captured value
fn captured_number(text: &str, regex: &Regex) -> Option<u32> {
    regex
        .captures(text)
        .and_then(|caps| caps.get(1).or_else(|| caps.get(0)))
        .map(|m| m.as_str())
        .and_then(parse_number)
}

/// Base-10 parse that treats failure as "no value extracted"
fn parse_number(text: &str) -> Option<u32> {
    match text.trim().parse::<u32>() {
        Ok(value) => Some(value),
        Err(_) => {
            debug!(text, "matched substring is not a valid number, ignoring");
            None
        }
    }
}
