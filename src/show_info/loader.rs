//! Streaming parser for show-info pattern documents
//!
//! Uses quick-xml's event API rather than serde deserialization: the
//! document is tiny but every entry needs individual accept/skip
//! decisions with diagnostics, which maps naturally onto the event loop.
//!
//! Structural failures (missing root, missing required sections) abort
//! the load; anything wrong with a single entry skips that entry only.

use std::collections::HashMap;
use std::str::FromStr;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::{debug, error, warn};

use crate::errors::{PatternFileError, PatternFileResult};
use crate::models::TextPropertyKind;
use crate::show_info::catalog::{PatternCatalog, SeasonEpisodePattern};
use crate::utils::regex_guard::RegexGuard;

/// Accumulates `<master>`/`<episode>`/`<season>` children of one
/// `<seasonEpisode>` entry before validation. `Some("")` records an
/// element that was present with an empty `pattern` attribute, which is
/// handled differently from an absent element.
#[derive(Debug, Default)]
struct SeasonEpisodeDraft {
    master: Option<String>,
    episode: Option<String>,
    season: Option<String>,
}

/// Parse a pattern document into a compiled catalog
pub fn parse_pattern_document(
    contents: &str,
    guard: &RegexGuard,
) -> PatternFileResult<PatternCatalog> {
    let mut reader = Reader::from_str(contents);
    reader.config_mut().trim_text(true);

    let mut catalog = PatternCatalog::default();
    let mut doc_name = String::new();
    let mut saw_root = false;
    let mut saw_season_episodes = false;
    let mut season_episode_entries = 0usize;
    let mut saw_years = false;
    let mut year_entries = 0usize;
    let mut current_rule: Option<SeasonEpisodeDraft> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match element_name(e)?.as_str() {
                "showInfo" => {
                    saw_root = true;
                    doc_name = parse_attributes(e)
                        .get("name")
                        .cloned()
                        .unwrap_or_default();
                }
                "seasonEpisodes" => saw_season_episodes = true,
                "seasonEpisode" => {
                    season_episode_entries += 1;
                    current_rule = Some(SeasonEpisodeDraft::default());
                }
                "master" | "episode" | "season" => {
                    record_sub_pattern(&mut current_rule, &element_name(e)?, e);
                }
                "years" => saw_years = true,
                "year" => {
                    year_entries += 1;
                    add_year_pattern(e, &doc_name, guard, &mut catalog);
                }
                "textProperty" => {
                    add_text_property(e, &doc_name, guard, &mut catalog);
                }
                _ => {}
            },

            Ok(Event::Empty(ref e)) => match element_name(e)?.as_str() {
                "showInfo" => {
                    saw_root = true;
                    doc_name = parse_attributes(e)
                        .get("name")
                        .cloned()
                        .unwrap_or_default();
                }
                "seasonEpisodes" => saw_season_episodes = true,
                "seasonEpisode" => {
                    // Self-closing entry carries no children; finalize
                    // rejects it with the missing-master diagnostic
                    season_episode_entries += 1;
                    finalize_season_episode(
                        SeasonEpisodeDraft::default(),
                        &doc_name,
                        guard,
                        &mut catalog,
                    );
                }
                "master" | "episode" | "season" => {
                    record_sub_pattern(&mut current_rule, &element_name(e)?, e);
                }
                "years" => saw_years = true,
                "year" => {
                    year_entries += 1;
                    add_year_pattern(e, &doc_name, guard, &mut catalog);
                }
                "textProperty" => {
                    add_text_property(e, &doc_name, guard, &mut catalog);
                }
                _ => {}
            },

            Ok(Event::End(ref e)) => {
                let name = std::str::from_utf8(e.name().as_ref())
                    .map_err(|e| PatternFileError::Malformed {
                        message: format!("invalid UTF-8 in element name: {e}"),
                    })?
                    .to_string();

                if name == "seasonEpisode" {
                    if let Some(draft) = current_rule.take() {
                        finalize_season_episode(draft, &doc_name, guard, &mut catalog);
                    }
                }
            }

            Ok(Event::Eof) => break,

            Err(e) => {
                return Err(PatternFileError::Malformed {
                    message: e.to_string(),
                });
            }

            _ => {} // Ignore text, comments, processing instructions, etc.
        }
    }

    if !saw_root {
        return Err(PatternFileError::MissingRoot);
    }
    if doc_name.is_empty() {
        return Err(PatternFileError::MissingName);
    }
    catalog.name = doc_name;
    if !saw_season_episodes {
        return Err(PatternFileError::MissingSection {
            section: "seasonEpisodes",
        });
    }
    if season_episode_entries == 0 {
        return Err(PatternFileError::EmptySection {
            section: "seasonEpisodes",
            entry: "seasonEpisode",
        });
    }
    if !saw_years {
        return Err(PatternFileError::MissingSection { section: "years" });
    }
    if year_entries == 0 {
        return Err(PatternFileError::EmptySection {
            section: "years",
            entry: "year",
        });
    }

    debug!(
        catalog = %catalog.name,
        season_episode_rules = catalog.season_episode_patterns.len(),
        year_rules = catalog.year_patterns.len(),
        title_rules = catalog.title_patterns.len(),
        description_rules = catalog.description_patterns.len(),
        "pattern document loaded"
    );

    Ok(catalog)
}

/// Record a `pattern` attribute on a child of the current `<seasonEpisode>`
fn record_sub_pattern(
    current_rule: &mut Option<SeasonEpisodeDraft>,
    element_name: &str,
    element: &BytesStart,
) {
    let Some(draft) = current_rule.as_mut() else {
        // Child element outside a <seasonEpisode> entry; nothing to attach it to
        return;
    };

    let pattern = parse_attributes(element)
        .get("pattern")
        .cloned()
        .unwrap_or_default();

    match element_name {
        "master" => draft.master = Some(pattern),
        "episode" => draft.episode = Some(pattern),
        "season" => draft.season = Some(pattern),
        _ => {}
    }
}

/// Validate and compile one `<seasonEpisode>` entry, skipping it on any
/// per-entry problem
fn finalize_season_episode(
    draft: SeasonEpisodeDraft,
    catalog_name: &str,
    guard: &RegexGuard,
    catalog: &mut PatternCatalog,
) {
    let Some(master_pattern) = draft.master else {
        warn!(
            catalog = catalog_name,
            "could not find <master> element, skipping seasonEpisode entry"
        );
        return;
    };

    let Some(episode_pattern) = draft.episode else {
        warn!(
            catalog = catalog_name,
            "could not find <episode> element, skipping seasonEpisode entry"
        );
        return;
    };

    if master_pattern.is_empty() || episode_pattern.is_empty() {
        warn!(
            catalog = catalog_name,
            "empty master or episode pattern attribute, skipping seasonEpisode entry"
        );
        return;
    }

    let master = match guard.compile(&master_pattern) {
        Ok(regex) => regex,
        Err(reason) => {
            error!(
                catalog = catalog_name,
                pattern = %master_pattern,
                %reason,
                "invalid master pattern, skipping seasonEpisode entry"
            );
            return;
        }
    };

    let episode = match guard.compile(&episode_pattern) {
        Ok(regex) => regex,
        Err(reason) => {
            error!(
                catalog = catalog_name,
                pattern = %episode_pattern,
                %reason,
                "invalid episode pattern, skipping seasonEpisode entry"
            );
            return;
        }
    };

    let season = match draft.season {
        None => None,
        Some(pattern) if pattern.is_empty() => {
            warn!(
                catalog = catalog_name,
                "empty season pattern attribute, keeping episode-only rule"
            );
            None
        }
        Some(pattern) => match guard.compile(&pattern) {
            Ok(regex) => Some(regex),
            Err(reason) => {
                error!(
                    catalog = catalog_name,
                    pattern = %pattern,
                    %reason,
                    "invalid season pattern, keeping episode-only rule"
                );
                None
            }
        },
    };

    debug!(
        catalog = catalog_name,
        master = %master_pattern,
        episode = %episode_pattern,
        has_season = season.is_some(),
        "adding seasonEpisode pattern"
    );

    catalog
        .season_episode_patterns
        .push(SeasonEpisodePattern::new(master, episode, season));
}

/// Validate and compile one `<year>` entry
fn add_year_pattern(
    element: &BytesStart,
    catalog_name: &str,
    guard: &RegexGuard,
    catalog: &mut PatternCatalog,
) {
    let pattern = parse_attributes(element)
        .get("pattern")
        .cloned()
        .unwrap_or_default();

    if pattern.is_empty() {
        warn!(
            catalog = catalog_name,
            "empty year pattern attribute, skipping entry"
        );
        return;
    }

    match guard.compile(&pattern) {
        Ok(regex) => {
            debug!(catalog = catalog_name, pattern = %pattern, "adding year pattern");
            catalog.year_patterns.push(regex);
        }
        Err(reason) => {
            error!(
                catalog = catalog_name,
                pattern = %pattern,
                %reason,
                "invalid year pattern, skipping entry"
            );
        }
    }
}

/// Validate and compile one `<textProperty>` entry, which may contribute
/// a title rule, a description rule, or both
fn add_text_property(
    element: &BytesStart,
    catalog_name: &str,
    guard: &RegexGuard,
    catalog: &mut PatternCatalog,
) {
    let attrs = parse_attributes(element);

    let type_value = attrs.get("type").cloned().unwrap_or_default();
    if type_value.is_empty() {
        return;
    }

    let Ok(kind) = TextPropertyKind::from_str(&type_value) else {
        debug!(
            catalog = catalog_name,
            r#type = %type_value,
            "unrecognized textProperty type, skipping entry"
        );
        return;
    };

    let title_pattern = attrs.get("titlePattern").cloned().unwrap_or_default();
    if !title_pattern.is_empty() {
        match guard.compile(&title_pattern) {
            Ok(regex) => {
                debug!(
                    catalog = catalog_name,
                    kind = %kind,
                    pattern = %title_pattern,
                    "adding title textProperty pattern"
                );
                catalog.title_patterns.push((kind, regex));
            }
            Err(reason) => {
                error!(
                    catalog = catalog_name,
                    pattern = %title_pattern,
                    %reason,
                    "invalid titlePattern, skipping"
                );
            }
        }
    }

    let desc_pattern = attrs.get("descPattern").cloned().unwrap_or_default();
    if !desc_pattern.is_empty() {
        match guard.compile(&desc_pattern) {
            Ok(regex) => {
                debug!(
                    catalog = catalog_name,
                    kind = %kind,
                    pattern = %desc_pattern,
                    "adding description textProperty pattern"
                );
                catalog.description_patterns.push((kind, regex));
            }
            Err(reason) => {
                error!(
                    catalog = catalog_name,
                    pattern = %desc_pattern,
                    %reason,
                    "invalid descPattern, skipping"
                );
            }
        }
    }

    if title_pattern.is_empty() && desc_pattern.is_empty() {
        debug!(
            catalog = catalog_name,
            kind = %kind,
            "textProperty entry has neither titlePattern nor descPattern"
        );
    }
}

fn element_name(element: &BytesStart) -> PatternFileResult<String> {
    std::str::from_utf8(element.name().as_ref())
        .map(|s| s.to_string())
        .map_err(|e| PatternFileError::Malformed {
            message: format!("invalid UTF-8 in element name: {e}"),
        })
}

/// Parse XML attributes into a HashMap
fn parse_attributes(element: &BytesStart) -> HashMap<String, String> {
    let mut attrs = HashMap::new();

    for attr in element.attributes().flatten() {
        if let (Ok(key), Ok(value)) = (
            std::str::from_utf8(attr.key.as_ref()),
            attr.unescape_value(),
        ) {
            attrs.insert(key.to_string(), value.into_owned());
        }
    }
    attrs
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_DOC: &str = r#"
        <showInfo name="Test patterns">
          <seasonEpisodes>
            <seasonEpisode>
              <master pattern="S(\d+)E(\d+)"/>
              <season pattern="S(\d+)"/>
              <episode pattern="E(\d+)"/>
            </seasonEpisode>
          </seasonEpisodes>
          <years>
            <year pattern="\((\d{4})\)"/>
          </years>
          <textProperties>
            <textProperty type="new" titlePattern="\bNEW\b"/>
          </textProperties>
        </showInfo>
    "#;

    fn parse(doc: &str) -> PatternFileResult<PatternCatalog> {
        parse_pattern_document(doc, &RegexGuard::default())
    }

    #[test]
    fn parses_a_valid_document() {
        let catalog = parse(VALID_DOC).unwrap();
        assert_eq!(catalog.name, "Test patterns");
        assert_eq!(catalog.season_episode_patterns.len(), 1);
        assert!(catalog.season_episode_patterns[0].has_season_pattern());
        assert_eq!(catalog.year_patterns.len(), 1);
        assert_eq!(catalog.title_patterns.len(), 1);
        assert!(catalog.description_patterns.is_empty());
    }

    #[test]
    fn missing_root_is_fatal() {
        let doc = r#"<notShowInfo name="x"><seasonEpisodes/><years/></notShowInfo>"#;
        assert!(matches!(parse(doc), Err(PatternFileError::MissingRoot)));
    }

    #[test]
    fn missing_name_attribute_is_fatal() {
        let doc = VALID_DOC.replacen(r#" name="Test patterns""#, "", 1);
        assert!(matches!(parse(&doc), Err(PatternFileError::MissingName)));
    }

    #[test]
    fn missing_required_sections_are_fatal() {
        let doc = r#"<showInfo name="x"><years><year pattern="(\d{4})"/></years></showInfo>"#;
        assert!(matches!(
            parse(doc),
            Err(PatternFileError::MissingSection {
                section: "seasonEpisodes"
            })
        ));

        let doc = r#"
            <showInfo name="x">
              <seasonEpisodes>
                <seasonEpisode>
                  <master pattern="E\d+"/><episode pattern="E(\d+)"/>
                </seasonEpisode>
              </seasonEpisodes>
            </showInfo>"#;
        assert!(matches!(
            parse(doc),
            Err(PatternFileError::MissingSection { section: "years" })
        ));
    }

    #[test]
    fn section_without_entries_is_fatal() {
        let doc = r#"
            <showInfo name="x">
              <seasonEpisodes></seasonEpisodes>
              <years><year pattern="(\d{4})"/></years>
            </showInfo>"#;
        assert!(matches!(
            parse(doc),
            Err(PatternFileError::EmptySection {
                section: "seasonEpisodes",
                ..
            })
        ));
    }

    #[test]
    fn malformed_xml_is_fatal() {
        assert!(matches!(
            parse(r#"<showInfo name="x"><seasonEpisodes></wrong></showInfo>"#),
            Err(PatternFileError::Malformed { .. })
        ));
    }

    #[test]
    fn entry_missing_episode_element_is_skipped() {
        let doc = r#"
            <showInfo name="x">
              <seasonEpisodes>
                <seasonEpisode><master pattern="S\d+E\d+"/></seasonEpisode>
                <seasonEpisode>
                  <master pattern="E\d+"/><episode pattern="E(\d+)"/>
                </seasonEpisode>
              </seasonEpisodes>
              <years><year pattern="(\d{4})"/></years>
            </showInfo>"#;
        let catalog = parse(doc).unwrap();
        assert_eq!(catalog.season_episode_patterns.len(), 1);
    }

    #[test]
    fn entry_with_empty_master_pattern_is_skipped() {
        let doc = r#"
            <showInfo name="x">
              <seasonEpisodes>
                <seasonEpisode><master pattern=""/><episode pattern="E(\d+)"/></seasonEpisode>
                <seasonEpisode>
                  <master pattern="E\d+"/><episode pattern="E(\d+)"/>
                </seasonEpisode>
              </seasonEpisodes>
              <years><year pattern="(\d{4})"/></years>
            </showInfo>"#;
        let catalog = parse(doc).unwrap();
        assert_eq!(catalog.season_episode_patterns.len(), 1);
    }

    #[test]
    fn empty_season_pattern_keeps_episode_only_rule() {
        let doc = r#"
            <showInfo name="x">
              <seasonEpisodes>
                <seasonEpisode>
                  <master pattern="E\d+"/>
                  <season pattern=""/>
                  <episode pattern="E(\d+)"/>
                </seasonEpisode>
              </seasonEpisodes>
              <years><year pattern="(\d{4})"/></years>
            </showInfo>"#;
        let catalog = parse(doc).unwrap();
        assert_eq!(catalog.season_episode_patterns.len(), 1);
        assert!(!catalog.season_episode_patterns[0].has_season_pattern());
    }

    #[test]
    fn uncompilable_pattern_is_skipped_not_fatal() {
        let doc = r#"
            <showInfo name="x">
              <seasonEpisodes>
                <seasonEpisode><master pattern="S(\d+E"/><episode pattern="E(\d+)"/></seasonEpisode>
                <seasonEpisode>
                  <master pattern="E\d+"/><episode pattern="E(\d+)"/>
                </seasonEpisode>
              </seasonEpisodes>
              <years><year pattern="(a+)+"/><year pattern="(\d{4})"/></years>
            </showInfo>"#;
        let catalog = parse(doc).unwrap();
        assert_eq!(catalog.season_episode_patterns.len(), 1);
        // Pathological year pattern rejected by the guard, sibling kept
        assert_eq!(catalog.year_patterns.len(), 1);
    }

    #[test]
    fn unrecognized_text_property_type_is_skipped() {
        let doc = r#"
            <showInfo name="x">
              <seasonEpisodes>
                <seasonEpisode>
                  <master pattern="E\d+"/><episode pattern="E(\d+)"/>
                </seasonEpisode>
              </seasonEpisodes>
              <years><year pattern="(\d{4})"/></years>
              <textProperties>
                <textProperty type="rerun" titlePattern="\bRERUN\b"/>
                <textProperty type="live" titlePattern="\bLIVE\b"/>
                <textProperty type="premiere"/>
              </textProperties>
            </showInfo>"#;
        let catalog = parse(doc).unwrap();
        assert_eq!(catalog.title_patterns.len(), 1);
        assert_eq!(catalog.title_patterns[0].0, TextPropertyKind::Live);
    }

    #[test]
    fn text_properties_section_is_optional() {
        let doc = r#"
            <showInfo name="x">
              <seasonEpisodes>
                <seasonEpisode>
                  <master pattern="E\d+"/><episode pattern="E(\d+)"/>
                </seasonEpisode>
              </seasonEpisodes>
              <years><year pattern="(\d{4})"/></years>
            </showInfo>"#;
        let catalog = parse(doc).unwrap();
        assert!(catalog.title_patterns.is_empty());
        assert!(catalog.description_patterns.is_empty());
    }

    #[test]
    fn escaped_attribute_values_are_unescaped() {
        let doc = r#"
            <showInfo name="x">
              <seasonEpisodes>
                <seasonEpisode>
                  <master pattern="S\d+ &amp; E\d+"/><episode pattern="E(\d+)"/>
                </seasonEpisode>
              </seasonEpisodes>
              <years><year pattern="(\d{4})"/></years>
            </showInfo>"#;
        let catalog = parse(doc).unwrap();
        assert!(
            catalog.season_episode_patterns[0]
                .master
                .is_match("S1 & E2")
        );
    }
}
