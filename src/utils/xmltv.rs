//! Quick-XML based XMLTV reader and writer
//!
//! This module provides a streaming parser for XMLTV guide documents
//! using quick-xml. It extracts only the fields enrichment actually
//! uses, mapping `<title>` to the entry title, `<sub-title>` to the
//! short text and `<desc>` to the long text, and prefills structured
//! fields from any `<episode-num>`, `<date>`, `<new/>`, `<live/>` or
//! `<premiere/>` elements the source already carries so the fill-gaps
//! invariant holds end-to-end.
//!
//! The writer emits the enriched document: `episode-num` in both
//! `onscreen` and `xmltv_ns` systems, `date` for the year, and the
//! empty flag elements.

use std::collections::HashMap;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use regex::Regex;
use serde::Serialize;

use crate::errors::{AppError, AppResult};
use crate::models::ProgramEntry;

/// One `<programme>` element with scheduling attributes and the entry
/// fields enrichment operates on
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct XmltvProgramme {
    pub channel: String,
    pub start: String,
    pub stop: Option<String>,
    pub entry: ProgramEntry,
}

/// Parse XMLTV content using the streaming quick-xml parser
pub fn parse_programmes(content: &str) -> AppResult<Vec<XmltvProgramme>> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    // Onscreen-system episode numbers are the one pre-existing format
    // worth decoding; anything else passes through untouched
    let onscreen_season_episode = Regex::new(r"[Ss](\d{1,2})\s?[Ee][Pp]?(\d{1,3})")
        .map_err(|e| AppError::xmltv(format!("internal onscreen pattern: {e}")))?;
    let onscreen_episode = Regex::new(r"[Ee][Pp]?\.?\s?(\d{1,3})")
        .map_err(|e| AppError::xmltv(format!("internal onscreen pattern: {e}")))?;

    let mut programmes = Vec::new();

    let mut current_programme: Option<XmltvProgramme> = None;
    let mut current_episode_num_system: Option<String> = None;
    let mut current_text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = std::str::from_utf8(e.name().as_ref())
                    .map_err(|e| AppError::xmltv(format!("invalid UTF-8 in element name: {e}")))?
                    .to_string();

                match name.as_str() {
                    "programme" => {
                        let attrs = parse_attributes(e);
                        current_programme = Some(XmltvProgramme {
                            channel: attrs.get("channel").cloned().unwrap_or_default(),
                            start: attrs.get("start").cloned().unwrap_or_default(),
                            stop: attrs.get("stop").cloned(),
                            entry: ProgramEntry::default(),
                        });
                    }
                    "episode-num" => {
                        current_episode_num_system = parse_attributes(e).get("system").cloned();
                    }
                    _ => {}
                }

                current_text.clear();
            }

            Ok(Event::End(ref e)) => {
                let name = std::str::from_utf8(e.name().as_ref())
                    .map_err(|e| AppError::xmltv(format!("invalid UTF-8 in element name: {e}")))?
                    .to_string();

                if let Some(ref mut programme) = current_programme {
                    let text = current_text.trim();
                    match name.as_str() {
                        "title" => {
                            if !text.is_empty() {
                                programme.entry.title = text.to_string();
                            }
                        }
                        "sub-title" => {
                            if !text.is_empty() {
                                programme.entry.plot_outline = text.to_string();
                            }
                        }
                        "desc" => {
                            if !text.is_empty() {
                                programme.entry.plot = text.to_string();
                            }
                        }
                        "date" => {
                            // XMLTV dates are YYYY[MMDD...]; the year is the lead
                            if programme.entry.year.is_none() {
                                programme.entry.year =
                                    text.get(..4).and_then(|s| s.parse::<u32>().ok());
                            }
                        }
                        "episode-num" => {
                            apply_episode_num(
                                &mut programme.entry,
                                current_episode_num_system.take().as_deref(),
                                text,
                                &onscreen_season_episode,
                                &onscreen_episode,
                            );
                        }
                        "new" => programme.entry.is_new = true,
                        "live" => programme.entry.is_live = true,
                        "premiere" => programme.entry.is_premiere = true,
                        "programme" => {
                            // End of programme - add to results
                            if let Some(programme) = current_programme.take() {
                                programmes.push(programme);
                            }
                        }
                        _ => {}
                    }
                }

                current_text.clear();
            }

            Ok(Event::Empty(ref e)) => {
                let name = std::str::from_utf8(e.name().as_ref())
                    .map_err(|e| AppError::xmltv(format!("invalid UTF-8 in element name: {e}")))?
                    .to_string();

                if let Some(ref mut programme) = current_programme {
                    match name.as_str() {
                        "new" => programme.entry.is_new = true,
                        "live" => programme.entry.is_live = true,
                        "premiere" => programme.entry.is_premiere = true,
                        _ => {}
                    }
                }
            }

            Ok(Event::Text(e)) => {
                let text = std::str::from_utf8(&e)
                    .map_err(|e| AppError::xmltv(format!("invalid UTF-8 in text: {e}")))?;
                current_text.push_str(text);
            }

            Ok(Event::CData(e)) => {
                let text = std::str::from_utf8(&e)
                    .map_err(|e| AppError::xmltv(format!("invalid UTF-8 in CDATA: {e}")))?;
                current_text.push_str(text);
            }

            Ok(Event::Eof) => break,

            Err(e) => {
                return Err(AppError::xmltv(format!("XML parsing error: {e}")));
            }

            _ => {} // Ignore comments, processing instructions, etc.
        }
    }

    Ok(programmes)
}

/// Prefill season/episode from a pre-existing `<episode-num>` element
fn apply_episode_num(
    entry: &mut ProgramEntry,
    system: Option<&str>,
    text: &str,
    onscreen_season_episode: &Regex,
    onscreen_episode: &Regex,
) {
    match system {
        Some("xmltv_ns") => {
            // "season . episode . part", zero-indexed, empty = unknown
            let mut parts = text.split('.');
            let season = parts.next().and_then(|s| s.trim().parse::<u32>().ok());
            let episode = parts.next().and_then(|s| s.trim().parse::<u32>().ok());
            if entry.season.is_none() {
                entry.season = season.map(|s| s + 1);
            }
            if entry.episode.is_none() {
                entry.episode = episode.map(|e| e + 1);
            }
        }
        Some("onscreen") => {
            if let Some(caps) = onscreen_season_episode.captures(text) {
                if entry.season.is_none() {
                    entry.season = caps.get(1).and_then(|m| m.as_str().parse().ok());
                }
                if entry.episode.is_none() {
                    entry.episode = caps.get(2).and_then(|m| m.as_str().parse().ok());
                }
            } else if entry.episode.is_none() {
                entry.episode = onscreen_episode
                    .captures(text)
                    .and_then(|caps| caps.get(1))
                    .and_then(|m| m.as_str().parse().ok());
            }
        }
        _ => {}
    }
}

/// Write programmes as an XMLTV document
pub fn write_programmes<W: std::io::Write>(
    programmes: &[XmltvProgramme],
    writer: W,
) -> AppResult<()> {
    let mut xml = Writer::new_with_indent(writer, b' ', 2);

    xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut tv = BytesStart::new("tv");
    tv.push_attribute(("generator-info-name", "epg-enrich"));
    xml.write_event(Event::Start(tv))?;

    for programme in programmes {
        let mut element = BytesStart::new("programme");
        if !programme.start.is_empty() {
            element.push_attribute(("start", programme.start.as_str()));
        }
        if let Some(stop) = &programme.stop {
            element.push_attribute(("stop", stop.as_str()));
        }
        element.push_attribute(("channel", programme.channel.as_str()));
        xml.write_event(Event::Start(element))?;

        let entry = &programme.entry;
        write_text_element(&mut xml, "title", &entry.title)?;
        if !entry.plot_outline.is_empty() {
            write_text_element(&mut xml, "sub-title", &entry.plot_outline)?;
        }
        if !entry.plot.is_empty() {
            write_text_element(&mut xml, "desc", &entry.plot)?;
        }
        if let Some(year) = entry.year {
            write_text_element(&mut xml, "date", &year.to_string())?;
        }

        if entry.season.is_some() || entry.episode.is_some() {
            let mut onscreen = BytesStart::new("episode-num");
            onscreen.push_attribute(("system", "onscreen"));
            xml.write_event(Event::Start(onscreen))?;
            xml.write_event(Event::Text(BytesText::new(&onscreen_text(
                entry.season,
                entry.episode,
            ))))?;
            xml.write_event(Event::End(BytesEnd::new("episode-num")))?;

            let mut ns = BytesStart::new("episode-num");
            ns.push_attribute(("system", "xmltv_ns"));
            xml.write_event(Event::Start(ns))?;
            xml.write_event(Event::Text(BytesText::new(&xmltv_ns_text(
                entry.season,
                entry.episode,
            ))))?;
            xml.write_event(Event::End(BytesEnd::new("episode-num")))?;
        }

        if entry.is_new {
            xml.write_event(Event::Empty(BytesStart::new("new")))?;
        }
        if entry.is_live {
            xml.write_event(Event::Empty(BytesStart::new("live")))?;
        }
        if entry.is_premiere {
            xml.write_event(Event::Empty(BytesStart::new("premiere")))?;
        }

        xml.write_event(Event::End(BytesEnd::new("programme")))?;
    }

    xml.write_event(Event::End(BytesEnd::new("tv")))?;

    Ok(())
}

fn write_text_element<W: std::io::Write>(
    xml: &mut Writer<W>,
    name: &str,
    text: &str,
) -> AppResult<()> {
    xml.write_event(Event::Start(BytesStart::new(name)))?;
    xml.write_event(Event::Text(BytesText::new(text)))?;
    xml.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn onscreen_text(season: Option<u32>, episode: Option<u32>) -> String {
    match (season, episode) {
        (Some(s), Some(e)) => format!("S{s:02}E{e:02}"),
        (Some(s), None) => format!("S{s:02}"),
        (None, Some(e)) => format!("E{e:02}"),
        (None, None) => String::new(),
    }
}

fn xmltv_ns_text(season: Option<u32>, episode: Option<u32>) -> String {
    let season_part = season
        .map(|s| s.saturating_sub(1).to_string())
        .unwrap_or_default();
    let episode_part = episode
        .map(|e| e.saturating_sub(1).to_string())
        .unwrap_or_default();
    format!("{season_part}.{episode_part}.")
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

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
        <tv>
          <programme start="20260807200000 +0000" stop="20260807210000 +0000" channel="bbc1">
            <title>Doctor Who</title>
            <sub-title>The Pilot S10E01</sub-title>
            <desc>The Doctor meets Bill. (2017)</desc>
          </programme>
          <programme start="20260807210000 +0000" channel="bbc1">
            <title>Match of the Day</title>
            <desc>Highlights.</desc>
            <episode-num system="xmltv_ns">2.14.</episode-num>
            <new/>
          </programme>
        </tv>"#;

    #[test]
    fn parses_programme_fields() {
        let programmes = parse_programmes(SAMPLE).unwrap();
        assert_eq!(programmes.len(), 2);

        let first = &programmes[0];
        assert_eq!(first.channel, "bbc1");
        assert_eq!(first.start, "20260807200000 +0000");
        assert_eq!(first.stop.as_deref(), Some("20260807210000 +0000"));
        assert_eq!(first.entry.title, "Doctor Who");
        assert_eq!(first.entry.plot_outline, "The Pilot S10E01");
        assert_eq!(first.entry.plot, "The Doctor meets Bill. (2017)");
        assert_eq!(first.entry.season, None);
    }

    #[test]
    fn prefills_from_existing_episode_num_and_flags() {
        let programmes = parse_programmes(SAMPLE).unwrap();
        let second = &programmes[1];
        assert_eq!(second.entry.season, Some(3));
        assert_eq!(second.entry.episode, Some(15));
        assert!(second.entry.is_new);
    }

    #[test]
    fn prefills_from_onscreen_episode_num() {
        let doc = r#"<tv><programme channel="c" start="s">
            <title>Show</title>
            <episode-num system="onscreen">S02E05</episode-num>
        </programme></tv>"#;
        let programmes = parse_programmes(doc).unwrap();
        assert_eq!(programmes[0].entry.season, Some(2));
        assert_eq!(programmes[0].entry.episode, Some(5));
    }

    #[test]
    fn rejects_malformed_documents() {
        assert!(parse_programmes("<tv><programme></wrong></tv>").is_err());
    }

    #[test]
    fn writes_enriched_fields() {
        let mut programmes = parse_programmes(SAMPLE).unwrap();
        programmes[0].entry.season = Some(10);
        programmes[0].entry.episode = Some(1);
        programmes[0].entry.year = Some(2017);
        programmes[0].entry.is_premiere = true;

        let mut out = Vec::new();
        write_programmes(&programmes, &mut out).unwrap();
        let xml = String::from_utf8(out).unwrap();

        assert!(xml.contains(r#"<episode-num system="onscreen">S10E01</episode-num>"#));
        assert!(xml.contains(r#"<episode-num system="xmltv_ns">9.0.</episode-num>"#));
        assert!(xml.contains("<date>2017</date>"));
        assert!(xml.contains("<premiere/>"));
        assert!(xml.contains(r#"channel="bbc1""#));
    }

    #[test]
    fn round_trip_preserves_parsed_fields() {
        let programmes = parse_programmes(SAMPLE).unwrap();
        let mut out = Vec::new();
        write_programmes(&programmes, &mut out).unwrap();
        let reparsed = parse_programmes(&String::from_utf8(out).unwrap()).unwrap();
        assert_eq!(programmes, reparsed);
    }
}
