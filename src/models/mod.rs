//! Data models shared by the catalog, the extraction engine and the CLI

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// One program-guide entry, as handed over by an upstream source.
///
/// The text fields are inputs to extraction; the structured fields are
/// what extraction fills in. `None` (and `false` for the flags) means
/// "not supplied by the source" — the engine only ever writes into those
/// gaps and never replaces a value the source already provided.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramEntry {
    pub title: String,
    /// Brief/outline description, the preferred match target
    pub plot_outline: String,
    /// Full description, used only when the outline yields no match
    pub plot: String,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub year: Option<u32>,
    pub is_new: bool,
    pub is_live: bool,
    pub is_premiere: bool,
}

impl ProgramEntry {
    pub fn new<T, O, P>(title: T, plot_outline: O, plot: P) -> Self
    where
        T: Into<String>,
        O: Into<String>,
        P: Into<String>,
    {
        Self {
            title: title.into(),
            plot_outline: plot_outline.into(),
            plot: plot.into(),
            ..Self::default()
        }
    }
}

/// Category of a text-property rule in the pattern document.
///
/// The `type` attribute on `<textProperty>` entries maps onto this enum;
/// a category may appear on multiple entries, each contributing one more
/// rule for the same flag.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TextPropertyKind {
    New,
    Live,
    Premiere,
}
