use rust_embed::RustEmbed;

/// Embedded default pattern documents
#[derive(RustEmbed)]
#[folder = "assets/patterns/"]
#[prefix = "patterns/"]
pub struct PatternAssets;

/// Path of the pattern document used when none is configured
const DEFAULT_PATTERN_DOCUMENT: &str = "patterns/showinfo.xml";

impl PatternAssets {
    /// Get a pattern document by path
    pub fn get_document(path: &str) -> Option<String> {
        Self::get(path).map(|file| String::from_utf8_lossy(&file.data).into_owned())
    }

    /// The bundled default pattern document.
    ///
    /// Returns an empty string if the asset is somehow absent from the
    /// build, which downstream load treats as an empty pattern file.
    pub fn default_pattern_document() -> String {
        Self::get_document(DEFAULT_PATTERN_DOCUMENT).unwrap_or_default()
    }

    /// List all bundled pattern documents
    pub fn list_documents() -> impl Iterator<Item = std::borrow::Cow<'static, str>> {
        Self::iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::show_info::PatternCatalog;
    use crate::utils::regex_guard::RegexGuard;

    #[test]
    fn bundled_default_document_is_loadable() {
        let contents = PatternAssets::default_pattern_document();
        let catalog = PatternCatalog::parse(&contents, &RegexGuard::default()).unwrap();
        assert!(!catalog.season_episode_patterns.is_empty());
        assert!(!catalog.year_patterns.is_empty());
    }
}
