//! Pattern safety validation for user-supplied regular expressions
//!
//! The pattern document is user-editable, so every expression in it is
//! untrusted input. The `regex` crate's engine is linear-time and cannot
//! backtrack catastrophically, but large repetition counts can still
//! blow up the compiled program. The guard rejects oversized quantifiers
//! and nested-quantifier constructs before compilation, and caps the
//! compiled program size as a final backstop.

use regex::{Regex, RegexBuilder};

/// Bounds on a `{m,n}` repetition
#[derive(Debug, Clone)]
struct QuantifierInfo {
    min: usize,

    max: Option<usize>, // None means unbounded
}

/// Limits applied to patterns before compilation
#[derive(Debug, Clone)]
pub struct RegexGuardConfig {
    /// Maximum allowed `{m,n}` repetition count
    pub max_quantifier_limit: usize,
    /// Maximum compiled program size in bytes, passed to `RegexBuilder`
    pub size_limit: usize,
}

impl Default for RegexGuardConfig {
    fn default() -> Self {
        Self {
            max_quantifier_limit: 100,
            size_limit: 1 << 20,
        }
    }
}

/// Validating compiler for pattern-document expressions
#[derive(Debug, Clone)]
pub struct RegexGuard {
    config: RegexGuardConfig,
}

impl RegexGuard {
    pub fn new(config: RegexGuardConfig) -> Self {
        Self { config }
    }

    /// Validate and compile a pattern.
    ///
    /// Returns a human-readable reason on rejection; the loader logs it
    /// and skips the offending entry rather than aborting the load.
    pub fn compile(&self, pattern: &str) -> Result<Regex, String> {
        self.validate_quantifier_limits(pattern)?;
        self.detect_nested_quantifiers(pattern)?;

        RegexBuilder::new(pattern)
            .size_limit(self.config.size_limit)
            .build()
            .map_err(|e| e.to_string())
    }

    /// Reject `{m,n}` repetitions above the configured limit
    fn validate_quantifier_limits(&self, pattern: &str) -> Result<(), String> {
        let mut chars = pattern.chars().peekable();

        while let Some(ch) = chars.next() {
            match ch {
                '\\' => {
                    chars.next();
                }
                '[' => {
                    // Character class content is literal as far as quantifiers go
                    while let Some(ch) = chars.next() {
                        if ch == '\\' {
                            chars.next();
                        } else if ch == ']' {
                            break;
                        }
                    }
                }
                '{' => {
                    let quantifier = parse_quantifier(&mut chars);

                    if quantifier.min > self.config.max_quantifier_limit {
                        return Err(format!(
                            "quantifier min value {} exceeds limit of {}",
                            quantifier.min, self.config.max_quantifier_limit
                        ));
                    }

                    if let Some(max) = quantifier.max {
                        if max > self.config.max_quantifier_limit {
                            return Err(format!(
                                "quantifier max value {} exceeds limit of {}",
                                max, self.config.max_quantifier_limit
                            ));
                        }
                    }
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// Reject nested quantifiers like `(a+)+` or `(a{2,}){3}`
    fn detect_nested_quantifiers(&self, pattern: &str) -> Result<(), String> {
        let mut chars = pattern.chars().peekable();
        // One flag per open group: does it contain a quantifier?
        let mut group_stack: Vec<bool> = Vec::new();

        while let Some(ch) = chars.next() {
            match ch {
                '\\' => {
                    chars.next();
                }
                '[' => {
                    while let Some(ch) = chars.next() {
                        if ch == '\\' {
                            chars.next();
                        } else if ch == ']' {
                            break;
                        }
                    }
                }
                '(' => {
                    group_stack.push(false);
                    // "(?:", "(?i)", "(?P<name>" — group syntax, not a quantifier
                    if chars.peek() == Some(&'?') {
                        chars.next();
                    }
                }
                ')' => {
                    let contained_quantifier = group_stack.pop().unwrap_or(false);
                    let quantified = matches!(chars.peek(), Some('*' | '+' | '?' | '{'));
                    if quantified && contained_quantifier {
                        return Err(
                            "nested quantifiers detected (e.g. (a+)+); rejected to bound \
                             matching cost"
                                .to_string(),
                        );
                    }
                    // The enclosing group inherits both the group's own
                    // quantifier and anything quantified inside it
                    if quantified || contained_quantifier {
                        if let Some(parent) = group_stack.last_mut() {
                            *parent = true;
                        }
                    }
                }
                '*' | '+' | '?' | '{' => {
                    if ch == '{' {
                        parse_quantifier(&mut chars);
                    }
                    if let Some(current) = group_stack.last_mut() {
                        *current = true;
                    }
                }
                _ => {}
            }
        }

        Ok(())
    }
}

impl Default for RegexGuard {
    fn default() -> Self {
        Self::new(RegexGuardConfig::default())
    }
}

/// Parse the body of a `{...}` quantifier, consuming up to the closing brace
fn parse_quantifier(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> QuantifierInfo {
    let mut body = String::new();
    for ch in chars.by_ref() {
        if ch == '}' {
            break;
        }
        body.push(ch);
    }

    let mut parts = body.splitn(2, ',');
    let min = parts
        .next()
        .and_then(|s| s.trim().parse::<usize>().ok())
        .unwrap_or(0);
    let max = match parts.next() {
        // "{m}" repeats exactly m times
        None => Some(min),
        // "{m,}" is unbounded, "{m,n}" bounded
        Some(s) if s.trim().is_empty() => None,
        Some(s) => s.trim().parse::<usize>().ok(),
    };

    QuantifierInfo { min, max }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_typical_show_info_patterns() {
        let guard = RegexGuard::default();
        assert!(guard.compile(r"S(\d+)E(\d+)").is_ok());
        assert!(guard.compile(r"\((\d{4})\)").is_ok());
        assert!(guard.compile(r"[Ss]\.?\s?\d+\s?[Ee][Pp]?\.?\s?\d+").is_ok());
    }

    #[test]
    fn rejects_oversized_quantifiers() {
        let guard = RegexGuard::default();
        assert!(guard.compile(r"a{5000}").is_err());
        assert!(guard.compile(r"a{1,5000}").is_err());
        assert!(guard.compile(r"a{99}b{2,100}").is_ok());
    }

    #[test]
    fn rejects_nested_quantifiers() {
        let guard = RegexGuard::default();
        assert!(guard.compile(r"(a+)+").is_err());
        assert!(guard.compile(r"(a{2,}){3}").is_err());
        assert!(guard.compile(r"((a+)b)*").is_err());
        // A quantifier inside a group that is not itself quantified is fine
        assert!(guard.compile(r"(a+)b").is_ok());
        assert!(guard.compile(r"(\d+)x(\d+)").is_ok());
    }

    #[test]
    fn quantifiers_inside_character_classes_are_literal() {
        let guard = RegexGuard::default();
        assert!(guard.compile(r"[{}+*]").is_ok());
    }

    #[test]
    fn rejects_invalid_syntax_via_compiler() {
        let guard = RegexGuard::default();
        assert!(guard.compile(r"S(\d+").is_err());
        assert!(guard.compile(r"[unclosed").is_err());
    }

    #[test]
    fn size_limit_bounds_compiled_program() {
        let guard = RegexGuard::new(RegexGuardConfig {
            max_quantifier_limit: 100,
            size_limit: 64,
        });
        assert!(guard.compile(r"(abc|def|ghi){10,90}xyz").is_err());
    }
}
