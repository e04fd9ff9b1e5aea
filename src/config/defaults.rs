//! Default values for configuration fields

pub fn default_enabled() -> bool {
    true
}

pub fn default_max_quantifier_limit() -> usize {
    100
}

pub fn default_regex_size_limit() -> usize {
    1 << 20
}
