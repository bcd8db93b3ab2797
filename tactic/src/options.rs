use kernel::reduce::default_whnf_fuel;
use kernel::Transparency;
use std::sync::OnceLock;

const DEFAULT_HYGIENIC: bool = true;

/// Process default for `tactic.hygienic`, read once from `TELESCOPE_HYGIENIC`.
pub fn default_hygienic() -> bool {
    static DEFAULT: OnceLock<bool> = OnceLock::new();
    *DEFAULT.get_or_init(|| {
        std::env::var("TELESCOPE_HYGIENIC")
            .ok()
            .and_then(|val| parse_bool(&val))
            .unwrap_or(DEFAULT_HYGIENIC)
    })
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Options consulted by tactics. Read once per tactic call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetaOptions {
    /// Prefer hygienic fresh names over user-visible binder names.
    pub hygienic: bool,
    /// Step budget for each weak head reduction.
    pub whnf_fuel: usize,
    /// Which definitions reduction may unfold.
    pub transparency: Transparency,
}

impl Default for MetaOptions {
    fn default() -> Self {
        MetaOptions {
            hygienic: default_hygienic(),
            whnf_fuel: default_whnf_fuel(),
            transparency: Transparency::Reducible,
        }
    }
}

impl MetaOptions {
    pub fn with_hygienic(mut self, hygienic: bool) -> Self {
        self.hygienic = hygienic;
        self
    }

    /// Zero is clamped to one step.
    pub fn with_whnf_fuel(mut self, fuel: usize) -> Self {
        self.whnf_fuel = fuel.max(1);
        self
    }

    pub fn with_transparency(mut self, transparency: Transparency) -> Self {
        self.transparency = transparency;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_boolean_spellings() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool(" 0 "), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn builders_override_defaults() {
        let opts = MetaOptions::default()
            .with_hygienic(false)
            .with_whnf_fuel(0)
            .with_transparency(Transparency::All);
        assert!(!opts.hygienic);
        assert_eq!(opts.whnf_fuel, 1);
        assert_eq!(opts.transparency, Transparency::All);
    }
}
