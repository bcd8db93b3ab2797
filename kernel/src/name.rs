use std::fmt;

/// User-facing names attached to binders and local declarations.
///
/// Hygienic names carry a macro scope handed out by a name generator. Two
/// hygienic names with different scopes never compare equal, and no hygienic
/// name equals a plain `Str` name, so they cannot be captured by user text.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Name {
    #[default]
    Anonymous,
    Str(String),
    Hygienic { base: String, scope: u64 },
}

/// Base used when a hygienic name has nothing better to derive from.
pub const DEFAULT_BINDER_BASE: &str = "a";

impl Name {
    /// Anonymous, or the literal `_`.
    pub fn is_placeholder(&self) -> bool {
        match self {
            Name::Anonymous => true,
            Name::Str(s) => s == "_",
            Name::Hygienic { .. } => false,
        }
    }

    pub fn has_macro_scope(&self) -> bool {
        matches!(self, Name::Hygienic { .. })
    }

    /// The readable part of the name, without any macro scope.
    pub fn base(&self) -> &str {
        match self {
            Name::Anonymous => "",
            Name::Str(s) => s,
            Name::Hygienic { base, .. } => base,
        }
    }

    pub fn erase_macro_scopes(&self) -> Name {
        match self {
            Name::Hygienic { base, .. } => Name::Str(base.clone()),
            other => other.clone(),
        }
    }

    /// `x` -> `x_1`. Hygienic names keep their scope.
    pub fn append_index(&self, idx: usize) -> Name {
        match self {
            Name::Anonymous => Name::Str(format!("_{}", idx)),
            Name::Str(s) => Name::Str(format!("{}_{}", s, idx)),
            Name::Hygienic { base, scope } => Name::Hygienic {
                base: format!("{}_{}", base, idx),
                scope: *scope,
            },
        }
    }
}

impl From<&str> for Name {
    fn from(s: &str) -> Self {
        Name::Str(s.to_string())
    }
}

impl From<String> for Name {
    fn from(s: String) -> Self {
        Name::Str(s)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Name::Anonymous => write!(f, "_"),
            Name::Str(s) => write!(f, "{}", s),
            // Inaccessible in surface syntax; the dagger marks that.
            Name::Hygienic { base, .. } => write!(f, "{}✝", base),
        }
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Name::Anonymous => write!(f, "[anonymous]"),
            Name::Str(s) => write!(f, "`{}", s),
            Name::Hygienic { base, scope } => write!(f, "`{}._hyg.{}", base, scope),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_detection() {
        assert!(Name::Anonymous.is_placeholder());
        assert!(Name::from("_").is_placeholder());
        assert!(!Name::from("x").is_placeholder());
        assert!(!Name::Hygienic { base: "_".to_string(), scope: 3 }.is_placeholder());
    }

    #[test]
    fn hygienic_names_never_equal_user_names() {
        let hyg = Name::Hygienic { base: "x".to_string(), scope: 1 };
        assert_ne!(hyg, Name::from("x"));
        assert_eq!(hyg.erase_macro_scopes(), Name::from("x"));
        assert_eq!(hyg.to_string(), "x✝");
        assert_eq!(format!("{:?}", hyg), "`x._hyg.1");
    }

    #[test]
    fn append_index_suffixes_base() {
        assert_eq!(Name::from("h").append_index(2), Name::from("h_2"));
    }
}
