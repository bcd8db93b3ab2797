use kernel::name::DEFAULT_BINDER_BASE;
use kernel::{FVarId, MVarId, Name};

/// Source of fresh identifiers and hygienic names.
///
/// Ids and macro scopes come from one monotonic counter, so no two values
/// handed out by the same generator ever coincide. The generator is plain
/// data owned by `MetaState`; cloning it snapshots the counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameGenerator {
    next: u64,
}

impl Default for NameGenerator {
    fn default() -> Self {
        NameGenerator { next: 1 }
    }
}

impl NameGenerator {
    pub fn new() -> Self {
        NameGenerator::default()
    }

    /// Resume from a known counter value (e.g. after deserializing a session).
    pub fn starting_at(next: u64) -> Self {
        NameGenerator { next: next.max(1) }
    }

    pub fn peek(&self) -> u64 {
        self.next
    }

    fn bump(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    pub fn fresh_fvar_id(&mut self) -> FVarId {
        FVarId(self.bump())
    }

    pub fn fresh_mvar_id(&mut self) -> MVarId {
        MVarId(self.bump())
    }

    /// A hygienic variant of `base` that no user-written name can equal.
    /// Placeholders become `a`.
    pub fn fresh_user_name(&mut self, base: &Name) -> Name {
        let base = if base.is_placeholder() {
            DEFAULT_BINDER_BASE.to_string()
        } else {
            base.base().to_string()
        };
        Name::Hygienic {
            base,
            scope: self.bump(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_pairwise_distinct() {
        let mut ngen = NameGenerator::new();
        let a = ngen.fresh_fvar_id();
        let b = ngen.fresh_fvar_id();
        let m = ngen.fresh_mvar_id();
        assert_ne!(a, b);
        assert_ne!(a.0, m.0);
        assert_ne!(b.0, m.0);
    }

    #[test]
    fn fresh_user_names_drop_existing_scopes() {
        let mut ngen = NameGenerator::starting_at(40);
        let first = ngen.fresh_user_name(&Name::from("h"));
        let second = ngen.fresh_user_name(&first);
        assert_eq!(first, Name::Hygienic { base: "h".to_string(), scope: 40 });
        assert_eq!(second, Name::Hygienic { base: "h".to_string(), scope: 41 });
        assert_eq!(ngen.fresh_user_name(&Name::Anonymous).base(), "a");
    }

    #[test]
    fn clone_snapshots_counter() {
        let mut ngen = NameGenerator::new();
        let snapshot = ngen.clone();
        ngen.fresh_fvar_id();
        assert_ne!(snapshot, ngen);
        assert_eq!(snapshot.peek() + 1, ngen.peek());
    }
}
