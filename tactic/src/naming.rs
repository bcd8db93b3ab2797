//! How `intro` picks the user name of each new hypothesis.
//!
//! Caller-supplied names win and are used verbatim. Without one, the binder's
//! own name is kept (made unique in the context) when names are preserved or
//! hygiene is off; otherwise a hygienic name is generated so user text can
//! never refer to the hypothesis by accident.

use crate::name_gen::NameGenerator;
use kernel::{LocalContext, Name};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamingPolicy {
    /// Only explicit binders may keep their binder name.
    pub use_names_for_explicit_only: bool,
    pub preserve_binder_names: bool,
    /// Snapshot of `MetaOptions::hygienic` for the current call.
    pub hygienic: bool,
}

impl NamingPolicy {
    fn preservation_permitted(&self) -> bool {
        self.preserve_binder_names || !self.hygienic
    }

    /// Pick the name for a binder called `binder_name`, consuming from
    /// `given` in order. Returns the chosen name and the unconsumed names.
    pub fn resolve<'a>(
        &self,
        lctx: &LocalContext,
        ngen: &mut NameGenerator,
        binder_name: &Name,
        is_explicit: bool,
        given: &'a [Name],
    ) -> (Name, &'a [Name]) {
        match given.split_first() {
            // `_` consumes a slot without naming the hypothesis.
            Some((name, rest)) if !name.is_placeholder() => (name.clone(), rest),
            Some((_, rest)) => (self.without_given_name(lctx, ngen, binder_name, is_explicit), rest),
            None => (self.without_given_name(lctx, ngen, binder_name, is_explicit), given),
        }
    }

    fn without_given_name(
        &self,
        lctx: &LocalContext,
        ngen: &mut NameGenerator,
        binder_name: &Name,
        is_explicit: bool,
    ) -> Name {
        if self.use_names_for_explicit_only && !is_explicit {
            return ngen.fresh_user_name(&Name::Anonymous);
        }
        if !binder_name.is_placeholder() && self.preservation_permitted() {
            return lctx.get_unused_name(binder_name);
        }
        ngen.fresh_user_name(binder_name)
    }
}
