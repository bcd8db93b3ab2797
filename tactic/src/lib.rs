//! Goal-directed tactics over the kernel's terms. The centrepiece is binder
//! introduction (`intro_n` and friends), which moves the leading binders of a
//! goal into its local context.

pub mod error;
pub mod intro;
pub mod meta;
pub mod name_gen;
pub mod naming;
pub mod options;

pub use error::{MetaError, MetaResult};
pub use intro::{
    get_intros_size, intro, intro1, intro1_core, intro1_p, intro_n, intro_n_core, intro_np, intros,
};
pub use meta::{AbstractFlags, MetaState, MetavarContext, MetavarDecl, MetavarKind};
pub use name_gen::NameGenerator;
pub use options::MetaOptions;
