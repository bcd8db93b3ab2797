pub mod ast;
pub mod local_ctx;
pub mod name;
pub mod reduce;
pub mod test_support;

pub use ast::*;
pub use local_ctx::{LocalContext, LocalDecl};
pub use name::Name;
pub use reduce::{whnf, whnf_with_fuel, Env, ReduceError};
