use crate::ast::{Definition, Term, Transparency};
use crate::local_ctx::LocalContext;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReduceError {
    #[error("weak head reduction ran out of fuel ({fuel} steps)")]
    FuelExhausted { fuel: usize },
    #[error("Duplicate definition: {0}")]
    DuplicateDefinition(String),
}

/// Global environment containing constant definitions
#[derive(Debug, Clone, Default)]
pub struct Env {
    defs: HashMap<String, Definition>,
}

impl Env {
    pub fn new() -> Self {
        Env::default()
    }

    /// Register a global definition
    pub fn add_definition(&mut self, def: Definition) -> Result<(), ReduceError> {
        if self.defs.contains_key(&def.name) {
            return Err(ReduceError::DuplicateDefinition(def.name));
        }
        self.defs.insert(def.name.clone(), def);
        Ok(())
    }

    /// Get a definition by name
    pub fn get_definition(&self, name: &str) -> Option<&Definition> {
        self.defs.get(name)
    }
}

const DEFAULT_WHNF_FUEL: usize = 100_000;

/// Reduction fuel used when the caller does not pick one.
///
/// Read once from `TELESCOPE_WHNF_FUEL`; non-positive or unparsable values
/// fall back to the built-in default.
pub fn default_whnf_fuel() -> usize {
    static DEFAULT: OnceLock<usize> = OnceLock::new();
    *DEFAULT.get_or_init(|| {
        std::env::var("TELESCOPE_WHNF_FUEL")
            .ok()
            .and_then(|val| val.parse::<usize>().ok())
            .filter(|val| *val > 0)
            .unwrap_or(DEFAULT_WHNF_FUEL)
    })
}

#[derive(Debug, Clone)]
struct ReduceConfig {
    fuel: usize,
    remaining: usize,
}

impl ReduceConfig {
    fn with_fuel(fuel: usize) -> Self {
        Self {
            fuel,
            remaining: fuel,
        }
    }

    fn tick(&mut self) -> Result<(), ReduceError> {
        if self.remaining == 0 {
            Err(ReduceError::FuelExhausted { fuel: self.fuel })
        } else {
            self.remaining -= 1;
            Ok(())
        }
    }
}

/// Weak head normal form: beta, zeta (`let`), delta (definitions allowed by
/// `transparency`) and zeta-delta (let-hypotheses of `lctx`).
///
/// Only the head is reduced; arguments and binder bodies are left alone.
pub fn whnf(
    env: &Env,
    lctx: &LocalContext,
    t: &Rc<Term>,
    transparency: Transparency,
) -> Result<Rc<Term>, ReduceError> {
    whnf_with_fuel(env, lctx, t, transparency, default_whnf_fuel())
}

pub fn whnf_with_fuel(
    env: &Env,
    lctx: &LocalContext,
    t: &Rc<Term>,
    transparency: Transparency,
    fuel: usize,
) -> Result<Rc<Term>, ReduceError> {
    let mut config = ReduceConfig::with_fuel(fuel);
    let mut current = t.clone();
    while let Some(next) = whnf_step(env, lctx, &current, transparency) {
        config.tick()?;
        current = next;
    }
    Ok(current)
}

/// One head reduction step, or `None` when the head is stuck.
fn whnf_step(
    env: &Env,
    lctx: &LocalContext,
    t: &Rc<Term>,
    transparency: Transparency,
) -> Option<Rc<Term>> {
    match &**t {
        Term::App(f, a) => {
            if let Term::Lam(_, _, body, _) = &**f {
                Some(body.subst(0, a))
            } else {
                whnf_step(env, lctx, f, transparency).map(|f_red| Term::app(f_red, a.clone()))
            }
        }
        Term::LetE(_, _, val, body) => Some(body.subst(0, val)),
        Term::Const(name, _) => {
            let def = env.get_definition(name)?;
            if transparency.unfolds(def.transparency) {
                def.value.clone()
            } else {
                None
            }
        }
        Term::FVar(id) => lctx.find(*id).and_then(|decl| decl.value.clone()),
        _ => None,
    }
}
