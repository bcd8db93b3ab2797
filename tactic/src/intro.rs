//! Binder introduction: turn the leading `pi`/`let` binders of a goal into
//! hypotheses.
//!
//! The original goal `?g : (x : A) -> let y := v; B x y` is assigned
//! `fun (x : A) => let y := v; ?g'` where `?g' : B x y` is a new goal whose
//! context holds `x` and `y`. Types whose binders hide behind definitions are
//! weak-head reduced once per stuck point.

use crate::error::{MetaError, MetaResult};
use crate::meta::{AbstractFlags, MetaState, MetavarDecl, MetavarKind};
use crate::name_gen::NameGenerator;
use crate::naming::NamingPolicy;
use kernel::{BinderShape, FVarId, LocalContext, MVarId, Name, Term};
use std::rc::Rc;
use tracing::{debug, instrument, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OnShortfall {
    /// Fail with `InsufficientBinders`.
    Fail,
    /// Keep what was introduced so far.
    Stop,
}

#[derive(Debug, Clone, Copy)]
struct IntroRequest<'a> {
    tactic: &'static str,
    n: usize,
    given: &'a [Name],
    use_names_for_explicit_only: bool,
    preserve_binder_names: bool,
    on_shortfall: OnShortfall,
}

/// Work produced by the peeling loop, not yet visible in the state.
struct Peeled {
    lctx: LocalContext,
    ngen: NameGenerator,
    fvar_ids: Vec<FVarId>,
    fvars: Vec<Rc<Term>>,
    /// Remaining type; its loose indices refer to `fvars[instantiated..]`.
    residual: Rc<Term>,
    instantiated: usize,
}

enum Step {
    Continue(Rc<Term>),
    Stop(Rc<Term>),
}

#[instrument(
    level = "debug",
    skip_all,
    fields(tactic = req.tactic, goal = %goal, n = req.n, preserve = req.preserve_binder_names)
)]
fn run(state: &mut MetaState, goal: MVarId, req: IntroRequest<'_>) -> MetaResult<(Vec<FVarId>, MVarId)> {
    state.check_not_assigned(goal, req.tactic)?;
    if req.n == 0 {
        return Ok((Vec::new(), goal));
    }
    let policy = NamingPolicy {
        use_names_for_explicit_only: req.use_names_for_explicit_only,
        preserve_binder_names: req.preserve_binder_names,
        hygienic: state.options.hygienic,
    };
    let peeled = peel_binders(state, goal, &req, policy)?;
    if peeled.fvar_ids.is_empty() {
        // Best effort with nothing to introduce: the goal is left as is.
        return Ok((Vec::new(), goal));
    }
    finalize(state, goal, req.tactic, peeled)
}

fn peel_binders(
    state: &MetaState,
    goal: MVarId,
    req: &IntroRequest<'_>,
    policy: NamingPolicy,
) -> MetaResult<Peeled> {
    let decl = state.goal_decl(goal)?;
    let mut lctx = decl.lctx.clone();
    let mut ngen = state.ngen.clone();
    let mut ty = state.instantiate_mvars(&decl.ty);
    let mut fvar_ids = Vec::with_capacity(req.n);
    let mut fvars: Vec<Rc<Term>> = Vec::with_capacity(req.n);
    let mut given = req.given;
    // `ty` has already been instantiated with `fvars[..instantiated]`.
    let mut instantiated = 0;

    while fvars.len() < req.n {
        let i = fvars.len();
        let step = match ty.binder_shape() {
            BinderShape::Forall {
                name,
                domain,
                body,
                info,
            } => {
                let domain = domain
                    .instantiate_rev_range(instantiated, fvars.len(), &fvars)
                    .head_beta();
                let (user_name, rest) =
                    policy.resolve(&lctx, &mut ngen, name, info.is_explicit(), given);
                given = rest;
                let fvar_id = ngen.fresh_fvar_id();
                trace!(i, fvar = %fvar_id, name = %user_name, "intro forall");
                lctx.mk_local_decl(fvar_id, user_name, domain, info);
                fvar_ids.push(fvar_id);
                fvars.push(Term::fvar(fvar_id));
                Step::Continue(body.clone())
            }
            BinderShape::Let {
                name,
                ty: let_ty,
                value,
                body,
            } => {
                let let_ty = let_ty
                    .instantiate_rev_range(instantiated, fvars.len(), &fvars)
                    .head_beta();
                let value = value.instantiate_rev_range(instantiated, fvars.len(), &fvars);
                let (user_name, rest) = policy.resolve(&lctx, &mut ngen, name, true, given);
                given = rest;
                let fvar_id = ngen.fresh_fvar_id();
                trace!(i, fvar = %fvar_id, name = %user_name, "intro let");
                lctx.mk_let_decl(fvar_id, user_name, let_ty, value);
                fvar_ids.push(fvar_id);
                fvars.push(Term::fvar(fvar_id));
                Step::Continue(body.clone())
            }
            BinderShape::Other => {
                let stuck = ty.instantiate_rev_range(instantiated, fvars.len(), &fvars);
                instantiated = fvars.len();
                let reduced = state.whnf(&lctx, &stuck)?;
                if reduced.is_binder() {
                    debug!(i, "binder exposed by whnf");
                    Step::Continue(reduced)
                } else {
                    debug!(i, ty = %stuck, "no binder after whnf");
                    match req.on_shortfall {
                        OnShortfall::Fail => {
                            return Err(MetaError::InsufficientBinders {
                                tactic: req.tactic,
                                goal,
                            })
                        }
                        OnShortfall::Stop => Step::Stop(stuck),
                    }
                }
            }
        };
        match step {
            Step::Continue(next) => ty = next,
            Step::Stop(rest) => {
                ty = rest;
                break;
            }
        }
    }

    Ok(Peeled {
        lctx,
        ngen,
        fvar_ids,
        fvars,
        residual: ty,
        instantiated,
    })
}

/// Create the successor goal and assign the original one. The state is only
/// touched once nothing can fail any more.
fn finalize(
    state: &mut MetaState,
    goal: MVarId,
    tactic: &'static str,
    peeled: Peeled,
) -> MetaResult<(Vec<FVarId>, MVarId)> {
    let Peeled {
        lctx,
        mut ngen,
        fvar_ids,
        fvars,
        residual,
        instantiated,
    } = peeled;
    let tag = state.goal_decl(goal)?.user_name.clone();
    let residual = residual.instantiate_rev_range(instantiated, fvars.len(), &fvars);
    let residual = state.instantiate_mvars(&residual).head_beta();

    let new_goal = ngen.fresh_mvar_id();
    let proof = state.mk_lambda_fvars(&lctx, &fvar_ids, &Term::meta(new_goal), AbstractFlags::default())?;
    // `goal` was checked unassigned on entry.
    state.mctx.add_decl(
        new_goal,
        MetavarDecl {
            user_name: tag,
            lctx,
            ty: residual,
            kind: MetavarKind::SyntheticOpaque,
        },
    )?;
    state.mctx.assign(goal, proof, tactic)?;
    state.ngen = ngen;
    debug!(goal = %goal, new_goal = %new_goal, introduced = fvar_ids.len(), "goal assigned");
    Ok((fvar_ids, new_goal))
}

fn single(tactic: &'static str, goal: MVarId, result: (Vec<FVarId>, MVarId)) -> MetaResult<(FVarId, MVarId)> {
    match result.0.as_slice() {
        [fvar] => Ok((*fvar, result.1)),
        _ => Err(MetaError::InsufficientBinders { tactic, goal }),
    }
}

// =============================================================================
// Public entry points
// =============================================================================

/// Introduce `n` binders of `goal`.
///
/// `given_names` name the new hypotheses in order; `_` leaves a slot to the
/// naming policy. Fails with `InsufficientBinders`, leaving `state`
/// untouched, when fewer than `n` binders can be exposed.
pub fn intro_n_core(
    state: &mut MetaState,
    goal: MVarId,
    n: usize,
    given_names: &[Name],
    use_names_for_explicit_only: bool,
    preserve_binder_names: bool,
) -> MetaResult<(Vec<FVarId>, MVarId)> {
    run(
        state,
        goal,
        IntroRequest {
            tactic: "introN",
            n,
            given: given_names,
            use_names_for_explicit_only,
            preserve_binder_names,
            on_shortfall: OnShortfall::Fail,
        },
    )
}

/// `intro_n_core` without binder-name preservation.
pub fn intro_n(
    state: &mut MetaState,
    goal: MVarId,
    n: usize,
    given_names: &[Name],
    use_names_for_explicit_only: bool,
) -> MetaResult<(Vec<FVarId>, MVarId)> {
    intro_n_core(state, goal, n, given_names, use_names_for_explicit_only, false)
}

/// Introduce up to `max` binders, keeping binder names. Never fails for lack
/// of binders: returns the prefix that could be introduced.
pub fn intro_np(state: &mut MetaState, goal: MVarId, max: usize) -> MetaResult<(Vec<FVarId>, MVarId)> {
    run(
        state,
        goal,
        IntroRequest {
            tactic: "introNP",
            n: max,
            given: &[],
            use_names_for_explicit_only: false,
            preserve_binder_names: true,
            on_shortfall: OnShortfall::Stop,
        },
    )
}

/// Introduce one binder, named `name`.
pub fn intro(state: &mut MetaState, goal: MVarId, name: impl Into<Name>) -> MetaResult<(FVarId, MVarId)> {
    let given = [name.into()];
    let result = run(
        state,
        goal,
        IntroRequest {
            tactic: "intro",
            n: 1,
            given: &given,
            use_names_for_explicit_only: false,
            preserve_binder_names: false,
            on_shortfall: OnShortfall::Fail,
        },
    )?;
    single("intro", goal, result)
}

pub fn intro1_core(state: &mut MetaState, goal: MVarId, preserve_binder_names: bool) -> MetaResult<(FVarId, MVarId)> {
    let tactic = if preserve_binder_names { "intro1P" } else { "intro1" };
    let result = run(
        state,
        goal,
        IntroRequest {
            tactic,
            n: 1,
            given: &[],
            use_names_for_explicit_only: false,
            preserve_binder_names,
            on_shortfall: OnShortfall::Fail,
        },
    )?;
    single(tactic, goal, result)
}

pub fn intro1(state: &mut MetaState, goal: MVarId) -> MetaResult<(FVarId, MVarId)> {
    intro1_core(state, goal, false)
}

pub fn intro1_p(state: &mut MetaState, goal: MVarId) -> MetaResult<(FVarId, MVarId)> {
    intro1_core(state, goal, true)
}

/// Number of leading `pi`/`let` binders, without any reduction.
pub fn get_intros_size(ty: &Term) -> usize {
    let mut count = 0;
    let mut current = ty;
    loop {
        match current {
            Term::Pi(_, _, body, _) | Term::LetE(_, _, _, body) => {
                count += 1;
                current = body.as_ref();
            }
            _ => return count,
        }
    }
}

/// Introduce every binder visible in the goal's type as written.
pub fn intros(state: &mut MetaState, goal: MVarId) -> MetaResult<(Vec<FVarId>, MVarId)> {
    state.check_not_assigned(goal, "intros")?;
    let ty = state.goal_type(goal)?;
    let n = get_intros_size(&ty);
    if n == 0 {
        return Ok((Vec::new(), goal));
    }
    intro_n(state, goal, n, &[], false)
}
