use crate::error::{MetaError, MetaResult};
use crate::name_gen::NameGenerator;
use crate::options::MetaOptions;
use kernel::reduce::whnf_with_fuel;
use kernel::{Env, FVarId, LocalContext, MVarId, Name, Term};
use std::collections::HashMap;
use std::rc::Rc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetavarKind {
    /// Ordinary hole, may be solved by unification.
    Natural,
    /// A goal: only tactics assign it.
    SyntheticOpaque,
}

/// Declaration of a goal: its type under its own local context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetavarDecl {
    /// User-facing tag, inherited by goals derived from this one.
    pub user_name: Name,
    pub lctx: LocalContext,
    pub ty: Rc<Term>,
    pub kind: MetavarKind,
}

impl MetavarDecl {
    pub fn is_synthetic_opaque(&self) -> bool {
        self.kind == MetavarKind::SyntheticOpaque
    }
}

#[derive(Debug, Clone, Default)]
pub struct MetavarContext {
    decls: HashMap<MVarId, MetavarDecl>,
    assignments: HashMap<MVarId, Rc<Term>>,
}

impl MetavarContext {
    pub fn new() -> Self {
        MetavarContext::default()
    }

    /// Declare `id`. A declaration is never replaced.
    pub fn add_decl(&mut self, id: MVarId, decl: MetavarDecl) -> MetaResult<()> {
        if self.decls.contains_key(&id) {
            return Err(MetaError::MVarAlreadyDeclared(id));
        }
        self.decls.insert(id, decl);
        Ok(())
    }

    pub fn get_decl(&self, id: MVarId) -> MetaResult<&MetavarDecl> {
        self.decls.get(&id).ok_or(MetaError::UnknownMVar(id))
    }

    pub fn num_decls(&self) -> usize {
        self.decls.len()
    }

    pub fn is_assigned(&self, id: MVarId) -> bool {
        self.assignments.contains_key(&id)
    }

    pub fn get_assignment(&self, id: MVarId) -> Option<&Rc<Term>> {
        self.assignments.get(&id)
    }

    pub fn assign(&mut self, id: MVarId, val: Rc<Term>, tactic: &'static str) -> MetaResult<()> {
        if self.is_assigned(id) {
            return Err(MetaError::AlreadyAssigned { tactic, goal: id });
        }
        self.assignments.insert(id, val);
        Ok(())
    }

    /// Replace every assigned metavariable by its (recursively
    /// instantiated) value.
    ///
    /// The binder spine is walked in a loop and rebuilt from the inside out,
    /// reusing every node that did not change.
    pub fn instantiate_mvars(&self, t: &Rc<Term>) -> Rc<Term> {
        if !t.has_meta() {
            return t.clone();
        }
        let mut spine = Vec::new();
        let mut current = t;
        while let Term::Lam(_, _, body, _) | Term::Pi(_, _, body, _) | Term::LetE(_, _, _, body) = &**current {
            spine.push(current);
            current = body;
        }
        let mut result = self.instantiate_spine_tail(current);
        for node in spine.into_iter().rev() {
            result = self.rebuild_binder(node, result);
        }
        result
    }

    fn instantiate_spine_tail(&self, t: &Rc<Term>) -> Rc<Term> {
        if !t.has_meta() {
            return t.clone();
        }
        match &**t {
            Term::Meta(id) => match self.assignments.get(id) {
                Some(val) => self.instantiate_mvars(val),
                None => t.clone(),
            },
            Term::App(f, a) => Term::app(self.instantiate_mvars(f), self.instantiate_mvars(a)),
            _ => t.clone(),
        }
    }

    fn rebuild_binder(&self, node: &Rc<Term>, body: Rc<Term>) -> Rc<Term> {
        match &**node {
            Term::Lam(n, ty, old_body, info) => {
                let ty_new = self.instantiate_mvars(ty);
                if Rc::ptr_eq(&ty_new, ty) && Rc::ptr_eq(&body, old_body) {
                    return node.clone();
                }
                Term::lam(n.clone(), ty_new, body, *info)
            }
            Term::Pi(n, ty, old_body, info) => {
                let ty_new = self.instantiate_mvars(ty);
                if Rc::ptr_eq(&ty_new, ty) && Rc::ptr_eq(&body, old_body) {
                    return node.clone();
                }
                Term::pi(n.clone(), ty_new, body, *info)
            }
            Term::LetE(n, ty, v, old_body) => {
                let ty_new = self.instantiate_mvars(ty);
                let v_new = self.instantiate_mvars(v);
                if Rc::ptr_eq(&ty_new, ty) && Rc::ptr_eq(&v_new, v) && Rc::ptr_eq(&body, old_body) {
                    return node.clone();
                }
                Term::let_e(n.clone(), ty_new, v_new, body)
            }
            _ => body,
        }
    }
}

/// Flags for `mk_lambda_fvars`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AbstractFlags {
    /// Drop let-hypotheses the body does not mention.
    pub used_let_only: bool,
}

/// Everything a tactic reads or updates, threaded by `&mut`.
#[derive(Debug, Clone)]
pub struct MetaState {
    pub env: Env,
    pub mctx: MetavarContext,
    pub ngen: NameGenerator,
    pub options: MetaOptions,
}

impl MetaState {
    pub fn new(env: Env) -> Self {
        MetaState {
            env,
            mctx: MetavarContext::new(),
            ngen: NameGenerator::new(),
            options: MetaOptions::default(),
        }
    }

    pub fn with_options(mut self, options: MetaOptions) -> Self {
        self.options = options;
        self
    }

    /// Declare a new goal of type `ty` under `lctx`.
    pub fn mk_fresh_expr_mvar(
        &mut self,
        ty: Rc<Term>,
        lctx: LocalContext,
        kind: MetavarKind,
        user_name: Name,
    ) -> MetaResult<MVarId> {
        let id = self.ngen.fresh_mvar_id();
        self.mctx.add_decl(
            id,
            MetavarDecl {
                user_name,
                lctx,
                ty,
                kind,
            },
        )?;
        Ok(id)
    }

    /// Convenience for a top-level goal with an empty context.
    pub fn mk_goal(&mut self, ty: Rc<Term>) -> MetaResult<MVarId> {
        self.mk_fresh_expr_mvar(ty, LocalContext::new(), MetavarKind::SyntheticOpaque, Name::Anonymous)
    }

    pub fn assign(&mut self, id: MVarId, val: Rc<Term>) -> MetaResult<()> {
        self.mctx.assign(id, val, "assign")
    }

    pub fn goal_decl(&self, id: MVarId) -> MetaResult<&MetavarDecl> {
        self.mctx.get_decl(id)
    }

    pub fn goal_type(&self, id: MVarId) -> MetaResult<Rc<Term>> {
        Ok(self.mctx.instantiate_mvars(&self.goal_decl(id)?.ty))
    }

    /// Fail unless `id` names a declared, unassigned goal.
    pub fn check_not_assigned(&self, id: MVarId, tactic: &'static str) -> MetaResult<()> {
        self.mctx.get_decl(id)?;
        if self.mctx.is_assigned(id) {
            return Err(MetaError::AlreadyAssigned { tactic, goal: id });
        }
        Ok(())
    }

    pub fn instantiate_mvars(&self, t: &Rc<Term>) -> Rc<Term> {
        self.mctx.instantiate_mvars(t)
    }

    /// Weak head normal form under `lctx`, with assigned metavariables
    /// substituted first.
    pub fn whnf(&self, lctx: &LocalContext, t: &Rc<Term>) -> MetaResult<Rc<Term>> {
        let t = self.mctx.instantiate_mvars(t);
        let reduced = whnf_with_fuel(
            &self.env,
            lctx,
            &t,
            self.options.transparency,
            self.options.whnf_fuel,
        )?;
        debug!(input = %t, output = %reduced, "whnf");
        Ok(reduced)
    }

    /// Build `fun (x1 : A1) .. (xn : An) => body` over the hypotheses
    /// `fvars` of `lctx`. Let-hypotheses become `let` binders.
    pub fn mk_lambda_fvars(
        &self,
        lctx: &LocalContext,
        fvars: &[FVarId],
        body: &Rc<Term>,
        flags: AbstractFlags,
    ) -> MetaResult<Rc<Term>> {
        mk_binding(&self.mctx, lctx, fvars, body, flags)
    }
}

fn mk_binding(
    mctx: &MetavarContext,
    lctx: &LocalContext,
    fvars: &[FVarId],
    body: &Rc<Term>,
    flags: AbstractFlags,
) -> MetaResult<Rc<Term>> {
    let body = mctx.instantiate_mvars(body);
    let mut result = body.abstract_fvars(fvars);
    for i in (0..fvars.len()).rev() {
        let decl = lctx.find(fvars[i]).ok_or(MetaError::UnknownFVar(fvars[i]))?;
        let ty = mctx.instantiate_mvars(&decl.ty).abstract_fvars(&fvars[..i]);
        result = match &decl.value {
            Some(value) => {
                if flags.used_let_only && !result.has_loose_bvar(0) {
                    // Unused: drop the binder and close the gap it leaves.
                    result.subst(0, &Term::var(0))
                } else {
                    let value = mctx.instantiate_mvars(value).abstract_fvars(&fvars[..i]);
                    Term::let_e(decl.user_name.clone(), ty, value, result)
                }
            }
            None => Term::lam(decl.user_name.clone(), ty, result, decl.binder_info),
        };
    }
    Ok(result)
}
