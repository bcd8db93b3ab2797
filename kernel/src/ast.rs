use crate::name::Name;
use std::fmt;
use std::rc::Rc;

/// Transparency levels for reduction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Transparency {
    None,      // Opaque / Irreducible
    Instances, // Type class instances
    Reducible, // Standard definitions (Transparent)
    All,       // Unfold everything (including Opaque if forced)
}

impl Transparency {
    /// Whether a definition tagged `def_transparency` unfolds under `self`.
    pub fn unfolds(self, def_transparency: Transparency) -> bool {
        match self {
            Transparency::All => true,
            Transparency::Reducible => def_transparency != Transparency::None,
            Transparency::Instances => def_transparency == Transparency::Instances,
            Transparency::None => false,
        }
    }
}

/// A global definition. Axioms and opaque constants have no value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    pub name: String,
    pub ty: Rc<Term>,
    pub value: Option<Rc<Term>>,
    /// Unfolding transparency hint
    pub transparency: Transparency,
}

impl Definition {
    pub fn new(name: impl Into<String>, ty: Rc<Term>, value: Rc<Term>) -> Self {
        Definition {
            name: name.into(),
            ty,
            value: Some(value),
            transparency: Transparency::Reducible,
        }
    }

    /// Create an axiom (assumed without proof)
    pub fn axiom(name: impl Into<String>, ty: Rc<Term>) -> Self {
        Definition {
            name: name.into(),
            ty,
            value: None,
            transparency: Transparency::None,
        }
    }

    /// Mark this definition as Opaque (Irreducible)
    pub fn mark_opaque(&mut self) {
        self.transparency = Transparency::None;
    }
}

// =============================================================================
// Identifiers
// =============================================================================

/// Identifier of a local hypothesis (free variable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FVarId(pub u64);

/// Identifier of a metavariable (goal).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MVarId(pub u64);

impl fmt::Display for FVarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_fvar.{}", self.0)
    }
}

impl fmt::Display for MVarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?m.{}", self.0)
    }
}

// =============================================================================
// Universe Levels
// =============================================================================

/// Universe levels
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Level {
    Zero,
    Succ(Box<Level>),
    Max(Box<Level>, Box<Level>),
    IMax(Box<Level>, Box<Level>),
    Param(String),
}

impl Level {
    pub fn one() -> Level {
        Level::Succ(Box::new(Level::Zero))
    }

    /// Closed levels built from `Zero`/`Succ` only.
    pub fn to_nat(&self) -> Option<usize> {
        match self {
            Level::Zero => Some(0),
            Level::Succ(inner) => inner.to_nat().map(|n| n + 1),
            _ => None,
        }
    }

    pub fn from_nat(n: usize) -> Level {
        (0..n).fold(Level::Zero, |acc, _| Level::Succ(Box::new(acc)))
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(n) = self.to_nat() {
            return write!(f, "{}", n);
        }
        match self {
            Level::Succ(inner) => write!(f, "(succ {})", inner),
            Level::Max(a, b) => write!(f, "(max {} {})", a, b),
            Level::IMax(a, b) => write!(f, "(imax {} {})", a, b),
            Level::Param(name) => write!(f, "{}", name),
            Level::Zero => write!(f, "0"),
        }
    }
}

/// Binder information (explicit, implicit, strict implicit, instance)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BinderInfo {
    #[default]
    Default,
    Implicit,
    StrictImplicit,
    InstImplicit,
}

impl BinderInfo {
    pub fn is_explicit(self) -> bool {
        self == BinderInfo::Default
    }
}

// =============================================================================
// Terms
// =============================================================================

/// The core terms of the calculus, using de Bruijn indices for bound
/// variables and ids for hypotheses and goals.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Term {
    /// Bound variable (de Bruijn index)
    Var(usize),
    /// Free variable: a hypothesis of some local context
    FVar(FVarId),
    /// Metavariable (goal / hole)
    Meta(MVarId),
    /// Universe
    Sort(Level),
    /// Constant (global definition)
    Const(String, Vec<Level>),
    /// Application: (f a)
    App(Rc<Term>, Rc<Term>),
    /// Lambda abstraction: \x:A. b
    Lam(Name, Rc<Term>, Rc<Term>, BinderInfo),
    /// Pi type: (x:A) -> B
    Pi(Name, Rc<Term>, Rc<Term>, BinderInfo),
    /// Let binding: let x:A = v in b
    LetE(Name, Rc<Term>, Rc<Term>, Rc<Term>),
}

/// The three shapes the introduction engine distinguishes.
#[derive(Debug, Clone, Copy)]
pub enum BinderShape<'a> {
    Forall {
        name: &'a Name,
        domain: &'a Rc<Term>,
        body: &'a Rc<Term>,
        info: BinderInfo,
    },
    Let {
        name: &'a Name,
        ty: &'a Rc<Term>,
        value: &'a Rc<Term>,
        body: &'a Rc<Term>,
    },
    Other,
}

impl fmt::Debug for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Var(idx) => f.debug_tuple("Var").field(idx).finish(),
            Term::FVar(id) => f.debug_tuple("FVar").field(&id.0).finish(),
            Term::Meta(id) => f.debug_tuple("Meta").field(&id.0).finish(),
            Term::Sort(level) => f.debug_tuple("Sort").field(level).finish(),
            Term::Const(name, levels) => f.debug_tuple("Const").field(name).field(levels).finish(),
            Term::App(fun, arg) => f.debug_tuple("App").field(fun).field(arg).finish(),
            Term::Lam(name, ty, body, info) => f
                .debug_tuple("Lam")
                .field(name)
                .field(ty)
                .field(body)
                .field(info)
                .finish(),
            Term::Pi(name, ty, body, info) => f
                .debug_tuple("Pi")
                .field(name)
                .field(ty)
                .field(body)
                .field(info)
                .finish(),
            Term::LetE(name, ty, val, body) => f
                .debug_tuple("LetE")
                .field(name)
                .field(ty)
                .field(val)
                .field(body)
                .finish(),
        }
    }
}

pub(crate) fn binder_keyword(base: &str, info: BinderInfo) -> String {
    match info {
        BinderInfo::Default => base.to_string(),
        BinderInfo::Implicit => format!("i{}", base),
        BinderInfo::StrictImplicit => format!("s{}", base),
        BinderInfo::InstImplicit => format!("inst{}", base),
    }
}

/// Renders terms in the s-expression syntax read by `test_support::Parser`.
impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Var(idx) => write!(f, "{}", idx),
            Term::FVar(id) => write!(f, "{}", id),
            Term::Meta(id) => write!(f, "{}", id),
            Term::Sort(level) => match level.to_nat() {
                Some(0) => write!(f, "Prop"),
                Some(1) => write!(f, "Type"),
                _ => write!(f, "(sort {})", level),
            },
            Term::Const(name, _) => write!(f, "{}", name),
            Term::App(fun, arg) => write!(f, "(app {} {})", fun, arg),
            Term::Lam(name, ty, body, info) => {
                write!(f, "({} {} {} {})", binder_keyword("lam", *info), name, ty, body)
            }
            Term::Pi(name, ty, body, info) => {
                write!(f, "({} {} {} {})", binder_keyword("pi", *info), name, ty, body)
            }
            Term::LetE(name, ty, val, body) => {
                write!(f, "(let {} {} {} {})", name, ty, val, body)
            }
        }
    }
}

// Helper constructors for convenience
impl Term {
    pub fn var(n: usize) -> Rc<Self> {
        Rc::new(Term::Var(n))
    }

    pub fn fvar(id: FVarId) -> Rc<Self> {
        Rc::new(Term::FVar(id))
    }

    pub fn meta(id: MVarId) -> Rc<Self> {
        Rc::new(Term::Meta(id))
    }

    pub fn sort(l: Level) -> Rc<Self> {
        Rc::new(Term::Sort(l))
    }

    pub fn prop() -> Rc<Self> {
        Term::sort(Level::Zero)
    }

    pub fn constant(name: impl Into<String>) -> Rc<Self> {
        Rc::new(Term::Const(name.into(), vec![]))
    }

    pub fn app(f: Rc<Term>, a: Rc<Term>) -> Rc<Self> {
        Rc::new(Term::App(f, a))
    }

    pub fn mk_app(f: Rc<Term>, args: &[Rc<Term>]) -> Rc<Self> {
        args.iter().fold(f, |acc, a| Term::app(acc, a.clone()))
    }

    pub fn lam(name: impl Into<Name>, ty: Rc<Term>, body: Rc<Term>, info: BinderInfo) -> Rc<Self> {
        Rc::new(Term::Lam(name.into(), ty, body, info))
    }

    pub fn pi(name: impl Into<Name>, ty: Rc<Term>, body: Rc<Term>, info: BinderInfo) -> Rc<Self> {
        Rc::new(Term::Pi(name.into(), ty, body, info))
    }

    /// Non-dependent arrow `A -> B`.
    pub fn arrow(ty: Rc<Term>, body: Rc<Term>) -> Rc<Self> {
        Rc::new(Term::Pi(Name::Anonymous, ty, body.shift(0, 1), BinderInfo::Default))
    }

    pub fn let_e(name: impl Into<Name>, ty: Rc<Term>, val: Rc<Term>, body: Rc<Term>) -> Rc<Self> {
        Rc::new(Term::LetE(name.into(), ty, val, body))
    }

    pub fn binder_shape(&self) -> BinderShape<'_> {
        match self {
            Term::Pi(name, domain, body, info) => BinderShape::Forall {
                name,
                domain,
                body,
                info: *info,
            },
            Term::LetE(name, ty, value, body) => BinderShape::Let {
                name,
                ty,
                value,
                body,
            },
            _ => BinderShape::Other,
        }
    }

    pub fn is_binder(&self) -> bool {
        matches!(self, Term::Pi(..) | Term::LetE(..))
    }

    /// Split `f a1 .. an` into `f` and `[a1, .., an]`.
    pub fn app_spine(self: &Rc<Self>) -> (Rc<Term>, Vec<Rc<Term>>) {
        let mut args = Vec::new();
        let mut current = self.clone();
        while let Term::App(f, a) = &*current {
            args.push(a.clone());
            let next = f.clone();
            current = next;
        }
        args.reverse();
        (current, args)
    }

    /// Shift loose indices in a term by `d` above cutoff `c`.
    pub fn shift(self: &Rc<Self>, c: usize, d: usize) -> Rc<Term> {
        if d == 0 {
            return self.clone();
        }
        match &**self {
            Term::Var(k) => {
                if *k < c {
                    self.clone()
                } else {
                    Rc::new(Term::Var(k + d))
                }
            }
            Term::FVar(_) | Term::Meta(_) | Term::Sort(_) | Term::Const(..) => self.clone(),
            Term::App(f, a) => Term::app(f.shift(c, d), a.shift(c, d)),
            Term::Lam(n, ty, body, info) => {
                Term::lam(n.clone(), ty.shift(c, d), body.shift(c + 1, d), *info)
            }
            Term::Pi(n, ty, body, info) => {
                Term::pi(n.clone(), ty.shift(c, d), body.shift(c + 1, d), *info)
            }
            Term::LetE(n, ty, v, b) => {
                Term::let_e(n.clone(), ty.shift(c, d), v.shift(c, d), b.shift(c + 1, d))
            }
        }
    }

    /// Substitute `s` for variable `k`, lowering the indices above it.
    pub fn subst(self: &Rc<Self>, k: usize, s: &Rc<Term>) -> Rc<Term> {
        match &**self {
            Term::Var(i) => {
                if *i == k {
                    s.clone()
                } else if *i > k {
                    Rc::new(Term::Var(i - 1))
                } else {
                    self.clone()
                }
            }
            Term::FVar(_) | Term::Meta(_) | Term::Sort(_) | Term::Const(..) => self.clone(),
            Term::App(f, a) => Term::app(f.subst(k, s), a.subst(k, s)),
            Term::Lam(n, ty, body, info) => Term::lam(
                n.clone(),
                ty.subst(k, s),
                body.subst(k + 1, &s.shift(0, 1)),
                *info,
            ),
            Term::Pi(n, ty, body, info) => Term::pi(
                n.clone(),
                ty.subst(k, s),
                body.subst(k + 1, &s.shift(0, 1)),
                *info,
            ),
            Term::LetE(n, ty, v, b) => Term::let_e(
                n.clone(),
                ty.subst(k, s),
                v.subst(k, s),
                b.subst(k + 1, &s.shift(0, 1)),
            ),
        }
    }

    /// Replace the loose bound variables `0..n` (with `n = args.len()`) by
    /// `args` in reverse order: `Var(0)` becomes the last argument.
    pub fn instantiate_rev(self: &Rc<Self>, args: &[Rc<Term>]) -> Rc<Term> {
        self.instantiate_rev_range(0, args.len(), args)
    }

    /// `instantiate_rev` restricted to `args[begin..end]`.
    ///
    /// Loose indices past the substituted run are lowered by `end - begin`.
    pub fn instantiate_rev_range(
        self: &Rc<Self>,
        begin: usize,
        end: usize,
        args: &[Rc<Term>],
    ) -> Rc<Term> {
        let end = end.min(args.len());
        if begin >= end {
            return self.clone();
        }
        instantiate_rev_at(self, 0, &args[begin..end])
    }

    /// Turn each free variable of `fvars` into a bound variable, the last id
    /// becoming `Var(0)`. Inverse of `instantiate_rev` on fvar arguments.
    pub fn abstract_fvars(self: &Rc<Self>, fvars: &[FVarId]) -> Rc<Term> {
        if fvars.is_empty() {
            return self.clone();
        }
        abstract_at(self, 0, fvars)
    }

    pub fn has_loose_bvar(&self, idx: usize) -> bool {
        let mut current = self;
        let mut idx = idx;
        loop {
            match current {
                Term::Var(k) => return *k == idx,
                Term::FVar(_) | Term::Meta(_) | Term::Sort(_) | Term::Const(..) => return false,
                Term::App(f, a) => {
                    if a.has_loose_bvar(idx) {
                        return true;
                    }
                    current = f.as_ref();
                }
                Term::Lam(_, ty, body, _) | Term::Pi(_, ty, body, _) => {
                    if ty.has_loose_bvar(idx) {
                        return true;
                    }
                    current = body.as_ref();
                    idx += 1;
                }
                Term::LetE(_, ty, v, b) => {
                    if ty.has_loose_bvar(idx) || v.has_loose_bvar(idx) {
                        return true;
                    }
                    current = b.as_ref();
                    idx += 1;
                }
            }
        }
    }

    /// Walks binder bodies and application heads in a loop, so long
    /// telescopes do not grow the stack.
    pub fn has_meta(&self) -> bool {
        let mut current = self;
        loop {
            match current {
                Term::Meta(_) => return true,
                Term::Var(_) | Term::FVar(_) | Term::Sort(_) | Term::Const(..) => return false,
                Term::App(f, a) => {
                    if a.has_meta() {
                        return true;
                    }
                    current = f.as_ref();
                }
                Term::Lam(_, ty, body, _) | Term::Pi(_, ty, body, _) => {
                    if ty.has_meta() {
                        return true;
                    }
                    current = body.as_ref();
                }
                Term::LetE(_, ty, v, b) => {
                    if ty.has_meta() || v.has_meta() {
                        return true;
                    }
                    current = b.as_ref();
                }
            }
        }
    }

    /// Reduce top-level beta redexes `(\x. b) a ..` only.
    pub fn head_beta(self: &Rc<Self>) -> Rc<Term> {
        let (mut head, mut args) = self.app_spine();
        if !matches!(&*head, Term::Lam(..)) || args.is_empty() {
            return self.clone();
        }
        let mut consumed = 0;
        loop {
            if let Term::Lam(_, _, body, _) = &*head {
                if consumed == args.len() {
                    break;
                }
                let next = body.subst(0, &args[consumed]);
                head = next;
                consumed += 1;
                continue;
            }
            // The reduct may itself be an application headed by a lambda.
            if !matches!(&*head, Term::App(..)) {
                break;
            }
            let (inner_head, inner_args) = head.app_spine();
            if !matches!(&*inner_head, Term::Lam(..)) {
                break;
            }
            let rest = args.split_off(consumed);
            args = inner_args;
            args.extend(rest);
            consumed = 0;
            head = inner_head;
        }
        Term::mk_app(head, &args[consumed..])
    }
}

thread_local! {
    /// Stand-in left behind when `Drop` detaches a child node.
    static DETACHED: Rc<Term> = Rc::new(Term::Sort(Level::Zero));
}

impl Term {
    /// Move uniquely owned compound children into `out`.
    fn detach_children(&mut self, out: &mut Vec<Rc<Term>>) {
        let mut detach = |slot: &mut Rc<Term>| {
            if Rc::strong_count(slot) != 1 || slot.is_atomic() {
                return;
            }
            // During thread teardown the stand-in may be gone; plain drop then.
            if let Ok(hole) = DETACHED.try_with(Rc::clone) {
                out.push(std::mem::replace(slot, hole));
            }
        };
        match self {
            Term::App(f, a) => {
                detach(f);
                detach(a);
            }
            Term::Lam(_, ty, body, _) | Term::Pi(_, ty, body, _) => {
                detach(ty);
                detach(body);
            }
            Term::LetE(_, ty, v, b) => {
                detach(ty);
                detach(v);
                detach(b);
            }
            Term::Var(_) | Term::FVar(_) | Term::Meta(_) | Term::Sort(_) | Term::Const(..) => {}
        }
    }

    fn is_atomic(&self) -> bool {
        matches!(
            self,
            Term::Var(_) | Term::FVar(_) | Term::Meta(_) | Term::Sort(_) | Term::Const(..)
        )
    }
}

/// Terms can be as deep as the telescopes they describe, so dropping one
/// uses an explicit work list instead of recursion.
impl Drop for Term {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.detach_children(&mut pending);
        while let Some(child) = pending.pop() {
            if let Ok(mut term) = Rc::try_unwrap(child) {
                term.detach_children(&mut pending);
            }
        }
    }
}

fn instantiate_rev_at(t: &Rc<Term>, depth: usize, subst: &[Rc<Term>]) -> Rc<Term> {
    match &**t {
        Term::Var(idx) => {
            if *idx < depth {
                t.clone()
            } else if idx - depth < subst.len() {
                subst[subst.len() - 1 - (idx - depth)].shift(0, depth)
            } else {
                Rc::new(Term::Var(idx - subst.len()))
            }
        }
        Term::FVar(_) | Term::Meta(_) | Term::Sort(_) | Term::Const(..) => t.clone(),
        Term::App(f, a) => Term::app(
            instantiate_rev_at(f, depth, subst),
            instantiate_rev_at(a, depth, subst),
        ),
        Term::Lam(n, ty, body, info) => Term::lam(
            n.clone(),
            instantiate_rev_at(ty, depth, subst),
            instantiate_rev_at(body, depth + 1, subst),
            *info,
        ),
        Term::Pi(n, ty, body, info) => Term::pi(
            n.clone(),
            instantiate_rev_at(ty, depth, subst),
            instantiate_rev_at(body, depth + 1, subst),
            *info,
        ),
        Term::LetE(n, ty, v, b) => Term::let_e(
            n.clone(),
            instantiate_rev_at(ty, depth, subst),
            instantiate_rev_at(v, depth, subst),
            instantiate_rev_at(b, depth + 1, subst),
        ),
    }
}

fn abstract_at(t: &Rc<Term>, depth: usize, fvars: &[FVarId]) -> Rc<Term> {
    match &**t {
        Term::FVar(id) => match fvars.iter().rposition(|f| f == id) {
            Some(pos) => Term::var(depth + fvars.len() - 1 - pos),
            None => t.clone(),
        },
        Term::Var(_) | Term::Meta(_) | Term::Sort(_) | Term::Const(..) => t.clone(),
        Term::App(f, a) => Term::app(abstract_at(f, depth, fvars), abstract_at(a, depth, fvars)),
        Term::Lam(n, ty, body, info) => Term::lam(
            n.clone(),
            abstract_at(ty, depth, fvars),
            abstract_at(body, depth + 1, fvars),
            *info,
        ),
        Term::Pi(n, ty, body, info) => Term::pi(
            n.clone(),
            abstract_at(ty, depth, fvars),
            abstract_at(body, depth + 1, fvars),
            *info,
        ),
        Term::LetE(n, ty, v, b) => Term::let_e(
            n.clone(),
            abstract_at(ty, depth, fvars),
            abstract_at(v, depth, fvars),
            abstract_at(b, depth + 1, fvars),
        ),
    }
}
