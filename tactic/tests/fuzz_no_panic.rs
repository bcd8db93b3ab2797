use kernel::{BinderInfo, Definition, Env, Name, Term};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;
use tactic::{intro_n, intro_n_core, intro_np, intros, MetaError, MetaOptions, MetaState};

struct Lcg {
    state: u64,
}

impl Lcg {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next(&mut self) -> u64 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        self.state
    }

    fn gen_range(&mut self, max: usize) -> usize {
        if max == 0 {
            return 0;
        }
        (self.next() as usize) % max
    }
}

fn env() -> Env {
    let mut env = Env::new();
    env.add_definition(Definition::new(
        "Tele",
        Term::prop(),
        Term::pi("t", Term::constant("A"), Term::constant("A"), BinderInfo::Default),
    ))
    .expect("Tele");
    env.add_definition(Definition::axiom("Opaque", Term::prop()))
        .expect("Opaque");
    env
}

fn gen_name(rng: &mut Lcg) -> Name {
    match rng.gen_range(4) {
        0 => Name::Anonymous,
        1 => Name::from("x"),
        2 => Name::from("h"),
        _ => Name::from("_"),
    }
}

fn gen_info(rng: &mut Lcg) -> BinderInfo {
    match rng.gen_range(4) {
        0 => BinderInfo::Implicit,
        1 => BinderInfo::StrictImplicit,
        2 => BinderInfo::InstImplicit,
        _ => BinderInfo::Default,
    }
}

/// A closed-over-`depth` leaf: a constant or a predicate on some bound variable.
fn gen_leaf(rng: &mut Lcg, depth: usize) -> Rc<Term> {
    if depth > 0 && rng.gen_range(2) == 0 {
        Term::app(Term::constant("P"), Term::var(rng.gen_range(depth)))
    } else {
        Term::constant("A")
    }
}

fn gen_goal(rng: &mut Lcg, depth: usize, budget: usize) -> Rc<Term> {
    if budget == 0 {
        return gen_leaf(rng, depth);
    }
    match rng.gen_range(6) {
        0 | 1 => Term::pi(
            gen_name(rng),
            gen_leaf(rng, depth),
            gen_goal(rng, depth + 1, budget - 1),
            gen_info(rng),
        ),
        2 => Term::let_e(
            gen_name(rng),
            gen_leaf(rng, depth),
            gen_leaf(rng, depth),
            gen_goal(rng, depth + 1, budget - 1),
        ),
        3 => Term::constant("Tele"),
        4 => Term::constant("Opaque"),
        _ => gen_leaf(rng, depth),
    }
}

#[test]
fn fuzz_intro_no_panic() {
    for seed in 0..300u64 {
        let mut rng = Lcg::new(seed);
        let mut state = MetaState::new(env())
            .with_options(MetaOptions::default().with_hygienic(rng.gen_range(2) == 0));
        let ty = gen_goal(&mut rng, 0, 6);
        let goal = state.mk_goal(ty.clone()).expect("goal");
        let n = rng.gen_range(8);
        let mode = rng.gen_range(4);
        let before = state.ngen.clone();

        let result = catch_unwind(AssertUnwindSafe(|| match mode {
            0 => intro_n(&mut state, goal, n, &[], false),
            1 => intro_n_core(&mut state, goal, n, &[Name::from("k")], true, true),
            2 => intro_np(&mut state, goal, n),
            _ => intros(&mut state, goal),
        }));

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(_) => panic!("intro panicked (seed {}, mode {}, goal {})", seed, mode, ty),
        };
        match outcome {
            Ok((fvars, new_goal)) => {
                if mode < 2 {
                    assert_eq!(fvars.len(), n, "seed {}", seed);
                } else if mode == 2 {
                    assert!(fvars.len() <= n, "seed {}", seed);
                }
                if fvars.is_empty() {
                    assert_eq!(new_goal, goal);
                    assert!(!state.mctx.is_assigned(goal));
                } else {
                    assert!(state.mctx.is_assigned(goal));
                    let decl = state.goal_decl(new_goal).expect("new goal declared");
                    assert_eq!(decl.lctx.len(), fvars.len());
                    assert!(!decl.ty.has_loose_bvar(0), "seed {}", seed);
                }
            }
            Err(MetaError::InsufficientBinders { .. }) => {
                assert_eq!(state.ngen, before, "seed {}", seed);
                assert!(!state.mctx.is_assigned(goal));
            }
            Err(other) => panic!("unexpected error {} (seed {})", other, seed),
        }
    }
}
