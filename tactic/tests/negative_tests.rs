//! Failure modes of binder introduction.
//!
//! Every failing call must leave the state exactly as it found it: no goal
//! assigned, no declaration added, the name generator untouched.

use insta::assert_snapshot;
use kernel::test_support::parse_term;
use kernel::{Definition, Env, MVarId, Name, ReduceError, Term};
use tactic::{
    intro, intro1, intro1_p, intro_n, intro_np, intros, MetaError, MetaOptions, MetaState, NameGenerator,
};

fn setup(defs: Vec<Definition>) -> MetaState {
    let mut env = Env::new();
    for def in defs {
        env.add_definition(def).expect("definition");
    }
    MetaState::new(env).with_options(MetaOptions::default().with_hygienic(true))
}

fn goal_of(state: &mut MetaState, src: &str) -> MVarId {
    state
        .mk_goal(parse_term(src).expect("Failed to parse goal"))
        .expect("Failed to declare goal")
}

/// Snapshot of everything a failed call could have touched.
fn fingerprint(state: &MetaState, goal: MVarId) -> (u64, usize, bool) {
    (state.ngen.peek(), state.mctx.num_decls(), state.mctx.is_assigned(goal))
}

// =============================================================================
// INSUFFICIENT BINDERS
// =============================================================================

#[test]
fn negative_too_few_binders() {
    let mut state = setup(vec![]);
    let goal = goal_of(&mut state, "(pi a A (pi b B C))");
    let before = fingerprint(&state, goal);

    let err = intro_n(&mut state, goal, 3, &[], false).unwrap_err();

    assert_eq!(err, MetaError::InsufficientBinders { tactic: "introN", goal });
    assert_snapshot!(err.to_string(), @"introN failed, insufficient number of binders (goal ?m.1)");
    assert_eq!(fingerprint(&state, goal), before);
}

#[test]
fn negative_opaque_definition_stays_stuck() {
    let mut opaque = Definition::new("Hidden", Term::prop(), parse_term("(pi h A B)").unwrap());
    opaque.mark_opaque();
    let mut state = setup(vec![opaque]);
    let goal = goal_of(&mut state, "(pi x X Hidden)");
    let before = fingerprint(&state, goal);

    let result = intro_n(&mut state, goal, 2, &[], false);

    assert!(matches!(result, Err(MetaError::InsufficientBinders { .. })));
    assert_eq!(fingerprint(&state, goal), before);
}

#[test]
fn negative_intro1_on_non_binder() {
    let mut state = setup(vec![]);
    let goal = goal_of(&mut state, "(app P a)");

    let err = intro1(&mut state, goal).unwrap_err();
    assert_snapshot!(err.to_string(), @"intro1 failed, insufficient number of binders (goal ?m.1)");
    let err = intro1_p(&mut state, goal).unwrap_err();
    assert_snapshot!(err.to_string(), @"intro1P failed, insufficient number of binders (goal ?m.1)");
    let err = intro(&mut state, goal, "h").unwrap_err();
    assert_eq!(err.goal(), Some(goal));
}

#[test]
fn negative_given_names_do_not_add_binders() {
    let mut state = setup(vec![]);
    let goal = goal_of(&mut state, "(pi a A B)");
    let given: Vec<Name> = ["x", "y"].iter().map(|s| Name::from(*s)).collect();

    assert!(intro_n(&mut state, goal, 2, &given, false).is_err());
    assert!(!state.mctx.is_assigned(goal));
}

// =============================================================================
// GOAL STATE ERRORS
// =============================================================================

#[test]
fn negative_goal_already_assigned() {
    let mut state = setup(vec![]);
    let goal = goal_of(&mut state, "(pi a A B)");
    state.assign(goal, Term::constant("done")).unwrap();

    let err = intro_n(&mut state, goal, 1, &[], false).unwrap_err();
    assert_snapshot!(err.to_string(), @"introN failed, metavariable ?m.1 has already been assigned");

    assert!(matches!(intros(&mut state, goal), Err(MetaError::AlreadyAssigned { tactic: "intros", .. })));
    assert!(matches!(intro_np(&mut state, goal, 1), Err(MetaError::AlreadyAssigned { .. })));
    assert_eq!(state.mctx.get_assignment(goal), Some(&Term::constant("done")));
}

#[test]
fn negative_already_assigned_even_for_zero_binders() {
    let mut state = setup(vec![]);
    let goal = goal_of(&mut state, "A");
    state.assign(goal, Term::constant("a")).unwrap();

    assert!(matches!(
        intro_n(&mut state, goal, 0, &[], false),
        Err(MetaError::AlreadyAssigned { .. })
    ));
}

#[test]
fn negative_unknown_goal() {
    let mut state = setup(vec![]);
    let missing = MVarId(99);

    assert_eq!(intro_n(&mut state, missing, 1, &[], false), Err(MetaError::UnknownMVar(missing)));
    assert_eq!(intros(&mut state, missing), Err(MetaError::UnknownMVar(missing)));
}

#[test]
fn negative_second_intro_on_same_goal() {
    let mut state = setup(vec![]);
    let goal = goal_of(&mut state, "(pi a A (pi b B C))");

    intro1(&mut state, goal).unwrap();
    assert!(matches!(intro1(&mut state, goal), Err(MetaError::AlreadyAssigned { .. })));
}

#[test]
fn negative_new_goal_id_already_declared() {
    let mut state = setup(vec![]);
    let goal = goal_of(&mut state, "(pi a A B)");
    let other = goal_of(&mut state, "C");
    // Rewind the generator so the successor goal reuses `other`'s id.
    state.ngen = NameGenerator::starting_at(1);
    let before = fingerprint(&state, goal);
    let other_decl = state.goal_decl(other).unwrap().clone();

    let err = intro_n(&mut state, goal, 1, &[Name::from("a")], false).unwrap_err();

    assert_eq!(err, MetaError::MVarAlreadyDeclared(MVarId(2)));
    assert_snapshot!(err.to_string(), @"Metavariable ?m.2 is already declared");
    assert_eq!(fingerprint(&state, goal), before);
    assert_eq!(state.goal_decl(other).unwrap(), &other_decl);
}

// =============================================================================
// REDUCTION ERRORS
// =============================================================================

#[test]
fn negative_fuel_exhaustion_propagates() {
    let looping = Definition::new("loop", Term::prop(), Term::constant("loop"));
    let mut state = setup(vec![looping]);
    state.options = state.options.with_whnf_fuel(10);
    let goal = goal_of(&mut state, "(pi x A loop)");
    let before = fingerprint(&state, goal);

    let err = intro_n(&mut state, goal, 2, &[], false).unwrap_err();

    assert_eq!(err, MetaError::Reduce(ReduceError::FuelExhausted { fuel: 10 }));
    assert_eq!(err.goal(), None);
    assert_eq!(fingerprint(&state, goal), before);
}

#[test]
fn negative_best_effort_still_reports_fuel_exhaustion() {
    let looping = Definition::new("loop", Term::prop(), Term::constant("loop"));
    let mut state = setup(vec![looping]);
    state.options = state.options.with_whnf_fuel(5);
    let goal = goal_of(&mut state, "(pi x A loop)");

    assert!(matches!(intro_np(&mut state, goal, 3), Err(MetaError::Reduce(_))));
    assert!(!state.mctx.is_assigned(goal));
}
