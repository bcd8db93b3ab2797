use kernel::test_support::parse_term;
use kernel::{Env, MVarId, Name};
use tactic::{intro_n, intro_n_core, MetaOptions, MetaState};

fn fresh_state() -> MetaState {
    MetaState::new(Env::new()).with_options(MetaOptions::default().with_hygienic(true))
}

fn goal_of(state: &mut MetaState, src: &str) -> MVarId {
    state
        .mk_goal(parse_term(src).expect("Failed to parse goal"))
        .expect("Failed to declare goal")
}

const GOAL: &str = "(pi a A (ipi b (app B 0) (let c C c0 (pi _ D (app E 3 2 1 0)))))";

#[test]
fn same_inputs_give_identical_results() {
    let run = || {
        let mut state = fresh_state();
        let goal = goal_of(&mut state, GOAL);
        let (fvars, new_goal) = intro_n(&mut state, goal, 4, &[], false).unwrap();
        let decl = state.goal_decl(new_goal).unwrap().clone();
        (fvars, new_goal, decl, state.ngen.clone())
    };
    assert_eq!(run(), run());
}

#[test]
fn failed_run_does_not_disturb_later_names() {
    let mut clean = fresh_state();
    let clean_goal = goal_of(&mut clean, GOAL);
    let (_, clean_new) = intro_n(&mut clean, clean_goal, 4, &[], false).unwrap();

    let mut retried = fresh_state();
    let goal = goal_of(&mut retried, GOAL);
    assert!(intro_n(&mut retried, goal, 9, &[], false).is_err());
    let (_, retried_new) = intro_n(&mut retried, goal, 4, &[], false).unwrap();

    assert_eq!(clean_new, retried_new);
    assert_eq!(
        clean.goal_decl(clean_new).unwrap().lctx,
        retried.goal_decl(retried_new).unwrap().lctx
    );
}

#[test]
fn suffixes_are_reproducible() {
    let names_after = || {
        let mut state = fresh_state();
        let goal = goal_of(&mut state, "(pi x A (pi x B (pi x C D)))");
        let (_, new_goal) = intro_n_core(&mut state, goal, 3, &[], false, true).unwrap();
        state
            .goal_decl(new_goal)
            .unwrap()
            .lctx
            .iter()
            .map(|d| d.user_name.clone())
            .collect::<Vec<_>>()
    };
    let expected: Vec<Name> = ["x", "x_1", "x_2"].iter().map(|s| Name::from(*s)).collect();
    assert_eq!(names_after(), expected);
    assert_eq!(names_after(), expected);
}

#[test]
fn hygienic_names_are_distinct_within_a_run() {
    let mut state = fresh_state();
    let goal = goal_of(&mut state, "(pi x A (pi x B C))");

    let (_, new_goal) = intro_n(&mut state, goal, 2, &[], false).unwrap();

    let decls: Vec<Name> = state
        .goal_decl(new_goal)
        .unwrap()
        .lctx
        .iter()
        .map(|d| d.user_name.clone())
        .collect();
    assert_eq!(decls[0].to_string(), decls[1].to_string());
    assert_ne!(decls[0], decls[1]);
}
