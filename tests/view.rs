//! Integration tests for the league view reconciler: loading, stale loads, forced mode, seeding.

mod common;

use common::{admin, application, game, league, prelim, FakeLeagueService};
use tennis_league_web::{
    fetch_league_data, FilterKey, FinalModePolicy, FinalStageMode, GroupKey, LeagueView,
    LoadPhase, PreliminaryStatus, Stage, ViewMode,
};

fn service_with_groups() -> FakeLeagueService {
    let api = FakeLeagueService::with_league(league("L1"));
    api.set_matches(vec![prelim("a", 2, 3), prelim("b", 1, 1), prelim("c", 2, 2)]);
    api.set_applications("L1", vec![application("m1"), application("m2")]);
    api
}

#[tokio::test]
async fn load_fetches_all_four_resources() {
    let api = service_with_groups();
    let mut view = LeagueView::new();
    assert!(view.load(&api, "L1").await);

    assert_eq!(view.phase(), LoadPhase::Loaded);
    assert_eq!(view.league_id(), Some("L1"));
    assert_eq!(view.matches().len(), 3);
    assert_eq!(view.applications().len(), 2);
    assert_eq!(
        view.preliminary_status(),
        Some(PreliminaryStatus {
            is_complete: false,
            total_matches: 3,
            completed_matches: 0
        })
    );
    for op in ["league", "applications", "matches", "preliminary_status"] {
        assert_eq!(api.calls_to(op), 1, "{op}");
    }
}

#[tokio::test]
async fn preliminary_status_failure_is_tolerated() {
    let api = service_with_groups();
    api.fail("preliminary_status", 500, "boom");
    let mut view = LeagueView::new();
    view.load(&api, "L1").await;

    assert_eq!(view.phase(), LoadPhase::Loaded);
    assert_eq!(view.preliminary_status(), None);
    assert_eq!(view.matches().len(), 3);
}

#[tokio::test]
async fn any_other_failure_fails_the_load() {
    let api = service_with_groups();
    api.fail("matches", 500, "database unavailable");
    let mut view = LeagueView::new();
    view.load(&api, "L1").await;

    assert_eq!(view.phase(), LoadPhase::Error);
    assert_eq!(view.load_error(), Some("database unavailable"));
    assert!(view.data().is_none());

    let rendered = view.render(Some(&admin()));
    assert!(rendered.buckets.is_empty());
    assert!(rendered.matches.is_empty());
    assert!(rendered.next_match.is_none());
    assert!(!rendered.capabilities.can_generate_bracket);
}

#[tokio::test]
async fn unknown_league_reports_not_found() {
    let api = FakeLeagueService::default();
    let mut view = LeagueView::new();
    view.load(&api, "missing").await;
    assert_eq!(view.phase(), LoadPhase::Error);
    assert_eq!(view.load_error(), Some("League not found"));
}

#[tokio::test]
async fn stale_load_for_previous_league_is_discarded() {
    let api = FakeLeagueService::with_league(league("A"));
    api.add_league(league("B"));
    api.set_matches(vec![game("a1", "A", Stage::Preliminary, 1, 1, 0)]);
    let mut view = LeagueView::new();

    let ticket_a = view.begin_load("A");
    let ticket_b = view.begin_load("B");
    assert!(!view.is_current(&ticket_a));

    let outcome_a = fetch_league_data(&api, ticket_a).await;
    assert_eq!(outcome_a.ticket().league_id(), "A");
    assert!(!view.apply_load(outcome_a));
    assert_eq!(view.phase(), LoadPhase::Loading);
    assert!(view.data().is_none());

    let outcome_b = fetch_league_data(&api, ticket_b).await;
    assert!(view.apply_load(outcome_b));
    assert_eq!(view.league().unwrap().id, "B");
    assert!(view.matches().is_empty());
}

#[tokio::test]
async fn results_arriving_after_leave_are_ignored() {
    let api = service_with_groups();
    let mut view = LeagueView::new();
    let ticket = view.begin_load("L1");
    view.leave();

    let outcome = fetch_league_data(&api, ticket).await;
    assert!(!view.apply_load(outcome));
    assert_eq!(view.phase(), LoadPhase::Idle);
    assert_eq!(view.league_id(), None);
}

#[tokio::test]
async fn final_stage_forces_final_mode_once_per_session() {
    let api = service_with_groups();
    let mut view = LeagueView::new();
    view.load(&api, "L1").await;
    assert_eq!(view.mode(), ViewMode::Preliminary);

    let mut matches = api.state.lock().unwrap().matches.clone();
    matches.push(game("r1", "L1", Stage::Ranked, 1, 0, 20));
    api.set_matches(matches);
    view.load(&api, "L1").await;
    assert_eq!(view.mode(), ViewMode::Final);

    view.set_mode(ViewMode::Preliminary);
    view.load(&api, "L1").await;
    assert_eq!(view.mode(), ViewMode::Preliminary);
}

#[tokio::test]
async fn continuous_policy_forces_final_mode_on_every_reload() {
    let api = service_with_groups();
    let mut matches = api.state.lock().unwrap().matches.clone();
    matches.push(game("r1", "L1", Stage::Ranked, 1, 0, 20));
    api.set_matches(matches);

    let mut view = LeagueView::with_policy(FinalModePolicy::Continuous);
    view.load(&api, "L1").await;
    assert_eq!(view.mode(), ViewMode::Final);

    view.set_mode(ViewMode::Preliminary);
    assert_eq!(view.mode(), ViewMode::Preliminary);
    view.load(&api, "L1").await;
    assert_eq!(view.mode(), ViewMode::Final);
}

#[tokio::test]
async fn reload_without_final_stage_keeps_final_mode() {
    let api = service_with_groups();
    let mut view = LeagueView::new();
    view.load(&api, "L1").await;
    view.set_mode(ViewMode::Final);

    view.load(&api, "L1").await;
    assert_eq!(view.mode(), ViewMode::Final);
    assert!(view.visible_matches().is_empty());
}

#[tokio::test]
async fn filter_is_seeded_from_first_group_and_then_kept() {
    let api = service_with_groups();
    let mut view = LeagueView::new();
    assert_eq!(view.filter(), FilterKey::All);

    view.load(&api, "L1").await;
    assert_eq!(view.filter(), FilterKey::Group(GroupKey(2)));
    let shown: Vec<_> = view.visible_matches().into_iter().map(|m| m.id).collect();
    assert_eq!(shown, ["a", "c"]);

    view.set_filter(FilterKey::All);
    view.load(&api, "L1").await;
    assert_eq!(view.filter(), FilterKey::All);
    assert_eq!(view.visible_matches().len(), 3);
}

#[tokio::test]
async fn generation_inputs_seed_from_league_unless_edited() {
    let mut stored = league("L1");
    stored.groups_count = Some(3);
    stored.courts_count = Some(2);
    let api = FakeLeagueService::with_league(stored);
    let mut view = LeagueView::new();
    assert_eq!(view.inputs().groups_count, 1);

    view.load(&api, "L1").await;
    assert_eq!(view.inputs().groups_count, 3);
    assert_eq!(view.inputs().courts_count, 2);

    view.set_inputs(5, 4);
    view.load(&api, "L1").await;
    assert_eq!(view.inputs().groups_count, 5);
    assert_eq!(view.inputs().courts_count, 4);
}

#[tokio::test]
async fn next_match_spans_all_stages() {
    let api = service_with_groups();
    let mut view = LeagueView::new();
    view.load(&api, "L1").await;
    view.set_filter(FilterKey::Group(GroupKey(2)));

    assert_eq!(view.next_match().unwrap().id, "b");
}

#[tokio::test]
async fn render_labels_matches_and_exposes_capabilities() {
    let mut stored = league("L1");
    stored.final_stage_mode = Some(FinalStageMode::Elimination);
    let api = FakeLeagueService::with_league(stored);
    api.set_matches(vec![
        prelim("p", 1, 0),
        game("sf", "L1", Stage::Elimination, 3, 0, 5),
        game("f", "L1", Stage::Elimination, 4, 0, 6),
    ]);
    let mut view = LeagueView::new();
    view.load(&api, "L1").await;

    let rendered = view.render(Some(&admin()));
    assert_eq!(rendered.phase, LoadPhase::Loaded);
    assert_eq!(rendered.view_mode, ViewMode::Final);
    assert!(rendered.has_final_stage);
    assert_eq!(rendered.buckets.len(), 1);
    assert_eq!(rendered.buckets[0].label, "tournament");
    let labels: Vec<_> = rendered.matches.iter().map(|r| r.stage_label.as_str()).collect();
    assert_eq!(labels, ["semifinal", "final"]);
    assert_eq!(rendered.next_match.as_ref().unwrap().stage_label, "group 1");
    assert!(rendered.capabilities.can_generate_bracket);
    assert!(rendered.capabilities.can_edit_matches);
    assert!(!rendered.capabilities.can_generate_final_stage);

    let anonymous = view.render(None);
    assert!(!anonymous.capabilities.can_generate_bracket);
    assert!(!anonymous.capabilities.can_edit_matches);

    let json = serde_json::to_value(&rendered).unwrap();
    assert_eq!(json["view_mode"], "final");
    assert_eq!(json["matches"][0]["stage_label"], "semifinal");
    assert_eq!(json["matches"][0]["id"], "sf");
}

#[tokio::test]
async fn switching_league_resets_session_state() {
    let api = service_with_groups();
    api.add_league(league("L2"));
    let mut view = LeagueView::new();
    view.load(&api, "L1").await;
    view.set_mode(ViewMode::Final);
    view.set_filter(FilterKey::All);

    view.load(&api, "L2").await;
    assert_eq!(view.mode(), ViewMode::Preliminary);
    assert_eq!(view.filter(), FilterKey::All);
    assert!(view.matches().is_empty());
    assert!(view.applications().is_empty());
}
