use std::sync::Arc;

use super::*;
use crate::discovery::domain::{EntityKey, MarkerCategory, RankedEntity};
use crate::discovery::tests::common::{listing, office, project};
use crate::geo::Coordinate;

fn build(surface: HeadlessSurface) -> (MapController<HeadlessSurface>, Arc<EventLog>) {
    let log = Arc::new(EventLog::default());
    let controller = MapController::new(surface, log.clone(), MapOptions::default());
    (controller, log)
}

fn ready_controller() -> (MapController<HeadlessSurface>, Arc<EventLog>) {
    let (mut controller, log) = build(HeadlessSurface::new(800, 600));
    assert_eq!(controller.mount().expect("mount succeeds"), MapPhase::Ready);
    log.drain();
    (controller, log)
}

fn results() -> Vec<RankedEntity> {
    vec![
        RankedEntity::unranked(listing("l-1", 900_000.0, Some(150.0), &[])),
        RankedEntity::unranked(office("o-1")),
        RankedEntity::unranked(project("p-1", Some(1_100_000.0))),
    ]
}

fn fits(events: &[MapEvent]) -> Vec<FitReason> {
    events
        .iter()
        .filter_map(|event| match event {
            MapEvent::ViewportFitted { reason, .. } => Some(*reason),
            _ => None,
        })
        .collect()
}

#[test]
fn mount_walks_through_initializing_to_ready() {
    let (mut controller, log) = build(HeadlessSurface::new(800, 600));
    assert_eq!(controller.phase(), MapPhase::Uninitialized);

    controller.mount().expect("mount succeeds");

    assert_eq!(
        log.drain(),
        vec![
            MapEvent::PhaseChanged(MapPhase::Initializing),
            MapEvent::PhaseChanged(MapPhase::Ready)
        ]
    );
    assert_eq!(controller.surface().view(), Some(MapOptions::default().initial_view));
}

#[test]
fn mount_twice_is_rejected() {
    let (mut controller, _log) = ready_controller();
    assert_eq!(
        controller.mount(),
        Err(MapError::InvalidPhase {
            operation: "mount",
            phase: MapPhase::Ready
        })
    );
}

#[test]
fn unsized_surface_fails_to_mount() {
    let (mut controller, _log) = build(HeadlessSurface::new(0, 0));
    assert!(matches!(controller.mount(), Err(MapError::Surface(_))));
    assert_eq!(controller.phase(), MapPhase::Uninitialized);
}

#[test]
fn showing_before_mount_is_rejected() {
    let (mut controller, _log) = build(HeadlessSurface::new(800, 600));
    let err = controller.show(&results()).expect_err("not mounted");
    assert_eq!(
        err,
        MapError::InvalidPhase {
            operation: "show markers",
            phase: MapPhase::Uninitialized
        }
    );
}

#[test]
fn identical_sets_do_not_touch_markers() {
    let (mut controller, _log) = ready_controller();
    let entities = results();

    let first = controller.show(&entities).expect("first show");
    assert_eq!(first.added, 3);

    let second = controller.show(&entities).expect("second show");
    assert_eq!((second.added, second.removed, second.retained), (0, 0, 3));
    assert_eq!(controller.surface().adds, 3);
    assert_eq!(controller.surface().removes, 0);
    assert_eq!(controller.view_state().marker_count(), 3);
}

#[test]
fn changed_set_only_adds_and_removes_the_difference() {
    let (mut controller, _log) = ready_controller();
    controller.show(&results()).expect("first show");
    let kept = controller
        .view_state()
        .marker_handle(&office("o-1").key())
        .expect("office marker");

    let next = vec![
        RankedEntity::unranked(office("o-1")),
        RankedEntity::unranked(office("o-2")),
    ];
    let report = controller.show(&next).expect("second show");

    assert_eq!((report.added, report.removed, report.retained), (1, 2, 1));
    assert_eq!(controller.surface().marker_count(), 2);
    assert_eq!(
        controller.view_state().marker_handle(&office("o-1").key()),
        Some(kept)
    );
}

#[test]
fn initial_bounds_are_fitted_once() {
    let (mut controller, log) = ready_controller();

    let first = controller.show(&results()).expect("first show");
    assert_eq!(first.fitted, Some(FitReason::Initial));
    assert!(controller.view_state().has_fitted_initial_bounds());

    let second = controller.show(&results()[..1]).expect("narrowed show");
    assert_eq!(second.fitted, None);

    assert_eq!(fits(&log.drain()), vec![FitReason::Initial]);
    assert_eq!(controller.surface().view_changes, 1);
}

#[test]
fn empty_first_set_does_not_consume_the_initial_fit() {
    let (mut controller, _log) = ready_controller();

    let empty = controller.show(&[]).expect("empty show");
    assert_eq!(empty.fitted, None);
    assert!(!controller.view_state().has_fitted_initial_bounds());

    let populated = controller.show(&results()).expect("populated show");
    assert_eq!(populated.fitted, Some(FitReason::Initial));
}

#[test]
fn user_pan_survives_later_updates() {
    let (mut controller, _log) = ready_controller();
    controller.show(&results()).expect("first show");

    let panned = Coordinate {
        latitude: 26.42,
        longitude: 50.08,
    };
    controller.on_user_viewport(panned, 11.0);
    controller.show(&results()[1..]).expect("refresh");

    assert_eq!(controller.view_state().center(), panned);
    assert_eq!(controller.view_state().zoom(), 11.0);
}

#[test]
fn user_filter_change_refits_to_new_results() {
    let (mut controller, log) = ready_controller();
    controller.show(&results()).expect("first show");
    log.drain();

    let narrowed = vec![RankedEntity::unranked(office("o-1"))];
    let report = controller
        .show_after_user_filter(&narrowed)
        .expect("user filter");

    assert_eq!(report.fitted, Some(FitReason::UserFilterChange));
    assert_eq!(fits(&log.drain()), vec![FitReason::UserFilterChange]);
    let center = controller.view_state().center();
    let target = office("o-1").coordinate;
    assert!((center.latitude - target.latitude).abs() < 1e-9);
    assert!((center.longitude - target.longitude).abs() < 1e-9);
}

#[test]
fn explicit_refit_with_no_markers_is_a_noop() {
    let (mut controller, log) = ready_controller();
    assert_eq!(controller.refit().expect("refit"), None);
    assert!(log.drain().is_empty());

    controller.show(&results()).expect("show");
    assert!(controller.refit().expect("refit").is_some());
}

#[test]
fn selecting_the_same_marker_twice_emits_once() {
    let (mut controller, log) = ready_controller();
    controller.show(&results()).expect("show");
    log.drain();

    let key = office("o-1").key();
    controller.select(&key).expect("select");
    controller.select(&key).expect("reselect");

    let events = log.drain();
    assert_eq!(events.len(), 1);
    assert!(matches!(
        &events[0],
        MapEvent::SelectionChanged(Some(entity)) if entity.key() == key
    ));
    assert_eq!(controller.selected().map(|entity| entity.key()), Some(key));
}

#[test]
fn selecting_another_marker_replaces_the_selection() {
    let (mut controller, log) = ready_controller();
    controller.show(&results()).expect("show");

    controller.select(&office("o-1").key()).expect("select office");
    controller
        .select(&project("p-1", None).key())
        .expect("select project");
    log.drain();

    assert_eq!(
        controller.selected().map(|entity| entity.id.0.as_str()),
        Some("p-1")
    );
    controller.clear_selection();
    controller.clear_selection();
    assert_eq!(log.drain(), vec![MapEvent::SelectionChanged(None)]);
}

#[test]
fn removing_the_selected_marker_clears_selection() {
    let (mut controller, log) = ready_controller();
    controller.show(&results()).expect("show");
    controller.select(&office("o-1").key()).expect("select");
    log.drain();

    controller.show(&results()[..1]).expect("narrowed show");

    assert!(controller.selected().is_none());
    assert_eq!(log.drain(), vec![MapEvent::SelectionChanged(None)]);
}

#[test]
fn selecting_unknown_entity_fails() {
    let (mut controller, _log) = ready_controller();
    let key: EntityKey = office("ghost").key();
    assert_eq!(
        controller.select(&key),
        Err(MapError::UnknownEntity(key.clone()))
    );
}

#[test]
fn open_detail_requests_navigation() {
    let (mut controller, log) = ready_controller();
    controller.show(&results()).expect("show");
    log.drain();

    let route = controller
        .open_detail(&project("p-1", None).key())
        .expect("detail route");

    assert_eq!(route.path(), "/projects/p-1");
    assert_eq!(log.drain(), vec![MapEvent::NavigationRequested(route)]);
}

#[test]
fn teardown_is_idempotent() {
    let (mut controller, log) = ready_controller();
    controller.show(&results()).expect("show");

    controller.teardown();
    controller.teardown();

    assert_eq!(controller.phase(), MapPhase::Destroyed);
    assert_eq!(controller.surface().destroy_calls, 1);
    assert_eq!(controller.surface().removes, 3);
    assert_eq!(controller.view_state().marker_count(), 0);
    assert_eq!(
        log.drain().last(),
        Some(&MapEvent::PhaseChanged(MapPhase::Destroyed))
    );
    assert!(matches!(
        controller.show(&results()),
        Err(MapError::InvalidPhase {
            phase: MapPhase::Destroyed,
            ..
        })
    ));
}

#[test]
fn moved_or_recategorized_entity_is_redrawn() {
    let (mut controller, _log) = ready_controller();
    let original = listing("l-1", 900_000.0, Some(150.0), &[]);
    controller
        .show(&[
            RankedEntity::unranked(original.clone()),
            RankedEntity::unranked(office("o-1")),
        ])
        .expect("initial show");
    let office_handle = controller
        .view_state()
        .marker_handle(&office("o-1").key())
        .expect("office marker");

    let mut moved = original.clone();
    moved.coordinate = Coordinate {
        latitude: 25.0,
        longitude: 46.6,
    };
    moved.category = MarkerCategory::Rent;
    let report = controller
        .show(&[
            RankedEntity::unranked(moved),
            RankedEntity::unranked(office("o-1")),
        ])
        .expect("refetched show");

    assert_eq!(
        (report.added, report.removed, report.updated, report.retained),
        (0, 0, 1, 1)
    );
    let drawn = controller
        .surface()
        .markers()
        .find(|spec| spec.key == original.key())
        .expect("listing marker drawn");
    assert_eq!(drawn.coordinate.latitude, 25.0);
    assert_eq!(drawn.category, MarkerCategory::Rent);
    assert_eq!(drawn.color, MarkerCategory::Rent.color());
    assert_eq!(controller.surface().marker_count(), 2);
    assert_eq!(
        controller.view_state().marker_handle(&office("o-1").key()),
        Some(office_handle)
    );
}

#[test]
fn teardown_before_mount_leaves_surface_alone() {
    let (mut controller, log) = build(HeadlessSurface::new(800, 600));
    controller.teardown();

    assert_eq!(controller.phase(), MapPhase::Destroyed);
    assert_eq!(controller.surface().destroy_calls, 0);
    assert_eq!(log.drain(), vec![MapEvent::PhaseChanged(MapPhase::Destroyed)]);
}

#[test]
fn dropping_the_controller_tears_down() {
    let (controller, log) = ready_controller();
    drop(controller);
    assert_eq!(log.drain(), vec![MapEvent::PhaseChanged(MapPhase::Destroyed)]);
}

#[test]
fn results_arriving_before_tiles_load_are_applied_once_ready() {
    let (mut controller, log) = build(HeadlessSurface::deferred(800, 600));
    assert_eq!(controller.mount().expect("mount"), MapPhase::Initializing);

    let report = controller.show(&results()).expect("deferred show");
    assert!(report.deferred);
    assert_eq!(controller.surface().adds, 0);
    assert!(!controller.poll_ready().expect("still loading"));

    controller.surface().finish_loading();
    assert!(controller.poll_ready().expect("ready"));

    assert_eq!(controller.phase(), MapPhase::Ready);
    assert_eq!(controller.view_state().marker_count(), 3);
    assert_eq!(fits(&log.drain()), vec![FitReason::Initial]);
}

#[test]
fn user_filter_path_requires_ready_map() {
    let (mut controller, _log) = build(HeadlessSurface::deferred(800, 600));
    controller.mount().expect("mount");

    assert!(matches!(
        controller.show_after_user_filter(&results()),
        Err(MapError::InvalidPhase {
            phase: MapPhase::Initializing,
            ..
        })
    ));
}
