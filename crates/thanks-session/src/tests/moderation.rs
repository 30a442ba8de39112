use std::cell::RefCell;

use thanks_core::moderation::ReportStatus::{Deleted, Ignored, Pending};
use thanks_core::moderation::{TransitionError, ViewScope};

use super::{post, report};
use crate::confirm::{AlwaysConfirm, NeverConfirm};
use crate::moderation::{ModerationBoard, ModerationError};
use crate::types::ViewId;

fn ids(board: &ModerationBoard, view: ViewId) -> Vec<u64> {
    board.view(view).unwrap().posts().iter().map(|p| p.id).collect()
}

/// Board with an active view and an all-posts view over the same posts.
fn loaded_board() -> (ModerationBoard, ViewId, ViewId) {
    let mut board = ModerationBoard::new();
    let (active, req) = board.open_view(ViewScope::Active);
    let fetched = vec![
        post(1, "ありがとう", "2024-05-01T09:00:00", vec![report(10, "Suzuki", Pending)]),
        post(2, "助かりました", "2024-05-02T09:00:00", vec![report(20, "Ito", Pending), report(21, "Kato", Ignored)]),
        post(3, "Thanks!", "2024-04-30T09:00:00", vec![report(30, "Ito", Ignored)]),
        post(4, "お疲れさま", "2024-04-29T09:00:00", vec![]),
    ];
    assert!(board.receive_view(active, req.ticket, Ok(fetched.clone())));
    let (all, req) = board.open_view(ViewScope::All);
    assert!(board.receive_view(all, req.ticket, Ok(fetched)));
    (board, active, all)
}

#[test]
fn test_views_filtered_by_scope_newest_first() {
    let (board, active, all) = loaded_board();
    assert_eq!(ids(&board, active), vec![2, 1]);
    assert_eq!(ids(&board, all), vec![2, 1, 3, 4]);
    assert_eq!(board.status_of(2), Some(Pending));
    assert_eq!(board.status_of(3), Some(Ignored));
    assert_eq!(board.status_of(4), None);
}

#[test]
fn test_delete_only_report_removes_post_from_active_view() {
    let (mut board, active, all) = loaded_board();
    let req = board.apply_status(10, Deleted, &AlwaysConfirm).unwrap().unwrap();

    // Nothing moves before the server answers.
    assert_eq!(ids(&board, active), vec![2, 1]);
    assert_eq!(board.report(10).unwrap().status, Pending);

    assert!(board.receive_status(req.ticket, Ok(())));
    assert_eq!(board.status_of(1), Some(Deleted));
    assert_eq!(ids(&board, active), vec![2]);
    let in_all = &board.view(all).unwrap().posts()[1];
    assert_eq!(in_all.id, 1);
    assert_eq!(in_all.status, Some(Deleted));
}

#[test]
fn test_deleted_view_gains_post_on_delete() {
    let (mut board, _, _) = loaded_board();
    let (deleted, req) = board.open_view(ViewScope::Deleted);
    assert!(board.receive_view(deleted, req.ticket, Ok(vec![])));

    let req = board.apply_status(20, Deleted, &AlwaysConfirm).unwrap().unwrap();
    board.receive_status(req.ticket, Ok(()));
    assert_eq!(ids(&board, deleted), vec![2]);
}

#[test]
fn test_ignoring_one_of_two_keeps_post_pending() {
    let (mut board, active, _) = loaded_board();
    let (extra, req) = board.open_view(ViewScope::Reported);
    board.receive_view(
        extra,
        req.ticket,
        Ok(vec![post(5, "x", "2024-05-03T00:00:00", vec![report(50, "A", Pending), report(51, "B", Pending)])]),
    );
    let req = board.apply_status(50, Ignored, &AlwaysConfirm).unwrap().unwrap();
    board.receive_status(req.ticket, Ok(()));
    assert_eq!(board.status_of(5), Some(Pending));
    // The active view learned about post 5 from the other fetch.
    assert_eq!(ids(&board, active), vec![5, 2, 1]);
}

#[test]
fn test_failed_update_changes_nothing() {
    let (mut board, active, _) = loaded_board();
    let req = board.apply_status(10, Deleted, &AlwaysConfirm).unwrap().unwrap();
    assert!(board.receive_status(req.ticket, Err("403 Forbidden".into())));
    assert_eq!(board.report(10).unwrap().status, Pending);
    assert_eq!(ids(&board, active), vec![2, 1]);
    assert_eq!(board.error(), Some("403 Forbidden"));
    assert!(!board.is_updating(10));
}

#[test]
fn test_declined_confirmation_sends_nothing() {
    let (mut board, _, _) = loaded_board();
    assert_eq!(board.apply_status(10, Deleted, &NeverConfirm), Ok(None));
    assert!(!board.is_updating(10));
}

#[test]
fn test_confirm_prompt_names_target_status() {
    let (mut board, _, _) = loaded_board();
    let seen = RefCell::new(Vec::new());
    let confirm = |prompt: &str| {
        seen.borrow_mut().push(prompt.to_string());
        true
    };
    board.apply_status(10, Ignored, &confirm).unwrap();
    assert_eq!(seen.into_inner(), vec!["Change status to ignored?".to_string()]);
}

#[test]
fn test_terminal_report_rejected() {
    let (mut board, _, _) = loaded_board();
    assert_eq!(
        board.apply_status(30, Pending, &AlwaysConfirm),
        Err(ModerationError::Transition(TransitionError::AlreadyResolved {
            from: Ignored,
            to: Pending
        }))
    );
    assert!(board.error().is_some());
}

#[test]
fn test_pending_to_pending_is_noop() {
    let (mut board, _, _) = loaded_board();
    assert_eq!(board.apply_status(10, Pending, &AlwaysConfirm), Ok(None));
}

#[test]
fn test_one_update_in_flight_per_report() {
    let (mut board, _, _) = loaded_board();
    board.apply_status(10, Deleted, &AlwaysConfirm).unwrap();
    assert_eq!(
        board.apply_status(10, Ignored, &AlwaysConfirm),
        Err(ModerationError::UpdateInFlight(10))
    );
    assert_eq!(
        board.apply_status(999, Ignored, &AlwaysConfirm),
        Err(ModerationError::UnknownReport(999))
    );
}

#[test]
fn test_stale_fetch_never_downgrades_terminal_report() {
    let (mut board, active, _) = loaded_board();
    let req = board.apply_status(10, Deleted, &AlwaysConfirm).unwrap().unwrap();
    let refetch = board.refresh(active).unwrap();
    board.receive_status(req.ticket, Ok(()));

    // The refetch was served before the delete landed.
    board.receive_view(
        active,
        refetch.ticket,
        Ok(vec![post(1, "ありがとう", "2024-05-01T09:00:00", vec![report(10, "Suzuki", Pending)])]),
    );
    assert_eq!(board.report(10).unwrap().status, Deleted);
    assert!(ids(&board, active).is_empty());
}

#[test]
fn test_late_success_keeps_status_resolved_elsewhere() {
    let (mut board, active, all) = loaded_board();
    let req = board.apply_status(10, Ignored, &AlwaysConfirm).unwrap().unwrap();
    let refetch = board.refresh(active).unwrap();

    // Another admin deleted the report before ours landed.
    board.receive_view(
        active,
        refetch.ticket,
        Ok(vec![post(1, "ありがとう", "2024-05-01T09:00:00", vec![report(10, "Suzuki", Deleted)])]),
    );
    assert!(board.receive_status(req.ticket, Ok(())));

    assert_eq!(board.report(10).unwrap().status, Deleted);
    assert_eq!(board.status_of(1), Some(Deleted));
    assert!(!ids(&board, active).contains(&1));
    assert!(ids(&board, all).contains(&1));
    assert!(board.error().is_none());
}

#[test]
fn test_superseded_fetch_dropped() {
    let mut board = ModerationBoard::new();
    let (view, first) = board.open_view(ViewScope::All);
    let second = board.refresh(view).unwrap();
    assert!(!board.receive_view(view, first.ticket, Ok(vec![post(1, "a", "1", vec![])])));
    assert!(board.receive_view(view, second.ticket, Ok(vec![post(2, "b", "2", vec![])])));
    assert_eq!(ids(&board, view), vec![2]);
    assert_eq!(board.refresh(ViewId(99)), Err(ModerationError::UnknownView(ViewId(99))));
}

#[test]
fn test_filter_by_content_and_reporter() {
    let (board, _, all) = loaded_board();
    let hits: Vec<u64> = board.filtered(all, "ｱﾘｶﾞﾄｳ").iter().map(|p| p.id).collect();
    assert_eq!(hits, vec![1]);
    let hits: Vec<u64> = board.filtered(all, "ITO").iter().map(|p| p.id).collect();
    assert_eq!(hits, vec![2, 3]);
    assert_eq!(board.filtered(all, "  ").len(), 4);
}
