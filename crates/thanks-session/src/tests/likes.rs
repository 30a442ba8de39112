use thanks_core::model::TimelinePost;

use crate::likes::LikeBoard;
use crate::toggle::ToggleState;

fn timeline_post(id: u64, like_count: u32, liked_by_me: bool) -> TimelinePost {
    TimelinePost {
        id,
        content: "ありがとう".to_string(),
        created_at: "2024-05-01T09:00:00".to_string(),
        mention_user_names: Vec::new(),
        mention_department_names: Vec::new(),
        like_count,
        liked_by_me,
    }
}

#[test]
fn test_like_failure_reverts_only_that_post() {
    let mut board = LikeBoard::new();
    board.load_timeline(&[timeline_post(1, 3, false), timeline_post(2, 0, true)]);

    let a = board.toggle(1).unwrap();
    let b = board.toggle(2).unwrap();
    assert!(a.liked);
    assert!(!b.liked);

    assert!(board.complete(1, a.ticket, false).is_none());
    assert!(board.complete(2, b.ticket, true).is_none());
    assert_eq!(board.state(1), Some(ToggleState::new(false, 3)));
    assert_eq!(board.state(2), Some(ToggleState::new(false, 0)));
}

#[test]
fn test_completion_for_unknown_post_ignored() {
    let mut board = LikeBoard::new();
    board.load([(1, ToggleState::new(false, 0))]);
    let a = board.toggle(1).unwrap();
    assert!(board.complete(3, a.ticket, false).is_none());
    assert!(board.is_pending(1));
    assert_eq!(board.state(1), Some(ToggleState::new(true, 1)));
}

#[test]
fn test_refresh_skips_pending_posts() {
    let mut board = LikeBoard::new();
    board.load([(1, ToggleState::new(false, 3)), (2, ToggleState::new(false, 5))]);
    let req = board.toggle(1).unwrap();

    let skipped = board.load([(1, ToggleState::new(false, 3)), (2, ToggleState::new(true, 6))]);
    assert_eq!(skipped, 1);
    assert_eq!(board.state(1), Some(ToggleState::new(true, 4)));
    assert_eq!(board.state(2), Some(ToggleState::new(true, 6)));

    board.complete(1, req.ticket, true);
    assert_eq!(board.state(1), Some(ToggleState::new(true, 4)));
}

#[test]
fn test_refresh_drops_missing_posts_unless_pending() {
    let mut board = LikeBoard::new();
    board.load([(1, ToggleState::new(false, 0)), (2, ToggleState::new(false, 0))]);
    board.toggle(2);
    board.load([(3, ToggleState::new(false, 1))]);
    assert!(board.state(1).is_none());
    assert!(board.state(2).is_some());
    assert_eq!(board.len(), 2);
}

#[test]
fn test_unknown_post_toggle_is_noop() {
    let mut board = LikeBoard::new();
    assert!(board.toggle(99).is_none());
    assert!(board.is_empty());
}
