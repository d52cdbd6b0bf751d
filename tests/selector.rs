//! Frame selector purity and arithmetic.

use framepipe::{RequestedFrames, frame_indices};

#[test]
fn half_second_steps_at_30_fps() {
    assert_eq!(frame_indices(&[0.0, 0.5, 1.0], 30), vec![0, 15, 30]);
}

#[test]
fn fractional_times_round_down() {
    // 6.34 s in a 30 fps stream is frame 190.2 → frame 190.
    assert_eq!(frame_indices(&[6.34], 30), vec![190]);
}

#[test]
fn selector_is_pure() {
    let times = [0.0, 1.25, 2.5];
    let first = frame_indices(&times, 24);
    let second = frame_indices(&times, 24);
    assert_eq!(first, second);
    assert_eq!(first, vec![0, 30, 60]);
}

#[test]
fn empty_request_selects_nothing() {
    assert!(frame_indices(&[], 30).is_empty());
    let set = RequestedFrames::from_times(&[], 30);
    assert!(set.is_empty());
    assert!(!set.contains(0));
}

#[test]
fn requested_set_membership() {
    let set = RequestedFrames::from_times(&[0.0, 0.5, 1.0], 30);
    assert_eq!(set.len(), 3);
    assert!(set.contains(0));
    assert!(set.contains(15));
    assert!(set.contains(30));
    assert!(!set.contains(14));
    assert!(!set.contains(16));
}

#[test]
fn duplicate_timestamps_collapse_in_the_set() {
    // Two timestamps inside the same frame period select the same frame.
    let set = RequestedFrames::from_times(&[0.50, 0.51], 30);
    assert_eq!(set.len(), 1);
    assert!(set.contains(15));
}
