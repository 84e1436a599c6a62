use target_follow::tracker::find_overlapping;
use target_follow::{Command, Detection, MatchPolicy, TargetState, TargetTracker, plan};

fn person(x1: f32, y1: f32, x2: f32, y2: f32) -> Detection {
    Detection::new(x1, y1, x2, y2, 0, 0.9)
}

#[test]
fn test_select_update_plan_scenario() {
    let mut tracker = TargetTracker::default();

    // Frame N: operator picks the person at (120, 150)
    let frame_n = vec![person(100.0, 100.0, 150.0, 200.0), person(250.0, 80.0, 300.0, 200.0)];
    let target = tracker.select(&frame_n, 120.0, 150.0).unwrap();
    assert_eq!(target.state, TargetState::Active);
    assert_eq!(target.bbox.to_tlbr(), [100.0, 100.0, 150.0, 200.0]);

    // Frame N+1: the person moved slightly, another one stays far away
    let frame_n1 = vec![person(250.0, 80.0, 300.0, 200.0), person(110.0, 105.0, 160.0, 205.0)];
    assert_eq!(tracker.update(&frame_n1), TargetState::Active);
    let bbox = tracker.current().unwrap();
    assert_eq!(bbox.to_tlbr(), [110.0, 105.0, 160.0, 205.0]);

    // Center 135 against frame center 160 with a 50px dead-band
    assert_eq!(plan(Some(&bbox), 320.0, 50.0), Command::Forward);

    // Frame N+2: the person leaves the frame
    let frame_n2 = vec![person(250.0, 80.0, 300.0, 200.0)];
    assert_eq!(tracker.update(&frame_n2), TargetState::Lost);
    assert_eq!(plan(tracker.current().as_ref(), 320.0, 50.0), Command::Stop);

    // Stays lost even if someone reappears; a new selection is required
    assert_eq!(tracker.update(&frame_n1), TargetState::Lost);
    assert!(tracker.current().is_none());
}

#[test]
fn test_exactly_one_overlap_is_adopted() {
    let mut tracker = TargetTracker::default();
    tracker.select(&[person(10.0, 10.0, 60.0, 110.0)], 30.0, 50.0).unwrap();

    let dets = vec![
        person(200.0, 10.0, 250.0, 110.0),
        person(59.0, 20.0, 109.0, 120.0),
        person(10.0, 111.0, 60.0, 200.0),
    ];
    assert_eq!(tracker.update(&dets), TargetState::Active);
    assert_eq!(tracker.current(), Some(dets[1].bbox));
}

#[test]
fn test_steering_walks_across_the_frame() {
    let mut tracker = TargetTracker::default();
    tracker.select(&[person(10.0, 100.0, 50.0, 200.0)], 30.0, 150.0).unwrap();

    let mut commands = Vec::new();
    // Slide a 40px wide person right by 20px per frame
    for step in 1..=12 {
        let x1 = 10.0 + 20.0 * step as f32;
        tracker.update(&[person(x1, 100.0, x1 + 40.0, 200.0)]);
        commands.push(plan(tracker.current().as_ref(), 320.0, 50.0));
    }
    assert_eq!(commands.first(), Some(&Command::Left));
    assert!(commands.contains(&Command::Forward));
    assert_eq!(commands.last(), Some(&Command::Right));
}

#[test]
fn test_update_policies_differ_on_hand_off() {
    let target = person(100.0, 100.0, 150.0, 200.0).bbox;
    // A bystander clipping the target's edge comes first in feed order
    let dets = vec![person(148.0, 90.0, 200.0, 210.0), person(102.0, 101.0, 152.0, 203.0)];
    assert_eq!(find_overlapping(&target, &dets, MatchPolicy::FirstInFeed), Some(0));
    assert_eq!(find_overlapping(&target, &dets, MatchPolicy::Best), Some(1));
}
