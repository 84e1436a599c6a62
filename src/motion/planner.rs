use crate::motion::Command;
use crate::tracker::Rect;

/// Map the target's horizontal position to a steering command.
///
/// The comparisons are strict, so a center exactly at
/// `frame_width / 2 ± threshold` still steers `Forward`. There is a single
/// threshold and no hysteresis: a target sitting on the boundary may
/// alternate between commands on successive cycles.
pub fn plan(target: Option<&Rect>, frame_width: f32, threshold: f32) -> Command {
    let Some(bbox) = target else {
        return Command::Stop;
    };

    let [x1, _, x2, _] = bbox.to_tlbr();
    let center_x = (x1 + x2) / 2.0;
    let frame_center = frame_width / 2.0;

    if center_x < frame_center - threshold {
        Command::Left
    } else if center_x > frame_center + threshold {
        Command::Right
    } else {
        Command::Forward
    }
}

/// [`plan`] bound to a configured dead-band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionPlanner {
    pub dead_band: f32,
}

impl Default for MotionPlanner {
    fn default() -> Self {
        Self { dead_band: 50.0 }
    }
}

impl MotionPlanner {
    pub fn new(dead_band: f32) -> Self {
        Self { dead_band }
    }

    #[inline]
    pub fn plan(&self, target: Option<&Rect>, frame_width: f32) -> Command {
        plan(target, frame_width, self.dead_band)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A 20px wide box centered at `cx`.
    fn centered(cx: f32) -> Rect {
        Rect::from_tlbr(cx - 10.0, 100.0, cx + 10.0, 200.0)
    }

    #[test]
    fn test_no_target_stops() {
        assert_eq!(plan(None, 320.0, 50.0), Command::Stop);
    }

    #[test]
    fn test_dead_band_boundaries() {
        let cases = [
            (30.0, Command::Left),
            (109.0, Command::Left),
            (110.0, Command::Forward),
            (160.0, Command::Forward),
            (210.0, Command::Forward),
            (211.0, Command::Right),
        ];
        for (cx, expected) in cases {
            assert_eq!(plan(Some(&centered(cx)), 320.0, 50.0), expected, "center {cx}");
        }
    }

    #[test]
    fn test_plan_is_pure() {
        let planner = MotionPlanner::default();
        let bbox = centered(250.0);
        let first = planner.plan(Some(&bbox), 320.0);
        for _ in 0..10 {
            assert_eq!(planner.plan(Some(&bbox), 320.0), first);
        }
        assert_eq!(first, Command::Right);
    }

    #[test]
    fn test_zero_dead_band() {
        let planner = MotionPlanner::new(0.0);
        assert_eq!(planner.plan(Some(&centered(160.0)), 320.0), Command::Forward);
        assert_eq!(planner.plan(Some(&centered(160.5)), 320.0), Command::Right);
    }
}
