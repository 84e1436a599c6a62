//! Matching utilities for single-target re-identification.

use serde::{Deserialize, Serialize};

use crate::tracker::rect::{Rect, iou_batch};

/// One detector-reported object in one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Bounding box (constructed from TLBR)
    pub bbox: Rect,
    /// Detector class identifier
    pub class_id: u32,
    /// Detection confidence score in [0, 1]
    pub score: f32,
}

impl Detection {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32, class_id: u32, score: f32) -> Self {
        Self {
            bbox: Rect::from_tlbr(x1, y1, x2, y2),
            class_id,
            score: score.clamp(0.0, 1.0),
        }
    }

    pub fn from_rect(bbox: Rect, class_id: u32, score: f32) -> Self {
        Self {
            bbox,
            class_id,
            score: score.clamp(0.0, 1.0),
        }
    }
}

/// Rule for choosing among several candidate detections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// Take the first candidate in feed order.
    FirstInFeed,
    /// Take the strongest candidate: highest confidence for selection,
    /// largest IoU for re-identification. Equal scores fall back to feed order.
    #[default]
    Best,
}

/// Keep detections of `class_id` with a well-formed box, in feed order.
pub fn filter_class(detections: Vec<Detection>, class_id: u32) -> Vec<Detection> {
    detections
        .into_iter()
        .filter(|d| {
            if d.class_id != class_id {
                return false;
            }
            if !d.bbox.is_valid() {
                tracing::debug!(bbox = ?d.bbox, "dropping malformed detection");
                return false;
            }
            true
        })
        .collect()
}

/// Index of the detection whose box contains the point (inclusive borders).
pub fn find_containing(
    detections: &[Detection],
    px: f32,
    py: f32,
    policy: MatchPolicy,
) -> Option<usize> {
    let mut candidates = detections
        .iter()
        .enumerate()
        .filter(|(_, d)| d.bbox.contains(px, py));

    match policy {
        MatchPolicy::FirstInFeed => candidates.next().map(|(i, _)| i),
        MatchPolicy::Best => candidates
            .fold(None, |best: Option<(usize, f32)>, (i, d)| match best {
                Some((_, s)) if s >= d.score => best,
                _ => Some((i, d.score)),
            })
            .map(|(i, _)| i),
    }
}

/// Index of the detection that overlaps `target`.
///
/// Overlap is the strict axis-aligned intersection test. Under
/// [`MatchPolicy::Best`] the overlapping detection with the largest IoU wins.
pub fn find_overlapping(
    target: &Rect,
    detections: &[Detection],
    policy: MatchPolicy,
) -> Option<usize> {
    match policy {
        MatchPolicy::FirstInFeed => detections.iter().position(|d| target.overlaps(&d.bbox)),
        MatchPolicy::Best => {
            let det_rects: Vec<Rect> = detections.iter().map(|d| d.bbox).collect();
            let ious = iou_batch(std::slice::from_ref(target), &det_rects);

            let mut best: Option<(usize, f32)> = None;
            for (j, det) in detections.iter().enumerate() {
                if !target.overlaps(&det.bbox) {
                    continue;
                }
                let iou = ious[[0, j]];
                match best {
                    Some((_, b)) if b >= iou => {}
                    _ => best = Some((j, iou)),
                }
            }
            best.map(|(j, _)| j)
        }
    }
}

/// Index of the detection with the largest box area, first in feed order on ties.
pub fn find_largest(detections: &[Detection]) -> Option<usize> {
    detections
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f32)>, (i, d)| match best {
            Some((_, a)) if a >= d.bbox.area() => best,
            _ => Some((i, d.bbox.area())),
        })
        .map(|(i, _)| i)
}
