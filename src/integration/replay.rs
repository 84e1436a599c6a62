//! Replay of recorded detection sets, one JSON array per line.
//!
//! `ReplayFeed` stands in for the camera: each non-blank line becomes one
//! frame whose payload is the raw line. `ReplayDetector` stands in for the
//! model and parses that payload, so a malformed line fails detection for
//! its cycle only.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{AcquisitionError, DetectionBuilder, DetectionSource, Frame, FrameSource};
use crate::tracker::Detection;

/// Serialized form of one detection: `{"bbox":[x1,y1,x2,y2],"class_id":0,"score":0.9}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedDetection {
    pub bbox: [f32; 4],
    #[serde(default)]
    pub class_id: u32,
    pub score: f32,
}

impl From<&Detection> for RecordedDetection {
    fn from(det: &Detection) -> Self {
        Self {
            bbox: det.bbox.to_tlbr(),
            class_id: det.class_id,
            score: det.score,
        }
    }
}

pub struct ReplayFeed<R: BufRead> {
    lines: std::io::Lines<R>,
    width: u32,
    height: u32,
    frames: u64,
    released: bool,
}

impl ReplayFeed<BufReader<File>> {
    /// Open a recording. A missing or unreadable file is an acquisition failure.
    pub fn open(path: impl AsRef<Path>, width: u32, height: u32) -> Result<Self, AcquisitionError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|err| {
            AcquisitionError::Unavailable(format!("{}: {err}", path.display()))
        })?;
        info!(path = %path.display(), width, height, "replaying detection recording");
        Ok(Self::from_reader(BufReader::new(file), width, height))
    }
}

impl<R: BufRead> ReplayFeed<R> {
    pub fn from_reader(reader: R, width: u32, height: u32) -> Self {
        Self {
            lines: reader.lines(),
            width,
            height,
            frames: 0,
            released: false,
        }
    }

    pub fn frames_read(&self) -> u64 {
        self.frames
    }
}

impl<R: BufRead> FrameSource for ReplayFeed<R> {
    fn next_frame(&mut self) -> Result<Option<Frame>, AcquisitionError> {
        if self.released {
            return Ok(None);
        }
        for line in self.lines.by_ref() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            self.frames += 1;
            return Ok(Some(Frame {
                data: line.into_bytes(),
                width: self.width,
                height: self.height,
            }));
        }
        Ok(None)
    }

    fn release(&mut self) {
        self.released = true;
    }
}

/// Parses the payload produced by [`ReplayFeed`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ReplayDetector;

impl DetectionSource for ReplayDetector {
    type Error = serde_json::Error;

    fn detect(
        &mut self,
        input: &[u8],
        _width: u32,
        _height: u32,
    ) -> Result<Vec<Detection>, Self::Error> {
        let recorded: Vec<RecordedDetection> = serde_json::from_slice(input)?;
        Ok(recorded
            .into_iter()
            .map(|r| {
                let [x1, y1, x2, y2] = r.bbox;
                DetectionBuilder::new()
                    .tlbr(x1, y1, x2, y2)
                    .class_id(r.class_id)
                    .score(r.score)
                    .build()
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const RECORDING: &str = r#"[{"bbox":[100,100,150,200],"class_id":0,"score":0.9}]

[{"bbox":[110,105,160,205],"score":0.8},{"bbox":[0,0,10,10],"class_id":56,"score":0.5}]
not json
"#;

    #[test]
    fn test_replay_frames_skip_blank_lines() {
        let mut feed = ReplayFeed::from_reader(Cursor::new(RECORDING), 320, 320);
        let mut detector = ReplayDetector;

        let first = feed.next_frame().unwrap().unwrap();
        assert_eq!((first.width, first.height), (320, 320));
        let dets = detector.detect(&first.data, first.width, first.height).unwrap();
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].bbox.to_tlbr(), [100.0, 100.0, 150.0, 200.0]);

        let second = feed.next_frame().unwrap().unwrap();
        let dets = detector.detect(&second.data, 320, 320).unwrap();
        assert_eq!(dets.len(), 2);
        assert_eq!(dets[0].class_id, 0);
        assert_eq!(dets[1].class_id, 56);

        let third = feed.next_frame().unwrap().unwrap();
        assert!(detector.detect(&third.data, 320, 320).is_err());

        assert!(feed.next_frame().unwrap().is_none());
        assert_eq!(feed.frames_read(), 3);
    }

    #[test]
    fn test_released_feed_is_exhausted() {
        let mut feed = ReplayFeed::from_reader(Cursor::new(RECORDING), 320, 320);
        feed.release();
        assert!(feed.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_missing_file_is_acquisition_failure() {
        let err = ReplayFeed::open("/nonexistent/recording.jsonl", 320, 320).err();
        assert!(matches!(err, Some(AcquisitionError::Unavailable(_))));
    }

    #[test]
    fn test_recorded_detection_from_detection() {
        let det = Detection::new(1.0, 2.0, 3.0, 4.0, 0, 0.5);
        let rec = RecordedDetection::from(&det);
        assert_eq!(rec.bbox, [1.0, 2.0, 3.0, 4.0]);
    }
}
