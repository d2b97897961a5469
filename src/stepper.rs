//! Frame stepping.
//!
//! After each visited frame the read position jumps ahead by a seek rather
//! than by decoding the frames in between. [`StepPolicy`] decides where to
//! jump; [`FrameStepper`] checks the target against the frame count and
//! performs the seek. Slide changes that start and end inside one skipped
//! span are not seen.

use std::fmt::Debug;

use crate::{error::SlideError, frame_source::FrameSource};

/// Chooses the next frame to visit.
pub trait StepPolicy: Debug + Send + Sync {
    /// Given the source position right after a visit (one past the visited
    /// frame), return the index of the next frame to visit.
    fn next_index(&self, position: u64) -> u64;
}

/// Skip a fixed number of frames between visits.
///
/// Visiting frame 0 with a skip of 100 leaves the source at position 1, so
/// the next visit is frame 101, then 202, and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedSkip {
    skip: u64,
}

impl FixedSkip {
    /// Skip `skip` frames between visits.
    pub fn new(skip: u64) -> Self {
        Self { skip }
    }
}

impl StepPolicy for FixedSkip {
    fn next_index(&self, position: u64) -> u64 {
        position.saturating_add(self.skip)
    }
}

/// What the stepper did after a visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The source now points at this frame index.
    Continue(u64),
    /// The next target lies past the last frame.
    Exhausted,
}

/// Moves a [`FrameSource`] to the next frame to visit.
#[derive(Debug)]
pub struct FrameStepper {
    policy: Box<dyn StepPolicy>,
}

impl FrameStepper {
    /// Step with a fixed skip.
    pub fn fixed(skip: u64) -> Self {
        Self::with_policy(FixedSkip::new(skip))
    }

    /// Step with any policy.
    pub fn with_policy<P: StepPolicy + 'static>(policy: P) -> Self {
        Self {
            policy: Box::new(policy),
        }
    }

    /// Compute the next target and seek `source` to it.
    ///
    /// When the frame count is unknown the seek is always attempted and the
    /// end of the stream shows up as an empty read instead.
    pub fn advance<S: FrameSource + ?Sized>(&self, source: &mut S) -> Result<Step, SlideError> {
        let target = self.policy.next_index(source.position());

        if source.frame_count().is_some_and(|total| target >= total) {
            return Ok(Step::Exhausted);
        }

        source.seek(target)?;
        Ok(Step::Continue(target))
    }
}

#[cfg(test)]
mod tests {
    use image::{DynamicImage, RgbImage};

    use super::*;
    use crate::frame_source::ImageSequence;

    fn sequence(frames: usize) -> ImageSequence {
        ImageSequence::new(vec![DynamicImage::ImageRgb8(RgbImage::new(1, 1)); frames])
    }

    fn visited(frames: usize, skip: u64) -> Vec<u64> {
        let mut source = sequence(frames);
        let stepper = FrameStepper::fixed(skip);
        let mut indices = Vec::new();
        loop {
            let index = source.position();
            if source.read_frame().unwrap().is_none() {
                break;
            }
            indices.push(index);
            match stepper.advance(&mut source).unwrap() {
                Step::Continue(next) => assert_eq!(source.position(), next),
                Step::Exhausted => break,
            }
        }
        indices
    }

    #[test]
    fn visits_zero_then_every_skip_plus_one() {
        assert_eq!(visited(350, 100), vec![0, 101, 202, 303]);
    }

    #[test]
    fn stops_when_target_reaches_frame_count() {
        // 303 would be the next target; it is not < 303.
        assert_eq!(visited(303, 100), vec![0, 101, 202]);
        assert_eq!(visited(304, 100), vec![0, 101, 202, 303]);
    }

    #[test]
    fn short_video_visits_only_first_frame() {
        assert_eq!(visited(50, 100), vec![0]);
    }

    #[test]
    fn skip_of_one_visits_every_other_frame() {
        assert_eq!(visited(7, 1), vec![0, 2, 4, 6]);
    }

    #[test]
    fn visited_indices_stay_in_range() {
        for frames in 1..40 {
            for skip in 1..8 {
                let indices = visited(frames, skip);
                assert!(indices.iter().all(|&index| index < frames as u64));
                let expected: Vec<u64> = (0..)
                    .map(|k| k * (skip + 1))
                    .take_while(|&index| index < frames as u64)
                    .collect();
                assert_eq!(indices, expected, "frames={frames}, skip={skip}");
            }
        }
    }

    #[derive(Debug)]
    struct Doubling;

    impl StepPolicy for Doubling {
        fn next_index(&self, position: u64) -> u64 {
            position * 2
        }
    }

    #[test]
    fn custom_policy() {
        let mut source = sequence(100);
        let stepper = FrameStepper::with_policy(Doubling);
        source.seek(10).unwrap();
        assert_eq!(stepper.advance(&mut source).unwrap(), Step::Continue(20));
        source.seek(60).unwrap();
        assert_eq!(stepper.advance(&mut source).unwrap(), Step::Exhausted);
    }
}
