//! Fixed-cadence topocentric sampling.

use chrono::{DateTime, Utc};

use crate::{ObservationWindow, PredictionError, Propagator, Result, Sample};

/// Lazy sample stream over one observation window, one propagator call per
/// step. The iterator is a pure function of its inputs: recreating it
/// replays the identical sequence.
pub struct SampleIter<'a> {
    propagator: &'a dyn Propagator,
    window: ObservationWindow,
    step: usize,
    steps: usize,
}

/// Samples covering `[start, end)` at the window cadence.
pub fn samples<'a>(propagator: &'a dyn Propagator, window: &ObservationWindow) -> SampleIter<'a> {
    SampleIter {
        propagator,
        window: *window,
        step: 0,
        steps: window.steps(),
    }
}

impl SampleIter<'_> {
    fn step_time(&self, step: usize) -> DateTime<Utc> {
        self.window.start + self.window.cadence() * step as i32
    }
}

impl Iterator for SampleIter<'_> {
    type Item = Result<Sample>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.step >= self.steps {
            return None;
        }
        let time = self.step_time(self.step);
        self.step += 1;

        match self.propagator.observe(time) {
            Ok(angles) => Some(Ok(Sample {
                time,
                elevation_deg: angles.elevation_deg,
                azimuth_deg: angles.azimuth_deg,
                range_km: angles.range_km,
            })),
            Err(e) => {
                // A failed step ends the satellite's run; fuse the stream.
                self.step = self.steps;
                Some(Err(PredictionError::Propagation {
                    time,
                    reason: e.0,
                }))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.steps - self.step;
        (remaining, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScriptedPropagator;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 5, 0, 0, 0).unwrap()
    }

    fn window(minutes: i64) -> ObservationWindow {
        ObservationWindow {
            start: t0(),
            end: t0() + Duration::minutes(minutes),
            cadence_min: 1,
        }
    }

    #[test]
    fn test_cadence_timestamps() {
        let propagator = ScriptedPropagator::from_elevations(t0(), 1, &[1.0, 2.0, 3.0]);
        let collected: Vec<Sample> = samples(&propagator, &window(3))
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(collected.len(), 3);
        for (i, sample) in collected.iter().enumerate() {
            assert_eq!(sample.time, t0() + Duration::minutes(i as i64));
            assert_eq!(sample.elevation_deg, (i + 1) as f64);
        }
    }

    #[test]
    fn test_end_is_exclusive() {
        let propagator = ScriptedPropagator::from_elevations(t0(), 1, &[1.0, 2.0, 3.0]);
        let last = samples(&propagator, &window(3)).last().unwrap().unwrap();
        assert_eq!(last.time, t0() + Duration::minutes(2));
    }

    #[test]
    fn test_restartable() {
        let propagator = ScriptedPropagator::from_elevations(t0(), 1, &[4.0, 5.0, 6.0]);
        let first: Vec<Sample> = samples(&propagator, &window(3))
            .collect::<Result<_>>()
            .unwrap();
        let second: Vec<Sample> = samples(&propagator, &window(3))
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_window_yields_nothing() {
        let propagator = ScriptedPropagator::from_elevations(t0(), 1, &[1.0]);
        assert_eq!(samples(&propagator, &window(0)).count(), 0);

        let inverted = ObservationWindow {
            start: t0(),
            end: t0() - Duration::minutes(5),
            cadence_min: 1,
        };
        assert_eq!(samples(&propagator, &inverted).count(), 0);
    }

    #[test]
    fn test_error_fuses_stream() {
        // One scripted step, two requested
        let propagator = ScriptedPropagator::from_elevations(t0(), 1, &[1.0]);
        let mut iter = samples(&propagator, &window(2));

        assert!(iter.next().unwrap().is_ok());
        assert!(iter.next().unwrap().is_err());
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_wider_cadence() {
        let propagator = ScriptedPropagator::from_elevations(t0(), 5, &[1.0, 2.0]);
        let w = ObservationWindow {
            start: t0(),
            end: t0() + Duration::minutes(10),
            cadence_min: 5,
        };
        let collected: Vec<Sample> = samples(&propagator, &w).collect::<Result<_>>().unwrap();
        assert_eq!(collected.len(), 2);
        assert_eq!(collected[1].time, t0() + Duration::minutes(5));
    }
}
