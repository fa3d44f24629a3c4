// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Heart sound detection and replay
//!
//! A recording of a heartbeat shows two sounds per beat: S1, and S2
//! shortly after it. Peaks of the smoothed amplitude envelope are
//! paired up into [Beat]s, which [replay] turns into pulses at the
//! recorded times.

use std::vec::Vec;

use embedded_hal::delay::DelayNs;

use crate::errors::Error;
use crate::port::GpioPort;
use crate::Heartbeat;
use crate::{debug, info, warn};

const SMOOTHING_SIGMA: f32 = 5.0;
const PEAK_MIN_HEIGHT: f32 = 0.5;
// Kernel reaches out this many sigmas
const TRUNCATE: f32 = 4.0;

/// One heartbeat, times in seconds from the start of the recording
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Beat {
    pub s1: f32,
    pub s2: Option<f32>,
}

/// Rules for grouping peaks into beats
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairingConfig {
    /// S2 must follow S1 within this many seconds
    pub s2_window: f32,
    /// Peaks this soon after an S2 are ignored
    pub cooldown: f32,
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            s2_window: 0.4,
            cooldown: 0.5,
        }
    }
}

fn reflect(i: isize, n: usize) -> usize {
    let period = 2 * n as isize;
    let m = i.rem_euclid(period);
    if m < n as isize {
        m as usize
    } else {
        (period - 1 - m) as usize
    }
}

/// Gaussian filter with mirrored edges
pub fn gaussian_smooth(signal: &[f32], sigma: f32) -> Vec<f32> {
    let n = signal.len();
    if n == 0 || sigma <= 0.0 {
        return signal.to_vec();
    }
    let radius = (TRUNCATE * sigma + 0.5) as isize;
    let mut kernel: Vec<f32> = (-radius..=radius)
        .map(|x| {
            let x = x as f32;
            (-0.5 * x * x / (sigma * sigma)).exp()
        })
        .collect();
    let total: f32 = kernel.iter().sum();
    kernel.iter_mut().for_each(|w| *w /= total);

    (0..n as isize)
        .map(|i| {
            kernel
                .iter()
                .zip(-radius..=radius)
                .map(|(w, k)| w * signal[reflect(i + k, n)])
                .sum()
        })
        .collect()
}

/// Indices of local maxima at least `min_height` tall and at least
/// `min_distance` samples apart
///
/// A flat top counts once, at its middle. When two peaks are too close
/// the taller one is kept.
pub fn find_peaks(signal: &[f32], min_height: f32, min_distance: usize) -> Vec<usize> {
    let n = signal.len();
    let mut peaks = Vec::new();
    let mut i = 1;
    while i + 1 < n {
        if signal[i - 1] < signal[i] {
            let mut ahead = i + 1;
            while ahead + 1 < n && signal[ahead] == signal[i] {
                ahead += 1;
            }
            if signal[ahead] < signal[i] {
                peaks.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    peaks.retain(|&p| signal[p] >= min_height);

    let min_distance = min_distance.max(1);
    if min_distance == 1 || peaks.len() < 2 {
        return peaks;
    }
    let mut by_height: Vec<usize> = (0..peaks.len()).collect();
    by_height.sort_by(|&a, &b| signal[peaks[a]].total_cmp(&signal[peaks[b]]));
    let mut keep = std::vec![true; peaks.len()];
    for &j in by_height.iter().rev() {
        if !keep[j] {
            continue;
        }
        for k in (0..j).rev() {
            if peaks[j] - peaks[k] >= min_distance {
                break;
            }
            keep[k] = false;
        }
        for k in j + 1..peaks.len() {
            if peaks[k] - peaks[j] >= min_distance {
                break;
            }
            keep[k] = false;
        }
    }
    peaks
        .into_iter()
        .zip(keep)
        .filter_map(|(p, keep)| keep.then_some(p))
        .collect()
}

/// Times, in seconds, of the loud spots in a recording
pub fn detect_peak_times(samples: &[f32], sample_rate: u32) -> Vec<f32> {
    let envelope: Vec<f32> = samples.iter().map(|s| s.abs()).collect();
    let smoothed = gaussian_smooth(&envelope, SMOOTHING_SIGMA);
    let distance = (sample_rate / 10) as usize;
    let peaks = find_peaks(&smoothed, PEAK_MIN_HEIGHT, distance);
    debug!("detect: {} peaks in {} samples", peaks.len(), samples.len());
    peaks
        .into_iter()
        .map(|p| p as f32 / sample_rate as f32)
        .collect()
}

/// Groups ordered peak times into S1/S2 beats
pub fn pair_sounds(peak_times: &[f32], config: &PairingConfig) -> Vec<Beat> {
    let mut beats = Vec::new();
    let mut last_s2 = -config.cooldown;
    for (idx, &s1) in peak_times.iter().enumerate() {
        if s1 <= last_s2 + config.cooldown {
            continue;
        }
        let s2 = peak_times[idx + 1..]
            .iter()
            .copied()
            .find(|&t| t > s1 && t <= s1 + config.s2_window);
        if let Some(s2) = s2 {
            last_s2 = s2;
        }
        beats.push(Beat { s1, s2 });
    }
    beats
}

fn to_ms(seconds: f32) -> u64 {
    (seconds.max(0.0) * 1000.0).round() as u64
}

/// Pulses on every S1 and S2, at their times relative to the call
///
/// A sound due while the previous pulse is still high fires right after
/// it. Returns the number of missed pulses.
pub fn replay<P: GpioPort, D: DelayNs>(
    heartbeat: &mut Heartbeat<P, D>,
    beats: &[Beat],
) -> Result<u32, Error> {
    if !heartbeat.is_configured() {
        return Err(Error::NotConfigured);
    }
    let mut sounds = Sounds {
        heartbeat,
        now: 0,
        missed: 0,
    };
    for beat in beats {
        sounds.fire("S1", beat.s1);
        match beat.s2 {
            Some(s2) => sounds.fire("S2", s2),
            None => debug!("replay: no S2 within the window after {}s", beat.s1),
        }
    }
    Ok(sounds.missed)
}

/// Replay cursor, `now` in milliseconds since the start
struct Sounds<'a, P, D> {
    heartbeat: &'a mut Heartbeat<P, D>,
    now: u64,
    missed: u32,
}

impl<P: GpioPort, D: DelayNs> Sounds<'_, P, D> {
    fn fire(&mut self, name: &str, at: f32) {
        let due = to_ms(at);
        if due < self.now {
            warn!("replay: {} at {}s is {}ms late", name, at, self.now - due);
        }
        let mut wait = due.saturating_sub(self.now);
        while wait > 0 {
            let step = wait.min(u32::MAX as u64);
            self.heartbeat.wait_ms(step as u32);
            wait -= step;
        }
        self.now = self.now.max(due);
        info!("{} detected at {}s", name, at);
        // Width elapses even when the pulse fails
        if let Err(e) = self.heartbeat.timed_pulse() {
            warn!("replay: {} pulse missed: {:?}", name, e);
            self.missed += 1;
        }
        self.now += self.heartbeat.config().pulse_width_ms as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::mock::{Clock, MockDelay, MockPort, MS};
    use crate::port::Level;
    use crate::HeartbeatConfig;
    use std::vec;

    fn assert_close(actual: &[f32], expected: &[f32], tolerance: f32) {
        assert_eq!(actual.len(), expected.len(), "{:?} vs {:?}", actual, expected);
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() <= tolerance, "{:?} vs {:?}", actual, expected);
        }
    }

    #[test]
    fn test_reflect() {
        assert_eq!(reflect(-1, 4), 0);
        assert_eq!(reflect(-2, 4), 1);
        assert_eq!(reflect(4, 4), 3);
        assert_eq!(reflect(5, 4), 2);
        assert_eq!(reflect(9, 4), 1);
        assert_eq!(reflect(-9, 1), 0);
    }

    #[test]
    fn test_smooth_constant() {
        let smoothed = gaussian_smooth(&[0.25; 8], 5.0);
        assert_close(&smoothed, &[0.25; 8], 1e-6);
    }

    #[test]
    fn test_smooth_impulse() {
        let mut signal = vec![0.0f32; 101];
        signal[50] = 1.0;
        let smoothed = gaussian_smooth(&signal, 2.0);
        let total: f32 = smoothed.iter().sum();
        assert!((total - 1.0).abs() < 1e-5);
        assert!((smoothed[48] - smoothed[52]).abs() < 1e-7);
        assert!(smoothed[50] > smoothed[49]);
        assert_eq!(smoothed[0], 0.0);
    }

    #[test]
    fn test_smooth_passthrough() {
        assert!(gaussian_smooth(&[], 5.0).is_empty());
        assert_eq!(gaussian_smooth(&[1.0, 2.0], 0.0), vec![1.0, 2.0]);
    }

    #[test]
    fn test_find_peaks() {
        let signal = [0.0, 1.0, 0.0, 2.0, 2.0, 2.0, 0.0, 0.3, 0.0, 5.0];
        assert_eq!(find_peaks(&signal, 0.0, 1), vec![1, 4, 7]);
        assert_eq!(find_peaks(&signal, 0.5, 1), vec![1, 4]);
        assert!(find_peaks(&[], 0.0, 1).is_empty());
        assert!(find_peaks(&[1.0, 2.0], 0.0, 1).is_empty());
    }

    #[test]
    fn test_find_peaks_distance_keeps_taller() {
        let signal = [0.0, 1.0, 0.0, 3.0, 0.0, 2.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        assert_eq!(find_peaks(&signal, 0.0, 3), vec![3, 9]);
        assert_eq!(find_peaks(&signal, 0.0, 2), vec![1, 3, 5, 9]);
    }

    #[test]
    fn test_pair_sounds() {
        let config = PairingConfig::default();
        let peaks = [0.10, 0.35, 0.70, 1.00, 1.30, 2.50, 3.00];
        let beats = pair_sounds(&peaks, &config);
        assert_eq!(
            beats,
            vec![
                Beat {
                    s1: 0.10,
                    s2: Some(0.35)
                },
                // 0.70 falls in the cooldown after 0.35
                Beat {
                    s1: 1.00,
                    s2: Some(1.30)
                },
                Beat { s1: 2.50, s2: None },
                Beat { s1: 3.00, s2: None },
            ]
        );
        assert!(pair_sounds(&[], &config).is_empty());
    }

    #[test]
    fn test_detect_peak_times() {
        let rate = 1000;
        let mut samples = vec![0.0f32; 2000];
        for start in [100, 300, 1200] {
            samples[start..start + 20]
                .iter_mut()
                .enumerate()
                .for_each(|(i, s)| *s = if i % 2 == 0 { 1.0 } else { -1.0 });
        }
        let times = detect_peak_times(&samples, rate);
        assert_close(&times, &[0.1095, 0.3095, 1.2095], 0.002);

        let beats = pair_sounds(&times, &PairingConfig::default());
        assert_eq!(beats.len(), 2);
        assert!(beats[0].s2.is_some());
        assert_eq!(beats[1].s2, None);
    }

    #[test]
    fn test_detect_quiet() {
        assert!(detect_peak_times(&[0.1; 500], 1000).is_empty());
    }

    fn rises(port: &MockPort) -> std::vec::Vec<u64> {
        port.writes(0)
            .into_iter()
            .filter(|(_, l)| *l == Level::High)
            .map(|(t, _)| t / MS)
            .collect()
    }

    #[test_log::test]
    fn test_replay_timing() {
        let clock = Clock::default();
        let mut port = MockPort::new(&clock);
        let mut hb = Heartbeat::new(&mut port, MockDelay::new(&clock), HeartbeatConfig::default());
        hb.setup().unwrap();
        let beats = [
            Beat {
                s1: 0.5,
                s2: Some(0.8),
            },
            Beat { s1: 2.0, s2: None },
        ];
        assert_eq!(replay(&mut hb, &beats), Ok(0));
        drop(hb);
        assert_eq!(rises(&port), vec![500, 800, 2000]);
    }

    #[test]
    fn test_replay_late_sound() {
        let clock = Clock::default();
        let mut port = MockPort::new(&clock);
        let mut hb = Heartbeat::new(&mut port, MockDelay::new(&clock), HeartbeatConfig::default());
        hb.setup().unwrap();
        let beats = [Beat {
            s1: 0.0,
            s2: Some(0.05),
        }];
        assert_eq!(replay(&mut hb, &beats), Ok(0));
        drop(hb);
        assert_eq!(rises(&port), vec![0, 100]);
    }

    #[test]
    fn test_replay_keeps_time_after_failed_pulse() {
        let clock = Clock::default();
        let mut port = MockPort::new(&clock);
        port.fail_next_writes = 1;
        let mut hb = Heartbeat::new(&mut port, MockDelay::new(&clock), HeartbeatConfig::default());
        hb.setup().unwrap();
        let beats = [Beat { s1: 0.5, s2: None }, Beat { s1: 2.0, s2: None }];
        assert_eq!(replay(&mut hb, &beats), Ok(1));
        drop(hb);
        assert_eq!(rises(&port), vec![2000]);
        assert_eq!(clock.get(), 2100 * MS);
    }

    #[test]
    fn test_replay_needs_setup() {
        let clock = Clock::default();
        let mut port = MockPort::new(&clock);
        let mut hb = Heartbeat::new(&mut port, MockDelay::new(&clock), HeartbeatConfig::default());
        let beats = [Beat { s1: 1.0, s2: None }];
        assert_eq!(replay(&mut hb, &beats), Err(Error::NotConfigured));
        drop(hb);
        assert_eq!(clock.get(), 0);
    }
}
