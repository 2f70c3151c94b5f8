//! Tachometer pulse accumulation and RPM estimation.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::config::SamplerCfg;

/// Shared pulse counter between the tachometer edge handler and the control
/// loop.
///
/// Single-writer discipline: the edge handler only increments, the loop only
/// drains. `take` is an atomic fetch-and-reset, so no pulse can be lost or
/// double-counted across a window boundary.
#[derive(Debug, Clone, Default)]
pub struct PulseCounter {
    count: Arc<AtomicU32>,
}

impl PulseCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one tachometer edge. Safe to call from handler context.
    #[inline]
    pub fn on_edge(&self) {
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    /// Drain the window: return the accumulated count and reset it to zero
    /// in a single atomic operation.
    #[inline]
    pub fn take(&self) -> u32 {
        self.count.swap(0, Ordering::AcqRel)
    }
}

/// Per-tick RPM estimate derived from one sampling window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RpmEstimate {
    /// Raw window conversion.
    pub instantaneous: i32,
    /// 2-sample moving average with the previous smoothed value.
    pub smoothed: i32,
    /// `smoothed` floored to the nearest multiple of 10, for display.
    pub rounded: i32,
}

/// Converts drained pulse counts to RPM estimates, one window at a time.
#[derive(Debug)]
pub struct TachoSampler {
    cfg: SamplerCfg,
    prev_smoothed: i32,
}

impl TachoSampler {
    pub fn new(cfg: SamplerCfg) -> Self {
        Self {
            cfg,
            prev_smoothed: 0,
        }
    }

    /// Process the pulse count of one completed window. Always yields an
    /// estimate; an implausible count (rotor tube stopped against the
    /// sensor) is discarded and reads as a stationary rotor.
    pub fn ingest(&mut self, pulses: u32) -> RpmEstimate {
        let pulses = if pulses > self.cfg.max_pulses_per_window {
            tracing::warn!(
                pulses,
                ceiling = self.cfg.max_pulses_per_window,
                "implausible pulse count discarded"
            );
            0
        } else {
            pulses
        };

        let windows_per_minute = crate::util::MILLIS_PER_MINUTE / self.cfg.window_ms.max(1);
        let instantaneous =
            (pulses * windows_per_minute / self.cfg.pulses_per_rev.max(1)) as i32;
        let smoothed = (self.prev_smoothed + instantaneous) / 2;
        self.prev_smoothed = smoothed;

        RpmEstimate {
            instantaneous,
            smoothed,
            rounded: (smoothed / 10) * 10,
        }
    }

    /// Last smoothed value carried between windows.
    pub fn smoothed(&self) -> i32 {
        self.prev_smoothed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sampler() -> TachoSampler {
        TachoSampler::new(SamplerCfg::default())
    }

    #[test]
    fn reference_window_conversion() {
        let mut s = sampler();
        s.prev_smoothed = 200;
        // 11 pulses over 500 ms at 6 pulses/rev: (11 × 120) / 6 = 220.
        let est = s.ingest(11);
        assert_eq!(est.instantaneous, 220);
        assert_eq!(est.smoothed, 210);
        assert_eq!(est.rounded, 210);
    }

    #[test]
    fn no_pulses_reads_zero() {
        let mut s = sampler();
        let est = s.ingest(0);
        assert_eq!(est, RpmEstimate::default());
    }

    #[test]
    fn ceiling_discards_the_window() {
        let mut s = sampler();
        s.prev_smoothed = 1000;
        let est = s.ingest(221);
        assert_eq!(est.instantaneous, 0);
        // The average still decays toward zero rather than spiking.
        assert_eq!(est.smoothed, 500);
    }

    #[test]
    fn smoothing_converges_on_steady_input() {
        let mut s = sampler();
        let mut est = RpmEstimate::default();
        for _ in 0..12 {
            est = s.ingest(100); // 2000 RPM instantaneous
        }
        assert_eq!(est.instantaneous, 2000);
        // Integer halving converges to one below the fixed point.
        assert!((1995..=2000).contains(&est.smoothed), "got {}", est.smoothed);
    }

    #[test]
    fn counter_take_is_destructive() {
        let counter = PulseCounter::new();
        let isr = counter.clone();
        for _ in 0..7 {
            isr.on_edge();
        }
        assert_eq!(counter.take(), 7);
        assert_eq!(counter.take(), 0);
        isr.on_edge();
        assert_eq!(counter.take(), 1);
    }

    #[test]
    fn counter_is_safe_across_threads() {
        let counter = PulseCounter::new();
        let isr = counter.clone();
        let writer = std::thread::spawn(move || {
            for _ in 0..10_000 {
                isr.on_edge();
            }
        });
        let mut drained = 0u32;
        while drained < 10_000 {
            drained += counter.take();
            std::thread::yield_now();
        }
        writer.join().expect("writer thread");
        assert_eq!(drained, 10_000);
        assert_eq!(counter.take(), 0);
    }
}
