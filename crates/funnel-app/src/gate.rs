#![forbid(unsafe_code)]

//! Per-screen "next" gating.
//!
//! A gate starts closed when its screen carries gating media and opens when
//! the media reaches the playback threshold or ends. Once open it stays open
//! for the rest of the visit.

/// What a screen waits for before its next button works.
#[derive(Debug, Clone, PartialEq)]
pub enum GateRule {
    /// Next is available immediately.
    Open,
    /// Next waits for `media` to play past `threshold` (a fraction, 0.8 for
    /// 80 %) or end.
    Media { media: String, threshold: f64 },
}

/// Playback progress in percent, or `None` while the duration is unusable.
///
/// Media reports `NaN` before metadata arrives and `Infinity` for live
/// streams; neither can satisfy a threshold. Thresholds are compared in
/// percent so that e.g. 34.4 s of 43 s counts as 80 %.
#[must_use]
pub fn playback_percent(current_time: f64, duration: f64) -> Option<f64> {
    if !current_time.is_finite() || !duration.is_finite() || duration <= 0.0 {
        return None;
    }
    Some((current_time / duration) * 100.0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScreenGate {
    rule: GateRule,
    enabled: bool,
}

impl ScreenGate {
    #[must_use]
    pub fn new(rule: GateRule) -> Self {
        let enabled = matches!(rule, GateRule::Open);
        Self { rule, enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn rule(&self) -> &GateRule {
        &self.rule
    }

    /// Id of the gating media, if any.
    pub fn media(&self) -> Option<&str> {
        match &self.rule {
            GateRule::Open => None,
            GateRule::Media { media, .. } => Some(media.as_str()),
        }
    }

    /// Feed a `timeupdate` report. Returns `true` if this report opened the
    /// gate.
    pub fn on_time_update(&mut self, media: &str, current_time: f64, duration: f64) -> bool {
        let GateRule::Media {
            media: gated,
            threshold,
        } = &self.rule
        else {
            return false;
        };
        if self.enabled || gated != media {
            return false;
        }
        match playback_percent(current_time, duration) {
            Some(percent) if percent >= *threshold * 100.0 => {
                self.enabled = true;
                true
            }
            _ => false,
        }
    }

    /// Feed an `ended` report. Returns `true` if this report opened the gate.
    pub fn on_ended(&mut self, media: &str) -> bool {
        if self.enabled || self.media() != Some(media) {
            return false;
        }
        self.enabled = true;
        true
    }

    /// Open regardless of media. Returns `true` if the gate was closed.
    pub fn force_enable(&mut self) -> bool {
        !std::mem::replace(&mut self.enabled, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn intro_gate() -> ScreenGate {
        ScreenGate::new(GateRule::Media {
            media: "intro-video".into(),
            threshold: 0.8,
        })
    }

    #[test]
    fn open_rule_starts_enabled() {
        assert!(ScreenGate::new(GateRule::Open).is_enabled());
        assert!(!intro_gate().is_enabled());
    }

    #[test]
    fn threshold_opens_gate() {
        let mut gate = intro_gate();
        assert!(!gate.on_time_update("intro-video", 79.0, 100.0));
        assert!(!gate.is_enabled());
        assert!(gate.on_time_update("intro-video", 80.0, 100.0));
        assert!(gate.is_enabled());
        // Already open: not reported again.
        assert!(!gate.on_time_update("intro-video", 95.0, 100.0));
    }

    #[test]
    fn ended_opens_gate() {
        let mut gate = intro_gate();
        assert!(gate.on_ended("intro-video"));
        assert!(!gate.on_ended("intro-video"));
        assert!(gate.is_enabled());
    }

    #[test]
    fn other_media_is_ignored() {
        let mut gate = intro_gate();
        assert!(!gate.on_time_update("avatar-video", 10.0, 10.0));
        assert!(!gate.on_ended("avatar-video"));
        assert!(!gate.is_enabled());
    }

    #[test]
    fn unusable_durations_never_open() {
        let mut gate = intro_gate();
        for duration in [f64::NAN, f64::INFINITY, 0.0, -5.0] {
            assert!(!gate.on_time_update("intro-video", 100.0, duration));
        }
        assert!(!gate.is_enabled());
        assert_eq!(playback_percent(f64::NAN, 10.0), None);
        assert_eq!(playback_percent(5.0, 10.0), Some(50.0));
    }

    #[test]
    fn threshold_compared_in_percent() {
        // 34.4 / 43 is just below 0.8 as a fraction but exactly 80 %.
        let mut gate = intro_gate();
        assert!(gate.on_time_update("intro-video", 34.4, 43.0));
    }

    #[test]
    fn force_enable_reports_transition() {
        let mut gate = intro_gate();
        assert!(gate.force_enable());
        assert!(!gate.force_enable());
    }

    proptest! {
        #[test]
        fn gate_is_monotonic(
            reports in prop::collection::vec((0.0f64..200.0, 0.0f64..200.0, any::<bool>()), 0..40)
        ) {
            let mut gate = intro_gate();
            let mut was_enabled = false;
            for (t, d, ended) in reports {
                if ended {
                    gate.on_ended("intro-video");
                } else {
                    gate.on_time_update("intro-video", t, d);
                }
                prop_assert!(!was_enabled || gate.is_enabled());
                was_enabled = gate.is_enabled();
            }
        }
    }
}
