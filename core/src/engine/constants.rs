pub(crate) const TONE_BASE_HZ: f32 = 220.0;
pub(crate) const TONE_STEP_RATIO: f32 = 1.059_463_1;
pub(crate) const TONE_STEPS: u32 = 24;
pub(crate) const TONE_MS: u32 = 60;
pub(crate) const PAUSE_MS: u32 = 90;
pub(crate) const TONE_AMPLITUDE: f32 = 0.3;
pub(crate) const FADE_MS: u32 = 5;
