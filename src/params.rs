//! Inpainting generation parameters forwarded with a saved mask.

use serde::{Deserialize, Serialize};

/// Default denoising strength
pub const DEFAULT_DENOISE: f64 = 0.75;
/// Default sampling step count
pub const DEFAULT_STEPS: u32 = 30;
/// Default classifier-free guidance scale
pub const DEFAULT_GUIDANCE: f64 = 7.5;

/// Allowed denoise range
pub const DENOISE_RANGE: (f64, f64) = (0.1, 1.0);
/// Allowed steps range
pub const STEPS_RANGE: (u32, u32) = (10, 50);
/// Allowed guidance range
pub const GUIDANCE_RANGE: (f64, f64) = (1.0, 20.0);

/// Sampler schedule used by the generation backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scheduler {
    /// Karras schedule (best quality)
    #[default]
    Karras,
    /// Euler ancestral
    EulerA,
    /// Euler
    Euler,
    /// DDIM
    Ddim,
}

impl Scheduler {
    /// Wire name of this scheduler.
    pub fn name(&self) -> &'static str {
        match self {
            Scheduler::Karras => "karras",
            Scheduler::EulerA => "euler_a",
            Scheduler::Euler => "euler",
            Scheduler::Ddim => "ddim",
        }
    }

    /// Get all schedulers.
    pub fn all() -> &'static [Scheduler] {
        &[
            Scheduler::Karras,
            Scheduler::EulerA,
            Scheduler::Euler,
            Scheduler::Ddim,
        ]
    }

    /// Parse a wire name; unknown names yield None.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|s| s.name() == name)
    }
}

/// Parameters as sent by a client: every field optional and unchecked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub denoise: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guidance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduler: Option<String>,
}

/// Normalized parameters, always within range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InpaintParameters {
    pub denoise: f64,
    pub steps: u32,
    pub guidance: f64,
    pub scheduler: Scheduler,
}

impl Default for InpaintParameters {
    fn default() -> Self {
        Self {
            denoise: DEFAULT_DENOISE,
            steps: DEFAULT_STEPS,
            guidance: DEFAULT_GUIDANCE,
            scheduler: Scheduler::default(),
        }
    }
}

/// A usable client value: present, finite and non-zero.
fn given(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v != 0.0)
}

impl InpaintParameters {
    /// Apply defaults and clamp every field into its range.
    ///
    /// Absent, zero and non-finite values take the default; an unknown
    /// scheduler falls back to karras.
    pub fn normalize(raw: Option<&RawParameters>) -> Self {
        let Some(raw) = raw else {
            return Self::default();
        };

        let denoise = given(raw.denoise)
            .unwrap_or(DEFAULT_DENOISE)
            .clamp(DENOISE_RANGE.0, DENOISE_RANGE.1);
        let steps = given(raw.steps)
            .unwrap_or(f64::from(DEFAULT_STEPS))
            .clamp(f64::from(STEPS_RANGE.0), f64::from(STEPS_RANGE.1))
            .round() as u32;
        let guidance = given(raw.guidance)
            .unwrap_or(DEFAULT_GUIDANCE)
            .clamp(GUIDANCE_RANGE.0, GUIDANCE_RANGE.1);
        let scheduler = raw
            .scheduler
            .as_deref()
            .and_then(Scheduler::from_name)
            .unwrap_or_default();

        Self {
            denoise,
            steps,
            guidance,
            scheduler,
        }
    }
}

impl From<&InpaintParameters> for RawParameters {
    fn from(params: &InpaintParameters) -> Self {
        Self {
            denoise: Some(params.denoise),
            steps: Some(f64::from(params.steps)),
            guidance: Some(params.guidance),
            scheduler: Some(params.scheduler.name().to_string()),
        }
    }
}
