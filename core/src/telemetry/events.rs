use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::config::{ConfigurationError, RuntimeConfiguration};
use crate::engine::{Device, ModelAcquisitionError, ResourceUnavailableError};

pub(crate) const TARGET: &str = "telemetry::engine";
pub(crate) const EVENT_CONFIG_RESOLVED: &str = "config_resolved";
pub(crate) const EVENT_CONFIG_REJECTED: &str = "config_rejected";
pub(crate) const EVENT_RESOURCE_UNAVAILABLE: &str = "resource_unavailable";
pub(crate) const EVENT_DEVICE_SELECTED: &str = "device_selected";
pub(crate) const EVENT_MODEL_ACQUISITION_FAILED: &str = "model_acquisition_failed";
pub(crate) const EVENT_SYNTHESIS: &str = "synthesis_completed";

#[derive(Debug, Serialize)]
pub struct SynthesisEvent<'a> {
    pub pipeline: &'a str,
    pub characters: usize,
    pub audio_bytes: usize,
    pub sample_rate_hz: u32,
    pub latency_ms: u64,
    pub saved_to: Option<String>,
}

pub fn record_configuration_resolved(config: &RuntimeConfiguration) {
    match serde_json::to_string(config) {
        Ok(payload) => info!(
            target: TARGET,
            event = EVENT_CONFIG_RESOLVED,
            environment = config.environment_mode.as_str(),
            device = config.device_preference.as_str(),
            workers = config.worker_count,
            model = %config.default_model_identifier,
            payload = %payload,
            "runtime configuration resolved"
        ),
        Err(err) => warn!(
            target: TARGET,
            event = EVENT_CONFIG_RESOLVED,
            %err,
            "failed to encode runtime configuration"
        ),
    }
}

/// 每个非法配置键单独一行。
pub fn record_configuration_error(failure: &ConfigurationError) {
    error!(
        target: TARGET,
        event = EVENT_CONFIG_REJECTED,
        key = failure.key,
        value = %failure.value,
        problem = %failure.problem,
        "invalid configuration setting"
    );
}

pub fn record_resource_unavailable(failure: &ResourceUnavailableError) {
    error!(
        target: TARGET,
        event = EVENT_RESOURCE_UNAVAILABLE,
        key = failure.setting,
        path = %failure.path.display(),
        reason = %failure.reason,
        "startup resource unavailable"
    );
}

pub fn record_device_selected(requested: &str, device: Device) {
    info!(
        target: TARGET,
        event = EVENT_DEVICE_SELECTED,
        requested,
        device = device.as_str(),
        "compute device selected"
    );
}

pub fn record_model_acquisition_failed(failure: &ModelAcquisitionError) {
    warn!(
        target: TARGET,
        event = EVENT_MODEL_ACQUISITION_FAILED,
        model = %failure.model,
        reason = %failure.reason,
        "model acquisition failed; request aborted"
    );
}

pub fn record_synthesis(
    pipeline: &str,
    characters: usize,
    audio_bytes: usize,
    sample_rate_hz: u32,
    latency: Duration,
    saved_to: Option<&Path>,
) {
    let event = SynthesisEvent {
        pipeline,
        characters,
        audio_bytes,
        sample_rate_hz,
        latency_ms: duration_to_ms(latency),
        saved_to: saved_to.map(|path| path.display().to_string()),
    };

    match serde_json::to_string(&event) {
        Ok(payload) => info!(
            target: TARGET,
            event = EVENT_SYNTHESIS,
            pipeline = event.pipeline,
            characters = event.characters,
            audio_bytes = event.audio_bytes,
            latency_ms = event.latency_ms,
            payload = %payload
        ),
        Err(err) => warn!(
            target: TARGET,
            event = EVENT_SYNTHESIS,
            %err,
            "failed to encode synthesis event"
        ),
    }
}

fn duration_to_ms(duration: Duration) -> u64 {
    duration.as_millis().min(u64::MAX as u128) as u64
}
