use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub bridge: BridgeConfig,
    pub sync: SyncConfig,
    pub layout: LayoutConfig,
    pub gesture: GestureConfig,
    pub motion: MotionProfile,
    pub labels: StatusLabels,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct BridgeConfig {
    pub api_base: String,
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncConfig {
    pub light_ids: Vec<u8>,
    pub reference_light_id: u8,
    pub stagger_ms: u64,
    pub batch_timeout_ms: u64,
    pub startup_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutConfig {
    pub viewport_width: f32,
    pub viewport_height: f32,
    pub background_extra_height: f32,
    pub handle_width_padding: f32,
    pub grabbed_width_inset: f32,
    pub handle_height: f32,
    /// Subtracted from the handle's vertical position so the touch point
    /// lands on the handle's center instead of its top edge.
    pub handle_anchor_offset: f32,
    pub parallax_divisor: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct GestureConfig {
    pub flick_up_velocity: f32,
    pub flick_side_velocity: f32,
    pub resting_offset: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct MotionProfile {
    pub spring_tension: f32,
    pub settle_friction: f32,
    pub width_friction: f32,
    pub reveal_friction: f32,
    pub fade_duration_ms: u64,
    pub grabbed_overlay_opacity: f32,
    pub on_overlay_opacity: f32,
    pub off_overlay_opacity: f32,
    pub indicator_width: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct StatusLabels {
    pub idle: String,
    pub grabbed: String,
    pub on: String,
    pub off: String,
    /// `{label}` and `{count}` are substituted.
    pub partial_failure: String,
}

/// One pan sample as delivered by the touch collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GestureSample {
    pub dx: f32,
    pub dy: f32,
    pub vx: f32,
    pub vy: f32,
    pub move_x: f32,
    pub move_y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DragOffset {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeometrySample {
    pub handle_x: f32,
    pub handle_y: f32,
    pub background_y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureDecision {
    TurnOn,
    TurnOff,
    Cancel,
}

impl GestureDecision {
    pub fn target(self) -> Option<bool> {
        match self {
            GestureDecision::TurnOn => Some(true),
            GestureDecision::TurnOff => Some(false),
            GestureDecision::Cancel => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightTarget {
    pub id: u8,
    pub on: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncStatus {
    #[default]
    Idle,
    Syncing {
        run_id: Uuid,
        target: bool,
    },
    Settled {
        run_id: Uuid,
        target: bool,
        failed: Vec<u8>,
    },
}

impl SyncStatus {
    pub fn run_id(&self) -> Option<Uuid> {
        match self {
            SyncStatus::Idle => None,
            SyncStatus::Syncing { run_id, .. } | SyncStatus::Settled { run_id, .. } => {
                Some(*run_id)
            }
        }
    }

    pub fn target(&self) -> Option<bool> {
        match self {
            SyncStatus::Idle => None,
            SyncStatus::Syncing { target, .. } | SyncStatus::Settled { target, .. } => {
                Some(*target)
            }
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SyncStatus::Settled { .. })
    }

    pub fn label(&self, labels: &StatusLabels) -> String {
        match self {
            SyncStatus::Idle => labels.idle.clone(),
            SyncStatus::Syncing { target, .. } => labels.for_target(*target).to_string(),
            SyncStatus::Settled { target, failed, .. } if failed.is_empty() => {
                labels.for_target(*target).to_string()
            }
            SyncStatus::Settled { target, failed, .. } => labels
                .partial_failure
                .replace("{label}", labels.for_target(*target))
                .replace("{count}", &failed.len().to_string()),
        }
    }
}

impl StatusLabels {
    pub fn for_target(&self, on: bool) -> &str {
        if on {
            &self.on
        } else {
            &self.off
        }
    }
}

/// `GET /lights/{id}` body. Only the fields the toggle reads are kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LightInfo {
    pub state: LightStateBody,
}

/// `PUT /lights/{id}/state` body, also nested in [`LightInfo`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LightStateBody {
    pub on: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppError {
    pub code: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl AppError {
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        suggestion: Option<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            suggestion,
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            api_base: "http://10.0.0.61/api/97B53A9ADC".to_string(),
            request_timeout_ms: 3000,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            light_ids: vec![1, 2, 3, 4, 5],
            reference_light_id: 1,
            stagger_ms: 500,
            batch_timeout_ms: 5000,
            startup_delay_ms: 1000,
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            viewport_width: 375.0,
            viewport_height: 667.0,
            background_extra_height: 400.0,
            handle_width_padding: 10.0,
            grabbed_width_inset: 150.0,
            handle_height: 80.0,
            handle_anchor_offset: 0.0,
            parallax_divisor: 2.0,
        }
    }
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            flick_up_velocity: -1.0,
            flick_side_velocity: 1.0,
            resting_offset: 250.0,
        }
    }
}

impl Default for MotionProfile {
    fn default() -> Self {
        Self {
            spring_tension: 40.0,
            settle_friction: 6.0,
            width_friction: 5.0,
            reveal_friction: 10.0,
            fade_duration_ms: 5,
            grabbed_overlay_opacity: 0.5,
            on_overlay_opacity: 0.8,
            off_overlay_opacity: 0.4,
            indicator_width: 50.0,
        }
    }
}

impl Default for StatusLabels {
    fn default() -> Self {
        Self {
            idle: "Loading".to_string(),
            grabbed: "Wheeee!".to_string(),
            on: "🎄 Christmas time! 🌟".to_string(),
            off: "All quiet 💤".to_string(),
            partial_failure: "{label} ({count} unreachable)".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, StatusLabels, SyncStatus};
    use uuid::Uuid;

    #[test]
    fn partial_config_falls_back_to_defaults() {
        let raw = r#"{ "sync": { "staggerMs": 250 }, "layout": { "viewportHeight": 800 } }"#;
        let config: AppConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.sync.stagger_ms, 250);
        assert_eq!(config.sync.light_ids, vec![1, 2, 3, 4, 5]);
        assert_eq!(config.layout.viewport_height, 800.0);
        assert_eq!(config.layout.parallax_divisor, 2.0);
        assert_eq!(config.gesture.resting_offset, 250.0);
    }

    #[test]
    fn settled_with_failures_uses_partial_label() {
        let labels = StatusLabels::default();
        let status = SyncStatus::Settled {
            run_id: Uuid::new_v4(),
            target: false,
            failed: vec![3],
        };
        assert_eq!(status.label(&labels), "All quiet 💤 (1 unreachable)");
        assert!(status.is_terminal());
    }

    #[test]
    fn idle_status_shows_neutral_label() {
        let labels = StatusLabels::default();
        assert_eq!(SyncStatus::Idle.label(&labels), "Loading");
        assert_eq!(SyncStatus::Idle.run_id(), None);
    }
}
