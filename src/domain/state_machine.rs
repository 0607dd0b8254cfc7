use crate::domain::models::{AppError, DragOffset, GestureDecision, GestureSample, SyncStatus};
use crate::state::ToggleState;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GesturePhase {
    #[default]
    Idle,
    Dragging,
}

/// Fixed thresholds and resting coordinates a release is judged against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReleaseRules {
    pub half_height: f32,
    pub flick_up_velocity: f32,
    pub flick_side_velocity: f32,
    pub on_rest: DragOffset,
    pub off_rest: DragOffset,
}

impl ReleaseRules {
    pub fn resting_offset(&self, on: bool) -> DragOffset {
        if on {
            self.on_rest
        } else {
            self.off_rest
        }
    }
}

/// First matching rule wins: upward flick, sideways flick, then which half
/// of the screen the finger was lifted in. Lifting exactly on the midpoint
/// without velocity cancels.
pub fn classify_release(sample: &GestureSample, rules: &ReleaseRules) -> GestureDecision {
    if sample.vy < rules.flick_up_velocity {
        GestureDecision::TurnOn
    } else if sample.vx > rules.flick_side_velocity {
        GestureDecision::TurnOff
    } else if sample.move_y < rules.half_height {
        GestureDecision::TurnOn
    } else if sample.move_y > rules.half_height {
        GestureDecision::TurnOff
    } else {
        GestureDecision::Cancel
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GestureMachine;

impl GestureMachine {
    pub fn grant(&self, state: ToggleState) -> Result<ToggleState, AppError> {
        if state.phase != GesturePhase::Idle {
            return Err(AppError::new(
                "INVALID_GESTURE_STATE",
                "only an idle toggle can be grabbed",
                Some("release the current drag first".to_string()),
            ));
        }
        Ok(ToggleState {
            phase: GesturePhase::Dragging,
            ..state
        })
    }

    pub fn drag(&self, state: &ToggleState) -> Result<DragOffset, AppError> {
        if state.phase != GesturePhase::Dragging {
            return Err(AppError::new(
                "INVALID_GESTURE_STATE",
                "move received without an active drag",
                Some("grant the gesture before moving".to_string()),
            ));
        }
        Ok(state.offset)
    }

    pub fn release(
        &self,
        state: ToggleState,
        sample: &GestureSample,
        rules: &ReleaseRules,
    ) -> Result<(ToggleState, GestureDecision), AppError> {
        if state.phase != GesturePhase::Dragging {
            return Err(AppError::new(
                "INVALID_GESTURE_STATE",
                "release received without an active drag",
                None,
            ));
        }
        let decision = classify_release(sample, rules);
        let next = match decision.target() {
            Some(on) => self.snap(on, rules),
            None => ToggleState {
                phase: GesturePhase::Idle,
                ..state
            },
        };
        Ok((next, decision))
    }

    /// Commits to a resting layout without a gesture, as startup
    /// reconciliation does.
    pub fn snap(&self, on: bool, rules: &ReleaseRules) -> ToggleState {
        ToggleState {
            phase: GesturePhase::Idle,
            offset: rules.resting_offset(on),
            is_on: on,
        }
    }
}

/// Transitions of the published sync status. Every method returns the next
/// status, or `None` when the transition does not apply to `current`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncMachine;

impl SyncMachine {
    /// A new run always takes over, whatever was published before.
    pub fn begin(&self, run_id: Uuid, target: bool) -> SyncStatus {
        SyncStatus::Syncing { run_id, target }
    }

    /// Only the run that is still pending may settle.
    pub fn settle(&self, current: &SyncStatus, outcome: SyncStatus) -> Option<SyncStatus> {
        let SyncStatus::Syncing { run_id, .. } = current else {
            return None;
        };
        (outcome.is_terminal() && outcome.run_id() == Some(*run_id)).then_some(outcome)
    }

    /// Startup state read from the bridge, accepted only before any run.
    pub fn reconcile(&self, current: &SyncStatus, on: bool) -> Option<SyncStatus> {
        match current {
            SyncStatus::Idle => Some(SyncStatus::Settled {
                run_id: Uuid::new_v4(),
                target: on,
                failed: Vec::new(),
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{classify_release, GestureMachine, GesturePhase, ReleaseRules, SyncMachine};
    use crate::domain::models::{DragOffset, GestureDecision, GestureSample, SyncStatus};
    use crate::state::ToggleState;
    use uuid::Uuid;

    fn rules() -> ReleaseRules {
        ReleaseRules {
            half_height: 334.0,
            flick_up_velocity: -1.0,
            flick_side_velocity: 1.0,
            on_rest: DragOffset { x: 0.0, y: -250.0 },
            off_rest: DragOffset { x: 0.0, y: 250.0 },
        }
    }

    fn release_at(vx: f32, vy: f32, move_y: f32) -> GestureSample {
        GestureSample {
            vx,
            vy,
            move_y,
            ..GestureSample::default()
        }
    }

    #[test]
    fn upward_flick_turns_on_regardless_of_position() {
        let decision = classify_release(&release_at(0.0, -1.5, 600.0), &rules());
        assert_eq!(decision, GestureDecision::TurnOn);
    }

    #[test]
    fn sideways_flick_turns_off() {
        let decision = classify_release(&release_at(1.2, 0.0, 100.0), &rules());
        assert_eq!(decision, GestureDecision::TurnOff);
    }

    #[test]
    fn upward_flick_outranks_sideways_flick() {
        let decision = classify_release(&release_at(3.0, -2.0, 600.0), &rules());
        assert_eq!(decision, GestureDecision::TurnOn);
    }

    #[test]
    fn position_decides_without_velocity() {
        let half = rules().half_height;
        assert_eq!(
            classify_release(&release_at(0.0, 0.0, half - 10.0), &rules()),
            GestureDecision::TurnOn
        );
        assert_eq!(
            classify_release(&release_at(0.0, 0.0, half + 10.0), &rules()),
            GestureDecision::TurnOff
        );
    }

    #[test]
    fn midpoint_release_cancels() {
        let half = rules().half_height;
        assert_eq!(
            classify_release(&release_at(0.0, 0.0, half), &rules()),
            GestureDecision::Cancel
        );
    }

    #[test]
    fn velocity_exactly_at_threshold_falls_through_to_position() {
        let decision = classify_release(&release_at(1.0, -1.0, 600.0), &rules());
        assert_eq!(decision, GestureDecision::TurnOff);
    }

    #[test]
    fn commit_moves_offset_to_resting_coordinate() {
        let machine = GestureMachine;
        let state = machine.grant(ToggleState::default()).unwrap();
        let (next, decision) = machine
            .release(state, &release_at(0.0, -2.0, 0.0), &rules())
            .unwrap();
        assert_eq!(decision, GestureDecision::TurnOn);
        assert_eq!(next.phase, GesturePhase::Idle);
        assert_eq!(next.offset, DragOffset { x: 0.0, y: -250.0 });
        assert!(next.is_on);
    }

    #[test]
    fn cancel_keeps_offset_and_state() {
        let machine = GestureMachine;
        let start = machine.snap(false, &rules());
        let dragging = machine.grant(start).unwrap();
        let (next, decision) = machine
            .release(dragging, &release_at(0.0, 0.0, 334.0), &rules())
            .unwrap();
        assert_eq!(decision, GestureDecision::Cancel);
        assert_eq!(next.offset, start.offset);
        assert!(!next.is_on);
        assert_eq!(next.phase, GesturePhase::Idle);
    }

    #[test]
    fn release_without_grant_is_rejected() {
        let machine = GestureMachine;
        let result = machine.release(ToggleState::default(), &release_at(0.0, 0.0, 0.0), &rules());
        assert!(result.is_err());
    }

    #[test]
    fn double_grant_is_rejected() {
        let machine = GestureMachine;
        let dragging = machine.grant(ToggleState::default()).unwrap();
        assert!(machine.grant(dragging).is_err());
        assert!(machine.drag(&dragging).is_ok());
    }

    #[test]
    fn only_the_pending_run_may_settle() {
        let machine = SyncMachine;
        let current = Uuid::new_v4();
        let syncing = machine.begin(current, true);
        let stale = SyncStatus::Settled {
            run_id: Uuid::new_v4(),
            target: false,
            failed: vec![],
        };
        assert_eq!(machine.settle(&syncing, stale), None);

        let finished = SyncStatus::Settled {
            run_id: current,
            target: true,
            failed: vec![2],
        };
        assert_eq!(
            machine.settle(&syncing, finished.clone()),
            Some(finished.clone())
        );
        assert_eq!(machine.settle(&finished, finished.clone()), None);
    }

    #[test]
    fn reconcile_applies_only_before_any_run() {
        let machine = SyncMachine;
        let settled = machine.reconcile(&SyncStatus::Idle, true).unwrap();
        assert!(matches!(settled, SyncStatus::Settled { target: true, .. }));
        let syncing = machine.begin(Uuid::new_v4(), false);
        assert_eq!(machine.reconcile(&syncing, true), None);
    }
}
