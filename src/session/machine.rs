/// Pure session state machine
///
/// `step` maps the current state and one input to the next state plus the
/// side effects the runner must perform. No timers, I/O or clocks live
/// here; the runner owns all of that and feeds results back as inputs.
use crate::state::data::CapturedFrame;
use crate::state::layout::LayoutSpec;

/// Countdown starts here before every shot
pub const COUNTDOWN_FROM: u8 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the overlay to report ready
    Idle,
    /// Showing the countdown value
    Counting(u8),
    /// Flash fired, frame requested from the camera
    Flashing,
    /// Frame in hand, persistence being dispatched
    Capturing,
    /// Pause between two shots
    Cooldown,
    /// All shots taken, grace period before navigating
    Complete,
    /// Navigation signals sent
    Finished,
    Stopped,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Finished | Phase::Stopped)
    }
}

/// Timed waits the machine can ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wait {
    Tick,
    BetweenShots,
    Grace,
}

impl Wait {
    /// Input delivered when the wait elapses
    pub fn input(&self) -> Input {
        match self {
            Wait::Tick => Input::Tick,
            Wait::BetweenShots => Input::Resume,
            Wait::Grace => Input::GraceElapsed,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Ready,
    Tick,
    /// Camera result; `None` when the camera failed
    Shutter(Option<CapturedFrame>),
    /// Persistence for the current shot has been dispatched
    Persisted,
    Resume,
    GraceElapsed,
    Stop,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    ShowCountdown(u8),
    ShowProgress { taken: u32, total: u32 },
    Flash,
    /// Ask the camera for shot `index` (1-based)
    Capture { index: u32 },
    /// Hand the frame to the store; `None` skips the write
    Persist(Option<CapturedFrame>),
    SwapOverlay,
    Schedule(Wait),
    Navigate,
}

/// Everything the sequencer tracks for one session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub phase: Phase,
    pub total_shots: u32,
    pub shots_taken: u32,
    pub alternate_active: bool,
    layout: LayoutSpec,
}

impl SessionState {
    pub fn new(layout: LayoutSpec) -> Self {
        Self {
            phase: Phase::Idle,
            total_shots: layout.total_shots,
            shots_taken: 0,
            alternate_active: false,
            layout,
        }
    }
}

/// Advance the machine by one input
pub fn step(state: &SessionState, input: Input) -> (SessionState, Vec<Effect>) {
    let mut next = state.clone();
    let mut effects = Vec::new();

    match (state.phase, input) {
        (phase, Input::Stop) if !phase.is_terminal() => {
            next.phase = Phase::Stopped;
        }
        (Phase::Idle, Input::Ready) => {
            effects.push(Effect::ShowProgress {
                taken: 0,
                total: state.total_shots,
            });
            begin_countdown(&mut next, &mut effects);
        }
        (Phase::Cooldown, Input::Resume) => {
            begin_countdown(&mut next, &mut effects);
        }
        (Phase::Counting(n), Input::Tick) if n > 1 => {
            next.phase = Phase::Counting(n - 1);
            effects.push(Effect::ShowCountdown(n - 1));
            effects.push(Effect::Schedule(Wait::Tick));
        }
        (Phase::Counting(_), Input::Tick) => {
            next.phase = Phase::Flashing;
            effects.push(Effect::ShowCountdown(0));
            effects.push(Effect::Flash);
            effects.push(Effect::Capture {
                index: state.shots_taken + 1,
            });
        }
        (Phase::Flashing, Input::Shutter(frame)) => {
            next.phase = Phase::Capturing;
            effects.push(Effect::Persist(frame));
        }
        (Phase::Capturing, Input::Persisted) => {
            next.shots_taken = state.shots_taken + 1;
            effects.push(Effect::ShowProgress {
                taken: next.shots_taken,
                total: state.total_shots,
            });

            if !state.alternate_active && state.layout.switches_overlay_at(state.shots_taken) {
                next.alternate_active = true;
                effects.push(Effect::SwapOverlay);
            }

            if next.shots_taken < state.total_shots {
                next.phase = Phase::Cooldown;
                effects.push(Effect::Schedule(Wait::BetweenShots));
            } else {
                next.phase = Phase::Complete;
                effects.push(Effect::Schedule(Wait::Grace));
            }
        }
        (Phase::Complete, Input::GraceElapsed) => {
            next.phase = Phase::Finished;
            effects.push(Effect::Navigate);
        }
        // Anything else is stale or out of order
        _ => {}
    }

    (next, effects)
}

fn begin_countdown(next: &mut SessionState, effects: &mut Vec<Effect>) {
    next.phase = Phase::Counting(COUNTDOWN_FROM);
    effects.push(Effect::ShowCountdown(COUNTDOWN_FROM));
    effects.push(Effect::Schedule(Wait::Tick));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::LayoutId;

    fn state(layout: LayoutId) -> SessionState {
        SessionState::new(LayoutSpec::for_layout(layout))
    }

    #[test]
    fn test_ready_starts_countdown_at_seven() {
        let (next, effects) = step(&state(LayoutId::Square1), Input::Ready);
        assert_eq!(next.phase, Phase::Counting(7));
        assert_eq!(
            effects,
            vec![
                Effect::ShowProgress { taken: 0, total: 5 },
                Effect::ShowCountdown(7),
                Effect::Schedule(Wait::Tick),
            ]
        );
    }

    #[test]
    fn test_last_tick_flashes_and_captures() {
        let mut s = state(LayoutId::Square1);
        s.phase = Phase::Counting(1);
        s.shots_taken = 2;

        let (next, effects) = step(&s, Input::Tick);
        assert_eq!(next.phase, Phase::Flashing);
        assert_eq!(
            effects,
            vec![
                Effect::ShowCountdown(0),
                Effect::Flash,
                Effect::Capture { index: 3 },
            ]
        );
    }

    #[test]
    fn test_full_cycle_counts_down_every_value() {
        let (mut s, _) = step(&state(LayoutId::Square1), Input::Ready);
        let mut shown = vec![7];
        while let Phase::Counting(_) = s.phase {
            let (next, effects) = step(&s, Input::Tick);
            // The phase carries the value on screen
            if let Phase::Counting(n) = next.phase {
                assert_eq!(effects.first(), Some(&Effect::ShowCountdown(n)));
            }
            for effect in effects {
                if let Effect::ShowCountdown(n) = effect {
                    shown.push(n);
                }
            }
            s = next;
        }
        assert_eq!(shown, vec![7, 6, 5, 4, 3, 2, 1, 0]);
        assert_eq!(s.phase, Phase::Flashing);
    }

    #[test]
    fn test_missing_frame_still_counts_the_shot() {
        let mut s = state(LayoutId::Square1);
        s.phase = Phase::Flashing;

        let (s, effects) = step(&s, Input::Shutter(None));
        assert_eq!(effects, vec![Effect::Persist(None)]);

        let (s, effects) = step(&s, Input::Persisted);
        assert_eq!(s.shots_taken, 1);
        assert_eq!(s.phase, Phase::Cooldown);
        assert_eq!(
            effects,
            vec![
                Effect::ShowProgress { taken: 1, total: 5 },
                Effect::Schedule(Wait::BetweenShots),
            ]
        );
    }

    #[test]
    fn test_last_shot_completes_then_navigates_once() {
        let mut s = state(LayoutId::FourFive5);
        s.phase = Phase::Capturing;
        s.shots_taken = 5;

        let (s, effects) = step(&s, Input::Persisted);
        assert_eq!(s.phase, Phase::Complete);
        assert_eq!(effects.last(), Some(&Effect::Schedule(Wait::Grace)));

        let (s, effects) = step(&s, Input::GraceElapsed);
        assert_eq!(s.phase, Phase::Finished);
        assert_eq!(effects, vec![Effect::Navigate]);

        let (s, effects) = step(&s, Input::GraceElapsed);
        assert_eq!(s.phase, Phase::Finished);
        assert!(effects.is_empty());
    }

    #[test]
    fn test_alternate_overlay_switches_on_fifth_shot_of_square3() {
        let mut s = state(LayoutId::Square3);
        s.phase = Phase::Capturing;
        s.shots_taken = 4;

        let (next, effects) = step(&s, Input::Persisted);
        assert!(next.alternate_active);
        assert!(effects.contains(&Effect::SwapOverlay));

        let mut s = state(LayoutId::Square3);
        s.phase = Phase::Capturing;
        s.shots_taken = 3;
        let (next, effects) = step(&s, Input::Persisted);
        assert!(!next.alternate_active);
        assert!(!effects.contains(&Effect::SwapOverlay));
    }

    #[test]
    fn test_stop_is_final() {
        let mut s = state(LayoutId::Square1);
        s.phase = Phase::Counting(4);

        let (s, effects) = step(&s, Input::Stop);
        assert_eq!(s.phase, Phase::Stopped);
        assert!(effects.is_empty());

        for input in [Input::Tick, Input::Resume, Input::GraceElapsed, Input::Ready] {
            let (after, effects) = step(&s, input);
            assert_eq!(after.phase, Phase::Stopped);
            assert!(effects.is_empty());
        }
    }

    #[test]
    fn test_out_of_order_inputs_are_ignored() {
        let s = state(LayoutId::Square1);
        let (next, effects) = step(&s, Input::Tick);
        assert_eq!(next, s);
        assert!(effects.is_empty());
    }
}
