use snapshot_core::SnapState;

/// The scheduling state of a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// The process is being built and must not be scheduled yet.
    Embryo,
    /// The process is ready to be scheduled.
    Ready,
    /// The process is waiting on an event to occur before it can be scheduled.
    Waiting,
    /// The process is currently running.
    Running,
    /// The process has exited and waits to be reaped.
    Zombie,
}

impl From<State> for SnapState {
    fn from(state: State) -> Self {
        match state {
            State::Embryo => SnapState::Embryo,
            State::Ready => SnapState::Ready,
            State::Waiting => SnapState::Waiting,
            State::Running => SnapState::Running,
            State::Zombie => SnapState::Zombie,
        }
    }
}

impl From<SnapState> for State {
    fn from(state: SnapState) -> Self {
        match state {
            SnapState::Embryo => State::Embryo,
            SnapState::Ready => State::Ready,
            SnapState::Waiting => State::Waiting,
            SnapState::Running => State::Running,
            SnapState::Zombie => State::Zombie,
        }
    }
}
