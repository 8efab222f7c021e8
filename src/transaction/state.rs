use std::fmt;

/// Progress of one body direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    /// Not decided yet whether the body will flow.
    Undecided,
    /// Body bytes are flowing.
    Active,
    /// Flow has ended.
    Complete,
    /// The body will never flow.
    Never,
}

/// Virgin-body reception and adapted-body transmission states of a
/// transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyStates {
    pub vb: OperationState,
    pub ab: OperationState,
}

impl Default for BodyStates {
    fn default() -> Self {
        Self {
            vb: OperationState::Undecided,
            ab: OperationState::Undecided,
        }
    }
}

impl BodyStates {
    /// Adapted content may be extracted or shifted.
    pub fn ab_sending(&self) -> bool {
        matches!(self.ab, OperationState::Active | OperationState::Complete)
    }

    /// The virgin body is, or was, being received.
    pub fn vb_started(&self) -> bool {
        matches!(self.vb, OperationState::Active | OperationState::Complete)
    }
}

impl fmt::Display for BodyStates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vb={:?} ab={:?}", self.vb, self.ab)
    }
}
