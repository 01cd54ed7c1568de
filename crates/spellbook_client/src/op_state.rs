//! Per-operation in-flight tracking.

/// Lifecycle of one logical client operation.
///
/// `Idle -> InFlight -> Idle | Failed`; a failed operation may start again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OpState {
    #[default]
    Idle,
    InFlight,
    Failed,
}

impl OpState {
    pub fn is_in_flight(self) -> bool {
        self == OpState::InFlight
    }

    /// Enter `InFlight`, or `None` when already there.
    pub fn begin(self) -> Option<OpState> {
        match self {
            OpState::InFlight => None,
            OpState::Idle | OpState::Failed => Some(OpState::InFlight),
        }
    }

    /// Leave `InFlight` with the operation's outcome.
    pub fn finish(self, succeeded: bool) -> OpState {
        if succeeded {
            OpState::Idle
        } else {
            OpState::Failed
        }
    }
}

/// Independent loading flags; there is no global busy flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadingFlag {
    List,
    Spell,
    Save,
    Delete,
    Trash,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadingFlags {
    pub list: OpState,
    pub spell: OpState,
    pub save: OpState,
    pub delete: OpState,
    pub trash: OpState,
}

impl LoadingFlags {
    pub fn get(&self, flag: LoadingFlag) -> OpState {
        match flag {
            LoadingFlag::List => self.list,
            LoadingFlag::Spell => self.spell,
            LoadingFlag::Save => self.save,
            LoadingFlag::Delete => self.delete,
            LoadingFlag::Trash => self.trash,
        }
    }

    pub fn set(&mut self, flag: LoadingFlag, state: OpState) {
        let slot = match flag {
            LoadingFlag::List => &mut self.list,
            LoadingFlag::Spell => &mut self.spell,
            LoadingFlag::Save => &mut self.save,
            LoadingFlag::Delete => &mut self.delete,
            LoadingFlag::Trash => &mut self.trash,
        };
        *slot = state;
    }
}
