use std::fmt;

/// Phase of the current height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    NewHeight,
    Propose,
    Validate,
    PreCommit,
    Commit,
    Finalize,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NewHeight => "NEW_HEIGHT",
            Self::Propose => "PROPOSE",
            Self::Validate => "VALIDATE",
            Self::PreCommit => "PRE_COMMIT",
            Self::Commit => "COMMIT",
            Self::Finalize => "FINALIZE",
        };
        f.write_str(name)
    }
}

/// What the driver of the engine must do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Keep feeding messages and timeouts.
    Continue,
    /// Pause and sync blocks up to this height (exclusive), then resync.
    Sync(u64),
}
