use std::fmt;

/// Machine-readable error codes for scripted callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotInitialized,
    ConfigParseError,
    ChapterOutOfRange,
    ChapterLocked,
    FinalChoiceAlreadyMade,
    FinalChoiceUnavailable,
    InvalidChoiceValue,
    CorruptState,
    UnsupportedVersion,
    StorageWriteFailed,
    StorageQuotaExceeded,
    LockContention,
    StorageDisabled,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::ChapterOutOfRange => "E2001",
            Self::ChapterLocked => "E2002",
            Self::FinalChoiceAlreadyMade => "E2003",
            Self::FinalChoiceUnavailable => "E2004",
            Self::InvalidChoiceValue => "E2005",
            Self::CorruptState => "E3001",
            Self::UnsupportedVersion => "E3002",
            Self::StorageWriteFailed => "E5001",
            Self::StorageQuotaExceeded => "E5002",
            Self::LockContention => "E5003",
            Self::StorageDisabled => "E5004",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotInitialized => "Journey not initialized",
            Self::ConfigParseError => "Config file parse error",
            Self::ChapterOutOfRange => "Chapter index out of range",
            Self::ChapterLocked => "Chapter is locked",
            Self::FinalChoiceAlreadyMade => "Final choice already made",
            Self::FinalChoiceUnavailable => "Final choice not yet available",
            Self::InvalidChoiceValue => "Invalid final choice value",
            Self::CorruptState => "Corrupt persisted progress",
            Self::UnsupportedVersion => "Unsupported progress format version",
            Self::StorageWriteFailed => "Progress write failed",
            Self::StorageQuotaExceeded => "Storage quota exceeded",
            Self::LockContention => "Lock contention",
            Self::StorageDisabled => "Storage disabled",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to the user.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run `journey init` to create the .journey/ directory."),
            Self::ConfigParseError => Some("Fix syntax in .journey/config.toml and retry."),
            Self::ChapterOutOfRange => Some("Chapters are numbered 1 through 8."),
            Self::ChapterLocked => Some("Complete the previous chapter first."),
            Self::FinalChoiceAlreadyMade => Some("The final choice cannot be changed."),
            Self::FinalChoiceUnavailable => Some("Complete every chapter before choosing."),
            Self::InvalidChoiceValue => Some("Use `accept` or `also-accept`."),
            Self::CorruptState => {
                Some("The damaged copy was set aside as a .corrupt file; progress starts over.")
            }
            Self::UnsupportedVersion => Some("Upgrade journey to read this progress file."),
            Self::StorageWriteFailed => Some("Check disk space and write permissions."),
            Self::StorageQuotaExceeded => Some("Shorten long answers or clear old notes."),
            Self::LockContention => Some("Retry after the other `journey` process finishes."),
            Self::StorageDisabled => Some("Progress is kept for this session only."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
