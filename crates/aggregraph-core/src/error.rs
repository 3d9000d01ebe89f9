use std::fmt;

/// Machine-readable error codes for agent-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    InvalidConfig,
    UnknownNode,
    CycleDetected,
    CatalogParseError,
    ReservedKey,
    IdOverflow,
    UnknownRecord,
    DanglingReference,
    DuplicateId,
    InvalidId,
    NotAnObject,
    ConflictingField,
    InvalidSymbol,
    IdWidthExceeded,
    SequenceExhausted,
    ExportFailed,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::InvalidConfig => "E1002",
            Self::UnknownNode => "E2001",
            Self::CycleDetected => "E2002",
            Self::CatalogParseError => "E2003",
            Self::ReservedKey => "E3001",
            Self::IdOverflow => "E3002",
            Self::UnknownRecord => "E3004",
            Self::DanglingReference => "E4001",
            Self::DuplicateId => "E4002",
            Self::InvalidId => "E4003",
            Self::NotAnObject => "E4004",
            Self::ConflictingField => "E4005",
            Self::InvalidSymbol => "E5001",
            Self::IdWidthExceeded => "E5002",
            Self::SequenceExhausted => "E5003",
            Self::ExportFailed => "E6001",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::InvalidConfig => "Invalid configuration value",
            Self::UnknownNode => "Type not registered in graph",
            Self::CycleDetected => "Dependency cycle detected",
            Self::CatalogParseError => "Type catalog parse error",
            Self::ReservedKey => "Field name uses a reserved key",
            Self::IdOverflow => "Surrogate id overflow",
            Self::UnknownRecord => "Record handle not owned by arena",
            Self::DanglingReference => "Dangling reference",
            Self::DuplicateId => "Surrogate id stamped twice",
            Self::InvalidId => "Invalid surrogate id",
            Self::NotAnObject => "Document root is not an object",
            Self::ConflictingField => "Field given both inline and by reference",
            Self::InvalidSymbol => "Symbol outside the id alphabet",
            Self::IdWidthExceeded => "Id does not fit configured width",
            Self::SequenceExhausted => "Id sequence exhausted",
            Self::ExportFailed => "Graph export failed",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in .aggregraph/config.toml and retry."),
            Self::InvalidConfig => Some("Correct the setting named in the message."),
            Self::UnknownNode => Some("Register both endpoint types before adding the edge."),
            Self::CycleDetected => {
                Some("Drop --strict to accept cyclic types, or break the listed cycle.")
            }
            Self::CatalogParseError => Some("Check the catalog file against the documented layout."),
            Self::ReservedKey => Some("Rename fields that start with the reference prefix."),
            Self::IdOverflow => Some("Lower pack.base_id in the project config."),
            Self::UnknownRecord | Self::NotAnObject => None,
            Self::DanglingReference => {
                Some("Every reference must point at an id stamped in the same document.")
            }
            Self::DuplicateId => Some("Each record must carry a distinct id stamp."),
            Self::InvalidId => Some("Ids are non-negative integers, as a string or number."),
            Self::ConflictingField => Some("Keep either the inline field or the reference."),
            Self::InvalidSymbol => Some("Ids use the alphabet -0-9A-Z_a-z."),
            Self::IdWidthExceeded => Some("Raise ids.width in the project config."),
            Self::SequenceExhausted => Some("Start a new generator with a different prefix."),
            Self::ExportFailed => Some("Check write permissions for the destination path."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
