//! The cluster-wide error taxonomy.
//!
//! Any failure that crosses a process boundary is reported as exactly one of these tags. Detail
//! strings, where there are any, travel in a separate field of the enclosing message.

wire_enum! {
    /// Wire-stable error tag, stored as a `u16`. New tags may only be appended; ordinals that
    /// this build doesn't know decode as [`ErrorType::Other`].
    #[allow(clippy::upper_case_acronyms)]
    pub enum ErrorType (default = BranchNotFound, unknown = Other) {
        BranchNotFound = 0,
        BranchDetailsNotFound = 1,
        RepositoryNotFound = 2,
        RepositoryInitFailed = 3,
        CommitError = 4,
        GitError = 5,
        ProjectNotFound = 6,
        ProjectParseError = 7,
        ProjectPathError = 8,
        ProjectSaveError = 9,
        ProjectInitError = 10,
        MetaDataNotFound = 11,
        MissingStartupDir = 12,
        CliParseError = 13,
        MissingNodeId = 14,
        MissingNode = 15,
        AssetNotFoundError = 16,
        AssetLoadError = 17,
        AssetSaveError = 18,
        AssetDeleteError = 19,
        ParseError = 20,
        OK = 21,
        AlreadyVoted = 22,
        AppendEntryFailed = 23,
        CandidateUnknown = 24,
        EntryInvalidated = 25,
        InvalidCurrentIndex = 26,
        InvalidLastLog = 27,
        InvalidLastLogTerm = 28,
        InvalidTerm = 29,
        LogFormatError = 30,
        LogIncomplete = 31,
        NoError = 32,
        NoNode = 33,
        NotCandidate = 34,
        NotLeader = 35,
        NotVotingState = 36,
        ResponseTimeout = 37,
        SnapshotFormatError = 38,
        StaleResponse = 39,
        UnexpectedVotingChange = 40,
        VoteTermMismatch = 41,
        Other = 42,
    }
}

/// Coarse grouping of [`ErrorType`] tags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Version control and repository failures.
    Repository,
    /// Project lifecycle failures.
    Project,
    /// Asset I/O failures.
    Asset,
    /// Startup, command line and parse failures.
    Cli,
    /// Raft protocol failures.
    Raft,
    /// The explicit success markers.
    Success,
    Other,
}

impl ErrorType {
    pub fn category(self) -> ErrorCategory {
        use ErrorType::*;
        match self {
            BranchNotFound | BranchDetailsNotFound | RepositoryNotFound | RepositoryInitFailed
            | CommitError | GitError => ErrorCategory::Repository,
            ProjectNotFound | ProjectParseError | ProjectPathError | ProjectSaveError
            | ProjectInitError | MetaDataNotFound | MissingStartupDir => ErrorCategory::Project,
            CliParseError | MissingNodeId | MissingNode | ParseError => ErrorCategory::Cli,
            AssetNotFoundError | AssetLoadError | AssetSaveError | AssetDeleteError => {
                ErrorCategory::Asset
            }
            OK | NoError => ErrorCategory::Success,
            AlreadyVoted | AppendEntryFailed | CandidateUnknown | EntryInvalidated
            | InvalidCurrentIndex | InvalidLastLog | InvalidLastLogTerm | InvalidTerm
            | LogFormatError | LogIncomplete | NoNode | NotCandidate | NotLeader
            | NotVotingState | ResponseTimeout | SnapshotFormatError | StaleResponse
            | UnexpectedVotingChange | VoteTermMismatch => ErrorCategory::Raft,
            Other => ErrorCategory::Other,
        }
    }

    /// True for `OK` and `NoError`.
    pub fn is_success(self) -> bool {
        self.category() == ErrorCategory::Success
    }
}
