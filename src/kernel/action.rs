use crate::kernel::chat::{ChatVote, RequestId, ResponseId, ResponsePart, VoteDownReason};
use crate::kernel::coverage::{
    CoverageDetail, CoverageFilter, CoverageSortOrder, ElementKey, FileCoverage,
};
use crate::kernel::services::ports::Settings;

#[derive(Debug, Clone)]
pub enum Action {
    CoverageReset {
        files: Vec<FileCoverage>,
    },
    CoverageAddFile(FileCoverage),
    CoverageExpand {
        key: ElementKey,
    },
    CoverageCollapse {
        key: ElementKey,
    },
    CoverageToggle {
        key: ElementKey,
    },
    CoverageDetailsLoaded {
        path: String,
        test: Option<String>,
        details: Vec<CoverageDetail>,
    },
    CoverageSetSortOrder(CoverageSortOrder),
    CoverageSetFilter(Option<CoverageFilter>),
    ChatAddRequest {
        message: String,
    },
    ChatAddResponse {
        request: RequestId,
    },
    ChatAppendMarkdown {
        response: ResponseId,
        text: String,
    },
    ChatPushPart {
        response: ResponseId,
        part: ResponsePart,
    },
    ChatCompleteResponse {
        response: ResponseId,
    },
    ChatCancelResponse {
        response: ResponseId,
    },
    ChatRemoveRequest {
        request: RequestId,
    },
    /// Applies session changes made directly through the session handle.
    ChatSync,
    ChatVote {
        response: ResponseId,
        vote: Option<ChatVote>,
    },
    ChatVoteDownReason {
        response: ResponseId,
        reason: Option<VoteDownReason>,
    },
    ChatEditApplied {
        response: ResponseId,
        uri: String,
        edit_count: u32,
    },
    SettingsChanged(Settings),
}
