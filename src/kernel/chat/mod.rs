//! Chat session models and the view models the renderer reads from.

pub mod model;
pub mod session;
pub mod view_model;
pub mod words;

pub use model::{
    ChatRequestModel, ChatResponseModel, ChatResult, ChatVote, CodeCitation, ContentReference,
    ErrorDetails, Followup, RequestId, ResponseId, ResponsePart, TextEditGroup, UsedContext,
    VoteDownReason,
};
pub use session::{ChatSessionModel, ResponseHandle, SessionEvent};
pub use view_model::{
    advance_timings, ChatItemViewModel, ChatViewModel, ChatViewModelChange,
    ContentUpdateTimings, ItemId, RenderData, RenderKey, RequestViewModel, ResponseViewModel,
};
pub use words::{count_words, take_words, WordPrefix};
