//! Chat request/response domain model.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResponseId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "request_{}", self.0)
    }
}

impl fmt::Display for ResponseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "response_{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChatVote {
    Up,
    Down,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VoteDownReason {
    Incorrect,
    DidNotFollowInstructions,
    Offensive,
    IncompleteCode,
    MissingContext,
    Other,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentReference {
    pub uri: String,
    pub label: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeCitation {
    pub uri: String,
    pub license: String,
    pub snippet: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UsedContext {
    pub documents: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Followup {
    pub message: String,
    pub title: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorDetails {
    pub message: String,
    pub response_is_filtered: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChatResult {
    pub error_details: Option<ErrorDetails>,
    pub metadata: Option<serde_json::Value>,
}

/// A group of edits proposed for one file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextEditGroup {
    pub uri: String,
    pub edit_count: u32,
    pub applied: u32,
    pub done: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResponsePart {
    Markdown(String),
    InlineReference { name: String, uri: String },
    Progress(String),
    Warning(String),
    TextEditGroup(TextEditGroup),
    ToolInvocation { name: String, complete: bool },
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChatResponseModel {
    id: ResponseId,
    request_id: RequestId,
    parts: Vec<ResponsePart>,
    is_complete: bool,
    is_canceled: bool,
    vote: Option<ChatVote>,
    vote_down_reason: Option<VoteDownReason>,
    used_context: Option<UsedContext>,
    content_references: Vec<ContentReference>,
    code_citations: Vec<CodeCitation>,
    followups: Option<Vec<Followup>>,
    result: Option<ChatResult>,
}

impl ChatResponseModel {
    pub fn new(id: ResponseId, request_id: RequestId) -> Self {
        Self {
            id,
            request_id,
            parts: Vec::new(),
            is_complete: false,
            is_canceled: false,
            vote: None,
            vote_down_reason: None,
            used_context: None,
            content_references: Vec::new(),
            code_citations: Vec::new(),
            followups: None,
            result: None,
        }
    }

    pub fn id(&self) -> ResponseId {
        self.id
    }

    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    pub fn parts(&self) -> &[ResponsePart] {
        &self.parts
    }

    pub fn is_complete(&self) -> bool {
        self.is_complete
    }

    pub fn is_canceled(&self) -> bool {
        self.is_canceled
    }

    pub fn vote(&self) -> Option<ChatVote> {
        self.vote
    }

    pub fn vote_down_reason(&self) -> Option<VoteDownReason> {
        self.vote_down_reason
    }

    pub fn used_context(&self) -> Option<&UsedContext> {
        self.used_context.as_ref()
    }

    pub fn content_references(&self) -> &[ContentReference] {
        &self.content_references
    }

    pub fn code_citations(&self) -> &[CodeCitation] {
        &self.code_citations
    }

    pub fn followups(&self) -> Option<&[Followup]> {
        self.followups.as_deref()
    }

    pub fn result(&self) -> Option<&ChatResult> {
        self.result.as_ref()
    }

    pub fn error_details(&self) -> Option<&ErrorDetails> {
        self.result.as_ref().and_then(|r| r.error_details.as_ref())
    }

    pub fn progress_messages(&self) -> impl Iterator<Item = &str> + '_ {
        self.parts.iter().filter_map(|p| match p {
            ResponsePart::Progress(msg) => Some(msg.as_str()),
            _ => None,
        })
    }

    pub fn has_markdown_content(&self) -> bool {
        self.parts
            .iter()
            .any(|p| matches!(p, ResponsePart::Markdown(_)))
    }

    /// The whole response rendered as markdown text.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                ResponsePart::Markdown(text) => out.push_str(text),
                ResponsePart::InlineReference { name, uri } => {
                    out.push_str(&format!("[{name}]({uri})"));
                }
                ResponsePart::Progress(_)
                | ResponsePart::Warning(_)
                | ResponsePart::TextEditGroup(_)
                | ResponsePart::ToolInvocation { .. } => {}
            }
        }
        out
    }

    /// Consecutive markdown chunks merge into one part.
    pub fn push_part(&mut self, part: ResponsePart) {
        if let ResponsePart::Markdown(text) = &part {
            if let Some(ResponsePart::Markdown(last)) = self.parts.last_mut() {
                last.push_str(text);
                return;
            }
        }
        if let ResponsePart::TextEditGroup(group) = &part {
            if let Some(existing) = self.edit_group_mut(&group.uri) {
                existing.edit_count += group.edit_count;
                existing.done = group.done;
                return;
            }
        }
        self.parts.push(part);
    }

    pub fn complete(&mut self) {
        self.is_complete = true;
    }

    pub fn cancel(&mut self) {
        self.is_canceled = true;
        self.is_complete = true;
    }

    pub fn set_vote(&mut self, vote: Option<ChatVote>) {
        self.vote = vote;
        if vote != Some(ChatVote::Down) {
            self.vote_down_reason = None;
        }
    }

    pub fn set_vote_down_reason(&mut self, reason: Option<VoteDownReason>) {
        self.vote_down_reason = reason;
    }

    /// Returns false when the response has no edits for `uri`.
    pub fn set_edit_applied(&mut self, uri: &str, edit_count: u32) -> bool {
        match self.edit_group_mut(uri) {
            Some(group) => {
                group.applied = edit_count;
                true
            }
            None => false,
        }
    }

    pub fn set_used_context(&mut self, context: UsedContext) {
        self.used_context = Some(context);
    }

    pub fn add_content_reference(&mut self, reference: ContentReference) {
        self.content_references.push(reference);
    }

    pub fn add_code_citation(&mut self, citation: CodeCitation) {
        self.code_citations.push(citation);
    }

    pub fn set_followups(&mut self, followups: Vec<Followup>) {
        self.followups = Some(followups);
    }

    pub fn set_result(&mut self, result: ChatResult) {
        self.result = Some(result);
    }

    fn edit_group_mut(&mut self, uri: &str) -> Option<&mut TextEditGroup> {
        self.parts.iter_mut().find_map(|p| match p {
            ResponsePart::TextEditGroup(g) if g.uri == uri => Some(g),
            _ => None,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatRequestModel {
    pub id: RequestId,
    pub message: String,
    pub response: Option<ResponseId>,
}
