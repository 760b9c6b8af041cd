use std::rc::Rc;

use super::chat::{ChatSessionModel, ChatViewModel, ResponseId, ResponseViewModel};
use super::coverage::{CoverageTreeState, TestCoverage};
use super::services::ports::{Clock, Settings, SystemClock};
use super::{Action, Effect};

pub struct DispatchResult {
    pub effects: Vec<Effect>,
    pub state_changed: bool,
}

impl DispatchResult {
    fn changed(state_changed: bool) -> Self {
        Self {
            effects: Vec::new(),
            state_changed,
        }
    }
}

pub struct Store {
    coverage: TestCoverage,
    coverage_tree: CoverageTreeState,
    chat_session: ChatSessionModel,
    chat: ChatViewModel,
    settings: Settings,
}

impl Store {
    pub fn new(settings: Settings) -> Self {
        Self::with_clock(settings, Rc::new(SystemClock::new()))
    }

    pub fn with_clock(settings: Settings, clock: Rc<dyn Clock>) -> Self {
        let (chat_session, events) = ChatSessionModel::new();
        let chat = ChatViewModel::new(events, clock, settings.chat);
        Self {
            coverage: TestCoverage::new(),
            coverage_tree: CoverageTreeState::new(settings.coverage.sort_order),
            chat_session,
            chat,
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn coverage(&self) -> &TestCoverage {
        &self.coverage
    }

    pub fn coverage_tree(&self) -> &CoverageTreeState {
        &self.coverage_tree
    }

    pub fn chat_session(&self) -> &ChatSessionModel {
        &self.chat_session
    }

    /// Direct session access for hosts that stream into it; follow up with
    /// `Action::ChatSync`.
    pub fn chat_session_mut(&mut self) -> &mut ChatSessionModel {
        &mut self.chat_session
    }

    pub fn chat(&self) -> &ChatViewModel {
        &self.chat
    }

    pub fn chat_mut(&mut self) -> &mut ChatViewModel {
        &mut self.chat
    }

    pub fn dispatch(&mut self, action: Action) -> DispatchResult {
        match action {
            Action::CoverageReset { files } => {
                tracing::debug!(files = files.len(), "coverage reset");
                self.coverage = TestCoverage::from_files(files);
                DispatchResult::changed(self.coverage_tree.set_input(&self.coverage))
            }
            Action::CoverageAddFile(file) => {
                let chain = self.coverage.append(file);
                DispatchResult::changed(self.coverage_tree.nodes_added(&self.coverage, &chain))
            }
            Action::CoverageExpand { key } => {
                let (state_changed, effects) = self.coverage_tree.expand(key);
                DispatchResult {
                    effects,
                    state_changed,
                }
            }
            Action::CoverageCollapse { key } => {
                DispatchResult::changed(self.coverage_tree.collapse(key))
            }
            Action::CoverageToggle { key } => {
                let (state_changed, effects) = self.coverage_tree.toggle(key);
                DispatchResult {
                    effects,
                    state_changed,
                }
            }
            Action::CoverageDetailsLoaded {
                path,
                test,
                details,
            } => DispatchResult::changed(self.coverage_tree.details_loaded(
                &path,
                test.as_deref(),
                &details,
            )),
            Action::CoverageSetSortOrder(order) => {
                if !self.coverage_tree.set_sort_order(order) {
                    return DispatchResult::changed(false);
                }
                self.settings.coverage.sort_order = order;
                DispatchResult {
                    effects: vec![Effect::SaveSettings(self.settings.clone())],
                    state_changed: true,
                }
            }
            Action::CoverageSetFilter(filter) => {
                DispatchResult::changed(self.coverage_tree.set_filter(&self.coverage, filter))
            }
            Action::ChatAddRequest { message } => {
                self.chat_session.add_request(message);
                DispatchResult::changed(self.chat.pump())
            }
            Action::ChatAddResponse { request } => {
                self.chat_session.add_response(request);
                DispatchResult::changed(self.chat.pump())
            }
            Action::ChatAppendMarkdown { response, text } => {
                self.chat_session.append_markdown(response, &text);
                DispatchResult::changed(self.chat.pump())
            }
            Action::ChatPushPart { response, part } => {
                self.chat_session.push_part(response, part);
                DispatchResult::changed(self.chat.pump())
            }
            Action::ChatCompleteResponse { response } => {
                self.chat_session.complete_response(response);
                DispatchResult::changed(self.chat.pump())
            }
            Action::ChatCancelResponse { response } => {
                self.chat_session.cancel_response(response);
                DispatchResult::changed(self.chat.pump())
            }
            Action::ChatRemoveRequest { request } => {
                self.chat_session.remove_request(request);
                DispatchResult::changed(self.chat.pump())
            }
            Action::ChatSync => DispatchResult::changed(self.chat.pump()),
            Action::ChatVote { response, vote } => {
                self.with_response(response, |r| r.set_vote(vote))
            }
            Action::ChatVoteDownReason { response, reason } => {
                self.with_response(response, |r| r.set_vote_down_reason(reason))
            }
            Action::ChatEditApplied {
                response,
                uri,
                edit_count,
            } => self.with_response(response, |r| {
                r.set_edit_applied(&uri, edit_count);
            }),
            Action::SettingsChanged(settings) => {
                if settings == self.settings {
                    return DispatchResult::changed(false);
                }
                self.coverage_tree
                    .set_sort_order(settings.coverage.sort_order);
                self.chat.set_timing_config(settings.chat);
                self.settings = settings;
                DispatchResult::changed(true)
            }
        }
    }

    fn with_response<F>(&mut self, id: ResponseId, f: F) -> DispatchResult
    where
        F: FnOnce(&mut ResponseViewModel),
    {
        // pending session events first so the response is known
        self.chat.pump();
        match self.chat.response_mut(id) {
            Some(response) => {
                f(response);
                DispatchResult::changed(true)
            }
            None => {
                tracing::debug!(%id, "action for unknown response");
                DispatchResult::changed(false)
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/store.rs"]
mod tests;
