//! 聊天视图模型：包装会话中的请求/响应，提供渲染键与字速统计

use std::cell::{Ref, RefCell};
use std::rc::Rc;
use std::sync::mpsc::Receiver;

use super::model::{
    ChatResult, ChatVote, CodeCitation, ContentReference, ErrorDetails, Followup, RequestId,
    ResponseId, UsedContext, VoteDownReason,
};
use super::session::{ResponseHandle, SessionEvent};
use super::words::{count_words, take_words};
use crate::kernel::emitter::{Emitter, ListenerId};
use crate::kernel::services::ports::{ChatTimingConfig, Clock};

/// Progressive rendering rate bounds, words per second.
const MIN_RENDER_RATE: f64 = 12.0;
const MAX_RENDER_RATE: f64 = 80.0;
const DEFAULT_RENDER_RATE: f64 = 8.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ItemId {
    Request(RequestId),
    Response(ResponseId),
}

/// Current item order of the owning session, shared with every item so
/// "is last" is always computed against the live list.
type ItemOrder = Rc<RefCell<Vec<ItemId>>>;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContentUpdateTimings {
    pub total_time: u64,
    pub last_update_time: u64,
    pub implied_word_load_rate: f64,
    pub last_word_count: usize,
}

impl ContentUpdateTimings {
    fn started_at(now: u64) -> Self {
        Self {
            total_time: 0,
            last_update_time: now,
            implied_word_load_rate: 0.0,
            last_word_count: 0,
        }
    }
}

/// Equal keys mean equal visible content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RenderKey {
    pub id: ResponseId,
    pub change_count: u64,
    pub is_last: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderData {
    pub last_render_time: u64,
    pub rendered_word_count: usize,
}

/// Next timing record for a tick that observed `word_count` words, or
/// `None` when the word count did not move.
pub fn advance_timings(
    timings: &ContentUpdateTimings,
    now: u64,
    word_count: usize,
    has_markdown: bool,
    config: &ChatTimingConfig,
) -> Option<ContentUpdateTimings> {
    if word_count == timings.last_word_count {
        return None;
    }

    let last_update_time = if timings.last_word_count == 0 {
        // first words: don't count the wait before them
        now
    } else {
        timings.last_update_time
    };
    let time_diff = now
        .saturating_sub(last_update_time)
        .min(config.max_update_gap_ms);
    let new_total_time = (timings.total_time + time_diff).max(config.min_total_time_ms);
    let implied_word_load_rate = word_count as f64 / (new_total_time as f64 / 1000.0);

    // Time only accrues once it already has, or once markdown has arrived.
    let total_time = if timings.total_time != 0 || has_markdown {
        new_total_time
    } else {
        timings.total_time
    };

    Some(ContentUpdateTimings {
        total_time,
        last_update_time: now,
        implied_word_load_rate,
        last_word_count: word_count,
    })
}

pub struct RequestViewModel {
    id: RequestId,
    message: String,
}

impl RequestViewModel {
    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub struct ResponseViewModel {
    model: ResponseHandle,
    order: ItemOrder,
    clock: Rc<dyn Clock>,
    config: ChatTimingConfig,
    change_count: u64,
    timings: Option<ContentUpdateTimings>,
    render_data: Option<RenderData>,
    current_rendered_height: Option<u32>,
    on_did_change: Emitter<RenderKey>,
    disposed: bool,
}

impl ResponseViewModel {
    fn new(
        model: ResponseHandle,
        order: ItemOrder,
        clock: Rc<dyn Clock>,
        config: ChatTimingConfig,
    ) -> Self {
        // A response that finished before we saw it never gets timings.
        let timings = if model.borrow().is_complete() {
            None
        } else {
            Some(ContentUpdateTimings::started_at(clock.now_ms()))
        };
        Self {
            model,
            order,
            clock,
            config,
            change_count: 0,
            timings,
            render_data: None,
            current_rendered_height: None,
            on_did_change: Emitter::new(),
            disposed: false,
        }
    }

    pub fn id(&self) -> ResponseId {
        self.model.borrow().id()
    }

    pub fn request_id(&self) -> RequestId {
        self.model.borrow().request_id()
    }

    pub fn change_count(&self) -> u64 {
        self.change_count
    }

    pub fn is_last(&self) -> bool {
        let id = ItemId::Response(self.id());
        self.order.borrow().last() == Some(&id)
    }

    pub fn render_key(&self) -> RenderKey {
        RenderKey {
            id: self.id(),
            change_count: self.change_count,
            is_last: self.is_last(),
        }
    }

    pub fn content_update_timings(&self) -> Option<&ContentUpdateTimings> {
        self.timings.as_ref()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn on_did_change<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&RenderKey) + 'static,
    {
        self.on_did_change.subscribe(listener)
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.on_did_change.unsubscribe(id)
    }

    /// Reaction to the wrapped response changing.
    pub fn on_underlying_change(&mut self) {
        if self.disposed {
            return;
        }

        if let Some(timings) = self.timings {
            let model = self.model.borrow();
            if !model.is_complete() {
                let now = self.clock.now_ms();
                let word_count = count_words(&model.to_markdown());
                match advance_timings(
                    &timings,
                    now,
                    word_count,
                    model.has_markdown_content(),
                    &self.config,
                ) {
                    Some(next) => {
                        tracing::trace!(
                            id = %model.id(),
                            word_count,
                            total_time = next.total_time,
                            rate = next.implied_word_load_rate,
                            "response timings updated"
                        );
                        drop(model);
                        self.timings = Some(next);
                    }
                    None => {
                        tracing::trace!(id = %model.id(), "response update without new words");
                    }
                }
            }
        }

        self.bump();
    }

    pub fn set_vote(&mut self, vote: Option<ChatVote>) {
        self.model.borrow_mut().set_vote(vote);
        self.bump();
    }

    pub fn set_vote_down_reason(&mut self, reason: Option<VoteDownReason>) {
        self.model.borrow_mut().set_vote_down_reason(reason);
        self.bump();
    }

    /// Returns whether the response had edits for `uri`; the render key
    /// moves either way.
    pub fn set_edit_applied(&mut self, uri: &str, edit_count: u32) -> bool {
        let applied = self.model.borrow_mut().set_edit_applied(uri, edit_count);
        self.bump();
        applied
    }

    fn bump(&mut self) {
        self.change_count += 1;
        if self.disposed {
            return;
        }
        let key = self.render_key();
        self.on_did_change.fire(&key);
    }

    pub fn is_complete(&self) -> bool {
        self.model.borrow().is_complete()
    }

    pub fn is_canceled(&self) -> bool {
        self.model.borrow().is_canceled()
    }

    pub fn vote(&self) -> Option<ChatVote> {
        self.model.borrow().vote()
    }

    pub fn vote_down_reason(&self) -> Option<VoteDownReason> {
        self.model.borrow().vote_down_reason()
    }

    pub fn used_context(&self) -> Option<Ref<'_, UsedContext>> {
        Ref::filter_map(self.model.borrow(), |m| m.used_context()).ok()
    }

    pub fn content_references(&self) -> Ref<'_, [ContentReference]> {
        Ref::map(self.model.borrow(), |m| m.content_references())
    }

    pub fn code_citations(&self) -> Ref<'_, [CodeCitation]> {
        Ref::map(self.model.borrow(), |m| m.code_citations())
    }

    pub fn progress_messages(&self) -> Vec<String> {
        self.model
            .borrow()
            .progress_messages()
            .map(str::to_string)
            .collect()
    }

    pub fn reply_followups(&self) -> Option<Ref<'_, [Followup]>> {
        Ref::filter_map(self.model.borrow(), |m| m.followups()).ok()
    }

    pub fn result(&self) -> Option<Ref<'_, ChatResult>> {
        Ref::filter_map(self.model.borrow(), |m| m.result()).ok()
    }

    pub fn error_details(&self) -> Option<Ref<'_, ErrorDetails>> {
        Ref::filter_map(self.model.borrow(), |m| m.error_details()).ok()
    }

    pub fn markdown(&self) -> String {
        self.model.borrow().to_markdown()
    }

    pub fn current_rendered_height(&self) -> Option<u32> {
        self.current_rendered_height
    }

    pub fn set_current_rendered_height(&mut self, height: Option<u32>) {
        self.current_rendered_height = height;
    }

    pub fn render_data(&self) -> Option<RenderData> {
        self.render_data
    }

    pub fn record_render(&mut self, now: u64, rendered_word_count: usize) {
        self.render_data = Some(RenderData {
            last_render_time: now,
            rendered_word_count,
        });
    }

    /// Words per second the renderer should reveal at.
    pub fn progressive_render_rate(&self) -> f64 {
        if self.is_complete() {
            return MAX_RENDER_RATE;
        }
        match self.timings {
            Some(t) if t.implied_word_load_rate > 0.0 => t
                .implied_word_load_rate
                .clamp(MIN_RENDER_RATE, MAX_RENDER_RATE),
            _ => DEFAULT_RENDER_RATE,
        }
    }

    /// How many words a typewriter-style renderer should show at `now`.
    pub fn words_to_render(&self, now: u64) -> usize {
        let total = count_words(&self.markdown());
        if self.is_complete() {
            return total;
        }
        let Some(data) = self.render_data else {
            return total.min(1);
        };
        let elapsed_secs = now.saturating_sub(data.last_render_time) as f64 / 1000.0;
        let more = (elapsed_secs * self.progressive_render_rate()).floor() as usize;
        (data.rendered_word_count + more).min(total)
    }

    /// The part of the markdown a progressive renderer shows at `now`.
    pub fn visible_markdown(&self, now: u64) -> String {
        let markdown = self.markdown();
        let n = self.words_to_render(now);
        take_words(&markdown, n).text.to_string()
    }

    /// Safe to call more than once.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.on_did_change.dispose();
    }
}

pub enum ChatItemViewModel {
    Request(RequestViewModel),
    Response(ResponseViewModel),
}

impl ChatItemViewModel {
    pub fn id(&self) -> ItemId {
        match self {
            ChatItemViewModel::Request(r) => ItemId::Request(r.id()),
            ChatItemViewModel::Response(r) => ItemId::Response(r.id()),
        }
    }

    pub fn as_response(&self) -> Option<&ResponseViewModel> {
        match self {
            ChatItemViewModel::Response(r) => Some(r),
            ChatItemViewModel::Request(_) => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatViewModelChange {
    AddRequest(RequestId),
    AddResponse(ResponseId),
    ResponseChanged(ResponseId),
    RemoveRequest(RequestId),
}

/// Item list of one chat session, kept in step with the session's events.
pub struct ChatViewModel {
    items: Vec<ChatItemViewModel>,
    order: ItemOrder,
    events: Receiver<SessionEvent>,
    clock: Rc<dyn Clock>,
    config: ChatTimingConfig,
    on_did_change: Emitter<ChatViewModelChange>,
}

impl ChatViewModel {
    pub fn new(
        events: Receiver<SessionEvent>,
        clock: Rc<dyn Clock>,
        config: ChatTimingConfig,
    ) -> Self {
        Self {
            items: Vec::new(),
            order: Rc::new(RefCell::new(Vec::new())),
            events,
            clock,
            config,
            on_did_change: Emitter::new(),
        }
    }

    pub fn items(&self) -> &[ChatItemViewModel] {
        &self.items
    }

    pub fn response(&self, id: ResponseId) -> Option<&ResponseViewModel> {
        self.items.iter().find_map(|item| match item {
            ChatItemViewModel::Response(r) if r.id() == id => Some(r),
            _ => None,
        })
    }

    pub fn response_mut(&mut self, id: ResponseId) -> Option<&mut ResponseViewModel> {
        self.items.iter_mut().find_map(|item| match item {
            ChatItemViewModel::Response(r) if r.id() == id => Some(r),
            _ => None,
        })
    }

    pub fn set_timing_config(&mut self, config: ChatTimingConfig) {
        self.config = config;
    }

    pub fn on_did_change<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&ChatViewModelChange) + 'static,
    {
        self.on_did_change.subscribe(listener)
    }

    /// Applies every queued session event in order. Returns whether any
    /// item changed.
    pub fn pump(&mut self) -> bool {
        let mut changed = false;
        while let Ok(event) = self.events.try_recv() {
            changed |= self.handle_event(event);
        }
        changed
    }

    fn handle_event(&mut self, event: SessionEvent) -> bool {
        let change = match event {
            SessionEvent::AddRequest { id, message } => {
                self.items
                    .push(ChatItemViewModel::Request(RequestViewModel { id, message }));
                ChatViewModelChange::AddRequest(id)
            }
            SessionEvent::AddResponse { response } => {
                let vm = ResponseViewModel::new(
                    response,
                    Rc::clone(&self.order),
                    Rc::clone(&self.clock),
                    self.config,
                );
                let id = vm.id();
                self.items.push(ChatItemViewModel::Response(vm));
                ChatViewModelChange::AddResponse(id)
            }
            SessionEvent::ResponseChanged { id } => {
                let Some(vm) = self.response_mut(id) else {
                    tracing::debug!(%id, "change for unknown response");
                    return false;
                };
                vm.on_underlying_change();
                ChatViewModelChange::ResponseChanged(id)
            }
            SessionEvent::RemoveRequest { id, response } => {
                let before = self.items.len();
                let mut removed = Vec::new();
                let mut kept = Vec::with_capacity(self.items.len());
                for item in self.items.drain(..) {
                    let hit = match item.id() {
                        ItemId::Request(r) => r == id,
                        ItemId::Response(r) => Some(r) == response,
                    };
                    if hit {
                        removed.push(item);
                    } else {
                        kept.push(item);
                    }
                }
                self.items = kept;
                for item in &mut removed {
                    if let ChatItemViewModel::Response(vm) = item {
                        vm.dispose();
                    }
                }
                if self.items.len() == before {
                    return false;
                }
                ChatViewModelChange::RemoveRequest(id)
            }
        };

        self.sync_order();
        self.on_did_change.fire(&change);
        true
    }

    fn sync_order(&mut self) {
        let mut order = self.order.borrow_mut();
        order.clear();
        order.extend(self.items.iter().map(ChatItemViewModel::id));
    }

    pub fn dispose(&mut self) {
        for item in &mut self.items {
            if let ChatItemViewModel::Response(vm) = item {
                vm.dispose();
            }
        }
        self.on_did_change.dispose();
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/kernel/chat/view_model.rs"]
mod tests;
