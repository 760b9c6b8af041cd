//! 会话模型：持有请求/响应，并通过通道按顺序发布变更事件

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender};

use super::model::{ChatRequestModel, ChatResponseModel, RequestId, ResponseId, ResponsePart};

pub type ResponseHandle = Rc<RefCell<ChatResponseModel>>;

#[derive(Debug)]
pub enum SessionEvent {
    AddRequest {
        id: RequestId,
        message: String,
    },
    AddResponse {
        response: ResponseHandle,
    },
    ResponseChanged {
        id: ResponseId,
    },
    RemoveRequest {
        id: RequestId,
        response: Option<ResponseId>,
    },
}

pub struct ChatSessionModel {
    requests: Vec<ChatRequestModel>,
    responses: Vec<ResponseHandle>,
    next_id: u64,
    tx: Sender<SessionEvent>,
}

impl ChatSessionModel {
    /// The receiver delivers events in mutation order.
    pub fn new() -> (Self, Receiver<SessionEvent>) {
        let (tx, rx) = mpsc::channel();
        (
            Self {
                requests: Vec::new(),
                responses: Vec::new(),
                next_id: 1,
                tx,
            },
            rx,
        )
    }

    pub fn requests(&self) -> &[ChatRequestModel] {
        &self.requests
    }

    pub fn response(&self, id: ResponseId) -> Option<ResponseHandle> {
        self.responses
            .iter()
            .find(|r| r.borrow().id() == id)
            .cloned()
    }

    pub fn add_request(&mut self, message: impl Into<String>) -> RequestId {
        let id = RequestId(self.alloc_id());
        let message = message.into();
        self.requests.push(ChatRequestModel {
            id,
            message: message.clone(),
            response: None,
        });
        self.emit(SessionEvent::AddRequest { id, message });
        id
    }

    /// Starts a streaming response for `request`.
    pub fn add_response(&mut self, request: RequestId) -> Option<ResponseId> {
        self.insert_response(request, Vec::new(), false)
    }

    /// Adds a response that finished before anyone observed it, e.g. one
    /// restored from history.
    pub fn add_completed_response(
        &mut self,
        request: RequestId,
        parts: Vec<ResponsePart>,
    ) -> Option<ResponseId> {
        self.insert_response(request, parts, true)
    }

    fn insert_response(
        &mut self,
        request: RequestId,
        parts: Vec<ResponsePart>,
        complete: bool,
    ) -> Option<ResponseId> {
        let idx = self.requests.iter().position(|r| r.id == request)?;
        if self.requests[idx].response.is_some() {
            tracing::warn!(%request, "request already has a response");
            return None;
        }
        let id = ResponseId(self.alloc_id());
        let mut model = ChatResponseModel::new(id, request);
        for part in parts {
            model.push_part(part);
        }
        if complete {
            model.complete();
        }
        let handle = Rc::new(RefCell::new(model));
        self.requests[idx].response = Some(id);
        self.responses.push(Rc::clone(&handle));
        self.emit(SessionEvent::AddResponse { response: handle });
        Some(id)
    }

    /// Mutates a response and announces the change. Returns false for an
    /// unknown id.
    pub fn update_response<F>(&mut self, id: ResponseId, f: F) -> bool
    where
        F: FnOnce(&mut ChatResponseModel),
    {
        let Some(handle) = self.response(id) else {
            return false;
        };
        f(&mut *handle.borrow_mut());
        self.emit(SessionEvent::ResponseChanged { id });
        true
    }

    pub fn append_markdown(&mut self, id: ResponseId, text: &str) -> bool {
        self.update_response(id, |r| r.push_part(ResponsePart::Markdown(text.to_string())))
    }

    pub fn push_part(&mut self, id: ResponseId, part: ResponsePart) -> bool {
        self.update_response(id, |r| r.push_part(part))
    }

    pub fn complete_response(&mut self, id: ResponseId) -> bool {
        self.update_response(id, ChatResponseModel::complete)
    }

    pub fn cancel_response(&mut self, id: ResponseId) -> bool {
        self.update_response(id, ChatResponseModel::cancel)
    }

    pub fn remove_request(&mut self, id: RequestId) -> bool {
        let Some(idx) = self.requests.iter().position(|r| r.id == id) else {
            return false;
        };
        let request = self.requests.remove(idx);
        if let Some(response) = request.response {
            self.responses.retain(|r| r.borrow().id() != response);
        }
        self.emit(SessionEvent::RemoveRequest {
            id,
            response: request.response,
        });
        true
    }

    fn alloc_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn emit(&self, event: SessionEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("chat session has no observer");
        }
    }
}
