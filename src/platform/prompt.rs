//! Asynchronous yes/no/ack prompts
//!
//! The game never blocks on a dialog. It queues one [`PromptRequest`] at a
//! time and hands out a ticket; the host shows the dialog, awaits the answer
//! and resolves the ticket. Stale tickets are ignored, so a late answer can
//! never resolve a newer prompt.

use std::future::Future;
use std::pin::Pin;

/// Boxed, single-threaded future returned by a prompt service
pub type PromptFuture<T> = Pin<Box<dyn Future<Output = T>>>;

/// A dialog the game wants shown
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptRequest {
    /// Informational message, resolved by acknowledgment
    Alert { title: String, message: String },
    /// Two-button question
    Confirm {
        title: String,
        message: String,
        ok_label: String,
        cancel_label: String,
    },
}

impl PromptRequest {
    pub fn alert(title: impl Into<String>, message: impl Into<String>) -> Self {
        PromptRequest::Alert {
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn confirm(
        title: impl Into<String>,
        message: impl Into<String>,
        ok_label: impl Into<String>,
        cancel_label: impl Into<String>,
    ) -> Self {
        PromptRequest::Confirm {
            title: title.into(),
            message: message.into(),
            ok_label: ok_label.into(),
            cancel_label: cancel_label.into(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            PromptRequest::Alert { message, .. } | PromptRequest::Confirm { message, .. } => {
                message
            }
        }
    }
}

/// Answer to a [`PromptRequest`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptResponse {
    Ack,
    Confirmed(bool),
}

impl PromptResponse {
    /// True for an acknowledgment or a positive confirmation
    pub fn accepted(self) -> bool {
        matches!(self, PromptResponse::Ack | PromptResponse::Confirmed(true))
    }
}

/// Identifies one outstanding prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PromptTicket(pub u32);

/// External UI collaborator that shows dialogs
pub trait PromptService {
    fn alert(&self, message: &str, title: &str) -> PromptFuture<()>;
    fn confirm(
        &self,
        message: &str,
        title: &str,
        ok_label: &str,
        cancel_label: &str,
    ) -> PromptFuture<bool>;

    /// Show any request and map the answer to a [`PromptResponse`]
    fn show(&self, request: &PromptRequest) -> PromptFuture<PromptResponse> {
        match request {
            PromptRequest::Alert { title, message } => {
                let fut = self.alert(message, title);
                Box::pin(async move {
                    fut.await;
                    PromptResponse::Ack
                })
            }
            PromptRequest::Confirm {
                title,
                message,
                ok_label,
                cancel_label,
            } => {
                let fut = self.confirm(message, title, ok_label, cancel_label);
                Box::pin(async move { PromptResponse::Confirmed(fut.await) })
            }
        }
    }
}

/// Prompt service that answers immediately with fixed replies
///
/// Used by the native stub and tests. Every request is recorded.
#[derive(Debug, Default)]
pub struct ScriptedPrompts {
    /// Answer given to every confirm
    pub confirm_answer: bool,
    shown: std::cell::RefCell<Vec<String>>,
}

impl ScriptedPrompts {
    pub fn new(confirm_answer: bool) -> Self {
        Self {
            confirm_answer,
            shown: std::cell::RefCell::new(Vec::new()),
        }
    }

    /// Messages shown so far, oldest first
    pub fn shown(&self) -> Vec<String> {
        self.shown.borrow().clone()
    }
}

impl PromptService for ScriptedPrompts {
    fn alert(&self, message: &str, _title: &str) -> PromptFuture<()> {
        self.shown.borrow_mut().push(message.to_string());
        Box::pin(std::future::ready(()))
    }

    fn confirm(
        &self,
        message: &str,
        _title: &str,
        _ok_label: &str,
        _cancel_label: &str,
    ) -> PromptFuture<bool> {
        self.shown.borrow_mut().push(message.to_string());
        Box::pin(std::future::ready(self.confirm_answer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::task::{Context, Poll, Waker};

    fn poll_ready<T>(mut fut: PromptFuture<T>) -> T {
        let mut cx = Context::from_waker(Waker::noop());
        match fut.as_mut().poll(&mut cx) {
            Poll::Ready(v) => v,
            Poll::Pending => panic!("scripted prompt should resolve immediately"),
        }
    }

    #[test]
    fn test_show_maps_responses() {
        let prompts = ScriptedPrompts::new(false);
        let alert = PromptRequest::alert("Round", "Lap complete");
        assert_eq!(poll_ready(prompts.show(&alert)), PromptResponse::Ack);

        let confirm = PromptRequest::confirm("Exit", "Leave the game?", "Yes", "No");
        assert_eq!(
            poll_ready(prompts.show(&confirm)),
            PromptResponse::Confirmed(false)
        );
        assert_eq!(prompts.shown(), vec!["Lap complete", "Leave the game?"]);
    }

    #[test]
    fn test_accepted() {
        assert!(PromptResponse::Ack.accepted());
        assert!(PromptResponse::Confirmed(true).accepted());
        assert!(!PromptResponse::Confirmed(false).accepted());
    }
}
