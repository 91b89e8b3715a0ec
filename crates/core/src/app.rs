#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};

use tokio::sync::mpsc;
use verdant_model::ModelProviderError;

use crate::conversation::{ChatRole, ChatTurn, Conversation};
use crate::image::{ImageError, encode_image};
use crate::model_client::ConversationClient;

/// The fixed instructional prompt sent along with the photo.
pub const IDENTIFY_PROMPT: &str = "You are an expert botanist. Identify \
    this plant and provide detailed care instructions. Include information \
    on watering, sunlight, soil, temperature, humidity, and potential \
    pests. Format the response clearly using markdown for headings and \
    lists.";

const NO_IMAGE_MSG: &str = "Please select an image first.";
const IDENTIFY_FAILED_MSG: &str = "Failed to analyze the image. The API \
    key might be invalid or the service is unavailable. Please try again.";
const SEND_FAILED_MSG: &str =
    "An error occurred. Please try sending your message again.";

/// The two screens of the application.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Screen {
    /// No active chat; the user is selecting a photo.
    #[default]
    Welcome,
    /// An identification succeeded and the chat is active.
    Chatting,
}

enum TaskError {
    Encoding(ImageError),
    Service(Box<dyn ModelProviderError>),
}

enum EventKind {
    IdentifyFinished {
        generation: u64,
        result: Result<(Conversation, String), TaskError>,
    },
    SendFinished {
        generation: u64,
        // The conversation handle travels with the task and comes back
        // either way: a failed turn does not invalidate it.
        result: Result<(Conversation, String), (Conversation, TaskError)>,
    },
}

/// A completion event produced by an in-flight request.
///
/// Events are opaque to the UI; feed them back via
/// [`App::handle_event`].
pub struct AppEvent(EventKind);

/// The application controller.
///
/// Owns all session state and sequences the two screens. Operations
/// are synchronous state transitions; network work runs in spawned
/// tasks that report back through the event channel returned by
/// [`App::new`]. Every event carries the generation it was spawned
/// under, so a response that arrives after a reset is dropped instead
/// of mutating a fresh session.
pub struct App {
    client: ConversationClient,
    screen: Screen,
    selected_image: Option<PathBuf>,
    transcript: Vec<ChatTurn>,
    busy: bool,
    error: Option<String>,
    conversation: Option<Conversation>,
    generation: u64,
    event_tx: mpsc::UnboundedSender<AppEvent>,
}

impl App {
    /// Creates a controller in its initial state, together with the
    /// receiving end of its event channel.
    pub fn new(
        client: ConversationClient,
    ) -> (Self, mpsc::UnboundedReceiver<AppEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let app = Self {
            client,
            screen: Screen::Welcome,
            selected_image: None,
            transcript: Vec::new(),
            busy: false,
            error: None,
            conversation: None,
            generation: 0,
            event_tx,
        };
        (app, event_rx)
    }

    /// The current screen.
    #[inline]
    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// The transcript of confirmed turns, oldest first.
    #[inline]
    pub fn transcript(&self) -> &[ChatTurn] {
        &self.transcript
    }

    /// Whether a request is outstanding.
    #[inline]
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Whether the "assistant is composing" indicator should be shown:
    /// a request is outstanding and the newest turn belongs to the
    /// user.
    #[inline]
    pub fn is_composing(&self) -> bool {
        self.busy
            && self
                .transcript
                .last()
                .is_some_and(|turn| turn.role == ChatRole::User)
    }

    /// The current user-facing error message, if any.
    #[inline]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The currently selected image, if any.
    #[inline]
    pub fn selected_image(&self) -> Option<&Path> {
        self.selected_image.as_deref()
    }

    /// Whether an identification has succeeded since the last reset.
    #[inline]
    pub fn has_conversation(&self) -> bool {
        self.conversation.is_some() || (self.busy && self.screen == Screen::Chatting)
    }

    /// Replaces the selected image and clears any error.
    ///
    /// Only reachable from the welcome screen; ignored otherwise.
    pub fn select_image(&mut self, path: PathBuf) {
        if self.screen != Screen::Welcome {
            return;
        }
        debug!("selected image: {}", path.display());
        self.selected_image = Some(path);
        self.error = None;
    }

    /// Starts an identification for the selected image.
    ///
    /// Encodes the image and opens a conversation with the fixed
    /// prompt. The transcript is cleared up front; the completion event
    /// either records the assistant's reply as the sole entry and
    /// switches to the chat screen, or surfaces an error on the
    /// welcome screen.
    pub fn identify(&mut self) {
        if self.busy || self.screen != Screen::Welcome {
            return;
        }
        let Some(path) = self.selected_image.clone() else {
            self.error = Some(NO_IMAGE_MSG.to_owned());
            return;
        };

        self.busy = true;
        self.error = None;
        self.transcript.clear();

        let client = self.client.clone();
        let generation = self.generation;
        let event_tx = self.event_tx.clone();
        tokio::spawn(async move {
            let result = async {
                let payload = encode_image(&path)
                    .await
                    .map_err(TaskError::Encoding)?;
                Conversation::open(client, payload, IDENTIFY_PROMPT)
                    .await
                    .map_err(TaskError::Service)
            }
            .await;
            event_tx
                .send(AppEvent(EventKind::IdentifyFinished {
                    generation,
                    result,
                }))
                .ok();
        });
    }

    /// Sends a follow-up question on the active conversation.
    ///
    /// A no-op if the input is empty or whitespace-only, a request is
    /// already outstanding, or no conversation exists. The user's turn
    /// is appended optimistically and rolled back if the exchange
    /// fails.
    pub fn send_followup(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() || self.busy {
            return;
        }
        let Some(mut conversation) = self.conversation.take() else {
            return;
        };

        self.transcript.push(ChatTurn::user(text));
        self.busy = true;
        self.error = None;

        let text = text.to_owned();
        let generation = self.generation;
        let event_tx = self.event_tx.clone();
        tokio::spawn(async move {
            let result = match conversation.send(&text).await {
                Ok(reply) => Ok((conversation, reply)),
                Err(err) => {
                    Err((conversation, TaskError::Service(err)))
                }
            };
            event_tx
                .send(AppEvent(EventKind::SendFinished { generation, result }))
                .ok();
        });
    }

    /// Unconditionally resets the whole session and returns to the
    /// welcome screen. An in-flight request cannot be aborted, but its
    /// eventual completion event belongs to a past generation and will
    /// be dropped.
    pub fn start_over(&mut self) {
        self.generation += 1;
        self.screen = Screen::Welcome;
        self.selected_image = None;
        self.transcript.clear();
        self.busy = false;
        self.error = None;
        self.conversation = None;
    }

    /// Applies a completion event to the session state.
    pub fn handle_event(&mut self, event: AppEvent) {
        match event.0 {
            EventKind::IdentifyFinished { generation, result } => {
                if generation != self.generation {
                    trace!("dropping a stale identify response");
                    return;
                }
                self.busy = false;
                match result {
                    Ok((conversation, reply)) => {
                        self.conversation = Some(conversation);
                        self.transcript.push(ChatTurn::assistant(reply));
                        self.screen = Screen::Chatting;
                    }
                    Err(err) => {
                        error!("identification failed: {}", err.message());
                        self.error = Some(IDENTIFY_FAILED_MSG.to_owned());
                    }
                }
            }
            EventKind::SendFinished { generation, result } => {
                if generation != self.generation {
                    trace!("dropping a stale follow-up response");
                    return;
                }
                self.busy = false;
                match result {
                    Ok((conversation, reply)) => {
                        self.conversation = Some(conversation);
                        self.transcript.push(ChatTurn::assistant(reply));
                    }
                    Err((conversation, err)) => {
                        error!("follow-up failed: {}", err.message());
                        self.conversation = Some(conversation);
                        // Compensate the optimistic append, so the
                        // transcript reflects only confirmed exchanges.
                        self.transcript.pop();
                        self.error = Some(SEND_FAILED_MSG.to_owned());
                    }
                }
            }
        }
    }
}

impl TaskError {
    fn message(&self) -> String {
        match self {
            Self::Encoding(err) => err.to_string(),
            Self::Service(err) => err.to_string(),
        }
    }
}
