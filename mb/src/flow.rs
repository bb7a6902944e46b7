//! Conversation flow: the per-operator state machine
//!
//! `step` is a pure, total function from (stored record, inbound text) to
//! the next record, the replies to emit, and optionally a mailing request.
//! Running the mailing is the caller's job; nothing here touches the store
//! or the network. Routing is an explicit match from stage to handler.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::prompts;

/// Attribute key holding the recipient list (JSON array of strings)
pub const ATTR_RECIPIENTS: &str = "list_of_users";

/// Attribute key holding the message body (JSON string)
pub const ATTR_MESSAGE: &str = "message";

/// Conversation stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Start,
    ConfirmReuseList,
    CollectList,
    CollectMessage,
    ConfirmSend,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::ConfirmReuseList => write!(f, "confirm_reuse_list"),
            Self::CollectList => write!(f, "collect_list"),
            Self::CollectMessage => write!(f, "collect_message"),
            Self::ConfirmSend => write!(f, "confirm_send"),
        }
    }
}

/// Stored per-conversation record: current stage plus collected attributes.
///
/// Attributes only ever hold keys for stages already passed through; an
/// absent key means "not yet collected".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub state: Stage,
    pub attributes: BTreeMap<String, Value>,
}

impl Conversation {
    /// Fresh record: `start` with nothing collected.
    pub fn initial() -> Self {
        Self {
            state: Stage::Start,
            attributes: BTreeMap::new(),
        }
    }

    /// The stored recipient list. Empty or malformed counts as absent.
    pub fn recipients(&self) -> Option<Vec<String>> {
        let list: Vec<String> = self
            .attributes
            .get(ATTR_RECIPIENTS)?
            .as_array()?
            .iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect();
        if list.is_empty() { None } else { Some(list) }
    }

    /// The stored message body, if collected.
    pub fn message_body(&self) -> Option<String> {
        self.attributes.get(ATTR_MESSAGE)?.as_str().map(String::from)
    }

    fn set_recipients(&mut self, recipients: &[String]) {
        self.attributes
            .insert(ATTR_RECIPIENTS.to_string(), Value::from(recipients.to_vec()));
    }

    fn set_message_body(&mut self, body: &str) {
        self.attributes.insert(ATTR_MESSAGE.to_string(), Value::from(body));
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::initial()
    }
}

/// Outbound prompt: text plus optional suggested quick replies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub options: Vec<String>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            options: Vec::new(),
        }
    }

    pub fn with_options(text: impl Into<String>, options: &[&str]) -> Self {
        Self {
            text: text.into(),
            options: options.iter().map(|o| o.to_string()).collect(),
        }
    }
}

/// Request to fan a message out to a recipient list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailingRequest {
    pub recipients: Vec<String>,
    pub body: String,
}

/// Result of applying one inbound event to a record
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// The record to persist before any reply is emitted
    pub next: Conversation,
    /// Prompts to send back to the operator, in order
    pub replies: Vec<Reply>,
    /// Set on the one side-effecting transition (`confirm_send` -> send)
    pub mailing: Option<MailingRequest>,
}

impl Step {
    fn stay(current: &Conversation, replies: Vec<Reply>) -> Self {
        Self {
            next: current.clone(),
            replies,
            mailing: None,
        }
    }
}

/// The greeting sent on entry to `start`
pub fn greeting() -> Reply {
    Reply::with_options(prompts::GREETING, &[prompts::NEW_MAILING])
}

/// Apply one inbound event.
///
/// `text` is `None` when the event carried no usable text (non-text payload,
/// or the transport could not resolve the sender); that always takes the
/// reset route. `/cancel` resets from any stage.
pub fn step(current: &Conversation, text: Option<&str>) -> Step {
    let Some(text) = text else {
        return reset();
    };
    if matches(text, prompts::CANCEL_COMMAND) {
        return reset();
    }

    match current.state {
        Stage::Start => on_start(current, text),
        Stage::ConfirmReuseList => on_confirm_reuse_list(current, text),
        Stage::CollectList => on_collect_list(current, text),
        Stage::CollectMessage => on_collect_message(current, text),
        Stage::ConfirmSend => on_confirm_send(current, text),
    }
}

/// Reset route: initial record, back-to-start notice, greeting re-emitted
fn reset() -> Step {
    Step {
        next: Conversation::initial(),
        replies: vec![Reply::text(prompts::RETURN_TO_START), greeting()],
        mailing: None,
    }
}

/// Case-insensitive exact keyword match
fn matches(input: &str, keyword: &str) -> bool {
    input.trim().eq_ignore_ascii_case(keyword)
}

fn on_start(current: &Conversation, text: &str) -> Step {
    if !matches(text, prompts::NEW_MAILING) {
        return Step::stay(
            current,
            vec![Reply::text(prompts::UNRECOGNIZED_COMMAND), greeting()],
        );
    }

    match current.recipients() {
        Some(list) => Step {
            next: Conversation {
                state: Stage::ConfirmReuseList,
                attributes: current.attributes.clone(),
            },
            replies: vec![Reply::with_options(
                prompts::reuse_list(&list),
                &[prompts::YES, prompts::NO],
            )],
            mailing: None,
        },
        None => Step {
            next: Conversation {
                state: Stage::CollectList,
                attributes: current.attributes.clone(),
            },
            replies: vec![
                Reply::text(prompts::NO_PREVIOUS_LIST),
                Reply::text(prompts::ASK_LIST),
            ],
            mailing: None,
        },
    }
}

fn on_confirm_reuse_list(current: &Conversation, text: &str) -> Step {
    if matches(text, prompts::YES) {
        Step {
            next: Conversation {
                state: Stage::CollectMessage,
                attributes: current.attributes.clone(),
            },
            replies: vec![Reply::text(prompts::KEEPING_LIST), Reply::text(prompts::ASK_MESSAGE)],
            mailing: None,
        }
    } else if matches(text, prompts::NO) {
        // The old list stays in the attributes until a new one replaces it
        Step {
            next: Conversation {
                state: Stage::CollectList,
                attributes: current.attributes.clone(),
            },
            replies: vec![Reply::text(prompts::ASK_LIST)],
            mailing: None,
        }
    } else {
        Step::stay(current, vec![Reply::text(prompts::UNRECOGNIZED_YES_NO)])
    }
}

fn on_collect_list(current: &Conversation, text: &str) -> Step {
    let recipients = parse_recipients(text);
    if recipients.is_empty() {
        return Step::stay(current, vec![Reply::text(prompts::CANT_PARSE_LIST)]);
    }

    let mut next = Conversation {
        state: Stage::CollectMessage,
        attributes: current.attributes.clone(),
    };
    next.set_recipients(&recipients);

    Step {
        next,
        replies: vec![
            Reply::text(prompts::recognized_list(&recipients)),
            Reply::text(prompts::ASK_MESSAGE),
        ],
        mailing: None,
    }
}

fn on_collect_message(current: &Conversation, text: &str) -> Step {
    if text.trim().is_empty() {
        return Step::stay(current, vec![Reply::text(prompts::CANT_PARSE_MESSAGE)]);
    }

    let mut next = Conversation {
        state: Stage::ConfirmSend,
        attributes: current.attributes.clone(),
    };
    next.set_message_body(text);

    Step {
        next,
        replies: vec![
            Reply::text(prompts::recognized_message(text)),
            Reply::with_options(prompts::CONFIRM_SEND, &[prompts::SEND, prompts::CANCEL]),
        ],
        mailing: None,
    }
}

fn on_confirm_send(current: &Conversation, text: &str) -> Step {
    if matches(text, prompts::SEND) {
        // Both attributes are guaranteed by the path into this stage; a
        // record that lost them anyway takes the reset route
        let (Some(recipients), Some(body)) = (current.recipients(), current.message_body()) else {
            return reset();
        };

        Step {
            next: Conversation {
                state: Stage::Start,
                attributes: current.attributes.clone(),
            },
            replies: vec![Reply::text(prompts::SENDING)],
            mailing: Some(MailingRequest { recipients, body }),
        }
    } else if matches(text, prompts::CANCEL) {
        Step {
            next: Conversation {
                state: Stage::Start,
                attributes: current.attributes.clone(),
            },
            replies: vec![Reply::text(prompts::MAILING_CANCELLED)],
            mailing: None,
        }
    } else {
        Step::stay(current, vec![Reply::text(prompts::UNRECOGNIZED_SEND_CANCEL)])
    }
}

/// Split inbound text into recipient identifiers: one per line, trimmed,
/// blank lines dropped, order and duplicates preserved.
pub fn parse_recipients(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}
