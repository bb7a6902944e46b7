//! Operator-facing copy and command vocabulary
//!
//! Every prompt the bot sends and every keyword it matches lives here, so
//! the flow logic stays free of string literals.

/// Quick-reply label that starts a mailing from `start`
pub const NEW_MAILING: &str = "New mailing";

/// Command that resets any conversation back to `start`
pub const CANCEL_COMMAND: &str = "/cancel";

// Quick-reply labels, matched case-insensitively against typed input too
pub const YES: &str = "Yes";
pub const NO: &str = "No";
pub const SEND: &str = "Send";
pub const CANCEL: &str = "Cancel";

pub const GREETING: &str = "Hi! I am the mailing bot.";

pub const ASK_LIST: &str = "Enter the list of recipients, one per line.";

pub const ASK_MESSAGE: &str = "Enter the message to send.";

pub const NO_PREVIOUS_LIST: &str = "I have no list from a previous mailing, so it has to be entered from scratch.";

pub const KEEPING_LIST: &str = "Okay, using the same list.";

pub const UNRECOGNIZED_COMMAND: &str = "I could not recognize that command, returning to the menu.";

pub const UNRECOGNIZED_YES_NO: &str = "I could not recognize that answer, please reply 'yes' or 'no'.";

pub const UNRECOGNIZED_SEND_CANCEL: &str = "I could not recognize that answer, please reply 'send' or 'cancel'.";

pub const CANT_PARSE_LIST: &str = "I could not parse the recipient list. Please try again.";

pub const CANT_PARSE_MESSAGE: &str = "I could not parse the message. Please try again.";

pub const CONFIRM_SEND: &str = "Confirm sending the message.";

pub const SENDING: &str = "Sending the message.";

pub const MAILING_DONE: &str = "Mailing complete.";

pub const MAILING_CANCELLED: &str = "Mailing cancelled.";

pub const MAILING_FAILED: &str = "The mailing could not be started. Please try again later.";

pub const RETURN_TO_START: &str = "Returning to the start.";

/// Reuse offer, previewing the stored list
pub fn reuse_list(recipients: &[String]) -> String {
    format!(
        "The list from the previous mailing:\n{}\nDo you want to use the same list?",
        recipients.join("\n")
    )
}

/// Echo of a freshly parsed recipient list
pub fn recognized_list(recipients: &[String]) -> String {
    format!("Recognized {} recipient(s):\n{}", recipients.len(), recipients.join("\n"))
}

/// Echo of a freshly captured message body
pub fn recognized_message(body: &str) -> String {
    format!("Recognized the message:\n\n{}", body)
}

/// Per-recipient progress notice
pub fn sending_to(recipient: &str) -> String {
    format!("Sending the message to {}", recipient)
}

/// Completion notice with failures called out when there were any
pub fn mailing_summary(delivered: usize, failed: usize) -> String {
    if failed == 0 {
        MAILING_DONE.to_string()
    } else {
        format!("{} Delivered: {}, failed: {}.", MAILING_DONE, delivered, failed)
    }
}
