//! Inline-button callback tokens.
//!
//! Every inline button carries a compact `verb:key` token. The dispatcher
//! parses tokens back into [`CallbackAction`]s; anything unparseable is
//! dropped with a debug log, since stale buttons from old messages can
//! outlive the code that produced them.

use kudos_core::{PlatformId, SeqKey};

const SUBMIT_TASK: &str = "submit_task";
const REVIEW: &str = "review";
const APPROVE: &str = "approve";
const REJECT: &str = "reject";
const DEL_TASK: &str = "del_task";
const CONFIRM_DEL_TASK: &str = "confirm_del_task";
const DEL_PRODUCT: &str = "del_product";
const CONFIRM_DEL_PRODUCT: &str = "confirm_del_product";
const BUY: &str = "buy";
const GRANT: &str = "grant";
const FIX_ID: &str = "fix_id";
const CANCEL: &str = "cancel";

/// Decoded inline-button press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    /// Member picked a task to submit work for.
    SubmitTask(SeqKey),
    /// Admin opened a pending submission for review.
    ReviewSubmission(SeqKey),
    ApproveSubmission(SeqKey),
    RejectSubmission(SeqKey),
    /// Admin picked a task to delete; a confirmation step follows.
    DeleteTask(SeqKey),
    ConfirmDeleteTask(SeqKey),
    DeleteProduct(SeqKey),
    ConfirmDeleteProduct(SeqKey),
    /// Member picked a product to buy; a confirmation step follows.
    BuyProduct(SeqKey),
    /// Admin picked the member who should receive granted points.
    GrantPointsTo(PlatformId),
    /// Admin picked the member whose display id gets corrected.
    FixDisplayIdOf(PlatformId),
    Cancel,
}

impl CallbackAction {
    /// Render the token placed on an inline button.
    pub fn encode(&self) -> String {
        match self {
            Self::SubmitTask(key) => format!("{SUBMIT_TASK}:{key}"),
            Self::ReviewSubmission(key) => format!("{REVIEW}:{key}"),
            Self::ApproveSubmission(key) => format!("{APPROVE}:{key}"),
            Self::RejectSubmission(key) => format!("{REJECT}:{key}"),
            Self::DeleteTask(key) => format!("{DEL_TASK}:{key}"),
            Self::ConfirmDeleteTask(key) => format!("{CONFIRM_DEL_TASK}:{key}"),
            Self::DeleteProduct(key) => format!("{DEL_PRODUCT}:{key}"),
            Self::ConfirmDeleteProduct(key) => format!("{CONFIRM_DEL_PRODUCT}:{key}"),
            Self::BuyProduct(key) => format!("{BUY}:{key}"),
            Self::GrantPointsTo(id) => format!("{GRANT}:{id}"),
            Self::FixDisplayIdOf(id) => format!("{FIX_ID}:{id}"),
            Self::Cancel => CANCEL.to_string(),
        }
    }

    /// Parse a token received from a button press. Returns `None` for
    /// unknown verbs, missing keys, and malformed ids.
    pub fn parse(token: &str) -> Option<Self> {
        if token == CANCEL {
            return Some(Self::Cancel);
        }
        let (verb, key) = token.split_once(':')?;
        if key.is_empty() {
            return None;
        }
        match verb {
            SUBMIT_TASK => Some(Self::SubmitTask(key.to_string())),
            REVIEW => Some(Self::ReviewSubmission(key.to_string())),
            APPROVE => Some(Self::ApproveSubmission(key.to_string())),
            REJECT => Some(Self::RejectSubmission(key.to_string())),
            DEL_TASK => Some(Self::DeleteTask(key.to_string())),
            CONFIRM_DEL_TASK => Some(Self::ConfirmDeleteTask(key.to_string())),
            DEL_PRODUCT => Some(Self::DeleteProduct(key.to_string())),
            CONFIRM_DEL_PRODUCT => Some(Self::ConfirmDeleteProduct(key.to_string())),
            BUY => Some(Self::BuyProduct(key.to_string())),
            GRANT => key.parse::<PlatformId>().ok().map(Self::GrantPointsTo),
            FIX_ID => key.parse::<PlatformId>().ok().map(Self::FixDisplayIdOf),
            _ => None,
        }
    }
}
