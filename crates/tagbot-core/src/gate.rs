//! Authorization and locking decisions for tag and lock requests.
//!
//! Evaluated once per submission, in this order:
//!
//! 1. membership: requester must be a volunteer, the submission author, or a
//!    moderator; anyone else is pointed at the escalation contact;
//! 2. lock: a locked submission refuses every change;
//! 3. removal restriction: only the author or a moderator may remove tags;
//!    for anyone else removals are dropped and a notice is added to the reply.

use crate::models::Submission;
use crate::snapshot::BotConfig;
use crate::tags::TagRequest;

/// Who is asking, about which submission, under which configuration.
#[derive(Debug, Clone, Copy)]
pub struct AuthorizationContext<'a> {
    pub requester: &'a str,
    pub submission: &'a Submission,
    pub snapshot: &'a BotConfig,
}

impl<'a> AuthorizationContext<'a> {
    #[must_use]
    pub const fn new(requester: &'a str, submission: &'a Submission, snapshot: &'a BotConfig) -> Self {
        Self {
            requester,
            submission,
            snapshot,
        }
    }

    #[must_use]
    pub fn is_author(&self) -> bool {
        self.requester.eq_ignore_ascii_case(&self.submission.author)
    }

    #[must_use]
    pub fn is_author_or_moderator(&self) -> bool {
        self.is_author() || self.snapshot.is_moderator(self.requester)
    }

    /// Member of `volunteers ∪ {author} ∪ moderators`.
    #[must_use]
    pub fn is_member(&self) -> bool {
        self.is_author_or_moderator() || self.snapshot.is_volunteer(self.requester)
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.snapshot.is_locked(self.submission)
    }

    /// Apply the gate to a parsed request.
    #[must_use]
    pub fn evaluate(&self, request: TagRequest) -> GateDecision {
        if !self.is_member() {
            tracing::debug!(requester = self.requester, "unauthorized tagging attempt");
            return GateDecision::NotMember {
                contact: self.snapshot.escalation_contact.clone(),
            };
        }
        if self.is_locked() {
            tracing::debug!(
                permalink = self.submission.permalink.as_str(),
                "submission is locked"
            );
            return GateDecision::Locked;
        }

        let mut request = request;
        let removals_dropped = !self.is_author_or_moderator() && !request.removed.is_empty();
        if removals_dropped {
            tracing::debug!(
                requester = self.requester,
                dropped = request.removed.len(),
                "removals dropped for non-author"
            );
            request.removed.clear();
        }
        GateDecision::Proceed(Approved {
            request,
            removals_dropped,
        })
    }
}

/// What the gate allows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Requester may not tag at all.
    NotMember { contact: String },
    /// Submission no longer accepts changes.
    Locked,
    Proceed(Approved),
}

/// The filtered request that may be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Approved {
    pub request: TagRequest,
    /// Removals were requested by someone other than the author or a moderator.
    pub removals_dropped: bool,
}
