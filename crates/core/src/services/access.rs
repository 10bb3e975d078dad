//! Access control: who may perform which operation.
//!
//! Every mutation in the service layer asks an [`AccessControl`] before
//! touching storage. The default [`PolicyTable`] maps each [`Operation`] to a
//! [`Rule`]; services supply the owning user id for `Owner` rules once the
//! resource is loaded.

use std::collections::HashMap;

use pitchboard_common::{AppError, AppResult};

/// The identity attached to a request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Caller {
    /// No (valid) credentials were presented.
    #[default]
    Anonymous,
    /// An authenticated user, identified by the identity provider's opaque id.
    User(String),
}

impl Caller {
    /// Authenticated user id, if any.
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::Anonymous => None,
            Self::User(id) => Some(id),
        }
    }

    /// Whether the caller is authenticated.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::User(_))
    }
}

/// Operations subject to access control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ReadProject,
    CreateProject,
    UpdateProject,
    DeleteProject,
    ReadImage,
    CreateImage,
    UpdateImage,
    DeleteImage,
    Vote,
    Unvote,
    ReadCriteria,
    CreateRating,
    ReadOwnRating,
    UpdateRating,
    DeleteRating,
    ReadComment,
    CreateComment,
    UpdateComment,
    DeleteComment,
}

impl Operation {
    /// Every operation, in declaration order.
    pub const ALL: [Self; 19] = [
        Self::ReadProject,
        Self::CreateProject,
        Self::UpdateProject,
        Self::DeleteProject,
        Self::ReadImage,
        Self::CreateImage,
        Self::UpdateImage,
        Self::DeleteImage,
        Self::Vote,
        Self::Unvote,
        Self::ReadCriteria,
        Self::CreateRating,
        Self::ReadOwnRating,
        Self::UpdateRating,
        Self::DeleteRating,
        Self::ReadComment,
        Self::CreateComment,
        Self::UpdateComment,
        Self::DeleteComment,
    ];
}

/// Requirement an operation places on the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Anonymous callers allowed.
    Anyone,
    /// Any authenticated user.
    Authenticated,
    /// Only the user owning the target resource.
    Owner,
}

/// Decides whether a caller may perform an operation.
pub trait AccessControl: Send + Sync {
    /// The rule governing `op`.
    fn rule(&self, op: Operation) -> Rule;

    /// Check `caller` against the rule for `op`.
    ///
    /// `owner` is the user owning the target resource. It is only consulted
    /// for `Owner` rules; passing `None` there denies the operation.
    fn authorize(&self, caller: &Caller, op: Operation, owner: Option<&str>) -> AppResult<()> {
        match (self.rule(op), caller) {
            (Rule::Anyone, _) => Ok(()),
            (_, Caller::Anonymous) => Err(AppError::Unauthenticated),
            (Rule::Authenticated, Caller::User(_)) => Ok(()),
            (Rule::Owner, Caller::User(user_id)) => {
                if owner == Some(user_id.as_str()) {
                    Ok(())
                } else {
                    Err(AppError::Forbidden(
                        "You do not have permission to perform this action".to_string(),
                    ))
                }
            }
        }
    }

    /// Require an authenticated caller for `op` and return the user id.
    ///
    /// For `Owner` rules this only establishes authentication; the
    /// ownership check follows via [`AccessControl::authorize`] once the
    /// resource has been loaded.
    fn require_user<'a>(&self, caller: &'a Caller, op: Operation) -> AppResult<&'a str> {
        self.authorize(caller, op, caller.user_id())?;
        caller.user_id().ok_or(AppError::Unauthenticated)
    }
}

/// Table-driven [`AccessControl`].
#[derive(Debug, Clone)]
pub struct PolicyTable {
    rules: HashMap<Operation, Rule>,
}

impl PolicyTable {
    /// Override the rule for one operation.
    #[must_use]
    pub fn with_rule(mut self, op: Operation, rule: Rule) -> Self {
        self.rules.insert(op, rule);
        self
    }
}

impl Default for PolicyTable {
    fn default() -> Self {
        use Operation as Op;

        let rules = HashMap::from([
            (Op::ReadProject, Rule::Anyone),
            (Op::ReadImage, Rule::Anyone),
            (Op::ReadCriteria, Rule::Anyone),
            (Op::ReadComment, Rule::Anyone),
            (Op::CreateProject, Rule::Authenticated),
            (Op::UpdateProject, Rule::Owner),
            (Op::DeleteProject, Rule::Owner),
            (Op::CreateImage, Rule::Owner),
            (Op::UpdateImage, Rule::Owner),
            (Op::DeleteImage, Rule::Owner),
            (Op::Vote, Rule::Authenticated),
            (Op::Unvote, Rule::Authenticated),
            (Op::CreateRating, Rule::Authenticated),
            (Op::ReadOwnRating, Rule::Authenticated),
            (Op::UpdateRating, Rule::Owner),
            (Op::DeleteRating, Rule::Owner),
            (Op::CreateComment, Rule::Authenticated),
            (Op::UpdateComment, Rule::Owner),
            (Op::DeleteComment, Rule::Owner),
        ]);

        Self { rules }
    }
}

impl AccessControl for PolicyTable {
    fn rule(&self, op: Operation) -> Rule {
        // An operation missing from the table is treated as owner-only.
        self.rules.get(&op).copied().unwrap_or(Rule::Owner)
    }
}
