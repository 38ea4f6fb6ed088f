use serde::Serialize;
use std::fmt;

/// A change applied to a stack or resource.
///
/// `Replace` is a first-class action: a replacement is never expanded
/// into delete + create, so it is counted exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Create,
    Update,
    Delete,
    Replace,
}

impl Action {
    pub const ALL: [Action; 4] = [
        Action::Create,
        Action::Update,
        Action::Delete,
        Action::Replace,
    ];

    /// Map a raw marker (`create`, `destroy`, `Replace`, ...) to an action.
    ///
    /// Matching is case-insensitive. `destroy` is a synonym for delete.
    /// Anything else is `None`, which callers treat as a no-op.
    pub fn from_marker(marker: &str) -> Option<Action> {
        match marker.trim().to_ascii_lowercase().as_str() {
            "create" => Some(Action::Create),
            "update" => Some(Action::Update),
            "delete" | "destroy" => Some(Action::Delete),
            "replace" => Some(Action::Replace),
            _ => None,
        }
    }

    /// Delete and replace both remove a live resource
    pub fn is_destructive(&self) -> bool {
        matches!(self, Action::Delete | Action::Replace)
    }

    /// Stacks can be created, updated or deleted, never replaced
    pub fn applies_to_stack(&self) -> bool {
        !matches!(self, Action::Replace)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Replace => "replace",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
