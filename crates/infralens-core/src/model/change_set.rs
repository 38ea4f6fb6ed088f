use crate::errors::{InfraLensError, Result};
use crate::model::Action;
use serde::Serialize;
use std::collections::BTreeSet;

/// One resource within a stack.
///
/// The action set is never empty: a resource without actions is not
/// represented at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceChange {
    id: String,
    #[serde(rename = "type")]
    resource_type: String,
    actions: BTreeSet<Action>,
    security_sensitive: bool,
}

impl ResourceChange {
    /// Build a resource change, or `None` when `actions` is empty.
    ///
    /// The security flag starts unset; the classifier owns it.
    pub fn new(
        id: impl Into<String>,
        resource_type: impl Into<String>,
        actions: impl IntoIterator<Item = Action>,
    ) -> Option<Self> {
        let actions: BTreeSet<Action> = actions.into_iter().collect();
        if actions.is_empty() {
            return None;
        }
        Some(Self {
            id: id.into(),
            resource_type: resource_type.into(),
            actions,
            security_sensitive: false,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Verbatim provider type string, e.g. `AWS::IAM::Role`
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    pub fn actions(&self) -> &BTreeSet<Action> {
        &self.actions
    }

    pub fn has_action(&self, action: Action) -> bool {
        self.actions.contains(&action)
    }

    pub fn is_destructive(&self) -> bool {
        self.actions.iter().any(Action::is_destructive)
    }

    pub fn is_security_sensitive(&self) -> bool {
        self.security_sensitive
    }

    pub(crate) fn set_security_sensitive(&mut self, sensitive: bool) {
        self.security_sensitive = sensitive;
    }
}

/// One deployment unit (a CloudFormation stack, a Terraform workspace).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackChange {
    name: String,
    actions: BTreeSet<Action>,
    resources: Vec<ResourceChange>,
}

impl StackChange {
    /// Create a stack. `Replace` is not a stack-level action and is dropped.
    pub fn new(name: impl Into<String>, actions: impl IntoIterator<Item = Action>) -> Self {
        Self {
            name: name.into(),
            actions: actions
                .into_iter()
                .filter(Action::applies_to_stack)
                .collect(),
            resources: Vec::new(),
        }
    }

    /// Append a resource, keeping insertion order.
    ///
    /// # Errors
    ///
    /// `MalformedInput` if a resource with the same id is already present.
    pub fn add_resource(&mut self, resource: ResourceChange) -> Result<()> {
        if self.resources.iter().any(|r| r.id == resource.id) {
            return Err(InfraLensError::malformed(
                format!("$.{}.resources.{}", self.name, resource.id),
                "duplicate resource id within stack",
            ));
        }
        self.resources.push(resource);
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn actions(&self) -> &BTreeSet<Action> {
        &self.actions
    }

    pub fn resources(&self) -> &[ResourceChange] {
        &self.resources
    }

    /// A stack with neither stack-level actions nor resources is a no-op
    pub fn is_noop(&self) -> bool {
        self.actions.is_empty() && self.resources.is_empty()
    }
}

/// Per-action counters over every resource in a `ChangeSet`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSummary {
    pub creates: usize,
    pub updates: usize,
    pub deletes: usize,
    pub replaces: usize,
}

impl ChangeSummary {
    fn record(&mut self, action: Action) {
        match action {
            Action::Create => self.creates += 1,
            Action::Update => self.updates += 1,
            Action::Delete => self.deletes += 1,
            Action::Replace => self.replaces += 1,
        }
    }

    pub fn count(&self, action: Action) -> usize {
        match action {
            Action::Create => self.creates,
            Action::Update => self.updates,
            Action::Delete => self.deletes,
            Action::Replace => self.replaces,
        }
    }

    /// Sum of all counters
    pub fn total(&self) -> usize {
        self.creates + self.updates + self.deletes + self.replaces
    }

    /// Deletes plus replaces
    pub fn destructive(&self) -> usize {
        self.deletes + self.replaces
    }
}

/// The full normalized set of changes for one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSet {
    stacks: Vec<StackChange>,
    summary: ChangeSummary,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stack and recompute the counters.
    ///
    /// # Errors
    ///
    /// `MalformedInput` if a stack with the same name is already present.
    pub fn add_stack(&mut self, stack: StackChange) -> Result<()> {
        if self.stacks.iter().any(|s| s.name == stack.name) {
            return Err(InfraLensError::malformed(
                format!("$.{}", stack.name),
                "duplicate stack name",
            ));
        }
        self.stacks.push(stack);
        self.recompute_summary();
        Ok(())
    }

    fn recompute_summary(&mut self) {
        let mut summary = ChangeSummary::default();
        for resource in self.resources() {
            for action in resource.actions() {
                summary.record(*action);
            }
        }
        self.summary = summary;
    }

    pub fn stacks(&self) -> &[StackChange] {
        &self.stacks
    }

    pub fn summary(&self) -> ChangeSummary {
        self.summary
    }

    /// Total number of resource-level actions
    pub fn total_changes(&self) -> usize {
        self.summary.total()
    }

    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }

    /// All resources in stack order, then resource order
    pub fn resources(&self) -> impl Iterator<Item = &ResourceChange> {
        self.stacks.iter().flat_map(|s| s.resources.iter())
    }

    /// Resources paired with the stack that owns them
    pub fn resources_with_stack(&self) -> impl Iterator<Item = (&StackChange, &ResourceChange)> {
        self.stacks
            .iter()
            .flat_map(|s| s.resources.iter().map(move |r| (s, r)))
    }

    pub fn resource_count(&self) -> usize {
        self.stacks.iter().map(|s| s.resources.len()).sum()
    }

    /// Counters are not touched: classification never changes actions.
    pub(crate) fn resources_mut(&mut self) -> impl Iterator<Item = &mut ResourceChange> {
        self.stacks.iter_mut().flat_map(|s| s.resources.iter_mut())
    }
}
