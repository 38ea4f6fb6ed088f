//! Narrative request text
//!
//! The prompt lists every change as one sentence, adds the deterministic
//! risk facts, and asks for a fixed set of sections in the configured
//! language. Any change to the wording must bump
//! [`FINGERPRINT_VERSION`](crate::fingerprint::FINGERPRINT_VERSION).

use crate::config::NarrativeConfig;
use crate::model::{Action, ChangeSet};
use crate::risk::RiskAssessment;
use std::fmt::Write as _;

pub const SYSTEM_PROMPT: &str = "You are an expert cloud infrastructure architect who can \
explain complex infrastructure changes in simple terms.";

/// Sections requested from the narrative backend, in order
pub const SECTIONS: &[(&str, &str)] = &[
    ("Executive Summary", "two or three sentences on the overall change and its business impact"),
    ("Resource Changes Table", "a markdown table with columns Action, Resource Type, Resource Name, Stack"),
    ("Security & Permissions", "identity, key, secret and network changes and their implications"),
    ("Cost Impact", "new resources, removed resources and updated resources"),
    ("Risk Assessment", "potential risks and mitigation strategies"),
    ("Deployment Notes", "dependencies, deployment order and rollback considerations"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

fn verb(action: Action) -> &'static str {
    match action {
        Action::Create => "created",
        Action::Update => "updated",
        Action::Delete => "destroyed",
        Action::Replace => "replaced",
    }
}

/// One sentence per stack-level and resource-level action
pub fn change_lines(change_set: &ChangeSet) -> Vec<String> {
    let mut lines = Vec::new();
    for stack in change_set.stacks() {
        for action in stack.actions() {
            lines.push(format!("Stack '{}' will be {}", stack.name(), verb(*action)));
        }
        for resource in stack.resources() {
            let marker = if resource.is_security_sensitive() {
                " [security-sensitive]"
            } else {
                ""
            };
            for action in resource.actions() {
                lines.push(format!(
                    "Resource '{}' ({}) will be {} in stack '{}'{}",
                    resource.id(),
                    resource.resource_type(),
                    verb(*action),
                    stack.name(),
                    marker
                ));
            }
        }
    }
    lines
}

pub fn build_prompt(
    change_set: &ChangeSet,
    assessment: &RiskAssessment<'_>,
    narrative: &NarrativeConfig,
) -> Prompt {
    let lines = change_lines(change_set);
    let mut user = String::new();

    if lines.is_empty() {
        user.push_str(
            "No infrastructure changes were detected in the diff. \
             Briefly explain what this usually means and suggest next steps.\n",
        );
    } else {
        user.push_str("Analyze the following infrastructure diff and write a professional summary.\n\n");
        user.push_str("Changes detected:\n");
        for line in &lines {
            let _ = writeln!(user, "- {}", line);
        }

        let _ = write!(
            user,
            "\nComputed assessment:\n- Risk level: {} ({})\n- Deployment size: {}\n- Cost impact: {}\n- Destructive changes: {}\n- Security-sensitive resources: {}\n",
            assessment.level,
            assessment.rule.as_str(),
            assessment.size.as_str(),
            assessment.cost_impact.as_str(),
            assessment.destructive_changes,
            assessment.security_sensitive.len()
        );

        user.push_str("\nProvide these sections:\n");
        for (i, (title, hint)) in SECTIONS.iter().enumerate() {
            let _ = writeln!(user, "{}. {}: {}", i + 1, title, hint);
        }
    }

    let _ = write!(
        user,
        "\nRespond in {} using clean markdown. Keep it business-focused and under {} tokens.",
        narrative.language.name(),
        narrative.max_length
    );

    Prompt {
        system: SYSTEM_PROMPT.to_string(),
        user,
    }
}
