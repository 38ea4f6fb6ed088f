//! Security classification of resource types
//!
//! A resource is security-sensitive iff its lower-cased type string
//! contains one of [`SECURITY_PATTERNS`]. Substring matching is used
//! because providers nest types at different depths:
//! `AWS::IAM::Role`, `aws_iam_role`, `google_project_iam_member`.

use crate::model::ChangeSet;
use serde::Serialize;

/// Family of security-sensitive resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityFamily {
    IdentityAccess,
    KeyManagement,
    SecretStorage,
    NetworkPerimeter,
}

/// A lower-case needle and the family it identifies
#[derive(Debug, Clone, Copy)]
pub struct SecurityPattern {
    pub needle: &'static str,
    pub family: SecurityFamily,
}

const fn pattern(needle: &'static str, family: SecurityFamily) -> SecurityPattern {
    SecurityPattern { needle, family }
}

/// Fixed pattern table, checked in order; first match names the family.
pub const SECURITY_PATTERNS: &[SecurityPattern] = &[
    // identity / access management
    pattern("::iam::", SecurityFamily::IdentityAccess),
    pattern("iam::", SecurityFamily::IdentityAccess),
    pattern("_iam_", SecurityFamily::IdentityAccess),
    pattern("aws_iam", SecurityFamily::IdentityAccess),
    pattern("::sso::", SecurityFamily::IdentityAccess),
    pattern("identitystore", SecurityFamily::IdentityAccess),
    pattern("role_assignment", SecurityFamily::IdentityAccess),
    pattern("lambda::permission", SecurityFamily::IdentityAccess),
    // key management
    pattern("kms", SecurityFamily::KeyManagement),
    pattern("key_vault", SecurityFamily::KeyManagement),
    pattern("keyvault", SecurityFamily::KeyManagement),
    pattern("cloudhsm", SecurityFamily::KeyManagement),
    // secret storage
    pattern("secretsmanager", SecurityFamily::SecretStorage),
    pattern("secret", SecurityFamily::SecretStorage),
    // network perimeter
    pattern("securitygroup", SecurityFamily::NetworkPerimeter),
    pattern("security_group", SecurityFamily::NetworkPerimeter),
    pattern("networkacl", SecurityFamily::NetworkPerimeter),
    pattern("network_acl", SecurityFamily::NetworkPerimeter),
    pattern("firewall", SecurityFamily::NetworkPerimeter),
    pattern("waf", SecurityFamily::NetworkPerimeter),
];

/// Family matched by `resource_type`, if any
pub fn security_family(resource_type: &str) -> Option<SecurityFamily> {
    let lowered = resource_type.to_ascii_lowercase();
    SECURITY_PATTERNS
        .iter()
        .find(|p| lowered.contains(p.needle))
        .map(|p| p.family)
}

pub fn is_security_sensitive(resource_type: &str) -> bool {
    security_family(resource_type).is_some()
}

/// Annotate every resource with its security flag.
///
/// Pure and idempotent: the flag is a function of the type string only,
/// so classifying twice yields the same annotations.
pub fn classify(change_set: &mut ChangeSet) {
    for resource in change_set.resources_mut() {
        let sensitive = is_security_sensitive(resource.resource_type());
        resource.set_security_sensitive(sensitive);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Action, ResourceChange, StackChange};

    fn change_set() -> ChangeSet {
        let mut stack = StackChange::new("Core", [Action::Update]);
        for (id, resource_type) in [
            ("Role", "AWS::IAM::Role"),
            ("Bucket", "AWS::S3::Bucket"),
            ("Key", "AWS::KMS::Key"),
        ] {
            let resource = ResourceChange::new(id, resource_type, [Action::Replace]).unwrap();
            stack.add_resource(resource).unwrap();
        }
        let mut cs = ChangeSet::new();
        cs.add_stack(stack).unwrap();
        cs
    }

    #[test]
    fn test_classify_twice_changes_nothing() {
        let mut once = change_set();
        classify(&mut once);
        let mut twice = once.clone();
        classify(&mut twice);

        assert_eq!(twice, once);
        let flags: Vec<bool> = once.resources().map(|r| r.is_security_sensitive()).collect();
        assert_eq!(flags, vec![true, false, true]);
    }

    #[test]
    fn test_cloudformation_types() {
        assert_eq!(
            security_family("AWS::IAM::Role"),
            Some(SecurityFamily::IdentityAccess)
        );
        assert_eq!(
            security_family("AWS::KMS::Key"),
            Some(SecurityFamily::KeyManagement)
        );
        assert_eq!(
            security_family("AWS::SecretsManager::Secret"),
            Some(SecurityFamily::SecretStorage)
        );
        assert_eq!(
            security_family("AWS::EC2::SecurityGroup"),
            Some(SecurityFamily::NetworkPerimeter)
        );
        assert_eq!(
            security_family("AWS::WAFv2::WebACL"),
            Some(SecurityFamily::NetworkPerimeter)
        );
    }

    #[test]
    fn test_terraform_and_gcp_types() {
        assert!(is_security_sensitive("aws_iam_role_policy"));
        assert!(is_security_sensitive("google_project_iam_member"));
        assert!(is_security_sensitive("google_kms_crypto_key"));
        assert!(is_security_sensitive("azurerm_key_vault"));
        assert!(is_security_sensitive("aws_security_group_rule"));
    }

    #[test]
    fn test_case_insensitive() {
        assert!(is_security_sensitive("aws::iam::policy"));
        assert!(is_security_sensitive("AWS::Kms::Alias"));
    }

    #[test]
    fn test_ordinary_types_are_not_sensitive() {
        for t in [
            "AWS::S3::Bucket",
            "AWS::Lambda::Function",
            "AWS::DynamoDB::Table",
            "AWS::EC2::Instance",
            "Unknown",
            "",
        ] {
            assert!(!is_security_sensitive(t), "{} flagged", t);
        }
    }
}
