/// Host permission planning for the background
///
/// Compares the origins the extension holds with the ones it needs and reports
/// what to request and what to give back.
use serde::{Deserialize, Serialize};

/// Needed to sign in
const REQUIRED_DOMAINS: [&str; 1] = ["gitkraken.dev"];

const CLOUD_DOMAINS: [&str; 4] = ["github.com", "gitlab.com", "bitbucket.org", "dev.azure.com"];

/// Browser match pattern covering a domain and its subdomains
pub fn match_pattern(domain: &str) -> String {
    format!("*://*.{}/*", domain)
}

/// Argument of `permissions.request`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Origins {
    pub origins: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionsRequest {
    pub request: Origins,
    pub has_required: bool,
    pub has_cloud: bool,
}

impl PermissionsRequest {
    /// Text of the popup banner asking for the missing origins
    pub fn banner_message(&self) -> &'static str {
        if self.has_required {
            "This extension requires additional permissions."
        } else {
            "Allow permissions for cloud git providers."
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionsPlan {
    /// Absent when every needed origin is already granted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<PermissionsRequest>,
    /// Granted origins nothing needs any more
    pub unused: Vec<String>,
}

fn missing(wanted: &[String], existing: &[String]) -> Vec<String> {
    wanted.iter().filter(|o| !existing.contains(o)).cloned().collect()
}

pub fn plan_permissions(existing: &[String]) -> PermissionsPlan {
    let required: Vec<String> = REQUIRED_DOMAINS.iter().map(|d| match_pattern(d)).collect();
    let cloud: Vec<String> = CLOUD_DOMAINS.iter().map(|d| match_pattern(d)).collect();

    let new_required = missing(&required, existing);
    let new_cloud = missing(&cloud, existing);
    let known: Vec<String> = required.iter().chain(cloud.iter()).cloned().collect();
    let unused = missing(existing, &known);

    let request = if new_required.is_empty() && new_cloud.is_empty() {
        None
    } else {
        Some(PermissionsRequest {
            has_required: !new_required.is_empty(),
            has_cloud: !new_cloud.is_empty(),
            request: Origins {
                origins: new_required.into_iter().chain(new_cloud).collect(),
            },
        })
    };

    PermissionsPlan { request, unused }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_patterns() -> Vec<String> {
        REQUIRED_DOMAINS
            .iter()
            .chain(CLOUD_DOMAINS.iter())
            .map(|d| match_pattern(d))
            .collect()
    }

    #[test]
    fn test_fresh_install_requests_everything() {
        let plan = plan_permissions(&[]);
        let request = plan.request.unwrap();

        assert!(request.has_required);
        assert!(request.has_cloud);
        assert_eq!(request.request.origins, all_patterns());
        assert_eq!(request.request.origins[0], "*://*.gitkraken.dev/*");
        assert!(plan.unused.is_empty());
    }

    #[test]
    fn test_only_cloud_missing() {
        let plan = plan_permissions(&[match_pattern("gitkraken.dev"), match_pattern("github.com")]);
        let request = plan.request.unwrap();

        assert!(!request.has_required);
        assert!(request.has_cloud);
        assert_eq!(request.request.origins.len(), 3);
        assert_eq!(request.banner_message(), "Allow permissions for cloud git providers.");
    }

    #[test]
    fn test_everything_granted_lists_leftovers() {
        let mut existing = all_patterns();
        existing.push("*://*.example.com/*".to_string());

        let plan = plan_permissions(&existing);

        assert_eq!(plan.request, None);
        assert_eq!(plan.unused, vec!["*://*.example.com/*".to_string()]);
    }

    #[test]
    fn test_plan_serializes_in_camel_case() {
        let plan = plan_permissions(&[match_pattern("github.com")]);
        let value = serde_json::to_value(&plan).unwrap();

        assert_eq!(value["request"]["hasRequired"], serde_json::json!(true));
        assert_eq!(value["request"]["hasCloud"], serde_json::json!(true));
        assert_eq!(value["request"]["request"]["origins"][0], "*://*.gitkraken.dev/*");

        let granted = serde_json::to_value(plan_permissions(&all_patterns())).unwrap();
        assert_eq!(granted, serde_json::json!({ "unused": [] }));
    }

    #[test]
    fn test_banner_for_required_origin() {
        let request: PermissionsRequest = serde_json::from_value(serde_json::json!({
            "request": { "origins": ["*://*.gitkraken.dev/*"] },
            "hasRequired": true,
            "hasCloud": false
        }))
        .unwrap();
        assert_eq!(request.banner_message(), "This extension requires additional permissions.");
    }
}
