//! Job submission types and structural validation.
//!
//! A [`JobSubmission`] is built once per user request and never mutated. It
//! carries one of four input modalities ([`SourceConfig`]) plus the set of
//! test-case types to generate. [`JobSubmission::validate`] performs all
//! local checks; a submission that fails them is never sent to the service.

use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

/// The closed set of input modalities the generation service accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Jira,
    Azure,
    Url,
    Image,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Jira => write!(f, "jira"),
            SourceKind::Azure => write!(f, "azure"),
            SourceKind::Url => write!(f, "url"),
            SourceKind::Image => write!(f, "image"),
        }
    }
}

impl std::str::FromStr for SourceKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "jira" => Ok(SourceKind::Jira),
            "azure" => Ok(SourceKind::Azure),
            "url" => Ok(SourceKind::Url),
            "image" => Ok(SourceKind::Image),
            _ => anyhow::bail!(
                "Invalid source kind '{}'. Valid values: jira, azure, url, image",
                s
            ),
        }
    }
}

/// Kind-specific configuration payload, tagged by [`SourceKind`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "sourceType", content = "config", rename_all = "lowercase")]
pub enum SourceConfig {
    /// Generate from Jira stories.
    Jira {
        #[serde(rename = "projectKey")]
        project_key: String,
        /// Story/issue keys, e.g. `PROJ-123`.
        #[serde(rename = "itemIds")]
        item_ids: Vec<String>,
    },
    /// Generate from Azure DevOps work items.
    Azure {
        organization: String,
        project: String,
        #[serde(rename = "workItemIds")]
        work_item_ids: Vec<String>,
    },
    /// Generate from the content of a web page.
    Url {
        #[serde(rename = "targetUrl")]
        target_url: String,
    },
    /// Generate from uploaded screenshots.
    Image {
        #[serde(rename = "imagePaths")]
        image_paths: Vec<String>,
    },
}

impl SourceConfig {
    pub fn kind(&self) -> SourceKind {
        match self {
            SourceConfig::Jira { .. } => SourceKind::Jira,
            SourceConfig::Azure { .. } => SourceKind::Azure,
            SourceConfig::Url { .. } => SourceKind::Url,
            SourceConfig::Image { .. } => SourceKind::Image,
        }
    }
}

/// One generation request, immutable after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSubmission {
    #[serde(flatten)]
    pub source: SourceConfig,
    /// Requested test-case types, e.g. `functional`, `regression`, `security`.
    #[serde(rename = "testCaseTypes")]
    pub case_types: Vec<String>,
}

impl JobSubmission {
    pub fn new(source: SourceConfig, case_types: Vec<String>) -> Self {
        Self { source, case_types }
    }

    /// Check the structural prerequisites of this submission.
    ///
    /// Returns every failing field, not just the first, so the caller can
    /// report them all at once. An empty `Ok` means the submission may be
    /// sent to the service.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.case_types.is_empty() {
            errors.push(ValidationError::new(
                "testCaseTypes",
                "select at least one test case type",
            ));
        }
        if self.case_types.iter().any(|t| t.trim().is_empty()) {
            errors.push(ValidationError::new(
                "testCaseTypes",
                "test case types must not be blank",
            ));
        }

        match &self.source {
            SourceConfig::Jira {
                project_key,
                item_ids,
            } => {
                if project_key.trim().is_empty() {
                    errors.push(ValidationError::new(
                        "config.projectKey",
                        "Jira project key is required",
                    ));
                }
                if item_ids.is_empty() {
                    errors.push(ValidationError::new(
                        "config.itemIds",
                        "select at least one Jira story",
                    ));
                }
            }
            SourceConfig::Azure {
                organization,
                project,
                work_item_ids,
            } => {
                if organization.trim().is_empty() {
                    errors.push(ValidationError::new(
                        "config.organization",
                        "Azure DevOps organization is required",
                    ));
                }
                if project.trim().is_empty() {
                    errors.push(ValidationError::new(
                        "config.project",
                        "Azure DevOps project is required",
                    ));
                }
                if work_item_ids.is_empty() {
                    errors.push(ValidationError::new(
                        "config.workItemIds",
                        "select at least one work item",
                    ));
                }
            }
            SourceConfig::Url { target_url } => {
                if target_url.trim().is_empty() {
                    errors.push(ValidationError::new(
                        "config.targetUrl",
                        "target URL is required",
                    ));
                }
            }
            SourceConfig::Image { image_paths } => {
                if image_paths.is_empty() {
                    errors.push(ValidationError::new(
                        "config.imagePaths",
                        "provide at least one screenshot",
                    ));
                }
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url_submission(types: Vec<&str>) -> JobSubmission {
        JobSubmission::new(
            SourceConfig::Url {
                target_url: "https://example.com/login".to_string(),
            },
            types.into_iter().map(String::from).collect(),
        )
    }

    #[test]
    fn valid_url_submission_passes() {
        assert!(url_submission(vec!["functional", "regression"]).validate().is_ok());
    }

    #[test]
    fn empty_case_types_is_a_validation_error() {
        let errors = url_submission(vec![]).validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "testCaseTypes");
    }

    #[test]
    fn blank_url_and_empty_types_are_both_reported() {
        let submission = JobSubmission::new(
            SourceConfig::Url {
                target_url: "   ".to_string(),
            },
            vec![],
        );
        let errors = submission.validate().unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"testCaseTypes"));
        assert!(fields.contains(&"config.targetUrl"));
    }

    #[test]
    fn jira_submission_requires_item_ids() {
        let submission = JobSubmission::new(
            SourceConfig::Jira {
                project_key: "PROJ".to_string(),
                item_ids: vec![],
            },
            vec!["functional".to_string()],
        );
        let errors = submission.validate().unwrap_err();
        assert_eq!(errors[0].field, "config.itemIds");
    }

    #[test]
    fn azure_submission_reports_each_missing_field() {
        let submission = JobSubmission::new(
            SourceConfig::Azure {
                organization: "".to_string(),
                project: "".to_string(),
                work_item_ids: vec![],
            },
            vec!["functional".to_string()],
        );
        let errors = submission.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn submission_serializes_to_the_wire_shape() {
        let submission = JobSubmission::new(
            SourceConfig::Jira {
                project_key: "PROJ".to_string(),
                item_ids: vec!["PROJ-1".to_string(), "PROJ-2".to_string()],
            },
            vec!["functional".to_string()],
        );
        let json = serde_json::to_value(&submission).unwrap();
        assert_eq!(json["sourceType"], "jira");
        assert_eq!(json["config"]["projectKey"], "PROJ");
        assert_eq!(json["config"]["itemIds"][0], "PROJ-1");
        assert_eq!(json["testCaseTypes"][0], "functional");
    }

    #[test]
    fn source_kind_round_trips_through_from_str() {
        for kind in ["jira", "azure", "url", "image"] {
            let parsed: SourceKind = kind.parse().unwrap();
            assert_eq!(parsed.to_string(), kind);
        }
        assert!("github".parse::<SourceKind>().is_err());
    }
}
