//! Verdict presentation
//!
//! Picks and orders what the host displays. No decisions are made here.

use serde::Serialize;

use crate::models::errors::AppError;
use crate::models::types::{Finding, Severity, SeverityClass, Verdict};

/// Renderable component tree, tagged by `type`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Component {
    Panel {
        children: Vec<Component>,
    },
    Heading {
        value: String,
    },
    Text {
        value: String,
        color: SeverityClass,
        #[serde(skip_serializing_if = "Option::is_none")]
        icon: Option<&'static str>,
    },
    Divider,
    Copyable {
        value: String,
    },
}

/// What the host receives
#[derive(Debug, Clone, Serialize)]
pub struct InsightResponse {
    pub content: Component,
    /// Absent on error trees
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
}

pub struct VerdictPresenter;

impl VerdictPresenter {
    /// Checklist order: master status first, then canonical row order.
    /// Stable, so equal ranks keep their relative order.
    pub fn order(findings: &[Finding]) -> Vec<Finding> {
        let mut ordered = findings.to_vec();
        ordered.sort_by_key(|f| f.key.rank());
        ordered
    }

    /// Render a verdict with its audit record
    pub fn render<E: Serialize>(verdict: &Verdict, evidence: &E) -> Result<InsightResponse, AppError> {
        let audit = serde_json::to_string_pretty(evidence)?;
        let ordered = Self::order(&verdict.findings);

        let mut children = Vec::with_capacity(ordered.len() + 4);
        children.push(Component::Heading {
            value: "Polymarket deposit check".to_string(),
        });
        children.extend(ordered.iter().map(|f| Component::Text {
            value: f.message.to_string(),
            color: f.severity_class,
            icon: Some(f.icon_key),
        }));
        children.push(Component::Divider);
        children.push(Component::Heading {
            value: "Audit".to_string(),
        });
        children.push(Component::Copyable { value: audit });

        Ok(InsightResponse {
            content: Component::Panel { children },
            severity: Some(verdict.severity),
        })
    }

    /// Minimal error tree; carries no severity
    pub fn render_error(error: &AppError) -> InsightResponse {
        let detail = serde_json::json!({
            "error": {
                "code": error.code_str(),
                "message": error.message,
                "source": error.source.as_ref().map(|s| s.to_string()),
            }
        });

        InsightResponse {
            content: Component::Panel {
                children: vec![
                    Component::Heading {
                        value: "Error".to_string(),
                    },
                    Component::Text {
                        value: error.to_string(),
                        color: SeverityClass::Error,
                        icon: None,
                    },
                    Component::Copyable {
                        value: detail.to_string(),
                    },
                ],
            },
            severity: None,
        }
    }
}
