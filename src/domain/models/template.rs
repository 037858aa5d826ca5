use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemplateStatus {
    Draft,
    Pending,
    Approved,
    Rejected,
}

impl TemplateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateStatus::Draft => "draft",
            TemplateStatus::Pending => "pending",
            TemplateStatus::Approved => "approved",
            TemplateStatus::Rejected => "rejected",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(TemplateStatus::Draft),
            "pending" => Some(TemplateStatus::Pending),
            "approved" => Some(TemplateStatus::Approved),
            "rejected" => Some(TemplateStatus::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemplateCategory {
    Utility,
    Marketing,
    Authentication,
}

impl TemplateCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateCategory::Utility => "UTILITY",
            TemplateCategory::Marketing => "MARKETING",
            TemplateCategory::Authentication => "AUTHENTICATION",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "UTILITY" => Some(TemplateCategory::Utility),
            "MARKETING" => Some(TemplateCategory::Marketing),
            "AUTHENTICATION" => Some(TemplateCategory::Authentication),
            _ => None,
        }
    }
}

/// A reusable message template tracked through the provider's approval flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub id: Uuid,
    pub name: String,
    /// Provider-side content id, assigned when the draft is created remotely.
    pub content_sid: Option<String>,
    pub body: String,
    pub variables: serde_json::Value,
    pub category: Option<TemplateCategory>,
    pub status: TemplateStatus,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
