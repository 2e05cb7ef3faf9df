use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::coerce;

/// A campaign currently referencing a published flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CampaignRef {
  #[serde(alias = "Id", default, deserialize_with = "coerce::text")]
  pub id: String,
  #[serde(alias = "Name", default, deserialize_with = "coerce::text")]
  pub name: String,
  #[serde(alias = "Status", default, deserialize_with = "coerce::text")]
  pub status: String,
  #[serde(alias = "CreatedAt", default, deserialize_with = "coerce::timestamp")]
  pub created_at: Option<DateTime<Utc>>,
  #[serde(alias = "CreatedBy", default, deserialize_with = "coerce::non_blank")]
  pub created_by: Option<String>,
  #[serde(alias = "ScheduledAt", default, deserialize_with = "coerce::timestamp")]
  pub scheduled_at: Option<DateTime<Utc>>,
  #[serde(alias = "FirstSentAt", default, deserialize_with = "coerce::timestamp")]
  pub first_sent_at: Option<DateTime<Utc>>,
}

impl CampaignRef {
  pub fn new(id: impl Into<String>, name: impl Into<String>, status: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      name: name.into(),
      status: status.into(),
      ..Default::default()
    }
  }
}

/// Result of a usage query: which campaigns reference a flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UsageReport {
  #[serde(default, deserialize_with = "coerce::list_or_empty")]
  pub campaigns: Vec<CampaignRef>,
}

impl UsageReport {
  /// A flow referenced by at least one campaign is locked for direct editing.
  pub fn is_attached(&self) -> bool {
    !self.campaigns.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_campaign_timestamps_are_lenient() {
    let campaign: CampaignRef = serde_json::from_value(json!({
      "id": 7,
      "name": "Diwali Sale",
      "status": "Running",
      "createdAt": "2024-10-01T10:00:00Z",
      "scheduledAt": "not a date",
      "firstSentAt": 1727776800000i64,
    }))
    .unwrap();

    assert_eq!(campaign.id, "7");
    assert!(campaign.created_at.is_some());
    assert!(campaign.scheduled_at.is_none());
    assert!(campaign.first_sent_at.is_some());
  }

  #[test]
  fn test_usage_attached() {
    assert!(!UsageReport::default().is_attached());
    let report = UsageReport {
      campaigns: vec![CampaignRef::new("c1", "Diwali Sale", "Running")],
    };
    assert!(report.is_attached());
  }
}
