//! Caller context used only by the Audience Filter (spec.md §3, §4.5).

use serde::{Deserialize, Serialize};

/// The sync request's caller attributes, consulted exclusively by the
/// Audience Filter when evaluating `notification`/`message` entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CallerContext {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_groups: Vec<String>,
    #[serde(default)]
    pub user_region: Option<String>,
    #[serde(default)]
    pub user_province: Option<String>,
    #[serde(default)]
    pub user_city: Option<String>,
    #[serde(default)]
    pub user_device_id: Option<String>,
    #[serde(default)]
    pub is_registered: bool,
}
