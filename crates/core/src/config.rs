use serde::Deserialize;

/// Client-side settings of a [`Bridge`](crate::Bridge).
///
/// Every field has a default, so an empty JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BridgeConfig {
    /// Font every new canvas context starts with.
    pub canvas_font: String,
    /// Send a batch's `create` operations ahead of everything else, in
    /// creation order.
    pub hoist_creates: bool,
    /// Keep diagnostics in memory in addition to logging them.
    pub record_diagnostics: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            canvas_font: "10px sans-serif".to_string(),
            hoist_creates: true,
            record_diagnostics: true,
        }
    }
}

impl BridgeConfig {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
