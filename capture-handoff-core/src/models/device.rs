use serde::Serialize;

/// A capture device advertised by a `DeviceProvider`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub name: String,
    pub description: Option<String>,
    pub is_up: bool,
}

impl DeviceInfo {
    /// Description if the facility has one, otherwise the name.
    pub fn label(&self) -> &str {
        self.description.as_deref().unwrap_or(&self.name)
    }
}
