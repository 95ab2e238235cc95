use serde::{Deserialize, Serialize};

/// Supplier (fournisseur) record as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub id: i64,

    pub name: String,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub phone: Option<String>,

    #[serde(default)]
    pub address: Option<String>,

    /// Inactive suppliers are kept for history but not offered for new orders
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}
