//! Print Group Model

use serde::{Deserialize, Serialize};

/// Print group entity (logical print station, e.g. "Hot Kitchen", "Cold Bar")
///
/// Maps a set of menu items to one physical printer. Referenced by
/// `OrderItem::print_group_id`; never linked by ownership.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrintGroup {
    pub id: i64,
    pub name: String,
    /// Printer network address, "host:port"
    pub printer_address: String,
    /// Display-only color tag for the UI
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_code: Option<String>,
    pub is_active: bool,
}

/// Create print group payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrintGroupCreate {
    pub name: String,
    pub printer_address: String,
    pub color_code: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Update print group payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrintGroupUpdate {
    pub name: Option<String>,
    pub printer_address: Option<String>,
    pub color_code: Option<String>,
    pub is_active: Option<bool>,
}

fn default_true() -> bool {
    true
}
