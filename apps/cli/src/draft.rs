use std::path::Path;

use anyhow::Context;
use chrono::NaiveDateTime;
use serde::Deserialize;

use appointment_cell::FormPatch;

/// User-entered part of the booking form, read from a JSON file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub location: String,
    pub disease: String,
    pub appointment_date: Option<NaiveDateTime>,
    pub appointment_time: Option<NaiveDateTime>,
}

impl Draft {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read draft {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("Invalid draft {}", path.display()))
    }

    /// Only the user-owned fields; lookups keep the rest.
    pub fn into_patch(self) -> FormPatch {
        FormPatch {
            location: Some(self.location),
            disease: Some(self.disease),
            appointment_date: self.appointment_date,
            appointment_time: self.appointment_time,
            ..FormPatch::default()
        }
    }
}
