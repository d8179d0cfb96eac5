//! Counsellor records as seen by the routing engine

use crate::error::{CoreError, Result};
use crate::types::Tier;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CounsellorRole {
    L2,
    L3,
    /// Team owner; never an allocation target
    To,
}

impl CounsellorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            CounsellorRole::L2 => "l2",
            CounsellorRole::L3 => "l3",
            CounsellorRole::To => "to",
        }
    }
}

impl FromStr for CounsellorRole {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "l2" => Ok(CounsellorRole::L2),
            "l3" => Ok(CounsellorRole::L3),
            "to" => Ok(CounsellorRole::To),
            _ => Err(CoreError::UnknownLabel {
                kind: "counsellor role",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CounsellorStatus {
    Active,
    Inactive,
    Suspended,
}

impl CounsellorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CounsellorStatus::Active => "active",
            CounsellorStatus::Inactive => "inactive",
            CounsellorStatus::Suspended => "suspended",
        }
    }
}

impl FromStr for CounsellorStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Ok(CounsellorStatus::Active),
            "inactive" => Ok(CounsellorStatus::Inactive),
            "suspended" => Ok(CounsellorStatus::Suspended),
            _ => Err(CoreError::UnknownLabel {
                kind: "counsellor status",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counsellor {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: CounsellorRole,
    pub status: CounsellorStatus,
}

impl Counsellor {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        role: CounsellorRole,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            role,
            status: CounsellorStatus::Active,
        }
    }

    pub fn with_status(mut self, status: CounsellorStatus) -> Self {
        self.status = status;
        self
    }

    /// Whether this counsellor may receive leads for `tier`
    ///
    /// L2 requires an active counsellor. L3 only excludes suspended ones.
    pub fn is_eligible_for(&self, tier: Tier) -> bool {
        match tier.counsellor_role() {
            Some(role) if role == self.role => match tier {
                Tier::L2 => self.status == CounsellorStatus::Active,
                _ => self.status != CounsellorStatus::Suspended,
            },
            _ => false,
        }
    }
}
