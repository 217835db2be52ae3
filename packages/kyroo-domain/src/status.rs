use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

pub const OWNER_PERMISSIONS: [&str; 3] = ["read", "write", "admin"];

/// Remote provisioning state of a collection.
///
/// A collection carries a remote collection name exactly when it is `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionStatus {
	Pending,
	Active,
	Error,
}
impl CollectionStatus {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Pending => "pending",
			Self::Active => "active",
			Self::Error => "error",
		}
	}

	pub fn is_consistent_with(self, remote_name: Option<&str>) -> bool {
		matches!(self, Self::Active) == remote_name.is_some()
	}

	pub fn needs_provisioning(self) -> bool {
		matches!(self, Self::Pending | Self::Error)
	}
}
impl fmt::Display for CollectionStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
impl FromStr for CollectionStatus {
	type Err = String;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		match raw {
			"pending" => Ok(Self::Pending),
			"active" => Ok(Self::Active),
			"error" => Ok(Self::Error),
			other => Err(format!("Unknown collection status {other:?}.")),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
	Owner,
	Admin,
	Member,
}
impl MemberRole {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Owner => "owner",
			Self::Admin => "admin",
			Self::Member => "member",
		}
	}
}
impl fmt::Display for MemberRole {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
impl FromStr for MemberRole {
	type Err = String;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		match raw {
			"owner" => Ok(Self::Owner),
			"admin" => Ok(Self::Admin),
			"member" => Ok(Self::Member),
			other => Err(format!("Unknown member role {other:?}.")),
		}
	}
}
