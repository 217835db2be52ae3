use regex::Regex;
use time::OffsetDateTime;

/// Remote collection name for a display name: lower-cased, every character outside `[a-z0-9]`
/// replaced by `_`, suffixed with the creation time in unix milliseconds.
pub fn remote_collection_name(display_name: &str, now: OffsetDateTime) -> String {
	let lowered = display_name.to_lowercase();
	let slug = Regex::new("[^a-z0-9]")
		.map(|re| re.replace_all(&lowered, "_").into_owned())
		.unwrap_or_else(|_| lowered.clone());
	let millis = now.unix_timestamp_nanos() / 1_000_000;

	format!("{slug}_{millis}")
}

pub fn cluster_name(prefix: &str, workspace_id: impl std::fmt::Display) -> String {
	format!("{prefix}{workspace_id}")
}

/// Workspace id embedded in a cluster name produced by [`cluster_name`], if any.
pub fn workspace_id_from_cluster_name<'a>(prefix: &str, name: &'a str) -> Option<&'a str> {
	name.strip_prefix(prefix).filter(|rest| !rest.is_empty())
}
