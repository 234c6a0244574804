//! Static inventory for an orchestration tool's dynamic-inventory protocol.
//!
//! The data is fixture data compiled into the binary: one group with one
//! host, plus that host's variables under `_meta.hostvars`. Nothing is
//! discovered at runtime.

pub mod format;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{AppError, Result};

pub use format::{to_json_string, SpacedFormatter};

/// Variables for one host, in key order.
pub type HostVars = BTreeMap<String, String>;

/// Hosts belonging to a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    /// Host names.
    pub hosts: Vec<String>,
}

/// The `_meta` section carrying per-host variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct Meta {
    /// Host name to variables.
    pub hostvars: BTreeMap<String, HostVars>,
}

/// A complete inventory document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct Inventory {
    /// Group name to members.
    #[serde(flatten)]
    pub groups: BTreeMap<String, Group>,
    /// Host variables.
    #[serde(rename = "_meta")]
    pub meta: Meta,
}

/// Name of the single example host.
pub const EXAMPLE_HOST: &str = "web-01";

/// Name of the single example group.
pub const EXAMPLE_GROUP: &str = "webservers";

fn example_host_vars() -> HostVars {
    [
        ("ansible_host", "127.0.0.1"),
        ("ansible_port", "22003"),
        (
            "ansible_private_key_file",
            ".vagrant/machines/web-01/virtualbox/private_key",
        ),
        ("bind_address", "localhost"),
        ("bind_port", "5000"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

impl Inventory {
    /// The example inventory: `webservers` containing `web-01`.
    pub fn example() -> Self {
        let mut groups = BTreeMap::new();
        groups.insert(
            EXAMPLE_GROUP.to_string(),
            Group {
                hosts: vec![EXAMPLE_HOST.to_string()],
            },
        );

        let mut hostvars = BTreeMap::new();
        hostvars.insert(EXAMPLE_HOST.to_string(), example_host_vars());

        Self {
            groups,
            meta: Meta { hostvars },
        }
    }

    /// An inventory with no groups and no host variables.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Variables for `host`.
    pub fn host_vars(&self, host: &str) -> Result<&HostVars> {
        self.meta
            .hostvars
            .get(host)
            .ok_or_else(|| AppError::UnknownHost(host.to_string()))
    }
}

/// What the responder was asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// `--list`: the whole inventory.
    List,
    /// `--host NAME`: one host's variables.
    Host(String),
    /// No flag: an empty inventory.
    Empty,
}

impl Query {
    /// Build a query from the two CLI flags. `--list` wins if both are set.
    pub fn from_flags(list: bool, host: Option<String>) -> Self {
        match (list, host) {
            (true, _) => Query::List,
            // An empty name selects no host, like passing no flag at all.
            (false, Some(host)) if host.is_empty() => Query::Empty,
            (false, Some(host)) => Query::Host(host),
            (false, None) => Query::Empty,
        }
    }
}

/// Answer `query` against `inventory` as a JSON line.
pub fn respond(inventory: &Inventory, query: &Query) -> Result<String> {
    let json = match query {
        Query::List => to_json_string(inventory)?,
        Query::Host(host) => to_json_string(inventory.host_vars(host)?)?,
        Query::Empty => to_json_string(&Inventory::empty())?,
    };
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn list_prints_group_then_meta() {
        let json = respond(&Inventory::example(), &Query::List).unwrap();
        assert_eq!(
            json,
            concat!(
                r#"{"webservers": {"hosts": ["web-01"]}, "_meta": {"hostvars": {"web-01": {"#,
                r#""ansible_host": "127.0.0.1", "ansible_port": "22003", "#,
                r#""ansible_private_key_file": ".vagrant/machines/web-01/virtualbox/private_key", "#,
                r#""bind_address": "localhost", "bind_port": "5000"}}}}"#
            )
        );
    }

    #[test]
    fn list_is_stable() {
        let first = respond(&Inventory::example(), &Query::List).unwrap();
        let second = respond(&Inventory::example(), &Query::List).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn host_prints_only_its_vars() {
        let json = respond(&Inventory::example(), &Query::Host("web-01".to_string())).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "ansible_host": "127.0.0.1",
                "ansible_port": "22003",
                "ansible_private_key_file": ".vagrant/machines/web-01/virtualbox/private_key",
                "bind_address": "localhost",
                "bind_port": "5000"
            })
        );
    }

    #[test]
    fn unknown_host_is_an_error() {
        let err = respond(&Inventory::example(), &Query::Host("db-01".to_string())).unwrap_err();
        assert!(matches!(err, AppError::UnknownHost(ref h) if h == "db-01"));
    }

    #[test]
    fn no_flag_prints_empty_inventory() {
        let json = respond(&Inventory::example(), &Query::Empty).unwrap();
        assert_eq!(json, r#"{"_meta": {"hostvars": {}}}"#);
    }

    #[test]
    fn list_flag_takes_precedence() {
        assert_eq!(Query::from_flags(true, Some("web-01".to_string())), Query::List);
        assert_eq!(
            Query::from_flags(false, Some("web-01".to_string())),
            Query::Host("web-01".to_string())
        );
        assert_eq!(Query::from_flags(false, None), Query::Empty);
    }

    #[test]
    fn empty_host_name_is_an_empty_query() {
        let query = Query::from_flags(false, Some(String::new()));
        assert_eq!(query, Query::Empty);
        assert_eq!(respond(&Inventory::example(), &query).unwrap(), r#"{"_meta": {"hostvars": {}}}"#);
    }
}
