//! YAML inventory to Ansible dynamic inventory conversion.
//!
//! Input layout:
//!
//! ```yaml
//! web:
//!   hosts:
//!     - app1
//!     - app2:
//!         role: primary
//!   vars:
//!     - env: prod
//!   children:
//!     - db
//! ```
//!
//! Hosts declared with variables are listed by name in their group and their
//! variables are moved to `_meta.hostvars`, which is the dynamic inventory
//! convention that saves Ansible one `--host` call per host.
use crate::error::{Error, ErrorKind, Result};

use std::collections::BTreeMap;
use std::fs::read_to_string;
use std::path::Path;

use log::{debug, trace, warn};
use serde::Serialize;
use serde_json::{Map, Value, json};
use serde_norway::{Mapping, Value as YamlValue};

/// Reserved top level key holding per host variables.
pub const META_KEY: &str = "_meta";

const HOSTS_KEY: &str = "hosts";
const VARS_KEY: &str = "vars";
const CHILDREN_KEY: &str = "children";

pub type HostVars = Map<String, Value>;

/// One item of a group `hosts` sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEntry {
    /// `- app1`
    Plain(String),
    /// `- app2: {role: primary}`
    WithVars(String, HostVars),
}

impl HostEntry {
    fn decode(group: &str, entry: YamlValue) -> Result<Self> {
        match entry {
            YamlValue::Mapping(mapping) => {
                let (hostname, vars) = single_pair(mapping).ok_or_else(|| {
                    invalid(format!(
                        "group `{group}`: a host with variables must be a mapping with exactly one hostname"
                    ))
                })?;
                let hostname = name_of(&hostname).ok_or_else(|| {
                    invalid(format!("group `{group}`: invalid hostname {hostname:?}"))
                })?;
                if let YamlValue::Mapping(_) = vars
                    && let Value::Object(vars) = to_json(group, vars)?
                {
                    return Ok(HostEntry::WithVars(hostname, vars));
                }
                Err(invalid(format!(
                    "group `{group}`: variables of host `{hostname}` must be a mapping"
                )))
            }
            other => name_of(&other)
                .map(HostEntry::Plain)
                .ok_or_else(|| invalid(format!("group `{group}`: invalid host entry {other:?}"))),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            HostEntry::Plain(name) | HostEntry::WithVars(name, _) => name,
        }
    }
}

/// A group as emitted in the dynamic inventory document.
///
/// Fields are declared in lexicographic order so that serialization keeps
/// keys sorted.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct Group {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hosts: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vars: Option<Map<String, Value>>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Inventory {
    groups: BTreeMap<String, Group>,
    /// `None` until the first host declaring variables.
    hostvars: Option<BTreeMap<String, HostVars>>,
}

impl Inventory {
    pub fn groups(&self) -> &BTreeMap<String, Group> {
        &self.groups
    }

    pub fn hostvars(&self) -> Option<&BTreeMap<String, HostVars>> {
        self.hostvars.as_ref()
    }

    /// Variables of `hostname`, as expected by `--host`. Unknown hosts and
    /// hosts without variables yield an empty object.
    pub fn host(&self, hostname: &str) -> Value {
        self.hostvars
            .as_ref()
            .and_then(|hostvars| hostvars.get(hostname))
            .map(|vars| Value::Object(vars.clone()))
            .unwrap_or_else(|| json!({}))
    }

    fn add_hostvars(&mut self, hostname: &str, vars: HostVars) {
        if let Some(previous) = self
            .hostvars
            .get_or_insert_with(BTreeMap::new)
            .insert(hostname.to_owned(), vars)
        {
            debug!("overwriting variables of host `{hostname}`: {previous:?}");
        }
    }

    fn document(&self) -> Result<BTreeMap<&str, Value>> {
        let mut document = BTreeMap::new();
        for (name, group) in &self.groups {
            document.insert(name.as_str(), serde_json::to_value(group).map_err(json_error)?);
        }
        if let Some(hostvars) = &self.hostvars {
            document.insert(META_KEY, json!({ "hostvars": hostvars }));
        }
        Ok(document)
    }

    pub fn to_json(&self) -> Result<Value> {
        serde_json::to_value(self.document()?).map_err(json_error)
    }

    /// Render the inventory with four spaces indentation and sorted keys.
    pub fn to_pretty_string(&self) -> Result<String> {
        to_pretty_string(&self.document()?)
    }
}

/// JSON rendering shared by `--list` and `--host` output.
pub fn to_pretty_string<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer).map_err(json_error)?;
    String::from_utf8(buf).map_err(|e| Error::new(ErrorKind::InvalidData, e))
}

fn invalid(msg: String) -> Error {
    Error::new(ErrorKind::InvalidData, msg)
}

fn json_error(e: serde_json::Error) -> Error {
    Error::new(ErrorKind::InvalidData, e)
}

fn to_json(group: &str, value: YamlValue) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| invalid(format!("group `{group}`: {e}")))
}

/// Names may be written as YAML numbers or booleans (`- 2024:`, `- 10:`).
fn name_of(value: &YamlValue) -> Option<String> {
    match value {
        YamlValue::String(s) => Some(s.clone()),
        YamlValue::Number(n) => Some(n.to_string()),
        YamlValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn single_pair(mapping: Mapping) -> Option<(YamlValue, YamlValue)> {
    if mapping.len() != 1 {
        return None;
    }
    mapping.into_iter().next()
}

/// Remove `key` from a group definition, treating an explicit null as absent.
fn take_sequence(
    group: &str,
    definition: &mut Mapping,
    key: &str,
) -> Result<Option<Vec<YamlValue>>> {
    match definition.remove(key) {
        None | Some(YamlValue::Null) => Ok(None),
        Some(YamlValue::Sequence(sequence)) => Ok(Some(sequence)),
        Some(other) => Err(invalid(format!(
            "group `{group}`: `{key}` must be a sequence, found {other:?}"
        ))),
    }
}

fn decode_group(inventory: &mut Inventory, name: &str, definition: YamlValue) -> Result<Group> {
    let mut definition = match definition {
        YamlValue::Mapping(mapping) => mapping,
        other => {
            return Err(invalid(format!(
                "group `{name}` must be a mapping, found {other:?}"
            )));
        }
    };
    let mut group = Group::default();

    if let Some(entries) = take_sequence(name, &mut definition, HOSTS_KEY)? {
        let mut hosts = Vec::with_capacity(entries.len());
        for entry in entries {
            let entry = HostEntry::decode(name, entry)?;
            hosts.push(entry.name().to_owned());
            if let HostEntry::WithVars(hostname, vars) = entry {
                inventory.add_hostvars(&hostname, vars);
            }
        }
        group.hosts = Some(hosts);
    }

    if let Some(entries) = take_sequence(name, &mut definition, VARS_KEY)? {
        let mut vars = Map::new();
        for entry in entries {
            let (key, value) = match entry {
                YamlValue::Mapping(mapping) => single_pair(mapping),
                _ => None,
            }
            .ok_or_else(|| {
                invalid(format!(
                    "group `{name}`: each `vars` entry must be a mapping with exactly one key"
                ))
            })?;
            let key = name_of(&key)
                .ok_or_else(|| invalid(format!("group `{name}`: invalid variable name {key:?}")))?;
            vars.insert(key, to_json(name, value)?);
        }
        group.vars = Some(vars);
    }

    if let Some(entries) = take_sequence(name, &mut definition, CHILDREN_KEY)? {
        group.children = Some(
            entries
                .iter()
                .map(|child| {
                    name_of(child).ok_or_else(|| {
                        invalid(format!("group `{name}`: invalid child group {child:?}"))
                    })
                })
                .collect::<Result<Vec<_>>>()?,
        );
    }

    for key in definition.keys() {
        warn!("ignoring unknown key {key:?} in group `{name}`");
    }

    Ok(group)
}

/// Convert an inventory YAML document.
pub fn from_str(content: &str) -> Result<Inventory> {
    let mut document: YamlValue = serde_norway::from_str(content)?;
    // `<<: *anchor` keys
    document.apply_merge()?;
    let groups = match document {
        YamlValue::Null => Mapping::new(),
        YamlValue::Mapping(mapping) => mapping,
        other => {
            return Err(invalid(format!(
                "inventory must be a mapping of groups, found {other:?}"
            )));
        }
    };

    let mut inventory = Inventory::default();
    for (name, definition) in groups {
        let name = name_of(&name).ok_or_else(|| invalid(format!("invalid group name {name:?}")))?;
        if name == META_KEY {
            return Err(invalid(format!("`{META_KEY}` is reserved and cannot name a group")));
        }
        trace!("group `{name}`: {definition:?}");
        let group = decode_group(&mut inventory, &name, definition)?;
        inventory.groups.insert(name, group);
    }
    debug!("parsed {} groups", inventory.groups.len());
    Ok(inventory)
}

/// Read and convert the inventory file at `path`.
pub fn parse(path: &Path) -> Result<Inventory> {
    if !path.is_file() {
        return Err(Error::new(
            ErrorKind::NotFound,
            format!("Inventory file \"{}\" not found", path.display()),
        ));
    }
    trace!("reading inventory from: {path:?}");
    from_str(&read_to_string(path)?)
}
