//! Parameter binding: turns command-line tokens or MCP tool arguments into a
//! typed `ParameterSet` for one operation.
//!
//! Binding is strict about names and types (unknown parameters and malformed
//! values are argument errors) and permissive about presence: required
//! parameters are not enforced here, see `shim`.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, FixedOffset};
use serde_json::Value;

use crate::error::ShimError;
use crate::operation::{normalize_name, OperationDescriptor, ParamKind, ParamSpec};

/// Parameters every command accepts, independent of the operation.
pub const COMMON_PARAMS: &[&str] = &[
    "Select",
    "PassThru",
    "Force",
    "NoAutoIteration",
    "Region",
    "ProfileName",
    "EndpointUrl",
];

/// Whether `name` (loosely matched) is one of the common parameters.
pub fn is_common_param(name: &str) -> bool {
    common_param(name).is_some()
}

fn common_param(name: &str) -> Option<&'static str> {
    let wanted = normalize_name(name);
    COMMON_PARAMS
        .iter()
        .copied()
        .find(|p| normalize_name(p) == wanted)
}

/// A typed, bound parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    String(String),
    Integer(i64),
    Boolean(bool),
    StringList(Vec<String>),
    Map(BTreeMap<String, String>),
    Timestamp(DateTime<FixedOffset>),
    Json(Value),
}

impl ParamValue {
    /// Request representation of the value.
    pub fn to_json(&self) -> Value {
        match self {
            ParamValue::String(s) => Value::String(s.clone()),
            ParamValue::Integer(n) => Value::from(*n),
            ParamValue::Boolean(b) => Value::Bool(*b),
            ParamValue::StringList(items) => {
                Value::Array(items.iter().cloned().map(Value::String).collect())
            }
            ParamValue::Map(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect(),
            ),
            ParamValue::Timestamp(ts) => Value::String(ts.to_rfc3339()),
            ParamValue::Json(v) => v.clone(),
        }
    }

    /// Empty string, list, map, or a JSON null.
    pub fn is_empty(&self) -> bool {
        match self {
            ParamValue::String(s) => s.is_empty(),
            ParamValue::StringList(items) => items.is_empty(),
            ParamValue::Map(map) => map.is_empty(),
            ParamValue::Json(v) => v.is_null(),
            ParamValue::Integer(_) | ParamValue::Boolean(_) | ParamValue::Timestamp(_) => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Integer(n) => Some(*n),
            _ => None,
        }
    }
}

/// The operation parameters supplied for one invocation, keyed by canonical
/// parameter name.
///
/// A parameter can be *bound to null* (explicit JSON `null`): it counts as
/// supplied for warning purposes but is never written to the request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    values: BTreeMap<String, ParamValue>,
    null_bound: BTreeSet<String>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ParamValue) {
        let name = name.into();
        self.null_bound.remove(&name);
        self.values.insert(name, value);
    }

    pub fn mark_null(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.values.remove(&name);
        self.null_bound.insert(name);
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn is_null_bound(&self, name: &str) -> bool {
        self.null_bound.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Values of the common parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommonParams {
    pub select: Option<String>,
    pub pass_thru: bool,
    pub force: bool,
    pub no_auto_iteration: bool,
    pub region: Option<String>,
    pub profile_name: Option<String>,
    pub endpoint_url: Option<String>,
}

/// Result of binding: operation parameters plus common parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundArgs {
    pub params: ParameterSet,
    pub common: CommonParams,
}

/// Bind command-line tokens against a descriptor.
///
/// Accepted forms: `-Name value`, `--Name value`, `--name=value`,
/// `-Name:value`, `--kebab-name value`, bare switches (`-Force`), and
/// positional values for parameters that declare a slot. List parameters may
/// repeat and accept comma-separated values.
pub fn bind_tokens(desc: &OperationDescriptor, tokens: &[String]) -> crate::Result<BoundArgs> {
    let arg_err = |msg: String| ShimError::argument(&desc.command, msg);

    let mut common = CommonParams::default();
    // Canonical name -> raw values in the order given
    let mut raw: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut next_slot = 0usize;

    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];
        i += 1;

        if !is_flag(token) {
            let spec = desc.positional(next_slot).ok_or_else(|| {
                arg_err(format!("unexpected positional argument '{}'", token))
            })?;
            next_slot += 1;
            raw.entry(spec.name.clone()).or_default().push(token.clone());
            continue;
        }

        let (name, inline) = split_flag(token);

        if let Some(common_name) = common_param(name) {
            match common_name {
                "PassThru" | "Force" | "NoAutoIteration" => {
                    let value = switch_value(inline, tokens, &mut i)
                        .map_err(|v| arg_err(format!("-{} expects true or false, got '{}'", common_name, v)))?;
                    match common_name {
                        "PassThru" => common.pass_thru = value,
                        "Force" => common.force = value,
                        _ => common.no_auto_iteration = value,
                    }
                }
                _ => {
                    let value = take_value(inline, tokens, &mut i)
                        .ok_or_else(|| arg_err(format!("missing value for -{}", common_name)))?;
                    match common_name {
                        "Select" => common.select = Some(value),
                        "Region" => common.region = Some(value),
                        "ProfileName" => common.profile_name = Some(value),
                        _ => common.endpoint_url = Some(value),
                    }
                }
            }
            continue;
        }

        let spec = desc
            .param(name)
            .ok_or_else(|| arg_err(format!("unknown parameter -{}", name)))?;

        let value = if spec.kind == ParamKind::Boolean {
            let b = switch_value(inline, tokens, &mut i)
                .map_err(|v| arg_err(format!("-{} expects true or false, got '{}'", spec.name, v)))?;
            b.to_string()
        } else {
            take_value(inline, tokens, &mut i)
                .ok_or_else(|| arg_err(format!("missing value for -{}", spec.name)))?
        };
        raw.entry(spec.name.clone()).or_default().push(value);
    }

    let mut params = ParameterSet::new();
    for (name, values) in raw {
        // Names in `raw` come from the descriptor, so the lookup cannot miss
        let Some(spec) = desc.param(&name) else {
            continue;
        };
        let value = convert_strings(spec, &values).map_err(arg_err)?;
        params.insert(spec.name.clone(), value);
    }

    Ok(BoundArgs { params, common })
}

/// Bind MCP tool arguments (a JSON object) against a descriptor.
pub fn bind_json(
    desc: &OperationDescriptor,
    arguments: &serde_json::Map<String, Value>,
) -> crate::Result<BoundArgs> {
    let arg_err = |msg: String| ShimError::argument(&desc.command, msg);

    let mut common = CommonParams::default();
    let mut params = ParameterSet::new();

    for (key, value) in arguments {
        if let Some(common_name) = common_param(key) {
            match common_name {
                "PassThru" | "Force" | "NoAutoIteration" => {
                    let b = json_bool(value)
                        .ok_or_else(|| arg_err(format!("{} must be a boolean", common_name)))?;
                    match common_name {
                        "PassThru" => common.pass_thru = b,
                        "Force" => common.force = b,
                        _ => common.no_auto_iteration = b,
                    }
                }
                _ => {
                    if value.is_null() {
                        continue;
                    }
                    let s = value
                        .as_str()
                        .ok_or_else(|| arg_err(format!("{} must be a string", common_name)))?
                        .to_string();
                    match common_name {
                        "Select" => common.select = Some(s),
                        "Region" => common.region = Some(s),
                        "ProfileName" => common.profile_name = Some(s),
                        _ => common.endpoint_url = Some(s),
                    }
                }
            }
            continue;
        }

        let spec = desc
            .param(key)
            .ok_or_else(|| arg_err(format!("unknown parameter '{}'", key)))?;

        if value.is_null() {
            params.mark_null(spec.name.clone());
            continue;
        }

        let bound = convert_json(spec, value).map_err(arg_err)?;
        params.insert(spec.name.clone(), bound);
    }

    Ok(BoundArgs { params, common })
}

/// A token is a flag when it starts with `-` and is not a negative number.
fn is_flag(token: &str) -> bool {
    let Some(rest) = token.strip_prefix('-') else {
        return false;
    };
    !rest.is_empty() && rest.parse::<f64>().is_err()
}

/// Split `--name=value` / `-Name:value` into the name and an inline value.
fn split_flag(token: &str) -> (&str, Option<&str>) {
    let body = token.trim_start_matches('-');
    match body.find(['=', ':']) {
        Some(pos) => (&body[..pos], Some(&body[pos + 1..])),
        None => (body, None),
    }
}

/// Value for a non-switch flag: inline, else the next token.
fn take_value(inline: Option<&str>, tokens: &[String], i: &mut usize) -> Option<String> {
    if let Some(v) = inline {
        return Some(v.to_string());
    }
    let next = tokens.get(*i)?;
    if is_flag(next) {
        return None;
    }
    *i += 1;
    Some(next.clone())
}

/// Value for a switch: inline, an explicit following `true`/`false`, or `true`.
fn switch_value(inline: Option<&str>, tokens: &[String], i: &mut usize) -> Result<bool, String> {
    if let Some(v) = inline {
        return parse_bool(v).ok_or_else(|| v.to_string());
    }
    if let Some(next) = tokens.get(*i) {
        if let Some(b) = parse_bool(next) {
            *i += 1;
            return Ok(b);
        }
    }
    Ok(true)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().trim_start_matches('$') {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

fn json_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => parse_bool(s),
        Value::Null => Some(false),
        _ => None,
    }
}

fn single<'a>(spec: &ParamSpec, values: &'a [String]) -> Result<&'a str, String> {
    match values {
        [one] => Ok(one),
        _ => Err(format!("-{} specified more than once", spec.name)),
    }
}

/// Convert raw command-line strings into the parameter's kind.
fn convert_strings(spec: &ParamSpec, values: &[String]) -> Result<ParamValue, String> {
    match spec.kind {
        ParamKind::StringList => Ok(ParamValue::StringList(
            values
                .iter()
                .flat_map(|v| v.split(','))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
        )),
        ParamKind::Map => {
            let mut map = BTreeMap::new();
            for pair in values.iter().flat_map(|v| v.split(',')) {
                let pair = pair.trim();
                if pair.is_empty() {
                    continue;
                }
                let (k, v) = pair
                    .split_once('=')
                    .ok_or_else(|| format!("-{} expects key=value pairs, got '{}'", spec.name, pair))?;
                map.insert(k.trim().to_string(), v.trim().to_string());
            }
            Ok(ParamValue::Map(map))
        }
        _ => {
            let raw = single(spec, values)?;
            convert_scalar(spec, raw)
        }
    }
}

fn convert_scalar(spec: &ParamSpec, raw: &str) -> Result<ParamValue, String> {
    match spec.kind {
        ParamKind::String => Ok(ParamValue::String(raw.to_string())),
        ParamKind::Integer => raw
            .trim()
            .parse::<i64>()
            .map(ParamValue::Integer)
            .map_err(|_| format!("-{} expects an integer, got '{}'", spec.name, raw)),
        ParamKind::Boolean => parse_bool(raw)
            .map(ParamValue::Boolean)
            .ok_or_else(|| format!("-{} expects true or false, got '{}'", spec.name, raw)),
        ParamKind::Timestamp => DateTime::parse_from_rfc3339(raw.trim())
            .map(ParamValue::Timestamp)
            .map_err(|e| format!("-{} expects an RFC 3339 timestamp: {}", spec.name, e)),
        ParamKind::Json => serde_json::from_str(raw)
            .map(ParamValue::Json)
            .map_err(|e| format!("-{} expects a JSON document: {}", spec.name, e)),
        ParamKind::StringList => Ok(ParamValue::StringList(vec![raw.to_string()])),
        ParamKind::Map => convert_strings(spec, &[raw.to_string()]),
    }
}

/// Convert a JSON argument into the parameter's kind.
fn convert_json(spec: &ParamSpec, value: &Value) -> Result<ParamValue, String> {
    let type_err = |expected: &str| format!("{} must be {}, got {}", spec.name, expected, value);

    match spec.kind {
        ParamKind::String => match value {
            Value::String(s) => Ok(ParamValue::String(s.clone())),
            _ => Err(type_err("a string")),
        },
        ParamKind::Integer => match value {
            Value::Number(n) => n.as_i64().map(ParamValue::Integer).ok_or_else(|| type_err("an integer")),
            Value::String(s) => convert_scalar(spec, s),
            _ => Err(type_err("an integer")),
        },
        ParamKind::Boolean => json_bool(value)
            .map(ParamValue::Boolean)
            .ok_or_else(|| type_err("a boolean")),
        ParamKind::StringList => match value {
            Value::String(s) => Ok(ParamValue::StringList(vec![s.clone()])),
            Value::Array(items) => items
                .iter()
                .map(|v| v.as_str().map(String::from).ok_or_else(|| type_err("a list of strings")))
                .collect::<Result<Vec<_>, _>>()
                .map(ParamValue::StringList),
            _ => Err(type_err("a list of strings")),
        },
        ParamKind::Map => match value {
            Value::Object(obj) => obj
                .iter()
                .map(|(k, v)| {
                    v.as_str()
                        .map(|s| (k.clone(), s.to_string()))
                        .ok_or_else(|| type_err("an object of strings"))
                })
                .collect::<Result<BTreeMap<_, _>, _>>()
                .map(ParamValue::Map),
            _ => Err(type_err("an object of strings")),
        },
        ParamKind::Timestamp => match value {
            Value::String(s) => convert_scalar(spec, s),
            _ => Err(type_err("an RFC 3339 timestamp string")),
        },
        ParamKind::Json => Ok(ParamValue::Json(value.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::catalog::{get_catalog, ServiceCatalog};

    fn descriptor(command: &str) -> OperationDescriptor {
        let ram = get_catalog("ram").unwrap();
        let incidents = get_catalog("ssm-incidents").unwrap();
        ram.operations()
            .into_iter()
            .chain(incidents.operations())
            .find(|d| d.command == command)
            .unwrap()
    }

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_flag_forms() {
        let desc = descriptor("Get-RAMResourceShare");
        for form in [
            tokens(&["-ResourceOwner", "SELF"]),
            tokens(&["--resource-owner", "SELF"]),
            tokens(&["--resource-owner=SELF"]),
            tokens(&["-ResourceOwner:SELF"]),
            tokens(&["SELF"]),
        ] {
            let bound = bind_tokens(&desc, &form).unwrap();
            assert_eq!(
                bound.params.get("ResourceOwner"),
                Some(&ParamValue::String("SELF".to_string())),
                "form {:?}",
                form
            );
        }
    }

    #[test]
    fn test_inline_value_keeps_colons() {
        let desc = descriptor("Remove-RAMResourceShare");
        let arn = "arn:aws:ram:us-east-1:123456789012:resource-share/abc";
        let bound = bind_tokens(&desc, &tokens(&[&format!("-ResourceShareArn:{}", arn)])).unwrap();
        assert_eq!(bound.params.get("ResourceShareArn").unwrap().as_str(), Some(arn));
    }

    #[test]
    fn test_list_repeat_and_comma() {
        let desc = descriptor("Get-RAMResourceShare");
        let bound = bind_tokens(
            &desc,
            &tokens(&["-ResourceShareArn", "a,b", "-ResourceShareArn", "c"]),
        )
        .unwrap();
        assert_eq!(
            bound.params.get("ResourceShareArn"),
            Some(&ParamValue::StringList(vec![
                "a".to_string(),
                "b".to_string(),
                "c".to_string()
            ]))
        );
    }

    #[test]
    fn test_integer_and_negative_values() {
        let desc = descriptor("Update-SSMIIncidentRecord");
        let bound = bind_tokens(&desc, &tokens(&["arn:x", "-Impact", "-3"])).unwrap();
        assert_eq!(bound.params.get("Impact"), Some(&ParamValue::Integer(-3)));

        let err = bind_tokens(&desc, &tokens(&["arn:x", "-Impact", "high"])).unwrap_err();
        assert!(matches!(err, ShimError::Argument(_, ref msg) if msg.contains("integer")));
    }

    #[test]
    fn test_boolean_switch_forms() {
        let desc = descriptor("Update-SSMIDeletionProtection");
        let bound = bind_tokens(&desc, &tokens(&["arn:x", "-DeletionProtected"])).unwrap();
        assert_eq!(bound.params.get("DeletionProtected"), Some(&ParamValue::Boolean(true)));

        let bound = bind_tokens(&desc, &tokens(&["arn:x", "-DeletionProtected:false"])).unwrap();
        assert_eq!(bound.params.get("DeletionProtected"), Some(&ParamValue::Boolean(false)));

        let bound = bind_tokens(&desc, &tokens(&["-DeletionProtected", "false", "arn:x"])).unwrap();
        assert_eq!(bound.params.get("DeletionProtected"), Some(&ParamValue::Boolean(false)));
        assert_eq!(bound.params.get("Arn").unwrap().as_str(), Some("arn:x"));
    }

    #[test]
    fn test_map_and_timestamp_and_json() {
        let desc = descriptor("New-SSMIReplicationSet");
        let bound = bind_tokens(
            &desc,
            &tokens(&[
                "-RegionMap",
                r#"{"us-east-1": {}}"#,
                "-Tag",
                "team=ops,env=prod",
            ]),
        )
        .unwrap();
        assert_eq!(
            bound.params.get("RegionMap").unwrap().to_json(),
            serde_json::json!({"us-east-1": {}})
        );
        assert_eq!(
            bound.params.get("Tag").unwrap().to_json(),
            serde_json::json!({"team": "ops", "env": "prod"})
        );

        let desc = descriptor("New-SSMITimelineEvent");
        let bound = bind_tokens(
            &desc,
            &tokens(&["arn:x", "-EventTime", "2024-05-01T10:00:00Z"]),
        )
        .unwrap();
        assert_eq!(
            bound.params.get("EventTime").unwrap().to_json(),
            serde_json::json!("2024-05-01T10:00:00+00:00")
        );

        let err = bind_tokens(&desc, &tokens(&["arn:x", "-EventTime", "yesterday"])).unwrap_err();
        assert!(matches!(err, ShimError::Argument(_, ref msg) if msg.contains("RFC 3339")));
    }

    #[test]
    fn test_common_params() {
        let desc = descriptor("Remove-RAMResourceShare");
        let bound = bind_tokens(
            &desc,
            &tokens(&[
                "arn:share",
                "-Force",
                "-Select",
                "^ResourceShareArn",
                "-Region",
                "eu-west-1",
                "--profile-name",
                "ops",
                "-EndpointUrl=http://localhost:4566",
            ]),
        )
        .unwrap();
        assert!(bound.common.force);
        assert!(!bound.common.pass_thru);
        assert_eq!(bound.common.select.as_deref(), Some("^ResourceShareArn"));
        assert_eq!(bound.common.region.as_deref(), Some("eu-west-1"));
        assert_eq!(bound.common.profile_name.as_deref(), Some("ops"));
        assert_eq!(bound.common.endpoint_url.as_deref(), Some("http://localhost:4566"));
        assert_eq!(bound.params.len(), 1);
    }

    #[test]
    fn test_unknown_parameter_rejected() {
        let desc = descriptor("Get-RAMResourceShare");
        let err = bind_tokens(&desc, &tokens(&["-Bogus", "x"])).unwrap_err();
        assert!(matches!(err, ShimError::Argument(_, ref msg) if msg.contains("unknown parameter")));
    }

    #[test]
    fn test_extra_positional_rejected() {
        let desc = descriptor("Get-RAMResourceShare");
        let err = bind_tokens(&desc, &tokens(&["SELF", "extra"])).unwrap_err();
        assert!(matches!(err, ShimError::Argument(_, ref msg) if msg.contains("positional")));
    }

    #[test]
    fn test_missing_value_rejected() {
        let desc = descriptor("Get-RAMResourceShare");
        let err = bind_tokens(&desc, &tokens(&["-ResourceOwner"])).unwrap_err();
        assert!(matches!(err, ShimError::Argument(_, ref msg) if msg.contains("missing value")));
    }

    #[test]
    fn test_scalar_repeat_rejected() {
        let desc = descriptor("Get-RAMResourceShare");
        let err = bind_tokens(&desc, &tokens(&["-Name", "a", "-Name", "b"])).unwrap_err();
        assert!(matches!(err, ShimError::Argument(_, ref msg) if msg.contains("more than once")));
    }

    #[test]
    fn test_bind_json() {
        let desc = descriptor("Get-RAMResourceShare");
        let args = serde_json::json!({
            "ResourceOwner": "SELF",
            "resourceShareArn": ["a", "b"],
            "MaxResult": 5,
            "Name": null,
            "NoAutoIteration": true,
            "Select": "*"
        });
        let bound = bind_json(&desc, args.as_object().unwrap()).unwrap();
        assert_eq!(bound.params.get("ResourceOwner").unwrap().as_str(), Some("SELF"));
        assert_eq!(bound.params.get("MaxResult"), Some(&ParamValue::Integer(5)));
        assert!(bound.params.is_null_bound("Name"));
        assert!(!bound.params.contains("Name"));
        assert!(bound.common.no_auto_iteration);
        assert_eq!(bound.common.select.as_deref(), Some("*"));
    }

    #[test]
    fn test_bind_json_type_mismatch() {
        let desc = descriptor("Get-RAMResourceShare");
        let args = serde_json::json!({ "MaxResult": "lots" });
        let err = bind_json(&desc, args.as_object().unwrap()).unwrap_err();
        assert!(matches!(err, ShimError::Argument(_, ref msg) if msg.contains("integer")));
    }

    #[test]
    fn test_is_common_param() {
        assert!(is_common_param("Force"));
        assert!(is_common_param("no-auto-iteration"));
        assert!(is_common_param("endpoint_url"));
        assert!(!is_common_param("ResourceOwner"));
    }

    #[test]
    fn test_value_emptiness() {
        assert!(ParamValue::String(String::new()).is_empty());
        assert!(ParamValue::StringList(vec![]).is_empty());
        assert!(ParamValue::Json(Value::Null).is_empty());
        assert!(!ParamValue::Integer(0).is_empty());
        assert!(!ParamValue::Boolean(false).is_empty());
    }
}
