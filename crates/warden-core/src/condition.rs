//! # Condition system
//!
//! Conditions are named runtime predicates that further restrict when a
//! policy applies. Each policy carries a map from a caller-chosen context key
//! (e.g. `"clientIP"`) to a condition; during evaluation the condition is
//! asked whether the context value under that key fulfills it.
//!
//! Conditions are polymorphic and must survive serialization round-trips
//! without losing their concrete type, so the persisted form always carries
//! the condition's name as a discriminator:
//!
//! ```json
//! {
//!   "clientIP": { "type": "CIDRCondition", "options": { "cidr": "127.0.0.1/32" } },
//!   "owner":    { "type": "EqualsSubjectCondition" }
//! }
//! ```
//!
//! [`ConditionRegistry`] maps discriminators back to constructors. The four
//! built-in variants are pre-registered on [`ConditionRegistry::default`];
//! callers extending the system register their own factory before
//! deserializing any persisted policy that references it:
//!
//! ```
//! use warden_core::condition::{Condition, ConditionRegistry, DefinedCondition};
//!
//! let mut registry = ConditionRegistry::default();
//! registry.register("AlwaysTrueCondition", |_| Ok(Box::new(DefinedCondition)));
//! assert!(registry.is_registered("AlwaysTrueCondition"));
//! ```

use crate::error::{PolicyError, Result};
use crate::request::Request;
use ipnetwork::IpNetwork;
use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;

/// A runtime predicate evaluated against a request's context.
///
/// Implementations must be pure: `fulfills` may not mutate the request, the
/// condition, or any shared state. `value` is the context entry under the
/// condition's key; `None` means the key is absent from the context, which is
/// distinct from a present-but-null value.
pub trait Condition: fmt::Debug + Send + Sync {
    /// Stable name, used as a label and as the serialization discriminator
    fn name(&self) -> &'static str;

    /// True iff the context value satisfies this condition for the request
    fn fulfills(&self, value: Option<&Value>, request: &Request) -> bool;

    /// Configuration payload serialized under `"options"`.
    /// Variants without configuration return `None` and omit the field.
    fn options(&self) -> Option<Value> {
        None
    }

    /// Clone into a new boxed condition
    fn clone_box(&self) -> Box<dyn Condition>;
}

impl Clone for Box<dyn Condition> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

// =============================================================================
// Built-in conditions
// =============================================================================

/// Fulfilled iff the context value is present and non-null, whatever its type
#[derive(Debug, Clone, Copy, Default)]
pub struct DefinedCondition;

impl Condition for DefinedCondition {
    fn name(&self) -> &'static str {
        "DefinedCondition"
    }

    fn fulfills(&self, value: Option<&Value>, _request: &Request) -> bool {
        value.is_some_and(|v| !v.is_null())
    }

    fn clone_box(&self) -> Box<dyn Condition> {
        Box::new(*self)
    }
}

/// Fulfilled iff the context value is a string equal to the configured target
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StringEqualCondition {
    /// The string the context value must equal
    pub equals: String,
}

impl StringEqualCondition {
    /// Create a condition requiring equality with `equals`
    #[must_use]
    pub fn new(equals: impl Into<String>) -> Self {
        Self {
            equals: equals.into(),
        }
    }
}

impl Condition for StringEqualCondition {
    fn name(&self) -> &'static str {
        "StringEqualCondition"
    }

    fn fulfills(&self, value: Option<&Value>, _request: &Request) -> bool {
        value.and_then(Value::as_str) == Some(self.equals.as_str())
    }

    fn options(&self) -> Option<Value> {
        serde_json::to_value(self).ok()
    }

    fn clone_box(&self) -> Box<dyn Condition> {
        Box::new(self.clone())
    }
}

/// Fulfilled iff the context value is a string equal to the request's subject
#[derive(Debug, Clone, Copy, Default)]
pub struct EqualsSubjectCondition;

impl Condition for EqualsSubjectCondition {
    fn name(&self) -> &'static str {
        "EqualsSubjectCondition"
    }

    fn fulfills(&self, value: Option<&Value>, request: &Request) -> bool {
        value.and_then(Value::as_str) == Some(request.subject.as_str())
    }

    fn clone_box(&self) -> Box<dyn Condition> {
        Box::new(*self)
    }
}

/// Fulfilled iff the context value parses as an IP address (v4 or v6)
/// contained in the configured CIDR block.
///
/// Unparseable values, out-of-range addresses, and an unparseable configured
/// CIDR all yield `false`, never an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CidrCondition {
    /// CIDR block in standard notation, e.g. `"127.0.0.1/32"` or `"::1/128"`
    pub cidr: String,
}

impl CidrCondition {
    /// Create a condition requiring containment in `cidr`
    #[must_use]
    pub fn new(cidr: impl Into<String>) -> Self {
        Self { cidr: cidr.into() }
    }
}

impl Condition for CidrCondition {
    fn name(&self) -> &'static str {
        "CIDRCondition"
    }

    fn fulfills(&self, value: Option<&Value>, _request: &Request) -> bool {
        let Some(ip) = value
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<IpAddr>().ok())
        else {
            return false;
        };

        self.cidr
            .parse::<IpNetwork>()
            .map(|network| network.contains(ip))
            .unwrap_or(false)
    }

    fn options(&self) -> Option<Value> {
        serde_json::to_value(self).ok()
    }

    fn clone_box(&self) -> Box<dyn Condition> {
        Box::new(self.clone())
    }
}

// =============================================================================
// Conditions collection
// =============================================================================

/// Map from context key to the condition that key must fulfill.
///
/// Keys are unique and order-irrelevant (`BTreeMap` keeps serialization
/// deterministic). All entries must be fulfilled for a policy to match.
#[derive(Debug, Clone, Default)]
pub struct Conditions(BTreeMap<String, Box<dyn Condition>>);

impl Conditions {
    /// Create an empty collection
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a condition under a context key, replacing any previous entry
    pub fn insert(&mut self, key: impl Into<String>, condition: Box<dyn Condition>) {
        self.0.insert(key.into(), condition);
    }

    /// Look up the condition for a context key
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&dyn Condition> {
        self.0.get(key).map(AsRef::as_ref)
    }

    /// Iterate over (context key, condition) entries
    pub fn iter(&self) -> impl Iterator<Item = (&str, &dyn Condition)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    /// Number of conditions
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True iff no conditions are declared
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Box<dyn Condition>)> for Conditions {
    fn from_iter<T: IntoIterator<Item = (K, Box<dyn Condition>)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v))
                .collect(),
        )
    }
}

/// Serialized form of one condition entry: discriminator plus options
#[derive(Debug, Serialize, Deserialize)]
struct RawCondition {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    options: Option<Value>,
}

impl Serialize for Conditions {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, condition) in &self.0 {
            map.serialize_entry(
                key,
                &RawCondition {
                    kind: condition.name().to_string(),
                    options: condition.options(),
                },
            )?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Conditions {
    /// Deserializes against the built-in condition set.
    ///
    /// Custom variants need a registry-aware path; see
    /// [`ConditionRegistry::deserialize_conditions`] and
    /// [`Policy::from_json_with`](crate::Policy::from_json_with).
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = BTreeMap::<String, RawCondition>::deserialize(deserializer)?;
        ConditionRegistry::default()
            .construct_all(raw)
            .map_err(D::Error::custom)
    }
}

// =============================================================================
// Condition registry
// =============================================================================

/// Factory producing a condition from its serialized `options` payload.
/// `None` means the entry carried no options object.
pub type ConditionFactory = fn(Option<&Value>) -> Result<Box<dyn Condition>>;

/// Explicit name-to-constructor mapping used to rebuild conditions from
/// their serialized form.
///
/// Deliberately not a hidden process-global: callers own the registry and
/// its lifetime. An unknown discriminator fails the whole collection's
/// deserialization.
#[derive(Debug, Clone)]
pub struct ConditionRegistry {
    factories: BTreeMap<String, ConditionFactory>,
}

impl Default for ConditionRegistry {
    /// Registry with the four built-in condition types registered
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register("DefinedCondition", |_| Ok(Box::new(DefinedCondition)));
        registry.register("EqualsSubjectCondition", |_| {
            Ok(Box::new(EqualsSubjectCondition))
        });
        registry.register("StringEqualCondition", |options| {
            Ok(Box::new(from_options::<StringEqualCondition>(options)?))
        });
        registry.register("CIDRCondition", |options| {
            Ok(Box::new(from_options::<CidrCondition>(options)?))
        });
        registry
    }
}

impl ConditionRegistry {
    /// Create an empty registry (no built-ins)
    #[must_use]
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Register a factory for a condition type name.
    ///
    /// Returns the previous factory if the name was already registered.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        factory: ConditionFactory,
    ) -> Option<ConditionFactory> {
        self.factories.insert(name.into(), factory)
    }

    /// True iff a factory is registered under `name`
    #[must_use]
    pub fn is_registered(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Construct a condition from its discriminator and options payload
    pub fn construct(&self, name: &str, options: Option<&Value>) -> Result<Box<dyn Condition>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| PolicyError::UnknownConditionType(name.to_string()))?;
        factory(options)
    }

    /// Deserialize a conditions map (`key -> {type, options}`) through this
    /// registry. Fails on the first unknown type or unparseable options.
    pub fn deserialize_conditions(&self, value: &Value) -> Result<Conditions> {
        let raw: BTreeMap<String, RawCondition> = serde_json::from_value(value.clone())?;
        self.construct_all(raw)
    }

    fn construct_all(&self, raw: BTreeMap<String, RawCondition>) -> Result<Conditions> {
        let mut conditions = Conditions::new();
        for (key, entry) in raw {
            let condition = self.construct(&entry.kind, entry.options.as_ref())?;
            conditions.insert(key, condition);
        }
        Ok(conditions)
    }
}

/// Deserialize a condition's configuration, defaulting when options are omitted
fn from_options<C: Default + serde::de::DeserializeOwned>(options: Option<&Value>) -> Result<C> {
    match options {
        Some(value) => Ok(serde_json::from_value(value.clone())?),
        None => Ok(C::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request_with(key: &str, value: Value) -> Request {
        Request::new("peter", "delete", "myrn:res:1").with_context(key, value)
    }

    #[test]
    fn test_defined_condition() {
        let condition = DefinedCondition;
        let request = Request::default();

        assert!(condition.fulfills(Some(&json!("anything")), &request));
        assert!(condition.fulfills(Some(&json!(0)), &request));
        assert!(condition.fulfills(Some(&json!(false)), &request));
        assert!(!condition.fulfills(Some(&Value::Null), &request));
        assert!(!condition.fulfills(None, &request));
    }

    #[test]
    fn test_string_equal_condition() {
        let condition = StringEqualCondition::new("admin");
        let request = Request::default();

        assert!(condition.fulfills(Some(&json!("admin")), &request));
        assert!(!condition.fulfills(Some(&json!("user")), &request));
        assert!(!condition.fulfills(Some(&json!("Admin")), &request));
        // Non-string values never equal a string target
        assert!(!condition.fulfills(Some(&json!(42)), &request));
        assert!(!condition.fulfills(None, &request));
    }

    #[test]
    fn test_equals_subject_condition() {
        let condition = EqualsSubjectCondition;
        let request = request_with("owner", json!("peter"));

        assert!(condition.fulfills(Some(&json!("peter")), &request));
        assert!(!condition.fulfills(Some(&json!("zac")), &request));
        assert!(!condition.fulfills(None, &request));
    }

    #[test]
    fn test_cidr_condition_v4() {
        let condition = CidrCondition::new("127.0.0.1/32");
        let request = Request::default();

        assert!(condition.fulfills(Some(&json!("127.0.0.1")), &request));
        assert!(!condition.fulfills(Some(&json!("127.0.0.2")), &request));
        assert!(!condition.fulfills(Some(&json!("0.0.0.0")), &request));

        let subnet = CidrCondition::new("192.168.1.0/24");
        assert!(subnet.fulfills(Some(&json!("192.168.1.100")), &request));
        assert!(!subnet.fulfills(Some(&json!("192.168.2.1")), &request));
    }

    #[test]
    fn test_cidr_condition_v6() {
        let condition = CidrCondition::new("::1/128");
        let request = Request::default();

        assert!(condition.fulfills(Some(&json!("::1")), &request));
        assert!(!condition.fulfills(Some(&json!("::2")), &request));
    }

    #[test]
    fn test_cidr_condition_never_errors() {
        let request = Request::default();

        // Unparseable value
        let condition = CidrCondition::new("127.0.0.1/32");
        assert!(!condition.fulfills(Some(&json!("not-an-ip")), &request));
        assert!(!condition.fulfills(Some(&json!(123)), &request));
        assert!(!condition.fulfills(None, &request));

        // Unparseable configured CIDR
        let broken = CidrCondition::new("not-a-cidr");
        assert!(!broken.fulfills(Some(&json!("127.0.0.1")), &request));
    }

    #[test]
    fn test_registry_constructs_builtins() {
        let registry = ConditionRegistry::default();

        let condition = registry
            .construct("CIDRCondition", Some(&json!({"cidr": "10.0.0.0/8"})))
            .unwrap();
        assert_eq!(condition.name(), "CIDRCondition");

        let condition = registry.construct("DefinedCondition", None).unwrap();
        assert_eq!(condition.name(), "DefinedCondition");
    }

    #[test]
    fn test_registry_rejects_unknown_type() {
        let registry = ConditionRegistry::default();
        let err = registry.construct("NoSuchCondition", None).unwrap_err();
        assert!(matches!(err, PolicyError::UnknownConditionType(name) if name == "NoSuchCondition"));
    }

    #[test]
    fn test_registry_rejects_bad_options() {
        let registry = ConditionRegistry::default();
        let err = registry
            .construct("CIDRCondition", Some(&json!({"cidr": ["not", "a", "string"]})))
            .unwrap_err();
        assert!(matches!(err, PolicyError::Serialization(_)));
    }

    #[test]
    fn test_conditions_serialize_with_discriminator() {
        let mut conditions = Conditions::new();
        conditions.insert("clientIP", Box::new(CidrCondition::new("127.0.0.1/32")));
        conditions.insert("owner", Box::new(EqualsSubjectCondition));

        let value = serde_json::to_value(&conditions).unwrap();
        assert_eq!(
            value,
            json!({
                "clientIP": {"type": "CIDRCondition", "options": {"cidr": "127.0.0.1/32"}},
                "owner": {"type": "EqualsSubjectCondition"}
            })
        );
    }

    #[test]
    fn test_conditions_deserialize_builtins() {
        let json = r#"{
            "owner": {"type": "EqualsSubjectCondition"},
            "clientIP": {"type": "CIDRCondition", "options": {"cidr": "127.0.0.1/0"}},
            "user": {"type": "DefinedCondition"},
            "role": {"type": "StringEqualCondition", "options": {"equals": "admin"}}
        }"#;

        let conditions: Conditions = serde_json::from_str(json).unwrap();
        assert_eq!(conditions.len(), 4);
        assert_eq!(conditions.get("owner").unwrap().name(), "EqualsSubjectCondition");
        assert_eq!(conditions.get("clientIP").unwrap().name(), "CIDRCondition");
        assert_eq!(conditions.get("user").unwrap().name(), "DefinedCondition");
        assert_eq!(conditions.get("role").unwrap().name(), "StringEqualCondition");
    }

    #[test]
    fn test_unknown_discriminator_fails_whole_collection() {
        let json = r#"{
            "user": {"type": "DefinedCondition"},
            "custom": {"type": "UnregisteredCondition"}
        }"#;

        assert!(serde_json::from_str::<Conditions>(json).is_err());
    }

    #[test]
    fn test_custom_condition_via_registry() {
        #[derive(Debug, Clone, Copy, Default)]
        struct NeverCondition;

        impl Condition for NeverCondition {
            fn name(&self) -> &'static str {
                "NeverCondition"
            }
            fn fulfills(&self, _: Option<&Value>, _: &Request) -> bool {
                false
            }
            fn clone_box(&self) -> Box<dyn Condition> {
                Box::new(*self)
            }
        }

        let mut registry = ConditionRegistry::default();
        registry.register("NeverCondition", |_| Ok(Box::new(NeverCondition)));

        let conditions = registry
            .deserialize_conditions(&json!({"x": {"type": "NeverCondition"}}))
            .unwrap();
        assert_eq!(conditions.get("x").unwrap().name(), "NeverCondition");
    }
}
