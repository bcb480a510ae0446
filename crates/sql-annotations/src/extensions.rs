use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::{ConfigError, Merge};

/// Namespace of the extensions object holding planner directives.
pub const PLANNER_NAMESPACE: &str = "Planner";

/// Namespaced metadata of a type or a field.
///
/// The [PLANNER_NAMESPACE] entry is typed as `D`, every other namespace is kept as opaque
/// data for other consumers of the schema.
#[derive(Clone, Debug, PartialEq)]
pub struct Extensions<D> {
    pub planner: Option<D>,
    pub namespaces: Map<String, Value>,
}

impl<D> Default for Extensions<D> {
    fn default() -> Self {
        Extensions {
            planner: None,
            namespaces: Map::new(),
        }
    }
}

impl<D> Extensions<D> {
    pub fn with_planner(planner: D) -> Self {
        Extensions {
            planner: Some(planner),
            namespaces: Map::new(),
        }
    }

    pub fn namespace(&self, namespace: &str) -> Option<&Value> {
        self.namespaces.get(namespace)
    }

    pub fn is_empty(&self) -> bool {
        self.planner.is_none() && self.namespaces.is_empty()
    }

    /// Extensions attached by the schema builder. They only ever land in the opaque
    /// namespaces, even under [PLANNER_NAMESPACE].
    pub(crate) fn seeded(namespaces: &Map<String, Value>) -> Self {
        Extensions {
            planner: None,
            namespaces: namespaces.clone(),
        }
    }
}

impl<D: DeserializeOwned + Merge> Extensions<D> {
    /// Adds a namespace. A [PLANNER_NAMESPACE] value is parsed into `D` and merged into the
    /// planner directives, exactly as when the extensions are deserialized.
    pub fn with_namespace(mut self, namespace: impl Into<String>, value: Value) -> Result<Self, ConfigError> {
        let namespace = namespace.into();
        if namespace != PLANNER_NAMESPACE {
            self.namespaces.insert(namespace, value);
            return Ok(self);
        }

        let planner = serde_json::from_value::<D>(value).map_err(ConfigError::Planner)?;
        match &mut self.planner {
            Some(current) => current.merge(&planner),
            None => self.planner = Some(planner),
        }
        Ok(self)
    }
}

impl<D: Merge + Clone> Merge for Extensions<D> {
    fn merge(&mut self, other: &Self) {
        match (&mut self.planner, &other.planner) {
            (Some(current), Some(incoming)) => current.merge(incoming),
            (None, Some(incoming)) => self.planner = Some(incoming.clone()),
            (_, None) => (),
        }

        for (namespace, incoming) in &other.namespaces {
            match (self.namespaces.get_mut(namespace), incoming) {
                (Some(Value::Object(current)), Value::Object(incoming)) => {
                    for (key, value) in incoming {
                        current.insert(key.clone(), value.clone());
                    }
                }
                _ => {
                    self.namespaces.insert(namespace.clone(), incoming.clone());
                }
            }
        }
    }
}

impl<'de, D: DeserializeOwned> Deserialize<'de> for Extensions<D> {
    fn deserialize<De>(deserializer: De) -> Result<Self, De::Error>
    where
        De: Deserializer<'de>,
    {
        let mut namespaces = Map::<String, Value>::deserialize(deserializer)?;

        let planner = namespaces
            .remove(PLANNER_NAMESPACE)
            .map(serde_json::from_value::<D>)
            .transpose()
            .map_err(|err| serde::de::Error::custom(format!("Invalid {PLANNER_NAMESPACE} extension: {err}")))?;

        Ok(Extensions { planner, namespaces })
    }
}
