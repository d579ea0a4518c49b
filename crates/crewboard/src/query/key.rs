use std::fmt;

/// One scoping parameter of a query key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyValue {
    Int(u64),
    Text(String),
    Missing,
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Int(value) => write!(f, "{value}"),
            KeyValue::Text(value) => f.write_str(value),
            KeyValue::Missing => f.write_str("-"),
        }
    }
}

impl From<u64> for KeyValue {
    fn from(value: u64) -> Self {
        KeyValue::Int(value)
    }
}

impl From<u32> for KeyValue {
    fn from(value: u32) -> Self {
        KeyValue::Int(u64::from(value))
    }
}

impl From<&str> for KeyValue {
    fn from(value: &str) -> Self {
        KeyValue::Text(value.to_string())
    }
}

impl From<String> for KeyValue {
    fn from(value: String) -> Self {
        KeyValue::Text(value)
    }
}

impl<T: Into<KeyValue>> From<Option<T>> for KeyValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(KeyValue::Missing, Into::into)
    }
}

/// Logical identity of a cached read: resource name plus every scoping parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    resource: &'static str,
    params: Vec<(&'static str, KeyValue)>,
}

impl QueryKey {
    pub fn new(resource: &'static str) -> Self {
        Self {
            resource,
            params: Vec::new(),
        }
    }

    pub fn with(mut self, name: &'static str, value: impl Into<KeyValue>) -> Self {
        self.params.push((name, value.into()));
        self
    }

    pub fn resource(&self) -> &'static str {
        self.resource
    }

    pub fn param(&self, name: &str) -> Option<&KeyValue> {
        self.params
            .iter()
            .find(|(param, _)| *param == name)
            .map(|(_, value)| value)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.resource)?;
        if self.params.is_empty() {
            return Ok(());
        }
        f.write_str("[")?;
        for (index, (name, value)) in self.params.iter().enumerate() {
            if index > 0 {
                f.write_str(",")?;
            }
            write!(f, "{name}={value}")?;
        }
        f.write_str("]")
    }
}

/// Selects cached keys for invalidation: same resource, and every listed parameter equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyFilter {
    resource: &'static str,
    params: Vec<(&'static str, KeyValue)>,
}

impl KeyFilter {
    pub fn resource(resource: &'static str) -> Self {
        Self {
            resource,
            params: Vec::new(),
        }
    }

    pub fn with(mut self, name: &'static str, value: impl Into<KeyValue>) -> Self {
        self.params.push((name, value.into()));
        self
    }

    pub fn matches(&self, key: &QueryKey) -> bool {
        self.resource == key.resource
            && self
                .params
                .iter()
                .all(|(name, value)| key.param(name) == Some(value))
    }
}

impl From<&QueryKey> for KeyFilter {
    fn from(key: &QueryKey) -> Self {
        Self {
            resource: key.resource,
            params: key.params.clone(),
        }
    }
}
