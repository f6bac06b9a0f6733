use std::collections::BTreeMap;

/// Static identity of the instrumentation producing telemetry.
///
/// Set once when the pipeline is constructed and attached uniformly to every
/// outgoing record and span. `extra` carries additional constant pairs such
/// as `service.name` and `service.instance.id`.
#[derive(Debug, Clone)]
pub struct ScopeMetadata {
    pub name: String,
    pub version: String,
    pub extra: BTreeMap<String, String>,
}

impl ScopeMetadata {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        ScopeMetadata {
            name: name.into(),
            version: version.into(),
            extra: BTreeMap::new(),
        }
    }

    /// Add a constant key/value pair attached to every record.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Logical service name, if one was attached via `service.name`.
    pub fn service_name(&self) -> Option<&str> {
        self.extra.get("service.name").map(String::as_str)
    }
}

impl Default for ScopeMetadata {
    fn default() -> Self {
        ScopeMetadata::new("unknown", "0.0.0")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_attribute_accumulates_pairs() {
        let scope = ScopeMetadata::new("lib", "1.2.3")
            .with_attribute("service.name", "shoppingcart")
            .with_attribute("service.instance.id", "instance-12");

        assert_eq!(scope.service_name(), Some("shoppingcart"));
        assert_eq!(
            scope.extra.get("service.instance.id").map(String::as_str),
            Some("instance-12")
        );
    }
}
