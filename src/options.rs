use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::consts;

/// Returns whether `name` belongs to the option vocabulary this library
/// tracks (see [`consts::OPTION_NAMES`]).
pub fn is_recognized(name: &str) -> bool {
    consts::OPTION_NAMES.contains(&name)
}

/// Client-side mirror of the camera's option values.
///
/// Filled by merging `camera.getOptions` results. Only recognized option
/// names are kept; whatever else a device reports is dropped silently.
/// The cache gates writes: an option may only be set once the device has
/// reported it here.
#[derive(Debug, Clone, Default)]
pub struct OptionCache {
    values: HashMap<String, Value>,
}

impl OptionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one `getOptions` result into the cache, overwriting values the
    /// device reported again.
    ///
    /// * `options` - The `options` object of a `camera.getOptions` response.
    pub fn merge(&mut self, options: &Map<String, Value>) {
        for (name, value) in options {
            if is_recognized(name) {
                self.values.insert(name.clone(), value.clone());
            }
        }
    }

    /// Returns whether the device has reported `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Current cached value of `name`, if the device has reported it.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Device-advertised choices for `name`, when it was fetched together
    /// with its `...Support` companion.
    pub fn supported_values(&self, name: &str) -> Option<&Vec<Value>> {
        self.values.get(&format!("{name}Support"))?.as_array()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options(body: Value) -> Map<String, Value> {
        body.as_object().unwrap().clone()
    }

    #[test]
    fn merge_keeps_recognized_names_only() {
        let mut cache = OptionCache::new();

        cache.merge(&options(json!({
            "iso": 400,
            "isoSupport": [100, 200, 400, 800],
            "_vendorSecret": true
        })));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("iso"), Some(&json!(400)));
        assert!(cache.contains("isoSupport"));
        assert!(!cache.contains("_vendorSecret"));
    }

    #[test]
    fn merge_overwrites_previous_values() {
        let mut cache = OptionCache::new();

        cache.merge(&options(json!({"iso": 400, "captureMode": "image"})));
        cache.merge(&options(json!({"iso": 800})));

        assert_eq!(cache.get("iso"), Some(&json!(800)));
        assert_eq!(cache.get("captureMode"), Some(&json!("image")));
    }

    #[test]
    fn merge_is_idempotent() {
        let payload = options(json!({"iso": 400, "isoSupport": [100, 200, 400]}));

        let mut once = OptionCache::new();
        once.merge(&payload);

        let mut twice = OptionCache::new();
        twice.merge(&payload);
        twice.merge(&payload);

        assert_eq!(once.len(), twice.len());
        for (name, value) in once.iter() {
            assert_eq!(twice.get(name), Some(value));
        }
    }

    #[test]
    fn supported_values_reads_the_companion_key() {
        let mut cache = OptionCache::new();
        cache.merge(&options(json!({
            "iso": 400,
            "isoSupport": [100, 200, 400],
            "wifiPassword": "secret"
        })));

        let supported = cache.supported_values("iso").unwrap();
        assert_eq!(supported, &vec![json!(100), json!(200), json!(400)]);

        // No companion key was fetched for this one.
        assert_eq!(cache.supported_values("wifiPassword"), None);
    }

    #[test]
    fn recognizes_the_fixed_vocabulary() {
        assert!(is_recognized("iso"));
        assert!(is_recognized("exposureDelaySupport"));
        assert!(is_recognized("wifiPassword"));
        assert!(!is_recognized("iso "));
        assert!(!is_recognized("_bublGreen"));
    }
}
