//! Name to factory registry for transforms.

use super::transform::Transform;
use crate::core::config::ConfigError;
use crate::processors::{
    Bgr2Rgb, CenterCrop, Clip, Convert, Normalize, Padding, Resize, ResizeByLong, ResizeByShort,
    Rgb2Bgr,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Builds a transform from its configuration parameters.
pub type TransformFactory =
    Arc<dyn Fn(&serde_json::Value) -> Result<Box<dyn Transform>, ConfigError> + Send + Sync>;

/// Maps configuration names to transform factories.
///
/// [`TransformRegistry::with_builtins`] knows every transform shipped with the
/// crate; [`register`](TransformRegistry::register) adds custom ones or
/// replaces a built-in.
#[derive(Clone, Default)]
pub struct TransformRegistry {
    factories: HashMap<String, TransformFactory>,
}

impl fmt::Debug for TransformRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformRegistry")
            .field("names", &self.names())
            .finish()
    }
}

fn boxed<T: Transform + 'static>(
    result: Result<T, ConfigError>,
) -> Result<Box<dyn Transform>, ConfigError> {
    result.map(|t| Box::new(t) as Box<dyn Transform>)
}

impl TransformRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in transform.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Resize::NAME, |p| boxed(Resize::from_params(p)));
        registry.register(ResizeByShort::NAME, |p| boxed(ResizeByShort::from_params(p)));
        registry.register(ResizeByLong::NAME, |p| boxed(ResizeByLong::from_params(p)));
        registry.register(Normalize::NAME, |p| boxed(Normalize::from_params(p)));
        registry.register(CenterCrop::NAME, |p| boxed(CenterCrop::from_params(p)));
        registry.register(Padding::NAME, |p| boxed(Padding::from_params(p)));
        registry.register(Clip::NAME, |p| boxed(Clip::from_params(p)));
        registry.register(Convert::NAME, |p| boxed(Convert::from_params(p)));
        registry.register(Bgr2Rgb::NAME, |_| boxed(Ok(Bgr2Rgb)));
        registry.register(Rgb2Bgr::NAME, |_| boxed(Ok(Rgb2Bgr)));
        registry
    }

    /// Registers `factory` under `name`, replacing any previous entry.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&serde_json::Value) -> Result<Box<dyn Transform>, ConfigError>
            + Send
            + Sync
            + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Instantiates the transform registered under `name`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownTransform`] if nothing is registered under
    /// `name`, or the factory's own error for bad parameters.
    pub fn create(
        &self,
        name: &str,
        params: &serde_json::Value,
    ) -> Result<Box<dyn Transform>, ConfigError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| ConfigError::UnknownTransform {
                name: name.to_string(),
            })?;
        factory(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::{ImageProcessError, Mat};
    use serde_json::json;

    #[derive(Debug)]
    struct Invert;

    impl Transform for Invert {
        fn name(&self) -> &str {
            "Invert"
        }

        fn apply(&self, mat: &mut Mat) -> Result<(), ImageProcessError> {
            mat.data_mut().mapv_inplace(|v| 255.0 - v);
            Ok(())
        }
    }

    #[test]
    fn test_builtins_registered() {
        let registry = TransformRegistry::with_builtins();
        for name in [
            "Resize",
            "ResizeByShort",
            "ResizeByLong",
            "Normalize",
            "CenterCrop",
            "Padding",
            "Clip",
            "Convert",
            "BGR2RGB",
            "RGB2BGR",
        ] {
            assert!(registry.contains(name), "{name} missing");
        }
    }

    #[test]
    fn test_unknown_transform() {
        let registry = TransformRegistry::with_builtins();
        let err = registry
            .create("unknown_transform", &serde_json::Value::Null)
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownTransform { ref name } if name == "unknown_transform"));
    }

    #[test]
    fn test_create_passes_params() {
        let registry = TransformRegistry::with_builtins();
        let transform = registry
            .create("Resize", &json!({"width": 8, "height": 8}))
            .unwrap();
        assert_eq!(transform.name(), "Resize");
        assert!(registry.create("Resize", &serde_json::Value::Null).is_err());
    }

    #[test]
    fn test_register_custom() {
        let mut registry = TransformRegistry::new();
        registry.register("Invert", |_| boxed(Ok(Invert)));
        let transform = registry.create("Invert", &serde_json::Value::Null).unwrap();
        let mut mat = Mat::filled(1, 1, 1, 55.0);
        transform.apply(&mut mat).unwrap();
        assert_eq!(mat.data()[[0, 0, 0]], 200.0);
        assert_eq!(registry.names(), vec!["Invert"]);
    }
}
