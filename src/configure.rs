//! Typed configuration hooks for tag helpers.
//!
//! Hosts keep tag helpers behind `dyn TagHelper` while configuration code is written against the
//! concrete helper type. [`ConfigureTagHelper`] bridges the two: it checks the helper's concrete
//! type at the call boundary and only then hands it to the typed action.

use std::any::Any;
use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;

/// Access to the concrete type behind a trait object.
pub trait AsAny: Any {
    /// Borrow as [`Any`].
    fn as_any(&self) -> &dyn Any;

    /// Borrow mutably as [`Any`].
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Name of the concrete type, used in error messages.
    fn type_name(&self) -> &'static str;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Component that renders or rewrites a single element in a view.
pub trait TagHelper: AsAny + Send {
    /// Element name the helper targets, such as `script` or `link`.
    fn target_element(&self) -> &str;
}

/// Rendering context handed to configuration actions.
#[derive(Debug, Clone, Default)]
pub struct ViewContext {
    /// Path of the view being rendered.
    pub view_path: String,
    /// Arbitrary view data keyed by name.
    pub view_data: Map<String, Value>,
}

impl ViewContext {
    /// Create a context for the view at `view_path`.
    pub fn new(view_path: impl Into<String>) -> Self {
        Self {
            view_path: view_path.into(),
            view_data: Map::new(),
        }
    }

    /// Attach a view data entry.
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.view_data.insert(key.into(), value.into());
        self
    }

    /// Look up a view data entry.
    pub fn data(&self, key: &str) -> Option<&Value> {
        self.view_data.get(key)
    }
}

/// Errors raised while configuring a tag helper.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigureError {
    /// The helper passed in is not the type the configurator was built for.
    #[error("invalid argument `{parameter}`: expected tag helper `{expected}`, found `{actual}`")]
    HelperTypeMismatch {
        /// Name of the offending parameter.
        parameter: &'static str,
        /// Type the configurator accepts.
        expected: &'static str,
        /// Type that was supplied.
        actual: &'static str,
    },
}

/// Object-safe view of a configurator so different helper types can share one registry.
pub trait TagHelperConfigurator: Send + Sync {
    /// Returns `true` when this configurator accepts `helper`.
    fn applies_to(&self, helper: &dyn TagHelper) -> bool;

    /// Configure `helper` for the view described by `context`.
    fn configure(
        &self,
        helper: &mut dyn TagHelper,
        context: &ViewContext,
    ) -> Result<(), ConfigureError>;
}

type ConfigureAction<T> = Box<dyn Fn(&mut T, &ViewContext) + Send + Sync>;

/// Applies a typed action to tag helpers of type `T`.
pub struct ConfigureTagHelper<T> {
    action: ConfigureAction<T>,
}

impl<T: TagHelper> ConfigureTagHelper<T> {
    /// Wrap `action` as a configurator for `T`.
    pub fn new<F>(action: F) -> Self
    where
        F: Fn(&mut T, &ViewContext) + Send + Sync + 'static,
    {
        Self {
            action: Box::new(action),
        }
    }

    /// Run the action on a helper whose type is already known.
    pub fn configure_typed(&self, helper: &mut T, context: &ViewContext) {
        (self.action)(helper, context);
    }
}

impl<T: TagHelper> TagHelperConfigurator for ConfigureTagHelper<T> {
    fn applies_to(&self, helper: &dyn TagHelper) -> bool {
        helper.as_any().is::<T>()
    }

    fn configure(
        &self,
        helper: &mut dyn TagHelper,
        context: &ViewContext,
    ) -> Result<(), ConfigureError> {
        let actual = (*helper).type_name();
        let Some(helper) = helper.as_any_mut().downcast_mut::<T>() else {
            return Err(ConfigureError::HelperTypeMismatch {
                parameter: "helper",
                expected: std::any::type_name::<T>(),
                actual,
            });
        };

        (self.action)(helper, context);
        Ok(())
    }
}

impl<T> fmt::Debug for ConfigureTagHelper<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigureTagHelper")
            .field("helper", &std::any::type_name::<T>())
            .finish()
    }
}

/// Run every configurator that accepts `helper`, in order.
///
/// Returns how many configurators were applied.
pub fn configure_tag_helper(
    configurators: &[Box<dyn TagHelperConfigurator>],
    helper: &mut dyn TagHelper,
    context: &ViewContext,
) -> Result<usize, ConfigureError> {
    let mut applied = 0;
    for configurator in configurators {
        if !configurator.applies_to(helper) {
            continue;
        }
        configurator.configure(helper, context)?;
        applied += 1;
    }

    tracing::trace!(
        helper = (*helper).type_name(),
        view = %context.view_path,
        applied,
        "configured tag helper"
    );
    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct ScriptHelper {
        src: String,
        defer: bool,
    }

    impl TagHelper for ScriptHelper {
        fn target_element(&self) -> &str {
            "script"
        }
    }

    #[derive(Debug, Default)]
    struct LinkHelper {
        href: String,
    }

    impl TagHelper for LinkHelper {
        fn target_element(&self) -> &str {
            "link"
        }
    }

    #[test]
    fn configures_matching_helper() {
        let configurator =
            ConfigureTagHelper::new(|helper: &mut ScriptHelper, context: &ViewContext| {
                helper.defer = true;
                if let Some(src) = context.data("bundle").and_then(Value::as_str) {
                    helper.src = src.to_string();
                }
            });
        let context =
            ViewContext::new("/Views/Home/Index.cshtml").with_data("bundle", "/js/site.js");

        let mut helper = ScriptHelper::default();
        configurator.configure(&mut helper, &context).unwrap();

        assert!(helper.defer);
        assert_eq!(helper.src, "/js/site.js");
    }

    #[test]
    fn rejects_mismatched_helper_before_running_action() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let configurator = ConfigureTagHelper::new(move |_: &mut ScriptHelper, _: &ViewContext| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let mut helper = LinkHelper::default();
        let err = configurator
            .configure(&mut helper, &ViewContext::default())
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        let ConfigureError::HelperTypeMismatch {
            parameter,
            expected,
            actual,
        } = err;
        assert_eq!(parameter, "helper");
        assert!(expected.ends_with("ScriptHelper"));
        assert!(actual.ends_with("LinkHelper"));
        assert!(helper.href.is_empty());
    }

    #[test]
    fn error_message_names_the_parameter() {
        let err = ConfigureError::HelperTypeMismatch {
            parameter: "helper",
            expected: "Script",
            actual: "Link",
        };
        assert_eq!(
            err.to_string(),
            "invalid argument `helper`: expected tag helper `Script`, found `Link`"
        );
    }

    #[test]
    fn typed_configuration_skips_the_check() {
        let configurator = ConfigureTagHelper::new(|helper: &mut LinkHelper, _: &ViewContext| {
            helper.href = "/a.css".into();
        });
        let mut helper = LinkHelper::default();
        configurator.configure_typed(&mut helper, &ViewContext::default());
        assert_eq!(helper.href, "/a.css");
    }

    #[test]
    fn registry_only_applies_matching_configurators() {
        let configurators: Vec<Box<dyn TagHelperConfigurator>> = vec![
            Box::new(ConfigureTagHelper::new(|helper: &mut ScriptHelper, _: &ViewContext| {
                helper.defer = true;
            })),
            Box::new(ConfigureTagHelper::new(|helper: &mut LinkHelper, _: &ViewContext| {
                helper.href = "/css/site.css".into();
            })),
            Box::new(ConfigureTagHelper::new(|helper: &mut ScriptHelper, _: &ViewContext| {
                helper.src = "/js/site.js".into();
            })),
        ];

        let mut script = ScriptHelper::default();
        let applied =
            configure_tag_helper(&configurators, &mut script, &ViewContext::default()).unwrap();

        assert_eq!(applied, 2);
        assert!(script.defer);
        assert_eq!(script.src, "/js/site.js");
        assert_eq!(script.target_element(), "script");
    }
}
