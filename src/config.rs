//! Engine configuration.
//!
//! [`Config`] holds the knobs the engine reads. Values come from defaults,
//! from a serialized document, or from build-file directives applied through
//! a [`Configurer`]; the configurer and the resolver are separate
//! capabilities and the engine only ever sees the finished `Config`.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::base::{Label, TypeName};
use crate::error::ConfigError;
use crate::resolve::RetryPolicy;

/// Package prefixes provided by the JDK; never resolved to a target.
pub const DEFAULT_EXCLUDED_PREFIXES: [&str; 4] =
    ["java.", "javax.annotation.processing.", "jdk.", "sun."];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Worker threads for a run; 0 uses one per CPU.
    pub workers: usize,
    /// Attempts per collaborator call, including the first.
    pub max_attempts: u32,
    /// Timeout handed to each collaborator call, in milliseconds.
    pub call_timeout_ms: u64,
    /// Type-name prefixes that are skipped during resolution.
    pub excluded_prefixes: Vec<String>,
    /// Runtime dependencies added to every test rule.
    pub test_runtime_deps: Vec<Label>,
    /// Where the package cache is persisted between runs.
    pub cache_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workers: 0,
            max_attempts: 3,
            call_timeout_ms: 30_000,
            excluded_prefixes: DEFAULT_EXCLUDED_PREFIXES.iter().map(|s| s.to_string()).collect(),
            test_runtime_deps: Vec::new(),
            cache_file: None,
        }
    }
}

impl Config {
    /// Timeout applied to each collaborator call.
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    /// Retry policy for collaborator calls.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, self.call_timeout())
    }

    /// Whether references to `ty` are skipped.
    pub fn is_excluded(&self, ty: &TypeName) -> bool {
        self.excluded_prefixes.iter().any(|prefix| ty.in_package(prefix))
    }

    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::InvalidValue {
            key: "config".into(),
            value: json.chars().take(40).collect(),
            reason: e.to_string(),
        })
    }
}

// ============================================================================
// DIRECTIVES
// ============================================================================

/// Applies `key value` directives to a [`Config`].
pub trait Configurer {
    /// Directive keys this configurer understands.
    fn known_directives(&self) -> &'static [&'static str];

    fn configure(&self, config: &mut Config, key: &str, value: &str) -> Result<(), ConfigError>;
}

/// The directives understood by the resolution engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveConfigurer;

const DIRECTIVES: &[&str] = &[
    "java_resolve_workers",
    "java_resolve_max_attempts",
    "java_resolve_timeout_ms",
    "java_exclude_package",
    "java_test_runtime_dep",
    "java_package_cache",
];

impl Configurer for ResolveConfigurer {
    fn known_directives(&self) -> &'static [&'static str] {
        DIRECTIVES
    }

    fn configure(&self, config: &mut Config, key: &str, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        let invalid = |reason: &str| ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        };

        match key {
            "java_resolve_workers" => {
                config.workers = value.parse().map_err(|_| invalid("expected a number"))?;
            }
            "java_resolve_max_attempts" => {
                let attempts: u32 = value.parse().map_err(|_| invalid("expected a number"))?;
                if attempts == 0 {
                    return Err(invalid("must be at least 1"));
                }
                config.max_attempts = attempts;
            }
            "java_resolve_timeout_ms" => {
                config.call_timeout_ms = value
                    .parse()
                    .map_err(|_| invalid("expected milliseconds"))?;
            }
            "java_exclude_package" => {
                if value.is_empty() {
                    return Err(invalid("expected a package prefix"));
                }
                if !config.excluded_prefixes.iter().any(|p| p == value) {
                    config.excluded_prefixes.push(value.to_string());
                }
            }
            "java_test_runtime_dep" => {
                let label: Label = value.parse().map_err(|e| invalid(&format!("{e}")))?;
                if !config.test_runtime_deps.contains(&label) {
                    config.test_runtime_deps.push(label);
                }
            }
            "java_package_cache" => {
                config.cache_file = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }
            _ => return Err(ConfigError::UnknownDirective(key.to_string())),
        }
        Ok(())
    }
}

/// Split a `# gazelle:key value` comment into key and value.
pub fn parse_directive(line: &str) -> Option<(&str, &str)> {
    let rest = line.trim().strip_prefix('#')?.trim_start();
    let rest = rest.strip_prefix("gazelle:")?;
    match rest.split_once(char::is_whitespace) {
        Some((key, value)) => Some((key, value.trim())),
        None if !rest.is_empty() => Some((rest, "")),
        None => None,
    }
}

/// Apply every directive found in `text` (one per line).
///
/// Lines that are not directives are ignored; directives meant for other
/// configurers are ignored too, so build files can mix them freely.
pub fn apply_directives(
    configurer: &dyn Configurer,
    config: &mut Config,
    text: &str,
) -> Result<usize, ConfigError> {
    let mut applied = 0;
    for (key, value) in text.lines().filter_map(parse_directive) {
        if configurer.known_directives().contains(&key) {
            configurer.configure(config, key, value)?;
            applied += 1;
        }
    }
    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.retry_policy().timeout, Duration::from_secs(30));
        assert!(config.is_excluded(&TypeName::new("java.util.List")));
        assert!(!config.is_excluded(&TypeName::new("javax.inject.Inject")));
    }

    #[test]
    fn test_parse_directive() {
        assert_eq!(
            parse_directive("# gazelle:java_resolve_workers 4"),
            Some(("java_resolve_workers", "4"))
        );
        assert_eq!(parse_directive("#gazelle:java_package_cache"), Some(("java_package_cache", "")));
        assert_eq!(parse_directive("java_library(name = \"x\")"), None);
        assert_eq!(parse_directive("# just a comment"), None);
    }

    #[test]
    fn test_apply_directives() {
        let text = "\
# gazelle:java_resolve_workers 8
# gazelle:java_exclude_package com.google.auto.
# gazelle:java_test_runtime_dep @maven//:org_junit_platform_junit_platform_launcher
# gazelle:go_prefix example.com/ignored
java_library(name = \"lib\")
";
        let mut config = Config::default();
        let applied = apply_directives(&ResolveConfigurer, &mut config, text).unwrap();

        assert_eq!(applied, 3);
        assert_eq!(config.workers, 8);
        assert!(config.is_excluded(&TypeName::new("com.google.auto.value.AutoValue")));
        assert_eq!(
            config.test_runtime_deps,
            vec![Label::external("maven", "", "org_junit_platform_junit_platform_launcher")]
        );
    }

    #[test]
    fn test_invalid_directive_values() {
        let mut config = Config::default();
        let configurer = ResolveConfigurer;

        assert!(matches!(
            configurer.configure(&mut config, "java_resolve_max_attempts", "0"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            configurer.configure(&mut config, "java_resolve_timeout_ms", "soon"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            configurer.configure(&mut config, "java_test_runtime_dep", "not-a-label"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert_eq!(
            configurer.configure(&mut config, "java_nope", "1"),
            Err(ConfigError::UnknownDirective("java_nope".into()))
        );
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_config_from_json() {
        let config = Config::from_json(r#"{"workers": 2, "test_runtime_deps": ["//testing/junit"]}"#)
            .unwrap();
        assert_eq!(config.workers, 2);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.test_runtime_deps, vec![Label::local("testing/junit", "junit")]);

        assert!(Config::from_json(r#"{"wrokers": 2}"#).is_err());
    }
}
