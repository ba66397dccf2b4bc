//! Fully-qualified type names.

use std::fmt;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// A fully-qualified type name such as `com.example.Foo`.
///
/// The package is everything before the last `.`; a name without a dot lives
/// in the default (empty) package.
#[derive(Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct TypeName {
    package: SmolStr,
    name: SmolStr,
}

impl TypeName {
    /// Split a qualified name at its last `.`; surrounding whitespace is trimmed.
    pub fn new(qualified: &str) -> Self {
        let qualified = qualified.trim();
        match qualified.rfind('.') {
            Some(idx) => Self {
                package: SmolStr::new(&qualified[..idx]),
                name: SmolStr::new(&qualified[idx + 1..]),
            },
            None => Self {
                package: SmolStr::default(),
                name: SmolStr::new(qualified),
            },
        }
    }

    /// Build from a package and a simple name.
    pub fn from_parts(package: &str, name: &str) -> Self {
        Self {
            package: SmolStr::new(package),
            name: SmolStr::new(name),
        }
    }

    /// The package part (`com.example` for `com.example.Foo`).
    pub fn package(&self) -> &str {
        &self.package
    }

    /// The simple name (`Foo` for `com.example.Foo`).
    pub fn simple_name(&self) -> &str {
        &self.name
    }

    /// Check whether this type lives in `prefix` or one of its subpackages.
    ///
    /// A prefix ending in `.` matches by string prefix on the qualified name,
    /// otherwise the prefix must match whole package segments.
    pub fn in_package(&self, prefix: &str) -> bool {
        if prefix.is_empty() {
            return true;
        }
        if prefix.ends_with('.') {
            return self.to_string().starts_with(prefix);
        }
        self.package == prefix
            || (self.package.starts_with(prefix)
                && self.package.as_bytes().get(prefix.len()) == Some(&b'.'))
    }
}

impl fmt::Debug for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeName({})", self)
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.package.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}.{}", self.package, self.name)
        }
    }
}

impl From<&str> for TypeName {
    fn from(qualified: &str) -> Self {
        Self::new(qualified)
    }
}

impl From<String> for TypeName {
    fn from(qualified: String) -> Self {
        Self::new(&qualified)
    }
}

impl From<TypeName> for String {
    fn from(ty: TypeName) -> Self {
        ty.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_name_split() {
        let ty = TypeName::new("com.example.Foo");
        assert_eq!(ty.package(), "com.example");
        assert_eq!(ty.simple_name(), "Foo");
        assert_eq!(ty.to_string(), "com.example.Foo");
    }

    #[test]
    fn test_type_name_default_package() {
        let ty = TypeName::new("Foo");
        assert_eq!(ty.package(), "");
        assert_eq!(ty.to_string(), "Foo");
    }

    #[test]
    fn test_in_package_segments() {
        let ty = TypeName::new("javax.annotation.Nullable");
        assert!(ty.in_package("javax"));
        assert!(ty.in_package("javax.annotation"));
        assert!(!ty.in_package("java"));
        assert!(!ty.in_package("javax.annot"));
    }

    #[test]
    fn test_in_package_dotted_prefix() {
        let ty = TypeName::new("java.util.List");
        assert!(ty.in_package("java."));
        assert!(!TypeName::new("javax.inject.Inject").in_package("java."));
    }
}
