//! Build target labels.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use thiserror::Error;

use super::DirPath;

/// A unique, stable identifier for a build target: `@repo//package:name`.
///
/// Local labels (targets in this repository) carry no repository. When the
/// target name equals the last package segment the label is displayed in its
/// short form, `//a/b` rather than `//a/b:b`. A package containing `:` is
/// always displayed with its explicit name. Target names never contain `:`,
/// so the name is whatever follows the last `:`.
#[derive(Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Label {
    repo: Option<SmolStr>,
    package: SmolStr,
    name: SmolStr,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LabelParseError {
    #[error("label '{0}' must start with '//' or '@'")]
    MissingRoot(String),
    #[error("label '{0}' has an empty target name")]
    EmptyName(String),
}

impl Label {
    /// Label of the default target for a directory in this repository.
    ///
    /// The repository root has no last segment, so its target is `//:root`.
    /// A `:` in the last segment becomes `_` in the target name.
    pub fn for_dir(dir: &DirPath) -> Self {
        let name = if dir.is_root() { "root" } else { dir.last_segment() };
        Self {
            repo: None,
            package: SmolStr::new(dir.as_str()),
            name: SmolStr::new(name.replace(':', "_")),
        }
    }

    /// Label of `name` in a package of this repository.
    pub fn local(package: &str, name: &str) -> Self {
        Self {
            repo: None,
            package: SmolStr::new(package),
            name: SmolStr::new(name),
        }
    }

    /// Label of a target in another repository, such as `@maven//:artifact`.
    pub fn external(repo: &str, package: &str, name: &str) -> Self {
        Self {
            repo: Some(SmolStr::new(repo)),
            package: SmolStr::new(package),
            name: SmolStr::new(name),
        }
    }

    /// Repository name without the `@`; `None` for local labels.
    pub fn repo(&self) -> Option<&str> {
        self.repo.as_deref()
    }

    /// Package path between `//` and the target name.
    pub fn package(&self) -> &str {
        &self.package
    }

    /// Target name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True when the label has no repository.
    pub fn is_local(&self) -> bool {
        self.repo.is_none()
    }
}

impl fmt::Debug for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Label({})", self)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(repo) = &self.repo {
            write!(f, "@{}", repo)?;
        }
        write!(f, "//{}", self.package)?;
        let last = self.package.rsplit('/').next().unwrap_or("");
        if self.name != last || self.package.contains(':') {
            write!(f, ":{}", self.name)?;
        }
        Ok(())
    }
}

impl FromStr for Label {
    type Err = LabelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (repo, rest) = if let Some(stripped) = s.strip_prefix('@') {
            match stripped.find("//") {
                Some(idx) => (Some(SmolStr::new(&stripped[..idx])), &stripped[idx..]),
                None => return Err(LabelParseError::MissingRoot(s.to_string())),
            }
        } else {
            (None, s)
        };

        let Some(rest) = rest.strip_prefix("//") else {
            return Err(LabelParseError::MissingRoot(s.to_string()));
        };

        let (package, name) = match rest.rsplit_once(':') {
            Some((package, name)) => (package, name),
            None => (rest, rest.rsplit('/').next().unwrap_or("")),
        };
        if name.is_empty() {
            return Err(LabelParseError::EmptyName(s.to_string()));
        }

        Ok(Self {
            repo,
            package: SmolStr::new(package),
            name: SmolStr::new(name),
        })
    }
}

impl TryFrom<String> for Label {
    type Error = LabelParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Label> for String {
    fn from(label: Label) -> Self {
        label.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_for_dir_short_form() {
        let label = Label::for_dir(&DirPath::new("x/y"));
        assert_eq!(label.to_string(), "//x/y");
        assert_eq!(label.name(), "y");
        assert!(label.is_local());
    }

    #[test]
    fn test_label_for_root_dir() {
        let label = Label::for_dir(&DirPath::root());
        assert_eq!(label.to_string(), "//:root");
        assert_eq!("//:root".parse::<Label>().unwrap(), label);
    }

    #[test]
    fn test_label_parse_external() {
        let label: Label = "@maven//:com_external_bar".parse().unwrap();
        assert_eq!(label.repo(), Some("maven"));
        assert_eq!(label.package(), "");
        assert_eq!(label.name(), "com_external_bar");
        assert_eq!(label.to_string(), "@maven//:com_external_bar");
    }

    #[test]
    fn test_label_parse_short_form() {
        let label: Label = "//a/t".parse().unwrap();
        assert_eq!(label, Label::local("a/t", "t"));
    }

    #[test]
    fn test_label_parse_errors() {
        assert!(matches!(
            "a/b:c".parse::<Label>(),
            Err(LabelParseError::MissingRoot(_))
        ));
        assert!(matches!(
            "//a/b:".parse::<Label>(),
            Err(LabelParseError::EmptyName(_))
        ));
    }

    #[test]
    fn test_label_for_dir_with_colon_round_trips() {
        let label = Label::for_dir(&DirPath::new("gen/a:b"));
        assert_eq!(label.name(), "a_b");
        assert_eq!(label.to_string(), "//gen/a:b:a_b");
        assert_eq!(label.to_string().parse::<Label>().unwrap(), label);

        let nested = Label::for_dir(&DirPath::new("gen:x/c"));
        assert_eq!(nested.to_string(), "//gen:x/c:c");
        assert_eq!(nested.to_string().parse::<Label>().unwrap(), nested);
    }

    #[test]
    fn test_label_serde_round_trip_with_colon() {
        let label = Label::for_dir(&DirPath::new("gen/a:b"));
        let json = serde_json::to_string(&label).unwrap();
        let back: Label = serde_json::from_str(&json).unwrap();
        assert_eq!(back, label);
    }
}
