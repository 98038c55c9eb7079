use serde::{Deserialize, Serialize};

/// A dimension name. A dimension may be unnamed, which is serialised as `null`.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug, Default)]
#[serde(transparent)]
pub struct DimensionName(Option<String>);

impl DimensionName {
    /// Create a new dimension with `name`. Use [`default`](DimensionName::default) to create a dimension with no name.
    #[must_use]
    pub fn new<T: Into<String>>(name: T) -> Self {
        Self(Some(name.into()))
    }

    /// Get the dimension name as a [`&str`]. Returns [`None`] if the dimension has no name.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl From<&str> for DimensionName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<Option<&str>> for DimensionName {
    fn from(name: Option<&str>) -> Self {
        Self(name.map(str::to_string))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_name() {
        let x: DimensionName = "x".into();
        assert_eq!(x.as_str(), Some("x"));
        assert!(DimensionName::default().as_str().is_none());
        assert_eq!(DimensionName::from(None), DimensionName::default());
    }

    #[test]
    fn dimension_names_json() {
        let names = vec![DimensionName::new("x"), DimensionName::default()];
        assert_eq!(serde_json::to_string(&names).unwrap(), r#"["x",null]"#);
        let names: Vec<DimensionName> = serde_json::from_str(r#"[null,"y"]"#).unwrap();
        assert_eq!(names[1].as_str(), Some("y"));
    }
}
