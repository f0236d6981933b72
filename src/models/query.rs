//! Query descriptors passed to the cluster facade

use std::fmt;

/// Scope of a list/get call: an optional namespace and an optional label selector.
///
/// `namespace == None` means all namespaces for namespaced kinds, and is
/// ignored for cluster-scoped kinds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceQuery {
    pub namespace: Option<String>,
    pub label_selector: Option<String>,
}

impl ResourceQuery {
    /// Every namespace, no selector
    pub fn all() -> Self {
        Self::default()
    }

    pub fn namespaced(namespace: &str) -> Self {
        Self {
            namespace: Some(namespace.to_string()),
            label_selector: None,
        }
    }

    pub fn labels(mut self, selector: &str) -> Self {
        self.label_selector = Some(selector.to_string());
        self
    }

    /// Short description used in log fields
    pub fn scope(&self) -> String {
        let ns = self.namespace.as_deref().unwrap_or("*");
        match &self.label_selector {
            Some(selector) => format!("{ns} [{selector}]"),
            None => ns.to_string(),
        }
    }
}

/// Group-version-resource of a custom resource type, plus its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Gvr {
    pub group: &'static str,
    pub version: &'static str,
    pub kind: &'static str,
    pub plural: &'static str,
}

impl Gvr {
    pub const fn new(
        group: &'static str,
        version: &'static str,
        kind: &'static str,
        plural: &'static str,
    ) -> Self {
        Self {
            group,
            version,
            kind,
            plural,
        }
    }

    /// The same resource at another API version
    pub const fn at_version(self, version: &'static str) -> Self {
        Self { version, ..self }
    }

    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.to_string()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }
}

impl fmt::Display for Gvr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}/{}", self.plural, self.group, self.version)
    }
}
