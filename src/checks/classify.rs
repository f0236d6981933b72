//! Resource identification: explicit labels first, name substrings as fallback
//!
//! Within one listing, items whose purpose label carries the wanted value
//! win. Only when no item in the listing is labeled that way does the
//! substring table apply, and then to every item regardless of the labels
//! it carries.

use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use strum::Display;

use crate::models::ReplicaStatus;

/// What a secret, config map or service account is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Purpose {
    #[strum(serialize = "admin-credentials")]
    AdminCredentials,
    #[strum(serialize = "metadata-store")]
    MetadataStore,
    #[strum(serialize = "streaming")]
    Streaming,
    #[strum(serialize = "leader-election")]
    LeaderElection,
}

/// Fallback heuristics: lowercase name substring to purpose
pub const NAME_HEURISTICS: &[(&str, Purpose)] = &[
    ("admin", Purpose::AdminCredentials),
    ("metadata", Purpose::MetadataStore),
    ("rds", Purpose::MetadataStore),
    ("postgres", Purpose::MetadataStore),
    ("msk", Purpose::Streaming),
    ("kafka", Purpose::Streaming),
    ("leaderelection", Purpose::LeaderElection),
];

#[derive(Debug, Clone)]
pub struct Classifier {
    label_key: String,
}

impl Classifier {
    pub fn new(label_key: impl Into<String>) -> Self {
        Self {
            label_key: label_key.into(),
        }
    }

    fn label_is(&self, labels: Option<&BTreeMap<String, String>>, values: &[&str]) -> bool {
        labels
            .and_then(|l| l.get(&self.label_key))
            .is_some_and(|value| values.contains(&value.as_str()))
    }

    /// Label matches across the listing, or name matches when there are none
    fn pick<'a, T>(
        &self,
        items: impl IntoIterator<Item = &'a T>,
        parts: impl Fn(&T) -> (&str, Option<&BTreeMap<String, String>>),
        values: &[&str],
        needles: &[&str],
    ) -> Vec<&'a T>
    where
        T: 'a,
    {
        let items: Vec<&T> = items.into_iter().collect();
        let labeled: Vec<&T> = items
            .iter()
            .copied()
            .filter(|item| self.label_is(parts(*item).1, values))
            .collect();
        if !labeled.is_empty() {
            return labeled;
        }

        items
            .into_iter()
            .filter(|item| {
                let name = parts(*item).0.to_lowercase();
                needles.iter().any(|needle| name.contains(needle))
            })
            .collect()
    }

    /// Resources serving `purpose`
    pub fn with_purpose<'a>(
        &self,
        metas: impl IntoIterator<Item = &'a ObjectMeta>,
        purpose: Purpose,
    ) -> Vec<&'a ObjectMeta> {
        let value = purpose.to_string();
        let needles: Vec<&str> = NAME_HEURISTICS
            .iter()
            .filter(|(_, p)| *p == purpose)
            .map(|(needle, _)| *needle)
            .collect();
        self.pick(metas, meta_parts, &[value.as_str()], &needles)
    }

    /// Does a lone resource serve `purpose`?
    pub fn has_purpose(&self, meta: &ObjectMeta, purpose: Purpose) -> bool {
        !self.with_purpose([meta], purpose).is_empty()
    }

    /// Resources that are the named component; `aliases` are alternative spellings
    pub fn components<'a>(
        &self,
        metas: impl IntoIterator<Item = &'a ObjectMeta>,
        aliases: &[&str],
    ) -> Vec<&'a ObjectMeta> {
        self.pick(metas, meta_parts, aliases, aliases)
    }

    /// The workload labeled as `component`, otherwise the first whose name contains it
    pub fn select_component<'a>(
        &self,
        items: &'a [ReplicaStatus],
        component: &str,
    ) -> Option<&'a ReplicaStatus> {
        self.pick(items, replica_parts, &[component], &[component])
            .first()
            .copied()
    }
}

fn meta_parts(meta: &ObjectMeta) -> (&str, Option<&BTreeMap<String, String>>) {
    (meta.name.as_deref().unwrap_or_default(), meta.labels.as_ref())
}

fn replica_parts(status: &ReplicaStatus) -> (&str, Option<&BTreeMap<String, String>>) {
    (status.name.as_str(), Some(&status.labels))
}
