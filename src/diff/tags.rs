//! Tag-set diffing and provider-managed tags.

use std::collections::BTreeMap;

use crate::crd::Tag;

pub const TAG_MANAGED_BY: &str = "managed-by";
pub const TAG_PROVIDER_KIND: &str = "provider-kind";
pub const TAG_EXTERNAL_NAME: &str = "external-name";

/// Tags to add and keys to remove to turn the observed set into the desired one
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagDiff {
    pub add: BTreeMap<String, String>,
    pub remove: Vec<String>,
}

impl TagDiff {
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }
}

/// Key-keyed, case-sensitive diff. A changed value is an add; AWS overwrites
/// the existing value for the key.
pub fn diff_tags(
    desired: &BTreeMap<String, String>,
    observed: &BTreeMap<String, String>,
) -> TagDiff {
    let add = desired
        .iter()
        .filter(|(k, v)| observed.get(*k) != Some(*v))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    let remove = observed
        .keys()
        .filter(|k| !desired.contains_key(*k))
        .cloned()
        .collect();
    TagDiff { add, remove }
}

pub fn tag_map(tags: &[Tag]) -> BTreeMap<String, String> {
    tags.iter()
        .map(|t| (t.key.clone(), t.value.clone()))
        .collect()
}

/// Tags the provider stamps on every resource it manages.
pub fn provider_tags(
    provider_name: &str,
    kind: &str,
    external_name: &str,
) -> BTreeMap<String, String> {
    BTreeMap::from([
        (TAG_MANAGED_BY.to_string(), provider_name.to_string()),
        (TAG_PROVIDER_KIND.to_string(), kind.to_string()),
        (TAG_EXTERNAL_NAME.to_string(), external_name.to_string()),
    ])
}

/// Merge provider-managed tags into a user tag list. Managed keys win over
/// user values. Returns whether the list changed.
pub fn merge_provider_tags(tags: &mut Vec<Tag>, managed: &BTreeMap<String, String>) -> bool {
    let mut changed = false;
    for (key, value) in managed {
        match tags.iter_mut().find(|t| &t.key == key) {
            Some(existing) if &existing.value == value => {}
            Some(existing) => {
                existing.value.clone_from(value);
                changed = true;
            }
            None => {
                tags.push(Tag::new(key.clone(), value.clone()));
                changed = true;
            }
        }
    }
    changed
}
