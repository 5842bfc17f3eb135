//! Annotation and finalizer bookkeeping on managed objects.

use chrono::{DateTime, SecondsFormat, Utc};
use kube::Resource;

use crate::constants::{
    ANNOTATION_EXTERNAL_CREATE_FAILED, ANNOTATION_EXTERNAL_CREATE_PENDING,
    ANNOTATION_EXTERNAL_CREATE_SUCCEEDED, ANNOTATION_EXTERNAL_NAME, FINALIZER,
};

fn annotation<'a, R: Resource>(obj: &'a R, key: &str) -> Option<&'a str> {
    obj.meta()
        .annotations
        .as_ref()?
        .get(key)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
}

fn set_annotation<R: Resource>(obj: &mut R, key: &str, value: String) {
    obj.meta_mut()
        .annotations
        .get_or_insert_with(Default::default)
        .insert(key.to_string(), value);
}

pub fn external_name<R: Resource>(obj: &R) -> Option<&str> {
    annotation(obj, ANNOTATION_EXTERNAL_NAME)
}

/// External name, falling back to the object name.
pub fn external_name_or_name<R: Resource>(obj: &R) -> String {
    external_name(obj)
        .map(str::to_string)
        .or_else(|| obj.meta().name.clone())
        .unwrap_or_default()
}

pub fn set_external_name<R: Resource>(obj: &mut R, name: impl Into<String>) {
    set_annotation(obj, ANNOTATION_EXTERNAL_NAME, name.into());
}

/// Default the external name to the object name. Returns whether it was set.
pub fn init_external_name<R: Resource>(obj: &mut R) -> bool {
    if external_name(obj).is_some() {
        return false;
    }
    match obj.meta().name.clone() {
        Some(name) => {
            set_external_name(obj, name);
            true
        }
        None => false,
    }
}

pub fn is_deleting<R: Resource>(obj: &R) -> bool {
    obj.meta().deletion_timestamp.is_some()
}

pub fn has_finalizer<R: Resource>(obj: &R) -> bool {
    obj.meta()
        .finalizers
        .as_ref()
        .is_some_and(|f| f.iter().any(|x| x == FINALIZER))
}

/// Returns whether the finalizer was added.
pub fn add_finalizer<R: Resource>(obj: &mut R) -> bool {
    if has_finalizer(obj) {
        return false;
    }
    obj.meta_mut()
        .finalizers
        .get_or_insert_with(Vec::new)
        .push(FINALIZER.to_string());
    true
}

/// Returns whether the finalizer was removed.
pub fn remove_finalizer<R: Resource>(obj: &mut R) -> bool {
    let Some(finalizers) = obj.meta_mut().finalizers.as_mut() else {
        return false;
    };
    let before = finalizers.len();
    finalizers.retain(|f| f != FINALIZER);
    before != finalizers.len()
}

fn timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn annotation_time<R: Resource>(obj: &R, key: &str) -> Option<DateTime<Utc>> {
    annotation(obj, key)
        .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
        .map(|t| t.with_timezone(&Utc))
}

pub fn set_create_pending<R: Resource>(obj: &mut R, now: DateTime<Utc>) {
    set_annotation(obj, ANNOTATION_EXTERNAL_CREATE_PENDING, timestamp(now));
}

pub fn set_create_succeeded<R: Resource>(obj: &mut R, now: DateTime<Utc>) {
    set_annotation(obj, ANNOTATION_EXTERNAL_CREATE_SUCCEEDED, timestamp(now));
}

pub fn set_create_failed<R: Resource>(obj: &mut R, now: DateTime<Utc>) {
    set_annotation(obj, ANNOTATION_EXTERNAL_CREATE_FAILED, timestamp(now));
}

/// A create was started but neither its success nor its failure was
/// recorded afterwards, so the AWS resource may exist under an unknown name.
pub fn create_incomplete<R: Resource>(obj: &R) -> bool {
    let Some(pending) = annotation_time(obj, ANNOTATION_EXTERNAL_CREATE_PENDING) else {
        return false;
    };
    let settled = |key: &str| annotation_time(obj, key).is_some_and(|t| t >= pending);
    !settled(ANNOTATION_EXTERNAL_CREATE_SUCCEEDED) && !settled(ANNOTATION_EXTERNAL_CREATE_FAILED)
}

/// UID of the object's controller owner.
pub fn controller_uid<R: Resource>(obj: &R) -> Option<&str> {
    obj.meta()
        .owner_references
        .as_ref()?
        .iter()
        .find(|r| r.controller == Some(true))
        .map(|r| r.uid.as_str())
}
