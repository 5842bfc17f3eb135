//! # Reference Resolver
//!
//! Turns `<field>Ref`, `<field>Refs` and `<field>Selector` into AWS
//! identifiers before a resource is observed, and writes the resolved value
//! back into the literal field.
//!
//! A `Ref` is re-resolved on every pass. A selector only runs while the
//! literal is empty, so the first object it picks stays selected. Referenced
//! objects must be `Ready=True` and carry a value.

mod dynamic;
pub mod targets;

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::debug;

use crate::crd::{Reference, Selector};

pub use dynamic::KubeReferenceReader;
pub use targets::Target;

/// How a value is read from a referenced object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extractor {
    /// The `aws.microscaler.io/external-name` annotation
    ExternalName,
    /// A dotted path under `status.atProvider`, e.g. `arn`
    AtProviderField(&'static str),
}

/// A referenceable object as seen by the resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidate {
    pub name: String,
    pub ready: bool,
    /// Value extracted with the target's [`Extractor`]
    pub value: Option<String>,
    /// UID of the object's controller owner
    pub controller_uid: Option<String>,
}

#[derive(Error, Debug)]
pub enum ReferenceError {
    #[error("referenced {kind} {name} not found")]
    NotFound { kind: &'static str, name: String },
    #[error("referenced {kind} {name} is not ready")]
    NotReady { kind: &'static str, name: String },
    #[error("referenced {kind} {name} has no value yet")]
    NoValue { kind: &'static str, name: String },
    #[error("no ready {kind} matches the selector")]
    NoMatch { kind: &'static str },
    #[error("cannot read referenced {kind}: {source}")]
    Kube {
        kind: &'static str,
        #[source]
        source: ::kube::Error,
    },
}

/// Read access to referenceable objects.
#[async_trait]
pub trait ReferenceReader: Send + Sync {
    /// `Ok(None)` when no object of that name exists
    async fn get(&self, target: &Target, name: &str) -> Result<Option<Candidate>, ReferenceError>;
    /// Objects carrying all of `labels`
    async fn list(
        &self,
        target: &Target,
        labels: &BTreeMap<String, String>,
    ) -> Result<Vec<Candidate>, ReferenceError>;
}

/// A single-valued referenceable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSource<'a> {
    Literal(&'a str),
    Ref(&'a Reference),
    Selector(&'a Selector),
    Unset,
}

impl<'a> FieldSource<'a> {
    pub fn of(
        value: Option<&'a str>,
        reference: Option<&'a Reference>,
        selector: Option<&'a Selector>,
    ) -> Self {
        match (value.filter(|v| !v.is_empty()), reference, selector) {
            (_, Some(r), _) => Self::Ref(r),
            (Some(v), None, _) => Self::Literal(v),
            (None, None, Some(s)) => Self::Selector(s),
            (None, None, None) => Self::Unset,
        }
    }
}

/// A list-valued referenceable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListSource<'a> {
    Literal(&'a [String]),
    Refs(&'a [Reference]),
    Selector(&'a Selector),
    Unset,
}

impl<'a> ListSource<'a> {
    pub fn of(
        values: &'a [String],
        refs: &'a [Reference],
        selector: Option<&'a Selector>,
    ) -> Self {
        if !refs.is_empty() {
            Self::Refs(refs)
        } else if !values.is_empty() {
            Self::Literal(values)
        } else if let Some(s) = selector {
            Self::Selector(s)
        } else {
            Self::Unset
        }
    }
}

/// Resolves references on behalf of one managed object.
pub struct Resolver<'a> {
    reader: &'a dyn ReferenceReader,
    /// Controller owner of the resolving object, for `matchControllerRef`
    controller_uid: Option<&'a str>,
}

impl std::fmt::Debug for Resolver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("controller_uid", &self.controller_uid)
            .finish_non_exhaustive()
    }
}

impl<'a> Resolver<'a> {
    pub fn new(reader: &'a dyn ReferenceReader, controller_uid: Option<&'a str>) -> Self {
        Self {
            reader,
            controller_uid,
        }
    }

    async fn by_name(&self, target: &Target, name: &str) -> Result<String, ReferenceError> {
        let candidate = self
            .reader
            .get(target, name)
            .await?
            .ok_or_else(|| ReferenceError::NotFound {
                kind: target.kind,
                name: name.to_string(),
            })?;
        if !candidate.ready {
            return Err(ReferenceError::NotReady {
                kind: target.kind,
                name: name.to_string(),
            });
        }
        candidate
            .value
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ReferenceError::NoValue {
                kind: target.kind,
                name: name.to_string(),
            })
    }

    /// Ready candidates with a value, sorted by name.
    async fn selected(
        &self,
        target: &Target,
        selector: &Selector,
    ) -> Result<Vec<Candidate>, ReferenceError> {
        let mut candidates: Vec<Candidate> = self
            .reader
            .list(target, &selector.match_labels)
            .await?
            .into_iter()
            .filter(|c| c.ready && c.value.as_deref().is_some_and(|v| !v.is_empty()))
            .filter(|c| {
                selector.match_controller_ref != Some(true)
                    || (self.controller_uid.is_some()
                        && c.controller_uid.as_deref() == self.controller_uid)
            })
            .collect();
        candidates.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(candidates)
    }

    /// Resolve a single-valued field. `Ok(None)` when nothing is set.
    pub async fn resolve(
        &self,
        target: &Target,
        source: FieldSource<'_>,
    ) -> Result<Option<String>, ReferenceError> {
        match source {
            FieldSource::Unset => Ok(None),
            FieldSource::Literal(v) => Ok(Some(v.to_string())),
            FieldSource::Ref(r) => self.by_name(target, &r.name).await.map(Some),
            FieldSource::Selector(s) => self
                .selected(target, s)
                .await?
                .into_iter()
                .next()
                .and_then(|c| c.value)
                .map(Some)
                .ok_or(ReferenceError::NoMatch { kind: target.kind }),
        }
    }

    /// Resolve a list-valued field. Refs keep their declared order, selected
    /// values are sorted by object name and de-duplicated.
    pub async fn resolve_multiple(
        &self,
        target: &Target,
        source: ListSource<'_>,
    ) -> Result<Vec<String>, ReferenceError> {
        match source {
            ListSource::Unset => Ok(Vec::new()),
            ListSource::Literal(values) => Ok(values.to_vec()),
            ListSource::Refs(refs) => {
                let mut values = Vec::with_capacity(refs.len());
                for r in refs {
                    values.push(self.by_name(target, &r.name).await?);
                }
                Ok(values)
            }
            ListSource::Selector(s) => {
                let mut seen = BTreeSet::new();
                let values: Vec<String> = self
                    .selected(target, s)
                    .await?
                    .into_iter()
                    .filter_map(|c| c.value)
                    .filter(|v| seen.insert(v.clone()))
                    .collect();
                if values.is_empty() {
                    return Err(ReferenceError::NoMatch { kind: target.kind });
                }
                Ok(values)
            }
        }
    }

    /// Resolve into `field`, returning whether it changed.
    pub async fn resolve_field(
        &self,
        target: &Target,
        field: &mut Option<String>,
        reference: Option<&Reference>,
        selector: Option<&Selector>,
    ) -> Result<bool, ReferenceError> {
        let source = FieldSource::of(field.as_deref(), reference, selector);
        let resolved = self.resolve(target, source).await?;
        if resolved.is_some() && resolved != *field {
            debug!(kind = target.kind, value = ?resolved, "resolved reference");
            *field = resolved;
            return Ok(true);
        }
        Ok(false)
    }

    /// Resolve into a list `field`, returning whether it changed.
    pub async fn resolve_list_field(
        &self,
        target: &Target,
        field: &mut Vec<String>,
        refs: &[Reference],
        selector: Option<&Selector>,
    ) -> Result<bool, ReferenceError> {
        let source = ListSource::of(field, refs, selector);
        let resolved = self.resolve_multiple(target, source).await?;
        if !resolved.is_empty() && resolved != *field {
            debug!(kind = target.kind, values = ?resolved, "resolved references");
            *field = resolved;
            return Ok(true);
        }
        Ok(false)
    }
}
