// ── Result aggregation ──
//
// Every item lands in one bucket of its kind's report; an item whose
// follow-up failed after creation is listed under failed as well. The run
// report folds the per-kind buckets into `changed`, a human message and the
// last controller error seen.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::error::CoreError;
use crate::model::ResourceKind;

/// One item that could not be processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub item: String,
    /// Error kind, e.g. `Conflict` or `TaskFailure`.
    pub kind: &'static str,
    pub reason: String,
}

/// Buckets for one resource kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KindReport {
    pub kind: ResourceKind,
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub no_update: Vec<String>,
    pub deleted: Vec<String>,
    pub absent: Vec<String>,
    pub failed: Vec<Failure>,
}

impl KindReport {
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            created: Vec::new(),
            updated: Vec::new(),
            no_update: Vec::new(),
            deleted: Vec::new(),
            absent: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn changed(&self) -> bool {
        !(self.created.is_empty() && self.updated.is_empty() && self.deleted.is_empty())
    }

    pub(crate) fn fail(&mut self, item: String, err: &CoreError) {
        self.failed.push(Failure {
            item,
            kind: err.kind(),
            reason: err.to_string(),
        });
    }

    /// Whether `item` ended up in the failed bucket.
    pub fn has_failed(&self, item: &str) -> bool {
        self.failed.iter().any(|f| f.item == item)
    }

    fn absorb(&mut self, other: Self) {
        self.created.extend(other.created);
        self.updated.extend(other.updated);
        self.no_update.extend(other.no_update);
        self.deleted.extend(other.deleted);
        self.absent.extend(other.absent);
        self.failed.extend(other.failed);
    }

    fn fragments(&self) -> Vec<String> {
        let noun = self.kind.noun();
        let list = |items: &[String]| items.join(",");
        let mut out = Vec::new();
        if !self.created.is_empty() {
            out.push(format!("{noun}(s) '{}' created successfully", list(&self.created)));
        }
        if !self.updated.is_empty() {
            out.push(format!("{noun}(s) '{}' updated successfully", list(&self.updated)));
        }
        if !self.no_update.is_empty() {
            out.push(format!("{noun}(s) '{}' needs no update", list(&self.no_update)));
        }
        if !self.deleted.is_empty() {
            out.push(format!("{noun}(s) '{}' deleted successfully", list(&self.deleted)));
        }
        if !self.absent.is_empty() {
            out.push(format!("unable to delete '{}' as not present", list(&self.absent)));
        }
        for failure in &self.failed {
            out.push(format!(
                "failed to process {noun} '{}': {}",
                failure.item, failure.reason
            ));
        }
        out
    }
}

/// Outcome of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub changed: bool,
    /// `None` unless verification was requested.
    pub verified: Option<bool>,
    pub msg: String,
    pub response: Vec<KindReport>,
    pub last_error_response: Option<Value>,
}

impl Report {
    /// Whether any item failed.
    pub fn has_failures(&self) -> bool {
        self.response.iter().any(|k| !k.failed.is_empty())
    }

    /// All failures across kinds, in run order.
    pub fn failures(&self) -> impl Iterator<Item = &Failure> {
        self.response.iter().flat_map(|k| k.failed.iter())
    }
}

/// Collects pass outcomes into a [`Report`].
#[derive(Debug, Default)]
pub(crate) struct ReportBuilder {
    kinds: IndexMap<ResourceKind, KindReport>,
    verified: Option<bool>,
    last_error: Option<Value>,
}

impl ReportBuilder {
    pub fn add(&mut self, pass: KindReport, verified: Option<bool>, last_error: Option<Value>) {
        if let Some(ok) = verified {
            self.verified = Some(self.verified.unwrap_or(true) && ok);
        }
        if last_error.is_some() {
            self.last_error = last_error;
        }
        match self.kinds.get_mut(&pass.kind) {
            Some(existing) => existing.absorb(pass),
            None => {
                self.kinds.insert(pass.kind, pass);
            }
        }
    }

    pub fn finish(self) -> Report {
        let response: Vec<KindReport> = self.kinds.into_values().collect();
        let changed = response.iter().any(KindReport::changed);
        let fragments: Vec<String> = response.iter().flat_map(KindReport::fragments).collect();
        let msg = if fragments.is_empty() {
            "Nothing to do".to_owned()
        } else {
            fragments.join("; ")
        };
        Report {
            changed,
            verified: self.verified,
            msg,
            response,
            last_error_response: self.last_error,
        }
    }
}
