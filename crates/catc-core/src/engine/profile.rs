// ── Resource profiles and the generic pass ──
//
// A profile tells the engine how one resource kind is resolved, observed,
// compared and mutated. `run_pass` is the single driver for every kind:
// resolve, observe, diff, apply in batches, then optionally verify.

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::State;
use crate::engine::report::KindReport;
use crate::engine::session::Session;
use crate::error::CoreError;
use crate::model::ResourceKind;

/// Result of comparing a target with what the controller holds.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Verdict<P> {
    /// The controller agrees with the desired record.
    Equal,
    /// Nothing exists yet; create with this payload.
    Create(P),
    /// Something exists but differs; update with this payload.
    Drifted(P),
}

/// How a delete call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Removal {
    Deleted,
    /// Nothing was left to remove by the time the call was made.
    AlreadyAbsent,
}

/// One desired item may expand into several targets, or be known absent.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Resolved<T> {
    Target(T),
    Absent(String),
}

pub(crate) trait Profile {
    /// Validated desired record.
    type Item;
    /// Desired record with its controller references resolved.
    type Target;
    /// What the controller currently holds for a target.
    type Observed;
    /// Create/update request body for one target.
    type Payload;

    fn kind(&self) -> ResourceKind;

    fn item_label(&self, item: &Self::Item) -> String;

    fn label(&self, target: &Self::Target) -> String;

    async fn resolve(
        &self,
        s: &Session<'_>,
        item: &Self::Item,
    ) -> Result<Vec<Resolved<Self::Target>>, CoreError>;

    async fn observe(
        &self,
        s: &Session<'_>,
        target: &Self::Target,
    ) -> Result<Option<Self::Observed>, CoreError>;

    fn diff(
        &self,
        s: &Session<'_>,
        target: &Self::Target,
        observed: Option<&Self::Observed>,
    ) -> Verdict<Self::Payload>;

    /// Payloads per create call.
    fn batch_size(&self, _s: &Session<'_>) -> usize {
        1
    }

    /// Payloads per update call.
    fn update_batch_size(&self, s: &Session<'_>) -> usize {
        self.batch_size(s)
    }

    /// Creates run in ascending rank order.
    fn create_rank(&self, _payload: &Self::Payload) -> i32 {
        0
    }

    /// Deletes run in ascending rank order.
    fn delete_rank(&self, _target: &Self::Target) -> i32 {
        0
    }

    async fn create(&self, s: &Session<'_>, batch: &[Self::Payload]) -> Result<(), CoreError>;

    /// Per-item work once the item's create batch has landed. A failure
    /// here fails only that item; it stays counted as created.
    async fn after_create(&self, _s: &Session<'_>, _payload: &Self::Payload) -> Result<(), CoreError> {
        Ok(())
    }

    async fn update(&self, s: &Session<'_>, batch: &[Self::Payload]) -> Result<(), CoreError>;

    async fn delete(
        &self,
        s: &Session<'_>,
        target: &Self::Target,
        observed: &Self::Observed,
    ) -> Result<Removal, CoreError>;

    /// Post-apply check under merged intent.
    fn converged(
        &self,
        s: &Session<'_>,
        target: &Self::Target,
        observed: Option<&Self::Observed>,
    ) -> bool {
        matches!(self.diff(s, target, observed), Verdict::Equal)
    }

    /// Post-apply check under deleted intent.
    fn verify_absent(&self, _target: &Self::Target, observed: Option<&Self::Observed>) -> bool {
        observed.is_none()
    }
}

/// Outcome of one kind pass.
#[derive(Debug)]
pub(crate) struct PassOutcome {
    pub report: KindReport,
    pub verified: Option<bool>,
    pub last_error: Option<Value>,
    /// A run-fatal error stopped the pass; later passes must not start.
    pub fatal: bool,
}

/// Bookkeeping shared by the phases of one pass.
struct Pass {
    report: KindReport,
    last_error: Option<Value>,
    halted: bool,
    fatal: bool,
}

impl Pass {
    fn fail(&mut self, item: String, err: &CoreError) {
        warn!(kind = %self.report.kind, %item, error = %err, "item failed");
        self.report.fail(item, err);
        self.last_error = Some(err.to_response());
        if err.stops_pass() {
            self.halted = true;
        }
        if err.is_fatal_for_run() {
            self.fatal = true;
        }
    }

    fn not_attempted(&mut self, item: String) {
        self.report.failed.push(crate::engine::report::Failure {
            item,
            kind: "NotAttempted",
            reason: "not attempted after earlier failure".to_owned(),
        });
    }
}

/// Reconcile every item of one kind.
pub(crate) async fn run_pass<P: Profile>(
    profile: &P,
    s: &Session<'_>,
    items: &[P::Item],
) -> PassOutcome {
    let mut pass = Pass {
        report: KindReport::new(profile.kind()),
        last_error: None,
        halted: false,
        fatal: false,
    };

    // ── Resolve ──
    let mut targets = Vec::new();
    for item in items {
        let label = profile.item_label(item);
        if pass.halted {
            pass.not_attempted(label);
            continue;
        }
        match profile.resolve(s, item).await {
            Ok(resolved) => {
                for r in resolved {
                    match r {
                        Resolved::Target(t) => targets.push(t),
                        Resolved::Absent(label) => {
                            info!(%label, "not present");
                            pass.report.absent.push(label);
                        }
                    }
                }
            }
            Err(e) => pass.fail(label, &e),
        }
    }

    match s.state() {
        State::Merged => apply_merged(profile, s, &targets, &mut pass).await,
        State::Deleted => apply_deleted(profile, s, &targets, &mut pass).await,
    }

    let verified = if s.settings.config_verify && !pass.halted {
        Some(verify(profile, s, &targets, &pass.report).await)
    } else {
        None
    };

    PassOutcome {
        report: pass.report,
        verified,
        last_error: pass.last_error,
        fatal: pass.fatal,
    }
}

async fn apply_merged<P: Profile>(
    profile: &P,
    s: &Session<'_>,
    targets: &[P::Target],
    pass: &mut Pass,
) {
    let mut creates = Vec::new();
    let mut updates = Vec::new();
    for target in targets {
        let label = profile.label(target);
        if pass.halted {
            pass.not_attempted(label);
            continue;
        }
        let observed = match profile.observe(s, target).await {
            Ok(observed) => observed,
            Err(e) => {
                pass.fail(label, &e);
                continue;
            }
        };
        match profile.diff(s, target, observed.as_ref()) {
            Verdict::Equal => {
                debug!(%label, "needs no update");
                pass.report.no_update.push(label);
            }
            Verdict::Create(payload) => creates.push((label, payload)),
            Verdict::Drifted(payload) => updates.push((label, payload)),
        }
    }

    creates.sort_by_key(|(_, payload)| profile.create_rank(payload));
    let size = profile.batch_size(s).max(1);

    let (labels, payloads): (Vec<String>, Vec<P::Payload>) = creates.into_iter().unzip();
    for (labels, batch) in labels.chunks(size).zip(payloads.chunks(size)) {
        if pass.halted {
            labels.iter().for_each(|l| pass.not_attempted(l.clone()));
            continue;
        }
        match profile.create(s, batch).await {
            Ok(()) => {
                info!(items = %labels.join(","), "created");
                pass.report.created.extend(labels.iter().cloned());
                for (label, payload) in labels.iter().zip(batch) {
                    if pass.halted {
                        pass.not_attempted(label.clone());
                    } else if let Err(e) = profile.after_create(s, payload).await {
                        pass.fail(label.clone(), &e);
                    }
                }
            }
            Err(e) => labels.iter().for_each(|l| pass.fail(l.clone(), &e)),
        }
    }

    let size = profile.update_batch_size(s).max(1);
    let (labels, payloads): (Vec<String>, Vec<P::Payload>) = updates.into_iter().unzip();
    for (labels, batch) in labels.chunks(size).zip(payloads.chunks(size)) {
        if pass.halted {
            labels.iter().for_each(|l| pass.not_attempted(l.clone()));
            continue;
        }
        match profile.update(s, batch).await {
            Ok(()) => {
                info!(items = %labels.join(","), "updated");
                pass.report.updated.extend(labels.iter().cloned());
            }
            Err(e) => labels.iter().for_each(|l| pass.fail(l.clone(), &e)),
        }
    }
}

async fn apply_deleted<P: Profile>(
    profile: &P,
    s: &Session<'_>,
    targets: &[P::Target],
    pass: &mut Pass,
) {
    let mut ordered: Vec<&P::Target> = targets.iter().collect();
    ordered.sort_by_key(|t| profile.delete_rank(t));

    for target in ordered {
        let label = profile.label(target);
        if pass.halted {
            pass.not_attempted(label);
            continue;
        }
        let observed = match profile.observe(s, target).await {
            Ok(Some(observed)) => observed,
            Ok(None) => {
                info!(%label, "not present");
                pass.report.absent.push(label);
                continue;
            }
            Err(e) => {
                pass.fail(label, &e);
                continue;
            }
        };
        match profile.delete(s, target, &observed).await {
            Ok(Removal::Deleted) => {
                info!(%label, "deleted");
                pass.report.deleted.push(label);
            }
            Ok(Removal::AlreadyAbsent) => pass.report.absent.push(label),
            Err(e) => pass.fail(label, &e),
        }
    }
}

async fn verify<P: Profile>(
    profile: &P,
    s: &Session<'_>,
    targets: &[P::Target],
    report: &KindReport,
) -> bool {
    let mut all = true;
    for target in targets {
        let label = profile.label(target);
        if report.has_failed(&label) {
            continue;
        }
        let ok = match profile.observe(s, target).await {
            Ok(observed) => match s.state() {
                State::Merged => profile.converged(s, target, observed.as_ref()),
                State::Deleted => profile.verify_absent(target, observed.as_ref()),
            },
            Err(e) => {
                warn!(%label, error = %e, "verification lookup failed");
                false
            }
        };
        if !ok {
            warn!(%label, state = %s.state(), "verification failed");
            all = false;
        }
    }
    all
}
