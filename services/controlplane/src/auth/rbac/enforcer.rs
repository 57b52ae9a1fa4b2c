//! Policy engine: snapshot store, enforcement queries, live reload.
//!
//! # Purpose and responsibility
//! Holds the current authorization ruleset as an immutable snapshot, answers
//! point enforcement queries against it, and atomically replaces it when the
//! external policy source changes.
//!
//! # Key invariants and assumptions
//! - A published snapshot is never mutated; readers that captured a snapshot
//!   keep it for the whole query even if a swap happens mid-flight.
//! - At most one reload proceeds at a time; reload never blocks queries.
//! - A snapshot is only published after the document parsed, validated, and
//!   the admin policy was synthesized. A document that fails any of those is
//!   fatal to the reload driver.
//!
//! # Security considerations
//! - Denials are logged server-side with full query context; callers only
//!   ever see a generic denial.
use crate::auth::rbac::catalog::ResourceCatalog;
use crate::auth::rbac::permissions::{Permissions, effective_permissions};
use crate::auth::rbac::source::PolicySource;
use arc_swap::ArcSwap;
use casbin::{CoreApi, Enforcer as CasbinEnforcer, MemoryAdapter, MgmtApi};
use std::sync::Arc;
use strata_authz::{
    ADMIN_ROLE, Action, AuthzError, AuthzResult, PolicyDocument, RESOURCE_DATABASE_ENGINES,
    RESOURCE_NAMESPACES, RoleBinding, casbin_model, validate_document,
};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

/// One immutable, fully-built ruleset.
pub struct PolicySnapshot {
    pub(crate) enforcer: CasbinEnforcer,
    pub(crate) bindings: Vec<RoleBinding>,
    pub(crate) enabled: bool,
}

/// The policy store and enforcer.
pub struct PolicyEngine {
    catalog: Arc<ResourceCatalog>,
    source: Arc<dyn PolicySource>,
    snapshot: ArcSwap<PolicySnapshot>,
    reload_lock: Mutex<()>,
}

impl PolicyEngine {
    /// Build the engine from the catalog and the initial document.
    ///
    /// # Errors
    /// - `AuthzError::PolicyMalformed` if the initial document fails
    ///   well-formedness checks; the process must not start serving.
    pub async fn new(
        catalog: Arc<ResourceCatalog>,
        source: Arc<dyn PolicySource>,
    ) -> AuthzResult<Arc<Self>> {
        let document = source.load().await?;
        let snapshot = build_snapshot(&catalog, document).await?;
        Ok(Arc::new(Self {
            catalog,
            source,
            snapshot: ArcSwap::from_pointee(snapshot),
            reload_lock: Mutex::new(()),
        }))
    }

    /// Re-fetch the document and swap in a fresh snapshot.
    ///
    /// The swap happens only after parse, validation, and admin synthesis all
    /// succeeded; on failure the current snapshot stays in place and the
    /// error is returned for the caller to escalate.
    pub async fn reload(&self) -> AuthzResult<()> {
        let _guard = self.reload_lock.lock().await;
        let document = self.source.load().await?;
        let snapshot = build_snapshot(&self.catalog, document).await?;
        self.snapshot.store(Arc::new(snapshot));
        metrics::counter!("strata_policy_reloads_total").increment(1);
        Ok(())
    }

    /// React to change events from the external notification transport.
    ///
    /// Any reload failure terminates the process: serving with a policy that
    /// failed self-consistency checks is worse than an outage.
    pub fn watch_changes(self: Arc<Self>, mut events: mpsc::Receiver<()>) -> JoinHandle<()> {
        let engine = self;
        tokio::spawn(async move {
            while events.recv().await.is_some() {
                match engine.reload().await {
                    Ok(()) => tracing::info!("policy reloaded"),
                    Err(err) => {
                        tracing::error!(error = %err, "invalid policy detected during reload");
                        std::process::exit(1);
                    }
                }
            }
        })
    }

    pub fn enforcement_enabled(&self) -> bool {
        self.snapshot.load().enabled
    }

    /// Point enforcement query.
    ///
    /// # Errors
    /// - `AuthzError::Evaluation` on malformed input (empty subject or
    ///   resource). An absent matching rule is a plain deny, not an error.
    pub fn enforce(
        &self,
        subject: &str,
        resource: &str,
        action: Action,
        object: &str,
    ) -> AuthzResult<bool> {
        if subject.is_empty() {
            return Err(AuthzError::Evaluation("subject must not be empty".into()));
        }
        if resource.is_empty() {
            return Err(AuthzError::Evaluation("resource must not be empty".into()));
        }

        // Listing namespaces is always permitted; the result is filtered
        // downstream based on permission.
        if resource == RESOURCE_NAMESPACES && action == Action::Read {
            return Ok(true);
        }
        // Read-only discovery of the engine catalog is always permitted.
        if resource == RESOURCE_DATABASE_ENGINES
            && action == Action::Read
            && object_name_is_empty(object)
        {
            return Ok(true);
        }

        let snapshot = self.snapshot.load();
        if !snapshot.enabled {
            return Ok(true);
        }
        let allowed = snapshot
            .enforcer
            .enforce((subject, resource, action.as_str(), object))?;
        if !allowed {
            tracing::warn!(subject, resource, action = %action, object, "permission denied");
            metrics::counter!("strata_enforce_denied_total").increment(1);
        }
        Ok(allowed)
    }

    /// Positional query form: `[subject, action, resource, object]`.
    ///
    /// # Errors
    /// - `AuthzError::Evaluation` when a positional argument is missing or
    ///   the action is unknown.
    pub fn can(&self, request: &[String]) -> AuthzResult<bool> {
        let [subject, action, resource, object] = request else {
            return Err(AuthzError::Evaluation(
                "expected input of the form [subject action resource object]".into(),
            ));
        };
        let action = action
            .parse::<Action>()
            .map_err(|_| AuthzError::Evaluation(format!("unknown action: {action}")))?;
        let object = if object == "*" || object == "all" {
            if resource.as_str() == RESOURCE_NAMESPACES {
                ""
            } else {
                "/"
            }
        } else {
            object.as_str()
        };
        self.enforce(subject, resource, action, object)
    }

    /// Enumerate the rules applicable to a subject, role rows rewritten to
    /// the subject's own identity. Reports the disabled marker instead of a
    /// meaningless universal-access table when enforcement is off.
    pub fn permissions_of(&self, subject: &str) -> AuthzResult<Permissions> {
        if subject.is_empty() {
            return Err(AuthzError::Evaluation("subject must not be empty".into()));
        }
        let snapshot = self.snapshot.load();
        if !snapshot.enabled {
            return Ok(Permissions::Disabled);
        }
        Ok(Permissions::Enabled(effective_permissions(
            &snapshot.enforcer,
            &snapshot.bindings,
            subject,
        )))
    }
}

fn object_name_is_empty(object: &str) -> bool {
    match object.split_once('/') {
        Some((_, name)) => name.is_empty(),
        None => object.is_empty(),
    }
}

async fn build_snapshot(
    catalog: &ResourceCatalog,
    document: PolicyDocument,
) -> AuthzResult<PolicySnapshot> {
    validate_document(&document, catalog.resource_kinds())?;

    let model = casbin_model().await;
    let adapter = MemoryAdapter::default();
    let mut enforcer = CasbinEnforcer::new(model, adapter).await?;

    for rule in &document.rules {
        enforcer
            .add_policy(vec![
                rule.subject.clone(),
                rule.resource.clone(),
                rule.action.clone(),
                rule.object.clone(),
            ])
            .await?;
    }
    for binding in &document.bindings {
        enforcer
            .add_grouping_policy(vec![binding.user.clone(), binding.role.clone()])
            .await?;
    }

    load_admin_policy(catalog, &mut enforcer).await?;
    enforcer.build_role_links()?;

    Ok(PolicySnapshot {
        enforcer,
        bindings: document.bindings,
        enabled: document.enabled,
    })
}

/// Grant the admin role every action on every object for every kind the
/// catalog knows. The namespaces kind has no owning namespace, so it gets
/// the single-level wildcard.
async fn load_admin_policy(
    catalog: &ResourceCatalog,
    enforcer: &mut CasbinEnforcer,
) -> AuthzResult<()> {
    for kind in catalog.resource_kinds() {
        let object = if kind == RESOURCE_NAMESPACES { "*" } else { "*/*" };
        enforcer
            .add_policy(vec![
                ADMIN_ROLE.to_string(),
                kind.clone(),
                "*".to_string(),
                object.to_string(),
            ])
            .await?;
    }
    Ok(())
}
