//! The registry: the single source of truth for object state.
//!
//! Owns every [`RdoRecord`] and an append-only event log. Callers that share a
//! registry across tasks should go through [`SharedRegistry`](crate::SharedRegistry),
//! which serializes whole calls.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use rdo_core::{AccessType, ActionType, Clock, Identity, RdoId, RuleSet, SystemClock};
use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, Result};
use crate::event::{EventRef, Outcome, RefusalProof, RegistryEvent, Verdict};
use crate::record::{CreateRequest, RdoRecord, WireCreateRequest};

/// Snapshot format version.
const SNAPSHOT_VERSION: u8 = 1;

/// The authority state machine.
pub struct Registry {
    records: BTreeMap<RdoId, RdoRecord>,
    log: Vec<RegistryEvent>,
    next_id: u64,
    clock: Arc<dyn Clock>,
}

#[derive(Serialize, Deserialize)]
struct Snapshot {
    version: u8,
    next_id: u64,
    records: Vec<RdoRecord>,
    log: Vec<RegistryEvent>,
}

impl Registry {
    /// Create an empty registry reading time from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            records: BTreeMap::new(),
            log: Vec::new(),
            next_id: 1,
            clock,
        }
    }

    /// Create an empty registry on the system clock.
    pub fn with_system_clock() -> Self {
        Self::new(Arc::new(SystemClock))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Object Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Register a new object and return its id.
    ///
    /// SINGLE_USE with an unlimited budget is stored with a budget of one.
    pub fn create(&mut self, creator: Identity, req: CreateRequest) -> Result<RdoId> {
        if req.metadata_pointer.trim().is_empty() {
            return Err(RegistryError::MalformedRequest(
                "metadata pointer must not be empty".into(),
            ));
        }

        let whitelist: BTreeSet<Identity> = match req.rules.access_type {
            AccessType::List if req.whitelist.is_empty() => {
                return Err(RegistryError::MalformedRequest(
                    "LIST access requires a non-empty whitelist".into(),
                ));
            }
            AccessType::List => req.whitelist.into_iter().collect(),
            _ => BTreeSet::new(),
        };

        let mut rules = req.rules;
        if rules.access_type == AccessType::SingleUse && rules.max_uses == 0 {
            rules.max_uses = 1;
        }

        let id = RdoId(self.next_id);
        self.next_id += 1;
        let now = self.clock.now();

        let record = RdoRecord {
            id,
            creator,
            object_type: req.object_type,
            rules_hash: req.rules_hash,
            rules_version: req.rules_version,
            rules,
            whitelist,
            metadata_pointer: req.metadata_pointer.clone(),
            created_at: now,
            locked: false,
            violation_count: 0,
            uses_remaining: rules.max_uses,
        };
        self.records.insert(id, record);

        self.append(RegistryEvent::Created {
            id,
            creator,
            object_type: req.object_type,
            rules_hash: req.rules_hash,
            metadata_pointer: req.metadata_pointer,
            at: now,
        });

        tracing::info!(%id, rules_hash = %req.rules_hash, "object created");
        Ok(id)
    }

    /// Register a new object from a wire request with raw enum codes.
    pub fn create_raw(&mut self, creator: Identity, wire: WireCreateRequest) -> Result<RdoId> {
        let req = CreateRequest::try_from(wire)?;
        self.create(creator, req)
    }

    /// Decide an action, apply its side effects, and record the verdict.
    ///
    /// `actor` is taken as given. Nothing here checks a signature, so an
    /// identity on a request is asserted by the caller, not authenticated.
    ///
    /// Unknown ids fail with `NotFound` and leave no trace. Every other
    /// request appends exactly one event.
    pub fn request_action(
        &mut self,
        actor: Identity,
        id: RdoId,
        action: ActionType,
        context: &[u8],
    ) -> Result<Outcome> {
        let now = self.clock.now();
        let record = self
            .records
            .get_mut(&id)
            .ok_or(RegistryError::NotFound(id))?;

        let was_locked = record.locked;
        let verdict = record.evaluate(&actor, action, context, now);
        let rules_hash = record.rules_hash;

        if record.locked && !was_locked {
            tracing::warn!(%id, violations = record.violation_count, "object locked");
        }

        let event = match verdict {
            Verdict::Allowed { action_hash } => {
                tracing::debug!(%id, %action, "action allowed");
                self.append(RegistryEvent::Allowed {
                    id,
                    actor,
                    action,
                    action_hash,
                    at: now,
                })
            }
            Verdict::Refused(reason) => {
                tracing::debug!(%id, %action, %reason, "action refused");
                self.append(RegistryEvent::Refused {
                    id,
                    actor,
                    action,
                    rules_hash,
                    reason,
                    at: now,
                })
            }
        };

        Ok(Outcome { verdict, event })
    }

    /// Like [`request_action`](Self::request_action), with a raw action code.
    pub fn request_action_raw(
        &mut self,
        actor: Identity,
        id: RdoId,
        action_code: u8,
        context: &[u8],
    ) -> Result<Outcome> {
        let action = ActionType::try_from(action_code)
            .map_err(|e| RegistryError::MalformedRequest(e.to_string()))?;
        self.request_action(actor, id, action, context)
    }

    /// Read an object's record.
    pub fn read(&self, id: RdoId) -> Result<&RdoRecord> {
        self.records.get(&id).ok_or(RegistryError::NotFound(id))
    }

    /// Number of registered objects.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Event Log
    // ─────────────────────────────────────────────────────────────────────────

    fn append(&mut self, event: RegistryEvent) -> EventRef {
        self.log.push(event);
        EventRef(self.log.len() as u64 - 1)
    }

    pub fn event(&self, event: EventRef) -> Option<&RegistryEvent> {
        usize::try_from(event.0).ok().and_then(|i| self.log.get(i))
    }

    pub fn events(&self) -> &[RegistryEvent] {
        &self.log
    }

    /// All events for one object, in log order.
    pub fn events_for(&self, id: RdoId) -> Vec<(EventRef, &RegistryEvent)> {
        self.log
            .iter()
            .enumerate()
            .filter(|(_, e)| e.object_id() == id)
            .map(|(i, e)| (EventRef(i as u64), e))
            .collect()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Verification
    // ─────────────────────────────────────────────────────────────────────────

    /// Re-read a refusal and check it against the object's rules hash.
    pub fn verify_refusal(&self, event: EventRef) -> Result<RefusalProof> {
        match self.event(event) {
            Some(RegistryEvent::Refused {
                id,
                actor,
                action,
                rules_hash,
                reason,
                at,
            }) => {
                let record = self.read(*id)?;
                Ok(RefusalProof {
                    event,
                    id: *id,
                    actor: *actor,
                    action: *action,
                    reason: *reason,
                    rules_hash: *rules_hash,
                    rules_match: record.rules_hash == *rules_hash,
                    at: *at,
                })
            }
            Some(_) => Err(RegistryError::NotARefusal(event)),
            None => Err(RegistryError::EventNotFound(event)),
        }
    }

    /// Check a candidate rule set against an object's stored hash and version.
    pub fn verify_rules(&self, id: RdoId, rules: &RuleSet) -> Result<bool> {
        let record = self.read(id)?;
        Ok(record.rules_version == rules.version() && record.rules_hash == rules.digest())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Snapshots
    // ─────────────────────────────────────────────────────────────────────────

    /// Encode all records, the log, and the id counter as CBOR.
    pub fn snapshot(&self) -> Result<Vec<u8>> {
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            next_id: self.next_id,
            records: self.records.values().cloned().collect(),
            log: self.log.clone(),
        };
        let mut buf = Vec::new();
        ciborium::into_writer(&snapshot, &mut buf)
            .map_err(|e| RegistryError::Snapshot(e.to_string()))?;
        Ok(buf)
    }

    /// Rebuild a registry from a snapshot.
    pub fn restore(bytes: &[u8], clock: Arc<dyn Clock>) -> Result<Self> {
        let snapshot: Snapshot =
            ciborium::from_reader(bytes).map_err(|e| RegistryError::Snapshot(e.to_string()))?;

        if snapshot.version != SNAPSHOT_VERSION {
            return Err(RegistryError::Snapshot(format!(
                "unsupported snapshot version {}",
                snapshot.version
            )));
        }

        if snapshot.next_id == 0 {
            return Err(RegistryError::Snapshot("id counter must start at 1".into()));
        }

        let count = snapshot.records.len();
        let records: BTreeMap<RdoId, RdoRecord> =
            snapshot.records.into_iter().map(|r| (r.id, r)).collect();
        if records.len() != count {
            return Err(RegistryError::Snapshot("duplicate record id".into()));
        }
        if records
            .keys()
            .any(|id| id.get() == 0 || id.get() >= snapshot.next_id)
        {
            return Err(RegistryError::Snapshot(
                "record id outside the id counter range".into(),
            ));
        }
        if let Some(orphan) = snapshot
            .log
            .iter()
            .find(|e| !records.contains_key(&e.object_id()))
        {
            return Err(RegistryError::Snapshot(format!(
                "log entry for unknown object {}",
                orphan.object_id()
            )));
        }

        Ok(Self {
            records,
            log: snapshot.log,
            next_id: snapshot.next_id,
            clock,
        })
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("objects", &self.records.len())
            .field("events", &self.log.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::RefusalReason;
    use rdo_core::{
        compile, CompactRules, ForbiddenAction, Keypair, LegacyRules, ManualClock, ObjectType,
        RuleIntent, RulesHash, SchemaVersion,
    };

    const T0: u64 = 1_700_000_000;

    fn setup() -> (Registry, ManualClock) {
        let clock = ManualClock::new(T0);
        (Registry::new(Arc::new(clock.clone())), clock)
    }

    fn request(intent: &RuleIntent) -> CreateRequest {
        let compiled = compile(intent, T0);
        CreateRequest {
            rules_hash: compiled.digest,
            rules_version: SchemaVersion::Structured,
            object_type: intent.object_type(),
            rules: compiled.compact,
            metadata_pointer: "b3metadata".into(),
            whitelist: intent.whitelist.clone(),
        }
    }

    fn creator() -> Identity {
        Keypair::from_seed(&[0xc0; 32]).identity()
    }

    fn actor() -> Identity {
        Keypair::from_seed(&[0xac; 32]).identity()
    }

    #[test]
    fn test_ids_start_at_one_and_increase() {
        let (mut reg, _) = setup();
        let req = request(&RuleIntent::message("m", "x"));
        assert_eq!(reg.create(creator(), req.clone()).unwrap(), RdoId(1));
        assert_eq!(reg.create(creator(), req).unwrap(), RdoId(2));
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn test_create_emits_event_and_stores_record() {
        let (mut reg, _) = setup();
        let req = request(&RuleIntent::message("m", "x").max_uses(3));
        let id = reg.create(creator(), req.clone()).unwrap();

        let record = reg.read(id).unwrap();
        assert_eq!(record.creator, creator());
        assert_eq!(record.rules_hash, req.rules_hash);
        assert_eq!(record.uses_remaining, 3);
        assert!(!record.locked);
        assert_eq!(record.created_at, T0);

        assert!(matches!(
            reg.event(EventRef(0)),
            Some(RegistryEvent::Created { id: created, .. }) if *created == id
        ));
    }

    #[test]
    fn test_create_rejects_empty_metadata_pointer() {
        let (mut reg, _) = setup();
        let mut req = request(&RuleIntent::message("m", "x"));
        req.metadata_pointer = "  ".into();
        assert!(matches!(
            reg.create(creator(), req),
            Err(RegistryError::MalformedRequest(_))
        ));
        assert!(reg.is_empty());
        assert!(reg.events().is_empty());
    }

    #[test]
    fn test_list_access_requires_whitelist() {
        let (mut reg, _) = setup();
        let req = request(&RuleIntent::message("m", "x").access(AccessType::List));
        assert!(matches!(
            reg.create(creator(), req),
            Err(RegistryError::MalformedRequest(_))
        ));
    }

    #[test]
    fn test_whitelist_dropped_without_list_access() {
        let (mut reg, _) = setup();
        let mut req = request(&RuleIntent::message("m", "x"));
        req.whitelist = vec![actor()];
        let id = reg.create(creator(), req).unwrap();
        assert!(reg.read(id).unwrap().whitelist.is_empty());
    }

    #[test]
    fn test_unknown_id_not_found_without_event() {
        let (mut reg, _) = setup();
        let result = reg.request_action(actor(), RdoId(42), ActionType::Read, b"");
        assert!(matches!(result, Err(RegistryError::NotFound(RdoId(42)))));
        assert!(matches!(reg.read(RdoId(42)), Err(RegistryError::NotFound(_))));
        assert!(reg.events().is_empty());
    }

    #[test]
    fn test_raw_action_code_out_of_range() {
        let (mut reg, _) = setup();
        let id = reg
            .create(creator(), request(&RuleIntent::message("m", "x")))
            .unwrap();
        assert!(matches!(
            reg.request_action_raw(actor(), id, 9, b""),
            Err(RegistryError::MalformedRequest(_))
        ));
        assert!(reg.request_action_raw(actor(), id, 0, b"").unwrap().verdict.is_allowed());
    }

    #[test]
    fn test_forbidden_forward_does_not_spend_uses() {
        let (mut reg, _) = setup();
        let intent = RuleIntent::message("m", "x")
            .forbid(ForbiddenAction::Forward)
            .max_uses(2);
        let id = reg.create(creator(), request(&intent)).unwrap();

        let outcome = reg
            .request_action(actor(), id, ActionType::Forward, b"")
            .unwrap();
        assert_eq!(
            outcome.verdict.refusal().map(|r| r.to_string()).as_deref(),
            Some("Forwarding forbidden")
        );

        let record = reg.read(id).unwrap();
        assert_eq!(record.uses_remaining, 2);
        assert_eq!(record.violation_count, 1);
        assert!(!record.locked);
    }

    #[test]
    fn test_read_allowed_when_forward_forbidden() {
        let (mut reg, _) = setup();
        let intent = RuleIntent::message("m", "x").forbid(ForbiddenAction::Forward);
        let id = reg.create(creator(), request(&intent)).unwrap();

        let outcome = reg
            .request_action(actor(), id, ActionType::Read, b"ctx")
            .unwrap();
        assert!(outcome.verdict.is_allowed());
        assert!(matches!(
            reg.event(outcome.event),
            Some(RegistryEvent::Allowed { action: ActionType::Read, .. })
        ));
    }

    #[test]
    fn test_lock_is_absorbing() {
        let (mut reg, _) = setup();
        let intent = RuleIntent::message("m", "x")
            .forbid(ForbiddenAction::Copy)
            .lock_on_violation();
        let id = reg.create(creator(), request(&intent)).unwrap();

        let first = reg.request_action(actor(), id, ActionType::Copy, b"").unwrap();
        assert_eq!(
            first.verdict,
            Verdict::Refused(RefusalReason::Forbidden {
                action: ForbiddenAction::Copy,
                locked: true
            })
        );

        for action in [ActionType::Read, ActionType::Copy, ActionType::Execute] {
            let outcome = reg.request_action(creator(), id, action, b"").unwrap();
            assert_eq!(outcome.verdict, Verdict::Refused(RefusalReason::ObjectLocked));
        }

        let record = reg.read(id).unwrap();
        assert!(record.locked);
        assert_eq!(record.violation_count, 1);
    }

    #[test]
    fn test_whitelist_enforced() {
        let (mut reg, _) = setup();
        let intent = RuleIntent::message("m", "x").whitelist([actor()]);
        let id = reg.create(creator(), request(&intent)).unwrap();

        assert!(reg
            .request_action(actor(), id, ActionType::Read, b"")
            .unwrap()
            .verdict
            .is_allowed());

        let stranger = Keypair::generate().identity();
        let outcome = reg.request_action(stranger, id, ActionType::Read, b"").unwrap();
        assert_eq!(outcome.verdict, Verdict::Refused(RefusalReason::NotWhitelisted));
        assert_eq!(reg.read(id).unwrap().violation_count, 0);
    }

    #[test]
    fn test_expiry_uses_registry_clock() {
        let (mut reg, clock) = setup();
        let intent = RuleIntent::message("m", "x").expires_in(60);
        let id = reg.create(creator(), request(&intent)).unwrap();

        clock.set(T0 + 59);
        assert!(reg
            .request_action(actor(), id, ActionType::Read, b"")
            .unwrap()
            .verdict
            .is_allowed());

        clock.set(T0 + 60);
        let outcome = reg.request_action(actor(), id, ActionType::Read, b"").unwrap();
        assert_eq!(
            outcome.verdict.refusal().map(|r| r.to_string()).as_deref(),
            Some("RDO has expired")
        );
    }

    #[test]
    fn test_usage_limit() {
        let (mut reg, _) = setup();
        let id = reg
            .create(creator(), request(&RuleIntent::message("m", "x").max_uses(2)))
            .unwrap();

        for remaining in [1, 0] {
            assert!(reg
                .request_action(actor(), id, ActionType::Read, b"")
                .unwrap()
                .verdict
                .is_allowed());
            assert_eq!(reg.read(id).unwrap().uses_remaining, remaining);
        }

        let outcome = reg.request_action(actor(), id, ActionType::Read, b"").unwrap();
        assert_eq!(outcome.verdict, Verdict::Refused(RefusalReason::UsageLimitExceeded));
        assert_eq!(reg.read(id).unwrap().uses_remaining, 0);
    }

    #[test]
    fn test_unlimited_uses_never_decrement() {
        let (mut reg, _) = setup();
        let id = reg
            .create(creator(), request(&RuleIntent::message("m", "x")))
            .unwrap();
        for _ in 0..10 {
            reg.request_action(actor(), id, ActionType::Read, b"").unwrap();
        }
        assert_eq!(reg.read(id).unwrap().uses_remaining, 0);
        assert!(reg
            .request_action(actor(), id, ActionType::Read, b"")
            .unwrap()
            .verdict
            .is_allowed());
    }

    #[test]
    fn test_verify_refusal() {
        let (mut reg, _) = setup();
        let intent = RuleIntent::message("m", "x").forbid(ForbiddenAction::Forward);
        let id = reg.create(creator(), request(&intent)).unwrap();

        let refused = reg.request_action(actor(), id, ActionType::Forward, b"").unwrap();
        let proof = reg.verify_refusal(refused.event).unwrap();
        assert!(proof.rules_match);
        assert_eq!(proof.id, id);
        assert_eq!(proof.actor, actor());
        assert_eq!(proof.reason.to_string(), "Forwarding forbidden");

        let allowed = reg.request_action(actor(), id, ActionType::Read, b"").unwrap();
        assert!(matches!(
            reg.verify_refusal(allowed.event),
            Err(RegistryError::NotARefusal(_))
        ));
        assert!(matches!(
            reg.verify_refusal(EventRef(999)),
            Err(RegistryError::EventNotFound(_))
        ));
    }

    #[test]
    fn test_verify_rules_dispatches_on_version() {
        let (mut reg, _) = setup();
        let intent = RuleIntent::message("m", "x");
        let compiled = compile(&intent, T0);
        let id = reg.create(creator(), request(&intent)).unwrap();

        assert!(reg.verify_rules(id, &compiled.rule_set()).unwrap());
        let other = compile(&intent.clone().max_uses(1), T0);
        assert!(!reg.verify_rules(id, &other.rule_set()).unwrap());

        let legacy = LegacyRules {
            expiry: 0,
            allow_forward: false,
        };
        let legacy_id = reg
            .create(
                creator(),
                CreateRequest {
                    rules_hash: RuleSet::Legacy(legacy).digest(),
                    rules_version: SchemaVersion::Legacy,
                    object_type: ObjectType::Message,
                    rules: legacy.compact(),
                    metadata_pointer: "b3legacy".into(),
                    whitelist: vec![],
                },
            )
            .unwrap();
        assert!(reg.verify_rules(legacy_id, &RuleSet::Legacy(legacy)).unwrap());
        assert!(!reg.verify_rules(legacy_id, &compiled.rule_set()).unwrap());

        let outcome = reg
            .request_action(actor(), legacy_id, ActionType::Forward, b"")
            .unwrap();
        assert!(!outcome.verdict.is_allowed());
    }

    #[test]
    fn test_events_for_object() {
        let (mut reg, _) = setup();
        let a = reg.create(creator(), request(&RuleIntent::message("a", "x"))).unwrap();
        let b = reg.create(creator(), request(&RuleIntent::message("b", "y"))).unwrap();
        reg.request_action(actor(), a, ActionType::Read, b"").unwrap();
        reg.request_action(actor(), b, ActionType::Read, b"").unwrap();

        let for_a = reg.events_for(a);
        assert_eq!(for_a.len(), 2);
        assert_eq!(for_a[0].0, EventRef(0));
        assert_eq!(for_a[1].0, EventRef(2));
    }

    #[test]
    fn test_snapshot_restore() {
        let (mut reg, clock) = setup();
        let intent = RuleIntent::message("m", "x")
            .forbid(ForbiddenAction::Copy)
            .lock_on_violation();
        let id = reg.create(creator(), request(&intent)).unwrap();
        reg.request_action(actor(), id, ActionType::Copy, b"").unwrap();

        let bytes = reg.snapshot().unwrap();
        let mut restored = Registry::restore(&bytes, Arc::new(clock)).unwrap();

        assert_eq!(restored.read(id).unwrap(), reg.read(id).unwrap());
        assert_eq!(restored.events(), reg.events());
        let next = restored
            .create(creator(), request(&RuleIntent::message("n", "y")))
            .unwrap();
        assert_eq!(next, RdoId(2));
    }

    #[test]
    fn test_restore_rejects_garbage() {
        assert!(matches!(
            Registry::restore(b"not cbor", Arc::new(SystemClock)),
            Err(RegistryError::Snapshot(_))
        ));
    }

    fn encode(snapshot: &Snapshot) -> Vec<u8> {
        let mut buf = Vec::new();
        ciborium::into_writer(snapshot, &mut buf).unwrap();
        buf
    }

    fn populated() -> (Registry, RdoId) {
        let (mut reg, _) = setup();
        let id = reg
            .create(creator(), request(&RuleIntent::message("m", "x")))
            .unwrap();
        reg.request_action(actor(), id, ActionType::Read, b"").unwrap();
        (reg, id)
    }

    #[test]
    fn test_restore_rejects_zero_id_counter() {
        let bytes = encode(&Snapshot {
            version: SNAPSHOT_VERSION,
            next_id: 0,
            records: vec![],
            log: vec![],
        });
        assert!(matches!(
            Registry::restore(&bytes, Arc::new(SystemClock)),
            Err(RegistryError::Snapshot(_))
        ));
    }

    #[test]
    fn test_restore_rejects_duplicate_ids() {
        let (reg, id) = populated();
        let record = reg.read(id).unwrap().clone();
        let mut shadow = record.clone();
        shadow.rules_hash = RulesHash::hash(b"other rules");

        let bytes = encode(&Snapshot {
            version: SNAPSHOT_VERSION,
            next_id: 2,
            records: vec![record, shadow],
            log: reg.events().to_vec(),
        });
        assert!(matches!(
            Registry::restore(&bytes, Arc::new(SystemClock)),
            Err(RegistryError::Snapshot(_))
        ));
    }

    #[test]
    fn test_restore_rejects_events_for_unknown_objects() {
        let (reg, _) = populated();
        let bytes = encode(&Snapshot {
            version: SNAPSHOT_VERSION,
            next_id: 2,
            records: vec![],
            log: reg.events().to_vec(),
        });
        assert!(matches!(
            Registry::restore(&bytes, Arc::new(SystemClock)),
            Err(RegistryError::Snapshot(_))
        ));
    }

    #[test]
    fn test_restore_rejects_record_zero() {
        let (reg, id) = populated();
        let mut record = reg.read(id).unwrap().clone();
        record.id = RdoId(0);
        let bytes = encode(&Snapshot {
            version: SNAPSHOT_VERSION,
            next_id: 1,
            records: vec![record],
            log: vec![],
        });
        assert!(Registry::restore(&bytes, Arc::new(SystemClock)).is_err());
    }

    #[test]
    fn test_single_use_without_budget_allows_one_use() {
        let (mut reg, _) = setup();
        let wire = WireCreateRequest {
            rules_hash: *RulesHash::hash(b"r").as_bytes(),
            rules_version: 2,
            object_type: 2,
            access_type: 3,
            forbid_copy: false,
            forbid_forward: false,
            forbid_export: false,
            expiry: 0,
            max_uses: 0,
            lock_on_violation: false,
            require_identity: false,
            metadata_pointer: "b3m".into(),
            whitelist: vec![],
        };
        let id = reg.create_raw(creator(), wire).unwrap();
        let record = reg.read(id).unwrap();
        assert_eq!(record.rules.max_uses, 1);
        assert_eq!(record.uses_remaining, 1);

        let allowed = (0..5)
            .map(|_| reg.request_action(actor(), id, ActionType::Read, b"").unwrap())
            .filter(|o| o.verdict.is_allowed())
            .count();
        assert_eq!(allowed, 1);
        assert_eq!(
            reg.request_action(actor(), id, ActionType::Read, b"").unwrap().verdict,
            Verdict::Refused(RefusalReason::UsageLimitExceeded)
        );
    }

    #[test]
    fn test_actor_identity_is_taken_as_given() {
        let (mut reg, _) = setup();
        let intent = RuleIntent::message("m", "x").access(AccessType::CreatorOnly);
        let id = reg.create(creator(), request(&intent)).unwrap();

        // No signature is checked: naming the creator is enough.
        let outcome = reg
            .request_action(creator(), id, ActionType::Read, b"")
            .unwrap();
        assert!(outcome.verdict.is_allowed());
        assert!(matches!(
            reg.event(outcome.event),
            Some(RegistryEvent::Allowed { actor, .. }) if *actor == creator()
        ));
    }

    #[test]
    fn test_create_raw() {
        let (mut reg, _) = setup();
        let wire = WireCreateRequest {
            rules_hash: *RulesHash::hash(b"r").as_bytes(),
            rules_version: 2,
            object_type: 2,
            access_type: 4,
            forbid_copy: false,
            forbid_forward: true,
            forbid_export: false,
            expiry: 0,
            max_uses: 0,
            lock_on_violation: false,
            require_identity: false,
            metadata_pointer: "b3m".into(),
            whitelist: vec![*actor().as_bytes()],
        };
        let id = reg.create_raw(creator(), wire.clone()).unwrap();
        let record = reg.read(id).unwrap();
        assert_eq!(record.object_type, ObjectType::Link);
        assert!(record.is_whitelisted(&actor()));
        assert_eq!(
            record.rules,
            CompactRules {
                forbid_forward: true,
                access_type: AccessType::List,
                ..Default::default()
            }
        );

        let bad = WireCreateRequest {
            object_type: 4,
            ..wire
        };
        assert!(reg.create_raw(creator(), bad).is_err());
        assert_eq!(reg.len(), 1);
    }
    fn any_action() -> impl proptest::strategy::Strategy<Value = ActionType> {
        (0u8..6).prop_map(|c| ActionType::from_u8(c).unwrap())
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_state_is_monotonic(
            actions in prop::collection::vec((any_action(), 0u64..200), 1..40),
            lock in any::<bool>(),
            max_uses in 0u64..5,
        ) {
            let (mut reg, clock) = setup();
            let mut intent = RuleIntent::message("m", "x")
                .forbid(ForbiddenAction::Copy)
                .forbid(ForbiddenAction::Export)
                .expires_in(150)
                .max_uses(max_uses);
            if lock {
                intent = intent.lock_on_violation();
            }
            let id = reg.create(creator(), request(&intent)).unwrap();

            let mut prev = reg.read(id).unwrap().clone();
            for (action, offset) in actions {
                clock.set(T0 + offset);
                let outcome = reg.request_action(actor(), id, action, b"").unwrap();
                let now = reg.read(id).unwrap().clone();

                prop_assert!(!prev.locked || now.locked);
                prop_assert!(now.violation_count >= prev.violation_count);
                prop_assert!(now.uses_remaining <= prev.uses_remaining);
                prop_assert_eq!(now.rules_hash, prev.rules_hash);
                if prev.locked {
                    prop_assert_eq!(outcome.verdict, Verdict::Refused(RefusalReason::ObjectLocked));
                }
                prev = now;
            }
        }
    }
}
