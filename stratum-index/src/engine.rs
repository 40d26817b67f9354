//! The index engine: owns the connection, enforces the transaction
//! discipline, and exposes the full operation surface over the
//! hierarchy, attachments, tag projections, logs, and recycling queue.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, MutexGuard};

use chrono::Utc;
use rusqlite::Connection;

use stratum_core::dicom::{DicomMap, DicomTag};
use stratum_core::models::{
    Attachment, AttachmentType, ChangeEvent, ChangeKind, DatabaseConstraint, ExportedResource,
    GlobalPropertyId, MetadataKind, ResourceLevel,
};
use stratum_core::traits::{IDatabaseListener, IStorageArea};
use stratum_core::{MainTagsRegistry, StratumError, StratumResult};

use crate::connection::signals::SignalBuffer;
use crate::connection::transaction::Transaction;
use crate::connection::IndexConnection;
use crate::content;
use crate::lookup::{self, LookupMatch};
use crate::migrations;
use crate::queries::{
    attachments, changes, dicom_tags, exported, globals, metadata, recycling, resources,
};
use crate::schema;

const SIGNATURE_PROPERTIES: [(ResourceLevel, GlobalPropertyId); 4] = [
    (
        ResourceLevel::Patient,
        GlobalPropertyId::MAIN_TAGS_SIGNATURE_PATIENT,
    ),
    (
        ResourceLevel::Study,
        GlobalPropertyId::MAIN_TAGS_SIGNATURE_STUDY,
    ),
    (
        ResourceLevel::Series,
        GlobalPropertyId::MAIN_TAGS_SIGNATURE_SERIES,
    ),
    (
        ResourceLevel::Instance,
        GlobalPropertyId::MAIN_TAGS_SIGNATURE_INSTANCE,
    ),
];

fn now() -> String {
    Utc::now().to_rfc3339()
}

/// Single-writer engine over one database file (or an in-memory store).
///
/// Every externally observable operation must run inside a transaction
/// obtained from [`IndexEngine::start_transaction`]. Side effects of the
/// deletion cascade are buffered and reach the listener only after the
/// outermost commit.
pub struct IndexEngine {
    connection: IndexConnection,
    listener: RefCell<Box<dyn IDatabaseListener>>,
    registry: Arc<MainTagsRegistry>,
    version: Cell<u32>,
}

impl std::fmt::Debug for IndexEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexEngine")
            .field("version", &self.version.get())
            .finish_non_exhaustive()
    }
}

impl IndexEngine {
    /// Open a database file, creating the schema on first use. Fails with
    /// `IncompatibleSchema`, without touching the file, when the stored
    /// version is outside the supported window; call
    /// [`IndexEngine::upgrade`] to reach the current version.
    pub fn open(
        path: &Path,
        listener: Box<dyn IDatabaseListener>,
        registry: Arc<MainTagsRegistry>,
    ) -> StratumResult<Self> {
        Self::with_connection(IndexConnection::open(path)?, listener, registry)
    }

    /// In-memory engine, for tests and tooling.
    pub fn open_in_memory(
        listener: Box<dyn IDatabaseListener>,
        registry: Arc<MainTagsRegistry>,
    ) -> StratumResult<Self> {
        Self::with_connection(IndexConnection::open_in_memory()?, listener, registry)
    }

    fn with_connection(
        connection: IndexConnection,
        listener: Box<dyn IDatabaseListener>,
        registry: Arc<MainTagsRegistry>,
    ) -> StratumResult<Self> {
        let engine = IndexEngine {
            connection,
            listener: RefCell::new(listener),
            registry,
            version: Cell::new(0),
        };
        engine.initialize()?;
        Ok(engine)
    }

    fn initialize(&self) -> StratumResult<()> {
        let tx = self.start_transaction()?;

        if !self.connection.table_exists("Resources")? {
            schema::bootstrap(&self.connection)?;
            self.persist_signatures()?;
        }

        let text = globals::lookup_global_property(self.conn(), GlobalPropertyId::SCHEMA_VERSION)?
            .ok_or_else(|| StratumError::Corruption {
                details: "the schema-version property is missing".to_owned(),
            })?;
        let version: u32 = text.parse().map_err(|_| StratumError::Corruption {
            details: format!("the schema version should be an integer, found: {text}"),
        })?;

        migrations::check_schema_version(version)?;

        if version == schema::SCHEMA_VERSION {
            schema::ensure_size_triggers(&self.connection)?;
        }

        tx.commit()?;
        self.version.set(version);
        tracing::info!(version, "index database opened");
        Ok(())
    }

    /// Apply the pending migrations up to the current schema version.
    /// The v5→v6 step reprojects every resource from its cached DICOM
    /// JSON, hence the storage-area collaborator.
    pub fn upgrade(&self, storage: &dyn IStorageArea) -> StratumResult<()> {
        if self.version.get() == 3 {
            tracing::warn!("upgrading database version from 3 to 4");
            self.run_migration(3, |conn| migrations::v3_to_v4::migrate(conn))?;
            self.version.set(4);
        }

        if self.version.get() == 4 {
            tracing::warn!("upgrading database version from 4 to 5");
            self.run_migration(4, |conn| migrations::v4_to_v5::migrate(conn))?;
            self.version.set(5);
        }

        if self.version.get() == 5 {
            tracing::warn!("upgrading database version from 5 to 6");
            let registry = Arc::clone(&self.registry);
            self.run_migration(5, |conn| {
                migrations::v5_to_v6::migrate(conn, storage, &registry)
            })?;
            let tx = self.start_transaction()?;
            self.persist_signatures()?;
            tx.commit()?;
            self.version.set(6);
        }

        // Tracked independently of the schema version.
        let tx = self.start_transaction()?;
        schema::ensure_size_triggers(&self.connection)?;
        tx.commit()
    }

    fn run_migration(
        &self,
        from: u32,
        migrate: impl FnOnce(&Connection) -> StratumResult<()>,
    ) -> StratumResult<()> {
        let result = (|| {
            let tx = self.start_transaction()?;
            migrate(self.conn())?;
            tx.commit()
        })();

        result.map_err(|error| StratumError::MigrationFailed {
            version: from,
            reason: error.to_string(),
        })
    }

    fn persist_signatures(&self) -> StratumResult<()> {
        for (level, property) in SIGNATURE_PROPERTIES {
            globals::set_global_property(
                self.conn(),
                property,
                &self.registry.signature_of(level),
            )?;
        }
        Ok(())
    }

    /// The per-level signature recorded when tags were last projected;
    /// differs from the registry's current signature when the stored
    /// projections predate a configuration change.
    pub fn stored_main_tags_signature(
        &self,
        level: ResourceLevel,
    ) -> StratumResult<Option<String>> {
        let (_, property) = SIGNATURE_PROPERTIES
            .iter()
            .find(|(l, _)| *l == level)
            .expect("every level has a signature property");
        globals::lookup_global_property(self.conn(), *property)
    }

    pub fn schema_version(&self) -> u32 {
        self.version.get()
    }

    pub fn main_tags_registry(&self) -> &Arc<MainTagsRegistry> {
        &self.registry
    }

    fn conn(&self) -> &Connection {
        self.connection.raw()
    }

    pub(crate) fn connection(&self) -> &IndexConnection {
        &self.connection
    }

    fn lock_signals(&self) -> MutexGuard<'_, SignalBuffer> {
        self.connection
            .signals()
            .lock()
            .expect("signal buffer lock poisoned")
    }

    fn require_transaction(&self, operation: &str) -> StratumResult<()> {
        if self.connection.is_inside_transaction() {
            Ok(())
        } else {
            Err(StratumError::BadSequenceOfCalls {
                details: format!("{operation} requires an open transaction"),
            })
        }
    }

    // --- Transactions ---

    /// Open a (possibly nested) transaction frame. The frame rolls back
    /// when dropped without commit.
    pub fn start_transaction(&self) -> StratumResult<Transaction<'_>> {
        Transaction::begin(self)
    }

    pub(crate) fn commit_transaction(&self) -> StratumResult<()> {
        let outermost = self.connection.commit_transaction()?;
        if outermost {
            self.deliver_signals()?;
        }
        Ok(())
    }

    pub(crate) fn rollback_transaction(&self) -> StratumResult<()> {
        // The connection discards the buffered side effects when the
        // outermost frame actually rolls back.
        self.connection.rollback_transaction().map(|_| ())
    }

    /// Hand the buffered side effects to the listener, now that they are
    /// durable. A failing file-deletion callback is logged and reported
    /// as `StorageAreaFailure`, but does not stop the remaining
    /// deliveries.
    fn deliver_signals(&self) -> StratumResult<()> {
        let drained = std::mem::take(&mut *self.lock_signals());
        let mut listener = self.listener.borrow_mut();
        let mut failure: Option<StratumError> = None;

        for attachment in &drained.deleted_files {
            if let Err(error) = listener.signal_file_deleted(attachment) {
                tracing::warn!(%error, uuid = %attachment.uuid, "file-deletion callback failed");
                failure.get_or_insert(StratumError::StorageAreaFailure {
                    details: error.to_string(),
                });
            }
        }

        for change in &drained.pending_changes {
            listener.signal_change(change);
        }

        for (level, public_id) in &drained.pending_ancestors {
            listener.signal_remaining_ancestor(*level, public_id);
        }

        match failure {
            None => Ok(()),
            Some(error) => Err(error),
        }
    }

    // --- Resources ---

    pub fn create_resource(
        &self,
        public_id: &str,
        level: ResourceLevel,
    ) -> StratumResult<i64> {
        self.require_transaction("CreateResource")?;
        resources::create_resource(self.conn(), public_id, level)
    }

    pub fn lookup_resource(
        &self,
        public_id: &str,
    ) -> StratumResult<Option<(i64, ResourceLevel)>> {
        resources::lookup_resource(self.conn(), public_id)
    }

    pub fn is_existing_resource(&self, id: i64) -> StratumResult<bool> {
        resources::is_existing_resource(self.conn(), id)
    }

    pub fn attach_child(&self, parent: i64, child: i64) -> StratumResult<()> {
        self.require_transaction("AttachChild")?;
        resources::attach_child(self.conn(), parent, child)
    }

    pub fn get_public_id(&self, id: i64) -> StratumResult<String> {
        resources::get_public_id(self.conn(), id)
    }

    pub fn get_resource_level(&self, id: i64) -> StratumResult<ResourceLevel> {
        resources::get_resource_level(self.conn(), id)
    }

    pub fn lookup_parent(&self, id: i64) -> StratumResult<Option<i64>> {
        resources::lookup_parent(self.conn(), id)
    }

    pub fn get_parent_public_id(&self, id: i64) -> StratumResult<Option<String>> {
        resources::get_parent_public_id(self.conn(), id)
    }

    pub fn get_children_internal_id(&self, id: i64) -> StratumResult<Vec<i64>> {
        resources::get_children_internal_id(self.conn(), id)
    }

    pub fn get_children_public_id(&self, id: i64) -> StratumResult<Vec<String>> {
        resources::get_children_public_id(self.conn(), id)
    }

    pub fn get_resource_count(&self, level: ResourceLevel) -> StratumResult<u64> {
        resources::get_resource_count(self.conn(), level)
    }

    pub fn get_all_public_ids(&self, level: ResourceLevel) -> StratumResult<Vec<String>> {
        resources::get_all_public_ids(self.conn(), level)
    }

    pub fn get_all_public_ids_paged(
        &self,
        level: ResourceLevel,
        since: u64,
        limit: u64,
    ) -> StratumResult<Vec<String>> {
        resources::get_all_public_ids_paged(self.conn(), level, since, limit)
    }

    // --- Deletion engine ---

    /// Delete a resource and its whole subtree in one statement. The
    /// cascade emits one file-deletion command per attachment and one
    /// `Deleted` change event per resource; if the subtree's removal left
    /// an ancestor childless, the deepest such ancestor is reported once.
    /// Deleting an unknown id is a no-op that produces no callbacks.
    pub fn delete_resource(&self, id: i64) -> StratumResult<()> {
        self.require_transaction("DeleteResource")?;

        {
            let mut buffer = self.lock_signals();
            buffer.deleted_resources.clear();
            buffer.ancestor_candidates.clear();
        }

        if resources::delete_resource(self.conn(), id)? == 0 {
            return Ok(());
        }

        let (deleted, candidates) = {
            let mut buffer = self.lock_signals();
            (
                std::mem::take(&mut buffer.deleted_resources),
                std::mem::take(&mut buffer.ancestor_candidates),
            )
        };

        let date = now();
        let mut pending = Vec::with_capacity(deleted.len());
        for (public_id, level) in deleted {
            let seq =
                changes::log_change(self.conn(), ChangeKind::Deleted, level, &public_id, &date)?;
            pending.push(ChangeEvent {
                seq,
                kind: ChangeKind::Deleted,
                level,
                public_id,
                date: date.clone(),
            });
        }

        // Deepest reported ancestor that still exists after the delete.
        let mut remaining: Option<(ResourceLevel, String)> = None;
        for (public_id, level) in candidates {
            let deeper = remaining.as_ref().map_or(true, |(kept, _)| level > *kept);
            if deeper && resources::lookup_resource(self.conn(), &public_id)?.is_some() {
                remaining = Some((level, public_id));
            }
        }

        let mut buffer = self.lock_signals();
        buffer.pending_changes.extend(pending);
        if let Some((level, public_id)) = remaining {
            buffer.pending_ancestors.push((level, public_id));
        }
        Ok(())
    }

    // --- Metadata ---

    pub fn set_metadata(
        &self,
        id: i64,
        kind: MetadataKind,
        value: &str,
    ) -> StratumResult<()> {
        self.require_transaction("SetMetadata")?;
        metadata::set_metadata(self.conn(), id, kind, value)
    }

    pub fn delete_metadata(&self, id: i64, kind: MetadataKind) -> StratumResult<()> {
        self.require_transaction("DeleteMetadata")?;
        metadata::delete_metadata(self.conn(), id, kind)
    }

    pub fn lookup_metadata(
        &self,
        id: i64,
        kind: MetadataKind,
    ) -> StratumResult<Option<String>> {
        metadata::lookup_metadata(self.conn(), id, kind)
    }

    pub fn get_all_metadata(&self, id: i64) -> StratumResult<BTreeMap<MetadataKind, String>> {
        metadata::get_all_metadata(self.conn(), id)
    }

    pub fn list_available_metadata(&self, id: i64) -> StratumResult<Vec<MetadataKind>> {
        metadata::list_available_metadata(self.conn(), id)
    }

    // --- Attachments ---

    pub fn add_attachment(&self, id: i64, attachment: &Attachment) -> StratumResult<()> {
        self.require_transaction("AddAttachment")?;
        attachments::add_attachment(self.conn(), id, attachment)
    }

    pub fn delete_attachment(
        &self,
        id: i64,
        content_type: AttachmentType,
    ) -> StratumResult<()> {
        self.require_transaction("DeleteAttachment")?;
        attachments::delete_attachment(self.conn(), id, content_type)
    }

    pub fn lookup_attachment(
        &self,
        id: i64,
        content_type: AttachmentType,
    ) -> StratumResult<Option<Attachment>> {
        attachments::lookup_attachment(self.conn(), id, content_type)
    }

    pub fn list_available_attachments(&self, id: i64) -> StratumResult<Vec<AttachmentType>> {
        attachments::list_available_attachments(self.conn(), id)
    }

    pub fn get_total_compressed_size(&self) -> StratumResult<u64> {
        globals::get_total_compressed_size(self.conn())
    }

    pub fn get_total_uncompressed_size(&self) -> StratumResult<u64> {
        globals::get_total_uncompressed_size(self.conn())
    }

    /// Single comparison against the aggregate; the recycling policy
    /// layer polls this.
    pub fn is_disk_size_above(&self, threshold: u64) -> StratumResult<bool> {
        Ok(self.get_total_compressed_size()? > threshold)
    }

    // --- Tag projections ---

    pub fn set_main_dicom_tag(&self, id: i64, tag: DicomTag, value: &str) -> StratumResult<()> {
        self.require_transaction("SetMainDicomTag")?;
        dicom_tags::set_main_dicom_tag(self.conn(), id, tag, value)
    }

    pub fn set_identifier_tag(&self, id: i64, tag: DicomTag, value: &str) -> StratumResult<()> {
        self.require_transaction("SetIdentifierTag")?;
        dicom_tags::set_identifier_tag(self.conn(), id, tag, value)
    }

    pub fn clear_main_dicom_tags(&self, id: i64) -> StratumResult<()> {
        self.require_transaction("ClearMainDicomTags")?;
        dicom_tags::clear_main_dicom_tags(self.conn(), id)
    }

    pub fn get_main_dicom_tags(&self, id: i64) -> StratumResult<DicomMap> {
        dicom_tags::get_main_dicom_tags(self.conn(), id)
    }

    /// Project a parsed tag map onto a resource: main tags per the
    /// registry, identifier tags normalized.
    pub fn store_resource_content(
        &self,
        id: i64,
        level: ResourceLevel,
        map: &DicomMap,
    ) -> StratumResult<()> {
        self.require_transaction("StoreResourceContent")?;
        content::store_resource_content(self.conn(), id, level, map, &self.registry)
    }

    // --- Global properties ---

    pub fn set_global_property(
        &self,
        property: GlobalPropertyId,
        value: &str,
    ) -> StratumResult<()> {
        self.require_transaction("SetGlobalProperty")?;
        globals::set_global_property(self.conn(), property, value)
    }

    pub fn lookup_global_property(
        &self,
        property: GlobalPropertyId,
    ) -> StratumResult<Option<String>> {
        globals::lookup_global_property(self.conn(), property)
    }

    pub fn increment_global_sequence(&self, property: GlobalPropertyId) -> StratumResult<u64> {
        self.require_transaction("IncrementGlobalSequence")?;
        globals::increment_global_sequence(self.conn(), property)
    }

    // --- Change log ---

    /// Append a change event; it reaches the listener once the enclosing
    /// transaction commits. Returns the sequence number.
    pub fn log_change(
        &self,
        kind: ChangeKind,
        level: ResourceLevel,
        public_id: &str,
    ) -> StratumResult<i64> {
        self.require_transaction("LogChange")?;

        let date = now();
        let seq = changes::log_change(self.conn(), kind, level, public_id, &date)?;
        self.lock_signals().pending_changes.push(ChangeEvent {
            seq,
            kind,
            level,
            public_id: public_id.to_owned(),
            date,
        });
        Ok(seq)
    }

    pub fn get_changes(
        &self,
        since: i64,
        max_results: usize,
    ) -> StratumResult<(Vec<ChangeEvent>, bool)> {
        changes::get_changes(self.conn(), since, max_results)
    }

    pub fn get_last_change(&self) -> StratumResult<Option<ChangeEvent>> {
        changes::get_last_change(self.conn())
    }

    pub fn get_last_change_index(&self) -> StratumResult<i64> {
        changes::get_last_change_index(self.conn())
    }

    pub fn clear_changes(&self) -> StratumResult<()> {
        self.require_transaction("ClearChanges")?;
        changes::clear_changes(self.conn())
    }

    // --- Exported-resource log ---

    /// Append an export record; the `seq` field of the input is ignored
    /// and the allocated sequence number is returned.
    pub fn log_exported_resource(&self, resource: &ExportedResource) -> StratumResult<i64> {
        self.require_transaction("LogExportedResource")?;
        exported::log_exported_resource(self.conn(), resource)
    }

    pub fn get_exported_resources(
        &self,
        since: i64,
        max_results: usize,
    ) -> StratumResult<(Vec<ExportedResource>, bool)> {
        exported::get_exported_resources(self.conn(), since, max_results)
    }

    pub fn get_last_exported_resource(&self) -> StratumResult<Option<ExportedResource>> {
        exported::get_last_exported_resource(self.conn())
    }

    pub fn clear_exported_resources(&self) -> StratumResult<()> {
        self.require_transaction("ClearExportedResources")?;
        exported::clear_exported_resources(self.conn())
    }

    // --- Recycling ---

    pub fn select_patient_to_recycle(&self, avoid: Option<i64>) -> StratumResult<Option<i64>> {
        recycling::select_patient_to_recycle(self.conn(), avoid)
    }

    pub fn is_protected_patient(&self, id: i64) -> StratumResult<bool> {
        recycling::is_protected_patient(self.conn(), id)
    }

    pub fn set_protected_patient(&self, id: i64, protected: bool) -> StratumResult<()> {
        self.require_transaction("SetProtectedPatient")?;
        recycling::set_protected_patient(self.conn(), id, protected)
    }

    pub fn tag_most_recent_patient(&self, id: i64) -> StratumResult<()> {
        self.require_transaction("TagMostRecentPatient")?;
        recycling::tag_most_recent_patient(self.conn(), id)
    }

    // --- Lookup ---

    /// Structured lookup: a conjunction of per-level constraints resolved
    /// at `query_level`, optionally capped at `limit` matches (0 means
    /// unlimited) and optionally answering one instance per match.
    pub fn lookup_resources(
        &self,
        constraints: &[DatabaseConstraint],
        query_level: ResourceLevel,
        limit: usize,
        fetch_instances: bool,
    ) -> StratumResult<Vec<LookupMatch>> {
        lookup::apply_lookup_resources(
            self.conn(),
            constraints,
            query_level,
            limit,
            fetch_instances,
        )
    }
}
