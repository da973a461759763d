// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use micasa_app::{
    Appliance, ApplianceFormInput, ApplianceId, EntityRef, EntityStore, FormKind, HouseProfile,
    HouseProfileFormInput, HouseProfileId, LifecycleError, MaintenanceCategory,
    MaintenanceCategoryId, MaintenanceItem, MaintenanceItemFormInput, MaintenanceItemId, Project,
    ProjectFormInput, ProjectId, ProjectStatus, ProjectType, ProjectTypeId, Quote, QuoteFormInput,
    QuoteId, Vendor, VendorFormInput, VendorId,
};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};
use tracing::debug;

mod demo;

pub const APP_NAME: &str = "micasa";

const DEFAULT_PROJECT_TYPES: [&str; 12] = [
    "Appliance",
    "Electrical",
    "Exterior",
    "Flooring",
    "HVAC",
    "Landscaping",
    "Painting",
    "Plumbing",
    "Remodel",
    "Roof",
    "Structural",
    "Windows",
];

const DEFAULT_MAINTENANCE_CATEGORIES: [&str; 9] = [
    "Appliance",
    "Electrical",
    "Exterior",
    "HVAC",
    "Interior",
    "Landscaping",
    "Plumbing",
    "Safety",
    "Structural",
];

const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[
    ("project_types", &["id", "name"]),
    ("maintenance_categories", &["id", "name"]),
    (
        "vendors",
        &["id", "name", "created_at", "updated_at", "deleted_at"],
    ),
    (
        "projects",
        &[
            "id",
            "title",
            "project_type_id",
            "status",
            "budget_cents",
            "created_at",
            "updated_at",
            "deleted_at",
        ],
    ),
    (
        "quotes",
        &[
            "id",
            "project_id",
            "vendor_id",
            "total_cents",
            "created_at",
            "updated_at",
            "deleted_at",
        ],
    ),
    (
        "appliances",
        &["id", "name", "created_at", "updated_at", "deleted_at"],
    ),
    (
        "maintenance_items",
        &[
            "id",
            "name",
            "category_id",
            "appliance_id",
            "interval_months",
            "created_at",
            "updated_at",
            "deleted_at",
        ],
    ),
    (
        "house_profiles",
        &["id", "nickname", "created_at", "updated_at"],
    ),
];

const REQUIRED_INDEXES: &[(&str, &str)] = &[
    (
        "idx_project_types_name",
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_project_types_name ON project_types (name);",
    ),
    (
        "idx_maintenance_categories_name",
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_maintenance_categories_name \
         ON maintenance_categories (name);",
    ),
    (
        "idx_quotes_project_id",
        "CREATE INDEX IF NOT EXISTS idx_quotes_project_id ON quotes (project_id);",
    ),
    (
        "idx_quotes_vendor_id",
        "CREATE INDEX IF NOT EXISTS idx_quotes_vendor_id ON quotes (vendor_id);",
    ),
    (
        "idx_maintenance_items_appliance_id",
        "CREATE INDEX IF NOT EXISTS idx_maintenance_items_appliance_id \
         ON maintenance_items (appliance_id);",
    ),
];

const PROJECT_COLUMNS: &str = "
    id, title, project_type_id, status, description,
    start_date, end_date, budget_cents, actual_cents,
    created_at, updated_at, deleted_at";

const QUOTE_COLUMNS: &str = "
    id, project_id, vendor_id, total_cents, labor_cents,
    materials_cents, other_cents, received_date, notes,
    created_at, updated_at, deleted_at";

const MAINTENANCE_COLUMNS: &str = "
    id, name, category_id, appliance_id, last_serviced_at,
    interval_months, notes, cost_cents,
    created_at, updated_at, deleted_at";

const APPLIANCE_COLUMNS: &str = "
    id, name, brand, model_number, serial_number,
    purchase_date, warranty_expiry, location, cost_cents, notes,
    created_at, updated_at, deleted_at";

const VENDOR_COLUMNS: &str = "
    id, name, contact_name, email, phone, website, notes,
    created_at, updated_at, deleted_at";

const HOUSE_PROFILE_COLUMNS: &str = "
    id, nickname, address_line_1, city, state, postal_code,
    year_built, square_feet, bedrooms, roof_type, heating_type,
    insurance_carrier, insurance_renewal, property_tax_cents,
    created_at, updated_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DependentRelation {
    ProjectQuotes,
    VendorQuotes,
    ApplianceMaintenanceItems,
}

impl DependentRelation {
    const fn table(self) -> &'static str {
        match self {
            Self::ProjectQuotes | Self::VendorQuotes => "quotes",
            Self::ApplianceMaintenanceItems => "maintenance_items",
        }
    }

    const fn fk_column(self) -> &'static str {
        match self {
            Self::ProjectQuotes => "project_id",
            Self::VendorQuotes => "vendor_id",
            Self::ApplianceMaintenanceItems => "appliance_id",
        }
    }
}

const fn table_for(kind: FormKind) -> &'static str {
    match kind {
        FormKind::Project => "projects",
        FormKind::Quote => "quotes",
        FormKind::MaintenanceItem => "maintenance_items",
        FormKind::Appliance => "appliances",
        FormKind::Vendor => "vendors",
        FormKind::House => "house_profiles",
    }
}

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let printable = path.to_string_lossy().to_string();
        validate_db_path(&printable)?;
        let conn = Connection::open(path)
            .with_context(|| format!("open database at {}", path.display()))?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory database")?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn raw_connection(&self) -> &Connection {
        &self.conn
    }

    pub fn bootstrap(&self) -> Result<()> {
        if has_user_tables(&self.conn)? {
            validate_schema(&self.conn)?;
        } else {
            debug!("creating schema");
            self.conn
                .execute_batch(include_str!("sql/schema.sql"))
                .context("create schema")?;
        }

        for (name, create_sql) in REQUIRED_INDEXES {
            self.conn
                .execute_batch(create_sql)
                .with_context(|| format!("ensure required index `{name}`"))?;
        }

        self.seed_defaults()
    }

    pub fn seed_defaults(&self) -> Result<()> {
        for project_type in DEFAULT_PROJECT_TYPES {
            self.conn
                .execute(
                    "INSERT OR IGNORE INTO project_types (name) VALUES (?)",
                    params![project_type],
                )
                .with_context(|| format!("insert default project type {project_type}"))?;
        }

        for category in DEFAULT_MAINTENANCE_CATEGORIES {
            self.conn
                .execute(
                    "INSERT OR IGNORE INTO maintenance_categories (name) VALUES (?)",
                    params![category],
                )
                .with_context(|| format!("insert default maintenance category {category}"))?;
        }
        Ok(())
    }

    fn list_rows<T>(
        &self,
        kind: FormKind,
        columns: &str,
        include_deleted: bool,
        map: fn(&Row<'_>) -> rusqlite::Result<T>,
    ) -> Result<Vec<T>> {
        let table = table_for(kind);
        let mut sql = format!("SELECT {columns} FROM {table}");
        if !include_deleted {
            sql.push_str(" WHERE deleted_at IS NULL");
        }
        sql.push_str(" ORDER BY id ASC");

        let mut stmt = self
            .conn
            .prepare(&sql)
            .with_context(|| format!("prepare {table} query"))?;
        let rows = stmt
            .query_map([], map)
            .with_context(|| format!("query {table}"))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .with_context(|| format!("collect {table}"))
    }

    fn get_row<T>(
        &self,
        kind: FormKind,
        columns: &str,
        id: i64,
        map: fn(&Row<'_>) -> rusqlite::Result<T>,
    ) -> Result<T> {
        let sql = format!("SELECT {columns} FROM {} WHERE id = ?", table_for(kind));
        self.conn
            .query_row(&sql, params![id], map)
            .optional()
            .with_context(|| format!("load {} {id}", kind.noun()))?
            .ok_or_else(|| LifecycleError::not_found(kind, id).into())
    }

    /// `None` when the row is missing, otherwise whether it is soft-deleted.
    fn deleted_state(&self, kind: FormKind, id: i64) -> Result<Option<bool>> {
        let sql = format!("SELECT deleted_at FROM {} WHERE id = ?", table_for(kind));
        let deleted_at: Option<Option<String>> = self
            .conn
            .query_row(&sql, params![id], |row| row.get(0))
            .optional()
            .with_context(|| format!("load lifecycle state for {} {id}", kind.noun()))?;
        Ok(deleted_at.map(|deleted_at| deleted_at.is_some()))
    }

    /// Explains why an update touching zero rows did nothing.
    fn missing_or_deleted(&self, kind: FormKind, id: i64) -> anyhow::Error {
        match self.deleted_state(kind, id) {
            Ok(Some(true)) => LifecycleError::Blocked(format!(
                "{} {id} is deleted -- restore it before editing",
                kind.noun()
            ))
            .into(),
            Ok(_) => LifecycleError::not_found(kind, id).into(),
            Err(error) => error,
        }
    }

    fn count_active_dependents(&self, relation: DependentRelation, parent_id: i64) -> Result<i64> {
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE {} = ? AND deleted_at IS NULL",
            relation.table(),
            relation.fk_column()
        );
        self.conn
            .query_row(&sql, params![parent_id], |row| row.get(0))
            .with_context(|| {
                format!(
                    "count dependents in {} for {}={parent_id}",
                    relation.table(),
                    relation.fk_column()
                )
            })
    }

    fn ensure_can_soft_delete(&self, target: EntityRef) -> Result<()> {
        let (relation, dependents) = match target {
            EntityRef::Project(_) => (DependentRelation::ProjectQuotes, "quote(s)"),
            EntityRef::Vendor(_) => (DependentRelation::VendorQuotes, "quote(s)"),
            EntityRef::Appliance(_) => (
                DependentRelation::ApplianceMaintenanceItems,
                "maintenance item(s)",
            ),
            EntityRef::Quote(_) | EntityRef::MaintenanceItem(_) => return Ok(()),
        };
        let count = self.count_active_dependents(relation, target.id())?;
        if count > 0 {
            return Err(LifecycleError::Blocked(format!(
                "{} {} has {count} active {dependents} -- delete them first",
                target.kind().noun(),
                target.id()
            ))
            .into());
        }
        Ok(())
    }

    fn ensure_can_restore(&self, target: EntityRef) -> Result<()> {
        match target {
            EntityRef::Quote(quote_id) => {
                let (project_id, vendor_id): (i64, i64) = self
                    .conn
                    .query_row(
                        "SELECT project_id, vendor_id FROM quotes WHERE id = ?",
                        params![quote_id.get()],
                        |row| Ok((row.get(0)?, row.get(1)?)),
                    )
                    .with_context(|| format!("load quote {quote_id}"))?;
                self.require_parent_alive(EntityRef::Project(ProjectId::new(project_id)))?;
                self.require_parent_alive(EntityRef::Vendor(VendorId::new(vendor_id)))
            }
            EntityRef::MaintenanceItem(maintenance_id) => {
                let appliance_id: Option<i64> = self
                    .conn
                    .query_row(
                        "SELECT appliance_id FROM maintenance_items WHERE id = ?",
                        params![maintenance_id.get()],
                        |row| row.get(0),
                    )
                    .with_context(|| format!("load maintenance item {maintenance_id}"))?;
                match appliance_id {
                    Some(appliance_id) => self
                        .require_parent_alive(EntityRef::Appliance(ApplianceId::new(appliance_id))),
                    None => Ok(()),
                }
            }
            EntityRef::Project(_) | EntityRef::Vendor(_) | EntityRef::Appliance(_) => Ok(()),
        }
    }

    fn require_parent_alive(&self, parent: EntityRef) -> Result<()> {
        let label = parent.kind().noun();
        match self.deleted_state(parent.kind(), parent.id())? {
            Some(false) => Ok(()),
            Some(true) => Err(LifecycleError::Blocked(format!(
                "{label} {} is deleted -- restore it first",
                parent.id()
            ))
            .into()),
            None => Err(LifecycleError::Blocked(format!(
                "{label} {} no longer exists",
                parent.id()
            ))
            .into()),
        }
    }

    /// Guards a snapshot write that flips the soft-delete state of a row.
    fn ensure_lifecycle_transition(&self, target: EntityRef, will_be_deleted: bool) -> Result<()> {
        let was_deleted = self
            .deleted_state(target.kind(), target.id())?
            .ok_or_else(|| LifecycleError::not_found(target.kind(), target.id()))?;
        match (was_deleted, will_be_deleted) {
            (false, true) => self.ensure_can_soft_delete(target),
            (true, false) => self.ensure_can_restore(target),
            _ => Ok(()),
        }
    }

    fn soft_delete_entity(&self, target: EntityRef) -> Result<()> {
        let kind = target.kind();
        let now = now_rfc3339()?;
        let sql = format!(
            "UPDATE {} SET deleted_at = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
            table_for(kind)
        );
        let rows_affected = self
            .conn
            .execute(&sql, params![now, now, target.id()])
            .with_context(|| format!("soft delete {} {}", kind.noun(), target.id()))?;
        if rows_affected == 0 {
            return Err(match self.deleted_state(kind, target.id())? {
                Some(_) => LifecycleError::Blocked(format!(
                    "{} {} is already deleted",
                    kind.noun(),
                    target.id()
                )),
                None => LifecycleError::not_found(kind, target.id()),
            }
            .into());
        }
        Ok(())
    }

    fn restore_entity(&self, target: EntityRef) -> Result<()> {
        let kind = target.kind();
        let now = now_rfc3339()?;
        let sql = format!(
            "UPDATE {} SET deleted_at = NULL, updated_at = ? \
             WHERE id = ? AND deleted_at IS NOT NULL",
            table_for(kind)
        );
        let rows_affected = self
            .conn
            .execute(&sql, params![now, target.id()])
            .with_context(|| format!("restore {} {}", kind.noun(), target.id()))?;
        if rows_affected == 0 {
            return Err(match self.deleted_state(kind, target.id())? {
                Some(_) => LifecycleError::Blocked(format!(
                    "{} {} is not deleted",
                    kind.noun(),
                    target.id()
                )),
                None => LifecycleError::not_found(kind, target.id()),
            }
            .into());
        }
        Ok(())
    }

    fn require_quote_parents(&self, project_id: ProjectId, vendor_id: VendorId) -> Result<()> {
        self.require_parent_alive(EntityRef::Project(project_id))?;
        self.require_parent_alive(EntityRef::Vendor(vendor_id))
    }

    fn require_maintenance_parents(&self, input: &MaintenanceItemFormInput) -> Result<()> {
        if let Some(appliance_id) = input.appliance_id {
            self.require_parent_alive(EntityRef::Appliance(appliance_id))?;
        }
        Ok(())
    }
}

impl EntityStore for Store {
    fn list_project_types(&self) -> Result<Vec<ProjectType>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM project_types ORDER BY name ASC")
            .context("prepare project types query")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(ProjectType {
                    id: ProjectTypeId::new(row.get(0)?),
                    name: row.get(1)?,
                })
            })
            .context("query project types")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect project types")
    }

    fn list_maintenance_categories(&self) -> Result<Vec<MaintenanceCategory>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM maintenance_categories ORDER BY name ASC")
            .context("prepare maintenance categories query")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(MaintenanceCategory {
                    id: MaintenanceCategoryId::new(row.get(0)?),
                    name: row.get(1)?,
                })
            })
            .context("query maintenance categories")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect maintenance categories")
    }

    fn list_projects(&self, include_deleted: bool) -> Result<Vec<Project>> {
        self.list_rows(
            FormKind::Project,
            PROJECT_COLUMNS,
            include_deleted,
            project_from_row,
        )
    }

    fn get_project(&self, id: ProjectId) -> Result<Project> {
        self.get_row(FormKind::Project, PROJECT_COLUMNS, id.get(), project_from_row)
    }

    fn create_project(&self, input: &ProjectFormInput) -> Result<ProjectId> {
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "
                INSERT INTO projects (
                  title, project_type_id, status, description,
                  start_date, end_date, budget_cents, actual_cents,
                  created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ",
                params![
                    input.title,
                    input.project_type_id.get(),
                    input.status.as_str(),
                    input.description,
                    input.start_date.map(format_date),
                    input.end_date.map(format_date),
                    input.budget_cents,
                    input.actual_cents,
                    now,
                    now,
                ],
            )
            .context("insert project")?;
        Ok(ProjectId::new(self.conn.last_insert_rowid()))
    }

    fn update_project(&self, id: ProjectId, input: &ProjectFormInput) -> Result<()> {
        let now = now_rfc3339()?;
        let rows_affected = self
            .conn
            .execute(
                "
                UPDATE projects
                SET
                  title = ?, project_type_id = ?, status = ?, description = ?,
                  start_date = ?, end_date = ?, budget_cents = ?, actual_cents = ?,
                  updated_at = ?
                WHERE id = ? AND deleted_at IS NULL
                ",
                params![
                    input.title,
                    input.project_type_id.get(),
                    input.status.as_str(),
                    input.description,
                    input.start_date.map(format_date),
                    input.end_date.map(format_date),
                    input.budget_cents,
                    input.actual_cents,
                    now,
                    id.get(),
                ],
            )
            .context("update project")?;
        if rows_affected == 0 {
            return Err(self.missing_or_deleted(FormKind::Project, id.get()));
        }
        Ok(())
    }

    fn replace_project(&self, snapshot: &Project) -> Result<()> {
        let target = EntityRef::Project(snapshot.id);
        self.ensure_lifecycle_transition(target, snapshot.deleted_at.is_some())?;
        self.conn
            .execute(
                "
                UPDATE projects
                SET
                  title = ?, project_type_id = ?, status = ?, description = ?,
                  start_date = ?, end_date = ?, budget_cents = ?, actual_cents = ?,
                  created_at = ?, updated_at = ?, deleted_at = ?
                WHERE id = ?
                ",
                params![
                    snapshot.title,
                    snapshot.project_type_id.get(),
                    snapshot.status.as_str(),
                    snapshot.description,
                    snapshot.start_date.map(format_date),
                    snapshot.end_date.map(format_date),
                    snapshot.budget_cents,
                    snapshot.actual_cents,
                    format_datetime(snapshot.created_at)?,
                    format_datetime(snapshot.updated_at)?,
                    snapshot.deleted_at.map(format_datetime).transpose()?,
                    snapshot.id.get(),
                ],
            )
            .with_context(|| format!("replace project {}", snapshot.id))?;
        Ok(())
    }

    fn list_quotes(&self, include_deleted: bool) -> Result<Vec<Quote>> {
        self.list_rows(FormKind::Quote, QUOTE_COLUMNS, include_deleted, quote_from_row)
    }

    fn get_quote(&self, id: QuoteId) -> Result<Quote> {
        self.get_row(FormKind::Quote, QUOTE_COLUMNS, id.get(), quote_from_row)
    }

    fn create_quote(&self, input: &QuoteFormInput) -> Result<QuoteId> {
        self.require_quote_parents(input.project_id, input.vendor_id)?;
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "
                INSERT INTO quotes (
                  project_id, vendor_id, total_cents, labor_cents,
                  materials_cents, other_cents, received_date, notes,
                  created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ",
                params![
                    input.project_id.get(),
                    input.vendor_id.get(),
                    input.total_cents,
                    input.labor_cents,
                    input.materials_cents,
                    input.other_cents,
                    input.received_date.map(format_date),
                    input.notes,
                    now,
                    now,
                ],
            )
            .context("insert quote")?;
        Ok(QuoteId::new(self.conn.last_insert_rowid()))
    }

    fn update_quote(&self, id: QuoteId, input: &QuoteFormInput) -> Result<()> {
        self.require_quote_parents(input.project_id, input.vendor_id)?;
        let now = now_rfc3339()?;
        let rows_affected = self
            .conn
            .execute(
                "
                UPDATE quotes
                SET
                  project_id = ?, vendor_id = ?, total_cents = ?, labor_cents = ?,
                  materials_cents = ?, other_cents = ?, received_date = ?, notes = ?,
                  updated_at = ?
                WHERE id = ? AND deleted_at IS NULL
                ",
                params![
                    input.project_id.get(),
                    input.vendor_id.get(),
                    input.total_cents,
                    input.labor_cents,
                    input.materials_cents,
                    input.other_cents,
                    input.received_date.map(format_date),
                    input.notes,
                    now,
                    id.get(),
                ],
            )
            .context("update quote")?;
        if rows_affected == 0 {
            return Err(self.missing_or_deleted(FormKind::Quote, id.get()));
        }
        Ok(())
    }

    fn replace_quote(&self, snapshot: &Quote) -> Result<()> {
        let target = EntityRef::Quote(snapshot.id);
        self.ensure_lifecycle_transition(target, snapshot.deleted_at.is_some())?;
        if snapshot.deleted_at.is_none() {
            self.require_quote_parents(snapshot.project_id, snapshot.vendor_id)?;
        }
        self.conn
            .execute(
                "
                UPDATE quotes
                SET
                  project_id = ?, vendor_id = ?, total_cents = ?, labor_cents = ?,
                  materials_cents = ?, other_cents = ?, received_date = ?, notes = ?,
                  created_at = ?, updated_at = ?, deleted_at = ?
                WHERE id = ?
                ",
                params![
                    snapshot.project_id.get(),
                    snapshot.vendor_id.get(),
                    snapshot.total_cents,
                    snapshot.labor_cents,
                    snapshot.materials_cents,
                    snapshot.other_cents,
                    snapshot.received_date.map(format_date),
                    snapshot.notes,
                    format_datetime(snapshot.created_at)?,
                    format_datetime(snapshot.updated_at)?,
                    snapshot.deleted_at.map(format_datetime).transpose()?,
                    snapshot.id.get(),
                ],
            )
            .with_context(|| format!("replace quote {}", snapshot.id))?;
        Ok(())
    }

    fn list_maintenance_items(&self, include_deleted: bool) -> Result<Vec<MaintenanceItem>> {
        self.list_rows(
            FormKind::MaintenanceItem,
            MAINTENANCE_COLUMNS,
            include_deleted,
            maintenance_from_row,
        )
    }

    fn get_maintenance_item(&self, id: MaintenanceItemId) -> Result<MaintenanceItem> {
        self.get_row(
            FormKind::MaintenanceItem,
            MAINTENANCE_COLUMNS,
            id.get(),
            maintenance_from_row,
        )
    }

    fn create_maintenance_item(
        &self,
        input: &MaintenanceItemFormInput,
    ) -> Result<MaintenanceItemId> {
        self.require_maintenance_parents(input)?;
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "
                INSERT INTO maintenance_items (
                  name, category_id, appliance_id, last_serviced_at,
                  interval_months, notes, cost_cents,
                  created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                ",
                params![
                    input.name,
                    input.category_id.get(),
                    input.appliance_id.map(ApplianceId::get),
                    input.last_serviced_at.map(format_date),
                    input.interval_months,
                    input.notes,
                    input.cost_cents,
                    now,
                    now,
                ],
            )
            .context("insert maintenance item")?;
        Ok(MaintenanceItemId::new(self.conn.last_insert_rowid()))
    }

    fn update_maintenance_item(
        &self,
        id: MaintenanceItemId,
        input: &MaintenanceItemFormInput,
    ) -> Result<()> {
        self.require_maintenance_parents(input)?;
        let now = now_rfc3339()?;
        let rows_affected = self
            .conn
            .execute(
                "
                UPDATE maintenance_items
                SET
                  name = ?, category_id = ?, appliance_id = ?, last_serviced_at = ?,
                  interval_months = ?, notes = ?, cost_cents = ?,
                  updated_at = ?
                WHERE id = ? AND deleted_at IS NULL
                ",
                params![
                    input.name,
                    input.category_id.get(),
                    input.appliance_id.map(ApplianceId::get),
                    input.last_serviced_at.map(format_date),
                    input.interval_months,
                    input.notes,
                    input.cost_cents,
                    now,
                    id.get(),
                ],
            )
            .context("update maintenance item")?;
        if rows_affected == 0 {
            return Err(self.missing_or_deleted(FormKind::MaintenanceItem, id.get()));
        }
        Ok(())
    }

    fn replace_maintenance_item(&self, snapshot: &MaintenanceItem) -> Result<()> {
        let target = EntityRef::MaintenanceItem(snapshot.id);
        self.ensure_lifecycle_transition(target, snapshot.deleted_at.is_some())?;
        if snapshot.deleted_at.is_none()
            && let Some(appliance_id) = snapshot.appliance_id
        {
            self.require_parent_alive(EntityRef::Appliance(appliance_id))?;
        }
        self.conn
            .execute(
                "
                UPDATE maintenance_items
                SET
                  name = ?, category_id = ?, appliance_id = ?, last_serviced_at = ?,
                  interval_months = ?, notes = ?, cost_cents = ?,
                  created_at = ?, updated_at = ?, deleted_at = ?
                WHERE id = ?
                ",
                params![
                    snapshot.name,
                    snapshot.category_id.get(),
                    snapshot.appliance_id.map(ApplianceId::get),
                    snapshot.last_serviced_at.map(format_date),
                    snapshot.interval_months,
                    snapshot.notes,
                    snapshot.cost_cents,
                    format_datetime(snapshot.created_at)?,
                    format_datetime(snapshot.updated_at)?,
                    snapshot.deleted_at.map(format_datetime).transpose()?,
                    snapshot.id.get(),
                ],
            )
            .with_context(|| format!("replace maintenance item {}", snapshot.id))?;
        Ok(())
    }

    fn list_appliances(&self, include_deleted: bool) -> Result<Vec<Appliance>> {
        self.list_rows(
            FormKind::Appliance,
            APPLIANCE_COLUMNS,
            include_deleted,
            appliance_from_row,
        )
    }

    fn get_appliance(&self, id: ApplianceId) -> Result<Appliance> {
        self.get_row(
            FormKind::Appliance,
            APPLIANCE_COLUMNS,
            id.get(),
            appliance_from_row,
        )
    }

    fn create_appliance(&self, input: &ApplianceFormInput) -> Result<ApplianceId> {
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "
                INSERT INTO appliances (
                  name, brand, model_number, serial_number,
                  purchase_date, warranty_expiry, location, cost_cents, notes,
                  created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ",
                params![
                    input.name,
                    input.brand,
                    input.model_number,
                    input.serial_number,
                    input.purchase_date.map(format_date),
                    input.warranty_expiry.map(format_date),
                    input.location,
                    input.cost_cents,
                    input.notes,
                    now,
                    now,
                ],
            )
            .context("insert appliance")?;
        Ok(ApplianceId::new(self.conn.last_insert_rowid()))
    }

    fn update_appliance(&self, id: ApplianceId, input: &ApplianceFormInput) -> Result<()> {
        let now = now_rfc3339()?;
        let rows_affected = self
            .conn
            .execute(
                "
                UPDATE appliances
                SET
                  name = ?, brand = ?, model_number = ?, serial_number = ?,
                  purchase_date = ?, warranty_expiry = ?, location = ?, cost_cents = ?,
                  notes = ?, updated_at = ?
                WHERE id = ? AND deleted_at IS NULL
                ",
                params![
                    input.name,
                    input.brand,
                    input.model_number,
                    input.serial_number,
                    input.purchase_date.map(format_date),
                    input.warranty_expiry.map(format_date),
                    input.location,
                    input.cost_cents,
                    input.notes,
                    now,
                    id.get(),
                ],
            )
            .context("update appliance")?;
        if rows_affected == 0 {
            return Err(self.missing_or_deleted(FormKind::Appliance, id.get()));
        }
        Ok(())
    }

    fn replace_appliance(&self, snapshot: &Appliance) -> Result<()> {
        let target = EntityRef::Appliance(snapshot.id);
        self.ensure_lifecycle_transition(target, snapshot.deleted_at.is_some())?;
        self.conn
            .execute(
                "
                UPDATE appliances
                SET
                  name = ?, brand = ?, model_number = ?, serial_number = ?,
                  purchase_date = ?, warranty_expiry = ?, location = ?, cost_cents = ?,
                  notes = ?, created_at = ?, updated_at = ?, deleted_at = ?
                WHERE id = ?
                ",
                params![
                    snapshot.name,
                    snapshot.brand,
                    snapshot.model_number,
                    snapshot.serial_number,
                    snapshot.purchase_date.map(format_date),
                    snapshot.warranty_expiry.map(format_date),
                    snapshot.location,
                    snapshot.cost_cents,
                    snapshot.notes,
                    format_datetime(snapshot.created_at)?,
                    format_datetime(snapshot.updated_at)?,
                    snapshot.deleted_at.map(format_datetime).transpose()?,
                    snapshot.id.get(),
                ],
            )
            .with_context(|| format!("replace appliance {}", snapshot.id))?;
        Ok(())
    }

    fn list_vendors(&self, include_deleted: bool) -> Result<Vec<Vendor>> {
        self.list_rows(
            FormKind::Vendor,
            VENDOR_COLUMNS,
            include_deleted,
            vendor_from_row,
        )
    }

    fn get_vendor(&self, id: VendorId) -> Result<Vendor> {
        self.get_row(FormKind::Vendor, VENDOR_COLUMNS, id.get(), vendor_from_row)
    }

    fn create_vendor(&self, input: &VendorFormInput) -> Result<VendorId> {
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "
                INSERT INTO vendors (
                  name, contact_name, email, phone, website, notes,
                  created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                ",
                params![
                    input.name,
                    input.contact_name,
                    input.email,
                    input.phone,
                    input.website,
                    input.notes,
                    now,
                    now,
                ],
            )
            .context("insert vendor")?;
        Ok(VendorId::new(self.conn.last_insert_rowid()))
    }

    fn update_vendor(&self, id: VendorId, input: &VendorFormInput) -> Result<()> {
        let now = now_rfc3339()?;
        let rows_affected = self
            .conn
            .execute(
                "
                UPDATE vendors
                SET
                  name = ?, contact_name = ?, email = ?, phone = ?, website = ?,
                  notes = ?, updated_at = ?
                WHERE id = ? AND deleted_at IS NULL
                ",
                params![
                    input.name,
                    input.contact_name,
                    input.email,
                    input.phone,
                    input.website,
                    input.notes,
                    now,
                    id.get(),
                ],
            )
            .context("update vendor")?;
        if rows_affected == 0 {
            return Err(self.missing_or_deleted(FormKind::Vendor, id.get()));
        }
        Ok(())
    }

    fn replace_vendor(&self, snapshot: &Vendor) -> Result<()> {
        let target = EntityRef::Vendor(snapshot.id);
        self.ensure_lifecycle_transition(target, snapshot.deleted_at.is_some())?;
        self.conn
            .execute(
                "
                UPDATE vendors
                SET
                  name = ?, contact_name = ?, email = ?, phone = ?, website = ?,
                  notes = ?, created_at = ?, updated_at = ?, deleted_at = ?
                WHERE id = ?
                ",
                params![
                    snapshot.name,
                    snapshot.contact_name,
                    snapshot.email,
                    snapshot.phone,
                    snapshot.website,
                    snapshot.notes,
                    format_datetime(snapshot.created_at)?,
                    format_datetime(snapshot.updated_at)?,
                    snapshot.deleted_at.map(format_datetime).transpose()?,
                    snapshot.id.get(),
                ],
            )
            .with_context(|| format!("replace vendor {}", snapshot.id))?;
        Ok(())
    }

    fn get_house_profile(&self) -> Result<Option<HouseProfile>> {
        let sql = format!("SELECT {HOUSE_PROFILE_COLUMNS} FROM house_profiles ORDER BY id LIMIT 1");
        self.conn
            .query_row(&sql, [], house_profile_from_row)
            .optional()
            .context("load house profile")
    }

    fn upsert_house_profile(&self, input: &HouseProfileFormInput) -> Result<HouseProfileId> {
        let now = now_rfc3339()?;
        if let Some(existing) = self.get_house_profile()? {
            self.conn
                .execute(
                    "
                    UPDATE house_profiles
                    SET
                      nickname = ?, address_line_1 = ?, city = ?, state = ?,
                      postal_code = ?, year_built = ?, square_feet = ?, bedrooms = ?,
                      roof_type = ?, heating_type = ?, insurance_carrier = ?,
                      insurance_renewal = ?, property_tax_cents = ?, updated_at = ?
                    WHERE id = ?
                    ",
                    params![
                        input.nickname,
                        input.address_line_1,
                        input.city,
                        input.state,
                        input.postal_code,
                        input.year_built,
                        input.square_feet,
                        input.bedrooms,
                        input.roof_type,
                        input.heating_type,
                        input.insurance_carrier,
                        input.insurance_renewal.map(format_date),
                        input.property_tax_cents,
                        now,
                        existing.id.get(),
                    ],
                )
                .context("update house profile")?;
            return Ok(existing.id);
        }

        self.conn
            .execute(
                "
                INSERT INTO house_profiles (
                  nickname, address_line_1, city, state, postal_code,
                  year_built, square_feet, bedrooms, roof_type, heating_type,
                  insurance_carrier, insurance_renewal, property_tax_cents,
                  created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ",
                params![
                    input.nickname,
                    input.address_line_1,
                    input.city,
                    input.state,
                    input.postal_code,
                    input.year_built,
                    input.square_feet,
                    input.bedrooms,
                    input.roof_type,
                    input.heating_type,
                    input.insurance_carrier,
                    input.insurance_renewal.map(format_date),
                    input.property_tax_cents,
                    now,
                    now,
                ],
            )
            .context("insert house profile")?;
        debug!("created house profile");
        Ok(HouseProfileId::new(self.conn.last_insert_rowid()))
    }

    fn soft_delete(&self, target: EntityRef) -> Result<()> {
        debug!(kind = target.kind().noun(), id = target.id(), "soft delete");
        self.ensure_can_soft_delete(target)?;
        self.soft_delete_entity(target)
    }

    fn restore(&self, target: EntityRef) -> Result<()> {
        debug!(kind = target.kind().noun(), id = target.id(), "restore");
        if self.deleted_state(target.kind(), target.id())?.is_none() {
            return Err(LifecycleError::not_found(target.kind(), target.id()).into());
        }
        self.ensure_can_restore(target)?;
        self.restore_entity(target)
    }
}

pub fn default_db_path() -> Result<PathBuf> {
    if let Some(override_path) = env::var_os("MICASA_DB_PATH") {
        return Ok(PathBuf::from(override_path));
    }

    let data_root = dirs::data_local_dir().ok_or_else(|| {
        anyhow!("cannot resolve data directory; set MICASA_DB_PATH to a writable database path")
    })?;

    let app_dir = data_root.join(APP_NAME);
    fs::create_dir_all(&app_dir)
        .with_context(|| format!("create data directory {}", app_dir.display()))?;
    Ok(app_dir.join("micasa.db"))
}

pub fn validate_db_path(path: &str) -> Result<()> {
    if path.is_empty() {
        bail!("database path must not be empty");
    }
    if path == ":memory:" {
        return Ok(());
    }

    if let Some(index) = path.find("://")
        && index > 0
    {
        let scheme = &path[..index];
        if scheme.chars().all(char::is_alphabetic) {
            bail!(
                "database path {path:?} looks like a URI ({scheme}://); pass a filesystem path instead"
            );
        }
    }

    if path.starts_with("file:") {
        bail!("database path {path:?} uses file: URI syntax; pass a plain filesystem path");
    }

    if path.contains('?') {
        bail!(
            "database path {path:?} contains '?'; remove query parameters and use a plain file path"
        );
    }

    Ok(())
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    let status_raw: String = row.get(3)?;
    let status = ProjectStatus::parse(&status_raw).ok_or_else(|| {
        to_sql_error(anyhow!("unknown project status {status_raw}"))
    })?;
    Ok(Project {
        id: ProjectId::new(row.get(0)?),
        title: row.get(1)?,
        project_type_id: ProjectTypeId::new(row.get(2)?),
        status,
        description: row.get(4)?,
        start_date: date_column(row, 5)?,
        end_date: date_column(row, 6)?,
        budget_cents: row.get(7)?,
        actual_cents: row.get(8)?,
        created_at: datetime_column(row, 9)?,
        updated_at: datetime_column(row, 10)?,
        deleted_at: opt_datetime_column(row, 11)?,
    })
}

fn quote_from_row(row: &Row<'_>) -> rusqlite::Result<Quote> {
    Ok(Quote {
        id: QuoteId::new(row.get(0)?),
        project_id: ProjectId::new(row.get(1)?),
        vendor_id: VendorId::new(row.get(2)?),
        total_cents: row.get(3)?,
        labor_cents: row.get(4)?,
        materials_cents: row.get(5)?,
        other_cents: row.get(6)?,
        received_date: date_column(row, 7)?,
        notes: row.get(8)?,
        created_at: datetime_column(row, 9)?,
        updated_at: datetime_column(row, 10)?,
        deleted_at: opt_datetime_column(row, 11)?,
    })
}

fn maintenance_from_row(row: &Row<'_>) -> rusqlite::Result<MaintenanceItem> {
    let appliance_id: Option<i64> = row.get(3)?;
    Ok(MaintenanceItem {
        id: MaintenanceItemId::new(row.get(0)?),
        name: row.get(1)?,
        category_id: MaintenanceCategoryId::new(row.get(2)?),
        appliance_id: appliance_id.map(ApplianceId::new),
        last_serviced_at: date_column(row, 4)?,
        interval_months: row.get(5)?,
        notes: row.get(6)?,
        cost_cents: row.get(7)?,
        created_at: datetime_column(row, 8)?,
        updated_at: datetime_column(row, 9)?,
        deleted_at: opt_datetime_column(row, 10)?,
    })
}

fn appliance_from_row(row: &Row<'_>) -> rusqlite::Result<Appliance> {
    Ok(Appliance {
        id: ApplianceId::new(row.get(0)?),
        name: row.get(1)?,
        brand: row.get(2)?,
        model_number: row.get(3)?,
        serial_number: row.get(4)?,
        purchase_date: date_column(row, 5)?,
        warranty_expiry: date_column(row, 6)?,
        location: row.get(7)?,
        cost_cents: row.get(8)?,
        notes: row.get(9)?,
        created_at: datetime_column(row, 10)?,
        updated_at: datetime_column(row, 11)?,
        deleted_at: opt_datetime_column(row, 12)?,
    })
}

fn vendor_from_row(row: &Row<'_>) -> rusqlite::Result<Vendor> {
    Ok(Vendor {
        id: VendorId::new(row.get(0)?),
        name: row.get(1)?,
        contact_name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        website: row.get(5)?,
        notes: row.get(6)?,
        created_at: datetime_column(row, 7)?,
        updated_at: datetime_column(row, 8)?,
        deleted_at: opt_datetime_column(row, 9)?,
    })
}

fn house_profile_from_row(row: &Row<'_>) -> rusqlite::Result<HouseProfile> {
    Ok(HouseProfile {
        id: HouseProfileId::new(row.get(0)?),
        nickname: row.get(1)?,
        address_line_1: row.get(2)?,
        city: row.get(3)?,
        state: row.get(4)?,
        postal_code: row.get(5)?,
        year_built: row.get(6)?,
        square_feet: row.get(7)?,
        bedrooms: row.get(8)?,
        roof_type: row.get(9)?,
        heating_type: row.get(10)?,
        insurance_carrier: row.get(11)?,
        insurance_renewal: date_column(row, 12)?,
        property_tax_cents: row.get(13)?,
        created_at: datetime_column(row, 14)?,
        updated_at: datetime_column(row, 15)?,
    })
}

fn date_column(row: &Row<'_>, index: usize) -> rusqlite::Result<Option<Date>> {
    let raw: Option<String> = row.get(index)?;
    raw.as_deref()
        .map(parse_date)
        .transpose()
        .map_err(to_sql_error)
}

fn datetime_column(row: &Row<'_>, index: usize) -> rusqlite::Result<OffsetDateTime> {
    let raw: String = row.get(index)?;
    parse_datetime(&raw).map_err(to_sql_error)
}

fn opt_datetime_column(row: &Row<'_>, index: usize) -> rusqlite::Result<Option<OffsetDateTime>> {
    let raw: Option<String> = row.get(index)?;
    raw.as_deref()
        .map(parse_datetime)
        .transpose()
        .map_err(to_sql_error)
}

fn has_user_tables(conn: &Connection) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "
            SELECT COUNT(*)
            FROM sqlite_master
            WHERE type = 'table'
              AND name NOT LIKE 'sqlite_%'
            ",
            [],
            |row| row.get(0),
        )
        .context("count user tables")?;
    Ok(count > 0)
}

fn validate_schema(conn: &Connection) -> Result<()> {
    for (table, required_columns) in REQUIRED_SCHEMA {
        let columns = table_columns(conn, table)?;
        if columns.is_empty() {
            bail!(
                "database is missing required table `{table}`; use a micasa-compatible database or migrate first"
            );
        }

        let missing = required_columns
            .iter()
            .copied()
            .filter(|column| !columns.contains(*column))
            .collect::<Vec<_>>();
        if !missing.is_empty() {
            bail!(
                "table `{table}` is missing required columns: {}; run migration before launching",
                missing.join(", ")
            );
        }
    }
    Ok(())
}

fn table_columns(conn: &Connection, table: &str) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table})"))
        .with_context(|| format!("inspect columns for {table}"))?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .with_context(|| format!("query column info for {table}"))?;
    rows.collect::<rusqlite::Result<BTreeSet<_>>>()
        .with_context(|| format!("collect columns for {table}"))
}

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        ",
    )
    .context("configure sqlite pragmas")
}

fn now_rfc3339() -> Result<String> {
    format_datetime(OffsetDateTime::now_utc())
}

fn format_datetime(value: OffsetDateTime) -> Result<String> {
    value.format(&Rfc3339).context("format timestamp")
}

fn parse_datetime(raw: &str) -> Result<OffsetDateTime> {
    if let Ok(value) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(value);
    }

    if let Ok(value) = PrimitiveDateTime::parse(
        raw,
        &format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    ) {
        return Ok(value.assume_utc());
    }

    if let Ok(value) = PrimitiveDateTime::parse(
        raw,
        &format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    ) {
        return Ok(value.assume_utc());
    }

    bail!("unsupported datetime format {raw:?}")
}

fn parse_date(raw: &str) -> Result<Date> {
    if let Ok(value) = Date::parse(raw, &format_description!("[year]-[month]-[day]")) {
        return Ok(value);
    }
    Ok(parse_datetime(raw)?.date())
}

fn to_sql_error(error: anyhow::Error) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            error.to_string(),
        )),
    )
}

fn format_date(value: Date) -> String {
    value
        .format(&format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| "1970-01-01".to_owned())
}

#[cfg(test)]
mod tests {
    use super::{Store, parse_datetime, validate_db_path};
    use anyhow::Result;
    use micasa_app::{EntityRef, EntityStore, LifecycleError, ProjectId};

    #[test]
    fn parse_datetime_accepts_sqlite_default_layouts() -> Result<()> {
        let rfc = parse_datetime("2026-02-19T12:34:56Z")?;
        let plain = parse_datetime("2026-02-19 12:34:56")?;
        assert_eq!(rfc, plain);
        assert!(parse_datetime("19/02/2026").is_err());
        Ok(())
    }

    #[test]
    fn validate_db_path_rejects_uri_forms() {
        assert!(validate_db_path("file:test.db").is_err());
        assert!(validate_db_path("https://example.com/db.sqlite").is_err());
        assert!(validate_db_path("db.sqlite?mode=ro").is_err());
        assert!(validate_db_path(":memory:").is_ok());
    }

    #[test]
    fn restore_of_missing_row_is_not_found() -> Result<()> {
        let store = Store::open_memory()?;
        store.bootstrap()?;

        let error = store
            .restore(EntityRef::Project(ProjectId::new(404)))
            .expect_err("missing row");
        assert!(matches!(
            error.downcast_ref::<LifecycleError>(),
            Some(LifecycleError::NotFound { id: 404, .. })
        ));
        Ok(())
    }
}
