// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;

use crate::{
    Appliance, ApplianceFormInput, ApplianceId, FormKind, HouseProfile, HouseProfileFormInput,
    HouseProfileId, MaintenanceCategory, MaintenanceItem, MaintenanceItemFormInput,
    MaintenanceItemId, Project, ProjectFormInput, ProjectId, ProjectType, Quote, QuoteFormInput,
    QuoteId, Vendor, VendorFormInput, VendorId,
};

/// A row that supports soft delete and restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef {
    Project(ProjectId),
    Quote(QuoteId),
    MaintenanceItem(MaintenanceItemId),
    Appliance(ApplianceId),
    Vendor(VendorId),
}

impl EntityRef {
    /// `None` for the house profile, which is never soft-deleted.
    pub const fn from_kind(kind: FormKind, id: i64) -> Option<Self> {
        Some(match kind {
            FormKind::House => return None,
            FormKind::Project => Self::Project(ProjectId::new(id)),
            FormKind::Quote => Self::Quote(QuoteId::new(id)),
            FormKind::MaintenanceItem => Self::MaintenanceItem(MaintenanceItemId::new(id)),
            FormKind::Appliance => Self::Appliance(ApplianceId::new(id)),
            FormKind::Vendor => Self::Vendor(VendorId::new(id)),
        })
    }

    pub const fn kind(self) -> FormKind {
        match self {
            Self::Project(_) => FormKind::Project,
            Self::Quote(_) => FormKind::Quote,
            Self::MaintenanceItem(_) => FormKind::MaintenanceItem,
            Self::Appliance(_) => FormKind::Appliance,
            Self::Vendor(_) => FormKind::Vendor,
        }
    }

    pub const fn id(self) -> i64 {
        match self {
            Self::Project(id) => id.get(),
            Self::Quote(id) => id.get(),
            Self::MaintenanceItem(id) => id.get(),
            Self::Appliance(id) => id.get(),
            Self::Vendor(id) => id.get(),
        }
    }
}

/// Failures a store reports with enough structure for callers to tell a
/// refused mutation from a missing row. Anything else is an I/O failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("{0}")]
    Blocked(String),
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
}

impl LifecycleError {
    pub fn not_found(kind: FormKind, id: i64) -> Self {
        Self::NotFound {
            entity: kind.noun(),
            id,
        }
    }
}

/// Persistence contract consumed by the table views.
///
/// `list_*` return rows in ascending primary-key order. `get_*` fails with
/// [`LifecycleError::NotFound`] for ids that do not resolve, deleted rows
/// included. `replace_*` writes every field of a previously loaded row back,
/// soft-delete state included, and applies the same guards as
/// [`EntityStore::soft_delete`] and [`EntityStore::restore`] when that state
/// flips.
pub trait EntityStore {
    fn list_project_types(&self) -> Result<Vec<ProjectType>>;
    fn list_maintenance_categories(&self) -> Result<Vec<MaintenanceCategory>>;

    fn list_projects(&self, include_deleted: bool) -> Result<Vec<Project>>;
    fn get_project(&self, id: ProjectId) -> Result<Project>;
    fn create_project(&self, input: &ProjectFormInput) -> Result<ProjectId>;
    fn update_project(&self, id: ProjectId, input: &ProjectFormInput) -> Result<()>;
    fn replace_project(&self, snapshot: &Project) -> Result<()>;

    fn list_quotes(&self, include_deleted: bool) -> Result<Vec<Quote>>;
    fn get_quote(&self, id: QuoteId) -> Result<Quote>;
    fn create_quote(&self, input: &QuoteFormInput) -> Result<QuoteId>;
    fn update_quote(&self, id: QuoteId, input: &QuoteFormInput) -> Result<()>;
    fn replace_quote(&self, snapshot: &Quote) -> Result<()>;

    fn list_maintenance_items(&self, include_deleted: bool) -> Result<Vec<MaintenanceItem>>;
    fn get_maintenance_item(&self, id: MaintenanceItemId) -> Result<MaintenanceItem>;
    fn create_maintenance_item(&self, input: &MaintenanceItemFormInput)
    -> Result<MaintenanceItemId>;
    fn update_maintenance_item(
        &self,
        id: MaintenanceItemId,
        input: &MaintenanceItemFormInput,
    ) -> Result<()>;
    fn replace_maintenance_item(&self, snapshot: &MaintenanceItem) -> Result<()>;

    fn list_appliances(&self, include_deleted: bool) -> Result<Vec<Appliance>>;
    fn get_appliance(&self, id: ApplianceId) -> Result<Appliance>;
    fn create_appliance(&self, input: &ApplianceFormInput) -> Result<ApplianceId>;
    fn update_appliance(&self, id: ApplianceId, input: &ApplianceFormInput) -> Result<()>;
    fn replace_appliance(&self, snapshot: &Appliance) -> Result<()>;

    fn list_vendors(&self, include_deleted: bool) -> Result<Vec<Vendor>>;
    fn get_vendor(&self, id: VendorId) -> Result<Vendor>;
    fn create_vendor(&self, input: &VendorFormInput) -> Result<VendorId>;
    fn update_vendor(&self, id: VendorId, input: &VendorFormInput) -> Result<()>;
    fn replace_vendor(&self, snapshot: &Vendor) -> Result<()>;

    /// `None` until the profile is first saved.
    fn get_house_profile(&self) -> Result<Option<HouseProfile>>;
    /// Creates the profile or overwrites the existing one. There is never
    /// more than one.
    fn upsert_house_profile(&self, input: &HouseProfileFormInput) -> Result<HouseProfileId>;

    fn soft_delete(&self, target: EntityRef) -> Result<()>;
    fn restore(&self, target: EntityRef) -> Result<()>;
}
