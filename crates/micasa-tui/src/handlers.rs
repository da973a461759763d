// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! One handler per tabbed entity kind. The view only talks to entities
//! through [`EntityHandler`], picked by [`tab_handler`].

use std::collections::BTreeMap;

use micasa_app::validation::{
    ValidationError, compute_next_due, format_cents, format_date, format_interval_months,
    format_optional_cents, parse_interval_months, parse_optional_cents, parse_optional_date,
    parse_optional_id, parse_required_cents, parse_required_id,
};
use micasa_app::{
    ApplianceFormInput, ApplianceId, EntityRef, EntityStore, FormDraft, FormKind, FormTarget,
    LifecycleError, MaintenanceCategoryId, MaintenanceItemFormInput, MaintenanceItemId,
    ProjectFormInput, ProjectId, ProjectStatus, QuoteFormInput, QuoteId, TabKind,
    VendorFormInput, VendorId,
};
use time::{Date, OffsetDateTime};
use tracing::warn;

use crate::columns::{ColumnModel, ColumnSpec, columns_for_tab};
use crate::undo::{PriorState, UndoEntry};

#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// Input was rejected or a guard refused the mutation.
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0:#}")]
    Io(anyhow::Error),
}

impl HandlerError {
    pub fn classify(error: anyhow::Error) -> Self {
        match error.downcast_ref::<LifecycleError>() {
            Some(LifecycleError::Blocked(message)) => return Self::Validation(message.clone()),
            Some(not_found @ LifecycleError::NotFound { .. }) => {
                return Self::NotFound(not_found.to_string());
            }
            None => {}
        }
        if let Some(invalid) = error.downcast_ref::<ValidationError>() {
            return Self::Validation(invalid.to_string());
        }
        Self::Io(error)
    }
}

pub type HandlerResult<T> = Result<T, HandlerError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowMeta {
    pub id: i64,
    pub deleted: bool,
}

/// Display text for every cell, plus one [`RowMeta`] per row.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableRows {
    pub cells: Vec<Vec<String>>,
    pub meta: Vec<RowMeta>,
}

impl TableRows {
    pub fn len(&self) -> usize {
        self.meta.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meta.is_empty()
    }

    fn push(&mut self, id: i64, deleted_at: Option<OffsetDateTime>, cells: Vec<String>) {
        self.cells.push(cells);
        self.meta.push(RowMeta {
            id,
            deleted: deleted_at.is_some(),
        });
    }
}

pub trait EntityHandler: Sync {
    fn form_kind(&self) -> FormKind;

    fn columns(&self) -> Vec<ColumnSpec> {
        self.form_kind()
            .tab()
            .map(columns_for_tab)
            .unwrap_or_default()
    }

    /// Rows in primary-key order. Never mutates.
    fn load(&self, store: &dyn EntityStore, include_deleted: bool) -> HandlerResult<TableRows>;

    fn delete(&self, store: &dyn EntityStore, id: i64) -> HandlerResult<()> {
        store
            .soft_delete(lifecycle_target(self.form_kind(), id)?)
            .map_err(HandlerError::classify)
    }

    fn restore(&self, store: &dyn EntityStore, id: i64) -> HandlerResult<()> {
        store
            .restore(lifecycle_target(self.form_kind(), id)?)
            .map_err(HandlerError::classify)
    }

    fn start_add_form(&self, store: &dyn EntityStore) -> HandlerResult<FormDraft>;

    fn start_edit_form(&self, store: &dyn EntityStore, id: i64) -> HandlerResult<FormDraft>;

    /// Single-field draft for the cell under the cursor. Columns without a
    /// matching form field are read-only.
    fn inline_edit(
        &self,
        store: &dyn EntityStore,
        id: i64,
        column: usize,
    ) -> HandlerResult<FormDraft> {
        let columns = self.columns();
        let title = columns
            .get(column)
            .map(|spec| spec.title.as_str())
            .ok_or_else(|| HandlerError::Validation(format!("column {column} does not exist")))?;
        let draft = self.start_edit_form(store, id)?;
        if draft.fields.iter().any(|field| field.label == title) {
            Ok(draft.retain_only(title))
        } else {
            Err(HandlerError::Validation(format!("{title} is read-only")))
        }
    }

    /// Creates or updates the row the draft targets and returns its id.
    fn submit_form(&self, store: &dyn EntityStore, draft: &FormDraft) -> HandlerResult<i64>;

    /// `None` when the row no longer resolves.
    fn snapshot(&self, store: &dyn EntityStore, id: i64) -> Option<UndoEntry>;

    fn apply_prior_state(&self, store: &dyn EntityStore, prior: &PriorState) -> HandlerResult<()>;

    fn sync_fixed_values(
        &self,
        _store: &dyn EntityStore,
        _columns: &mut ColumnModel,
    ) -> HandlerResult<()> {
        Ok(())
    }
}

pub fn tab_handler(tab: TabKind) -> &'static dyn EntityHandler {
    match tab {
        TabKind::Projects => &ProjectHandler,
        TabKind::Quotes => &QuoteHandler,
        TabKind::Maintenance => &MaintenanceHandler,
        TabKind::Appliances => &ApplianceHandler,
        TabKind::Vendors => &VendorHandler,
    }
}

/// `None` for kinds that live outside the tab rotation.
pub fn handler_for(kind: FormKind) -> Option<&'static dyn EntityHandler> {
    kind.tab().map(tab_handler)
}

fn lifecycle_target(kind: FormKind, id: i64) -> HandlerResult<EntityRef> {
    EntityRef::from_kind(kind, id)
        .ok_or_else(|| HandlerError::Validation(format!("{} cannot be deleted", kind.noun())))
}

#[derive(Debug, Clone, Copy)]
pub struct ProjectHandler;

impl EntityHandler for ProjectHandler {
    fn form_kind(&self) -> FormKind {
        FormKind::Project
    }

    fn load(&self, store: &dyn EntityStore, include_deleted: bool) -> HandlerResult<TableRows> {
        let types = store
            .list_project_types()
            .map_err(HandlerError::classify)?
            .into_iter()
            .map(|project_type| (project_type.id, project_type.name))
            .collect::<BTreeMap<_, _>>();
        let mut rows = TableRows::default();
        for project in store
            .list_projects(include_deleted)
            .map_err(HandlerError::classify)?
        {
            rows.push(
                project.id.get(),
                project.deleted_at,
                vec![
                    project.id.to_string(),
                    types
                        .get(&project.project_type_id)
                        .cloned()
                        .unwrap_or_default(),
                    project.title,
                    project.status.as_str().to_owned(),
                    format_optional_cents(project.budget_cents),
                    format_optional_cents(project.actual_cents),
                    format_date(project.start_date),
                    format_date(project.end_date),
                ],
            );
        }
        Ok(rows)
    }

    fn start_add_form(&self, store: &dyn EntityStore) -> HandlerResult<FormDraft> {
        let default_type = store
            .list_project_types()
            .map_err(HandlerError::classify)?
            .into_iter()
            .next()
            .map(|project_type| project_type.name)
            .unwrap_or_default();
        Ok(FormDraft::new(FormKind::Project, FormTarget::Create)
            .field("Title", "")
            .field("Type", default_type)
            .field("Status", ProjectStatus::Planned.as_str())
            .field("Budget", "")
            .field("Actual", "")
            .field("Start", "")
            .field("End", "")
            .field("Description", ""))
    }

    fn start_edit_form(&self, store: &dyn EntityStore, id: i64) -> HandlerResult<FormDraft> {
        let project = store
            .get_project(ProjectId::new(id))
            .map_err(HandlerError::classify)?;
        let type_name = store
            .list_project_types()
            .map_err(HandlerError::classify)?
            .into_iter()
            .find(|project_type| project_type.id == project.project_type_id)
            .map(|project_type| project_type.name)
            .unwrap_or_default();
        Ok(FormDraft::new(FormKind::Project, FormTarget::Edit(id))
            .field("Title", project.title)
            .field("Type", type_name)
            .field("Status", project.status.as_str())
            .field("Budget", money_text(project.budget_cents))
            .field("Actual", money_text(project.actual_cents))
            .field("Start", format_date(project.start_date))
            .field("End", format_date(project.end_date))
            .field("Description", project.description))
    }

    fn submit_form(&self, store: &dyn EntityStore, draft: &FormDraft) -> HandlerResult<i64> {
        let draft = complete_draft(self, store, draft)?;
        let type_name = draft.value("Type").trim();
        let project_type_id = store
            .list_project_types()
            .map_err(HandlerError::classify)?
            .into_iter()
            .find(|project_type| project_type.name.eq_ignore_ascii_case(type_name))
            .map(|project_type| project_type.id)
            .ok_or_else(|| {
                HandlerError::Validation(format!(
                    "unknown project type {type_name:?} -- pick an existing type"
                ))
            })?;
        let status = ProjectStatus::parse(draft.value("Status")).ok_or_else(|| {
            HandlerError::Validation(format!(
                "unknown status {:?} -- use one of {}",
                draft.value("Status").trim(),
                ProjectStatus::ALL.map(ProjectStatus::as_str).join(", ")
            ))
        })?;
        let input = ProjectFormInput {
            title: text(&draft, "Title"),
            project_type_id,
            status,
            description: text(&draft, "Description"),
            start_date: date(&draft, "Start")?,
            end_date: date(&draft, "End")?,
            budget_cents: cents(&draft, "Budget")?,
            actual_cents: cents(&draft, "Actual")?,
        };
        checked(input.validate())?;

        match draft.target {
            FormTarget::Create => store
                .create_project(&input)
                .map(ProjectId::get)
                .map_err(HandlerError::classify),
            FormTarget::Edit(id) => store
                .update_project(ProjectId::new(id), &input)
                .map(|()| id)
                .map_err(HandlerError::classify),
        }
    }

    fn snapshot(&self, store: &dyn EntityStore, id: i64) -> Option<UndoEntry> {
        let project = resolve(store.get_project(ProjectId::new(id)), self.form_kind(), id)?;
        Some(UndoEntry {
            description: format!("project {:?}", project.title),
            kind: FormKind::Project,
            entity_id: id,
            prior: PriorState::Project(project),
        })
    }

    fn apply_prior_state(&self, store: &dyn EntityStore, prior: &PriorState) -> HandlerResult<()> {
        let PriorState::Project(project) = prior else {
            return Err(mismatched(self.form_kind(), prior));
        };
        store
            .replace_project(project)
            .map_err(HandlerError::classify)
    }

    fn sync_fixed_values(
        &self,
        store: &dyn EntityStore,
        columns: &mut ColumnModel,
    ) -> HandlerResult<()> {
        let names = store
            .list_project_types()
            .map_err(HandlerError::classify)?
            .into_iter()
            .map(|project_type| project_type.name)
            .collect();
        columns.set_fixed_values("Type", names);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct QuoteHandler;

impl EntityHandler for QuoteHandler {
    fn form_kind(&self) -> FormKind {
        FormKind::Quote
    }

    fn load(&self, store: &dyn EntityStore, include_deleted: bool) -> HandlerResult<TableRows> {
        // Parents may be deleted while their quotes are still listed.
        let projects = store
            .list_projects(true)
            .map_err(HandlerError::classify)?
            .into_iter()
            .map(|project| (project.id, project.title))
            .collect::<BTreeMap<_, _>>();
        let vendors = store
            .list_vendors(true)
            .map_err(HandlerError::classify)?
            .into_iter()
            .map(|vendor| (vendor.id, vendor.name))
            .collect::<BTreeMap<_, _>>();

        let mut rows = TableRows::default();
        for quote in store
            .list_quotes(include_deleted)
            .map_err(HandlerError::classify)?
        {
            let project = projects
                .get(&quote.project_id)
                .filter(|title| !title.is_empty())
                .cloned()
                .unwrap_or_else(|| format!("Project {}", quote.project_id));
            let vendor = vendors
                .get(&quote.vendor_id)
                .cloned()
                .unwrap_or_else(|| format!("Vendor {}", quote.vendor_id));
            rows.push(
                quote.id.get(),
                quote.deleted_at,
                vec![
                    quote.id.to_string(),
                    project,
                    vendor,
                    format_cents(quote.total_cents),
                    format_optional_cents(quote.labor_cents),
                    format_optional_cents(quote.materials_cents),
                    format_optional_cents(quote.other_cents),
                    format_date(quote.received_date),
                ],
            );
        }
        Ok(rows)
    }

    fn start_add_form(&self, store: &dyn EntityStore) -> HandlerResult<FormDraft> {
        let project = store
            .list_projects(false)
            .map_err(HandlerError::classify)?
            .first()
            .map(|project| project.id.to_string())
            .unwrap_or_default();
        let vendor = store
            .list_vendors(false)
            .map_err(HandlerError::classify)?
            .first()
            .map(|vendor| vendor.id.to_string())
            .unwrap_or_default();
        Ok(FormDraft::new(FormKind::Quote, FormTarget::Create)
            .field("Project", project)
            .field("Vendor", vendor)
            .field("Total", "")
            .field("Labor", "")
            .field("Mat", "")
            .field("Other", "")
            .field("Recv", "")
            .field("Notes", ""))
    }

    fn start_edit_form(&self, store: &dyn EntityStore, id: i64) -> HandlerResult<FormDraft> {
        let quote = store
            .get_quote(QuoteId::new(id))
            .map_err(HandlerError::classify)?;
        Ok(FormDraft::new(FormKind::Quote, FormTarget::Edit(id))
            .field("Project", quote.project_id.to_string())
            .field("Vendor", quote.vendor_id.to_string())
            .field("Total", money_text(Some(quote.total_cents)))
            .field("Labor", money_text(quote.labor_cents))
            .field("Mat", money_text(quote.materials_cents))
            .field("Other", money_text(quote.other_cents))
            .field("Recv", format_date(quote.received_date))
            .field("Notes", quote.notes))
    }

    fn submit_form(&self, store: &dyn EntityStore, draft: &FormDraft) -> HandlerResult<i64> {
        let draft = complete_draft(self, store, draft)?;
        let input = QuoteFormInput {
            project_id: ProjectId::new(
                parse_required_id(draft.value("Project"))
                    .map_err(|error| invalid("Project", error))?,
            ),
            vendor_id: VendorId::new(
                parse_required_id(draft.value("Vendor")).map_err(|error| invalid("Vendor", error))?,
            ),
            total_cents: parse_required_cents(draft.value("Total"))
                .map_err(|error| invalid("Total", error))?,
            labor_cents: cents(&draft, "Labor")?,
            materials_cents: cents(&draft, "Mat")?,
            other_cents: cents(&draft, "Other")?,
            received_date: date(&draft, "Recv")?,
            notes: text(&draft, "Notes"),
        };
        checked(input.validate())?;

        match draft.target {
            FormTarget::Create => store
                .create_quote(&input)
                .map(QuoteId::get)
                .map_err(HandlerError::classify),
            FormTarget::Edit(id) => store
                .update_quote(QuoteId::new(id), &input)
                .map(|()| id)
                .map_err(HandlerError::classify),
        }
    }

    fn snapshot(&self, store: &dyn EntityStore, id: i64) -> Option<UndoEntry> {
        let quote = resolve(store.get_quote(QuoteId::new(id)), self.form_kind(), id)?;
        let vendor = store
            .get_vendor(quote.vendor_id)
            .map(|vendor| vendor.name)
            .unwrap_or_else(|_| format!("vendor {}", quote.vendor_id));
        Some(UndoEntry {
            description: format!("quote from {vendor}"),
            kind: FormKind::Quote,
            entity_id: id,
            prior: PriorState::Quote(quote),
        })
    }

    fn apply_prior_state(&self, store: &dyn EntityStore, prior: &PriorState) -> HandlerResult<()> {
        let PriorState::Quote(quote) = prior else {
            return Err(mismatched(self.form_kind(), prior));
        };
        store.replace_quote(quote).map_err(HandlerError::classify)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MaintenanceHandler;

impl EntityHandler for MaintenanceHandler {
    fn form_kind(&self) -> FormKind {
        FormKind::MaintenanceItem
    }

    fn load(&self, store: &dyn EntityStore, include_deleted: bool) -> HandlerResult<TableRows> {
        let categories = store
            .list_maintenance_categories()
            .map_err(HandlerError::classify)?
            .into_iter()
            .map(|category| (category.id, category.name))
            .collect::<BTreeMap<_, _>>();
        let appliances = store
            .list_appliances(true)
            .map_err(HandlerError::classify)?
            .into_iter()
            .map(|appliance| (appliance.id, appliance.name))
            .collect::<BTreeMap<_, _>>();

        let mut rows = TableRows::default();
        for item in store
            .list_maintenance_items(include_deleted)
            .map_err(HandlerError::classify)?
        {
            let appliance = item
                .appliance_id
                .and_then(|id| appliances.get(&id).cloned())
                .unwrap_or_default();
            rows.push(
                item.id.get(),
                item.deleted_at,
                vec![
                    item.id.to_string(),
                    item.name,
                    categories
                        .get(&item.category_id)
                        .cloned()
                        .unwrap_or_default(),
                    appliance,
                    format_date(item.last_serviced_at),
                    format_date(compute_next_due(
                        item.last_serviced_at,
                        item.interval_months,
                    )),
                    format_interval_months(item.interval_months),
                    format_optional_cents(item.cost_cents),
                ],
            );
        }
        Ok(rows)
    }

    fn start_add_form(&self, store: &dyn EntityStore) -> HandlerResult<FormDraft> {
        let category = store
            .list_maintenance_categories()
            .map_err(HandlerError::classify)?
            .into_iter()
            .next()
            .map(|category| category.name)
            .unwrap_or_default();
        Ok(
            FormDraft::new(FormKind::MaintenanceItem, FormTarget::Create)
                .field("Item", "")
                .field("Category", category)
                .field("Appliance", "")
                .field("Last", "")
                .field("Every", "6m")
                .field("Cost", "")
                .field("Notes", ""),
        )
    }

    fn start_edit_form(&self, store: &dyn EntityStore, id: i64) -> HandlerResult<FormDraft> {
        let item = store
            .get_maintenance_item(MaintenanceItemId::new(id))
            .map_err(HandlerError::classify)?;
        let category = store
            .list_maintenance_categories()
            .map_err(HandlerError::classify)?
            .into_iter()
            .find(|category| category.id == item.category_id)
            .map(|category| category.name)
            .unwrap_or_default();
        Ok(
            FormDraft::new(FormKind::MaintenanceItem, FormTarget::Edit(id))
                .field("Item", item.name)
                .field("Category", category)
                .field(
                    "Appliance",
                    item.appliance_id
                        .map(|appliance_id| appliance_id.to_string())
                        .unwrap_or_default(),
                )
                .field("Last", format_date(item.last_serviced_at))
                .field("Every", format_interval_months(item.interval_months))
                .field("Cost", money_text(item.cost_cents))
                .field("Notes", item.notes),
        )
    }

    fn submit_form(&self, store: &dyn EntityStore, draft: &FormDraft) -> HandlerResult<i64> {
        let draft = complete_draft(self, store, draft)?;
        let category_name = draft.value("Category").trim();
        let category_id = store
            .list_maintenance_categories()
            .map_err(HandlerError::classify)?
            .into_iter()
            .find(|category| category.name.eq_ignore_ascii_case(category_name))
            .map(|category| category.id)
            .unwrap_or(MaintenanceCategoryId::new(0));
        let input = MaintenanceItemFormInput {
            name: text(&draft, "Item"),
            category_id,
            appliance_id: parse_optional_id(draft.value("Appliance"))
                .map_err(|error| invalid("Appliance", error))?
                .map(ApplianceId::new),
            last_serviced_at: date(&draft, "Last")?,
            interval_months: parse_interval_months(draft.value("Every"))
                .map_err(|error| invalid("Every", error))?,
            notes: text(&draft, "Notes"),
            cost_cents: cents(&draft, "Cost")?,
        };
        checked(input.validate())?;

        match draft.target {
            FormTarget::Create => store
                .create_maintenance_item(&input)
                .map(MaintenanceItemId::get)
                .map_err(HandlerError::classify),
            FormTarget::Edit(id) => store
                .update_maintenance_item(MaintenanceItemId::new(id), &input)
                .map(|()| id)
                .map_err(HandlerError::classify),
        }
    }

    fn snapshot(&self, store: &dyn EntityStore, id: i64) -> Option<UndoEntry> {
        let item = resolve(
            store.get_maintenance_item(MaintenanceItemId::new(id)),
            self.form_kind(),
            id,
        )?;
        Some(UndoEntry {
            description: format!("maintenance {:?}", item.name),
            kind: FormKind::MaintenanceItem,
            entity_id: id,
            prior: PriorState::MaintenanceItem(item),
        })
    }

    fn apply_prior_state(&self, store: &dyn EntityStore, prior: &PriorState) -> HandlerResult<()> {
        let PriorState::MaintenanceItem(item) = prior else {
            return Err(mismatched(self.form_kind(), prior));
        };
        store
            .replace_maintenance_item(item)
            .map_err(HandlerError::classify)
    }

    fn sync_fixed_values(
        &self,
        store: &dyn EntityStore,
        columns: &mut ColumnModel,
    ) -> HandlerResult<()> {
        let names = store
            .list_maintenance_categories()
            .map_err(HandlerError::classify)?
            .into_iter()
            .map(|category| category.name)
            .collect();
        columns.set_fixed_values("Category", names);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ApplianceHandler;

impl EntityHandler for ApplianceHandler {
    fn form_kind(&self) -> FormKind {
        FormKind::Appliance
    }

    fn load(&self, store: &dyn EntityStore, include_deleted: bool) -> HandlerResult<TableRows> {
        let mut rows = TableRows::default();
        for appliance in store
            .list_appliances(include_deleted)
            .map_err(HandlerError::classify)?
        {
            rows.push(
                appliance.id.get(),
                appliance.deleted_at,
                vec![
                    appliance.id.to_string(),
                    appliance.name,
                    appliance.brand,
                    appliance.model_number,
                    appliance.serial_number,
                    appliance.location,
                    format_date(appliance.purchase_date),
                    format_date(appliance.warranty_expiry),
                    format_optional_cents(appliance.cost_cents),
                ],
            );
        }
        Ok(rows)
    }

    fn start_add_form(&self, _store: &dyn EntityStore) -> HandlerResult<FormDraft> {
        Ok(FormDraft::new(FormKind::Appliance, FormTarget::Create)
            .field("Name", "")
            .field("Brand", "")
            .field("Model", "")
            .field("Serial", "")
            .field("Location", "")
            .field("Purchased", "")
            .field("Warranty", "")
            .field("Cost", "")
            .field("Notes", ""))
    }

    fn start_edit_form(&self, store: &dyn EntityStore, id: i64) -> HandlerResult<FormDraft> {
        let appliance = store
            .get_appliance(ApplianceId::new(id))
            .map_err(HandlerError::classify)?;
        Ok(FormDraft::new(FormKind::Appliance, FormTarget::Edit(id))
            .field("Name", appliance.name)
            .field("Brand", appliance.brand)
            .field("Model", appliance.model_number)
            .field("Serial", appliance.serial_number)
            .field("Location", appliance.location)
            .field("Purchased", format_date(appliance.purchase_date))
            .field("Warranty", format_date(appliance.warranty_expiry))
            .field("Cost", money_text(appliance.cost_cents))
            .field("Notes", appliance.notes))
    }

    fn submit_form(&self, store: &dyn EntityStore, draft: &FormDraft) -> HandlerResult<i64> {
        let draft = complete_draft(self, store, draft)?;
        let input = ApplianceFormInput {
            name: text(&draft, "Name"),
            brand: text(&draft, "Brand"),
            model_number: text(&draft, "Model"),
            serial_number: text(&draft, "Serial"),
            purchase_date: date(&draft, "Purchased")?,
            warranty_expiry: date(&draft, "Warranty")?,
            location: text(&draft, "Location"),
            cost_cents: cents(&draft, "Cost")?,
            notes: text(&draft, "Notes"),
        };
        checked(input.validate())?;

        match draft.target {
            FormTarget::Create => store
                .create_appliance(&input)
                .map(ApplianceId::get)
                .map_err(HandlerError::classify),
            FormTarget::Edit(id) => store
                .update_appliance(ApplianceId::new(id), &input)
                .map(|()| id)
                .map_err(HandlerError::classify),
        }
    }

    fn snapshot(&self, store: &dyn EntityStore, id: i64) -> Option<UndoEntry> {
        let appliance = resolve(store.get_appliance(ApplianceId::new(id)), self.form_kind(), id)?;
        Some(UndoEntry {
            description: format!("appliance {:?}", appliance.name),
            kind: FormKind::Appliance,
            entity_id: id,
            prior: PriorState::Appliance(appliance),
        })
    }

    fn apply_prior_state(&self, store: &dyn EntityStore, prior: &PriorState) -> HandlerResult<()> {
        let PriorState::Appliance(appliance) = prior else {
            return Err(mismatched(self.form_kind(), prior));
        };
        store
            .replace_appliance(appliance)
            .map_err(HandlerError::classify)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct VendorHandler;

impl EntityHandler for VendorHandler {
    fn form_kind(&self) -> FormKind {
        FormKind::Vendor
    }

    fn load(&self, store: &dyn EntityStore, include_deleted: bool) -> HandlerResult<TableRows> {
        let mut rows = TableRows::default();
        for vendor in store
            .list_vendors(include_deleted)
            .map_err(HandlerError::classify)?
        {
            rows.push(
                vendor.id.get(),
                vendor.deleted_at,
                vec![
                    vendor.id.to_string(),
                    vendor.name,
                    vendor.contact_name,
                    vendor.email,
                    vendor.phone,
                    vendor.website,
                ],
            );
        }
        Ok(rows)
    }

    fn start_add_form(&self, _store: &dyn EntityStore) -> HandlerResult<FormDraft> {
        Ok(FormDraft::new(FormKind::Vendor, FormTarget::Create)
            .field("Name", "")
            .field("Contact", "")
            .field("Email", "")
            .field("Phone", "")
            .field("Website", "")
            .field("Notes", ""))
    }

    fn start_edit_form(&self, store: &dyn EntityStore, id: i64) -> HandlerResult<FormDraft> {
        let vendor = store
            .get_vendor(VendorId::new(id))
            .map_err(HandlerError::classify)?;
        Ok(FormDraft::new(FormKind::Vendor, FormTarget::Edit(id))
            .field("Name", vendor.name)
            .field("Contact", vendor.contact_name)
            .field("Email", vendor.email)
            .field("Phone", vendor.phone)
            .field("Website", vendor.website)
            .field("Notes", vendor.notes))
    }

    fn submit_form(&self, store: &dyn EntityStore, draft: &FormDraft) -> HandlerResult<i64> {
        let draft = complete_draft(self, store, draft)?;
        let input = VendorFormInput {
            name: text(&draft, "Name"),
            contact_name: text(&draft, "Contact"),
            email: text(&draft, "Email"),
            phone: text(&draft, "Phone"),
            website: text(&draft, "Website"),
            notes: text(&draft, "Notes"),
        };
        checked(input.validate())?;

        match draft.target {
            FormTarget::Create => store
                .create_vendor(&input)
                .map(VendorId::get)
                .map_err(HandlerError::classify),
            FormTarget::Edit(id) => store
                .update_vendor(VendorId::new(id), &input)
                .map(|()| id)
                .map_err(HandlerError::classify),
        }
    }

    fn snapshot(&self, store: &dyn EntityStore, id: i64) -> Option<UndoEntry> {
        let vendor = resolve(store.get_vendor(VendorId::new(id)), self.form_kind(), id)?;
        Some(UndoEntry {
            description: format!("vendor {:?}", vendor.name),
            kind: FormKind::Vendor,
            entity_id: id,
            prior: PriorState::Vendor(vendor),
        })
    }

    fn apply_prior_state(&self, store: &dyn EntityStore, prior: &PriorState) -> HandlerResult<()> {
        let PriorState::Vendor(vendor) = prior else {
            return Err(mismatched(self.form_kind(), prior));
        };
        store.replace_vendor(vendor).map_err(HandlerError::classify)
    }
}

/// Inline edits carry a single field. Fill in the rest from the stored row
/// so the submit path always sees a full draft.
fn complete_draft(
    handler: &dyn EntityHandler,
    store: &dyn EntityStore,
    draft: &FormDraft,
) -> HandlerResult<FormDraft> {
    if draft.kind != handler.form_kind() {
        return Err(HandlerError::Validation(format!(
            "{} form submitted to the {} handler",
            draft.kind.noun(),
            handler.form_kind().noun()
        )));
    }
    let FormTarget::Edit(id) = draft.target else {
        return Ok(draft.clone());
    };
    let mut full = handler.start_edit_form(store, id)?;
    for field in &draft.fields {
        if let Some(slot) = full
            .fields
            .iter_mut()
            .find(|slot| slot.label == field.label)
        {
            slot.value.clone_from(&field.value);
        }
    }
    Ok(full)
}

fn resolve<T>(result: anyhow::Result<T>, kind: FormKind, id: i64) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(error) => {
            if !matches!(HandlerError::classify(error), HandlerError::NotFound(_)) {
                warn!(kind = kind.noun(), id, "snapshot failed");
            }
            None
        }
    }
}

fn mismatched(kind: FormKind, prior: &PriorState) -> HandlerError {
    HandlerError::Validation(format!(
        "{} snapshot cannot restore a {}",
        prior.kind().noun(),
        kind.noun()
    ))
}

pub(crate) fn checked(result: anyhow::Result<()>) -> HandlerResult<()> {
    result.map_err(|error| HandlerError::Validation(format!("{error:#}")))
}

pub(crate) fn invalid(field: &str, error: ValidationError) -> HandlerError {
    HandlerError::Validation(format!("{field}: {error}"))
}

pub(crate) fn text(draft: &FormDraft, label: &str) -> String {
    draft.value(label).trim().to_owned()
}

pub(crate) fn cents(draft: &FormDraft, label: &str) -> HandlerResult<Option<i64>> {
    parse_optional_cents(draft.value(label)).map_err(|error| invalid(label, error))
}

pub(crate) fn date(draft: &FormDraft, label: &str) -> HandlerResult<Option<Date>> {
    parse_optional_date(draft.value(label)).map_err(|error| invalid(label, error))
}

/// Money as it is typed back into a form: no currency sign or grouping.
pub(crate) fn money_text(cents: Option<i64>) -> String {
    cents.map_or_else(String::new, |cents| {
        let sign = if cents < 0 { "-" } else { "" };
        let magnitude = cents.unsigned_abs();
        format!("{sign}{}.{:02}", magnitude / 100, magnitude % 100)
    })
}
