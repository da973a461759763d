// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::ids::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectStatus {
    Ideating,
    Planned,
    Quoted,
    Underway,
    Delayed,
    Completed,
    Abandoned,
}

impl ProjectStatus {
    pub const ALL: [Self; 7] = [
        Self::Ideating,
        Self::Planned,
        Self::Quoted,
        Self::Underway,
        Self::Delayed,
        Self::Completed,
        Self::Abandoned,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ideating => "ideating",
            Self::Planned => "planned",
            Self::Quoted => "quoted",
            Self::Underway => "underway",
            Self::Delayed => "delayed",
            Self::Completed => "completed",
            Self::Abandoned => "abandoned",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

/// Tabs in display order. Each one is backed by exactly one entity handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TabKind {
    Projects,
    Quotes,
    Maintenance,
    Appliances,
    Vendors,
}

impl TabKind {
    pub const ALL: [Self; 5] = [
        Self::Projects,
        Self::Quotes,
        Self::Maintenance,
        Self::Appliances,
        Self::Vendors,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Projects => "projects",
            Self::Quotes => "quotes",
            Self::Maintenance => "maint",
            Self::Appliances => "appliances",
            Self::Vendors => "vendors",
        }
    }

    pub const fn form_kind(self) -> FormKind {
        match self {
            Self::Projects => FormKind::Project,
            Self::Quotes => FormKind::Quote,
            Self::Maintenance => FormKind::MaintenanceItem,
            Self::Appliances => FormKind::Appliance,
            Self::Vendors => FormKind::Vendor,
        }
    }

    pub const fn index(self) -> usize {
        match self {
            Self::Projects => 0,
            Self::Quotes => 1,
            Self::Maintenance => 2,
            Self::Appliances => 3,
            Self::Vendors => 4,
        }
    }
}

/// Closed set of form kinds. Handler lookup, undo entries and forms are
/// all keyed by this. `House` is the one kind without a tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormKind {
    House,
    Project,
    Quote,
    MaintenanceItem,
    Appliance,
    Vendor,
}

impl FormKind {
    pub const ALL: [Self; 6] = [
        Self::House,
        Self::Project,
        Self::Quote,
        Self::MaintenanceItem,
        Self::Appliance,
        Self::Vendor,
    ];

    pub const fn noun(self) -> &'static str {
        match self {
            Self::House => "house profile",
            Self::Project => "project",
            Self::Quote => "quote",
            Self::MaintenanceItem => "maintenance",
            Self::Appliance => "appliance",
            Self::Vendor => "vendor",
        }
    }

    pub const fn tab(self) -> Option<TabKind> {
        match self {
            Self::House => None,
            Self::Project => Some(TabKind::Projects),
            Self::Quote => Some(TabKind::Quotes),
            Self::MaintenanceItem => Some(TabKind::Maintenance),
            Self::Appliance => Some(TabKind::Appliances),
            Self::Vendor => Some(TabKind::Vendors),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppMode {
    Nav,
    Edit,
    Form(FormKind),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectType {
    pub id: ProjectTypeId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceCategory {
    pub id: MaintenanceCategoryId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vendor {
    pub id: VendorId,
    pub name: String,
    pub contact_name: String,
    pub email: String,
    pub phone: String,
    pub website: String,
    pub notes: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub deleted_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub title: String,
    pub project_type_id: ProjectTypeId,
    pub status: ProjectStatus,
    pub description: String,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub budget_cents: Option<i64>,
    pub actual_cents: Option<i64>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub deleted_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub id: QuoteId,
    pub project_id: ProjectId,
    pub vendor_id: VendorId,
    pub total_cents: i64,
    pub labor_cents: Option<i64>,
    pub materials_cents: Option<i64>,
    pub other_cents: Option<i64>,
    pub received_date: Option<Date>,
    pub notes: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub deleted_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appliance {
    pub id: ApplianceId,
    pub name: String,
    pub brand: String,
    pub model_number: String,
    pub serial_number: String,
    pub purchase_date: Option<Date>,
    pub warranty_expiry: Option<Date>,
    pub location: String,
    pub cost_cents: Option<i64>,
    pub notes: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub deleted_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceItem {
    pub id: MaintenanceItemId,
    pub name: String,
    pub category_id: MaintenanceCategoryId,
    pub appliance_id: Option<ApplianceId>,
    pub last_serviced_at: Option<Date>,
    pub interval_months: i32,
    pub notes: String,
    pub cost_cents: Option<i64>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub deleted_at: Option<OffsetDateTime>,
}

/// The single household record. It sits outside the tab rotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HouseProfile {
    pub id: HouseProfileId,
    pub nickname: String,
    pub address_line_1: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub year_built: Option<i32>,
    pub square_feet: Option<i32>,
    pub bedrooms: Option<i32>,
    pub roof_type: String,
    pub heating_type: String,
    pub insurance_carrier: String,
    pub insurance_renewal: Option<Date>,
    pub property_tax_cents: Option<i64>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl HouseProfile {
    /// `Elm house, Portland OR` style label for the header.
    pub fn headline(&self) -> String {
        let place = [self.city.trim(), self.state.trim()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if place.is_empty() {
            self.nickname.clone()
        } else {
            format!("{}, {place}", self.nickname)
        }
    }
}
