// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use time::Date;

use crate::{
    ApplianceId, FormKind, MaintenanceCategoryId, ProjectId, ProjectStatus, ProjectTypeId,
    VendorId,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFormInput {
    pub title: String,
    pub project_type_id: ProjectTypeId,
    pub status: ProjectStatus,
    pub description: String,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub budget_cents: Option<i64>,
    pub actual_cents: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorFormInput {
    pub name: String,
    pub contact_name: String,
    pub email: String,
    pub phone: String,
    pub website: String,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteFormInput {
    pub project_id: ProjectId,
    pub vendor_id: VendorId,
    pub total_cents: i64,
    pub labor_cents: Option<i64>,
    pub materials_cents: Option<i64>,
    pub other_cents: Option<i64>,
    pub received_date: Option<Date>,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplianceFormInput {
    pub name: String,
    pub brand: String,
    pub model_number: String,
    pub serial_number: String,
    pub purchase_date: Option<Date>,
    pub warranty_expiry: Option<Date>,
    pub location: String,
    pub cost_cents: Option<i64>,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaintenanceItemFormInput {
    pub name: String,
    pub category_id: MaintenanceCategoryId,
    pub appliance_id: Option<ApplianceId>,
    pub last_serviced_at: Option<Date>,
    pub interval_months: i32,
    pub notes: String,
    pub cost_cents: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HouseProfileFormInput {
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
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPayload {
    House(HouseProfileFormInput),
    Project(ProjectFormInput),
    Vendor(VendorFormInput),
    Quote(QuoteFormInput),
    Appliance(ApplianceFormInput),
    Maintenance(MaintenanceItemFormInput),
}

impl FormPayload {
    pub fn kind(&self) -> FormKind {
        match self {
            Self::House(_) => FormKind::House,
            Self::Project(_) => FormKind::Project,
            Self::Vendor(_) => FormKind::Vendor,
            Self::Quote(_) => FormKind::Quote,
            Self::Appliance(_) => FormKind::Appliance,
            Self::Maintenance(_) => FormKind::MaintenanceItem,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::House(house) => house.validate(),
            Self::Project(project) => project.validate(),
            Self::Vendor(vendor) => vendor.validate(),
            Self::Quote(quote) => quote.validate(),
            Self::Appliance(appliance) => appliance.validate(),
            Self::Maintenance(maintenance) => maintenance.validate(),
        }
    }
}

impl HouseProfileFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.nickname.trim().is_empty() {
            bail!("house nickname is required -- enter a nickname and retry");
        }
        if let Some(year) = self.year_built
            && !(1600..=2100).contains(&year)
        {
            bail!("year built {year} is out of range -- use a four-digit year");
        }
        for (label, value) in [
            ("square feet", self.square_feet),
            ("bedrooms", self.bedrooms),
        ] {
            if value.is_some_and(|value| value < 0) {
                bail!("{label} must not be negative");
            }
        }
        if self.property_tax_cents.is_some_and(|cents| cents < 0) {
            bail!("property tax must not be negative");
        }
        Ok(())
    }
}

impl ProjectFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            bail!("project title is required -- enter a title and retry");
        }
        if self.project_type_id.get() <= 0 {
            bail!("project type is required -- choose a project type and retry");
        }
        if let (Some(start_date), Some(end_date)) = (self.start_date, self.end_date)
            && end_date < start_date
        {
            bail!("project end date must be on/after start date");
        }
        Ok(())
    }
}

impl VendorFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("vendor name is required -- enter a vendor name and retry");
        }
        Ok(())
    }
}

impl QuoteFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.project_id.get() <= 0 {
            bail!("quote project is required -- enter a project id and retry");
        }
        if self.vendor_id.get() <= 0 {
            bail!("quote vendor is required -- enter a vendor id and retry");
        }
        if self.total_cents <= 0 {
            bail!("quote total must be positive");
        }
        Ok(())
    }
}

impl ApplianceFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("appliance name is required -- enter a name and retry");
        }
        if let (Some(purchased), Some(expiry)) = (self.purchase_date, self.warranty_expiry)
            && expiry < purchased
        {
            bail!("warranty expiry must be on/after the purchase date");
        }
        Ok(())
    }
}

impl MaintenanceItemFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("maintenance item name is required -- enter a name and retry");
        }
        if self.category_id.get() <= 0 {
            bail!("maintenance category is required -- choose a category and retry");
        }
        if self.interval_months <= 0 {
            bail!("maintenance interval must be at least 1 month");
        }
        Ok(())
    }
}

/// Whether a submitted draft creates a row or overwrites an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormTarget {
    Create,
    Edit(i64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub label: &'static str,
    pub value: String,
}

/// Raw text the user is typing into a form. Entity handlers build drafts
/// and parse them back into a [`FormPayload`] on submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormDraft {
    pub kind: FormKind,
    pub target: FormTarget,
    pub fields: Vec<FormField>,
    pub focus: usize,
}

impl FormDraft {
    pub fn new(kind: FormKind, target: FormTarget) -> Self {
        Self {
            kind,
            target,
            fields: Vec::new(),
            focus: 0,
        }
    }

    pub fn field(mut self, label: &'static str, value: impl Into<String>) -> Self {
        self.fields.push(FormField {
            label,
            value: value.into(),
        });
        self
    }

    pub fn value(&self, label: &str) -> &str {
        self.fields
            .iter()
            .find(|field| field.label == label)
            .map_or("", |field| field.value.as_str())
    }

    pub fn focused_label(&self) -> Option<&'static str> {
        self.fields.get(self.focus).map(|field| field.label)
    }

    pub fn focus_next(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + 1) % self.fields.len();
        }
    }

    pub fn focus_prev(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
        }
    }

    pub fn push_char(&mut self, ch: char) {
        if let Some(field) = self.fields.get_mut(self.focus) {
            field.value.push(ch);
        }
    }

    pub fn pop_char(&mut self) {
        if let Some(field) = self.fields.get_mut(self.focus) {
            field.value.pop();
        }
    }

    /// Keeps only the named field. Used for single-cell inline edits.
    pub fn retain_only(mut self, label: &str) -> Self {
        self.fields.retain(|field| field.label == label);
        self.focus = 0;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{
        FormDraft, FormPayload, FormTarget, HouseProfileFormInput, MaintenanceItemFormInput,
        ProjectFormInput, QuoteFormInput,
    };
    use crate::{
        FormKind, MaintenanceCategoryId, ProjectId, ProjectStatus, ProjectTypeId, VendorId,
    };
    use time::{Date, Month};

    #[test]
    fn project_validation_rejects_empty_title() {
        let payload = FormPayload::Project(ProjectFormInput {
            title: "  ".to_owned(),
            project_type_id: ProjectTypeId::new(1),
            status: ProjectStatus::Planned,
            description: String::new(),
            start_date: None,
            end_date: None,
            budget_cents: None,
            actual_cents: None,
        });
        assert!(payload.validate().is_err());
        assert_eq!(payload.kind(), FormKind::Project);
    }

    #[test]
    fn project_validation_rejects_inverted_dates() {
        let payload = FormPayload::Project(ProjectFormInput {
            title: "Deck".to_owned(),
            project_type_id: ProjectTypeId::new(1),
            status: ProjectStatus::Planned,
            description: String::new(),
            start_date: Some(Date::from_calendar_date(2026, Month::May, 2).expect("valid date")),
            end_date: Some(Date::from_calendar_date(2026, Month::May, 1).expect("valid date")),
            budget_cents: None,
            actual_cents: None,
        });
        let message = payload.validate().expect_err("inverted dates").to_string();
        assert!(message.contains("end date"));
    }

    #[test]
    fn quote_validation_rejects_non_positive_total() {
        let payload = FormPayload::Quote(QuoteFormInput {
            project_id: ProjectId::new(1),
            vendor_id: VendorId::new(1),
            total_cents: 0,
            labor_cents: None,
            materials_cents: None,
            other_cents: None,
            received_date: None,
            notes: String::new(),
        });
        assert!(payload.validate().is_err());
    }

    #[test]
    fn maintenance_validation_rejects_zero_interval() {
        let payload = FormPayload::Maintenance(MaintenanceItemFormInput {
            name: "Filter".to_owned(),
            category_id: MaintenanceCategoryId::new(1),
            appliance_id: None,
            last_serviced_at: None,
            interval_months: 0,
            notes: String::new(),
            cost_cents: None,
        });
        assert!(payload.validate().is_err());
    }

    #[test]
    fn house_validation_checks_nickname_and_ranges() {
        let mut house = HouseProfileFormInput {
            nickname: "Elm house".to_owned(),
            address_line_1: String::new(),
            city: String::new(),
            state: String::new(),
            postal_code: String::new(),
            year_built: Some(1948),
            square_feet: Some(1_850),
            bedrooms: Some(3),
            roof_type: String::new(),
            heating_type: String::new(),
            insurance_carrier: String::new(),
            insurance_renewal: None,
            property_tax_cents: None,
        };
        let payload = FormPayload::House(house.clone());
        assert!(payload.validate().is_ok());
        assert_eq!(payload.kind(), FormKind::House);

        house.year_built = Some(48);
        assert!(house.validate().is_err());
        house.year_built = None;
        house.bedrooms = Some(-1);
        assert!(house.validate().is_err());
        house.bedrooms = None;
        house.nickname = " ".to_owned();
        let message = house.validate().expect_err("blank nickname").to_string();
        assert!(message.contains("nickname is required"));
    }

    #[test]
    fn draft_focus_wraps_and_edits_focused_field() {
        let mut draft = FormDraft::new(FormKind::Vendor, FormTarget::Create)
            .field("Name", "")
            .field("Phone", "555");

        draft.push_char('A');
        draft.focus_prev();
        assert_eq!(draft.focused_label(), Some("Phone"));
        draft.pop_char();
        draft.focus_next();
        draft.push_char('b');

        assert_eq!(draft.value("Name"), "Ab");
        assert_eq!(draft.value("Phone"), "55");
        assert_eq!(draft.value("Missing"), "");
    }

    #[test]
    fn retain_only_keeps_single_field() {
        let draft = FormDraft::new(FormKind::Vendor, FormTarget::Edit(3))
            .field("Name", "Acme")
            .field("Phone", "555")
            .retain_only("Phone");
        assert_eq!(draft.fields.len(), 1);
        assert_eq!(draft.focused_label(), Some("Phone"));
        assert_eq!(draft.target, FormTarget::Edit(3));
    }
}
