// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! The fixed household behind `micasa --demo`.

use anyhow::{Context, Result, anyhow};
use micasa_app::{
    ApplianceFormInput, EntityStore, HouseProfileFormInput, MaintenanceItemFormInput,
    ProjectFormInput, ProjectStatus, QuoteFormInput, VendorFormInput,
};
use time::macros::date;
use tracing::{debug, info};

use crate::Store;

const DEMO_VENDORS: [(&str, &str, &str, &str); 5] = [
    ("Premier Plumbing", "Avery Walker", "avery@premierplumbing.example", "555-0142"),
    ("Summit Roofing", "Jordan Hill", "jordan@summitroofing.example", "555-0178"),
    ("Bright Electric", "Taylor Evans", "", "555-0113"),
    ("Greenleaf Landscaping", "Riley Lopez", "office@greenleaf.example", ""),
    ("Apex HVAC", "Morgan Gray", "service@apexhvac.example", "555-0199"),
];

impl Store {
    /// Inserts the demo household. A store that already has projects is
    /// left alone.
    pub fn seed_demo_data(&self) -> Result<()> {
        if !self.list_projects(true)?.is_empty() {
            debug!("store already has data; skipping demo seed");
            return Ok(());
        }

        self.upsert_house_profile(&HouseProfileFormInput {
            nickname: "Elm Street".to_owned(),
            address_line_1: "412 Elm St".to_owned(),
            city: "Portland".to_owned(),
            state: "OR".to_owned(),
            postal_code: "97214".to_owned(),
            year_built: Some(1948),
            square_feet: Some(1_860),
            bedrooms: Some(3),
            roof_type: "Asphalt shingle".to_owned(),
            heating_type: "Gas furnace".to_owned(),
            insurance_carrier: "Cascade Mutual".to_owned(),
            insurance_renewal: Some(date!(2026 - 08 - 01)),
            property_tax_cents: Some(512_300),
        })?;

        let mut vendors = Vec::with_capacity(DEMO_VENDORS.len());
        for (name, contact_name, email, phone) in DEMO_VENDORS {
            vendors.push(self.create_vendor(&VendorFormInput {
                name: name.to_owned(),
                contact_name: contact_name.to_owned(),
                email: email.to_owned(),
                phone: phone.to_owned(),
                website: String::new(),
                notes: String::new(),
            })?);
        }
        let [plumber, roofer, electrician, _landscaper, hvac] =
            <[_; 5]>::try_from(vendors).map_err(|_| anyhow!("demo vendors out of sync"))?;

        let project_type = |name: &str| -> Result<_> {
            self.list_project_types()?
                .into_iter()
                .find(|project_type| project_type.name == name)
                .map(|project_type| project_type.id)
                .with_context(|| format!("project type {name} is missing -- bootstrap first"))
        };
        let category = |name: &str| -> Result<_> {
            self.list_maintenance_categories()?
                .into_iter()
                .find(|category| category.name == name)
                .map(|category| category.id)
                .with_context(|| format!("maintenance category {name} is missing"))
        };

        let bathroom = self.create_project(&ProjectFormInput {
            title: "Upstairs bathroom remodel".to_owned(),
            project_type_id: project_type("Remodel")?,
            status: ProjectStatus::Quoted,
            description: "Replace the tub with a walk-in shower".to_owned(),
            start_date: Some(date!(2026 - 03 - 02)),
            end_date: None,
            budget_cents: Some(1_850_000),
            actual_cents: None,
        })?;
        let roof = self.create_project(&ProjectFormInput {
            title: "Reroof north slope".to_owned(),
            project_type_id: project_type("Roof")?,
            status: ProjectStatus::Completed,
            description: String::new(),
            start_date: Some(date!(2025 - 07 - 14)),
            end_date: Some(date!(2025 - 07 - 18)),
            budget_cents: Some(1_200_000),
            actual_cents: Some(1_134_500),
        })?;
        let furnace = self.create_project(&ProjectFormInput {
            title: "Furnace replacement".to_owned(),
            project_type_id: project_type("HVAC")?,
            status: ProjectStatus::Planned,
            description: "Current unit is 22 years old".to_owned(),
            start_date: None,
            end_date: None,
            budget_cents: Some(780_000),
            actual_cents: None,
        })?;
        self.create_project(&ProjectFormInput {
            title: "Backyard drainage".to_owned(),
            project_type_id: project_type("Landscaping")?,
            status: ProjectStatus::Ideating,
            description: String::new(),
            start_date: None,
            end_date: None,
            budget_cents: None,
            actual_cents: None,
        })?;
        self.create_project(&ProjectFormInput {
            title: "Panel upgrade to 200A".to_owned(),
            project_type_id: project_type("Electrical")?,
            status: ProjectStatus::Underway,
            description: String::new(),
            start_date: Some(date!(2026 - 01 - 12)),
            end_date: None,
            budget_cents: Some(420_000),
            actual_cents: Some(150_000),
        })?;

        for (project_id, vendor_id, total_cents, labor_cents, received) in [
            (bathroom, plumber, 1_720_000, Some(980_000), date!(2026 - 02 - 10)),
            (bathroom, electrician, 210_000, Some(180_000), date!(2026 - 02 - 12)),
            (roof, roofer, 1_134_500, Some(640_000), date!(2025 - 06 - 20)),
            (furnace, hvac, 765_000, None, date!(2026 - 02 - 27)),
        ] {
            self.create_quote(&QuoteFormInput {
                project_id,
                vendor_id,
                total_cents,
                labor_cents,
                materials_cents: labor_cents.map(|labor| total_cents - labor),
                other_cents: None,
                received_date: Some(received),
                notes: String::new(),
            })?;
        }

        let dishwasher = self.create_appliance(&ApplianceFormInput {
            name: "Dishwasher".to_owned(),
            brand: "Bosch".to_owned(),
            model_number: "SHX78CM5N".to_owned(),
            serial_number: "FD9810-44721".to_owned(),
            purchase_date: Some(date!(2022 - 05 - 03)),
            warranty_expiry: Some(date!(2024 - 05 - 03)),
            location: "Kitchen".to_owned(),
            cost_cents: Some(119_900),
            notes: String::new(),
        })?;
        let heater = self.create_appliance(&ApplianceFormInput {
            name: "Water heater".to_owned(),
            brand: "Rheem".to_owned(),
            model_number: "XG50T06EC36U1".to_owned(),
            serial_number: String::new(),
            purchase_date: Some(date!(2019 - 10 - 21)),
            warranty_expiry: Some(date!(2025 - 10 - 21)),
            location: "Basement".to_owned(),
            cost_cents: Some(89_000),
            notes: "50 gal, gas".to_owned(),
        })?;
        self.create_appliance(&ApplianceFormInput {
            name: "Refrigerator".to_owned(),
            brand: "LG".to_owned(),
            model_number: "LRMVS3006S".to_owned(),
            serial_number: String::new(),
            purchase_date: Some(date!(2023 - 11 - 24)),
            warranty_expiry: None,
            location: "Kitchen".to_owned(),
            cost_cents: Some(249_900),
            notes: String::new(),
        })?;

        for (name, category_name, appliance_id, last_serviced, interval_months) in [
            ("Flush water heater", "Plumbing", Some(heater), date!(2025 - 04 - 05), 12),
            ("Clean dishwasher filter", "Appliance", Some(dishwasher), date!(2026 - 01 - 20), 3),
            ("Replace furnace filter", "HVAC", None, date!(2025 - 12 - 01), 3),
            ("Test smoke detectors", "Safety", None, date!(2025 - 09 - 15), 6),
            ("Clean gutters", "Exterior", None, date!(2025 - 11 - 02), 6),
        ] {
            self.create_maintenance_item(&MaintenanceItemFormInput {
                name: name.to_owned(),
                category_id: category(category_name)?,
                appliance_id,
                last_serviced_at: Some(last_serviced),
                interval_months,
                notes: String::new(),
                cost_cents: None,
            })?;
        }

        info!("seeded demo data");
        Ok(())
    }
}
