// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Deterministic fixtures for store, handler and layout tests.

use anyhow::{Context, Result};
use micasa_app::{
    ApplianceFormInput, ApplianceId, HouseProfileFormInput, MaintenanceCategoryId,
    MaintenanceItemFormInput, ProjectFormInput, ProjectId, ProjectStatus, ProjectTypeId,
    QuoteFormInput, VendorFormInput, VendorId,
};
use std::path::PathBuf;
use time::{Date, Duration, Month};

const VENDOR_TRADES: [&str; 8] = [
    "Plumbing",
    "Electric",
    "Landscaping",
    "Roofing",
    "HVAC",
    "Painting",
    "Handyman",
    "Flooring",
];

const VENDOR_ADJECTIVES: [&str; 8] = [
    "Premier", "Central", "Reliable", "Bright", "Summit", "Heritage", "Greenleaf", "Apex",
];

const FIRST_NAMES: [&str; 10] = [
    "Avery", "Jordan", "Taylor", "Riley", "Morgan", "Casey", "Quinn", "Parker", "Rowan", "Kai",
];

const LAST_NAMES: [&str; 10] = [
    "Walker", "Martin", "Hill", "Evans", "Lopez", "Gray", "Reed", "Turner", "Bennett", "Brooks",
];

const PROJECT_TITLES: [&str; 12] = [
    "Kitchen remodel",
    "Replace water heater",
    "Refinish hardwood floors",
    "Upgrade electrical panel",
    "Paint exterior trim",
    "Install gutter guards",
    "Finish basement",
    "Build retaining wall",
    "Seal ductwork joints",
    "Replace front windows",
    "Fix leaky kitchen faucet",
    "Install recessed lighting",
];

const APPLIANCE_NAMES: [&str; 8] = [
    "Refrigerator",
    "Dishwasher",
    "Washer",
    "Dryer",
    "Furnace",
    "Water Heater",
    "Range",
    "Sump Pump",
];

const APPLIANCE_BRANDS: [&str; 6] = ["Whirlpool", "Bosch", "LG", "GE", "Rheem", "Carrier"];

const APPLIANCE_LOCATIONS: [&str; 5] = ["Kitchen", "Laundry", "Basement", "Garage", "Utility"];

const MAINTENANCE_TASKS: [(&str, i32); 8] = [
    ("HVAC filter replacement", 3),
    ("Flush water heater", 12),
    ("Gutter cleaning", 6),
    ("Test GFCI outlets", 6),
    ("Smoke detector batteries", 12),
    ("Refrigerator coil cleaning", 6),
    ("Sump pump test", 6),
    ("Furnace annual inspection", 12),
];

const COLUMN_TITLES: [&str; 12] = [
    "ID", "Title", "Type", "Status", "Budget", "Actual", "Start", "End", "Vendor", "Notes",
    "Location", "Warranty",
];

const CITIES: [&str; 5] = ["Portland", "Salem", "Eugene", "Bend", "Corvallis"];

const REFERENCE_YEAR: i32 = 2026;

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn chance(&mut self, percent: u64) -> bool {
        self.next_u64() % 100 < percent
    }
}

/// Seeded generator for household records and column layouts. The same seed
/// always yields the same sequence.
#[derive(Debug, Clone)]
pub struct HomeFaker {
    rng: DeterministicRng,
}

/// A generated table header: titles, base widths and hide orders, where
/// `0` means visible and positive orders are unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnPattern {
    pub titles: Vec<String>,
    pub widths: Vec<u16>,
    pub hide_orders: Vec<u32>,
}

impl HomeFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
        }
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    pub fn vendor(&mut self) -> VendorFormInput {
        let trade = self.pick(&VENDOR_TRADES);
        let first = self.pick(&FIRST_NAMES);
        let last = self.pick(&LAST_NAMES);
        VendorFormInput {
            name: format!("{} {trade} {}", self.pick(&VENDOR_ADJECTIVES), self.int_n(900) + 100),
            contact_name: format!("{first} {last}"),
            email: format!(
                "{}.{}@example-home.com",
                first.to_ascii_lowercase(),
                last.to_ascii_lowercase()
            ),
            phone: format!(
                "({:03}) {:03}-{:04}",
                200 + self.int_n(800),
                200 + self.int_n(800),
                self.int_n(10_000)
            ),
            website: String::new(),
            notes: String::new(),
        }
    }

    pub fn house_profile(&mut self) -> HouseProfileFormInput {
        let street = self.pick(&LAST_NAMES);
        HouseProfileFormInput {
            nickname: format!("{street} house"),
            address_line_1: format!("{} {street} Ave", self.int_n(9_000) + 100),
            city: self.pick(&CITIES).to_owned(),
            state: "OR".to_owned(),
            postal_code: format!("97{:03}", self.int_n(1_000)),
            year_built: Some(1900 + self.int_n(125) as i32),
            square_feet: Some(800 + self.int_n(3_200) as i32),
            bedrooms: Some(1 + self.int_n(5) as i32),
            roof_type: "Asphalt shingle".to_owned(),
            heating_type: "Heat pump".to_owned(),
            insurance_carrier: String::new(),
            insurance_renewal: Some(reference_date() + Duration::days(self.int_n(365) as i64)),
            property_tax_cents: Some(self.cents_between(100_000, 1_200_000)),
        }
    }

    pub fn project(&mut self, project_type_id: ProjectTypeId) -> ProjectFormInput {
        let status = ProjectStatus::ALL[self.rng.int_n(ProjectStatus::ALL.len())];
        let mut project = ProjectFormInput {
            title: self.pick(&PROJECT_TITLES).to_owned(),
            project_type_id,
            status,
            description: String::new(),
            start_date: None,
            end_date: None,
            budget_cents: None,
            actual_cents: None,
        };

        if !matches!(status, ProjectStatus::Ideating | ProjectStatus::Abandoned) {
            let start = self.date_before_reference(730);
            project.start_date = Some(start);
            project.budget_cents = Some(self.cents_between(5_000, 1_500_000));
        }
        if status == ProjectStatus::Completed
            && let (Some(start), Some(budget)) = (project.start_date, project.budget_cents)
        {
            project.end_date = Some(start + Duration::days(self.int_n(120) as i64));
            let variance = self.cents_between(0, 40) - 20;
            project.actual_cents = Some((budget + budget * variance / 100).max(0));
        }
        project
    }

    pub fn quote(&mut self, project_id: ProjectId, vendor_id: VendorId) -> QuoteFormInput {
        let total = self.cents_between(10_000, 2_000_000);
        let labor = total * self.cents_between(40, 70) / 100;
        QuoteFormInput {
            project_id,
            vendor_id,
            total_cents: total,
            labor_cents: Some(labor),
            materials_cents: Some(total - labor),
            other_cents: None,
            received_date: Some(self.date_before_reference(365)),
            notes: String::new(),
        }
    }

    pub fn appliance(&mut self) -> ApplianceFormInput {
        let brand = self.pick(&APPLIANCE_BRANDS);
        let prefix = brand.chars().take(2).collect::<String>().to_uppercase();
        let purchase_date = self.date_before_reference(3650);
        let warranty_expiry = self
            .rng
            .chance(60)
            .then(|| purchase_date + Duration::days(365 * (1 + self.int_n(10) as i64)));
        ApplianceFormInput {
            name: self.pick(&APPLIANCE_NAMES).to_owned(),
            brand: brand.to_owned(),
            model_number: format!("{prefix}-{:04}", 100 + self.int_n(9_900)),
            serial_number: format!("{prefix}-{:06}", self.int_n(1_000_000)),
            purchase_date: Some(purchase_date),
            warranty_expiry,
            location: self.pick(&APPLIANCE_LOCATIONS).to_owned(),
            cost_cents: Some(self.cents_between(15_000, 800_000)),
            notes: String::new(),
        }
    }

    pub fn maintenance_item(
        &mut self,
        category_id: MaintenanceCategoryId,
        appliance_id: Option<ApplianceId>,
    ) -> MaintenanceItemFormInput {
        let (name, interval_months) = MAINTENANCE_TASKS[self.rng.int_n(MAINTENANCE_TASKS.len())];
        let last_serviced_at = self
            .rng
            .chance(70)
            .then(|| self.date_before_reference(i64::from(interval_months) * 60));
        let cost_cents = self
            .rng
            .chance(40)
            .then(|| self.cents_between(500, 50_000));
        MaintenanceItemFormInput {
            name: name.to_owned(),
            category_id,
            appliance_id,
            last_serviced_at,
            interval_months,
            notes: String::new(),
            cost_cents,
        }
    }

    /// Produces `columns` headers with between zero and `columns` of them
    /// hidden, in a random hide order.
    pub fn column_pattern(&mut self, columns: usize) -> ColumnPattern {
        let titles = (0..columns)
            .map(|index| {
                let base = COLUMN_TITLES[index % COLUMN_TITLES.len()];
                if index < COLUMN_TITLES.len() {
                    base.to_owned()
                } else {
                    format!("{base}{}", index / COLUMN_TITLES.len())
                }
            })
            .collect::<Vec<_>>();
        let widths = (0..columns)
            .map(|_| 1 + self.int_n(14) as u16)
            .collect::<Vec<_>>();

        let mut hidden = (0..columns)
            .filter(|_| self.rng.chance(40))
            .collect::<Vec<_>>();
        // Fisher-Yates so hide orders are not tied to column position.
        for index in (1..hidden.len()).rev() {
            let swap = self.int_n(index + 1);
            hidden.swap(index, swap);
        }
        let mut hide_orders = vec![0; columns];
        for (order, column) in hidden.into_iter().enumerate() {
            hide_orders[column] = order as u32 + 1;
        }

        ColumnPattern {
            titles,
            widths,
            hide_orders,
        }
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }

    fn cents_between(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        min + (self.rng.next_u64() % ((max - min + 1) as u64)) as i64
    }

    fn date_before_reference(&mut self, max_days: i64) -> Date {
        reference_date() - Duration::days(self.cents_between(0, max_days.max(0)))
    }
}

pub fn temp_db_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let db_path = dir.path().join("micasa.db");
    Ok((dir, db_path))
}

fn reference_date() -> Date {
    Date::from_calendar_date(REFERENCE_YEAR, Month::January, 1)
        .unwrap_or(Date::MIN)
}

#[cfg(test)]
mod tests {
    use super::HomeFaker;
    use micasa_app::{MaintenanceCategoryId, ProjectStatus, ProjectTypeId};
    use std::collections::BTreeSet;

    #[test]
    fn same_seed_same_sequence() {
        let mut first = HomeFaker::new(42);
        let mut second = HomeFaker::new(42);
        assert_eq!(first.vendor(), second.vendor());
        assert_eq!(
            first.project(ProjectTypeId::new(1)),
            second.project(ProjectTypeId::new(1))
        );
        assert_eq!(first.column_pattern(8), second.column_pattern(8));
    }

    #[test]
    fn generated_inputs_validate() {
        let mut faker = HomeFaker::new(7);
        for _ in 0..50 {
            let project = faker.project(ProjectTypeId::new(3));
            assert!(project.validate().is_ok(), "{project:?}");
            if project.status == ProjectStatus::Completed {
                assert!(project.end_date.is_some());
            }
            assert!(faker.vendor().validate().is_ok());
            assert!(faker.appliance().validate().is_ok());
            assert!(faker.house_profile().validate().is_ok());
            let item = faker.maintenance_item(MaintenanceCategoryId::new(1), None);
            assert!(item.validate().is_ok(), "{item:?}");
        }
    }

    #[test]
    fn column_pattern_hide_orders_are_unique_and_dense() {
        let mut faker = HomeFaker::new(11);
        for columns in 1..20 {
            let pattern = faker.column_pattern(columns);
            assert_eq!(pattern.titles.len(), columns);
            assert!(pattern.widths.iter().all(|width| *width >= 1));

            let positive = pattern
                .hide_orders
                .iter()
                .copied()
                .filter(|order| *order > 0)
                .collect::<Vec<_>>();
            let unique = positive.iter().copied().collect::<BTreeSet<_>>();
            assert_eq!(unique.len(), positive.len());
            assert_eq!(unique, (1..=positive.len() as u32).collect());
        }
    }

    #[test]
    fn column_titles_stay_distinct_past_the_base_list() {
        let pattern = HomeFaker::new(3).column_pattern(30);
        let distinct = pattern.titles.iter().collect::<BTreeSet<_>>();
        assert_eq!(distinct.len(), 30);
    }
}
