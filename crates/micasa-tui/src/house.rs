// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! The house profile form. There is one profile per database and no tab, so
//! it sits beside the entity handlers rather than behind one.

use micasa_app::validation::{format_date, parse_optional_int};
use micasa_app::{EntityStore, FormDraft, FormKind, FormTarget, HouseProfileFormInput};
use tracing::debug;

use crate::handlers::{HandlerError, HandlerResult, cents, checked, date, invalid, money_text, text};

const DEFAULT_NICKNAME: &str = "My house";

/// Prefills from the stored profile, or starts a create draft when the
/// database has none yet.
pub fn start_house_form(store: &dyn EntityStore) -> HandlerResult<FormDraft> {
    let Some(house) = store.get_house_profile().map_err(HandlerError::classify)? else {
        return Ok(FormDraft::new(FormKind::House, FormTarget::Create)
            .field("Nickname", DEFAULT_NICKNAME)
            .field("Address", "")
            .field("City", "")
            .field("State", "")
            .field("Postal code", "")
            .field("Year built", "")
            .field("Sq ft", "")
            .field("Bedrooms", "")
            .field("Roof", "")
            .field("Heating", "")
            .field("Insurer", "")
            .field("Renewal", "")
            .field("Property tax", ""));
    };
    Ok(FormDraft::new(FormKind::House, FormTarget::Edit(house.id.get()))
        .field("Nickname", house.nickname)
        .field("Address", house.address_line_1)
        .field("City", house.city)
        .field("State", house.state)
        .field("Postal code", house.postal_code)
        .field("Year built", int_text(house.year_built))
        .field("Sq ft", int_text(house.square_feet))
        .field("Bedrooms", int_text(house.bedrooms))
        .field("Roof", house.roof_type)
        .field("Heating", house.heating_type)
        .field("Insurer", house.insurance_carrier)
        .field("Renewal", format_date(house.insurance_renewal))
        .field("Property tax", money_text(house.property_tax_cents)))
}

/// Writes the singleton profile and returns its id.
pub fn submit_house_form(store: &dyn EntityStore, draft: &FormDraft) -> HandlerResult<i64> {
    if draft.kind != FormKind::House {
        return Err(HandlerError::Validation(format!(
            "{} form submitted as the house profile",
            draft.kind.noun()
        )));
    }
    let input = HouseProfileFormInput {
        nickname: text(draft, "Nickname"),
        address_line_1: text(draft, "Address"),
        city: text(draft, "City"),
        state: text(draft, "State"),
        postal_code: text(draft, "Postal code"),
        year_built: int(draft, "Year built")?,
        square_feet: int(draft, "Sq ft")?,
        bedrooms: int(draft, "Bedrooms")?,
        roof_type: text(draft, "Roof"),
        heating_type: text(draft, "Heating"),
        insurance_carrier: text(draft, "Insurer"),
        insurance_renewal: date(draft, "Renewal")?,
        property_tax_cents: cents(draft, "Property tax")?,
    };
    checked(input.validate())?;
    let id = store
        .upsert_house_profile(&input)
        .map_err(HandlerError::classify)?;
    debug!(id = id.get(), "house profile saved");
    Ok(id.get())
}

fn int(draft: &FormDraft, label: &str) -> HandlerResult<Option<i32>> {
    parse_optional_int(draft.value(label)).map_err(|error| invalid(label, error))
}

fn int_text(value: Option<i32>) -> String {
    value.map(|value| value.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::int_text;

    #[test]
    fn blank_ints_render_empty() {
        assert_eq!(int_text(None), "");
        assert_eq!(int_text(Some(1948)), "1948");
    }
}
