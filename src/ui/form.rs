//! The entity editor modal: text fields plus fields that cycle through a
//! fixed set of values.

use crate::error::FormError;
use crate::geofence::{EntityDraft, GroupDraft};
use crate::model::{Choice, EntityKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Operator,
    ChargeType,
    PermitType,
    VehicleType,
    MaxDuration,
    MaxHeight,
    MaxWidth,
    Status,
}

impl Field {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Field::Name => "Name",
            Field::Operator => "Operator",
            Field::ChargeType => "Charge type",
            Field::PermitType => "Permit",
            Field::VehicleType => "Vehicle type",
            Field::MaxDuration => "Max stay (min)",
            Field::MaxHeight => "Max height (m)",
            Field::MaxWidth => "Max width (m)",
            Field::Status => "Status",
        }
    }

    #[must_use]
    pub fn is_choice(self) -> bool {
        matches!(
            self,
            Field::ChargeType | Field::PermitType | Field::VehicleType | Field::Status
        )
    }
}

const SITE_FIELDS: &[Field] = &[Field::Name, Field::Operator];
const GROUP_FIELDS: &[Field] = &[
    Field::Name,
    Field::ChargeType,
    Field::PermitType,
    Field::VehicleType,
    Field::MaxDuration,
    Field::MaxHeight,
    Field::MaxWidth,
];
const SPOT_FIELDS: &[Field] = &[Field::Name, Field::Status];

fn optional_text<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn parse_optional<T: std::str::FromStr>(
    field: Field,
    text: &str,
) -> Result<Option<T>, FormError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    text.parse().map(Some).map_err(|_| FormError::InvalidNumber {
        field: field.label(),
        value: text.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditorForm {
    draft: EntityDraft,
    read_only: bool,
    focused: usize,
    operator: String,
    duration: String,
    height: String,
    width: String,
}

impl EditorForm {
    #[must_use]
    pub fn new(draft: EntityDraft, read_only: bool) -> Self {
        let mut form = Self {
            draft,
            read_only,
            focused: 0,
            operator: String::new(),
            duration: String::new(),
            height: String::new(),
            width: String::new(),
        };
        match &form.draft {
            EntityDraft::Site(d) => form.operator = d.ref_operator.clone().unwrap_or_default(),
            EntityDraft::Group(d) => {
                form.duration = optional_text(d.maximum_parking_duration);
                form.height = optional_text(d.max_height);
                form.width = optional_text(d.max_width);
            }
            EntityDraft::Spot(_) => {}
        }
        form
    }

    #[must_use]
    pub fn kind(&self) -> EntityKind {
        self.draft.kind()
    }

    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    #[must_use]
    pub fn fields(&self) -> &'static [Field] {
        match self.kind() {
            EntityKind::Site => SITE_FIELDS,
            EntityKind::Group => GROUP_FIELDS,
            EntityKind::Spot => SPOT_FIELDS,
        }
    }

    #[must_use]
    pub fn focused(&self) -> Field {
        self.fields()[self.focused.min(self.fields().len() - 1)]
    }

    #[must_use]
    pub fn value(&self, field: Field) -> String {
        match (&self.draft, field) {
            (_, Field::Name) => self.draft.name().to_string(),
            (_, Field::Operator) => self.operator.clone(),
            (_, Field::MaxDuration) => self.duration.clone(),
            (_, Field::MaxHeight) => self.height.clone(),
            (_, Field::MaxWidth) => self.width.clone(),
            (EntityDraft::Group(d), Field::ChargeType) => d.charge_type.label().to_string(),
            (EntityDraft::Group(d), Field::PermitType) => d.permit_type.label().to_string(),
            (EntityDraft::Group(d), Field::VehicleType) => {
                d.allowed_vehicle_type.label().to_string()
            }
            (EntityDraft::Spot(d), Field::Status) => d.status.label().to_string(),
            _ => String::new(),
        }
    }

    pub fn next_field(&mut self) {
        self.focused = (self.focused + 1) % self.fields().len();
    }

    pub fn previous_field(&mut self) {
        let len = self.fields().len();
        self.focused = (self.focused + len - 1) % len;
    }

    fn text_mut(&mut self, field: Field) -> Option<&mut String> {
        match field {
            Field::Name => Some(match &mut self.draft {
                EntityDraft::Site(d) => &mut d.name,
                EntityDraft::Group(d) => &mut d.name,
                EntityDraft::Spot(d) => &mut d.name,
            }),
            Field::Operator => Some(&mut self.operator),
            Field::MaxDuration => Some(&mut self.duration),
            Field::MaxHeight => Some(&mut self.height),
            Field::MaxWidth => Some(&mut self.width),
            _ => None,
        }
    }

    pub fn insert(&mut self, c: char) {
        if self.read_only {
            return;
        }
        if let Some(text) = self.text_mut(self.focused()) {
            text.push(c);
        }
    }

    pub fn backspace(&mut self) {
        if self.read_only {
            return;
        }
        if let Some(text) = self.text_mut(self.focused()) {
            text.pop();
        }
    }

    /// Steps the focused choice field forwards or backwards.
    pub fn cycle(&mut self, forward: bool) {
        fn step<T: Choice>(value: &mut T, forward: bool) {
            *value = if forward { value.next() } else { value.previous() };
        }
        if self.read_only {
            return;
        }
        match (self.focused(), &mut self.draft) {
            (Field::ChargeType, EntityDraft::Group(d)) => step(&mut d.charge_type, forward),
            (Field::PermitType, EntityDraft::Group(d)) => step(&mut d.permit_type, forward),
            (Field::VehicleType, EntityDraft::Group(d)) => {
                step(&mut d.allowed_vehicle_type, forward);
            }
            (Field::Status, EntityDraft::Spot(d)) => step(&mut d.status, forward),
            _ => {}
        }
    }

    /// The draft to submit, with numeric fields parsed.
    pub fn to_draft(&self) -> Result<EntityDraft, FormError> {
        let mut draft = self.draft.clone();
        match &mut draft {
            EntityDraft::Site(d) => {
                let operator = self.operator.trim();
                d.ref_operator = (!operator.is_empty()).then(|| operator.to_string());
            }
            EntityDraft::Group(d) => {
                let parsed = GroupDraft {
                    maximum_parking_duration: parse_optional(Field::MaxDuration, &self.duration)?,
                    max_height: parse_optional(Field::MaxHeight, &self.height)?,
                    max_width: parse_optional(Field::MaxWidth, &self.width)?,
                    ..d.clone()
                };
                for (field, value) in [
                    (Field::MaxHeight, parsed.max_height),
                    (Field::MaxWidth, parsed.max_width),
                ] {
                    if value.is_some_and(|v: f64| v < 0.0 || !v.is_finite()) {
                        return Err(FormError::InvalidNumber {
                            field: field.label(),
                            value: optional_text(value),
                        });
                    }
                }
                *d = parsed;
            }
            EntityDraft::Spot(_) => {}
        }
        Ok(draft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geofence::SpotDraft;
    use crate::model::{ChargeType, OccupancyStatus};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_typing_and_cycling_build_group_draft() {
        let mut form = EditorForm::new(EntityDraft::blank(EntityKind::Group), false);
        for c in "Bay A".chars() {
            form.insert(c);
        }
        form.next_field();
        assert_eq!(form.focused(), Field::ChargeType);
        form.cycle(true);
        form.next_field();
        form.next_field();
        form.next_field();
        assert_eq!(form.focused(), Field::MaxDuration);
        form.insert('9');
        form.insert('0');

        let EntityDraft::Group(draft) = form.to_draft().unwrap() else {
            panic!("expected a group draft");
        };
        assert_eq!(draft.name, "Bay A");
        assert_eq!(draft.charge_type, ChargeType::FlatRate);
        assert_eq!(draft.maximum_parking_duration, Some(90));
        assert_eq!(draft.max_height, None);
    }

    #[test]
    fn test_bad_number_is_reported() {
        let mut form = EditorForm::new(EntityDraft::blank(EntityKind::Group), false);
        form.previous_field();
        assert_eq!(form.focused(), Field::MaxWidth);
        form.insert('x');
        assert_eq!(
            form.to_draft(),
            Err(FormError::InvalidNumber {
                field: "Max width (m)",
                value: "x".into()
            })
        );
    }

    #[test]
    fn test_read_only_form_ignores_input() {
        let draft = EntityDraft::Spot(SpotDraft {
            name: "A-1".into(),
            status: OccupancyStatus::Occupied,
        });
        let mut form = EditorForm::new(draft.clone(), true);
        form.insert('x');
        form.next_field();
        form.cycle(true);
        assert_eq!(form.to_draft(), Ok(draft));
        assert_eq!(form.value(Field::Status), "occupied");
    }
}
