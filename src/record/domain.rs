//! Core financial record types and their validation rules.

use std::{fmt::Display, str::FromStr};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::Error;

// ============================================================================
// IDENTIFIERS
// ============================================================================

/// The opaque identifier the store assigns to a record when it is created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Wrap an identifier issued by the store.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for RecordId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The identifier of the user that owns a record, as issued by the identity
/// provider.
///
/// The value is opaque to this crate, but never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Create a user ID.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::Validation] if `id` is empty or
    /// only whitespace. Any other value is kept exactly as given.
    pub fn new(id: &str) -> Result<Self, Error> {
        if id.trim().is_empty() {
            Err(Error::Validation("userId must not be empty".to_owned()))
        } else {
            Ok(Self(id.to_owned()))
        }
    }

    /// Create a user ID without validation.
    ///
    /// The caller should ensure that the string is not empty, e.g. because it
    /// was read back from the database.
    pub fn new_unchecked(id: &str) -> Self {
        Self(id.to_owned())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for UserId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        UserId::new(&value)
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0
    }
}

// ============================================================================
// ENUMERATED FIELDS
// ============================================================================

/// What a transaction was for.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Food,
    Rent,
    Salary,
    Utilities,
    Entertainment,
    Other,
}

impl Category {
    /// Every category, in the order a picker should list them.
    pub const ALL: [Category; 6] = [
        Category::Food,
        Category::Rent,
        Category::Salary,
        Category::Utilities,
        Category::Entertainment,
        Category::Other,
    ];

    /// The display name, which is also the wire and database representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Rent => "Rent",
            Category::Salary => "Salary",
            Category::Utilities => "Utilities",
            Category::Entertainment => "Entertainment",
            Category::Other => "Other",
        }
    }
}

/// How a transaction was paid.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "Credit Card")]
    CreditCard,
    Cash,
    #[serde(rename = "Bank Transfer")]
    BankTransfer,
}

impl PaymentMethod {
    /// Every payment method, in the order a picker should list them.
    pub const ALL: [PaymentMethod; 3] = [
        PaymentMethod::CreditCard,
        PaymentMethod::Cash,
        PaymentMethod::BankTransfer,
    ];

    /// The display name, which is also the wire and database representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "Credit Card",
            PaymentMethod::Cash => "Cash",
            PaymentMethod::BankTransfer => "Bank Transfer",
        }
    }
}

/// Implements `Display`, `FromStr` and the SQLite conversions for an enum
/// with an `ALL` table and an `as_str` method.
macro_rules! named_enum {
    ($name:ident, $label:literal) => {
        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.pad(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();

                $name::ALL
                    .into_iter()
                    .find(|value| value.as_str() == s)
                    .ok_or_else(|| Error::Validation(format!("\"{s}\" is not a valid {}", $label)))
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|error| FromSqlError::Other(Box::new(error)))
            }
        }
    };
}

named_enum!(Category, "category");
named_enum!(PaymentMethod, "payment method");

// ============================================================================
// RECORDS
// ============================================================================

/// A single income or expense that belongs to one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialRecord {
    /// The ID assigned by the store.
    #[serde(rename = "_id")]
    pub id: RecordId,
    /// The owner of the record.
    pub user_id: UserId,
    /// When the record was created.
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    /// What the money was spent on or earned from.
    pub description: String,
    /// The signed value of the transaction, negative for money spent.
    pub amount: f64,
    /// What kind of income or expense this is.
    pub category: Category,
    /// How the money was paid or received.
    pub payment_method: PaymentMethod,
}

/// The fields a user fills in to add a record.
///
/// The owner and date are attached by the session when the draft is
/// submitted, see [NewRecord::new].
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDraft {
    pub description: String,
    pub amount: f64,
    pub category: Category,
    pub payment_method: PaymentMethod,
}

impl RecordDraft {
    /// Create a draft, trimming the description.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::Validation] if the description is
    /// blank or the amount is not a finite number.
    pub fn new(
        description: &str,
        amount: f64,
        category: Category,
        payment_method: PaymentMethod,
    ) -> Result<Self, Error> {
        Ok(Self {
            description: validate_description(description)?,
            amount: validate_amount(amount)?,
            category,
            payment_method,
        })
    }

    /// Create a draft from the raw text of the add record form.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::Validation] if any field is
    /// blank, the amount is not a number, or the category or payment method is
    /// not one of the known names.
    pub fn parse(
        description: &str,
        amount: &str,
        category: &str,
        payment_method: &str,
    ) -> Result<Self, Error> {
        Self::new(
            description,
            parse_amount(amount)?,
            category.parse()?,
            payment_method.parse()?,
        )
    }
}

/// A record that has been validated but not yet stored.
///
/// This is the body of a create request.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRecord {
    pub user_id: UserId,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    pub description: String,
    pub amount: f64,
    pub category: Category,
    pub payment_method: PaymentMethod,
}

impl NewRecord {
    /// Attach an owner and a date to a draft.
    pub fn new(user_id: UserId, date: OffsetDateTime, draft: RecordDraft) -> Self {
        Self {
            user_id,
            date,
            description: draft.description,
            amount: draft.amount,
            category: draft.category,
            payment_method: draft.payment_method,
        }
    }

    /// Check the rules that the type system does not enforce on its own and
    /// return the record with its description trimmed.
    ///
    /// # Errors
    ///
    /// Returns an [Error::Validation] for a blank description or a non-finite
    /// amount.
    pub fn validate(self) -> Result<Self, Error> {
        Ok(Self {
            description: validate_description(&self.description)?,
            amount: validate_amount(self.amount)?,
            ..self
        })
    }
}

/// The fields to change in an existing record.
///
/// Fields left as `None` keep their stored value. The ID, owner and date of a
/// record cannot be changed, so they are not part of a patch and are ignored
/// if a client sends them.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
}

impl RecordPatch {
    /// Create a patch for a single edited table cell from its raw text.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::Validation] if `raw` is not a
    /// valid value for `field`.
    pub fn from_field(field: RecordField, raw: &str) -> Result<Self, Error> {
        let patch = match field {
            RecordField::Description => Self {
                description: Some(validate_description(raw)?),
                ..Default::default()
            },
            RecordField::Amount => Self {
                amount: Some(parse_amount(raw)?),
                ..Default::default()
            },
            RecordField::Category => Self {
                category: Some(raw.parse()?),
                ..Default::default()
            },
            RecordField::PaymentMethod => Self {
                payment_method: Some(raw.parse()?),
                ..Default::default()
            },
        };

        Ok(patch)
    }

    /// Check the supplied fields and return the patch with its description
    /// trimmed.
    ///
    /// # Errors
    ///
    /// Returns an [Error::Validation] for a blank description or a non-finite
    /// amount.
    pub fn validate(self) -> Result<Self, Error> {
        Ok(Self {
            description: self
                .description
                .as_deref()
                .map(validate_description)
                .transpose()?,
            amount: self.amount.map(validate_amount).transpose()?,
            ..self
        })
    }
}

/// The columns of the records table that a user may edit in place.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordField {
    Description,
    Amount,
    Category,
    PaymentMethod,
}

impl FromStr for RecordField {
    type Err = Error;

    /// Parse a column ID as used in the record JSON, e.g. "paymentMethod".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "description" => Ok(RecordField::Description),
            "amount" => Ok(RecordField::Amount),
            "category" => Ok(RecordField::Category),
            "paymentMethod" => Ok(RecordField::PaymentMethod),
            other => Err(Error::Validation(format!(
                "\"{other}\" is not an editable field"
            ))),
        }
    }
}

fn validate_description(description: &str) -> Result<String, Error> {
    let description = description.trim();

    if description.is_empty() {
        Err(Error::Validation("description must not be empty".to_owned()))
    } else {
        Ok(description.to_owned())
    }
}

fn validate_amount(amount: f64) -> Result<f64, Error> {
    if amount.is_finite() {
        Ok(amount)
    } else {
        Err(Error::Validation(format!("{amount} is not a valid amount")))
    }
}

fn parse_amount(raw: &str) -> Result<f64, Error> {
    let raw = raw.trim();

    raw.parse::<f64>()
        .map_err(|_| Error::Validation(format!("\"{raw}\" is not a valid amount")))
        .and_then(validate_amount)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use time::macros::datetime;

    use crate::{
        Error,
        record::{
            Category, FinancialRecord, NewRecord, PaymentMethod, RecordDraft, RecordField,
            RecordId, RecordPatch, UserId,
        },
        test_utils::new_record,
    };

    #[test]
    fn user_id_rejects_blank() {
        assert!(matches!(UserId::new("   "), Err(Error::Validation(_))));
        assert!(matches!(UserId::new(""), Err(Error::Validation(_))));
    }

    #[test]
    fn parses_payment_method_display_names() {
        assert_eq!(
            "Credit Card".parse::<PaymentMethod>(),
            Ok(PaymentMethod::CreditCard)
        );
        assert_eq!(
            "Bank Transfer".parse::<PaymentMethod>(),
            Ok(PaymentMethod::BankTransfer)
        );
        assert!("Cheque".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn category_names_round_trip() {
        for category in Category::ALL {
            assert_eq!(category.to_string().parse::<Category>(), Ok(category));
        }
    }

    #[test]
    fn draft_parse_reads_form_text() {
        let draft = RecordDraft::parse(" Coffee ", "-4.5", "Food", "Cash").unwrap();

        assert_eq!(
            draft,
            RecordDraft {
                description: "Coffee".to_owned(),
                amount: -4.5,
                category: Category::Food,
                payment_method: PaymentMethod::Cash,
            }
        );
    }

    #[test]
    fn draft_parse_rejects_bad_amount() {
        let result = RecordDraft::parse("Coffee", "four", "Food", "Cash");

        assert_eq!(
            result,
            Err(Error::Validation("\"four\" is not a valid amount".to_owned()))
        );
    }

    #[test]
    fn draft_rejects_blank_description() {
        let result = RecordDraft::new("", 1.0, Category::Other, PaymentMethod::Cash);

        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn draft_rejects_infinite_amount() {
        let result = RecordDraft::new("Lotto", f64::INFINITY, Category::Other, PaymentMethod::Cash);

        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn record_uses_wire_field_names() {
        let record = FinancialRecord {
            id: RecordId::new("65a1b2c3d4e5f60718293a4b"),
            user_id: UserId::new("u1").unwrap(),
            date: datetime!(2024-03-01 12:30:00 UTC),
            description: "Wifi".to_owned(),
            amount: -60.0,
            category: Category::Utilities,
            payment_method: PaymentMethod::BankTransfer,
        };

        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(
            value,
            json!({
                "_id": "65a1b2c3d4e5f60718293a4b",
                "userId": "u1",
                "date": "2024-03-01T12:30:00Z",
                "description": "Wifi",
                "amount": -60.0,
                "category": "Utilities",
                "paymentMethod": "Bank Transfer",
            })
        );
    }

    #[test]
    fn new_record_requires_every_field() {
        let result = serde_json::from_value::<NewRecord>(json!({
            "userId": "u1",
            "date": "2024-03-01T12:30:00Z",
            "description": "Wifi",
            "category": "Utilities",
            "paymentMethod": "Cash",
        }));

        assert!(result.is_err());
    }

    #[test]
    fn new_record_rejects_empty_user_id() {
        let result = serde_json::from_value::<NewRecord>(json!({
            "userId": "",
            "date": "2024-03-01T12:30:00Z",
            "description": "Wifi",
            "amount": 1.0,
            "category": "Utilities",
            "paymentMethod": "Cash",
        }));

        assert!(result.is_err());
    }

    #[test]
    fn patch_ignores_immutable_fields() {
        let patch = serde_json::from_value::<RecordPatch>(json!({
            "_id": "abc",
            "userId": "someone-else",
            "date": "2020-01-01T00:00:00Z",
            "amount": 10.0,
        }))
        .unwrap();

        assert_eq!(
            patch,
            RecordPatch {
                amount: Some(10.0),
                ..Default::default()
            }
        );
    }

    #[test]
    fn patch_serializes_only_supplied_fields() {
        let patch = RecordPatch {
            category: Some(Category::Rent),
            ..Default::default()
        };

        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            json!({ "category": "Rent" })
        );
    }

    #[test]
    fn patch_from_cell_edit() {
        let field: RecordField = "paymentMethod".parse().unwrap();

        let patch = RecordPatch::from_field(field, "Cash").unwrap();

        assert_eq!(patch.payment_method, Some(PaymentMethod::Cash));
        assert!(patch.description.is_none());
    }

    #[test]
    fn date_is_not_an_editable_field() {
        assert!("date".parse::<RecordField>().is_err());
    }

    #[test]
    fn patch_rejects_blank_description() {
        let patch = RecordPatch {
            description: Some("  ".to_owned()),
            ..Default::default()
        };

        assert!(patch.validate().is_err());
        assert!(RecordPatch::from_field(RecordField::Description, "").is_err());
    }

    #[test]
    fn validation_trims_descriptions() {
        let record = NewRecord {
            description: "  Coffee  ".to_owned(),
            ..new_record("u1", "Coffee", 4.5)
        };
        let patch = RecordPatch {
            description: Some(" Tea\n".to_owned()),
            ..Default::default()
        };

        assert_eq!(record.validate().unwrap().description, "Coffee");
        assert_eq!(patch.validate().unwrap().description.as_deref(), Some("Tea"));
    }

    #[test]
    fn user_id_keeps_surrounding_whitespace() {
        let padded = UserId::new(" u1").unwrap();

        assert_eq!(padded.as_str(), " u1");
        assert_ne!(padded, UserId::new("u1").unwrap());
    }
}
