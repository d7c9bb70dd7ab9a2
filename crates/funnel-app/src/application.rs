#![forbid(unsafe_code)]

//! Typed view of the application answers kept in the durable store.
//!
//! The store itself holds flat strings under fixed keys. This module is the
//! only place that knows those keys; controllers work with
//! [`ApplicationRecord`] and [`Field`].

use std::fmt;

use funnel_runtime::state_persistence::KeyValueStore;

/// Debt amount assumed when none was entered.
pub const DEFAULT_DEBT_AMOUNT: &str = "20000";

/// A stored application field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    DebtAmount,
    FirstName,
    LastName,
    Phone,
    Email,
    Address,
    Spanish,
    Street,
    City,
    State,
    Zip,
}

impl Field {
    pub const ALL: [Field; 11] = [
        Field::DebtAmount,
        Field::FirstName,
        Field::LastName,
        Field::Phone,
        Field::Email,
        Field::Address,
        Field::Spanish,
        Field::Street,
        Field::City,
        Field::State,
        Field::Zip,
    ];

    /// Store key.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Field::DebtAmount => "debtAmount",
            Field::FirstName => "firstName",
            Field::LastName => "lastName",
            Field::Phone => "phone",
            Field::Email => "email",
            Field::Address => "address",
            Field::Spanish => "spanish",
            Field::Street => "street",
            Field::City => "city",
            Field::State => "state",
            Field::Zip => "zip",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Every answer collected so far. `None` means never written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationRecord {
    pub debt_amount: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub spanish: Option<bool>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
}

impl ApplicationRecord {
    /// Read every field from `store`.
    ///
    /// `spanish` is `true` only for the stored string `"true"`.
    #[must_use]
    pub fn load(store: &KeyValueStore) -> Self {
        Self {
            debt_amount: store.get(Field::DebtAmount.key()),
            first_name: store.get(Field::FirstName.key()),
            last_name: store.get(Field::LastName.key()),
            phone: store.get(Field::Phone.key()),
            email: store.get(Field::Email.key()),
            address: store.get(Field::Address.key()),
            spanish: store.get(Field::Spanish.key()).map(|v| v == "true"),
            street: store.get(Field::Street.key()),
            city: store.get(Field::City.key()),
            state: store.get(Field::State.key()),
            zip: store.get(Field::Zip.key()),
        }
    }

    /// String form of `field`, as it is stored.
    #[must_use]
    pub fn value(&self, field: Field) -> Option<String> {
        let text = |v: &Option<String>| v.clone();
        match field {
            Field::DebtAmount => text(&self.debt_amount),
            Field::FirstName => text(&self.first_name),
            Field::LastName => text(&self.last_name),
            Field::Phone => text(&self.phone),
            Field::Email => text(&self.email),
            Field::Address => text(&self.address),
            Field::Spanish => self.spanish.map(|b| b.to_string()),
            Field::Street => text(&self.street),
            Field::City => text(&self.city),
            Field::State => text(&self.state),
            Field::Zip => text(&self.zip),
        }
    }

    /// Overwrite `fields` in `store` with this record's values.
    ///
    /// Fields that are `None` here are left untouched in the store.
    pub fn save_fields(&self, store: &KeyValueStore, fields: &[Field]) {
        for &field in fields {
            if let Some(value) = self.value(field) {
                store.set(field.key(), value);
            }
        }
    }

    /// Debt amount, or [`DEFAULT_DEBT_AMOUNT`] when never entered or
    /// stored empty.
    #[must_use]
    pub fn debt_amount(&self) -> &str {
        self.debt_amount
            .as_deref()
            .filter(|amount| !amount.is_empty())
            .unwrap_or(DEFAULT_DEBT_AMOUNT)
    }

    /// First name, or empty when never entered.
    #[must_use]
    pub fn first_name(&self) -> &str {
        self.first_name.as_deref().unwrap_or("")
    }

    /// Spanish preference, `false` when never entered.
    #[must_use]
    pub fn spanish(&self) -> bool {
        self.spanish.unwrap_or(false)
    }

    /// Remove every application key from `store`. Returns how many were set.
    pub fn clear(store: &KeyValueStore) -> usize {
        Field::ALL
            .iter()
            .filter(|f| store.remove(f.key()).is_some())
            .count()
    }
}
