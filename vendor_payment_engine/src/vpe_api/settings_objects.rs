use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db_types::{BankDetails, MethodExtra, PaymentMethod, VendorId, VendorPaymentSetting, WalletAccountType};

/// The settings-form field name for an extra. These are the names the vendor dashboard posts, e.g. `bkash_type` and
/// `bank_routing`.
pub fn form_field_name(method: PaymentMethod, field: &str) -> String {
    match (method, field) {
        (PaymentMethod::Bkash, "account_type") => "bkash_type".to_string(),
        (PaymentMethod::Bank, "bank_name") => "bank_name".to_string(),
        (PaymentMethod::Bank, "account_holder_name") => "bank_account_name".to_string(),
        (PaymentMethod::Bank, "routing_number") => "bank_routing".to_string(),
        (m, f) => format!("{m}_{f}"),
    }
}

/// The CSRF action that protects the vendor's settings form.
pub fn settings_action(vendor_id: VendorId) -> String {
    format!("vpg_settings_{vendor_id}")
}

//--------------------------------------     FlatSettings     ---------------------------------------------------------
/// Every method's settings for one vendor, flattened into the key/value shape used by the vendor dashboard.
///
/// Keys are `<method>_enabled` (bool), `<method>_account` and the extra fields named by [`form_field_name`]. Every key
/// is always present; methods without a stored row carry the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlatSettings(BTreeMap<String, Value>);

impl FlatSettings {
    /// All five methods disabled, with empty accounts and default extras.
    pub fn defaults() -> Self {
        let mut result = Self(BTreeMap::new());
        for method in PaymentMethod::ALL {
            result.apply(method, false, "", &MethodExtra::None);
        }
        result
    }

    pub(crate) fn merge_row(&mut self, row: &VendorPaymentSetting) {
        self.apply(row.method, row.enabled, &row.account_number, &row.extra);
    }

    fn apply(&mut self, method: PaymentMethod, enabled: bool, account: &str, extra: &MethodExtra) {
        self.0.insert(format!("{method}_enabled"), Value::Bool(enabled));
        self.0.insert(format!("{method}_account"), Value::String(account.to_string()));
        if method == PaymentMethod::Bank {
            self.0.insert("bank_account_number".to_string(), Value::String(account.to_string()));
        }
        for (field, value) in extra.fields_for(method) {
            self.0.insert(form_field_name(method, field), Value::String(value));
        }
    }

    pub fn is_enabled(&self, method: PaymentMethod) -> bool {
        self.0.get(&format!("{method}_enabled")).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn account(&self, method: PaymentMethod) -> &str {
        self.get_str(&format!("{method}_account")).unwrap_or_default()
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

//--------------------------------------     GatewayView      ---------------------------------------------------------
/// The settings view consumed by the checkout gateways: `<method>_enabled` is `"yes"` or `"no"`, `<method>_account`
/// holds the account number, and stored extras appear as `<method>_<field>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GatewayView(BTreeMap<String, String>);

impl GatewayView {
    pub fn all_disabled() -> Self {
        let map = PaymentMethod::ALL.iter().map(|m| (format!("{m}_enabled"), "no".to_string())).collect();
        Self(map)
    }

    pub(crate) fn from_rows(rows: &[VendorPaymentSetting]) -> Self {
        let mut view = Self::all_disabled();
        for row in rows {
            let m = row.method;
            let enabled = if row.enabled { "yes" } else { "no" };
            view.0.insert(format!("{m}_enabled"), enabled.to_string());
            view.0.insert(format!("{m}_account"), row.account_number.clone());
            if row.extra != MethodExtra::None {
                for (field, value) in row.extra.fields_for(m) {
                    view.0.insert(format!("{m}_{field}"), value);
                }
            }
        }
        view
    }

    pub fn is_enabled(&self, method: PaymentMethod) -> bool {
        self.get(&format!("{method}_enabled")) == Some("yes")
    }

    /// The account number for the method, if one is stored and non-blank.
    pub fn account(&self, method: PaymentMethod) -> Option<&str> {
        self.get(&format!("{method}_account")).map(str::trim).filter(|s| !s.is_empty())
    }

    /// A method is offered at checkout only when it is enabled *and* has an account number.
    pub fn is_available(&self, method: PaymentMethod) -> bool {
        self.is_enabled(method) && self.account(method).is_some()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }
}

//--------------------------------------     SettingsForm     ---------------------------------------------------------
/// A checkbox value. HTML forms send a string when the box is ticked; JSON clients may send a boolean.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormFlag {
    Bool(bool),
    Text(String),
}

impl FormFlag {
    pub fn is_set(&self) -> bool {
        match self {
            FormFlag::Bool(b) => *b,
            FormFlag::Text(s) => vpg_common::helpers::parse_boolean_flag(Some(s), true),
        }
    }
}

/// One submission of the vendor dashboard's payment settings form. An absent checkbox means the method is disabled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsForm {
    pub bkash_enabled: Option<FormFlag>,
    pub bkash_account: String,
    pub bkash_type: String,
    pub nagad_enabled: Option<FormFlag>,
    pub nagad_account: String,
    pub rocket_enabled: Option<FormFlag>,
    pub rocket_account: String,
    pub upay_enabled: Option<FormFlag>,
    pub upay_account: String,
    pub bank_enabled: Option<FormFlag>,
    pub bank_account_number: String,
    pub bank_name: String,
    pub bank_account_name: String,
    pub bank_branch: String,
    pub bank_routing: String,
}

impl SettingsForm {
    fn flag(flag: &Option<FormFlag>) -> bool {
        flag.as_ref().map(FormFlag::is_set).unwrap_or(false)
    }

    /// Splits the form into `(method, enabled, account_number, extra)` tuples, one per method.
    pub fn entries(&self) -> Vec<(PaymentMethod, bool, String, MethodExtra)> {
        let account_type = self.bkash_type.parse::<WalletAccountType>().unwrap_or_default();
        let bank = BankDetails {
            bank_name: self.bank_name.trim().to_string(),
            account_holder_name: self.bank_account_name.trim().to_string(),
            branch: self.bank_branch.trim().to_string(),
            routing_number: self.bank_routing.trim().to_string(),
        };
        vec![
            (
                PaymentMethod::Bkash,
                Self::flag(&self.bkash_enabled),
                self.bkash_account.trim().to_string(),
                MethodExtra::Wallet { account_type },
            ),
            (PaymentMethod::Nagad, Self::flag(&self.nagad_enabled), self.nagad_account.trim().to_string(), MethodExtra::None),
            (
                PaymentMethod::Rocket,
                Self::flag(&self.rocket_enabled),
                self.rocket_account.trim().to_string(),
                MethodExtra::None,
            ),
            (PaymentMethod::Upay, Self::flag(&self.upay_enabled), self.upay_account.trim().to_string(), MethodExtra::None),
            (
                PaymentMethod::Bank,
                Self::flag(&self.bank_enabled),
                self.bank_account_number.trim().to_string(),
                MethodExtra::Bank(bank),
            ),
        ]
    }
}

//--------------------------------------   VendorInfo etc.    ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorInfo {
    pub id: VendorId,
    pub name: String,
    pub email: String,
}

impl VendorInfo {
    pub fn unknown(id: VendorId) -> Self {
        Self { id, name: "Unknown Vendor".to_string(), email: String::new() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelledValue {
    pub label: String,
    pub value: String,
}

impl LabelledValue {
    pub fn new<S: Into<String>>(label: &str, value: S) -> Self {
        Self { label: label.to_string(), value: value.into() }
    }
}
