use std::{collections::BTreeMap, fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;
pub use vpg_common::Amount;

pub type VendorId = i64;
pub type UserId = i64;

#[derive(Debug, Clone, Error)]
#[error("Conversion error: {0}")]
pub struct ConversionError(String);

//--------------------------------------    PaymentMethod     ---------------------------------------------------------
/// The five manual payment channels a vendor can accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Bkash,
    Nagad,
    Rocket,
    Upay,
    Bank,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 5] =
        [PaymentMethod::Bkash, PaymentMethod::Nagad, PaymentMethod::Rocket, PaymentMethod::Upay, PaymentMethod::Bank];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Bkash => "bkash",
            PaymentMethod::Nagad => "nagad",
            PaymentMethod::Rocket => "rocket",
            PaymentMethod::Upay => "upay",
            PaymentMethod::Bank => "bank",
        }
    }

    pub fn is_wallet(&self) -> bool {
        !matches!(self, PaymentMethod::Bank)
    }
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bkash" => Ok(Self::Bkash),
            "nagad" => Ok(Self::Nagad),
            "rocket" => Ok(Self::Rocket),
            "upay" => Ok(Self::Upay),
            "bank" => Ok(Self::Bank),
            s => Err(ConversionError(format!("Unknown payment method: {s}"))),
        }
    }
}

//--------------------------------------  WalletAccountType   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletAccountType {
    #[default]
    Personal,
    Agent,
    Merchant,
}

impl Display for WalletAccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WalletAccountType::Personal => write!(f, "personal"),
            WalletAccountType::Agent => write!(f, "agent"),
            WalletAccountType::Merchant => write!(f, "merchant"),
        }
    }
}

impl FromStr for WalletAccountType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "personal" => Ok(Self::Personal),
            "agent" => Ok(Self::Agent),
            "merchant" => Ok(Self::Merchant),
            s => Err(ConversionError(format!("Unknown wallet account type: {s}"))),
        }
    }
}

//--------------------------------------     BankDetails      ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankDetails {
    pub bank_name: String,
    pub account_holder_name: String,
    pub branch: String,
    pub routing_number: String,
}

//--------------------------------------      MethodExtra     ---------------------------------------------------------
/// Method-specific settings that accompany a vendor's account number. Stored as JSON alongside the setting row.
///
/// The variant must agree with the method it is stored against: wallets may only carry `Wallet` (or `None`), and
/// bank transfers may only carry `Bank` (or `None`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MethodExtra {
    #[default]
    None,
    Wallet {
        account_type: WalletAccountType,
    },
    Bank(BankDetails),
}

impl MethodExtra {
    pub fn is_valid_for(&self, method: PaymentMethod) -> bool {
        match self {
            MethodExtra::None => true,
            MethodExtra::Wallet { .. } => method.is_wallet(),
            MethodExtra::Bank(_) => method == PaymentMethod::Bank,
        }
    }

    /// Returns the named extra fields with their values, substituting defaults for fields that are absent.
    pub fn fields_for(&self, method: PaymentMethod) -> Vec<(&'static str, String)> {
        match (method, self) {
            (PaymentMethod::Bank, MethodExtra::Bank(b)) => vec![
                ("bank_name", b.bank_name.clone()),
                ("account_holder_name", b.account_holder_name.clone()),
                ("branch", b.branch.clone()),
                ("routing_number", b.routing_number.clone()),
            ],
            (PaymentMethod::Bank, _) => vec![
                ("bank_name", String::new()),
                ("account_holder_name", String::new()),
                ("branch", String::new()),
                ("routing_number", String::new()),
            ],
            (PaymentMethod::Bkash, MethodExtra::Wallet { account_type }) => {
                vec![("account_type", account_type.to_string())]
            },
            (PaymentMethod::Bkash, _) => vec![("account_type", WalletAccountType::default().to_string())],
            (_, _) => vec![],
        }
    }

    pub fn bank_details(&self) -> Option<&BankDetails> {
        match self {
            MethodExtra::Bank(b) => Some(b),
            _ => None,
        }
    }
}

//--------------------------------------  VendorPaymentSetting ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorPaymentSetting {
    pub id: i64,
    pub vendor_id: VendorId,
    pub method: PaymentMethod,
    pub account_number: String,
    pub enabled: bool,
    pub extra: MethodExtra,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVendorSetting {
    pub vendor_id: VendorId,
    pub method: PaymentMethod,
    pub account_number: String,
    pub enabled: bool,
    pub extra: MethodExtra,
}

impl NewVendorSetting {
    pub fn new<S: Into<String>>(vendor_id: VendorId, method: PaymentMethod, account_number: S, enabled: bool) -> Self {
        Self { vendor_id, method, account_number: account_number.into(), enabled, extra: MethodExtra::None }
    }

    pub fn with_extra(mut self, extra: MethodExtra) -> Self {
        self.extra = extra;
        self
    }
}

//--------------------------------------  TransactionStatus   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// The buyer has submitted a transaction reference that the vendor has not yet checked.
    Pending,
    /// The vendor confirmed receipt of the funds.
    Verified,
    /// The vendor could not find the funds.
    Rejected,
}

impl Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionStatus::Pending => write!(f, "pending"),
            TransactionStatus::Verified => write!(f, "verified"),
            TransactionStatus::Rejected => write!(f, "rejected"),
        }
    }
}

impl FromStr for TransactionStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "verified" => Ok(Self::Verified),
            "rejected" => Ok(Self::Rejected),
            s => Err(ConversionError(format!("Invalid transaction status: {s}"))),
        }
    }
}

//-------------------------------------- VerificationDecision ---------------------------------------------------------
/// The two outcomes a vendor may choose when checking a buyer's payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationDecision {
    Verified,
    Rejected,
}

impl VerificationDecision {
    pub fn transaction_status(&self) -> TransactionStatus {
        match self {
            VerificationDecision::Verified => TransactionStatus::Verified,
            VerificationDecision::Rejected => TransactionStatus::Rejected,
        }
    }

    pub fn order_status(&self) -> OrderStatusType {
        match self {
            VerificationDecision::Verified => OrderStatusType::Processing,
            VerificationDecision::Rejected => OrderStatusType::Failed,
        }
    }
}

impl Display for VerificationDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.transaction_status().fmt(f)
    }
}

impl FromStr for VerificationDecision {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "verified" => Ok(Self::Verified),
            "rejected" => Ok(Self::Rejected),
            s => Err(ConversionError(format!("Invalid verification status: {s}"))),
        }
    }
}

//--------------------------------------     Transaction      ---------------------------------------------------------
/// A buyer's attestation that funds were sent. One row is appended per submission.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub order_id: OrderId,
    pub vendor_id: VendorId,
    pub payment_method: PaymentMethod,
    /// The reference supplied by the buyer, as issued by the wallet or bank.
    pub transaction_id: String,
    pub amount: Amount,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub order_id: OrderId,
    pub vendor_id: VendorId,
    pub payment_method: PaymentMethod,
    pub transaction_id: String,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentStat {
    pub payment_method: PaymentMethod,
    pub count: i64,
    pub total: Amount,
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatusType {
    /// Created, but no payment has been attested yet.
    Pending,
    /// The buyer has attested to a payment which awaits vendor verification.
    OnHold,
    /// The vendor has verified the payment.
    Processing,
    Completed,
    Cancelled,
    /// The vendor rejected the payment.
    Failed,
    Refunded,
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatusType::Pending => "pending",
            OrderStatusType::OnHold => "on-hold",
            OrderStatusType::Processing => "processing",
            OrderStatusType::Completed => "completed",
            OrderStatusType::Cancelled => "cancelled",
            OrderStatusType::Failed => "failed",
            OrderStatusType::Refunded => "refunded",
        };
        f.write_str(s)
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "on-hold" => Ok(Self::OnHold),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            "failed" => Ok(Self::Failed),
            "refunded" => Ok(Self::Refunded),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------        OrderId        ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub i64);

impl FromStr for OrderId {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(Self).map_err(|_| ConversionError(format!("Invalid order id: {s}")))
    }
}

impl From<i64> for OrderId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn value(&self) -> i64 {
        self.0
    }
}

//--------------------------------------       OrderMeta       ---------------------------------------------------------
/// Key/value metadata attached to an order. Empty values are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderMeta(BTreeMap<String, String>);

impl OrderMeta {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str).filter(|v| !v.is_empty())
    }

    pub fn insert<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.0.insert(key.into(), value.into());
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for OrderMeta {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

//--------------------------------------        Order       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// The buyer. `None` for guest checkouts.
    pub customer_id: Option<UserId>,
    pub status: OrderStatusType,
    pub total: Amount,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
    pub meta: OrderMeta,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub product_id: i64,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderNote {
    pub id: i64,
    pub order_id: OrderId,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------        NewOrder       ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_id: Option<UserId>,
    pub total: Amount,
    pub currency: String,
    /// `(product_id, quantity)` pairs
    pub items: Vec<(i64, i64)>,
    pub meta: Vec<(String, String)>,
}

impl NewOrder {
    pub fn new(customer_id: Option<UserId>, total: Amount) -> Self {
        Self {
            customer_id,
            total,
            currency: vpg_common::DEFAULT_CURRENCY_CODE.to_string(),
            items: vec![],
            meta: vec![],
        }
    }

    pub fn with_item(mut self, product_id: i64, quantity: i64) -> Self {
        self.items.push((product_id, quantity));
        self
    }

    pub fn with_meta<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.meta.push((key.into(), value.into()));
        self
    }
}

//--------------------------------------       Product        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub vendor_id: VendorId,
    pub name: String,
    pub stock: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub vendor_id: VendorId,
    pub name: String,
    /// `None` means stock is not tracked for this product.
    pub stock: Option<i64>,
}

//--------------------------------------    VendorProfile     ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorProfile {
    pub id: VendorId,
    pub display_name: String,
    pub email: String,
    pub meta: BTreeMap<String, String>,
}

//--------------------------------------       OrderUpdate     ---------------------------------------------------------
/// A set of changes to apply to a single order in one atomic step.
#[derive(Debug, Clone, Default)]
pub struct OrderUpdate {
    pub set_meta: Vec<(String, String)>,
    pub delete_meta: Vec<String>,
    pub new_status: Option<OrderStatusType>,
    /// Appended to the order's notes log, whether or not the status changes.
    pub note: Option<String>,
    pub reduce_stock: bool,
    pub empty_cart: bool,
}

impl OrderUpdate {
    pub fn set_meta<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.set_meta.push((key.into(), value.into()));
        self
    }

    pub fn delete_meta<K: Into<String>>(mut self, key: K) -> Self {
        self.delete_meta.push(key.into());
        self
    }

    pub fn with_status(mut self, status: OrderStatusType, note: String) -> Self {
        self.new_status = Some(status);
        self.note = Some(note);
        self
    }

    pub fn reduce_stock(mut self) -> Self {
        self.reduce_stock = true;
        self
    }

    pub fn empty_cart(mut self) -> Self {
        self.empty_cart = true;
        self
    }
}

//--------------------------------------         Role          ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Any authenticated user. Buyers hold only this role.
    User,
    /// May configure payment settings and verify payments for their own orders.
    Vendor,
    /// May verify any vendor's orders.
    ManageStore,
    SuperAdmin,
}

impl Role {
    pub fn is_elevated(&self) -> bool {
        matches!(self, Role::ManageStore | Role::SuperAdmin)
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Vendor => write!(f, "vendor"),
            Role::ManageStore => write!(f, "manage_store"),
            Role::SuperAdmin => write!(f, "super_admin"),
        }
    }
}

impl FromStr for Role {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "user" => Ok(Self::User),
            "vendor" => Ok(Self::Vendor),
            "manage_store" => Ok(Self::ManageStore),
            "super_admin" => Ok(Self::SuperAdmin),
            s => Err(ConversionError(format!("Invalid role: {s}"))),
        }
    }
}

pub type Roles = Vec<Role>;

//--------------------------------------        Actor          ---------------------------------------------------------
/// The principal on whose behalf an operation runs. Guests have no user id and no roles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: Option<UserId>,
    pub roles: Roles,
}

impl Actor {
    pub fn guest() -> Self {
        Self::default()
    }

    pub fn user(user_id: UserId, roles: Roles) -> Self {
        Self { user_id: Some(user_id), roles }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    pub fn is_elevated(&self) -> bool {
        self.roles.iter().any(Role::is_elevated)
    }

    /// Buyers may act on their own orders. A guest may act on a guest order.
    pub fn owns_order(&self, order: &Order) -> bool {
        self.user_id == order.customer_id
    }

    pub fn is_vendor(&self, vendor_id: VendorId) -> bool {
        self.user_id == Some(vendor_id)
    }
}
