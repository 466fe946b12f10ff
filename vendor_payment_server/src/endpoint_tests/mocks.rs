use mockall::mock;
use vendor_payment_engine::{
    db_types::{
        NewTransaction,
        NewVendorSetting,
        Order,
        OrderId,
        OrderUpdate,
        PaymentMethod,
        PaymentStat,
        Transaction,
        TransactionStatus,
        VendorId,
        VendorPaymentSetting,
        VendorProfile,
    },
    OrderManagement,
    PaymentGatewayDatabase,
    PurgeSummary,
    StorageError,
    TransactionManagement,
    VendorDirectory,
    VendorSettingsManagement,
};

mock! {
    pub Backend {}
    impl Clone for Backend {
        fn clone(&self) -> Self;
    }
    impl PaymentGatewayDatabase for Backend {
        fn url(&self) -> &str;
        async fn update_order(&self, order_id: OrderId, update: OrderUpdate) -> Result<(), StorageError>;
        async fn update_order_with_transaction(&self, update: OrderUpdate, transaction: NewTransaction) -> Result<Transaction, StorageError>;
        async fn update_order_and_settle_transaction(&self, order_id: OrderId, update: OrderUpdate, status: TransactionStatus) -> Result<Option<Transaction>, StorageError>;
        async fn purge_all(&self, meta_prefixes: &[String]) -> Result<PurgeSummary, StorageError>;
    }
    impl OrderManagement for Backend {
        async fn fetch_order(&self, order_id: OrderId) -> Result<Option<Order>, StorageError>;
        async fn fetch_product_owner(&self, product_id: i64) -> Result<Option<VendorId>, StorageError>;
    }
    impl TransactionManagement for Backend {
        async fn fetch_transactions_for_order(&self, order_id: OrderId) -> Result<Vec<Transaction>, StorageError>;
    }
    impl VendorSettingsManagement for Backend {
        async fn upsert_vendor_setting(&self, setting: NewVendorSetting) -> Result<VendorPaymentSetting, StorageError>;
        async fn fetch_vendor_settings(&self, vendor_id: VendorId) -> Result<Vec<VendorPaymentSetting>, StorageError>;
        async fn fetch_vendor_setting(&self, vendor_id: VendorId, method: PaymentMethod) -> Result<Option<VendorPaymentSetting>, StorageError>;
        async fn fetch_payment_stats(&self, vendor_id: VendorId) -> Result<Vec<PaymentStat>, StorageError>;
    }
    impl VendorDirectory for Backend {
        async fn fetch_vendor_profile(&self, vendor_id: VendorId) -> Result<Option<VendorProfile>, StorageError>;
    }
}

pub type Setup = fn(&mut MockBackend);

/// A mock backend whose clones are configured by the same `setup`. The APIs each hold their own clone, so expectations
/// are set on every copy.
pub fn backend(setup: Setup) -> MockBackend {
    let mut db = MockBackend::new();
    setup(&mut db);
    db.expect_clone().returning(move || backend(setup));
    db.expect_url().return_const("mock://vendor-payments".to_string());
    db
}
