//! Waste-management endpoints: waste records, inventory, purchases,
//! products and master data (branch scope).

use std::sync::Arc;

use serde::Deserialize;

use crate::client::ApiClient;
use crate::error::Result;
use crate::models::{
    CreateProductRequest, CreatePurchaseRequest, CreateWasteRecordRequest, InventoryItem,
    MasterItem, PageQuery, Pagination, Product, Purchase, Supplier, WasteAnalytics, WasteRecord,
};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WasteRecordsPage {
    pub waste_records: Vec<WasteRecord>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Deserialize)]
struct WasteRecordData {
    #[serde(rename = "wasteRecord")]
    waste_record: WasteRecord,
}

#[derive(Debug, Clone, Deserialize)]
struct ProductsData {
    products: Vec<Product>,
}

#[derive(Debug, Clone, Deserialize)]
struct ProductData {
    product: Product,
}

#[derive(Debug, Clone, Deserialize)]
struct InventoryData {
    items: Vec<InventoryItem>,
}

#[derive(Debug, Clone, Deserialize)]
struct PurchaseData {
    purchase: Purchase,
}

#[derive(Debug, Clone, Deserialize)]
struct SuppliersData {
    suppliers: Vec<Supplier>,
}

#[derive(Debug, Clone, Deserialize)]
struct MasterData {
    items: Vec<MasterItem>,
}

#[derive(Clone)]
pub struct WasteManagementApi {
    client: Arc<ApiClient>,
}

impl WasteManagementApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    // ---- Waste records ----------------------------------------------------

    pub async fn get_waste_records(&self, query: PageQuery) -> Result<WasteRecordsPage> {
        self.client
            .get(&format!(
                "/waste-management/waste-records{}",
                query.to_query_string()
            ))
            .await
    }

    pub async fn create_waste_record(&self, req: &CreateWasteRecordRequest) -> Result<WasteRecord> {
        let data: WasteRecordData = self
            .client
            .post("/waste-management/waste-records", req)
            .await?;
        Ok(data.waste_record)
    }

    pub async fn get_waste_analytics(&self) -> Result<WasteAnalytics> {
        self.client.get("/waste-management/analytics").await
    }

    // ---- Inventory --------------------------------------------------------

    pub async fn get_inventory_status(&self) -> Result<Vec<InventoryItem>> {
        let data: InventoryData = self.client.get("/waste-management/inventory/status").await?;
        Ok(data.items)
    }

    /// Items whose expiry falls inside the backend's warning window.
    pub async fn get_expiring_items(&self) -> Result<Vec<InventoryItem>> {
        let data: InventoryData = self
            .client
            .get("/waste-management/inventory/expiring")
            .await?;
        Ok(data.items)
    }

    pub async fn create_inventory_purchase(&self, req: &CreatePurchaseRequest) -> Result<Purchase> {
        let data: PurchaseData = self
            .client
            .post("/waste-management/inventory/purchases", req)
            .await?;
        Ok(data.purchase)
    }

    // ---- Products ---------------------------------------------------------

    pub async fn get_products(&self) -> Result<Vec<Product>> {
        let data: ProductsData = self.client.get("/waste-management/products").await?;
        Ok(data.products)
    }

    pub async fn create_product(&self, req: &CreateProductRequest) -> Result<Product> {
        let data: ProductData = self.client.post("/waste-management/products", req).await?;
        Ok(data.product)
    }

    // ---- Master data ------------------------------------------------------

    pub async fn get_categories(&self) -> Result<Vec<MasterItem>> {
        let data: MasterData = self.client.get("/waste-management/categories").await?;
        Ok(data.items)
    }

    pub async fn get_waste_categories(&self) -> Result<Vec<MasterItem>> {
        let data: MasterData = self.client.get("/waste-management/waste-categories").await?;
        Ok(data.items)
    }

    pub async fn get_units(&self) -> Result<Vec<MasterItem>> {
        let data: MasterData = self.client.get("/waste-management/units").await?;
        Ok(data.items)
    }

    pub async fn get_suppliers(&self) -> Result<Vec<Supplier>> {
        let data: SuppliersData = self.client.get("/waste-management/suppliers").await?;
        Ok(data.suppliers)
    }
}
