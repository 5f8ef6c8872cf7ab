use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use sqlx::PgConnection;
use std::str::FromStr;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a dataset timestamp. Empty or malformed cells become `None`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

fn timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}

/// Empty cell is `None`; anything else must parse.
fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// One CSV row that knows how to insert itself.
pub(crate) trait CsvRecord: DeserializeOwned {
    async fn insert(&self, conn: &mut PgConnection) -> Result<(), sqlx::Error>;
}

#[derive(Debug, Deserialize)]
pub struct DistributionCenterRecord {
    pub id: i64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl CsvRecord for DistributionCenterRecord {
    async fn insert(&self, conn: &mut PgConnection) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO distribution_centers (id, name, latitude, longitude)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(self.id)
        .bind(&self.name)
        .bind(self.latitude)
        .bind(self.longitude)
        .execute(conn)
        .await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct ProductRecord {
    pub id: i64,
    pub cost: f64,
    pub category: String,
    pub name: String,
    pub brand: String,
    pub retail_price: f64,
    pub department: String,
    pub sku: String,
    pub distribution_center_id: i64,
}

impl CsvRecord for ProductRecord {
    async fn insert(&self, conn: &mut PgConnection) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO products
                (id, cost, category, name, brand, retail_price,
                 department, sku, distribution_center_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(self.id)
        .bind(self.cost)
        .bind(&self.category)
        .bind(&self.name)
        .bind(&self.brand)
        .bind(self.retail_price)
        .bind(&self.department)
        .bind(&self.sku)
        .bind(self.distribution_center_id)
        .execute(conn)
        .await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(deserialize_with = "empty_as_none")]
    pub age: Option<i32>,
    pub gender: String,
    pub state: String,
    pub street_address: String,
    pub postal_code: String,
    pub city: String,
    pub country: String,
    #[serde(deserialize_with = "empty_as_none")]
    pub latitude: Option<f64>,
    #[serde(deserialize_with = "empty_as_none")]
    pub longitude: Option<f64>,
    pub traffic_source: String,
    #[serde(deserialize_with = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

impl CsvRecord for UserRecord {
    async fn insert(&self, conn: &mut PgConnection) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO users
                (id, first_name, last_name, email, age, gender,
                 state, street_address, postal_code, city, country,
                 latitude, longitude, traffic_source, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(self.id)
        .bind(&self.first_name)
        .bind(&self.last_name)
        .bind(&self.email)
        .bind(self.age)
        .bind(&self.gender)
        .bind(&self.state)
        .bind(&self.street_address)
        .bind(&self.postal_code)
        .bind(&self.city)
        .bind(&self.country)
        .bind(self.latitude)
        .bind(self.longitude)
        .bind(&self.traffic_source)
        .bind(self.created_at)
        .execute(conn)
        .await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct OrderRecord {
    pub order_id: i64,
    pub user_id: i64,
    pub status: String,
    pub gender: String,
    #[serde(deserialize_with = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "timestamp")]
    pub returned_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "timestamp")]
    pub shipped_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "timestamp")]
    pub delivered_at: Option<DateTime<Utc>>,
    pub num_of_item: i32,
}

impl CsvRecord for OrderRecord {
    async fn insert(&self, conn: &mut PgConnection) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO orders
                (order_id, user_id, status, gender, created_at,
                 returned_at, shipped_at, delivered_at, num_of_item)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(self.order_id)
        .bind(self.user_id)
        .bind(&self.status)
        .bind(&self.gender)
        .bind(self.created_at)
        .bind(self.returned_at)
        .bind(self.shipped_at)
        .bind(self.delivered_at)
        .bind(self.num_of_item)
        .execute(conn)
        .await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct InventoryItemRecord {
    pub id: i64,
    pub product_id: i64,
    #[serde(deserialize_with = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "timestamp")]
    pub sold_at: Option<DateTime<Utc>>,
    pub cost: f64,
    pub product_category: String,
    pub product_name: String,
    pub product_brand: String,
    pub product_retail_price: f64,
    pub product_department: String,
    pub product_sku: String,
    pub product_distribution_center_id: i64,
}

impl CsvRecord for InventoryItemRecord {
    async fn insert(&self, conn: &mut PgConnection) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO inventory_items
                (id, product_id, created_at, sold_at, cost,
                 product_category, product_name, product_brand,
                 product_retail_price, product_department,
                 product_sku, product_distribution_center_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(self.id)
        .bind(self.product_id)
        .bind(self.created_at)
        .bind(self.sold_at)
        .bind(self.cost)
        .bind(&self.product_category)
        .bind(&self.product_name)
        .bind(&self.product_brand)
        .bind(self.product_retail_price)
        .bind(&self.product_department)
        .bind(&self.product_sku)
        .bind(self.product_distribution_center_id)
        .execute(conn)
        .await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct OrderItemRecord {
    pub id: i64,
    pub order_id: i64,
    pub user_id: i64,
    pub product_id: i64,
    pub inventory_item_id: i64,
    pub status: String,
    #[serde(deserialize_with = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "timestamp")]
    pub shipped_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "timestamp")]
    pub delivered_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "timestamp")]
    pub returned_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub sale_price: Option<f64>,
}

impl CsvRecord for OrderItemRecord {
    async fn insert(&self, conn: &mut PgConnection) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO order_items
                (id, order_id, user_id, product_id, inventory_item_id,
                 status, price, created_at, shipped_at, delivered_at, returned_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(self.id)
        .bind(self.order_id)
        .bind(self.user_id)
        .bind(self.product_id)
        .bind(self.inventory_item_id)
        .bind(&self.status)
        .bind(self.sale_price)
        .bind(self.created_at)
        .bind(self.shipped_at)
        .bind(self.delivered_at)
        .bind(self.returned_at)
        .execute(conn)
        .await?;
        Ok(())
    }
}
