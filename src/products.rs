//! Product: the catalog entity and its bindings into the generic CRUD layer.

use crate::config::{ColumnDef, ColumnType, TableDef};
use crate::resource::Resource;
use crate::service::{FieldRules, RequestSchema};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

const PRICE: ColumnType = ColumnType::Decimal { precision: 10, scale: 2 };
const STOCK_QUANTITY: ColumnType = ColumnType::Integer;

static COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", ColumnType::BigSerial).managed(),
    ColumnDef::new("name", ColumnType::Varchar(255)),
    ColumnDef::new("description", ColumnType::Text),
    ColumnDef::new("price", PRICE).check("price >= 0"),
    ColumnDef::new("stock_quantity", STOCK_QUANTITY)
        .default("0")
        .check("stock_quantity >= 0"),
    ColumnDef::new("sku", ColumnType::Varchar(255)).nullable(),
    ColumnDef::new("image", ColumnType::Text).nullable(),
    ColumnDef::new("created_at", ColumnType::Timestamp).default("NOW()").managed(),
    ColumnDef::new("updated_at", ColumnType::Timestamp).default("NOW()").managed(),
];

static TABLE: TableDef = TableDef {
    name: "products",
    primary_key: "id",
    columns: COLUMNS,
    unique: &["sku"],
    filterable: &["name", "price", "stock_quantity", "sku"],
    searchable: &["name", "description"],
    sortable: &["id", "name", "price", "stock_quantity", "created_at", "updated_at"],
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock_quantity: i32,
    pub sku: Option<String>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated create payload.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub stock_quantity: i32,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// Validated update payload. Absent fields are left alone; for `sku` and `image`,
/// `Some(None)` clears the column.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_quantity: Option<i32>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub sku: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub image: Option<Option<String>>,
}

/// A key that is present (even as null) deserializes to `Some`.
fn present<'de, D, T>(d: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(d).map(Some)
}

/// Read representation: price always carries two fractional digits.
#[derive(Clone, Debug, Serialize)]
pub struct ProductResource {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock_quantity: i32,
    pub sku: Option<String>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductResource {
    fn from(p: Product) -> Self {
        let mut price = p.price;
        price.rescale(2);
        ProductResource {
            id: p.id,
            name: p.name,
            description: p.description,
            price,
            stock_quantity: p.stock_quantity,
            sku: p.sku,
            image: p.image,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

fn product_rules(name: &'static str) -> RequestSchema {
    RequestSchema::new(name)
        .field(FieldRules::new("name").required().string().max_length(255))
        .field(FieldRules::new("description").required().string())
        .field(FieldRules::new("price").required().numeric().min(0).within(PRICE))
        .field(FieldRules::new("stock_quantity").required().integer().min(0).within(STOCK_QUANTITY))
        .field(FieldRules::new("sku").nullable().string().max_length(255).unique("sku"))
        .field(FieldRules::new("image").nullable().url())
        .message("name.required", "The product name is required.")
        .message("description.required", "The description is required.")
        .message("price.required", "The price of the product is required.")
        .message("stock_quantity.required", "The stock quantity is required.")
        .message("sku.unique", "The SKU must be unique.")
        .message("image.url", "The image must be a valid URL.")
}

impl Resource for Product {
    type Model = Product;
    type CreateInput = ProductInput;
    type UpdateInput = ProductUpdate;
    type Representation = ProductResource;

    const NAME: &'static str = "product";
    const PLURAL: &'static str = "products";

    fn table() -> &'static TableDef {
        &TABLE
    }

    fn store_schema() -> RequestSchema {
        product_rules("StoreProductRequest")
    }

    /// Same rules as create; the controller passes the route id so `sku` may keep its value.
    fn update_schema() -> RequestSchema {
        product_rules("UpdateProductRequest")
    }

    fn id(model: &Product) -> i64 {
        model.id
    }
}
