//! Wire types for the storefront REST API.
//!
//! Everything here mirrors the server's JSON contract: camelCase field
//! names, prices as JSON numbers, timestamps as ISO-8601 local date-times
//! without a timezone.

use cartwheel_core::{
    CartEntryId, Money, OrderId, OrderItemId, OrderStatus, ProductId, ReviewId, UserId,
    WishlistEntryId,
};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ============================================================================
// Catalog
// ============================================================================

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Product ID.
    pub id: ProductId,
    /// Display title.
    pub title: String,
    /// Unit price.
    pub price: Money,
    /// Long-form description. May be empty.
    #[serde(default)]
    pub description: String,
    /// Category name (e.g. `"electronics"`).
    pub category: String,
    /// Image URL, if the product has one.
    #[serde(default)]
    pub image: Option<String>,
    /// Average review rating (0.0 - 5.0), if any reviews exist.
    #[serde(default)]
    pub rating_rate: Option<f64>,
    /// Number of reviews behind `rating_rate`.
    #[serde(default)]
    pub rating_count: Option<u32>,
}

impl Product {
    /// Fold the two optional rating fields into one value.
    ///
    /// Returns `None` when the product has no rating at all. Callers that
    /// sort by rating should treat `None` as an average of 0.
    #[must_use]
    pub fn rating(&self) -> Option<Rating> {
        self.rating_rate.map(|average| Rating {
            average,
            count: self.rating_count.unwrap_or(0),
        })
    }
}

/// Aggregated review rating for a product.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rating {
    /// Average star rating (0.0 - 5.0).
    pub average: f64,
    /// Number of reviews.
    pub count: u32,
}

/// A customer review of a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    /// Review ID.
    pub id: ReviewId,
    /// Product the review is for.
    pub product_id: ProductId,
    /// Star rating, 1-5.
    pub rating: u8,
    /// Free-form review text.
    #[serde(default)]
    pub comment: Option<String>,
    /// Display name of the reviewer.
    #[serde(default)]
    pub user_name: Option<String>,
    /// When the review was written.
    pub created_at: NaiveDateTime,
}

// ============================================================================
// Cart
// ============================================================================

/// One server-side cart entry. The server embeds the full product so a
/// cart fetch never needs follow-up lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartEntry {
    /// Cart entry ID (not the product ID).
    pub id: CartEntryId,
    /// The product in the cart.
    pub product: Product,
    /// Quantity, always >= 1. The server deletes entries instead of
    /// storing a zero quantity.
    pub quantity: u32,
    /// When the entry was first added.
    pub added_at: NaiveDateTime,
    /// When the quantity was last changed.
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
}

/// Response body of every cart mutation endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartMutation {
    /// Human-readable confirmation (e.g. `"Product added to cart"`).
    pub message: String,
    /// Total item count across the cart after the mutation.
    pub cart_item_count: u32,
}

/// Response body of `GET /cart/count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartCount {
    /// Total item count (sum of quantities). 0 for anonymous callers.
    pub cart_item_count: u32,
}

/// Response body of `GET /promo-codes/validate/{code}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoValidation {
    /// Whether the code can be applied right now.
    pub valid: bool,
    /// Server explanation, e.g. `"Promo code has expired"`.
    #[serde(default)]
    pub message: Option<String>,
    /// Percentage discount granted by the code (e.g. 10 for 10%).
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub discount_percentage: Option<Decimal>,
}

// ============================================================================
// Orders
// ============================================================================

/// Payload for `POST /orders`.
///
/// Totals are rounded to cents before submission; the server stores them
/// verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    /// Grand total (subtotal minus discount), rounded to cents.
    pub total_amount: Money,
    /// Discount applied, rounded to cents. Zero when no promo.
    pub discount_amount: Money,
    /// Promo code that produced the discount, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promo_code: Option<String>,
    /// Line items being ordered.
    pub items: Vec<OrderItemRequest>,
    /// Recipient name.
    pub full_name: String,
    /// Contact email.
    pub email: String,
    /// Contact phone number.
    pub phone: String,
    /// Street address.
    pub street: String,
    /// City.
    pub city: String,
    /// State or province.
    pub state: String,
    /// Postal code.
    pub zip_code: String,
    /// Country.
    pub country: String,
}

/// One line item in an [`OrderRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    /// Product being ordered.
    pub product_id: ProductId,
    /// Quantity, >= 1.
    pub quantity: u32,
    /// Unit price at the time of ordering.
    pub price: Money,
}

/// An order as returned by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Order ID.
    pub id: OrderId,
    /// Grand total charged.
    pub total_amount: Money,
    /// Discount that was applied.
    #[serde(default)]
    pub discount_amount: Money,
    /// Promo code used, if any.
    #[serde(default)]
    pub promo_code: Option<String>,
    /// Current order status.
    pub status: OrderStatus,
    /// When the order was placed.
    pub order_date: NaiveDateTime,
    /// Estimated or actual delivery date.
    #[serde(default)]
    pub delivery_date: Option<NaiveDateTime>,
    /// Recipient name.
    pub full_name: String,
    /// Contact email.
    pub email: String,
    /// Contact phone number.
    pub phone: String,
    /// Street address.
    pub street: String,
    /// City.
    pub city: String,
    /// State or province.
    pub state: String,
    /// Postal code.
    pub zip_code: String,
    /// Country.
    pub country: String,
    /// Line items. Product title and image are denormalized onto each
    /// line so order history survives product deletion.
    #[serde(default)]
    pub order_items: Vec<OrderItem>,
}

/// One line item of a placed [`Order`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    /// Order item ID.
    pub id: OrderItemId,
    /// Quantity ordered.
    pub quantity: u32,
    /// Unit price at the time of ordering.
    pub price: Money,
    /// Product title snapshot.
    pub product_title: String,
    /// Product image snapshot, if the product had one.
    #[serde(default)]
    pub product_image: Option<String>,
}

// ============================================================================
// Wishlist
// ============================================================================

/// One wishlist entry with its embedded product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistEntry {
    /// Wishlist entry ID.
    pub id: WishlistEntryId,
    /// The wished-for product.
    pub product: Product,
    /// When the product was added.
    pub added_at: NaiveDateTime,
}

/// Response of wishlist membership checks and toggles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistStatus {
    /// Whether the product is in the wishlist after the call.
    pub in_wishlist: bool,
    /// Confirmation message on toggles (`"Added to wishlist"` /
    /// `"Removed from wishlist"`). Absent on plain checks.
    #[serde(default)]
    pub message: Option<String>,
}

// ============================================================================
// Account
// ============================================================================

/// The signed-in account's profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// User ID.
    pub id: UserId,
    /// Login name.
    pub username: String,
    /// Account email.
    pub email: String,
    /// First name.
    #[serde(default)]
    pub first_name: Option<String>,
    /// Last name.
    #[serde(default)]
    pub last_name: Option<String>,
    /// Phone number.
    #[serde(default)]
    pub phone_number: Option<String>,
    /// Avatar image URL.
    #[serde(default)]
    pub profile_image: Option<String>,
    /// Date of birth.
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    /// Street address.
    #[serde(default)]
    pub address: Option<String>,
    /// City.
    #[serde(default)]
    pub city: Option<String>,
    /// State or province.
    #[serde(default)]
    pub state: Option<String>,
    /// Postal code.
    #[serde(default)]
    pub zip_code: Option<String>,
    /// Country.
    #[serde(default)]
    pub country: Option<String>,
    /// Account creation time.
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    /// Last profile update time.
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
}

/// Writable subset of [`UserProfile`] for `PUT /users/profile`.
///
/// `None` fields are omitted from the payload and left unchanged on the
/// server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    /// First name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Last name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Phone number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    /// Date of birth.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    /// Street address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// City.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// State or province.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Postal code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    /// Country.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

// ============================================================================
// Envelopes
// ============================================================================

/// Generic `{"message": ...}` success body (e.g. order cancellation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiMessage {
    /// Human-readable confirmation.
    pub message: String,
}

/// The server's `{"error": ...}` failure body.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_product_deserializes_camel_case() {
        let json = r#"{
            "id": 1,
            "title": "Wireless Headphones",
            "price": 129.99,
            "description": "Noise cancelling",
            "category": "electronics",
            "image": "https://example.com/img.jpg",
            "ratingRate": 4.5,
            "ratingCount": 120
        }"#;

        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.id, ProductId::new(1));
        assert_eq!(product.price, Money::from_cents(129_99));
        assert_eq!(product.category, "electronics");

        let rating = product.rating().unwrap();
        assert!((rating.average - 4.5).abs() < f64::EPSILON);
        assert_eq!(rating.count, 120);
    }

    #[test]
    fn test_product_without_rating() {
        let json = r#"{"id": 2, "title": "Plain Mug", "price": 8.0, "category": "home"}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert!(product.rating().is_none());
        assert!(product.description.is_empty());
        assert!(product.image.is_none());
    }

    #[test]
    fn test_cart_entry_timestamps() {
        let json = r#"{
            "id": 7,
            "product": {"id": 1, "title": "Mug", "price": 8.0, "category": "home"},
            "quantity": 2,
            "addedAt": "2026-01-15T10:30:00",
            "updatedAt": null
        }"#;

        let entry: CartEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.quantity, 2);
        assert_eq!(entry.added_at.format("%Y-%m-%d").to_string(), "2026-01-15");
        assert!(entry.updated_at.is_none());
    }

    #[test]
    fn test_promo_validation_percentage_from_number() {
        let json = r#"{"valid": true, "message": "Promo code is valid", "discountPercentage": 10.0}"#;
        let v: PromoValidation = serde_json::from_str(json).unwrap();
        assert!(v.valid);
        assert_eq!(v.discount_percentage, Some(Decimal::from(10)));
    }

    #[test]
    fn test_order_request_omits_missing_promo() {
        let request = OrderRequest {
            total_amount: Money::from_cents(90_00),
            discount_amount: Money::from_cents(10_00),
            promo_code: None,
            items: vec![OrderItemRequest {
                product_id: ProductId::new(1),
                quantity: 2,
                price: Money::from_cents(50_00),
            }],
            full_name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            phone: "555-0100".to_string(),
            street: "1 Analytical Way".to_string(),
            city: "London".to_string(),
            state: "LDN".to_string(),
            zip_code: "E1 6AN".to_string(),
            country: "UK".to_string(),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("promoCode").is_none());
        assert_eq!(json["totalAmount"], 90.0);
        assert_eq!(json["items"][0]["productId"], 1);
    }

    #[test]
    fn test_order_deserializes_status_and_items() {
        let json = r#"{
            "id": 42,
            "totalAmount": 90.0,
            "discountAmount": 10.0,
            "promoCode": "SAVE10",
            "status": "PENDING",
            "orderDate": "2026-01-15T10:30:00",
            "deliveryDate": null,
            "fullName": "Ada Lovelace",
            "email": "ada@example.com",
            "phone": "555-0100",
            "street": "1 Analytical Way",
            "city": "London",
            "state": "LDN",
            "zipCode": "E1 6AN",
            "country": "UK",
            "orderItems": [
                {"id": 1, "quantity": 2, "price": 50.0, "productTitle": "Mug", "productImage": null}
            ]
        }"#;

        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.status.is_cancellable());
        assert_eq!(order.order_items.len(), 1);
        assert_eq!(order.order_items[0].product_title, "Mug");
    }

    #[test]
    fn test_profile_update_serializes_only_set_fields() {
        let update = ProfileUpdate {
            first_name: Some("Ada".to_string()),
            city: Some("London".to_string()),
            ..ProfileUpdate::default()
        };

        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["firstName"], "Ada");
        assert_eq!(json["city"], "London");
        assert!(json.get("lastName").is_none());
        assert!(json.get("dateOfBirth").is_none());
    }
}
