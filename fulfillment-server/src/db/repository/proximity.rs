//! Nearest-stock lookup
//!
//! Candidates come from SQL (same product, enough stock, both sides active),
//! pre-filtered by a latitude band around the requesting pharmacy. Exact
//! great-circle distances are computed here and the closest candidate inside
//! the radius wins, ties broken by the lower pharmacy product id.

use super::{RepoError, RepoResult};
use shared::models::{Pharmacy, PharmacyProduct};
use sqlx::{Executor, Sqlite};

/// Mean Earth radius used by the haversine formula
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Kilometres per degree of latitude
const KM_PER_DEGREE: f64 = 111.0;

/// A pharmacy product able to supply a transfer
#[derive(Debug, Clone)]
pub struct NearbyStock {
    pub pharmacy_product: PharmacyProduct,
    pub distance_km: f64,
}

#[derive(sqlx::FromRow)]
struct CandidateRow {
    #[sqlx(flatten)]
    pharmacy_product: PharmacyProduct,
    latitude: f64,
    longitude: f64,
}

/// Great-circle distance between two coordinates, in kilometres
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().min(1.0).asin()
}

/// Closest other pharmacy holding at least `required` units of `product_id`
///
/// Fails with [`RepoError::NotFound`] when nothing qualifies within
/// `radius_km` of `near`.
pub async fn find_nearest_with_stock(
    conn: impl Executor<'_, Database = Sqlite>,
    near: &Pharmacy,
    product_id: i64,
    required: i64,
    radius_km: f64,
) -> RepoResult<NearbyStock> {
    let band = radius_km / KM_PER_DEGREE + 0.01;
    let candidates = sqlx::query_as::<_, CandidateRow>(
        "SELECT pp.id, pp.pharmacy_id, pp.product_id, pp.stock, pp.price, pp.is_active, pp.created_at, pp.updated_at, ph.latitude, ph.longitude FROM pharmacy_product pp JOIN pharmacy ph ON ph.id = pp.pharmacy_id WHERE pp.product_id = ?1 AND pp.stock >= ?2 AND pp.pharmacy_id <> ?3 AND pp.is_active = 1 AND ph.is_active = 1 AND ph.latitude BETWEEN ?4 AND ?5",
    )
    .bind(product_id)
    .bind(required)
    .bind(near.id)
    .bind(near.latitude - band)
    .bind(near.latitude + band)
    .fetch_all(conn)
    .await?;

    candidates
        .into_iter()
        .map(|c| NearbyStock {
            distance_km: haversine_km(near.latitude, near.longitude, c.latitude, c.longitude),
            pharmacy_product: c.pharmacy_product,
        })
        .filter(|c| c.distance_km <= radius_km)
        .min_by(|a, b| {
            a.distance_km
                .total_cmp(&b.distance_km)
                .then(a.pharmacy_product.id.cmp(&b.pharmacy_product.id))
        })
        .ok_or_else(|| {
            RepoError::NotFound(format!(
                "No pharmacy within {radius_km} km holds {required} units of product {product_id}"
            ))
        })
}
