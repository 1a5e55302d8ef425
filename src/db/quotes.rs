use futures::TryStreamExt;
use mongodb::{bson::doc, bson::Document, Collection, Database};

use crate::error::{ApiError, ApiResult};
use crate::models::quote::TourPackageQuote;
use crate::models::reference::PackageReference;

pub const COLLECTION: &str = "Quotes";

pub fn collection(db: &Database) -> Collection<TourPackageQuote> {
    db.collection(COLLECTION)
}

fn by_reference(reference: &PackageReference) -> Document {
    doc! {"package_reference": reference.to_string()}
}

/// Case-insensitive substring match over name, customer and reference.
pub fn search_filter(query: Option<&str>) -> Document {
    match query.map(str::trim) {
        Some(q) if !q.is_empty() => {
            let pattern = regex::escape(q);
            doc! {
                "$or": [
                    {"name": {"$regex": pattern.as_str(), "$options": "i"}},
                    {"customer_name": {"$regex": pattern.as_str(), "$options": "i"}},
                    {"package_reference": {"$regex": pattern.as_str(), "$options": "i"}},
                ]
            }
        }
        _ => doc! {},
    }
}

/// Newest first.
pub async fn list(db: &Database, query: Option<&str>) -> ApiResult<Vec<TourPackageQuote>> {
    let cursor = collection(db)
        .find(search_filter(query))
        .sort(doc! {"_id": -1})
        .await?;
    Ok(cursor.try_collect().await?)
}

pub async fn find_by_reference(db: &Database, reference: &PackageReference) -> ApiResult<TourPackageQuote> {
    collection(db)
        .find_one(by_reference(reference))
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Quote {}", reference)))
}

pub async fn insert(db: &Database, mut quote: TourPackageQuote) -> ApiResult<TourPackageQuote> {
    let result = collection(db).insert_one(&quote).await.map_err(|e| {
        if ApiError::is_duplicate_key(&e) {
            ApiError::Conflict(format!("Package reference {} already exists.", quote.package_reference))
        } else {
            e.into()
        }
    })?;
    quote.id = result.inserted_id.as_object_id();
    Ok(quote)
}

/// Replaces the whole document, days included, in a single write.
pub async fn replace(db: &Database, quote: &TourPackageQuote) -> ApiResult<()> {
    let result = collection(db)
        .replace_one(by_reference(&quote.package_reference), quote)
        .await?;
    if result.matched_count == 0 {
        return Err(ApiError::not_found(format!("Quote {}", quote.package_reference)));
    }
    Ok(())
}

pub async fn delete(db: &Database, reference: &PackageReference) -> ApiResult<()> {
    let result = collection(db).delete_one(by_reference(reference)).await?;
    if result.deleted_count == 0 {
        return Err(ApiError::not_found(format!("Quote {}", reference)));
    }
    Ok(())
}
