use mongodb::{
    bson::{doc, Bson, Document},
    options::ReturnDocument,
    Collection, Database,
};

use crate::error::{ApiError, ApiResult};
use crate::models::reference::PackageReference;

pub const COLLECTION: &str = "Counters";

fn collection(db: &Database) -> Collection<Document> {
    db.collection(COLLECTION)
}

fn sequence_of(counter: &Document) -> Option<u32> {
    match counter.get("seq")? {
        Bson::Int32(n) => u32::try_from(*n).ok(),
        Bson::Int64(n) => u32::try_from(*n).ok(),
        Bson::Double(n) if *n >= 1.0 => Some(*n as u32),
        _ => None,
    }
}

/// Allocates the next reference of `year`. The counter is incremented
/// atomically server-side, so concurrent saves never share a number.
pub async fn next_reference(db: &Database, year: i32) -> ApiResult<PackageReference> {
    let counter = collection(db)
        .find_one_and_update(
            doc! {"_id": PackageReference::counter_key(year)},
            doc! {"$inc": {"seq": 1}},
        )
        .upsert(true)
        .return_document(ReturnDocument::After)
        .await?
        .ok_or_else(|| ApiError::internal("reference counter upsert returned nothing"))?;

    let sequence = sequence_of(&counter)
        .ok_or_else(|| ApiError::internal(format!("malformed reference counter for {}", year)))?;

    Ok(PackageReference::new(year, sequence))
}
