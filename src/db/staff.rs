use chrono::Utc;
use mongodb::{bson::doc, bson::oid::ObjectId, Collection, Database};

use crate::error::ApiResult;
use crate::models::account::StaffUser;

pub const COLLECTION: &str = "Staff";

pub fn collection(db: &Database) -> Collection<StaffUser> {
    db.collection(COLLECTION)
}

pub async fn find_by_email(db: &Database, email: &str) -> ApiResult<Option<StaffUser>> {
    Ok(collection(db)
        .find_one(doc! {"email": email.trim().to_lowercase()})
        .await?)
}

pub async fn find_by_id(db: &Database, id: &ObjectId) -> ApiResult<Option<StaffUser>> {
    Ok(collection(db).find_one(doc! {"_id": id}).await?)
}

pub async fn record_signin(db: &Database, id: &ObjectId) -> ApiResult<()> {
    collection(db)
        .update_one(
            doc! {"_id": id},
            doc! {"$set": {"last_signin": Utc::now().to_rfc3339(), "failed_signins": 0}},
        )
        .await?;
    Ok(())
}

pub async fn record_failed_signin(db: &Database, id: &ObjectId) -> ApiResult<()> {
    collection(db)
        .update_one(doc! {"_id": id}, doc! {"$inc": {"failed_signins": 1}})
        .await?;
    Ok(())
}
