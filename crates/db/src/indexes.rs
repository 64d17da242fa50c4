use mongodb::{Database, IndexModel, options::IndexOptions};
use tracing::info;

use crate::models::{Action, FeedItem, User};

pub async fn ensure_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    // Users
    create_indexes(
        db,
        User::COLLECTION,
        vec![
            index_unique(bson::doc! { "email": 1 }),
            index_unique(bson::doc! { "username": 1 }),
            index(bson::doc! { "created_at": -1 }),
        ],
    )
    .await?;

    // Actions
    create_indexes(
        db,
        Action::COLLECTION,
        vec![
            index(bson::doc! { "user_id": 1, "created_at": -1 }),
            index(bson::doc! { "object_id": 1, "action_type": 1 }),
            index(bson::doc! { "action_type": 1, "object_id": 1, "user_id": 1 }),
            // At most one subscription and one rating per (user, target)
            index_unique_where(
                bson::doc! { "user_id": 1, "object_id": 1, "action_type": 1 },
                bson::doc! { "action_type": "subscribe" },
            ),
            index_unique_where(
                bson::doc! { "object_id": 1, "user_id": 1, "action_type": 1 },
                bson::doc! { "action_type": "rate" },
            ),
        ],
    )
    .await?;

    // Feed items: one document per (recipient, action, kind)
    create_indexes(
        db,
        FeedItem::COLLECTION,
        vec![
            index_unique(bson::doc! { "user_id": 1, "action_id": 1, "is_notification": 1 }),
            index(bson::doc! { "user_id": 1, "is_notification": 1, "created_at": -1 }),
            index(bson::doc! { "user_id": 1, "is_notification": 1, "is_read": 1 }),
            index(bson::doc! { "action_id": 1 }),
            index(bson::doc! { "user_id": 1, "author_id": 1, "is_notification": 1, "is_read": 1 }),
            index(bson::doc! { "is_notification": 1, "is_read": 1, "is_mailed": 1 }),
        ],
    )
    .await?;

    info!("All indexes ensured");
    Ok(())
}

fn index(keys: bson::Document) -> IndexModel {
    IndexModel::builder().keys(keys).build()
}

fn index_unique(keys: bson::Document) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().unique(true).build())
        .build()
}

fn index_unique_where(keys: bson::Document, filter: bson::Document) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(
            IndexOptions::builder()
                .unique(true)
                .partial_filter_expression(filter)
                .build(),
        )
        .build()
}

async fn create_indexes(
    db: &Database,
    collection: &str,
    indexes: Vec<IndexModel>,
) -> Result<(), mongodb::error::Error> {
    db.collection::<bson::Document>(collection)
        .create_indexes(indexes)
        .await?;
    info!(collection, "Indexes created");
    Ok(())
}
