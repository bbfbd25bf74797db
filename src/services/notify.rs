use crate::{
    dao::{models::NotificationEntity, record_store::RecordStore},
    error::ServiceError,
};

/// Persist a notification record.
///
/// Fire-and-forget contract: insertion is the only delivery guarantee;
/// real-time transport is someone else's concern.
pub async fn send(
    store: &dyn RecordStore,
    notification: NotificationEntity,
) -> Result<(), ServiceError> {
    store.insert_notification(notification).await?;
    Ok(())
}

/// Persist a plain informational notification.
pub async fn send_info(
    store: &dyn RecordStore,
    from_id: impl Into<String>,
    to_id: impl Into<String>,
    title: impl Into<String>,
    message: impl Into<String>,
) -> Result<(), ServiceError> {
    send(store, NotificationEntity::info(from_id, to_id, title, message)).await
}
