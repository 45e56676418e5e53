// file: src/sync/calendars.rs
use super::remote_ids;
use crate::calendar::RemoteCalendarGateway;
use crate::database::{calendars, Database, Upserted};
use crate::error::AppResult;
use crate::models::SyncSummary;
use log::{debug, info};

/// Mirrors the user's remote calendar list into the local store.
///
/// New calendars are stored inactive, known calendars are renamed, and
/// calendars missing from the remote list are deactivated rather than
/// deleted. Gateway errors propagate before anything is written; updates
/// already applied are not rolled back if the store fails midway.
pub async fn reconcile_calendars(
    db: &Database,
    gateway: &dyn RemoteCalendarGateway,
    user_id: i64,
) -> AppResult<SyncSummary> {
    let remote = gateway.list_calendars().await?;
    debug!("Remote reported {} calendars for user {}", remote.len(), user_id);

    let mut summary = SyncSummary::default();
    let mut conn = db.pool.acquire().await?;

    // Duplicate ids are applied in order, so the last name wins.
    for calendar in &remote {
        match calendars::upsert(&mut conn, user_id, calendar).await? {
            Upserted::Inserted => {
                debug!("Discovered calendar '{}' for user {}", calendar.name, user_id);
                summary.added += 1;
            }
            Upserted::Updated => summary.updated += 1,
        }
    }

    let keep = remote_ids(remote.iter().map(|c| c.id.as_str()));
    summary.removed = calendars::deactivate_missing(&mut conn, user_id, &keep).await? as usize;

    info!(
        "Calendars reconciled for user {}: {} added, {} updated, {} deactivated",
        user_id, summary.added, summary.updated, summary.removed
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{MockRemoteCalendarGateway, RemoteCalendar};
    use crate::database::test_support::create_test_database;
    use crate::error::AppError;
    use crate::models::Calendar;
    use crate::sync::test_support::seed_calendar;

    fn remote(id: &str, name: &str) -> RemoteCalendar {
        RemoteCalendar {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    fn gateway_returning(calendars: Vec<RemoteCalendar>) -> MockRemoteCalendarGateway {
        let mut gateway = MockRemoteCalendarGateway::new();
        gateway
            .expect_list_calendars()
            .returning(move || Ok(calendars.clone()));
        gateway.expect_list_events().never();
        gateway
    }

    fn by_remote_id(calendars: &[Calendar], remote_id: &str) -> Calendar {
        calendars
            .iter()
            .find(|c| c.remote_id == remote_id)
            .cloned()
            .unwrap()
    }

    #[tokio::test]
    async fn test_new_calendars_are_inactive() {
        let (db, _dir) = create_test_database().await;
        let user = db.create_user("alice").await.unwrap();
        let gateway = gateway_returning(vec![remote("id1", "cal1"), remote("id2", "cal2")]);

        let summary = reconcile_calendars(&db, &gateway, user.id).await.unwrap();
        assert_eq!(summary.added, 2);
        assert_eq!(summary.removed, 0);

        let stored = db.calendars_for_user(user.id).await.unwrap();
        assert_eq!(stored.len(), 2);
        assert!(stored.iter().all(|c| !c.active));
        assert_eq!(by_remote_id(&stored, "id1").name, "cal1");
    }

    #[tokio::test]
    async fn test_rerun_is_idempotent() {
        let (db, _dir) = create_test_database().await;
        let user = db.create_user("alice").await.unwrap();
        let gateway = gateway_returning(vec![remote("id1", "cal1"), remote("id2", "cal2")]);

        reconcile_calendars(&db, &gateway, user.id).await.unwrap();
        let id1 = by_remote_id(&db.calendars_for_user(user.id).await.unwrap(), "id1");
        db.set_calendar_active(user.id, id1.id, true).await.unwrap();
        let before = db.calendars_for_user(user.id).await.unwrap();

        let summary = reconcile_calendars(&db, &gateway, user.id).await.unwrap();
        assert_eq!(summary.added, 0);
        assert_eq!(summary.updated, 2);

        let after = db.calendars_for_user(user.id).await.unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_rename_keeps_active_flag() {
        let (db, _dir) = create_test_database().await;
        let user = db.create_user("alice").await.unwrap();
        seed_calendar(&db, user.id, "id1", true).await;

        let gateway = gateway_returning(vec![remote("id1", "Renamed")]);
        reconcile_calendars(&db, &gateway, user.id).await.unwrap();

        let stored = by_remote_id(&db.calendars_for_user(user.id).await.unwrap(), "id1");
        assert_eq!(stored.name, "Renamed");
        assert!(stored.active);
    }

    #[tokio::test]
    async fn test_other_users_calendar_is_untouched() {
        let (db, _dir) = create_test_database().await;
        let alice = db.create_user("alice").await.unwrap();
        let bob = db.create_user("bob").await.unwrap();
        seed_calendar(&db, alice.id, "shared", true).await;
        let bobs = seed_calendar(&db, bob.id, "shared", true).await;

        let gateway = gateway_returning(vec![remote("shared", "Renamed")]);
        reconcile_calendars(&db, &gateway, alice.id).await.unwrap();

        let alices = by_remote_id(&db.calendars_for_user(alice.id).await.unwrap(), "shared");
        assert_eq!(alices.name, "Renamed");
        let bobs_after = db.owned_calendar(bob.id, bobs.id).await.unwrap().unwrap();
        assert_eq!(bobs_after, bobs);
    }

    #[tokio::test]
    async fn test_missing_calendar_is_deactivated_not_deleted() {
        let (db, _dir) = create_test_database().await;
        let user = db.create_user("alice").await.unwrap();
        seed_calendar(&db, user.id, "id1", true).await;
        seed_calendar(&db, user.id, "id2", true).await;

        let gateway = gateway_returning(vec![remote("id1", "cal1")]);
        let summary = reconcile_calendars(&db, &gateway, user.id).await.unwrap();
        assert_eq!(summary.removed, 1);

        let stored = db.calendars_for_user(user.id).await.unwrap();
        assert_eq!(stored.len(), 2);
        assert!(by_remote_id(&stored, "id1").active);
        assert!(!by_remote_id(&stored, "id2").active);
    }

    #[tokio::test]
    async fn test_empty_remote_deactivates_everything() {
        let (db, _dir) = create_test_database().await;
        let user = db.create_user("alice").await.unwrap();
        seed_calendar(&db, user.id, "id1", true).await;

        let gateway = gateway_returning(Vec::new());
        let summary = reconcile_calendars(&db, &gateway, user.id).await.unwrap();
        assert_eq!(summary.removed, 1);

        let stored = db.calendars_for_user(user.id).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert!(!stored[0].active);
    }

    #[tokio::test]
    async fn test_duplicate_remote_ids_last_name_wins() {
        let (db, _dir) = create_test_database().await;
        let user = db.create_user("alice").await.unwrap();
        let gateway = gateway_returning(vec![remote("id1", "first"), remote("id1", "second")]);

        reconcile_calendars(&db, &gateway, user.id).await.unwrap();

        let stored = db.calendars_for_user(user.id).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].name, "second");
    }

    #[tokio::test]
    async fn test_gateway_failure_writes_nothing() {
        let (db, _dir) = create_test_database().await;
        let user = db.create_user("alice").await.unwrap();
        seed_calendar(&db, user.id, "id1", true).await;

        let mut gateway = MockRemoteCalendarGateway::new();
        gateway
            .expect_list_calendars()
            .returning(|| Err(AppError::retrieval("remote unreachable")));

        let err = reconcile_calendars(&db, &gateway, user.id).await.unwrap_err();
        assert!(err.is_retrieval_failure());

        let stored = db.calendars_for_user(user.id).await.unwrap();
        assert!(stored[0].active);
    }
}
