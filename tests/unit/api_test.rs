//! Tests for the API read models and body mapping

use serde_json::json;
use slot_pools::core::{
    OpenSlots, Pool, PoolCollection, PoolError, TaskInstance, TaskState, UNBOUNDED_SLOTS,
};
use slot_pools::runtime::{collection_view, pool_view, PoolBody, PoolPatch, PoolView};

#[test]
fn test_serialize_single_pool() {
    let pool = Pool::new("test_pool", 2, false, None).unwrap();
    let collection = PoolCollection::from_pools(vec![pool], &[]);
    let view = pool_view(&collection.pools[0]);

    assert_eq!(
        serde_json::to_value(&view).unwrap(),
        json!({
            "name": "test_pool",
            "slots": 2,
            "occupied_slots": 0,
            "running_slots": 0,
            "queued_slots": 0,
            "scheduled_slots": 0,
            "deferred_slots": 0,
            "open_slots": 2,
            "description": null,
            "include_deferred": false,
        })
    );
}

#[test]
fn test_serialize_collection() {
    let pools = vec![
        Pool::new("test_pool_a", 3, false, None).unwrap(),
        Pool::new("test_pool_b", 3, true, None).unwrap(),
    ];
    let collection = PoolCollection::from_pools(pools, &[]);

    assert_eq!(
        serde_json::to_value(collection_view(&collection)).unwrap(),
        json!({
            "pools": [
                {
                    "name": "test_pool_a",
                    "slots": 3,
                    "occupied_slots": 0,
                    "running_slots": 0,
                    "queued_slots": 0,
                    "scheduled_slots": 0,
                    "deferred_slots": 0,
                    "open_slots": 3,
                    "description": null,
                    "include_deferred": false,
                },
                {
                    "name": "test_pool_b",
                    "slots": 3,
                    "occupied_slots": 0,
                    "running_slots": 0,
                    "queued_slots": 0,
                    "scheduled_slots": 0,
                    "deferred_slots": 0,
                    "open_slots": 3,
                    "description": null,
                    "include_deferred": true,
                },
            ],
            "total_entries": 2,
        })
    );
}

#[test]
fn test_serialize_counts_and_unbounded() {
    let pools = vec![
        Pool::new("busy", 4, true, Some("busy pool".into())).unwrap(),
        Pool::new("open", UNBOUNDED_SLOTS, false, None).unwrap(),
    ];
    let tasks = vec![
        TaskInstance::new(1, "busy").with_state(TaskState::Running),
        TaskInstance::new(2, "busy").with_state(TaskState::Deferred),
        TaskInstance::new(3, "busy").with_state(TaskState::Scheduled).with_pool_slots(2),
        TaskInstance::new(4, "open").with_state(TaskState::Running),
    ];
    let view = collection_view(&PoolCollection::from_pools(pools, &tasks));

    let busy = &view.pools[0];
    assert_eq!(busy.occupied_slots, 4);
    assert_eq!(busy.scheduled_slots, 2);
    assert_eq!(busy.open_slots, OpenSlots::Finite(0));
    assert_eq!(busy.description.as_deref(), Some("busy pool"));

    let open = serde_json::to_value(&view.pools[1]).unwrap();
    assert_eq!(open["open_slots"], json!("unbounded"));
    assert_eq!(open["slots"], json!(-1));
}

#[test]
fn test_view_round_trips_through_json() {
    let pool = Pool::new("p", UNBOUNDED_SLOTS, false, None).unwrap();
    let view = pool_view(&PoolCollection::from_pools(vec![pool], &[]).pools[0]);
    let text = serde_json::to_string(&view).unwrap();
    let back: PoolView = serde_json::from_str(&text).unwrap();
    assert_eq!(back, view);
}

#[test]
fn test_deserialize_body_is_plain_data() {
    let body: PoolBody =
        serde_json::from_value(json!({"name": "test_pool", "slots": 3, "include_deferred": true}))
            .unwrap();
    assert_eq!(
        body,
        PoolBody {
            name: "test_pool".into(),
            slots: 3,
            description: None,
            include_deferred: true,
        }
    );

    let pool = body.into_pool().unwrap();
    assert_eq!(pool.name, "test_pool");
    assert_eq!(pool.slots, 3);
    assert!(pool.include_deferred);
}

#[test]
fn test_body_validation() {
    let body: PoolBody = serde_json::from_value(json!({"name": "x", "slots": -7})).unwrap();
    assert_eq!(body.into_pool(), Err(PoolError::InvalidSlots(-7)));

    let body: PoolBody = serde_json::from_value(json!({"name": "", "slots": 1})).unwrap();
    assert!(matches!(body.into_pool(), Err(PoolError::InvalidName(_))));

    assert!(serde_json::from_value::<PoolBody>(json!({"name": "x"})).is_err());
}

#[test]
fn test_patch_distinguishes_null_from_absent() {
    let patch: PoolPatch = serde_json::from_value(json!({"slots": 5})).unwrap();
    let update = patch.into_update().unwrap();
    assert_eq!(update.slots, Some(5));
    assert_eq!(update.description, None);

    let patch: PoolPatch = serde_json::from_value(json!({"description": null})).unwrap();
    assert_eq!(patch.into_update().unwrap().description, Some(None));

    let patch: PoolPatch = serde_json::from_value(json!({"slots": -2})).unwrap();
    assert_eq!(patch.into_update(), Err(PoolError::InvalidSlots(-2)));
}
