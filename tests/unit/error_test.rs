//! Tests for error types

use slot_pools::core::PoolError;

#[test]
fn test_duplicate_name_error() {
    let err = PoolError::DuplicateName("test_pool".to_string());
    assert_eq!(format!("{}", err), "pool `test_pool` already exists");
}

#[test]
fn test_invalid_slots_error() {
    let err = PoolError::InvalidSlots(-5);
    assert_eq!(format!("{}", err), "invalid slot count -5: must be >= -1");
}

#[test]
fn test_in_use_error() {
    let err = PoolError::InUse {
        pool: "db".to_string(),
        tasks: 3,
    };
    assert_eq!(format!("{}", err), "pool `db` is in use by 3 task instance(s)");
}

#[test]
fn test_over_admission_error() {
    let err = PoolError::OverAdmission {
        pool: "db".to_string(),
        occupied: 4,
        slots: 2,
    };
    assert_eq!(
        format!("{}", err),
        "over-admission in pool `db`: 4 occupied of 2 slots"
    );
}

#[test]
fn test_capacity_exceeded_error() {
    let err = PoolError::CapacityExceeded {
        pool: "gpu".to_string(),
        requested: 8,
        slots: 4,
    };
    assert_eq!(
        format!("{}", err),
        "capacity exceeded: task needs 8 slot(s), pool `gpu` has 4"
    );
}

#[test]
fn test_not_found_error() {
    let err = PoolError::NotFound("missing".to_string());
    assert_eq!(format!("{}", err), "pool `missing` not found");
}

#[test]
fn test_already_associated_error() {
    let err = PoolError::AlreadyAssociated {
        id: 3,
        pool: "db".to_string(),
    };
    assert_eq!(
        format!("{}", err),
        "task instance 3 is already associated with pool `db`"
    );
}
