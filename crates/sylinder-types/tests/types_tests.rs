//! Integration tests for sylinder-types.

use sylinder_types::{GlobalId, GlobalIndex, RankId, SylinderError, WorkerId};

// ─── ID Tests ──────────────────────────────────────────────────

#[test]
fn global_index_dof_offset() {
    let idx = GlobalIndex(7);
    assert_eq!(idx.index(), 7);
    assert_eq!(idx.dof_offset(), 42);
}

#[test]
fn global_ids_are_ordered() {
    assert!(GlobalId(3) < GlobalId(10));
}

#[test]
fn worker_and_rank_index() {
    assert_eq!(WorkerId::from(5usize).index(), 5);
    assert_eq!(RankId(2).index(), 2);
}

#[test]
fn ids_are_serializable() {
    let id = GlobalId(100);
    let json = serde_json::to_string(&id).unwrap();
    let deserialized: GlobalId = serde_json::from_str(&json).unwrap();
    assert_eq!(id, deserialized);
}

// ─── Error Tests ──────────────────────────────────────────────

#[test]
fn precondition_display() {
    let err = SylinderError::Precondition("collector has no pools".into());
    assert!(err.to_string().contains("collector has no pools"));
}

#[test]
fn dimension_mismatch_display() {
    let err = SylinderError::DimensionMismatch {
        expected: 12,
        actual: 6,
    };
    let msg = err.to_string();
    assert!(msg.contains("12"));
    assert!(msg.contains('6'));
}
