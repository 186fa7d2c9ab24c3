use super::*;

#[test]
fn test_cluster_quad_size_is_power_of_two() {
  assert!(CLUSTER_QUAD_SIZE.is_power_of_two());
  assert_eq!(CLUSTER_VERTEX_SIZE, 17);
}

#[test]
fn test_lod_count_reaches_single_quad() {
  assert_eq!(CLUSTER_LOD_COUNT, 5);
  assert_eq!(lod_quad_size(CLUSTER_LOD_COUNT - 1), 1);
}

#[test]
fn test_lod_index_counts() {
  assert_eq!(lod_index_count(0), 16 * 16 * 6);
  assert_eq!(lod_index_count(1), 8 * 8 * 6);
  assert_eq!(lod_index_count(4), 6);
}

#[test]
fn test_group_count_rounds_up() {
  assert_eq!(group_count(0, THREAD_GROUP_SIZE), 0);
  assert_eq!(group_count(1, THREAD_GROUP_SIZE), 1);
  assert_eq!(group_count(64, THREAD_GROUP_SIZE), 1);
  assert_eq!(group_count(65, THREAD_GROUP_SIZE), 2);
}

#[test]
fn test_cluster_budget_matches_coordinate_fields() {
  assert_eq!(MAX_CLUSTERS_PER_AXIS * MAX_CLUSTERS_PER_AXIS, MAX_CLUSTER_COUNT);
}
