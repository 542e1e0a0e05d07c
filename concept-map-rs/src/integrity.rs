// concept-map-rs/src/integrity.rs
//
// Cross-reference checks on a schema-valid concept map. Cycles are not
// detected.

use std::collections::HashSet;

use crate::error::ResponseError;
use crate::model::ConceptMap;

/// Verifies node ids are unique and every prerequisite reference resolves
///
/// Stops at the first problem found, scanning nodes in order.
pub fn check_integrity(map: ConceptMap) -> Result<ConceptMap, ResponseError> {
    let mut ids = HashSet::with_capacity(map.prerequisites.len());
    for node in &map.prerequisites {
        if !ids.insert(node.id) {
            return Err(ResponseError::DuplicateId(node.id));
        }
    }

    for node in &map.prerequisites {
        if let Some(&missing) = node.prerequisites.iter().find(|&&id| !ids.contains(&id)) {
            return Err(ResponseError::DanglingReference {
                node: node.id,
                missing,
            });
        }
    }

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Level, PrerequisiteNode};

    fn node(id: u64, prerequisites: &[u64]) -> PrerequisiteNode {
        PrerequisiteNode {
            id,
            name: format!("Concept {}", id),
            description: "A concept".to_string(),
            prerequisites: prerequisites.to_vec(),
            level: Level::Intermediate,
        }
    }

    fn map(nodes: Vec<PrerequisiteNode>) -> ConceptMap {
        ConceptMap {
            target: "Target".to_string(),
            prerequisites: nodes,
        }
    }

    #[test]
    fn test_valid_tree_is_returned_unchanged() {
        let original = map(vec![node(1, &[]), node(2, &[1]), node(3, &[1, 2])]);
        assert_eq!(check_integrity(original.clone()).unwrap(), original);
    }

    #[test]
    fn test_forward_references_are_allowed() {
        let original = map(vec![node(2, &[1]), node(1, &[])]);
        assert!(check_integrity(original).is_ok());
    }

    #[test]
    fn test_first_dangling_reference_fails() {
        let err = check_integrity(map(vec![node(1, &[]), node(2, &[1, 99]), node(3, &[42])])).unwrap_err();
        match err {
            ResponseError::DanglingReference { node, missing } => {
                assert_eq!(node, 2);
                assert_eq!(missing, 99);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_ids() {
        let err = check_integrity(map(vec![node(1, &[]), node(1, &[])])).unwrap_err();
        assert!(matches!(err, ResponseError::DuplicateId(1)));
    }

    #[test]
    fn test_cycles_pass() {
        let cyclic = map(vec![node(1, &[2]), node(2, &[1])]);
        assert!(check_integrity(cyclic).is_ok());
    }
}
