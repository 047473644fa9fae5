use serde::{Deserialize, Serialize};

/// Identifies an item type in the catalog. Cheap to copy and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemTypeId(pub u32);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_type_id_equality() {
        assert_eq!(ItemTypeId(0), ItemTypeId(0));
        assert_ne!(ItemTypeId(0), ItemTypeId(1));
    }

    #[test]
    fn item_type_ids_order_by_index() {
        let mut ids = vec![ItemTypeId(3), ItemTypeId(1), ItemTypeId(2)];
        ids.sort();
        assert_eq!(ids, vec![ItemTypeId(1), ItemTypeId(2), ItemTypeId(3)]);
    }
}
