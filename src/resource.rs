use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of one shared resource in the fixed set `{R0..Rn-1}`.
///
/// Resources are identity-only: there is no payload and no mutable state
/// behind an id, only the lock the manager keeps for it.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct ResourceId(pub u32);

impl ResourceId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ResourceId").field(&self.0).finish()
    }
}

/// The canonical global acquisition order `R0..Rn-1`.
pub fn ascending(resources: u32) -> Vec<ResourceId> {
    (0..resources).map(ResourceId::new).collect()
}

/// An acquisition order is any sequence of distinct ids inside the fixed set;
/// it may cover a subset of the resources.
pub fn is_valid_order(order: &[ResourceId], resources: u32) -> bool {
    let mut seen = vec![false; resources as usize];
    order.iter().all(|id| {
        let i = id.index();
        i < seen.len() && !std::mem::replace(&mut seen[i], true)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascending_covers_the_whole_set() {
        assert_eq!(
            ascending(3),
            vec![ResourceId::new(0), ResourceId::new(1), ResourceId::new(2)]
        );
        assert!(ascending(0).is_empty());
    }

    #[test]
    fn order_validation() {
        let order = ascending(3);
        assert!(is_valid_order(&order, 3));
        assert!(is_valid_order(&[ResourceId::new(2)], 3));
        assert!(is_valid_order(&[], 3));
        // duplicate id
        assert!(!is_valid_order(
            &[ResourceId::new(1), ResourceId::new(1)],
            3
        ));
        // outside the fixed set
        assert!(!is_valid_order(&[ResourceId::new(3)], 3));
    }

    #[test]
    fn debug_shows_the_raw_id() {
        assert_eq!(format!("{:?}", ResourceId::new(2)), "ResourceId(2)");
    }
}
