//! Hash collections backed by AHash.

pub use ahash::{AHashMap as HashMap, AHashSet as HashSet, RandomState};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hashmap_ahash() {
        let mut map = HashMap::new();
        map.insert((0u32, 1u32), "subresource");
        assert_eq!(map.get(&(0, 1)), Some(&"subresource"));
    }
}
