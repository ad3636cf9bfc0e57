mod hash_table {
    use std::collections::{BTreeMap, BTreeSet, HashMap};
    use std::sync::atomic::AtomicBool;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering::{Acquire, Relaxed, Release};
    use std::sync::{Arc, Barrier};
    use std::thread;

    use proptest::prelude::*;
    use sdd::Guard;

    use crate::{
        ByteArrayHashMap, Error, IntHashMap, IntLongCounterMap, KeygenMap, LongHashMap,
        LongIntCounterMap, LongLongCounterMap, MapInfo,
    };

    static_assertions::assert_impl_all!(IntHashMap<String>: Send, Sync);
    static_assertions::assert_impl_all!(LongHashMap<Vec<u8>>: Send, Sync);
    static_assertions::assert_impl_all!(ByteArrayHashMap<String>: Send, Sync);
    static_assertions::assert_impl_all!(LongIntCounterMap: Send, Sync, Default);
    static_assertions::assert_impl_all!(IntLongCounterMap: Send, Sync, Default);
    static_assertions::assert_impl_all!(LongLongCounterMap: Send, Sync, Default);
    static_assertions::assert_impl_all!(MapInfo: Send, Sync, Copy);

    struct R(&'static AtomicUsize);
    impl R {
        fn new(cnt: &'static AtomicUsize) -> R {
            cnt.fetch_add(1, Relaxed);
            R(cnt)
        }
    }
    impl Drop for R {
        fn drop(&mut self) {
            self.0.fetch_sub(1, Relaxed);
        }
    }

    fn wait_for_reclamation(cnt: &AtomicUsize) {
        for _ in 0..1 << 20 {
            if cnt.load(Relaxed) == 0 {
                return;
            }
            Guard::new().accelerate();
            thread::yield_now();
        }
        assert_eq!(cnt.load(Relaxed), 0);
    }

    fn entries(map: &IntHashMap<i32>) -> BTreeMap<i32, i32> {
        map.entry_iter().map(|(k, v)| (k, *v)).collect()
    }

    #[test]
    fn rehash_scenario() {
        let map: IntHashMap<i32> = IntHashMap::with_capacity_and_load_factor(4, 0.75).unwrap();
        for key in 1..=3 {
            assert!(map.put(key, key * 100).is_none());
        }
        assert_eq!(map.len(), 3);
        assert_eq!(map.capacity(), 4);

        assert!(map.put(4, 400).is_none());
        assert_eq!(map.capacity(), 8);
        for key in 1..=4 {
            assert_eq!(map.get(&key).map(|v| *v), Some(key * 100));
        }

        assert_eq!(map.remove(&2).map(|v| *v), Some(200));
        assert_eq!(map.len(), 3);
        assert!(!map.contains_key(&2));
        for key in [1, 3, 4] {
            assert_eq!(map.get(&key).map(|v| *v), Some(key * 100));
        }
    }

    #[test]
    fn lazy_allocation() {
        let map: IntHashMap<i32> = IntHashMap::with_capacity(64);
        assert_eq!(map.capacity(), 64);
        assert!(map.get(&1).is_none());
        assert!(map.remove(&1).is_none());
        assert!(map.replace(&1, 1).is_none());
        assert_eq!(map.key_iter().count(), 0);

        map.rehash();
        assert_eq!(map.capacity(), 128);
        map.clear();
        assert_eq!(map.map_info().slots, 128);

        assert!(map.put(1, 1).is_none());
        assert_eq!(map.capacity(), 128);

        let cleared: IntHashMap<i32> = IntHashMap::with_capacity(64);
        assert!(cleared.put(1, 1).is_none());
        cleared.clear();
        cleared.rehash();
        assert_eq!(cleared.capacity(), map.capacity());
    }

    #[test]
    fn manual_rehash() {
        let map: IntHashMap<i32> = IntHashMap::with_capacity(2);
        assert!(map.put(0, 0).is_none());
        for expected in [4, 8, 16] {
            map.rehash();
            assert_eq!(map.capacity(), expected);
        }
        assert_eq!(map.get(&0).map(|v| *v), Some(0));
    }

    #[test]
    fn load_factor() {
        let map: IntHashMap<i32> = IntHashMap::with_capacity_and_load_factor(4, 2.0).unwrap();
        assert_eq!(map.load_factor(), 2.0);
        for key in 0..8 {
            assert!(map.put(key, key).is_none());
        }
        assert_eq!(map.capacity(), 4);
        assert!(map.put(8, 8).is_none());
        assert_eq!(map.capacity(), 8);

        for load_factor in [0.0, -0.5, f32::NAN] {
            assert!(IntHashMap::<i32>::with_capacity_and_load_factor(4, load_factor).is_err());
        }
    }

    #[test]
    fn put_variants() {
        let map: IntHashMap<i32> = IntHashMap::default();
        assert!(map.put_if_absent(1, 1).is_none());
        assert_eq!(map.put_if_absent(1, 2).map(|v| *v), Some(1));
        assert_eq!(map.put_unique(1, 3), Err(Error::DuplicateKey));
        assert_eq!(map.get(&1).map(|v| *v), Some(1));
        assert!(map.put_unique(2, 2).is_ok());
        assert_eq!(map.put(2, 4).map(|v| *v), Some(2));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn replace_and_remove_mapping() {
        let map: IntHashMap<String> = IntHashMap::new();
        assert!(map.put(1, "a".to_owned()).is_none());
        assert!(!map.compare_and_replace(&2, &"a".to_owned(), "b".to_owned()));
        assert!(!map.compare_and_replace(&1, &"x".to_owned(), "b".to_owned()));
        assert!(map.compare_and_replace(&1, &"a".to_owned(), "b".to_owned()));
        assert_eq!(map.replace(&1, "c".to_owned()).as_deref().map(String::as_str), Some("b"));
        assert!(map.remove_mapping(&1, &"b".to_owned()).is_none());
        assert!(map.remove_mapping(&1, &"c".to_owned()).is_some());
        assert!(map.is_empty());
    }

    #[test]
    fn reader_keeps_removed_value() {
        let map: IntHashMap<String> = IntHashMap::new();
        assert!(map.put(1, "first".to_owned()).is_none());
        let value = map.get(&1).unwrap();
        assert!(map.put(1, "second".to_owned()).is_some());
        assert!(map.remove(&1).is_some());
        assert_eq!(&*value, "first");
    }

    #[test]
    fn long_keys() {
        let map: LongHashMap<u8> = LongHashMap::with_capacity(8);
        let keys = [5_i64, (1 << 32) + 5, (2 << 32) + 5, -5, i64::MIN];
        for (i, key) in keys.into_iter().enumerate() {
            assert!(map.put(key, u8::try_from(i).unwrap()).is_none());
        }
        for (i, key) in keys.into_iter().enumerate() {
            assert_eq!(map.get(&key).map(|v| *v), Some(u8::try_from(i).unwrap()));
        }
        assert!(map.get(&((3 << 32) + 5)).is_none());
        assert_eq!(map.map_info().excess_entries, 2);
    }

    #[test]
    fn byte_keys() {
        let map: ByteArrayHashMap<usize> = ByteArrayHashMap::new();
        for i in 0..100_usize {
            let key: Arc<[u8]> = Arc::from(format!("key-{i}").into_bytes());
            assert!(map.put(key, i).is_none());
        }
        assert_eq!(map.len(), 100);
        for i in 0..100_usize {
            let probe = format!("key-{i}");
            assert_eq!(map.get(probe.as_bytes()).map(|v| *v), Some(i));
        }
        assert!(!map.contains_key(b"key-100"));
        assert!(map.remove(b"key-7").is_some());
        assert!(!map.key_set().contains(b"key-7"));
        assert!(map.key_iter().all(|k| &*k != b"key-7"));
    }

    #[test]
    fn counters() {
        let map = LongIntCounterMap::new();
        assert_eq!(map.increment(1, 5), Ok(5));
        assert_eq!(map.decrement(1, 2), Ok(3));
        assert_eq!(map.decrement(1, 3), Ok(0));
        assert!(!map.contains_key(&1));
        assert!(map.is_empty());

        assert_eq!(map.decrement(2, 4), Ok(-4));
        assert_eq!(map.get(&2), Some(-4));
        assert_eq!(map.increment(2, 4), Ok(0));
        assert!(!map.contains_key(&2));

        assert_eq!(map.increment(3, 0), Err(Error::NonPositiveAmount));
        assert_eq!(map.decrement(3, -1), Err(Error::NonPositiveAmount));
        assert!(map.is_empty());

        let map = IntLongCounterMap::new();
        assert_eq!(map.increment_one(1), 1);
        assert_eq!(map.increment_one(1), 2);
        assert_eq!(map.decrement_one(1), 1);
        assert_eq!(map.decrement_one(1), 0);
        assert!(!map.contains_key(&1));
        assert_eq!(map.decrement_one(1), -1);

        let map = LongLongCounterMap::new();
        assert_eq!(map.increment(i64::MAX, i64::MAX), Ok(i64::MAX));
        assert_eq!(map.increment(i64::MAX, 1), Ok(i64::MIN));
        assert!(map.contains_value(&i64::MIN));
    }

    #[test]
    fn stored_zero_counters() {
        let map = LongIntCounterMap::new();
        assert!(map.put(1, 0).is_none());
        assert!(map.contains_key(&1));
        assert_eq!(map.get(&1), Some(0));

        assert_eq!(map.increment(1, 1), Ok(1));
        assert_eq!(map.replace(&1, 0), Some(1));
        assert!(map.compare_and_replace(&1, &0, 0));
        assert_eq!(map.len(), 1);

        assert_eq!(map.increment(1, 1), Ok(1));
        assert_eq!(map.decrement(1, 1), Ok(0));
        assert!(!map.contains_key(&1));
        assert!(map.is_empty());
    }

    #[test]
    fn counters_across_rehash() {
        let map = IntLongCounterMap::with_capacity(1);
        for round in 1..=3 {
            for key in 0..256 {
                assert_eq!(map.increment(key, 1), Ok(round));
            }
        }
        assert_eq!(map.len(), 256);
        assert_eq!(map.capacity(), 512);
        for key in 0..256 {
            assert_eq!(map.decrement(key, 3), Ok(0));
        }
        assert!(map.is_empty());
    }

    #[test]
    fn clear() {
        let map: IntHashMap<i32> = IntHashMap::new();
        for key in 0..100 {
            assert!(map.put(key, key).is_none());
        }
        let capacity = map.capacity();
        map.clear();
        assert!(map.is_empty());
        assert_eq!(map.capacity(), capacity);
        assert!((0..100).all(|k| !map.contains_key(&k)));
        assert!(map.put(1, 1).is_none());
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn map_info() {
        let map: IntHashMap<i32> = IntHashMap::with_capacity(16);
        for key in [0, 16, 32, 1, 2] {
            assert!(map.put(key, key).is_none());
        }
        let info = map.map_info();
        assert_eq!(
            info,
            MapInfo {
                slots: 16,
                len: 5,
                occupied_slots: 3,
                excess_entries: 2,
            }
        );
        assert_eq!(info.collision_level(), 0.4);
    }

    #[test]
    fn from_iter_extend() {
        let mut map = (0..256).map(|k| (k, k * 2)).collect::<IntHashMap<i32>>();
        assert_eq!(map.len(), 256);
        assert_eq!(map.get(&255).map(|v| *v), Some(510));

        map.extend((0..512).map(|k| (k, k)));
        assert_eq!(map.len(), 512);
        assert_eq!(map.get(&255).map(|v| *v), Some(255));
    }

    #[test]
    fn debug_and_eq() {
        let map: IntHashMap<u32> = IntHashMap::new();
        assert!(map.put(1, 2).is_none());
        assert_eq!(format!("{map:?}"), "{1: 2}");

        let other: IntHashMap<u32> = IntHashMap::with_capacity(1024);
        assert!(map != other);
        assert!(other.put(1, 2).is_none());
        assert!(map == other);
        assert!(other.put(1, 3).is_some());
        assert!(map != other);
    }

    #[test]
    fn reclamation() {
        static INST_CNT: AtomicUsize = AtomicUsize::new(0);

        let map: IntHashMap<R> = IntHashMap::with_capacity(2);
        for key in 0..256 {
            assert!(map.put(key, R::new(&INST_CNT)).is_none());
        }
        for key in 0..128 {
            assert!(map.put(key, R::new(&INST_CNT)).is_some());
        }
        for key in 128..192 {
            assert!(map.remove(&key).is_some());
        }
        assert_eq!(map.len(), 192);
        map.clear();
        assert!(map.put(0, R::new(&INST_CNT)).is_none());
        drop(map);
        wait_for_reclamation(&INST_CNT);
    }

    #[test]
    fn keygen_iteration() {
        struct Item(i32);
        impl crate::KeySetter for Item {
            fn set_key(&mut self, key: i32) {
                self.0 = key;
            }
        }

        let map: KeygenMap<Item> = KeygenMap::new();
        for _ in 0..64 {
            map.add(Item(-1));
        }
        let mut keys = map.key_iter();
        assert_eq!(keys.by_ref().collect::<BTreeSet<_>>(), (0..64).collect());
        assert!(map.entry_iter().all(|(k, v)| k == v.0));
        assert_eq!(map.values().len(), 64);
        map.entry_set().clear();
        assert!(map.is_empty());
    }

    #[test]
    fn concurrent_readers() {
        let num_readers = 4;
        let stable = 64;
        let map: Arc<IntHashMap<i32>> = Arc::new(IntHashMap::with_capacity(2));
        for key in 0..stable {
            assert!(map.put(key, key).is_none());
        }
        let barrier = Arc::new(Barrier::new(num_readers + 1));
        let done = Arc::new(AtomicBool::new(false));
        let mut readers = Vec::new();
        for _ in 0..num_readers {
            let map = map.clone();
            let barrier = barrier.clone();
            let done = done.clone();
            readers.push(thread::spawn(move || {
                barrier.wait();
                let mut iter = map.key_iter();
                while !done.load(Acquire) {
                    for key in 0..stable {
                        assert_eq!(map.get(&key).map(|v| *v), Some(key));
                        assert!(map.contains_key(&key));
                        if let Some(v) = map.get(&(key + 1000)) {
                            assert_eq!(*v, key + 1000);
                        }
                    }
                    iter.rewind();
                    let seen: BTreeSet<i32> = iter.by_ref().collect();
                    assert!((0..stable).all(|k| seen.contains(&k)));
                }
            }));
        }

        barrier.wait();
        for _ in 0..16 {
            for key in 1000..1512 {
                assert!(map.put(key, key).is_none());
            }
            for key in 0..stable {
                assert!(map.put(key, key).is_some());
            }
            for key in 1000..1512 {
                assert!(map.remove(&key).is_some());
            }
            map.rehash();
        }
        done.store(true, Release);
        for reader in readers {
            assert!(reader.join().is_ok());
        }
        assert_eq!(map.len(), usize::try_from(stable).unwrap());
    }

    #[test]
    fn concurrent_counters() {
        let num_threads = 4;
        let num_iter = 256;
        let map = Arc::new(LongIntCounterMap::with_capacity(1));
        let barrier = Arc::new(Barrier::new(num_threads * 2));
        let mut threads = Vec::new();
        for _ in 0..num_threads {
            for increment in [true, false] {
                let map = map.clone();
                let barrier = barrier.clone();
                threads.push(thread::spawn(move || {
                    barrier.wait();
                    for _ in 0..num_iter {
                        for key in 0..16 {
                            if increment {
                                map.increment_one(key);
                                map.increment_one(key + 16);
                            } else {
                                map.decrement_one(key);
                            }
                        }
                    }
                }));
            }
        }
        for thread in threads {
            assert!(thread.join().is_ok());
        }
        assert!((0..16).all(|k| !map.contains_key(&k)));
        assert!((16..32).all(|k| map.get(&k) == Some(4 * 256)));
        assert_eq!(map.len(), 16);
    }

    proptest! {
        #[cfg_attr(miri, ignore)]
        #[test]
        fn lookup_matches_model(ops in prop::collection::vec((0_i32..64, any::<bool>(), any::<u16>()), 0..256)) {
            let map: IntHashMap<u16> = IntHashMap::with_capacity(2);
            let mut model = HashMap::new();
            for (key, insert, value) in ops {
                if insert {
                    prop_assert_eq!(map.put(key, value).map(|v| *v), model.insert(key, value));
                } else {
                    prop_assert_eq!(map.remove(&key).map(|v| *v), model.remove(&key));
                }
            }
            prop_assert_eq!(map.len(), model.len());
            for key in 0..64 {
                prop_assert_eq!(map.get(&key).map(|v| *v), model.get(&key).copied());
            }
        }

        #[cfg_attr(miri, ignore)]
        #[test]
        fn rehash_preserves_entries(keys in prop::collection::btree_set(any::<i32>(), 1..128)) {
            let map: IntHashMap<i32> = IntHashMap::with_capacity(4);
            let mut expected = BTreeMap::new();
            for key in keys {
                let capacity = map.capacity();
                assert!(map.put(key, key.wrapping_mul(3)).is_none());
                expected.insert(key, key.wrapping_mul(3));
                if map.capacity() != capacity {
                    prop_assert_eq!(map.capacity(), capacity * 2);
                }
                prop_assert_eq!(&entries(&map), &expected);
            }
        }

        #[cfg_attr(miri, ignore)]
        #[test]
        fn removal_keeps_chain_order(bucket in 0_i32..1024, len in 1_i32..8, target in 0_i32..8) {
            let map: IntHashMap<i32> = IntHashMap::with_capacity(1024);
            for i in 0..len {
                assert!(map.put(bucket + i * 1024, i).is_none());
            }
            let before: Vec<(i32, i32)> = map.entry_iter().map(|(k, v)| (k, *v)).collect();
            let removed = bucket + (target % len) * 1024;
            prop_assert!(map.remove(&removed).is_some());
            let after: Vec<(i32, i32)> = map.entry_iter().map(|(k, v)| (k, *v)).collect();
            let expected: Vec<(i32, i32)> = before.into_iter().filter(|(k, _)| *k != removed).collect();
            prop_assert_eq!(after, expected);
        }

        #[cfg_attr(miri, ignore)]
        #[test]
        fn zero_count_is_absent(ops in prop::collection::vec((0_i64..8, 1_i32..4, any::<bool>()), 0..256)) {
            let map = LongIntCounterMap::with_capacity(2);
            let mut model: HashMap<i64, i32> = HashMap::new();
            for (key, amount, increment) in ops {
                let count = if increment {
                    map.increment(key, amount)
                } else {
                    map.decrement(key, amount)
                };
                let expected = model.get(&key).copied().unwrap_or(0) + if increment { amount } else { -amount };
                prop_assert_eq!(count, Ok(expected));
                if expected == 0 {
                    model.remove(&key);
                } else {
                    model.insert(key, expected);
                }
                prop_assert_eq!(map.contains_key(&key), expected != 0);
            }
            prop_assert_eq!(map.len(), model.len());
        }

        #[cfg_attr(miri, ignore)]
        #[test]
        fn keygen_wraps(start_key in 0_i32..100, width in 1_i32..10, adds in 0_usize..50) {
            struct Item;
            impl crate::KeySetter for Item {
                fn set_key(&mut self, _key: i32) {}
            }

            let map: KeygenMap<Item> = KeygenMap::with_range(start_key, start_key + width).unwrap();
            let mut expected = start_key;
            for _ in 0..adds {
                prop_assert_eq!(map.add(Item), expected);
                expected = if expected + 1 == start_key + width { start_key } else { expected + 1 };
            }
            prop_assert_eq!(map.len(), adds.min(usize::try_from(width).unwrap()));
        }

        #[cfg_attr(miri, ignore)]
        #[test]
        fn rewind_repeats_scan(keys in prop::collection::vec(any::<i32>(), 0..128)) {
            let map: IntHashMap<i32> = IntHashMap::new();
            for key in keys {
                map.put(key, key);
            }
            let mut iter = map.entry_iter();
            let first: Vec<(i32, i32)> = iter.by_ref().map(|(k, v)| (k, *v)).collect();
            iter.rewind();
            let second: Vec<(i32, i32)> = iter.by_ref().map(|(k, v)| (k, *v)).collect();
            prop_assert_eq!(first.len(), map.len());
            prop_assert_eq!(first, second);
        }
    }
}
