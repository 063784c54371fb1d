//! Tests for Pool

#[cfg(test)]
mod tests {
    use super::super::*;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Scratch {
        impulse: i32,
        touched: bool,
    }

    #[test]
    fn test_acquire_returns_reset_value() {
        let mut pool = Pool::<Scratch>::new();
        let key = pool.acquire();
        {
            let slot = pool.get_mut(key).unwrap();
            slot.impulse = 42;
            slot.touched = true;
        }
        pool.remove(key);

        // Reused slot must not leak the old state
        let reused = pool.acquire();
        assert_eq!(reused.index, key.index);
        assert_eq!(pool.get(reused), Some(&Scratch::default()));
    }

    #[test]
    fn test_stale_key_does_not_resolve() {
        let mut pool = Pool::<u32>::new();
        let old = pool.insert(1);
        pool.remove(old);
        let new = pool.insert(2);

        assert_eq!(old.index, new.index);
        assert_ne!(old.generation, new.generation);
        assert!(pool.get(old).is_none());
        assert!(pool.remove(old).is_none());
        assert_eq!(pool.get(new), Some(&2));
    }

    #[test]
    fn test_free_list_is_lifo() {
        let mut pool = Pool::<u32>::new();
        let keys: Vec<_> = (0..4).map(|i| pool.insert(i)).collect();
        pool.remove(keys[1]);
        pool.remove(keys[3]);

        assert_eq!(pool.insert(10).index, keys[3].index);
        assert_eq!(pool.insert(11).index, keys[1].index);
        assert_eq!(pool.insert(12).index, 4);
    }

    #[test]
    fn test_len_and_capacity_track_live_values() {
        let mut pool = Pool::<u32>::with_capacity(8);
        assert!(pool.is_empty());

        let a = pool.insert(1);
        let _b = pool.insert(2);
        assert_eq!(pool.len(), 2);

        pool.remove(a);
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.capacity(), 2);
        assert_eq!(pool.free_count(), 1);
    }

    #[test]
    fn test_iter_is_in_slot_order() {
        let mut pool = Pool::<char>::new();
        let a = pool.insert('a');
        pool.insert('b');
        pool.insert('c');
        pool.remove(a);
        pool.insert('d'); // lands in slot 0

        let items: Vec<_> = pool.iter().map(|(k, v)| (k.index, *v)).collect();
        assert_eq!(items, vec![(0, 'd'), (1, 'b'), (2, 'c')]);
    }

    #[test]
    fn test_release_by_index() {
        let mut pool = Pool::<u32>::new();
        let key = pool.insert(5);
        assert_eq!(pool.release(key.index), Some(5));
        assert_eq!(pool.release(key.index), None);
        assert!(pool.key_at(key.index).is_none());
    }

    #[test]
    fn test_next_key_predicts_insert() {
        let mut pool = Pool::<u32>::new();
        let predicted = pool.next_key();
        assert_eq!(pool.insert(5), predicted);

        let second = pool.insert(6);
        pool.remove(second);
        let predicted = pool.next_key();
        assert_eq!(predicted.index, second.index);
        assert_eq!(pool.insert(7), predicted);
    }

    #[test]
    fn test_get_pair_mut_borrows_both_slots() {
        let mut pool = Pool::<u32>::new();
        let a = pool.insert(1);
        let b = pool.insert(2);

        let (x, y) = pool.get_pair_mut(b.index, a.index).unwrap();
        assert_eq!((*x, *y), (2, 1));
        *x += 10;
        *y += 20;
        assert_eq!(pool.get(a), Some(&21));
        assert_eq!(pool.get(b), Some(&12));

        assert!(pool.get_pair_mut(a.index, a.index).is_none());
        pool.remove(b);
        assert!(pool.get_pair_mut(a.index, b.index).is_none());
    }

    #[test]
    fn test_randomized_insert_remove_keeps_counts_consistent() {
        let mut rng = fastrand::Rng::with_seed(1234);
        let mut pool = Pool::<u64>::new();
        let mut live = Vec::new();

        for step in 0..2000u64 {
            if live.is_empty() || rng.bool() {
                live.push(pool.insert(step));
            } else {
                let idx = rng.usize(..live.len());
                let key = live.swap_remove(idx);
                assert!(pool.remove(key).is_some());
            }
            assert_eq!(pool.len(), live.len());
        }
        for key in &live {
            assert!(pool.contains(*key));
        }
        assert_eq!(pool.iter().count(), live.len());
    }
}
