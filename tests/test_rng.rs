// Tests for RNG reproducibility and distribution.

use neural_graph::utils::SimpleRng;

mod tests {
    use super::*;

    #[test]
    fn test_rng_same_seed_produces_same_sequence() {
        let mut a = SimpleRng::new(12345);
        let mut b = SimpleRng::new(12345);
        for _ in 0..100 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn test_rng_different_seeds_produce_different_sequences() {
        let mut a = SimpleRng::new(1);
        let mut b = SimpleRng::new(2);
        let same = (0..100).filter(|_| a.next_u64() == b.next_u64()).count();
        assert!(same < 5);
    }

    #[test]
    fn test_rng_zero_seed_uses_default() {
        let mut zero = SimpleRng::new(0);
        let mut fallback = SimpleRng::new(0x9e3779b97f4a7c15);
        assert_eq!(zero.next_u64(), fallback.next_u64());
    }

    #[test]
    fn test_rng_clone_continues_identically() {
        let mut rng = SimpleRng::new(77);
        rng.next_u64();
        let mut copy = rng.clone();
        assert_eq!(rng.next_f64(), copy.next_f64());
    }

    #[test]
    fn test_next_f64_range() {
        let mut rng = SimpleRng::new(42);
        for _ in 0..10_000 {
            let value = rng.next_f64();
            assert!((0.0..1.0).contains(&value));
        }
    }

    #[test]
    fn test_rng_mean_convergence_f64() {
        let mut rng = SimpleRng::new(2024);
        let n = 20_000;
        let mean = (0..n).map(|_| rng.next_f64()).sum::<f64>() / n as f64;
        assert!((mean - 0.5).abs() < 0.02, "mean {mean}");
    }

    #[test]
    fn test_gen_range_f64_within_bounds() {
        let mut rng = SimpleRng::new(9);
        for _ in 0..1000 {
            let value = rng.gen_range_f64(-0.5, 0.25);
            assert!((-0.5..0.25).contains(&value));
        }
    }

    #[test]
    fn test_reseed_from_time_changes_state() {
        let mut rng = SimpleRng::new(5);
        let mut reference = SimpleRng::new(5);
        rng.reseed_from_time();
        assert_ne!(rng.next_u64(), reference.next_u64());
    }
}
