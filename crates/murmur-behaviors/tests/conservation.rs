//! Invariants of the grid and vector behaviors under random inputs.

use murmur_behavior::BehaviorSpec;
use murmur_behaviors::{Attach, Clamp, Decay, Diffusion};
use murmur_core::{GridGeometry, Parameter};
use murmur_test_utils::MockWorld;
use proptest::prelude::*;

fn grid_values() -> impl Strategy<Value = (usize, usize, Vec<f32>)> {
    (1usize..7, 1usize..7).prop_flat_map(|(nx, ny)| {
        (
            Just(nx),
            Just(ny),
            prop::collection::vec(0.0f32..10.0, nx * ny),
        )
    })
}

proptest! {
    #[test]
    fn diffusion_conserves_mass((nx, ny, values) in grid_values(), rate in 0.0f32..0.25) {
        let mut w = MockWorld::new();
        let env = w.add_agent("env");
        let geometry =
            GridGeometry::new(1, &[nx, ny], &[0.0, 0.0], &[nx as f32, ny as f32]).unwrap();
        let heat = w.add_param(env, Parameter::grid("heat", geometry, &[0.0]).unwrap());
        w.set(heat, &values);
        let spec = BehaviorSpec::new("diffusion", "spread", "heat", "heat")
            .with_param("rate", vec![rate]);
        let b = Diffusion::attach(&spec, &mut w.attach_context(env)).unwrap();

        let before: f32 = values.iter().sum();
        for _ in 0..3 {
            w.act(env, &b).unwrap();
            w.flush(env);
        }
        let after: f32 = w.value(heat).iter().sum();
        prop_assert!((after - before).abs() <= 1e-3 * before.max(1.0));
        // Within the stable step the field stays within its initial range.
        let max = values.iter().cloned().fold(0.0, f32::max);
        prop_assert!(w.value(heat).iter().all(|&v| v >= -1e-4 && v <= max + 1e-4));
    }

    #[test]
    fn clamp_bounds_whatever_was_staged(
        staged in prop::collection::vec(-100.0f32..100.0, 3),
        lo in -10.0f32..0.0,
        width in 0.0f32..10.0,
    ) {
        let mut w = MockWorld::new();
        let a = w.add_agent("a");
        let x = w.add_param(a, Parameter::new("x", staged.clone()));
        let spec = BehaviorSpec::new("clamp", "bound", "", "x")
            .with_param("min", vec![lo; 3])
            .with_param("max", vec![lo + width; 3]);
        let b = Clamp::attach(&spec, &mut w.attach_context(a)).unwrap();
        w.act(a, &b).unwrap();
        for (&v, &s) in w.staged(x).iter().zip(&staged) {
            prop_assert!(v >= lo && v <= lo + width);
            if s >= lo && s <= lo + width {
                prop_assert_eq!(v, s);
            }
        }
    }

    #[test]
    fn decay_shrinks_toward_zero(
        values in prop::collection::vec(-50.0f32..50.0, 1..4),
        rate in 0.0f32..1.0,
    ) {
        let mut w = MockWorld::new();
        let a = w.add_agent("a");
        let energy = w.add_param(a, Parameter::new("energy", values.clone()));
        let spec = BehaviorSpec::new("decay", "fade", "energy", "energy")
            .with_param("rate", vec![rate; values.len()]);
        let b = Decay::attach(&spec, &mut w.attach_context(a)).unwrap();
        w.act(a, &b).unwrap();
        for (&v, &before) in w.staged(energy).iter().zip(&values) {
            prop_assert!(v.abs() <= before.abs());
            prop_assert!(v * before >= 0.0);
        }
    }
}
