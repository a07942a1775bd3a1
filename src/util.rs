//! Target-network synchronization.
use crate::model::ModelBase;
use log::trace;

/// Applies a soft update on the variables of a pair of models.
///
/// Variables are identified by their names.
///
/// dest = tau * src + (1.0 - tau) * dest
///
/// `tau = 1.0` degenerates to [`hard_update`]; `tau = 0.0` leaves `dest`
/// untouched.
pub fn track<M: ModelBase>(dest: &mut M, src: &mut M, tau: f64) {
    let src = &mut src.get_var_store().variables();
    let dest = &mut dest.get_var_store().variables();
    debug_assert_eq!(src.len(), dest.len());

    let names = src.keys();
    tch::no_grad(|| {
        for name in names {
            let src = src.get(name).unwrap();
            let dest = dest.get_mut(name).unwrap();
            dest.copy_(&(tau * src + (1.0 - tau) * &*dest));
        }
    });
    trace!("soft update");
}

/// Copies the variables of `src` into `dest` exactly.
///
/// Variables are identified by their names. This seeds a target network
/// with its live counterpart; gradient descent never writes a target store.
pub fn hard_update<M: ModelBase>(dest: &mut M, src: &mut M) {
    let src = &mut src.get_var_store().variables();
    let dest = &mut dest.get_var_store().variables();
    debug_assert_eq!(src.len(), dest.len());

    tch::no_grad(|| {
        for (name, src) in src.iter() {
            let dest = dest.get_mut(name).unwrap();
            dest.copy_(src);
        }
    });
    trace!("hard update");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::TryFrom;
    use crate::atoc::{Critic, CriticConfig, StateActionValueConfig};
    use crate::model::ModelBase;

    fn critic() -> Critic {
        let config = CriticConfig::default().q_config(StateActionValueConfig::new(4, 2, 8));
        Critic::build(config, tch::Device::Cpu).unwrap()
    }

    fn distance<M: ModelBase>(a: &M, b: &M) -> f32 {
        let va = a.get_var_store().variables();
        let vb = b.get_var_store().variables();
        let mut d = 0f32;
        for (name, ta) in va.iter() {
            let tb = vb.get(name).unwrap();
            d += f32::try_from((ta - tb).square().sum(tch::Kind::Float)).unwrap();
        }
        d.sqrt()
    }

    #[test]
    fn hard_update_makes_parameters_equal() {
        let mut src = critic();
        let mut dest = critic();
        assert!(distance(&dest, &src) > 0.0);

        hard_update(&mut dest, &mut src);
        assert_eq!(distance(&dest, &src), 0.0);
    }

    #[test]
    fn full_blend_equals_hard_update() {
        let mut src = critic();
        let mut dest = critic();

        track(&mut dest, &mut src, 1.0);
        assert_eq!(distance(&dest, &src), 0.0);
    }

    #[test]
    fn zero_blend_is_a_noop() {
        let mut src = critic();
        let mut dest = critic();
        let snapshot = dest.clone();

        track(&mut dest, &mut src, 0.0);
        assert_eq!(distance(&dest, &snapshot), 0.0);
    }

    #[test]
    fn repeated_soft_updates_approach_the_source() {
        let mut src = critic();
        let mut dest = critic();

        let mut prev = distance(&dest, &src);
        for _ in 0..5 {
            track(&mut dest, &mut src, 0.1);
            let d = distance(&dest, &src);
            assert!(d < prev);
            prev = d;
        }
    }
}
