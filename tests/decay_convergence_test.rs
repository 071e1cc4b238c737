//! Temporal convergence of the explicit steppers.
//!
//! A linear decay `du/dt = -c u` injected through the custom-tendency hook
//! has the exact solution `u0 exp(-c t)`, so the observed order of each
//! stepper can be measured directly: first order for forward-backward,
//! second for the midpoint scheme, fourth for classical RK4.

use fvom_rs::{
    AuxiliaryState, Config, CustomTendency, GlobalMesh, LocalMesh, OceanState, Tendencies,
    TendencyConfig, TimeLevel, VerticalCoord,
};
use fvom_rs::time::{forward_backward_step, rk2_step, rk4_step, Comm};
use fvom_rs::vertical::MovementProfile;

const U0: f64 = 0.4;
const RATE: f64 = 1.0;
const T_FINAL: f64 = 1.0;

struct Decay {
    rate: f64,
}

impl CustomTendency for Decay {
    fn velocity(
        &self,
        tendency: &mut [f64],
        _mesh: &LocalMesh,
        _coord: &VerticalCoord,
        state: &OceanState,
        level: TimeLevel,
        _time: f64,
    ) {
        let u = state.normal_velocity(level);
        for (t, &u) in tendency.iter_mut().zip(u) {
            *t -= self.rate * u;
        }
    }
}

type Step = fn(
    &LocalMesh,
    &VerticalCoord,
    &mut AuxiliaryState,
    &mut Tendencies,
    &mut OceanState,
    f64,
    f64,
    Comm<'_>,
) -> Result<(), fvom_rs::HaloError>;

/// Integrate the decay problem with `n_steps` and return the final error.
fn decay_error(step: Step, n_steps: usize) -> f64 {
    let global = GlobalMesh::periodic_quad(4, 4, 1000.0, 1000.0, 1);
    let mesh = LocalMesh::serial(&global);
    let coord = VerticalCoord::new(&mesh, MovementProfile::Uniform, vec![100.0]);
    let mut aux = AuxiliaryState::new(&mesh, &Config::empty(), 1).unwrap();
    let mut tend = Tendencies::new(&mesh, TendencyConfig::disabled(), 1);
    tend.set_custom(Box::new(Decay { rate: RATE }));

    let mut state = OceanState::new(&mesh, &["Temperature"]);
    state.layer_thickness_mut(TimeLevel::Cur).fill(100.0);
    state.normal_velocity_mut(TimeLevel::Cur).fill(U0);

    let dt = T_FINAL / n_steps as f64;
    let mut time = 0.0;
    for _ in 0..n_steps {
        step(&mesh, &coord, &mut aux, &mut tend, &mut state, time, dt, None).unwrap();
        time += dt;
    }

    let exact = U0 * (-RATE * T_FINAL).exp();
    (state.normal_velocity(TimeLevel::Cur)[0] - exact).abs()
}

fn observed_order(step: Step, coarse_steps: usize) -> f64 {
    let coarse = decay_error(step, coarse_steps);
    let fine = decay_error(step, 2 * coarse_steps);
    (coarse / fine).log2()
}

#[test]
fn test_forward_backward_is_first_order() {
    let order = observed_order(forward_backward_step, 32);
    assert!(
        (0.8..1.2).contains(&order),
        "forward-backward observed order {order:.2}"
    );
}

#[test]
fn test_rk2_is_second_order() {
    let order = observed_order(rk2_step, 16);
    assert!((1.8..2.2).contains(&order), "rk2 observed order {order:.2}");
}

#[test]
fn test_rk4_is_fourth_order() {
    let order = observed_order(rk4_step, 4);
    assert!((3.7..4.4).contains(&order), "rk4 observed order {order:.2}");
}

#[test]
fn test_custom_hooks_cover_all_three_equations() {
    // A hook that forces each equation with a constant must show up in all
    // three prognostic fields after one step.
    struct Constant;
    impl CustomTendency for Constant {
        fn thickness(
            &self,
            tendency: &mut [f64],
            _mesh: &LocalMesh,
            _coord: &VerticalCoord,
            _state: &OceanState,
            _level: TimeLevel,
            _time: f64,
        ) {
            tendency.iter_mut().for_each(|t| *t += 1.0);
        }
        fn velocity(
            &self,
            tendency: &mut [f64],
            _mesh: &LocalMesh,
            _coord: &VerticalCoord,
            _state: &OceanState,
            _level: TimeLevel,
            _time: f64,
        ) {
            tendency.iter_mut().for_each(|t| *t += 2.0);
        }
        fn tracers(
            &self,
            tendency: &mut [f64],
            _mesh: &LocalMesh,
            _coord: &VerticalCoord,
            _state: &OceanState,
            _level: TimeLevel,
            _time: f64,
        ) {
            tendency.iter_mut().for_each(|t| *t += 3.0);
        }
    }

    let global = GlobalMesh::periodic_quad(4, 4, 1000.0, 1000.0, 1);
    let mesh = LocalMesh::serial(&global);
    let coord = VerticalCoord::new(&mesh, MovementProfile::Uniform, vec![100.0]);
    let mut aux = AuxiliaryState::new(&mesh, &Config::empty(), 1).unwrap();
    let mut tend = Tendencies::new(&mesh, TendencyConfig::disabled(), 1);
    tend.set_custom(Box::new(Constant));

    let mut state = OceanState::new(&mesh, &["Temperature"]);
    state.layer_thickness_mut(TimeLevel::Cur).fill(100.0);
    state.tracer_mut(TimeLevel::Cur, 0).fill(10.0);

    forward_backward_step(&mesh, &coord, &mut aux, &mut tend, &mut state, 0.0, 1.0, None).unwrap();

    let h = state.layer_thickness(TimeLevel::Cur)[0];
    let u = state.normal_velocity(TimeLevel::Cur)[0];
    let phi = state.tracer(TimeLevel::Cur, 0)[0];
    assert!((h - 101.0).abs() < 1e-12, "thickness hook missing: {h}");
    assert!((u - 2.0).abs() < 1e-12, "velocity hook missing: {u}");
    // phi_new = (h phi + dt * 3) / h_new = (1000 + 3) / 101
    assert!((phi - 1003.0 / 101.0).abs() < 1e-12, "tracer hook missing: {phi}");
}
