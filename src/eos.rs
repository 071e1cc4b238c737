//! Equation of state: specific volume of seawater.
//!
//! The vertical coordinate integrates `ρ₀ α h` per layer, so the interface
//! the model core needs from an equation of state is the specific volume
//! `α = 1/ρ` as a function of temperature, salinity, and pressure. The
//! built-in implementation is the linear Boussinesq form
//!
//! ```text
//! ρ = ρ₀ (1 - αT (T - Tref) + βS (S - Sref))
//! ```
//!
//! which is adequate for the idealized configurations this core is verified
//! against; a full nonlinear formulation (TEOS-10 polynomial) plugs in
//! through the same trait.

use crate::config::Config;
use crate::error::ConfigError;
use crate::types::constants::RHO0;

/// Specific volume `α(T, S, p)` in m³/kg.
pub trait SpecificVolume {
    fn specific_volume(&self, temperature: f64, salinity: f64, pressure: f64) -> f64;

    /// Fill `out` pointwise from equally-shaped tracer and pressure arrays.
    fn compute(&self, out: &mut [f64], temperature: &[f64], salinity: &[f64], pressure: &[f64]) {
        for i in 0..out.len() {
            out[i] = self.specific_volume(temperature[i], salinity[i], pressure[i]);
        }
    }
}

/// Linear Boussinesq equation of state.
#[derive(Clone, Copy, Debug)]
pub struct LinearEos {
    /// Reference density (kg/m³).
    pub rho0: f64,
    /// Thermal expansion coefficient (1/°C).
    pub alpha_t: f64,
    /// Haline contraction coefficient (1/PSU).
    pub beta_s: f64,
    /// Reference temperature (°C).
    pub t_ref: f64,
    /// Reference salinity (PSU).
    pub s_ref: f64,
}

impl Default for LinearEos {
    fn default() -> Self {
        Self {
            rho0: RHO0,
            alpha_t: 2.0e-4,
            beta_s: 8.0e-4,
            t_ref: 10.0,
            s_ref: 35.0,
        }
    }
}

impl LinearEos {
    /// Read coefficients from the `Eos` configuration group; any absent key
    /// falls back to the default coefficient.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let group = config.group("Eos")?;
        Ok(Self {
            rho0: group.opt_real("Rho0")?.unwrap_or(defaults.rho0),
            alpha_t: group.opt_real("AlphaT")?.unwrap_or(defaults.alpha_t),
            beta_s: group.opt_real("BetaS")?.unwrap_or(defaults.beta_s),
            t_ref: group.opt_real("TRef")?.unwrap_or(defaults.t_ref),
            s_ref: group.opt_real("SRef")?.unwrap_or(defaults.s_ref),
        })
    }

    /// A density-constant EOS (`α = 1/ρ₀` everywhere); the z-height scan
    /// then reduces to a plain thickness sum.
    pub fn constant() -> Self {
        Self {
            alpha_t: 0.0,
            beta_s: 0.0,
            ..Self::default()
        }
    }

    #[inline]
    pub fn density(&self, temperature: f64, salinity: f64) -> f64 {
        self.rho0
            * (1.0 - self.alpha_t * (temperature - self.t_ref)
                + self.beta_s * (salinity - self.s_ref))
    }
}

impl SpecificVolume for LinearEos {
    #[inline]
    fn specific_volume(&self, temperature: f64, salinity: f64, _pressure: f64) -> f64 {
        1.0 / self.density(temperature, salinity)
    }
}
