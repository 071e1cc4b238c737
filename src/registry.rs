//! Named-instance registries and the model context.
//!
//! Aggregates (decompositions, vertical coordinates, auxiliary states,
//! tendency bundles) are create-by-name, retrieve-by-name, destroy-by-name
//! objects. Rather than process-wide mutable maps, all named instances live
//! in a [`ModelContext`] the driver constructs once and passes by reference
//! through the call graph; the name `"Default"` is distinguished and used
//! when stepping without an explicit name.
//!
//! [`FieldRegistry`] is the metadata side: components register their output
//! arrays (units, valid range, fill value) for the benefit of an I/O layer.
//! Numerical correctness never depends on registration, but duplicate or
//! missing names are contract violations and error loudly.

use std::collections::HashMap;

use crate::aux::AuxiliaryState;
use crate::decomp::Decomp;
use crate::error::RegistryError;
use crate::tendency::Tendencies;
use crate::vertical::VerticalCoord;

/// The distinguished instance name.
pub const DEFAULT_NAME: &str = "Default";

/// Descriptive metadata for one registered output field.
#[derive(Clone, Debug)]
pub struct FieldMetadata {
    pub name: String,
    pub description: String,
    pub units: String,
    pub valid_min: f64,
    pub valid_max: f64,
    pub fill_value: f64,
}

impl FieldMetadata {
    pub fn new(name: &str, description: &str, units: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            units: units.to_string(),
            valid_min: f64::NEG_INFINITY,
            valid_max: f64::INFINITY,
            fill_value: -9.99e30,
        }
    }

    pub fn with_range(mut self, valid_min: f64, valid_max: f64) -> Self {
        self.valid_min = valid_min;
        self.valid_max = valid_max;
        self
    }
}

/// Field-metadata registry for the I/O layer.
#[derive(Debug, Default)]
pub struct FieldRegistry {
    fields: HashMap<String, FieldMetadata>,
}

impl FieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one field; re-defining a name is an error.
    pub fn define(&mut self, metadata: FieldMetadata) -> Result<(), RegistryError> {
        if self.fields.contains_key(&metadata.name) {
            return Err(RegistryError::AlreadyExists {
                kind: "field",
                name: metadata.name,
            });
        }
        self.fields.insert(metadata.name.clone(), metadata);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&FieldMetadata, RegistryError> {
        self.fields.get(name).ok_or_else(|| RegistryError::NotFound {
            kind: "field",
            name: name.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Drop a field definition (aggregate teardown).
    pub fn remove(&mut self, name: &str) -> Result<FieldMetadata, RegistryError> {
        self.fields.remove(name).ok_or_else(|| RegistryError::NotFound {
            kind: "field",
            name: name.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn insert_named<T>(
    map: &mut HashMap<String, T>,
    kind: &'static str,
    name: &str,
    value: T,
) -> Result<(), RegistryError> {
    if map.contains_key(name) {
        return Err(RegistryError::AlreadyExists {
            kind,
            name: name.to_string(),
        });
    }
    map.insert(name.to_string(), value);
    Ok(())
}

fn get_named<'a, T>(
    map: &'a HashMap<String, T>,
    kind: &'static str,
    name: &str,
) -> Result<&'a T, RegistryError> {
    map.get(name).ok_or_else(|| RegistryError::NotFound {
        kind,
        name: name.to_string(),
    })
}

fn get_named_mut<'a, T>(
    map: &'a mut HashMap<String, T>,
    kind: &'static str,
    name: &str,
) -> Result<&'a mut T, RegistryError> {
    map.get_mut(name).ok_or_else(|| RegistryError::NotFound {
        kind,
        name: name.to_string(),
    })
}

fn remove_named<T>(
    map: &mut HashMap<String, T>,
    kind: &'static str,
    name: &str,
) -> Result<T, RegistryError> {
    map.remove(name).ok_or_else(|| RegistryError::NotFound {
        kind,
        name: name.to_string(),
    })
}

/// Owner of all named aggregates for one model run.
#[derive(Debug, Default)]
pub struct ModelContext {
    decomps: HashMap<String, Decomp>,
    vert_coords: HashMap<String, VerticalCoord>,
    aux_states: HashMap<String, AuxiliaryState>,
    tendencies: HashMap<String, Tendencies>,
    pub fields: FieldRegistry,
}

impl ModelContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_decomp(&mut self, name: &str, decomp: Decomp) -> Result<(), RegistryError> {
        insert_named(&mut self.decomps, "decomposition", name, decomp)
    }

    pub fn decomp(&self, name: &str) -> Result<&Decomp, RegistryError> {
        get_named(&self.decomps, "decomposition", name)
    }

    pub fn remove_decomp(&mut self, name: &str) -> Result<Decomp, RegistryError> {
        remove_named(&mut self.decomps, "decomposition", name)
    }

    pub fn add_vert_coord(&mut self, name: &str, coord: VerticalCoord) -> Result<(), RegistryError> {
        insert_named(&mut self.vert_coords, "vertical coordinate", name, coord)
    }

    pub fn vert_coord(&self, name: &str) -> Result<&VerticalCoord, RegistryError> {
        get_named(&self.vert_coords, "vertical coordinate", name)
    }

    pub fn vert_coord_mut(&mut self, name: &str) -> Result<&mut VerticalCoord, RegistryError> {
        get_named_mut(&mut self.vert_coords, "vertical coordinate", name)
    }

    pub fn remove_vert_coord(&mut self, name: &str) -> Result<VerticalCoord, RegistryError> {
        remove_named(&mut self.vert_coords, "vertical coordinate", name)
    }

    pub fn add_aux_state(&mut self, name: &str, aux: AuxiliaryState) -> Result<(), RegistryError> {
        insert_named(&mut self.aux_states, "auxiliary state", name, aux)
    }

    pub fn aux_state(&self, name: &str) -> Result<&AuxiliaryState, RegistryError> {
        get_named(&self.aux_states, "auxiliary state", name)
    }

    pub fn aux_state_mut(&mut self, name: &str) -> Result<&mut AuxiliaryState, RegistryError> {
        get_named_mut(&mut self.aux_states, "auxiliary state", name)
    }

    pub fn remove_aux_state(&mut self, name: &str) -> Result<AuxiliaryState, RegistryError> {
        remove_named(&mut self.aux_states, "auxiliary state", name)
    }

    pub fn add_tendencies(&mut self, name: &str, tend: Tendencies) -> Result<(), RegistryError> {
        insert_named(&mut self.tendencies, "tendency bundle", name, tend)
    }

    pub fn tendencies(&self, name: &str) -> Result<&Tendencies, RegistryError> {
        get_named(&self.tendencies, "tendency bundle", name)
    }

    pub fn tendencies_mut(&mut self, name: &str) -> Result<&mut Tendencies, RegistryError> {
        get_named_mut(&mut self.tendencies, "tendency bundle", name)
    }

    pub fn remove_tendencies(&mut self, name: &str) -> Result<Tendencies, RegistryError> {
        remove_named(&mut self.tendencies, "tendency bundle", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_registry_rejects_duplicates() {
        let mut registry = FieldRegistry::new();
        registry
            .define(FieldMetadata::new("KineticEnergyCell", "kinetic energy", "m^2 s^-2"))
            .unwrap();
        let err = registry
            .define(FieldMetadata::new("KineticEnergyCell", "again", "m^2 s^-2"))
            .unwrap_err();
        assert!(matches!(err, RegistryError::AlreadyExists { .. }));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_field_metadata_range() {
        let meta = FieldMetadata::new("LayerThickness", "layer thickness", "m")
            .with_range(0.0, 12000.0);
        assert_eq!(meta.valid_min, 0.0);
        assert_eq!(meta.valid_max, 12000.0);
    }

    #[test]
    fn test_missing_name_errors_with_kind_and_name() {
        let context = ModelContext::new();
        let err = context.decomp("Default").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("decomposition"), "message was: {msg}");
        assert!(msg.contains("Default"), "message was: {msg}");
    }

    #[test]
    fn test_remove_then_get_fails() {
        let mut registry = FieldRegistry::new();
        registry
            .define(FieldMetadata::new("RelVortVertex", "relative vorticity", "s^-1"))
            .unwrap();
        registry.remove("RelVortVertex").unwrap();
        assert!(registry.get("RelVortVertex").is_err());
    }
}
