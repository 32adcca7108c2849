//! Typed quantities: a value carried together with its unit tag.
//!
//! Conversions go through SI and are explicit (`to`), so a value read in nanometres can
//! never be silently mixed with one in metres.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;

pub const DALTON_KG: f64 = 1.660_539_066_60e-27;
pub const CALORIE_J: f64 = 4.184;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LengthUnit {
    Meter,
    Nanometer,
    Angstrom,
}

impl LengthUnit {
    pub fn in_meters(self) -> f64 {
        match self {
            LengthUnit::Meter => 1.0,
            LengthUnit::Nanometer => 1.0e-9,
            LengthUnit::Angstrom => 1.0e-10,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            LengthUnit::Meter => "m",
            LengthUnit::Nanometer => "nm",
            LengthUnit::Angstrom => "Å",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MassUnit {
    Kilogram,
    Dalton,
}

impl MassUnit {
    pub fn in_kilograms(self) -> f64 {
        match self {
            MassUnit::Kilogram => 1.0,
            MassUnit::Dalton => DALTON_KG,
        }
    }
}

/// Molar energy units. Per-molecule values enter through [`Energy::from_molecular_joules`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnergyUnit {
    JoulePerMole,
    KilojoulePerMole,
    KilocaloriePerMole,
}

impl EnergyUnit {
    pub fn in_joules_per_mole(self) -> f64 {
        match self {
            EnergyUnit::JoulePerMole => 1.0,
            EnergyUnit::KilojoulePerMole => 1.0e3,
            EnergyUnit::KilocaloriePerMole => 1.0e3 * CALORIE_J,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            EnergyUnit::JoulePerMole => "J/mol",
            EnergyUnit::KilojoulePerMole => "kJ/mol",
            EnergyUnit::KilocaloriePerMole => "kcal/mol",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Length {
    value: f64,
    unit: LengthUnit,
}

impl Length {
    pub fn new(value: f64, unit: LengthUnit) -> Self {
        Self { value, unit }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn to(self, unit: LengthUnit) -> Self {
        Self {
            value: self.value * self.unit.in_meters() / unit.in_meters(),
            unit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mass {
    value: f64,
    unit: MassUnit,
}

impl Mass {
    pub fn new(value: f64, unit: MassUnit) -> Self {
        Self { value, unit }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn to(self, unit: MassUnit) -> Self {
        Self {
            value: self.value * self.unit.in_kilograms() / unit.in_kilograms(),
            unit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Energy {
    value: f64,
    unit: EnergyUnit,
}

impl Energy {
    pub fn new(value: f64, unit: EnergyUnit) -> Self {
        Self { value, unit }
    }

    /// Energy of a single molecule in joules, scaled to one mole.
    pub fn from_molecular_joules(joules: f64, avogadro: f64) -> Self {
        Self {
            value: joules * avogadro,
            unit: EnergyUnit::JoulePerMole,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn unit(&self) -> EnergyUnit {
        self.unit
    }

    pub fn to(self, unit: EnergyUnit) -> Self {
        Self {
            value: self.value * self.unit.in_joules_per_mole() / unit.in_joules_per_mole(),
            unit,
        }
    }
}

impl Add for Energy {
    type Output = Energy;

    /// The result carries the unit of the left operand.
    fn add(self, rhs: Energy) -> Energy {
        Energy::new(self.value + rhs.to(self.unit).value, self.unit)
    }
}

impl fmt::Display for Energy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match f.precision() {
            Some(p) => write!(f, "{:.*} {}", p, self.value, self.unit.symbol()),
            None => write!(f, "{} {}", self.value, self.unit.symbol()),
        }
    }
}

/// Factor turning a mass-weighted squared length (mass·length²) into SI (kg·m²).
pub fn mass_length_squared_to_si(mass: MassUnit, length: LengthUnit) -> f64 {
    let metres = Length::new(1.0, length).to(LengthUnit::Meter).value();
    Mass::new(1.0, mass).to(MassUnit::Kilogram).value() * metres * metres
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn length_conversions() {
        let l = Length::new(1.5, LengthUnit::Nanometer);
        assert_relative_eq!(l.to(LengthUnit::Angstrom).value(), 15.0, epsilon = 1e-12);
        assert_relative_eq!(l.to(LengthUnit::Meter).value(), 1.5e-9, max_relative = 1e-12);
    }

    #[test]
    fn energy_addition_keeps_left_unit() {
        let a = Energy::new(1.0, EnergyUnit::KilocaloriePerMole);
        let b = Energy::new(4.184, EnergyUnit::KilojoulePerMole);
        let sum = a + b;
        assert_eq!(sum.unit(), EnergyUnit::KilocaloriePerMole);
        assert_relative_eq!(sum.value(), 2.0, epsilon = 1e-12);
        assert_relative_eq!((b + a).value(), 8.368, epsilon = 1e-12);
    }

    #[test]
    fn molecular_joules_to_kj_per_mol() {
        let e = Energy::from_molecular_joules(1.0e-21, 6.022_140_76e23);
        assert_relative_eq!(
            e.to(EnergyUnit::KilojoulePerMole).value(),
            0.602_214_076,
            max_relative = 1e-12
        );
    }

    #[test]
    fn dalton_nm2_in_si() {
        assert_relative_eq!(
            mass_length_squared_to_si(MassUnit::Dalton, LengthUnit::Nanometer),
            DALTON_KG * 1.0e-18,
            max_relative = 1e-12
        );
    }

    #[test]
    fn display_honours_precision() {
        let e = Energy::new(-12.345_67, EnergyUnit::KilojoulePerMole);
        assert_eq!(format!("{e:.2}"), "-12.35 kJ/mol");
    }
}
