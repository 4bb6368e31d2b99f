use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

/// Diameter utilization classes a per-species measurement is broken into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UtilizationClass {
    /// Trees below 7.5cm DBH.
    Small,
    /// All trees 7.5cm+.
    All,
    U75To125,
    U125To175,
    U175To225,
    Over225,
}

impl UtilizationClass {
    pub const ALL_CLASSES: [UtilizationClass; 6] = [
        UtilizationClass::Small,
        UtilizationClass::All,
        UtilizationClass::U75To125,
        UtilizationClass::U125To175,
        UtilizationClass::U175To225,
        UtilizationClass::Over225,
    ];

    /// The class code used in layer files: -1 for small, 0 for all, 1..=4 by band.
    pub fn code(self) -> i32 {
        match self {
            UtilizationClass::Small => -1,
            UtilizationClass::All => 0,
            UtilizationClass::U75To125 => 1,
            UtilizationClass::U125To175 => 2,
            UtilizationClass::U175To225 => 3,
            UtilizationClass::Over225 => 4,
        }
    }

    fn slot(self) -> usize {
        (self.code() + 1) as usize
    }
}

/// One value per utilization class.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UtilizationVector([f64; 6]);

impl UtilizationVector {
    pub fn new(values: [f64; 6]) -> Self {
        Self(values)
    }

    /// A vector with only the all-classes entry set.
    pub fn from_all(value: f64) -> Self {
        let mut v = Self::default();
        v[UtilizationClass::All] = value;
        v
    }

    pub fn all(&self) -> f64 {
        self[UtilizationClass::All]
    }

    pub fn values(&self) -> &[f64; 6] {
        &self.0
    }
}

impl Index<UtilizationClass> for UtilizationVector {
    type Output = f64;

    fn index(&self, uc: UtilizationClass) -> &f64 {
        &self.0[uc.slot()]
    }
}

impl IndexMut<UtilizationClass> for UtilizationVector {
    fn index_mut(&mut self, uc: UtilizationClass) -> &mut f64 {
        &mut self.0[uc.slot()]
    }
}

impl std::ops::Add for UtilizationVector {
    type Output = UtilizationVector;

    fn add(self, rhs: Self) -> Self::Output {
        let mut out = self;
        for (a, b) in out.0.iter_mut().zip(rhs.0.iter()) {
            *a += b;
        }
        out
    }
}

impl std::iter::Sum for UtilizationVector {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(UtilizationVector::default(), |acc, v| acc + v)
    }
}
