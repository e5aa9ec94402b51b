// Copyright (C) 2026 The Hemolink Authors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Blood types and donor compatibility.
//!
//! Compatibility is derived from a single rule over red cell antigens:
//! a donor may give to a recipient when every ABO antigen the donor carries
//! is also carried by the recipient, and an Rh-positive donor only gives to
//! an Rh-positive recipient. Both directions of the table are computed from
//! [`can_donate_to`]; nothing else encodes compatibility.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

/// ABO antigen bit for the A antigen.
const ANTIGEN_A: u8 = 0b01;
/// ABO antigen bit for the B antigen.
const ANTIGEN_B: u8 = 0b10;

/// One of the eight ABO/Rh blood types.
///
/// Ordering follows declaration order, which puts the universal donor first
/// and the universal recipient last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BloodType {
    /// O negative, the universal donor.
    #[serde(rename = "O-")]
    ONegative,
    /// O positive.
    #[serde(rename = "O+")]
    OPositive,
    /// A negative.
    #[serde(rename = "A-")]
    ANegative,
    /// A positive.
    #[serde(rename = "A+")]
    APositive,
    /// B negative.
    #[serde(rename = "B-")]
    BNegative,
    /// B positive.
    #[serde(rename = "B+")]
    BPositive,
    /// AB negative.
    #[serde(rename = "AB-")]
    AbNegative,
    /// AB positive, the universal recipient.
    #[serde(rename = "AB+")]
    AbPositive,
}

impl BloodType {
    /// All blood types in canonical order.
    pub const ALL: [Self; 8] = [
        Self::ONegative,
        Self::OPositive,
        Self::ANegative,
        Self::APositive,
        Self::BNegative,
        Self::BPositive,
        Self::AbNegative,
        Self::AbPositive,
    ];

    /// Returns the conventional label, e.g. `"AB+"`.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ONegative => "O-",
            Self::OPositive => "O+",
            Self::ANegative => "A-",
            Self::APositive => "A+",
            Self::BNegative => "B-",
            Self::BPositive => "B+",
            Self::AbNegative => "AB-",
            Self::AbPositive => "AB+",
        }
    }

    const fn abo_antigens(self) -> u8 {
        match self {
            Self::ONegative | Self::OPositive => 0,
            Self::ANegative | Self::APositive => ANTIGEN_A,
            Self::BNegative | Self::BPositive => ANTIGEN_B,
            Self::AbNegative | Self::AbPositive => ANTIGEN_A | ANTIGEN_B,
        }
    }

    const fn is_rh_positive(self) -> bool {
        matches!(
            self,
            Self::OPositive | Self::APositive | Self::BPositive | Self::AbPositive
        )
    }
}

impl FromStr for BloodType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s.trim().to_uppercase();
        Self::ALL
            .into_iter()
            .find(|blood_type| blood_type.as_str() == normalized)
            .ok_or_else(|| DomainError::InvalidBloodType(s.to_string()))
    }
}

impl std::fmt::Display for BloodType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Returns whether blood of type `donor` can be given to a `recipient`.
#[must_use]
pub const fn can_donate_to(donor: BloodType, recipient: BloodType) -> bool {
    let foreign_antigens: u8 = donor.abo_antigens() & !recipient.abo_antigens();
    foreign_antigens == 0 && (!donor.is_rh_positive() || recipient.is_rh_positive())
}

/// Returns every donor type a recipient of `recipient` can receive from.
///
/// The result always contains `O-` and the recipient's own type.
#[must_use]
pub fn compatible_donor_types(recipient: BloodType) -> BTreeSet<BloodType> {
    BloodType::ALL
        .into_iter()
        .filter(|donor| can_donate_to(*donor, recipient))
        .collect()
}

/// Returns every recipient type a donor of `donor` can give to.
#[must_use]
pub fn compatible_recipient_types(donor: BloodType) -> BTreeSet<BloodType> {
    BloodType::ALL
        .into_iter()
        .filter(|recipient| can_donate_to(donor, *recipient))
        .collect()
}
