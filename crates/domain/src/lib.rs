// Copyright (C) 2026 The Hemolink Authors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod blood_type;
mod error;
mod fulfillment;
mod status;
mod types;
mod validation;

#[cfg(test)]
mod tests;

pub use blood_type::{
    BloodType, can_donate_to, compatible_donor_types, compatible_recipient_types,
};
pub use error::DomainError;
pub use fulfillment::{Fulfillment, apply_offer};
pub use status::{DonationStatus, RequestStatus};
pub use types::{
    BloodRequest, DonationId, DonationRecord, NewBloodRequest, NewDonation, RequestId, Role,
    Urgency, UserId, UserProfile,
};
pub use validation::{
    parse_iso_date, validate_new_request, validate_profile_fields, validate_units,
};
