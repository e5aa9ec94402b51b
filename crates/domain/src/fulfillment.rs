// Copyright (C) 2026 The Hemolink Authors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Pure computation of the request-side effect of a donation offer.
//!
//! The store executes this inside its compare-and-update loop, so the
//! input is always the request as read at transaction time.

use crate::error::DomainError;
use crate::status::RequestStatus;
use crate::types::{BloodRequest, UserId};

/// The request fields an accepted offer writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fulfillment {
    /// Quantity before the offer.
    pub previous_quantity: u32,
    /// Quantity after the offer, clamped at zero.
    pub new_quantity: u32,
    /// Status after the offer. `Matched` once nothing remains.
    pub new_status: RequestStatus,
    /// Donor list after the offer.
    pub matched_donors: Vec<UserId>,
    /// Units beyond the remaining need. Discarded, not tracked.
    pub surplus_units: u32,
}

/// Applies an offer of `units` from `donor_id` to `request`.
///
/// Units exceeding the remaining need are discarded. The donor is appended
/// to `matched_donors` unless already present.
///
/// # Errors
///
/// Returns `DomainError::RequestNotOpen` if the request no longer accepts
/// offers.
pub fn apply_offer(
    request: &BloodRequest,
    donor_id: &UserId,
    units: u32,
) -> Result<Fulfillment, DomainError> {
    if !request.status.accepts_offers() {
        return Err(DomainError::RequestNotOpen {
            request_id: request.request_id,
            status: request.status,
        });
    }

    let new_quantity: u32 = request.quantity.saturating_sub(units);
    let surplus_units: u32 = units.saturating_sub(request.quantity);
    let new_status: RequestStatus = if new_quantity == 0 {
        RequestStatus::Matched
    } else {
        request.status
    };

    let mut matched_donors: Vec<UserId> = request.matched_donors.clone();
    if !matched_donors.contains(donor_id) {
        matched_donors.push(donor_id.clone());
    }

    Ok(Fulfillment {
        previous_quantity: request.quantity,
        new_quantity,
        new_status,
        matched_donors,
        surplus_units,
    })
}
