// Copyright (C) 2026 The Hemolink Authors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Dashboard statistics read model.

use crate::error::CoreError;
use crate::store::DonationStore;
use hemolink_domain::{BloodRequest, BloodType, Role, UserProfile};
use std::collections::BTreeMap;
use time::Month;

/// Requests raised in one calendar month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyRequests {
    /// Calendar year.
    pub year: i32,
    /// Calendar month.
    pub month: Month,
    /// Requests created in the month.
    pub requests: u32,
    /// Of those, requests now matched or completed.
    pub fulfilled: u32,
}

impl MonthlyRequests {
    /// Returns a short label such as `Mar 2026`.
    #[must_use]
    pub fn label(&self) -> String {
        let month: String = self.month.to_string().chars().take(3).collect();
        format!("{month} {}", self.year)
    }
}

/// Aggregate figures for the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardStats {
    /// Profiles with the donor role.
    pub total_donors: u32,
    /// Profiles with the recipient role.
    pub total_recipients: u32,
    /// Requests in any status.
    pub total_requests: u32,
    /// Requests now matched or completed.
    pub fulfilled_requests: u32,
    /// Fulfilled requests as a percentage of all requests. Zero when there are none.
    pub success_rate: f64,
    /// Donors per blood type. Every type is present.
    pub blood_type_distribution: BTreeMap<BloodType, u32>,
    /// Donors whose blood type is unknown.
    pub donors_without_blood_type: u32,
    /// Requests per month, oldest first.
    pub monthly_requests: Vec<MonthlyRequests>,
}

/// Computes dashboard statistics from profiles and requests.
#[must_use]
pub fn compute_dashboard_stats(
    profiles: &[UserProfile],
    requests: &[BloodRequest],
) -> DashboardStats {
    let mut total_donors: u32 = 0;
    let mut total_recipients: u32 = 0;
    let mut donors_without_blood_type: u32 = 0;
    let mut blood_type_distribution: BTreeMap<BloodType, u32> =
        BloodType::ALL.iter().map(|bt| (*bt, 0)).collect();

    for profile in profiles {
        match profile.role {
            Role::Donor => {
                total_donors = total_donors.saturating_add(1);
                match profile.blood_type {
                    Some(bt) => {
                        let count: &mut u32 = blood_type_distribution.entry(bt).or_insert(0);
                        *count = count.saturating_add(1);
                    }
                    None => donors_without_blood_type = donors_without_blood_type.saturating_add(1),
                }
            }
            Role::Recipient => total_recipients = total_recipients.saturating_add(1),
        }
    }

    let mut total_requests: u32 = 0;
    let mut fulfilled_requests: u32 = 0;
    let mut by_month: BTreeMap<(i32, u8), (u32, u32)> = BTreeMap::new();

    for request in requests {
        let fulfilled: u32 = u32::from(request.status.is_fulfilled());
        total_requests = total_requests.saturating_add(1);
        fulfilled_requests = fulfilled_requests.saturating_add(fulfilled);

        let key: (i32, u8) = (request.created_at.year(), u8::from(request.created_at.month()));
        let bucket: &mut (u32, u32) = by_month.entry(key).or_insert((0, 0));
        bucket.0 = bucket.0.saturating_add(1);
        bucket.1 = bucket.1.saturating_add(fulfilled);
    }

    let monthly_requests: Vec<MonthlyRequests> = by_month
        .into_iter()
        .filter_map(|((year, month), (requests, fulfilled))| {
            Month::try_from(month).ok().map(|month| MonthlyRequests {
                year,
                month,
                requests,
                fulfilled,
            })
        })
        .collect();

    let success_rate: f64 = if total_requests == 0 {
        0.0
    } else {
        f64::from(fulfilled_requests) * 100.0 / f64::from(total_requests)
    };

    DashboardStats {
        total_donors,
        total_recipients,
        total_requests,
        fulfilled_requests,
        success_rate,
        blood_type_distribution,
        donors_without_blood_type,
        monthly_requests,
    }
}

/// Reads profiles and requests from `store` and computes dashboard statistics.
///
/// # Errors
///
/// Returns `CoreError::Store` if either listing cannot be read.
pub async fn dashboard_stats<S: DonationStore>(store: &S) -> Result<DashboardStats, CoreError> {
    let profiles: Vec<UserProfile> = store.list_profiles().await?;
    let requests: Vec<BloodRequest> = store.list_requests(None).await?;
    Ok(compute_dashboard_stats(&profiles, &requests))
}
