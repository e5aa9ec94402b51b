// Copyright (C) 2026 The Hemolink Authors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Read-only queries.
//!
//! - `profiles`: profile lookups and donor candidate queries
//! - `requests`: blood request lookups
//! - `donations`: donation record lookups

pub mod donations;
pub mod profiles;
pub mod requests;
