// Copyright (C) 2026 The Hemolink Authors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Write operations.
//!
//! Every function here commits at most one logical change. Multi-statement
//! writes run inside an immediate transaction.

pub mod donations;
pub mod profiles;
pub mod requests;
