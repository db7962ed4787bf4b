/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Outward-facing services: suggestion fetching, API settings, lookup history.

pub mod history;
pub mod settings;
pub mod suggest;
