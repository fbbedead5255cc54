// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod charts;
pub mod cli;
pub mod commands;
pub mod db;
pub mod errors;
pub mod filter;
pub mod ingest;
pub mod ledger;
pub mod models;
pub mod utils;
