/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Shared plumbing for benchmark binaries: where reports are printed, how phases are
//! timed and how results are saved.

pub mod output;
pub mod result;
pub mod utils;

pub use output::Output;
pub use result::{check_output_path, save_json};
