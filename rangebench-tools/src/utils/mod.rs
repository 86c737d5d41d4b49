/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */
pub mod args;
pub use args::{EfSearchList, ParseEfSearchError, exit_code, parse_args};

pub mod convert;
pub use convert::csv_to_attributes;

pub mod run;
pub use run::{BuildOnly, Combined, QueryOnly, rebuild_ef_construction};

pub mod tracing;
pub use tracing::{init_subscriber, init_test_subscriber};
