/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

mod status;
pub use status::{memory_footprint, parse_status};
