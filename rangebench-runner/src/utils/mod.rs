/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

pub mod microseconds;

pub use microseconds::{MicroSeconds, serialize_duration};
