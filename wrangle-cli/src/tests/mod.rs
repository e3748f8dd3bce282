//! Shared test harness modules for the wrangle CLI.

use super::*;

mod helpers;
