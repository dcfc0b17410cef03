// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Run statistics kept by the mining context.

pub mod statistics;
