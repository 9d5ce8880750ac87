// Copyright 2025 TOPSAIL Contributors
// SPDX-License-Identifier: Apache-2.0

//! TOPSAIL CLI entry point.

fn main() {
    if let Err(e) = topsail_cli::run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
