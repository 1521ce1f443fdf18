// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2025 William Bro-Jørgensen
// Copyright (c) 2020 Guillaume Fraux and contributors
//
// See LICENSE at the project root for full text.

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Atom {
    pub name: String,
    pub symbol: String,
}

impl Atom {
    pub fn new(name: String) -> Self {
        Self {
            name: name.clone(),
            symbol: name,
        }
    }

    pub fn with_symbol(name: String, symbol: String) -> Self {
        Self { name, symbol }
    }
}
