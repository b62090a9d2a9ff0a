// Copyright 2024 Understudy Contributors
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![allow(dead_code)] // Each test binary uses a different subset

use std::sync::{Arc, Mutex};
use understudy_core::{Behavior, Double, Fault, Reply};
use understudy_demo::fluent::{DatabaseLibrary, LibraryError};

pub fn init_tracing() {
    understudy_core::test_utils::init_tracing();
}

/// A hand-built stand-in for the fluent library. Every method throws until
/// a test configures it.
pub struct LibraryDouble {
    pub connect: Double<(), ()>,
    pub wipe: Double<(), ()>,
    pub add_test_data: Double<(), ()>,
}

impl LibraryDouble {
    pub fn not_implemented() -> Self {
        let unimplemented = || Behavior::throws(Fault::new("Not implemented"));
        Self {
            connect: Double::with_behavior("connect", unimplemented()),
            wipe: Double::with_behavior("wipe", unimplemented()),
            add_test_data: Double::with_behavior("add_test_data", unimplemented()),
        }
    }

    fn chain<'a>(&'a self, operation: &Double<(), ()>) -> Result<&'a Self, LibraryError> {
        match operation.call(())? {
            Reply::Receiver => Ok(self),
            other => Err(LibraryError::BrokenChain {
                operation: operation.name().to_string(),
                reason: format!("{:?}", other),
            }),
        }
    }
}

impl DatabaseLibrary for LibraryDouble {
    fn connect(&self) -> Result<&Self, LibraryError> {
        self.chain(&self.connect)
    }

    fn wipe(&self) -> Result<&Self, LibraryError> {
        self.chain(&self.wipe)
    }

    fn add_test_data(&self) -> Result<&Self, LibraryError> {
        self.chain(&self.add_test_data)
    }
}

/// Shared storage for fakes that record what they were given.
pub fn fake_storage() -> Arc<Mutex<Vec<String>>> {
    Arc::new(Mutex::new(Vec::new()))
}
