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

#![deny(unsafe_code)]

//! Small collaborators and their consumers, written to be tested with
//! `understudy-core` doubles.
//!
//! Each module shows one way of letting a double in: consumers generic over
//! a trait take doubles directly, and the real implementations route their
//! replaceable operations through seams.

pub mod cake;
pub mod callbacks;
pub mod fluent;
pub mod http;
pub mod roulette;
pub mod storage;
pub mod weather;

pub use cake::{Ben, CakeManager, Kitchen};
pub use storage::{Database, StorageError, User};
pub use weather::{AsyncPerson, AsyncWeather, Person, Weather, WeatherError};
