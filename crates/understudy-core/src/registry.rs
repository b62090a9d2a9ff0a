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

//! Installs doubles on seams and guarantees their restoration.
//!
//! Installed doubles live on the seam itself, as a stack of layers keyed by
//! handle. A registry only remembers which layers it pushed. Restoring one
//! drops its call history and pulls it out of the seam's stack, so the seam
//! falls back to whatever is left on top, or to its real implementation.
//! Registries sharing a seam may therefore restore in any order.
//!
//! A process-wide instance is available through [`global`]; tests that run
//! in parallel should prefer their own [`Registry`] or a
//! [`Sandbox`](crate::sandbox::Sandbox).

use crate::config::RegistryConfig;
use crate::double::Double;
use crate::errors::DoubleError;
use crate::seam::{remove_layer, Seam};
use crate::types::{HandleId, OperationKey};
use once_cell::sync::Lazy;
use std::ops::Deref;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tracing::{debug, warn};
use uuid::Uuid;

/// One layer this registry pushed.
struct Tracked {
    handle: HandleId,
    key: OperationKey,
    double_name: String,
    /// Drops the double's call history.
    reset: Box<dyn Fn() + Send + Sync>,
    /// Pulls the layer out of its seam and drops its history. False if the
    /// layer was already gone.
    release: Box<dyn Fn() -> bool + Send + Sync>,
}

#[derive(Default)]
struct RegistryState {
    /// Install order.
    tracked: Vec<Tracked>,
}

struct Shared {
    config: RegistryConfig,
    state: Mutex<RegistryState>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        // Restoration has to work even after a test panicked mid-install.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn release(&self, tracked: &Tracked) {
        let removed = (tracked.release)();
        debug!(
            registry = %self.config.label,
            target = %tracked.key.target,
            operation = %tracked.key.operation,
            handle = %tracked.handle,
            double = %tracked.double_name,
            removed,
            "Restored double"
        );
    }

    fn restore_one(&self, handle: HandleId) -> bool {
        let tracked = {
            let mut state = self.lock();
            match state.tracked.iter().position(|t| t.handle == handle) {
                Some(position) => state.tracked.remove(position),
                None => return false,
            }
        };
        self.release(&tracked);
        true
    }
}

/// Tracks installed doubles and restores them.
#[derive(Clone)]
pub struct Registry {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("label", &self.shared.config.label)
            .field("active", &self.active_count())
            .finish()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Creates an empty registry with the default configuration.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                state: Mutex::new(RegistryState::default()),
            }),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.shared.config
    }

    /// Binds `double` to `seam`.
    ///
    /// # Errors
    /// Returns [`DoubleError::AlreadyDoubled`] if the seam already has a double
    /// bound and the registry is not configured with `allow_override`.
    pub fn install<A, R>(
        &self,
        seam: &Seam<A, R>,
        double: Double<A, R>,
    ) -> Result<Handle<A, R>, DoubleError>
    where
        A: Clone + PartialEq + Send + 'static,
        R: Clone + Send + 'static,
    {
        self.install_layer(seam, double, self.shared.config.allow_override)
    }

    /// Binds `double` over whatever `seam` currently has bound, including
    /// another double. Restoring the returned handle reveals the layer beneath.
    pub fn install_override<A, R>(
        &self,
        seam: &Seam<A, R>,
        double: Double<A, R>,
    ) -> Result<Handle<A, R>, DoubleError>
    where
        A: Clone + PartialEq + Send + 'static,
        R: Clone + Send + 'static,
    {
        self.install_layer(seam, double, true)
    }

    /// Installs an unconfigured double named after the operation.
    pub fn stub<A, R>(&self, seam: &Seam<A, R>) -> Result<Handle<A, R>, DoubleError>
    where
        A: Clone + PartialEq + Send + 'static,
        R: Clone + Send + 'static,
    {
        self.install(seam, Double::new(seam.name()))
    }

    /// Installs a double that runs the real implementation and records calls.
    pub fn spy<A, R>(&self, seam: &Seam<A, R>) -> Result<Handle<A, R>, DoubleError>
    where
        A: Clone + PartialEq + Send + 'static,
        R: Clone + Send + 'static,
    {
        let double = Double::new(seam.name());
        double.calls_through();
        self.install(seam, double)
    }

    fn install_layer<A, R>(
        &self,
        seam: &Seam<A, R>,
        double: Double<A, R>,
        allow_override: bool,
    ) -> Result<Handle<A, R>, DoubleError>
    where
        A: Clone + PartialEq + Send + 'static,
        R: Clone + Send + 'static,
    {
        let key = seam.key().clone();
        let handle = Uuid::new_v4();
        let mut state = self.shared.lock();

        double.attach(seam.declared().clone(), self.shared.config.yield_before_settle);
        if let Some(covered) = seam.push_layer(handle, double.clone(), allow_override)? {
            warn!(
                registry = %self.shared.config.label,
                operation = %key.operation,
                covered = %covered,
                "Layering double over an active double"
            );
        }

        let reset_double = double.clone();
        let layers = seam.layers().clone();
        state.tracked.push(Tracked {
            handle,
            key: key.clone(),
            double_name: double.name().to_string(),
            reset: Box::new(move || reset_double.reset_history()),
            release: Box::new(move || {
                remove_layer(&layers, handle)
                    .map(|removed| removed.reset_history())
                    .is_some()
            }),
        });

        debug!(
            registry = %self.shared.config.label,
            target = %key.target,
            operation = %key.operation,
            handle = %handle,
            "Installed double"
        );

        Ok(Handle {
            id: handle,
            key,
            double,
            registry: Arc::downgrade(&self.shared),
        })
    }

    /// Restores the double behind `handle`.
    ///
    /// Returns `false` if the handle is unknown or was already restored.
    pub fn restore_one<A, R>(&self, handle: &Handle<A, R>) -> bool {
        self.restore_handle(handle.id)
    }

    /// Restores a double by handle id.
    pub fn restore_handle(&self, handle: HandleId) -> bool {
        self.shared.restore_one(handle)
    }

    /// Restores every tracked double, newest first. Returns how many were
    /// restored.
    pub fn restore_all(&self) -> usize {
        let drained: Vec<Tracked> = self.shared.lock().tracked.drain(..).collect();
        for tracked in drained.iter().rev() {
            self.shared.release(tracked);
        }
        drained.len()
    }

    /// Drops the call history of every tracked double without restoring them.
    pub fn reset_history(&self) {
        for tracked in &self.shared.lock().tracked {
            (tracked.reset)();
        }
    }

    /// Number of installed doubles still tracked.
    pub fn active_count(&self) -> usize {
        self.shared.lock().tracked.len()
    }

    /// True if this registry has a double installed for `key`.
    pub fn is_doubled(&self, key: &OperationKey) -> bool {
        self.shared.lock().tracked.iter().any(|t| &t.key == key)
    }
}

/// Proof of an install. Derefs to the installed double.
pub struct Handle<A, R> {
    id: HandleId,
    key: OperationKey,
    double: Double<A, R>,
    registry: Weak<Shared>,
}

impl<A, R> Handle<A, R> {
    pub fn id(&self) -> HandleId {
        self.id
    }

    pub fn key(&self) -> &OperationKey {
        &self.key
    }

    pub fn double(&self) -> &Double<A, R> {
        &self.double
    }

    /// Restores this double through the registry that installed it.
    /// A no-op once restored or once the registry is gone.
    pub fn restore(&self) -> bool {
        match self.registry.upgrade() {
            Some(shared) => shared.restore_one(self.id),
            None => false,
        }
    }
}

impl<A, R> Deref for Handle<A, R> {
    type Target = Double<A, R>;

    fn deref(&self) -> &Self::Target {
        &self.double
    }
}

impl<A, R> std::fmt::Debug for Handle<A, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handle").field("id", &self.id).field("key", &self.key).finish()
    }
}

static GLOBAL: Lazy<Registry> =
    Lazy::new(|| Registry::with_config(RegistryConfig::labelled("global")));

/// The process-wide registry.
pub fn global() -> &'static Registry {
    &GLOBAL
}

/// Restores everything installed through the process-wide registry.
pub fn restore() -> usize {
    GLOBAL.restore_all()
}
