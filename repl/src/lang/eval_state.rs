// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::{collections::{BTreeMap, BTreeSet},
          sync::Arc};

use crate::{CommandPermission, FilesystemProvider, OsFilesystem, OutputDevice,
            ScopeInfo, ScopeProvider, Value};

/// Live state shared between the editor (completions, type checking) and the foreground
/// task (evaluation). The session keeps it behind an `Arc<StdMutex<_>>`; the editor only
/// ever `try_lock`s it, so a running command can't stall typing.
#[allow(missing_debug_implementations)]
pub struct EvalState {
    /// Session level locals, they persist from one submitted line to the next.
    pub locals: BTreeMap<String, Value>,
    pub globals: BTreeMap<String, Value>,
    pub permissions: Vec<CommandPermission>,
    pub named_patterns: BTreeSet<String>,
    pub pattern_namespaces: BTreeSet<String>,
    pub host_definitions: Vec<String>,
    pub url_entries: Vec<String>,
    pub filesystem: Arc<dyn FilesystemProvider>,
    /// Where `print` writes.
    pub output_device: OutputDevice,
}

impl EvalState {
    #[must_use]
    pub fn new(output_device: OutputDevice) -> Self {
        Self {
            locals: BTreeMap::new(),
            globals: BTreeMap::new(),
            permissions: vec![],
            named_patterns: ["int", "str", "bool", "path", "url"]
                .into_iter()
                .map(String::from)
                .collect(),
            pattern_namespaces: BTreeSet::new(),
            host_definitions: vec![],
            url_entries: vec![],
            filesystem: Arc::new(OsFilesystem),
            output_device,
        }
    }

    #[must_use]
    pub fn with_permissions(mut self, permissions: Vec<CommandPermission>) -> Self {
        self.permissions = permissions;
        self
    }

    #[must_use]
    pub fn with_filesystem(mut self, filesystem: Arc<dyn FilesystemProvider>) -> Self {
        self.filesystem = filesystem;
        self
    }

    pub fn set_local(&mut self, name: impl Into<String>, value: Value) {
        self.locals.insert(name.into(), value);
    }

    pub fn set_global(&mut self, name: impl Into<String>, value: Value) {
        self.globals.insert(name.into(), value);
    }

    /// Names visible to the static checker.
    #[must_use]
    pub fn scope_info(&self) -> ScopeInfo {
        ScopeInfo {
            local_names: self.locals.keys().cloned().collect(),
            global_names: self.globals.keys().cloned().collect(),
        }
    }
}

impl ScopeProvider for EvalState {
    fn global_names(&self) -> Vec<String> { self.globals.keys().cloned().collect() }

    fn local_names(&self) -> Vec<String> { self.locals.keys().cloned().collect() }

    fn resolve(&self, name: &str) -> Option<Value> {
        self.locals
            .get(name)
            .or_else(|| self.globals.get(name))
            .cloned()
    }

    fn command_permissions(&self) -> Vec<CommandPermission> { self.permissions.clone() }

    fn named_patterns(&self) -> Vec<String> {
        self.named_patterns.iter().cloned().collect()
    }

    fn pattern_namespaces(&self) -> Vec<String> {
        self.pattern_namespaces.iter().cloned().collect()
    }

    fn host_definitions(&self) -> Vec<String> { self.host_definitions.clone() }

    fn url_entries(&self) -> Vec<String> { self.url_entries.clone() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locals_shadow_globals() {
        let (output_device, _) = OutputDevice::new_mock();
        let mut state = EvalState::new(output_device);
        state.set_global("x", Value::Int(1));
        assert_eq!(state.resolve("x"), Some(Value::Int(1)));
        state.set_local("x", Value::Int(2));
        assert_eq!(state.resolve("x"), Some(Value::Int(2)));
        assert_eq!(state.resolve("y"), None);

        let scope_info = state.scope_info();
        assert!(scope_info.local_names.contains("x"));
        assert!(scope_info.global_names.contains("x"));
    }
}
