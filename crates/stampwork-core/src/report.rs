//! # Report Module
//!
//! Structured summary of a blueprint for display or JSON output.
//!
//! - Every method names the capability that supplied it
//! - Every override names what was replaced and by whom
//! - Initializers are listed in the order they run

use crate::composer::{Blueprint, Override, OverrideKind};
use crate::value::State;
use serde::{Deserialize, Serialize};

/// A method and the capability that supplied its body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodEntry {
    pub name: String,
    pub origin: String,
}

/// Summary of a composed blueprint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlueprintReport {
    /// Composed capabilities, in composition order.
    pub capabilities: Vec<String>,
    pub methods: Vec<MethodEntry>,
    pub defaults: State,
    /// Capabilities whose initializers run, in order.
    pub inits: Vec<String>,
    pub overrides: Vec<Override>,
}

impl BlueprintReport {
    /// Summarize a blueprint.
    #[must_use]
    pub fn from_blueprint(blueprint: &Blueprint) -> Self {
        Self {
            capabilities: blueprint.capabilities().to_vec(),
            methods: blueprint
                .method_names()
                .map(|name| MethodEntry {
                    name: name.to_string(),
                    origin: blueprint.method_origin(name).unwrap_or_default().to_string(),
                })
                .collect(),
            defaults: blueprint.defaults().clone(),
            inits: blueprint.init_order().map(str::to_string).collect(),
            overrides: blueprint.overrides().to_vec(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty() && self.defaults.is_empty() && self.inits.is_empty()
    }

    /// Format as plain text with the standard template.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut output = String::new();

        output.push_str("┌─────────────────────────────────────┐\n");
        output.push_str(&format!(
            "│ BLUEPRINT [{}]\n",
            self.capabilities.join(" + ")
        ));
        output.push_str("├─────────────────────────────────────┤\n");
        output.push_str("│ METHODS                             │\n");

        if self.methods.is_empty() {
            output.push_str("│ - (none)                            │\n");
        } else {
            for m in &self.methods {
                output.push_str(&format!("│ - {} [from {}]\n", m.name, m.origin));
            }
        }

        output.push_str("├─────────────────────────────────────┤\n");
        output.push_str("│ DEFAULTS                            │\n");

        if self.defaults.is_empty() {
            output.push_str("│ - (none)                            │\n");
        } else {
            for (name, value) in &self.defaults {
                output.push_str(&format!("│ - {name} = {value}\n"));
            }
        }

        output.push_str("├─────────────────────────────────────┤\n");
        output.push_str("│ INITIALIZERS (in run order)         │\n");

        if self.inits.is_empty() {
            output.push_str("│ - (none)                            │\n");
        } else {
            for (i, cap) in self.inits.iter().enumerate() {
                output.push_str(&format!("│ {}. {}\n", i + 1, cap));
            }
        }

        output.push_str("├─────────────────────────────────────┤\n");
        output.push_str("│ OVERRIDES (last write wins)         │\n");

        if self.overrides.is_empty() {
            output.push_str("│ - (none)                            │\n");
        } else {
            for o in &self.overrides {
                let kind = match o.kind {
                    OverrideKind::Method => "method",
                    OverrideKind::Default => "default",
                };
                output.push_str(&format!(
                    "│ - {} `{}`: {} → {}\n",
                    kind, o.name, o.replaced, o.by
                ));
            }
        }

        output.push_str("└─────────────────────────────────────┘\n");

        output
    }
}

// =============================================================================
// TESTS
// =============================================================================
