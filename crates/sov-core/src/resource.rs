//! The six kingdom resources and the vector that holds them.
//!
//! A [`ResourceVector`] doubles as a state value (each field kept inside
//! [`RESOURCE_MIN`]..=[`RESOURCE_MAX`]) and as a signed delta (option effects,
//! passive policy effects, activation costs).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lower bound of every resource. Reaching it on stability, popularity, or
/// military ends the reign.
pub const RESOURCE_MIN: i32 = 0;

/// Upper bound of every resource.
pub const RESOURCE_MAX: i32 = 100;

/// One of the six named kingdom resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    /// Gold in the royal coffers.
    Treasury,
    /// Size and readiness of the army.
    Military,
    /// How well the people regard the crown.
    Popularity,
    /// Order within the realm.
    Stability,
    /// Harvests and food stores.
    Agriculture,
    /// Trade and markets.
    Commerce,
}

impl Resource {
    /// All resources in display order.
    pub const ALL: [Resource; 6] = [
        Resource::Treasury,
        Resource::Military,
        Resource::Popularity,
        Resource::Stability,
        Resource::Agriculture,
        Resource::Commerce,
    ];

    /// Lowercase identifier used in data files.
    pub fn as_str(self) -> &'static str {
        match self {
            Resource::Treasury => "treasury",
            Resource::Military => "military",
            Resource::Popularity => "popularity",
            Resource::Stability => "stability",
            Resource::Agriculture => "agriculture",
            Resource::Commerce => "commerce",
        }
    }

    /// Parse a resource name (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        let lower = s.trim().to_lowercase();
        Resource::ALL.into_iter().find(|r| r.as_str() == lower)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Six named integer quantities, one per [`Resource`].
///
/// Fields omitted in JSON default to zero, which is what option effects and
/// policy costs want.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceVector {
    /// Gold in the royal coffers.
    pub treasury: i32,
    /// Size and readiness of the army.
    pub military: i32,
    /// How well the people regard the crown.
    pub popularity: i32,
    /// Order within the realm.
    pub stability: i32,
    /// Harvests and food stores.
    pub agriculture: i32,
    /// Trade and markets.
    pub commerce: i32,
}

impl ResourceVector {
    /// A vector with every field set to `value`.
    pub fn splat(value: i32) -> Self {
        Self {
            treasury: value,
            military: value,
            popularity: value,
            stability: value,
            agriculture: value,
            commerce: value,
        }
    }

    /// Builder-style setter for a single resource.
    pub fn with(mut self, resource: Resource, value: i32) -> Self {
        self.set(resource, value);
        self
    }

    /// Read one resource.
    pub fn get(&self, resource: Resource) -> i32 {
        match resource {
            Resource::Treasury => self.treasury,
            Resource::Military => self.military,
            Resource::Popularity => self.popularity,
            Resource::Stability => self.stability,
            Resource::Agriculture => self.agriculture,
            Resource::Commerce => self.commerce,
        }
    }

    /// Overwrite one resource.
    pub fn set(&mut self, resource: Resource, value: i32) {
        let slot = match resource {
            Resource::Treasury => &mut self.treasury,
            Resource::Military => &mut self.military,
            Resource::Popularity => &mut self.popularity,
            Resource::Stability => &mut self.stability,
            Resource::Agriculture => &mut self.agriculture,
            Resource::Commerce => &mut self.commerce,
        };
        *slot = value;
    }

    /// Iterate `(resource, value)` pairs in display order.
    pub fn iter(&self) -> impl Iterator<Item = (Resource, i32)> + '_ {
        Resource::ALL.into_iter().map(move |r| (r, self.get(r)))
    }

    /// Iterate only the non-zero entries. Useful when rendering deltas.
    pub fn nonzero(&self) -> impl Iterator<Item = (Resource, i32)> + '_ {
        self.iter().filter(|(_, v)| *v != 0)
    }

    /// Whether every field is zero.
    pub fn is_zero(&self) -> bool {
        self.iter().all(|(_, v)| v == 0)
    }

    /// Clamp every field into the resource bounds.
    pub fn clamped(mut self) -> Self {
        for r in Resource::ALL {
            self.set(r, self.get(r).clamp(RESOURCE_MIN, RESOURCE_MAX));
        }
        self
    }

    /// Add `delta` field by field, clamping into the resource bounds.
    ///
    /// Returns the effective change, which differs from `delta` wherever a
    /// bound was hit. Never panics or overflows, however large the delta.
    pub fn apply_clamped(&mut self, delta: &ResourceVector) -> ResourceVector {
        let mut effective = ResourceVector::default();
        for r in Resource::ALL {
            let before = self.get(r);
            let after = before
                .saturating_add(delta.get(r))
                .clamp(RESOURCE_MIN, RESOURCE_MAX);
            self.set(r, after);
            effective.set(r, after - before);
        }
        effective
    }

    /// Field-wise sum without clamping.
    pub fn saturating_add(&self, other: &ResourceVector) -> ResourceVector {
        let mut out = ResourceVector::default();
        for r in Resource::ALL {
            out.set(r, self.get(r).saturating_add(other.get(r)));
        }
        out
    }

    /// Field-wise negation.
    pub fn negated(&self) -> ResourceVector {
        let mut out = ResourceVector::default();
        for r in Resource::ALL {
            out.set(r, self.get(r).saturating_neg());
        }
        out
    }

    /// Compact `name:value` summary, e.g. `treasury:50, military:40`.
    pub fn summary(&self) -> String {
        self.iter()
            .map(|(r, v)| format!("{r}:{v}"))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Signed summary of the non-zero entries, e.g. `treasury +10, popularity -5`.
    pub fn delta_summary(&self) -> String {
        let parts: Vec<String> = self.nonzero().map(|(r, v)| format!("{r} {v:+}")).collect();
        if parts.is_empty() {
            "no change".to_string()
        } else {
            parts.join(", ")
        }
    }
}
