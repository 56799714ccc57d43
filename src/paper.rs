use serde::{Deserialize, Serialize};

use crate::errors::TileError;

/// Profiles whose name contains this marker are treated as borderless when built with
/// [`PaperProfile::new`].
pub const BORDERLESS_MARKER: &str = "Borderless";

/// A sheet of paper the tiles are printed on. Dimensions are in inches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperProfile {
    pub name: String,
    pub width_in: f64,
    pub height_in: f64,
    pub borderless: bool,
}

impl PaperProfile {
    /// Create a profile, deriving the borderless flag from the naming convention used by
    /// existing profile catalogs.
    pub fn new<S: Into<String>>(name: S, width_in: f64, height_in: f64) -> Self {
        let name = name.into();
        let borderless = name.contains(BORDERLESS_MARKER);
        Self::with_borderless(name, width_in, height_in, borderless)
    }

    pub fn with_borderless<S: Into<String>>(
        name: S,
        width_in: f64,
        height_in: f64,
        borderless: bool,
    ) -> Self {
        Self {
            name: name.into(),
            width_in,
            height_in,
            borderless,
        }
    }

    pub fn is_borderless(&self) -> bool {
        self.borderless
    }

    /// Check that both dimensions are usable for planning a grid.
    pub fn validate(&self) -> Result<(), TileError> {
        let ok = |v: f64| v.is_finite() && v > 0.0;
        if !ok(self.width_in) || !ok(self.height_in) {
            return Err(TileError::invalid_spec(format!(
                "paper '{}' must have positive dimensions, got {}x{} in",
                self.name, self.width_in, self.height_in
            )));
        }
        Ok(())
    }

    /// Look up a built-in profile by its canonical name or one of its aliases.
    pub fn by_name(name: &str) -> Result<Self, TileError> {
        CATALOG
            .iter()
            .find(|entry| entry.name == name || entry.aliases.iter().any(|a| *a == name))
            .map(CatalogEntry::profile)
            .ok_or_else(|| {
                let known = CATALOG.iter().map(|e| e.name).collect::<Vec<_>>().join(", ");
                TileError::invalid_spec(format!("unknown paper '{name}' (known: {known})"))
            })
    }
}

struct CatalogEntry {
    name: &'static str,
    aliases: &'static [&'static str],
    width_in: f64,
    height_in: f64,
}

impl CatalogEntry {
    fn profile(&self) -> PaperProfile {
        PaperProfile::new(self.name, self.width_in, self.height_in)
    }
}

#[rustfmt::skip]
const CATALOG: &[CatalogEntry] = &[
    CatalogEntry { name: "A4",            aliases: &[],              width_in: 8.27,  height_in: 11.69 },
    CatalogEntry { name: "A4 Borderless", aliases: &[],              width_in: 8.27,  height_in: 11.69 },
    CatalogEntry { name: "Letter",        aliases: &["Letter (US)"], width_in: 8.5,   height_in: 11.0 },
    CatalogEntry { name: "Legal",         aliases: &["Legal (US)"],  width_in: 8.5,   height_in: 14.0 },
    CatalogEntry { name: "A3",            aliases: &[],              width_in: 11.69, height_in: 16.53 },
];

/// All built-in paper profiles, in catalog order.
pub fn catalog() -> Vec<PaperProfile> {
    CATALOG.iter().map(CatalogEntry::profile).collect()
}

pub const DEFAULT_PAPER: &str = "A4";
