use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Material categories the classification model can predict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Material {
    Glass,
    Paper,
    Cardboard,
    Plastic,
    Cans,
}

impl Material {
    pub const ALL: [Material; 5] = [
        Material::Glass,
        Material::Paper,
        Material::Cardboard,
        Material::Plastic,
        Material::Cans,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Material::Glass => "glass",
            Material::Paper => "paper",
            Material::Cardboard => "cardboard",
            Material::Plastic => "plastic",
            Material::Cans => "cans",
        }
    }

    /// Parse a label as emitted by the model or by API clients.
    ///
    /// Accepts both the English names and the model's class names
    /// (`Vidrio`, `Papel`, `Carton`, `Plastico`, `Latas`).
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "glass" | "vidrio" => Some(Material::Glass),
            "paper" | "papel" => Some(Material::Paper),
            "cardboard" | "carton" | "cartón" => Some(Material::Cardboard),
            "plastic" | "plastico" | "plástico" => Some(Material::Plastic),
            "cans" | "latas" => Some(Material::Cans),
            _ => None,
        }
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Material {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| anyhow::anyhow!("Unknown material label: {}", s))
    }
}
