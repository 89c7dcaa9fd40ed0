use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::env;

/// Reference data pairing each fleet vehicle with the trailer it normally pulls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetCatalog {
    trailers: BTreeMap<String, String>,
}

const DEFAULT_FLEET: &[(&str, &str)] = &[
    ("Scania G400", "НефАЗ 96895"),
    ("Scania R 2016", "Krone Profi Liner"),
    ("Scania R500", "Krone Profi Liner"),
    ("КАМАЗ 5490 Neo", "Kassbohrer трал"),
    ("КАМАЗ 5490 Neo (бензовоз)", "НефАЗ 96895"),
    ("КАМАЗ 54901", "Лесовоз Schwarzmuller"),
    ("MAN TGX Euro 5", "Schmitz SKO"),
    ("MAN TGX Euro 6", "НефАЗ 96895"),
    ("MAN TGX 2020", "Feldbinder TSA"),
    ("Mercedes Actros MP3", "Schmitz SKO"),
    ("Mercedes Actros MP4", "Schmitz L 16.5"),
    ("Mercedes Actros L 2023", "Schmitz S.CS MEGA"),
    ("Volvo FH16 2012", "Schmitz SKO"),
    ("Volvo FH 2022", "Krone Cool Liner"),
    ("Renault T 2019", "Schmitz S.CS Universal"),
    ("DAF XG+ 2023", "Wielton Curtain Master"),
];

impl Default for FleetCatalog {
    fn default() -> Self {
        Self::new(
            DEFAULT_FLEET
                .iter()
                .map(|(v, t)| (v.to_string(), t.to_string())),
        )
    }
}

impl FleetCatalog {
    pub fn new(entries: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            trailers: entries.into_iter().collect(),
        }
    }

    /// Built-in table, or the JSON object at `FLEET_CATALOG_PATH` when set.
    pub fn from_env() -> Result<Self> {
        match env::var("FLEET_CATALOG_PATH") {
            Ok(path) if !path.trim().is_empty() => {
                let raw = std::fs::read_to_string(path.trim())
                    .with_context(|| format!("Failed to read fleet catalog '{}'", path))?;
                Self::from_json(&raw)
                    .with_context(|| format!("Failed to parse fleet catalog '{}'", path))
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let trailers: BTreeMap<String, String> = serde_json::from_str(raw)?;
        Ok(Self { trailers })
    }

    pub fn trailer_for(&self, vehicle: &str) -> Option<&str> {
        self.trailers.get(vehicle.trim()).map(String::as_str)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.trailers
            .iter()
            .map(|(v, t)| (v.as_str(), t.as_str()))
    }
}
