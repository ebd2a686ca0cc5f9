//! Job records as the scheduler's REST api sends and receives them.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_NETWORK: &str = "BRIDGE";
pub const DEFAULT_VOLUME_MODE: &str = "RW";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Job {
    #[serde(default, deserialize_with = "nullable")]
    pub schedule: String,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub cpus: f64,
    #[serde(default, deserialize_with = "nullable")]
    pub mem: f64,
    #[serde(default, deserialize_with = "nullable")]
    pub disk: f64,
    #[serde(default, deserialize_with = "nullable")]
    pub uris: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub container: Container,
    #[serde(default, deserialize_with = "nullable")]
    pub command: String,
    /// Unique names, no ordering. Sent as a list sorted by name.
    #[serde(
        rename = "environmentVariables",
        default,
        with = "env_list"
    )]
    pub env: BTreeMap<String, String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    #[serde(rename = "type", default, deserialize_with = "nullable")]
    pub kind: String,
    #[serde(default, deserialize_with = "nullable")]
    pub image: String,
    #[serde(default, deserialize_with = "nullable")]
    pub network: String,
    #[serde(default, deserialize_with = "nullable")]
    pub force_pull_image: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub volumes: Vec<Volume>,
}

impl Container {
    /// true if the job carries no container at all
    pub fn is_unset(&self) -> bool {
        self == &Container::default()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    #[serde(default, deserialize_with = "nullable")]
    pub container_path: String,
    #[serde(default, deserialize_with = "nullable")]
    pub host_path: String,
    #[serde(default, deserialize_with = "nullable")]
    pub mode: String,
}

/// treat an explicit json null the same as a missing field
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

mod env_list {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct EnvEntry<S> {
        name: S,
        #[serde(default)]
        value: Option<S>,
    }

    pub fn serialize<S: Serializer>(
        env: &BTreeMap<String, String>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(env.iter().map(|(name, value)| EnvEntry {
            name: name.as_str(),
            value: Some(value.as_str()),
        }))
    }

    /// later duplicates overwrite earlier ones
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<String, String>, D::Error> {
        let entries: Option<Vec<EnvEntry<String>>> = Option::deserialize(deserializer)?;
        Ok(entries
            .into_iter()
            .flatten()
            .map(|e| (e.name, e.value.unwrap_or_default()))
            .collect())
    }
}
