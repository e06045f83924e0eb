/// Serde helper to (de)serialize 32-byte identities as base58 strings.
#[cfg(feature = "json")]
pub mod bs58_serde {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8; 32], s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.serialize_str(&bs58::encode(bytes).into_string())
    }

    pub fn deserialize<'de, D>(d: D) -> Result<[u8; 32], D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(d)?;
        let bytes = bs58::decode(&s).into_vec().map_err(de::Error::custom)?;
        bytes
            .try_into()
            .map_err(|v: Vec<u8>| de::Error::invalid_length(v.len(), &"32 bytes"))
    }
}

/// Serde helper to (de)serialize a `Price` as its decimal string.
#[cfg(feature = "json")]
pub mod price_serde {
    use serde::{de, Deserialize, Deserializer, Serializer};

    use crate::Price;

    pub fn serialize<S>(value: &Price, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D>(d: D) -> Result<Price, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(d)?;
        s.parse::<Price>().map_err(de::Error::custom)
    }
}
