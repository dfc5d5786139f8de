use crate::error::CResult;
use crate::serializer::{Codec, Serializer};

/// Advertised connection and identity details for a miner. All fields
/// are free-form, short strings; only overall transaction size limits
/// constrain their length.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MinerSettings {
    pub endpoint: String,
    pub api: String,
    pub name: String,
    pub website: String,
    pub description: String,
}

impl Codec for MinerSettings {
    fn encode(&self, s: &mut Serializer) {
        s.put_string_u8(&self.endpoint).expect("endpoint within u8 length prefix");
        s.put_string_u8(&self.api).expect("api within u8 length prefix");
        s.put_string_u8(&self.name).expect("name within u8 length prefix");
        s.put_string_u8(&self.website).expect("website within u8 length prefix");
        s.put_bytes_u16(self.description.as_bytes()).expect("description within u16 length prefix");
    }

    fn decode(s: &mut Serializer) -> CResult<Self> {
        let endpoint = s.get_string_u8()?;
        let api = s.get_string_u8()?;
        let name = s.get_string_u8()?;
        let website = s.get_string_u8()?;
        let description = String::from_utf8(s.get_bytes_u16()?)
            .map_err(|_| crate::error::SerializerError::InvalidValue("description not valid utf-8".into()))?;
        Ok(MinerSettings { endpoint, api, name, website, description })
    }
}
