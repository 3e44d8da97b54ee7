//! Wire format of the Rentman media endpoint.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};

use crate::domain::entities::MediaRecord;
use crate::domain::errors::UpstreamError;

/// One element of a `propertymedia` response.
#[derive(Debug, Deserialize)]
pub struct MediaResponse {
    /// Stored filename.
    pub filename: String,
    /// Caption text.
    #[serde(default)]
    pub caption: String,
    /// Gallery position; the API sends it as a string.
    #[serde(default, deserialize_with = "string_or_u32")]
    pub sortorder: u32,
    /// Owning property reference.
    #[serde(default)]
    pub propref: Option<String>,
    /// Base64-encoded image bytes.
    #[serde(default)]
    pub base64data: Option<String>,
}

/// The endpoint answers with a bare object when exactly one record matches.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    /// A list of records.
    Many(Vec<T>),
    /// A single record.
    One(T),
}

impl<T> OneOrMany<T> {
    /// Flattens into a list.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::Many(items) => items,
            Self::One(item) => vec![item],
        }
    }
}

impl TryFrom<MediaResponse> for MediaRecord {
    type Error = UpstreamError;

    fn try_from(dto: MediaResponse) -> Result<Self, Self::Error> {
        let payload = match dto.base64data.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(encoded) => {
                // Some records carry a data URI prefix.
                let encoded = encoded
                    .split_once(";base64,")
                    .map_or(encoded, |(_, data)| data);
                let decoded = STANDARD.decode(encoded).map_err(|e| {
                    UpstreamError::invalid_response(format!(
                        "invalid base64 payload for {}: {e}",
                        dto.filename
                    ))
                })?;
                Some(Bytes::from(decoded))
            }
        };

        Ok(Self {
            filename: dto.filename,
            caption: dto.caption,
            sort_order: dto.sortorder,
            property_ref: dto.propref.filter(|p| !p.is_empty()),
            payload,
        })
    }
}

fn string_or_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrIntVisitor;

    impl Visitor<'_> for StringOrIntVisitor {
        type Value = u32;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or integer sort order")
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            u32::try_from(value).map_err(de::Error::custom)
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            u32::try_from(value).map_err(de::Error::custom)
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            let value = value.trim();
            if value.is_empty() {
                return Ok(0);
            }
            value.parse::<u32>().map_err(de::Error::custom)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(0)
        }
    }

    deserializer.deserialize_any(StringOrIntVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_with_string_sort_order() {
        let json = r#"[
            {"filename": "p1.jpg", "caption": "Front", "sortorder": "2", "propref": "P1", "base64data": "/9j/4A=="},
            {"filename": "p1_2.jpg", "sortorder": 3}
        ]"#;
        let records: Vec<MediaRecord> = serde_json::from_str::<OneOrMany<MediaResponse>>(json)
            .unwrap()
            .into_vec()
            .into_iter()
            .map(MediaRecord::try_from)
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].sort_order, 2);
        assert_eq!(records[0].payload.as_deref(), Some(&[0xff, 0xd8, 0xff, 0xe0][..]));
        assert_eq!(records[1].sort_order, 3);
        assert!(records[1].payload.is_none());
    }

    #[test]
    fn test_parse_single_object() {
        let json = r#"{"filename": "p1.jpg", "base64data": ""}"#;
        let items = serde_json::from_str::<OneOrMany<MediaResponse>>(json)
            .unwrap()
            .into_vec();
        assert_eq!(items.len(), 1);

        let record = MediaRecord::try_from(items.into_iter().next().unwrap()).unwrap();
        assert!(record.payload.is_none());
    }

    #[test]
    fn test_data_uri_prefix_is_stripped() {
        let dto = MediaResponse {
            filename: "p1.jpg".to_string(),
            caption: String::new(),
            sortorder: 0,
            propref: None,
            base64data: Some("data:image/jpeg;base64,/9j/4A==".to_string()),
        };
        let record = MediaRecord::try_from(dto).unwrap();
        assert_eq!(record.payload.map(|b| b.len()), Some(4));
    }

    #[test]
    fn test_invalid_base64_is_rejected() {
        let dto = MediaResponse {
            filename: "p1.jpg".to_string(),
            caption: String::new(),
            sortorder: 0,
            propref: None,
            base64data: Some("!!not base64!!".to_string()),
        };
        assert!(matches!(
            MediaRecord::try_from(dto),
            Err(UpstreamError::InvalidResponse { .. })
        ));
    }
}
