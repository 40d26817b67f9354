//! Flat `tag -> string value` map, the unit of exchange between the DICOM
//! parser (outside this workspace) and the index.

use std::collections::btree_map;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::tag::DicomTag;

/// A sorted map of DICOM tag values. Sorting matters: per-level signatures
/// and projections iterate in tag order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DicomMap {
    values: BTreeMap<DicomTag, String>,
}

impl DicomMap {
    pub fn new() -> Self {
        DicomMap::default()
    }

    pub fn set_value(&mut self, tag: DicomTag, value: impl Into<String>) {
        self.values.insert(tag, value.into());
    }

    pub fn get_value(&self, tag: DicomTag) -> Option<&str> {
        self.values.get(&tag).map(String::as_str)
    }

    pub fn has_tag(&self, tag: DicomTag) -> bool {
        self.values.contains_key(&tag)
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, DicomTag, String> {
        self.values.iter()
    }

    /// Parse the cached "DICOM as JSON" attachment format:
    /// `{"GGGG,EEEE": {"Value": "..."}}` or the short form
    /// `{"GGGG,EEEE": "..."}`. Entries with a missing or non-string value
    /// (binary data, sequences) are ignored.
    pub fn from_dicom_json(json: &Value) -> DicomMap {
        let mut map = DicomMap::new();

        let Some(object) = json.as_object() else {
            return map;
        };

        for (key, entry) in object {
            let Some(tag) = DicomTag::parse(key) else {
                continue;
            };

            let value = match entry {
                Value::String(s) => Some(s.as_str()),
                Value::Object(fields) => fields.get("Value").and_then(Value::as_str),
                _ => None,
            };

            if let Some(value) = value {
                map.set_value(tag, value);
            }
        }

        map
    }
}

impl<'a> IntoIterator for &'a DicomMap {
    type Item = (&'a DicomTag, &'a String);
    type IntoIter = btree_map::Iter<'a, DicomTag, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dicom::tag::{TAG_PATIENT_ID, TAG_PATIENT_NAME};

    #[test]
    fn set_and_get() {
        let mut map = DicomMap::new();
        map.set_value(TAG_PATIENT_NAME, "DOE^JOHN");
        assert_eq!(map.get_value(TAG_PATIENT_NAME), Some("DOE^JOHN"));
        assert_eq!(map.get_value(TAG_PATIENT_ID), None);
    }

    #[test]
    fn parses_both_json_shapes() {
        let json = serde_json::json!({
            "0010,0010": { "Name": "PatientName", "Type": "String", "Value": "DOE^JANE" },
            "0010,0020": "id-1",
            "7fe0,0010": { "Type": "Binary" },
            "not a tag": "ignored"
        });

        let map = DicomMap::from_dicom_json(&json);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get_value(TAG_PATIENT_NAME), Some("DOE^JANE"));
        assert_eq!(map.get_value(TAG_PATIENT_ID), Some("id-1"));
    }
}
