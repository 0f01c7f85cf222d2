//! Topic identity utilities.
//!
//! Topic ids are canonical 36-character GUID strings. Topic types are a
//! closed classification with three interchangeable representations: the
//! [`TopicType`] enum, the authored document's root tag, and a fixed GUID.
//! The lookups here are total: unknown input maps to [`TopicType::None`] or
//! an empty string, never to an error.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::{Builder, Uuid};

/// Canonical GUID form (hex groups 8-4-4-4-12).
static GUID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$",
    )
    .expect("GUID regex")
});

/// Returns `true` iff `id` is exactly 36 characters in canonical GUID form.
pub fn is_valid_id(id: &str) -> bool {
    id.len() == 36 && GUID_RE.is_match(id)
}

/// Generate a fresh, time-sortable GUID string.
pub fn new_id() -> String {
    Uuid::now_v7().to_string()
}

/// Derive a stable GUID from an arbitrary seed (e.g. a document path).
///
/// The same seed always yields the same id, so topics that carry no id of
/// their own keep their identity across builds.
pub fn derive_topic_id(seed: &str) -> String {
    let digest = Sha256::digest(seed.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    Builder::from_random_bytes(bytes).into_uuid().to_string()
}

// ---------------------------------------------------------------------------
// TopicType
// ---------------------------------------------------------------------------

/// The fixed classification of conceptual topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TopicType {
    #[default]
    None,
    // Concepts
    Conceptual,
    SdkTechOverviewArchitecture,
    SdkTechOverviewCodeDirectory,
    SdkTechOverviewScenarios,
    SdkTechOverviewTechSummary,
    // Tasks
    HowTo,
    Walkthrough,
    Sample,
    Troubleshooting,
    // Reference
    ReferenceWithoutSyntax,
    ReferenceWithSyntax,
    XmlReference,
    ErrorMessage,
    UiReference,
    // Other resources
    Orientation,
    WhitePaper,
    CodeEntity,
    Glossary,
    SdkTechOverviewOrientation,
}

/// One row of the topic-type table: (type, document tag, type GUID, name).
type TopicTypeRow = (TopicType, &'static str, &'static str, &'static str);

const TOPIC_TYPES: [TopicTypeRow; 19] = [
    (TopicType::Conceptual, "developerConceptualDocument", "1FE70836-AA7D-4515-B54B-E10C4B516E50", "Conceptual"),
    (TopicType::SdkTechOverviewArchitecture, "developerSDKTechnologyOverviewArchitectureDocument", "68F07632-C4C5-4645-8DFA-AC87DCB4BD54", "SDKTechOverviewArchitecture"),
    (TopicType::SdkTechOverviewCodeDirectory, "developerSDKTechnologyOverviewCodeDirectoryDocument", "4BBAAF90-0E5F-4C86-9D31-A5CAEE35A416", "SDKTechOverviewCodeDirectory"),
    (TopicType::SdkTechOverviewScenarios, "developerSDKTechnologyOverviewScenariosDocument", "356C57C4-384D-4AF2-A637-FDD6F088A033", "SDKTechOverviewScenarios"),
    (TopicType::SdkTechOverviewTechSummary, "developerSDKTechnologyOverviewTechnologySummaryDocument", "19F1BB0E-F32A-4D5F-80A9-211D92A8A715", "SDKTechOverviewTechSummary"),
    (TopicType::HowTo, "developerHowToDocument", "DAC3A6A0-C863-4E5B-8F65-79EFC6A4BA09", "HowTo"),
    (TopicType::Walkthrough, "developerWalkthroughDocument", "4779DD54-5D0C-4CC3-9DB3-BF1C90B721B3", "Walkthrough"),
    (TopicType::Sample, "developerSampleDocument", "069EFD88-412D-4E2F-8848-2D5C3AD56BDE", "Sample"),
    (TopicType::Troubleshooting, "developerTroubleshootingDocument", "38C8E0D1-D601-4DBA-AE1B-5BEC16CD9B01", "Troubleshooting"),
    (TopicType::ReferenceWithoutSyntax, "developerReferenceWithoutSyntaxDocument", "F9205737-4DEC-4A58-AA69-0E621B1236BD", "ReferenceWithoutSyntax"),
    (TopicType::ReferenceWithSyntax, "developerReferenceWithSyntaxDocument", "95DADC4C-A2A6-447A-AA36-B6BE3A4F8DEC", "ReferenceWithSyntax"),
    (TopicType::XmlReference, "developerXmlReference", "3272D745-2FFC-48C4-9E9D-CF2B2B784D5F", "XmlReference"),
    (TopicType::ErrorMessage, "developerErrorMessageDocument", "A635375F-98C2-4241-94E7-E427B47C20B6", "ErrorMessage"),
    (TopicType::UiReference, "developerUIReferenceDocument", "B8ED9F21-39A4-4967-928D-160CD2ED9DCE", "UIReference"),
    (TopicType::Orientation, "developerOrientationDocument", "B137C930-7BF7-48A2-A329-3ADCAEF8868E", "Orientation"),
    (TopicType::WhitePaper, "developerWhitePaperDocument", "56DB00EC-28BA-4C0D-8694-28E8B244E236", "WhitePaper"),
    (TopicType::CodeEntity, "codeEntityDocument", "4A273212-0AC8-4D72-8349-EC11CD2FF8CD", "CodeEntity"),
    (TopicType::Glossary, "developerGlossaryDocument", "A689E19C-2687-4881-8CE1-652FF60CF46C", "Glossary"),
    (TopicType::SdkTechOverviewOrientation, "developerSDKTechnologyOverviewOrientationDocument", "CDB8C120-888F-447B-8AF8-F9540562E7CA", "SDKTechOverviewOrientation"),
];

/// Document root tag → topic type (tags are case-sensitive).
static BY_TAG: LazyLock<HashMap<&'static str, TopicType>> = LazyLock::new(|| {
    TOPIC_TYPES
        .iter()
        .map(|(ty, tag, _, _)| (*tag, *ty))
        .collect()
});

/// Upper-cased type GUID → topic type.
static BY_GUID: LazyLock<HashMap<&'static str, TopicType>> = LazyLock::new(|| {
    TOPIC_TYPES
        .iter()
        .map(|(ty, _, guid, _)| (*guid, *ty))
        .collect()
});

impl TopicType {
    /// All classified topic types in table order (excludes `None`).
    pub fn all() -> impl Iterator<Item = TopicType> {
        TOPIC_TYPES.iter().map(|(ty, _, _, _)| *ty)
    }

    fn row(self) -> Option<&'static TopicTypeRow> {
        TOPIC_TYPES.iter().find(|(ty, _, _, _)| *ty == self)
    }

    /// Map a document root tag to its topic type.
    pub fn from_document_tag(tag: &str) -> TopicType {
        BY_TAG.get(tag).copied().unwrap_or(TopicType::None)
    }

    /// Map a topic-type GUID (any letter case) to its topic type.
    pub fn from_topic_type_id(id: &str) -> TopicType {
        if id.len() != 36 {
            return TopicType::None;
        }
        BY_GUID
            .get(id.to_ascii_uppercase().as_str())
            .copied()
            .unwrap_or(TopicType::None)
    }

    /// The type GUID, or an empty string for `None`.
    pub fn topic_type_id(self) -> &'static str {
        self.row().map(|(_, _, guid, _)| *guid).unwrap_or("")
    }

    /// The authored document root tag, or an empty string for `None`.
    pub fn document_tag(self) -> &'static str {
        self.row().map(|(_, tag, _, _)| *tag).unwrap_or("")
    }

    /// Short display name (e.g. `HowTo`), or `None` for the unclassified value.
    pub fn name(self) -> &'static str {
        self.row().map(|(_, _, _, name)| *name).unwrap_or("None")
    }

    /// Schema name used by build manifests (`HowTo` → `DevHowTo`), or an
    /// empty string for `None`.
    pub fn schema_id(self) -> String {
        if self.is_none() {
            return String::new();
        }
        let name: String = self.name().chars().filter(|c| c.is_ascii_alphanumeric()).collect();
        format!("Dev{name}")
    }

    pub fn is_none(self) -> bool {
        self == TopicType::None
    }
}

impl std::fmt::Display for TopicType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Returns `true` if `tag` is one of the known document root tags.
pub fn is_valid_document_tag(tag: &str) -> bool {
    BY_TAG.contains_key(tag)
}

/// Returns `true` if `id` is one of the known topic-type GUIDs.
pub fn is_valid_topic_type_id(id: &str) -> bool {
    !TopicType::from_topic_type_id(id).is_none()
}

/// Map a document root tag straight to its type GUID (empty if unknown).
pub fn to_topic_type_id(tag: &str) -> &'static str {
    TopicType::from_document_tag(tag).topic_type_id()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_ids() {
        assert!(is_valid_id("1fe70836-aa7d-4515-b54b-e10c4b516e50"));
        assert!(is_valid_id("1FE70836-AA7D-4515-B54B-E10C4B516E50"));
        assert!(is_valid_id(&new_id()));
    }

    #[test]
    fn malformed_ids() {
        // wrong length
        assert!(!is_valid_id(""));
        assert!(!is_valid_id("1fe70836-aa7d-4515-b54b-e10c4b516e5"));
        assert!(!is_valid_id("1fe70836-aa7d-4515-b54b-e10c4b516e500"));
        // braces are not part of the canonical form
        assert!(!is_valid_id("{1fe70836-aa7d-4515-b54b-e10c4b516e5}"));
        // dashes in the wrong place
        assert!(!is_valid_id("1fe7083-6aa7d-4515-b54b-e10c4b516e50"));
        assert!(!is_valid_id("1fe70836aaa7d-4515-b54b-e10c4b516e50"));
        // non-hex characters
        assert!(!is_valid_id("1fe70836-aa7d-4515-b54b-e10c4b516g50"));
        assert!(!is_valid_id("zzzzzzzz-zzzz-zzzz-zzzz-zzzzzzzzzzzz"));
    }

    #[test]
    fn derived_ids_are_stable_and_valid() {
        let a = derive_topic_id("docs/intro.xml");
        let b = derive_topic_id("docs/intro.xml");
        let c = derive_topic_id("docs/other.xml");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(is_valid_id(&a));
    }

    #[test]
    fn topic_type_mappings_are_bidirectional() {
        for ty in TopicType::all() {
            assert_eq!(TopicType::from_document_tag(ty.document_tag()), ty);
            assert_eq!(TopicType::from_topic_type_id(ty.topic_type_id()), ty);
            assert!(is_valid_document_tag(ty.document_tag()));
            assert!(is_valid_topic_type_id(ty.topic_type_id()));
        }
        assert_eq!(TopicType::all().count(), 19);
    }

    #[test]
    fn schema_ids_prefix_the_type_name() {
        assert_eq!(TopicType::HowTo.schema_id(), "DevHowTo");
        assert_eq!(TopicType::Conceptual.schema_id(), "DevConceptual");
        assert_eq!(TopicType::None.schema_id(), "");
    }

    #[test]
    fn topic_type_guid_lookup_ignores_case() {
        assert_eq!(
            TopicType::from_topic_type_id("dac3a6a0-c863-4e5b-8f65-79efc6a4ba09"),
            TopicType::HowTo
        );
    }

    #[test]
    fn unknown_inputs_map_to_none() {
        assert_eq!(TopicType::from_document_tag("html"), TopicType::None);
        assert_eq!(TopicType::from_document_tag(""), TopicType::None);
        assert_eq!(TopicType::from_topic_type_id("not-a-guid"), TopicType::None);
        assert_eq!(
            TopicType::from_topic_type_id("00000000-0000-0000-0000-000000000000"),
            TopicType::None
        );
        assert_eq!(to_topic_type_id("unknownDocument"), "");
        assert_eq!(TopicType::None.topic_type_id(), "");
        assert!(!is_valid_document_tag("developerconceptualdocument"));
    }

    #[test]
    fn tag_to_guid() {
        assert_eq!(
            to_topic_type_id("developerGlossaryDocument"),
            "A689E19C-2687-4881-8CE1-652FF60CF46C"
        );
        assert_eq!(TopicType::Glossary.to_string(), "Glossary");
    }
}
