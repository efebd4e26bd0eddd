//! Mapping from the extractor's flat label vocabulary onto a [`ClinicalNote`].
//!
//! The mapping is a single declarative table, [`FIELD_MAPPINGS`]. Each entry
//! names the extractor label, the dotted path it lands on in the serialized
//! note, and whether the value is carried as text or coerced to a number.

use chrono::Utc;
use tracing::trace;

use crate::coercion::coerce_number;
use crate::defaults::UNKNOWN_PLACEHOLDER;
use crate::models::{ClinicalNote, FlatFieldMap, NoteMetadata};

/// How a mapped value is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Carried verbatim.
    Text,
    /// Passed through [`coerce_number`].
    Number,
}

/// Accessor for the note field a label writes into.
#[derive(Clone, Copy)]
pub enum Slot {
    Text(fn(&mut ClinicalNote) -> &mut Option<String>),
    Number(fn(&mut ClinicalNote) -> &mut Option<f64>),
}

/// One row of the label → path → kind table.
#[derive(Clone, Copy)]
pub struct FieldMapping {
    /// Label as emitted by the extractor.
    pub label: &'static str,
    /// Dotted path of the target in the serialized note.
    pub path: &'static str,
    pub slot: Slot,
}

impl FieldMapping {
    pub fn kind(&self) -> FieldKind {
        match self.slot {
            Slot::Text(_) => FieldKind::Text,
            Slot::Number(_) => FieldKind::Number,
        }
    }

    /// Store `value` on `note`. Returns whether the field ended up present.
    fn apply(&self, note: &mut ClinicalNote, value: &str) -> bool {
        match self.slot {
            Slot::Text(field) => {
                *field(note) = Some(value.to_string());
                true
            }
            Slot::Number(field) => {
                let coerced = coerce_number(Some(value));
                *field(note) = coerced;
                coerced.is_some()
            }
        }
    }
}

impl std::fmt::Debug for FieldMapping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldMapping")
            .field("label", &self.label)
            .field("path", &self.path)
            .field("kind", &self.kind())
            .finish()
    }
}

macro_rules! text {
    ($label:literal, $path:literal, $($field:ident).+) => {
        FieldMapping {
            label: $label,
            path: $path,
            slot: Slot::Text(|n| &mut n.$($field).+),
        }
    };
}

macro_rules! number {
    ($label:literal, $path:literal, $($field:ident).+) => {
        FieldMapping {
            label: $label,
            path: $path,
            slot: Slot::Number(|n| &mut n.$($field).+),
        }
    };
}

/// Every label the extractor may emit, with its destination.
pub static FIELD_MAPPINGS: &[FieldMapping] = &[
    // Specimen
    text!("Specimen Label", "specimen.label", specimen.label),
    number!("Specimen Length", "specimen.length_cm", specimen.length_cm),
    number!(
        "Colon Max Circumference",
        "specimen.colon_max_circumference_cm",
        specimen.colon_max_circumference_cm
    ),
    number!(
        "Terminal Ileum Max Circumference",
        "specimen.terminal_ileum_max_circumference_cm",
        specimen.terminal_ileum_max_circumference_cm
    ),
    number!(
        "Transverse Colon Max Circumference",
        "specimen.transverse_colon_max_circumference_cm",
        specimen.transverse_colon_max_circumference_cm
    ),
    // Stored as text in existing records; keep it that way.
    text!(
        "Descending Colon Max Circumference",
        "specimen.descending_colon_max_circumference_cm",
        specimen.descending_colon_max_circumference_cm
    ),
    number!(
        "Sigmoid Colon Max Circumference",
        "specimen.sigmoid_colon_max_circumference_cm",
        specimen.sigmoid_colon_max_circumference_cm
    ),
    number!("Cecum Length", "specimen.cecum_length_cm", specimen.cecum_length_cm),
    number!(
        "Ascending Colon Length",
        "specimen.ascending_colon_length_cm",
        specimen.ascending_colon_length_cm
    ),
    number!(
        "Transverse Colon Length",
        "specimen.transverse_colon_length_cm",
        specimen.transverse_colon_length_cm
    ),
    number!(
        "Descending Colon Length",
        "specimen.descending_colon_length_cm",
        specimen.descending_colon_length_cm
    ),
    number!(
        "Sigmoid Colon Length",
        "specimen.sigmoid_colon_length_cm",
        specimen.sigmoid_colon_length_cm
    ),
    number!(
        "Terminal Ileum Length",
        "specimen.terminal_ileum_length_cm",
        specimen.terminal_ileum_length_cm
    ),
    number!("Appendix Length", "specimen.appendix_length_cm", specimen.appendix_length_cm),
    number!(
        "Appendix Diameter",
        "specimen.appendix_diameter_cm",
        specimen.appendix_diameter_cm
    ),
    // Tumor
    text!("Tumor Size", "tumor.size_cm", tumor.size_cm),
    text!("Tumor Type", "tumor.type", tumor.tumor_type),
    text!("Tumor Appearance", "tumor.appearance", tumor.appearance),
    text!("Tumor Color & Consistency", "tumor.color_consistency", tumor.color_consistency),
    text!("Tumor Location", "tumor.location", tumor.location),
    text!("Tumor Shape", "tumor.shape", tumor.shape),
    number!("Tumor Thickness", "tumor.thickness_cm", tumor.thickness_cm),
    text!("Tumor Wall Side", "tumor.wall_side", tumor.wall_side),
    text!("Tumor Invasion Level", "tumor.invasion_level", tumor.invasion_level),
    // Margins
    number!("Margins Proximal", "margins.proximal_cm", margins.proximal_cm),
    number!("Margins Distal", "margins.distal_cm", margins.distal_cm),
    number!("Margins Radial", "margins.radial_cm", margins.radial_cm),
    number!("Margins Mesenteric", "margins.mesenteric_cm", margins.mesenteric_cm),
    number!(
        "Distance from Proximal Margin",
        "margins.distance_from_proximal_margin_cm",
        margins.distance_from_proximal_margin_cm
    ),
    number!(
        "Distance from Distal Margin",
        "margins.distance_from_distal_margin_cm",
        margins.distance_from_distal_margin_cm
    ),
    number!(
        "Distance from Mesenteric Margin",
        "margins.distance_from_mesenteric_margin_cm",
        margins.distance_from_mesenteric_margin_cm
    ),
    number!(
        "Distance from Retroperitoneal Margin",
        "margins.distance_from_retroperitoneal_margin_cm",
        margins.distance_from_retroperitoneal_margin_cm
    ),
    // Lymph nodes
    text!("Lymph Nodes Found", "lymph_nodes.found", lymph_nodes.found),
    text!("Positive Nodes", "lymph_nodes.positive", lymph_nodes.positive),
    text!("Nodes Examined", "lymph_nodes.examined", lymph_nodes.examined),
    text!("Node Positions", "lymph_nodes.positions", lymph_nodes.positions),
    text!(
        "Extranodal Extension",
        "lymph_nodes.extranodal_extension",
        lymph_nodes.extranodal_extension
    ),
    text!(
        "Lymphovascular Invasion",
        "lymph_nodes.lymphovascular_invasion",
        lymph_nodes.lymphovascular_invasion
    ),
    text!(
        "Perineural Invasion",
        "lymph_nodes.perineural_invasion",
        lymph_nodes.perineural_invasion
    ),
    text!(
        "Extramural Vascular Invasion",
        "lymph_nodes.extramural_vascular_invasion",
        lymph_nodes.extramural_vascular_invasion
    ),
    text!("Tumor Budding", "lymph_nodes.tumor_budding", lymph_nodes.tumor_budding),
    // Polyp
    text!("Polyp Presence", "polyp.presence", polyp.presence),
    number!("Polyp Size", "polyp.size_cm", polyp.size_cm),
    number!(
        "Polyp Distance from Main Lesion",
        "polyp.distance_from_main_lesion_cm",
        polyp.distance_from_main_lesion_cm
    ),
    // Staging
    text!("pT Stage", "staging.pT", staging.p_t),
    text!("pN Stage", "staging.pN", staging.p_n),
    text!("pM Stage", "staging.pM", staging.p_m),
    text!("Distance to Serosa", "staging.distance_to_serosa", staging.distance_to_serosa),
    text!("Synchronous Polyps", "staging.synchronous_polyps", staging.synchronous_polyps),
    // Tissue surfaces
    text!(
        "Serosal Surface Status",
        "tissue_surfaces.serosal_surface",
        tissue_surfaces.serosal_surface
    ),
    text!(
        "Retroperitoneal Surface Status",
        "tissue_surfaces.retroperitoneal_surface",
        tissue_surfaces.retroperitoneal_surface
    ),
    text!(
        "Omentum Findings",
        "tissue_surfaces.omentum_findings",
        tissue_surfaces.omentum_findings
    ),
    text!("Other Findings", "tissue_surfaces.other_findings", tissue_surfaces.other_findings),
    // Admin
    text!("Pathologist", "admin.pathologist", admin.pathologist),
    text!("Diagnosis Date", "admin.diagnosis_date", admin.diagnosis_date),
    text!("Block Count", "admin.block_count", admin.block_count),
    text!("Report Conclusion", "admin.report_conclusion", admin.report_conclusion),
];

/// Look up the mapping for an extractor label.
pub fn mapping_for(label: &str) -> Option<&'static FieldMapping> {
    FIELD_MAPPINGS.iter().find(|m| m.label == label)
}

/// Labels in `fields` that the table does not know about.
pub fn unmapped_labels(fields: &FlatFieldMap) -> Vec<&str> {
    fields
        .keys()
        .map(String::as_str)
        .filter(|label| mapping_for(label).is_none())
        .collect()
}

/// Build a draft clinical note from extracted fields and caller metadata.
///
/// Unknown labels are ignored and missing labels leave their field absent.
/// Blank or missing patient name and doctor id become `"Unknown"`. The visit
/// date is taken from the metadata when supplied, otherwise it is the current
/// time, so the function is deterministic only when a visit date is given.
pub fn transform(fields: &FlatFieldMap, meta: &NoteMetadata) -> ClinicalNote {
    let mut note = ClinicalNote::draft(meta.visit_date.unwrap_or_else(Utc::now));

    for mapping in FIELD_MAPPINGS {
        if let Some(value) = fields.get(mapping.label) {
            let present = mapping.apply(&mut note, value);
            trace!(
                subsystem = "ingest",
                component = "transformer",
                label = mapping.label,
                path = mapping.path,
                kind = ?mapping.kind(),
                present,
                "Mapped field"
            );
        }
    }
    for label in unmapped_labels(fields) {
        trace!(
            subsystem = "ingest",
            component = "transformer",
            label,
            "Ignored unmapped label"
        );
    }

    note.patient_name = meta
        .patient_name()
        .unwrap_or(UNKNOWN_PLACEHOLDER)
        .to_string();
    note.doctor_id = meta.doctor_id().unwrap_or(UNKNOWN_PLACEHOLDER).to_string();
    note.audio_id = meta.audio_id;
    note.transcription_id = meta.transcription_id;
    note.ai_summary_id = meta.ai_summary_id;

    note
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NoteStatus;
    use chrono::{DateTime, TimeZone};
    use std::collections::HashSet;
    use uuid::Uuid;

    fn fixed_date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap()
    }

    fn fields(pairs: &[(&str, &str)]) -> FlatFieldMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn meta() -> NoteMetadata {
        NoteMetadata::new(Some("Jane Roe".into()), Some("dr-42".into())).with_visit_date(fixed_date())
    }

    #[test]
    fn test_table_has_every_label_once() {
        assert_eq!(FIELD_MAPPINGS.len(), 57);
        let labels: HashSet<_> = FIELD_MAPPINGS.iter().map(|m| m.label).collect();
        assert_eq!(labels.len(), FIELD_MAPPINGS.len());
        let paths: HashSet<_> = FIELD_MAPPINGS.iter().map(|m| m.path).collect();
        assert_eq!(paths.len(), FIELD_MAPPINGS.len());
    }

    #[test]
    fn test_every_label_lands_on_its_path() {
        let all: FlatFieldMap = FIELD_MAPPINGS
            .iter()
            .map(|m| (m.label.to_string(), "7.5 units".to_string()))
            .collect();
        let note = transform(&all, &meta());
        let json = serde_json::to_value(&note).unwrap();

        for mapping in FIELD_MAPPINGS {
            let pointer = format!("/{}", mapping.path.replace('.', "/"));
            let value = json
                .pointer(&pointer)
                .unwrap_or_else(|| panic!("{} missing at {}", mapping.label, mapping.path));
            match mapping.kind() {
                FieldKind::Number => assert_eq!(value.as_f64(), Some(7.5), "{}", mapping.label),
                FieldKind::Text => assert_eq!(value.as_str(), Some("7.5 units"), "{}", mapping.label),
            }
        }
    }

    #[test]
    fn test_numeric_and_text_kinds() {
        let note = transform(
            &fields(&[
                ("Specimen Length", "25"),
                ("Margins Distal", "N/A"),
                ("Tumor Size", "3.2 cm"),
                ("Tumor Thickness", "1.1 cm"),
            ]),
            &meta(),
        );
        assert_eq!(note.specimen.length_cm, Some(25.0));
        assert_eq!(note.margins.distal_cm, None);
        assert_eq!(note.tumor.size_cm.as_deref(), Some("3.2 cm"));
        assert_eq!(note.tumor.thickness_cm, Some(1.1));
    }

    #[test]
    fn test_descending_colon_circumference_stays_text() {
        let mapping = mapping_for("Descending Colon Max Circumference").unwrap();
        assert_eq!(mapping.kind(), FieldKind::Text);

        let note = transform(
            &fields(&[("Descending Colon Max Circumference", "6 cm")]),
            &meta(),
        );
        assert_eq!(
            note.specimen.descending_colon_max_circumference_cm.as_deref(),
            Some("6 cm")
        );
    }

    #[test]
    fn test_text_values_are_verbatim() {
        let note = transform(
            &fields(&[("Tumor Type", "  Adenocarcinoma, moderately differentiated ")]),
            &meta(),
        );
        assert_eq!(
            note.tumor.tumor_type.as_deref(),
            Some("  Adenocarcinoma, moderately differentiated ")
        );
    }

    #[test]
    fn test_unknown_labels_ignored() {
        let input = fields(&[("Favorite Color", "blue"), ("pT Stage", "pT3")]);
        let note = transform(&input, &meta());
        assert_eq!(note.staging.p_t.as_deref(), Some("pT3"));
        assert_eq!(unmapped_labels(&input), vec!["Favorite Color"]);
    }

    /// Shared buffer the fmt subscriber writes into.
    #[derive(Clone, Default)]
    struct CapturedLogs(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_field_mapping_emits_trace_without_values() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let input = fields(&[
            ("Tumor Size", "3.2 cm"),
            ("Specimen Length", "not measured"),
            ("Favorite Color", "teal"),
        ]);
        tracing::subscriber::with_default(subscriber, || transform(&input, &meta()));

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("Mapped field"));
        assert!(output.contains("tumor.size_cm"));
        assert!(output.contains("specimen.length_cm"));
        assert!(output.contains("present=false"));
        assert!(output.contains("Ignored unmapped label"));
        assert!(output.contains("Favorite Color"));
        assert!(!output.contains("3.2 cm"));
        assert!(!output.contains("teal"));
    }

    #[test]
    fn test_missing_labels_are_absent() {
        let note = transform(&FlatFieldMap::new(), &meta());
        assert_eq!(note.specimen.length_cm, None);
        assert_eq!(note.admin.pathologist, None);
        assert_eq!(note.status, NoteStatus::Draft);
    }

    #[test]
    fn test_identity_defaults_to_unknown() {
        let note = transform(&FlatFieldMap::new(), &NoteMetadata::default());
        assert_eq!(note.patient_name, "Unknown");
        assert_eq!(note.doctor_id, "Unknown");

        let blank = NoteMetadata::new(Some("".into()), Some("  ".into()));
        let note = transform(&FlatFieldMap::new(), &blank);
        assert_eq!(note.patient_name, "Unknown");
        assert_eq!(note.doctor_id, "Unknown");
    }

    #[test]
    fn test_identity_from_metadata() {
        let note = transform(&FlatFieldMap::new(), &meta());
        assert_eq!(note.patient_name, "Jane Roe");
        assert_eq!(note.doctor_id, "dr-42");
        assert_eq!(note.visit_date, fixed_date());
    }

    #[test]
    fn test_visit_date_defaults_to_now() {
        let before = Utc::now();
        let note = transform(&FlatFieldMap::new(), &NoteMetadata::default());
        let after = Utc::now();
        assert!(note.visit_date >= before && note.visit_date <= after);
    }

    #[test]
    fn test_weak_references_copied() {
        let mut m = meta();
        m.audio_id = Some(Uuid::nil());
        let note = transform(&FlatFieldMap::new(), &m);
        assert_eq!(note.audio_id, Some(Uuid::nil()));
        assert_eq!(note.transcription_id, None);
    }

    #[test]
    fn test_transform_is_deterministic_with_visit_date() {
        let input = fields(&[
            ("Tumor Location", "sigmoid colon"),
            ("Margins Radial", "0.4 cm"),
            ("Lymph Nodes Found", "14"),
        ]);
        assert_eq!(transform(&input, &meta()), transform(&input, &meta()));
    }
}
