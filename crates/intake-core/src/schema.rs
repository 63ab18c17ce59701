//! Contract document types and the field names extracted for each of them

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::IntakeError;

/// Kind of contract being uploaded, sent to the backend as `pdfType`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DocumentType {
    Nda,
    #[default]
    Sow,
    Msa,
}

const NDA_FIELDS: &[&str] = &[
    "disclosing_party",
    "receiving_party",
    "effective_date",
    "term",
    "governing_law",
    "confidentiality_period",
    "mutual_or_one_way",
    "termination_notice",
];

const SOW_FIELDS: &[&str] = &[
    "client_company_name",
    "currency",
    "sow_start_date",
    "sow_end_date",
    "cola",
    "credit_period",
    "inclusive_or_exclusive_gst",
    "sow_value",
    "sow_no",
    "type_of_billing",
    "po_number",
    "amendment_no",
    "billing_unit_type_and_rate_cost",
    "particular_role_rate",
    "subcontract_clause",
    "total_fte",
    "remark",
];

const MSA_FIELDS: &[&str] = &[
    "client_company_name",
    "currency",
    "msa_start_date",
    "msa_end_date",
    "info_security",
    "limitation_of_liability",
    "data_processing_agreement",
    "insurance_required",
    "type_of_insurance_required",
    "is_cyber_insurance_required",
    "cyber_insurance_amount",
    "is_workman_compensation_insurance_required",
    "workman_compensation_insurance_amount",
    "other_insurance_required",
    "other_insurance_amount",
];

/// Free-text fields filled in by the reviewer, present for every document type
pub const USER_FIELDS: &[&str] = &["reviewer_name", "review_notes"];

impl DocumentType {
    pub const ALL: [DocumentType; 3] = [DocumentType::Nda, DocumentType::Sow, DocumentType::Msa];

    /// Wire form used in the `pdfType` multipart field
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Nda => "NDA",
            DocumentType::Sow => "SOW",
            DocumentType::Msa => "MSA",
        }
    }

    /// Field names the extraction backend fills in for this document type
    pub fn extracted_fields(&self) -> &'static [&'static str] {
        match self {
            DocumentType::Nda => NDA_FIELDS,
            DocumentType::Sow => SOW_FIELDS,
            DocumentType::Msa => MSA_FIELDS,
        }
    }

    /// Full ordered schema: extracted fields followed by the user fields
    pub fn schema(&self) -> impl Iterator<Item = &'static str> {
        self.extracted_fields()
            .iter()
            .chain(USER_FIELDS.iter())
            .copied()
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = IntakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "NDA" => Ok(DocumentType::Nda),
            "SOW" => Ok(DocumentType::Sow),
            "MSA" => Ok(DocumentType::Msa),
            _ => Err(IntakeError::UnknownDocumentType(s.to_string())),
        }
    }
}

/// True when `name` is a reviewer-entered field rather than an extracted one
pub fn is_user_field(name: &str) -> bool {
    USER_FIELDS.contains(&name)
}
